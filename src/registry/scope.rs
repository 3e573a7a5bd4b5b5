use crate::context::ContextMap;
use crate::error::{Result, SlotError};

use super::SlotRegistry;

/// Scope in which `registry` is the ambient registry for every descendant.
pub fn provide_portal_slots(context: &ContextMap, registry: SlotRegistry) -> ContextMap {
    context.provide(registry)
}

/// Resolve the ambient registry, failing when no provider wraps the caller.
pub fn use_portal_slots(context: &ContextMap) -> Result<SlotRegistry> {
    context
        .get::<SlotRegistry>()
        .ok_or(SlotError::MissingProvider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_without_provider_fails() {
        let err = use_portal_slots(&ContextMap::new()).unwrap_err();
        assert!(matches!(err, SlotError::MissingProvider));
    }

    #[test]
    fn nearest_provider_wins() {
        let outer = SlotRegistry::new();
        let inner = SlotRegistry::new();
        let outer_scope = provide_portal_slots(&ContextMap::new(), outer.clone());
        let inner_scope = provide_portal_slots(&outer_scope, inner.clone());

        let resolved = use_portal_slots(&inner_scope).unwrap();
        assert!(SlotRegistry::ptr_eq(&resolved, &inner));
        let resolved = use_portal_slots(&outer_scope).unwrap();
        assert!(SlotRegistry::ptr_eq(&resolved, &outer));
    }
}
