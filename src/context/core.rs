use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::rc::Rc;

/// Ambient values visible to a subtree, keyed by type.
///
/// Each type appears at most once per scope. [`ContextMap::provide`] returns a
/// child scope in which the new value shadows any outer value of the same type;
/// the parent scope is left untouched, so siblings never observe each other's
/// providers.
#[derive(Clone, Default)]
pub struct ContextMap {
    entries: Rc<HashMap<TypeId, Rc<dyn Any>>>,
}

impl ContextMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provide<T>(&self, value: T) -> ContextMap
    where
        T: 'static,
    {
        let mut entries: HashMap<TypeId, Rc<dyn Any>> = (*self.entries).clone();
        entries.insert(TypeId::of::<T>(), Rc::new(value));
        Self {
            entries: Rc::new(entries),
        }
    }

    pub fn get<T>(&self) -> Option<T>
    where
        T: Clone + 'static,
    {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
            .cloned()
    }

    pub fn contains<T>(&self) -> bool
    where
        T: 'static,
    {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ContextMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextMap")
            .field("entries", &self.entries.len())
            .finish()
    }
}
