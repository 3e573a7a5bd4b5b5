use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SLOT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Opaque slot identity minted once per factory call.
///
/// The display name is carried for diagnostics and class names only; equality
/// and hashing look at the minted token alone, so two ids with the same name
/// never compare equal.
#[derive(Clone)]
pub struct SlotId {
    token: u64,
    name: Arc<str>,
}

impl SlotId {
    pub fn mint(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            token: NEXT_SLOT_TOKEN.fetch_add(1, Ordering::Relaxed),
            name: Arc::from(name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn token(&self) -> u64 {
        self.token
    }
}

impl PartialEq for SlotId {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

impl Eq for SlotId {}

impl Hash for SlotId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.token.hash(state);
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.token)
    }
}

impl fmt::Debug for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotId({}#{})", self.name, self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn same_name_never_collides() {
        let a = SlotId::mint("footer");
        let b = SlotId::mint("footer");
        assert_ne!(a, b);
        assert_eq!(a.name(), b.name());

        let mut set = HashSet::new();
        set.insert(a.clone());
        set.insert(b);
        set.insert(a);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn display_includes_name_and_token() {
        let id = SlotId::mint("actions");
        assert_eq!(id.to_string(), format!("actions#{}", id.token()));
    }
}
