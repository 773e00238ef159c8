// src/state.rs

use crate::core::registry::PatternRegistry;
use std::sync::{Arc, OnceLock};

static REGISTRY: OnceLock<Arc<PatternRegistry>> = OnceLock::new();

/// Installs the process-wide registry. The first call wins; later calls return the
/// registry that is already installed.
pub fn init_registry(bot_prefix: &str) -> Arc<PatternRegistry> {
    Arc::clone(REGISTRY.get_or_init(|| Arc::new(PatternRegistry::new(bot_prefix))))
}

/// Returns the process-wide registry, if it has been installed.
pub fn registry() -> Option<Arc<PatternRegistry>> {
    REGISTRY.get().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_installed_once() {
        let first = init_registry("!");
        let second = init_registry("?");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.bot_prefix(), "!");
        assert!(registry().is_some_and(|r| Arc::ptr_eq(&r, &first)));
    }
}
