// SPDX-License-Identifier: MIT OR Apache-2.0
//! Named display surfaces that render nodes draw into.
//!
//! Surfaces are owned outside the engine. Render nodes only look them up by
//! name during setup and write into them each frame.

use crate::raster::Raster;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a drawable surface
pub type SurfaceHandle = Arc<RwLock<Raster>>;

/// Looks up display surfaces by name
pub trait SurfaceResolver: fmt::Debug + Send + Sync {
    /// The surface called `name`, if one is registered
    fn resolve(&self, name: &str) -> Option<SurfaceHandle>;
}

/// In-memory set of named surfaces
#[derive(Debug, Default)]
pub struct SurfaceRegistry {
    surfaces: RwLock<IndexMap<String, SurfaceHandle>>,
}

impl SurfaceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transparent surface, replacing any surface with the same name
    pub fn create(&self, name: impl Into<String>, width: u32, height: u32) -> SurfaceHandle {
        let handle = Arc::new(RwLock::new(Raster::new(width, height)));
        self.insert(name, handle.clone());
        handle
    }

    /// Register an existing surface under `name`
    pub fn insert(&self, name: impl Into<String>, handle: SurfaceHandle) {
        let name = name.into();
        if self.surfaces.write().insert(name.clone(), handle).is_some() {
            tracing::warn!("Replaced display surface {name:?}");
        }
    }

    /// Unregister a surface
    pub fn remove(&self, name: &str) -> Option<SurfaceHandle> {
        self.surfaces.write().shift_remove(name)
    }

    /// Names of all registered surfaces, in registration order
    pub fn names(&self) -> Vec<String> {
        self.surfaces.read().keys().cloned().collect()
    }

    /// Number of registered surfaces
    pub fn len(&self) -> usize {
        self.surfaces.read().len()
    }

    /// Whether no surfaces are registered
    pub fn is_empty(&self) -> bool {
        self.surfaces.read().is_empty()
    }
}

impl SurfaceResolver for SurfaceRegistry {
    fn resolve(&self, name: &str) -> Option<SurfaceHandle> {
        self.surfaces.read().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_resolve() {
        let registry = SurfaceRegistry::new();
        let handle = registry.create("conradCanvas", 8, 4);

        let resolved = registry.resolve("conradCanvas").unwrap();
        assert!(Arc::ptr_eq(&handle, &resolved));
        assert_eq!(resolved.read().dimensions(), (8, 4));
        assert!(registry.resolve("missing").is_none());
    }

    #[test]
    fn test_remove() {
        let registry = SurfaceRegistry::new();
        registry.create("a", 1, 1);
        registry.create("b", 1, 1);
        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);

        assert!(registry.remove("a").is_some());
        assert_eq!(registry.len(), 1);
        assert!(registry.resolve("a").is_none());
    }
}
