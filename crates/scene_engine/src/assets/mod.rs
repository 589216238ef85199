//! Asset registry
//!
//! Tracks what has been requested and whether loading succeeded. Parsing
//! and GPU upload belong to an external [`AssetLoader`]; a failed load is
//! logged and leaves the asset registered but unloaded, so the component
//! referencing it keeps working in a degraded mode (e.g. untextured).

use crate::foundation::collections::{HandleMap, TypedHandle};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Kind of asset behind a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Triangle mesh
    Mesh,
    /// Image texture
    Texture,
    /// Shader program
    Shader,
    /// Scene description file
    Scene,
}

/// Handle to a registered asset
pub type AssetHandle = TypedHandle<Asset>;

/// Bookkeeping for one asset path
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// Source path
    pub path: PathBuf,
    /// Kind requested
    pub kind: AssetKind,
    /// Whether the loader succeeded
    pub loaded: bool,
    ref_count: u32,
}

impl Asset {
    /// Number of outstanding requests
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }
}

/// Format-specific loading, supplied by the host
pub trait AssetLoader {
    /// Load `path`; returns false on failure
    fn load(&mut self, path: &Path, kind: AssetKind) -> bool;
}

/// Loader that accepts everything without touching the filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLoader;

impl AssetLoader for NullLoader {
    fn load(&mut self, _path: &Path, _kind: AssetKind) -> bool {
        true
    }
}

/// Deduplicating, reference counted asset table
pub struct AssetRegistry {
    loader: Box<dyn AssetLoader>,
    assets: HandleMap<Asset>,
    by_path: HashMap<PathBuf, AssetHandle>,
}

impl AssetRegistry {
    /// Registry backed by `loader`
    pub fn new(loader: Box<dyn AssetLoader>) -> Self {
        Self {
            loader,
            assets: HandleMap::new(),
            by_path: HashMap::new(),
        }
    }

    /// Request an asset, loading it on first request
    ///
    /// Always returns a handle. Check [`AssetRegistry::is_loaded`] to learn
    /// whether the content is actually usable.
    pub fn request(&mut self, path: impl AsRef<Path>, kind: AssetKind) -> AssetHandle {
        let path = path.as_ref();
        if let Some(&handle) = self.by_path.get(path) {
            if let Some(asset) = self.assets.get_mut(handle.key()) {
                asset.ref_count += 1;
                return handle;
            }
        }

        let loaded = self.loader.load(path, kind);
        if loaded {
            log::debug!("Loaded {:?} asset {}", kind, path.display());
        } else {
            log::warn!("Failed to load {:?} asset {}, continuing without it", kind, path.display());
        }

        let key = self.assets.insert(Asset {
            path: path.to_path_buf(),
            kind,
            loaded,
            ref_count: 1,
        });
        let handle = AssetHandle::new(key);
        self.by_path.insert(path.to_path_buf(), handle);
        handle
    }

    /// Drop one reference; the entry is removed when none remain
    pub fn release(&mut self, handle: AssetHandle) -> bool {
        let Some(asset) = self.assets.get_mut(handle.key()) else {
            return false;
        };
        asset.ref_count = asset.ref_count.saturating_sub(1);
        if asset.ref_count == 0 {
            if let Some(asset) = self.assets.remove(handle.key()) {
                self.by_path.remove(&asset.path);
            }
        }
        true
    }

    /// Look up an asset
    pub fn get(&self, handle: AssetHandle) -> Option<&Asset> {
        self.assets.get(handle.key())
    }

    /// Whether the asset exists and loaded successfully
    pub fn is_loaded(&self, handle: AssetHandle) -> bool {
        self.get(handle).is_some_and(|asset| asset.loaded)
    }

    /// Number of registered assets
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new(Box::new(NullLoader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fails every path containing "missing"
    struct PickyLoader;

    impl AssetLoader for PickyLoader {
        fn load(&mut self, path: &Path, _kind: AssetKind) -> bool {
            !path.to_string_lossy().contains("missing")
        }
    }

    #[test]
    fn test_requests_are_deduplicated() {
        let mut registry = AssetRegistry::default();
        let a = registry.request("meshes/sphere.obj", AssetKind::Mesh);
        let b = registry.request("meshes/sphere.obj", AssetKind::Mesh);
        assert_eq!(a, b);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(a).map(Asset::ref_count), Some(2));
    }

    #[test]
    fn test_failed_load_is_degraded_not_fatal() {
        let mut registry = AssetRegistry::new(Box::new(PickyLoader));
        let texture = registry.request("textures/missing.png", AssetKind::Texture);
        let mesh = registry.request("meshes/cube.obj", AssetKind::Mesh);

        assert!(!registry.is_loaded(texture));
        assert!(registry.is_loaded(mesh));
        assert!(registry.get(texture).is_some());
    }

    #[test]
    fn test_release_removes_last_reference() {
        let mut registry = AssetRegistry::default();
        let handle = registry.request("a.obj", AssetKind::Mesh);
        registry.request("a.obj", AssetKind::Mesh);

        assert!(registry.release(handle));
        assert!(registry.get(handle).is_some());
        assert!(registry.release(handle));
        assert!(registry.get(handle).is_none());
        assert!(!registry.release(handle));
        assert!(registry.is_empty());
    }
}
