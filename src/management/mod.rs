mod library;
mod manifest;
mod paths;
mod reconcile;

pub use library::LibraryIndex;
pub use manifest::ManifestError;
pub use manifest::ManifestManager;
pub use manifest::list_manifests;
pub use manifest::manifest_title;
pub use manifest::read_manifest;
pub use paths::PathMapping;
pub use paths::PathMappingError;
pub use reconcile::EvictionReport;
pub use reconcile::ProtectionSet;
pub use reconcile::StorageReconciler;
