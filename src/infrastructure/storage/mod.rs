pub mod janitor;

pub use janitor::{cleanup_older_than, ArtifactJanitor, InUseGuard};
