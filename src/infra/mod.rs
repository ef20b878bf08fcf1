//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod memory;
pub mod telemetry;

use std::sync::Arc;

use crate::application::store::DocumentStore;
use crate::config::StoreSettings;
use error::InfraError;
pub use memory::MemoryStore;

/// Resolve the configured store URL to a backend.
///
/// `memory:` is the embedded backend; any other scheme is a configuration
/// error surfaced before the console starts.
pub fn connect(settings: &StoreSettings) -> Result<Arc<dyn DocumentStore>, InfraError> {
    match settings.url.split(':').next() {
        Some("memory") => Ok(Arc::new(MemoryStore::new())),
        _ => Err(InfraError::configuration(format!(
            "unsupported store url `{}`",
            settings.url
        ))),
    }
}
