use regsweep_image::RegistryError;
use thiserror::Error;

/// Failures that abort a whole cleanup run
#[derive(Error, Debug)]
pub enum CleanupError {
    /// The API root did not answer; nothing was touched
    #[error("Registry API at {url} is not reachable")]
    RegistryUnreachable { url: String },

    /// The registry client could not be built from the configuration
    #[error(transparent)]
    Client(#[from] RegistryError),
}

impl CleanupError {
    pub fn registry_unreachable(url: impl Into<String>) -> Self {
        Self::RegistryUnreachable { url: url.into() }
    }
}
