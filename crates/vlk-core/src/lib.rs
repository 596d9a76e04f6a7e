pub mod config;
pub mod error;
pub mod logging;
pub mod store;

pub use config::VlkConfig;
pub use error::{VlkError, VlkResult};
pub use store::{FsSecretStore, SecretStore};
