//! Configuration management
//!
//! Run settings for a migration and resolution of the remote repository
//! credentials.

pub mod credentials;
pub mod migrate_config;

// Re-export commonly used items
pub use credentials::{CredentialSource, Credentials, ExplicitCredentials};
pub use migrate_config::{clamp_workers, MigrateConfig};
