//! CLI command implementations

pub mod init;
pub mod locate;
pub mod migrate;
