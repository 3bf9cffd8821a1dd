//! Remote repository credentials
//!
//! Resolved in order: explicit command-line values (only when username,
//! password and server are all given), `PRESERVICA_*` environment variables,
//! `credentials.toml` in the working directory, then
//! `~/.preservica/credentials.toml`.

use crate::core::error::{OcflError, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const CREDENTIALS_FILE: &str = "credentials.toml";
const USER_CONFIG_DIR: &str = ".preservica";

pub const ENV_USERNAME: &str = "PRESERVICA_USERNAME";
pub const ENV_PASSWORD: &str = "PRESERVICA_PASSWORD";
pub const ENV_SERVER: &str = "PRESERVICA_SERVER";
pub const ENV_TENANT: &str = "PRESERVICA_TENANT";

/// Login details for the remote repository
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub server: String,
    #[serde(default)]
    pub tenant: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .field("server", &self.server)
            .field("tenant", &self.tenant)
            .finish()
    }
}

/// Layout of `credentials.toml`
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    credentials: Credentials,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ExplicitCredentials {
    pub username: Option<String>,
    pub password: Option<String>,
    pub server: Option<String>,
    pub tenant: Option<String>,
}

/// Where a set of credentials came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    CommandLine,
    Environment,
    File(PathBuf),
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::CommandLine => write!(f, "command line"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl Credentials {
    /// Resolve credentials from the process environment and the default
    /// file locations
    pub fn resolve(explicit: &ExplicitCredentials) -> Result<(Self, CredentialSource)> {
        let mut search_paths = vec![PathBuf::from(CREDENTIALS_FILE)];
        if let Some(user_dirs) = UserDirs::new() {
            search_paths.push(user_dirs.home_dir().join(USER_CONFIG_DIR).join(CREDENTIALS_FILE));
        }
        Self::resolve_with(explicit, |key| std::env::var(key).ok(), &search_paths)
    }

    /// Resolve with an injectable environment and file search path
    pub fn resolve_with<F>(
        explicit: &ExplicitCredentials,
        env: F,
        search_paths: &[PathBuf],
    ) -> Result<(Self, CredentialSource)>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let (Some(username), Some(password), Some(server)) =
            (&explicit.username, &explicit.password, &explicit.server)
        {
            let credentials = Credentials {
                username: username.clone(),
                password: password.clone(),
                server: server.clone(),
                tenant: explicit.tenant.clone(),
            };
            return Ok((credentials, CredentialSource::CommandLine));
        }

        if let (Some(username), Some(password), Some(server)) =
            (env(ENV_USERNAME), env(ENV_PASSWORD), env(ENV_SERVER))
        {
            let credentials = Credentials {
                username,
                password,
                server,
                tenant: explicit.tenant.clone().or_else(|| env(ENV_TENANT)),
            };
            return Ok((credentials, CredentialSource::Environment));
        }

        for path in search_paths {
            if path.is_file() {
                let mut credentials = Self::load(path)?;
                if explicit.tenant.is_some() {
                    credentials.tenant = explicit.tenant.clone();
                }
                return Ok((credentials, CredentialSource::File(path.clone())));
            }
        }

        Err(OcflError::configuration(format!(
            "no credentials: pass --username, --password and --server, \
             set {}, {} and {}, or create {}",
            ENV_USERNAME, ENV_PASSWORD, ENV_SERVER, CREDENTIALS_FILE
        )))
    }

    /// Load a `credentials.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: CredentialsFile =
            toml::from_str(&content).map_err(|e| OcflError::ConfigurationError {
                reason: format!("Failed to parse {}: {}", path.display(), e),
            })?;
        Ok(file.credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn explicit_all() -> ExplicitCredentials {
        ExplicitCredentials {
            username: Some("cli-user".to_string()),
            password: Some("cli-pass".to_string()),
            server: Some("cli.preservica.com".to_string()),
            tenant: None,
        }
    }

    #[test]
    fn test_command_line_wins() {
        let env: HashMap<&str, &str> = [
            (ENV_USERNAME, "env-user"),
            (ENV_PASSWORD, "env-pass"),
            (ENV_SERVER, "env.preservica.com"),
        ]
        .into_iter()
        .collect();
        let (credentials, source) = Credentials::resolve_with(
            &explicit_all(),
            |k| env.get(k).map(|v| v.to_string()),
            &[],
        )
        .unwrap();
        assert_eq!(source, CredentialSource::CommandLine);
        assert_eq!(credentials.username, "cli-user");
    }

    #[test]
    fn test_partial_command_line_falls_through() {
        let explicit = ExplicitCredentials {
            username: Some("cli-user".to_string()),
            ..Default::default()
        };
        let env: HashMap<&str, &str> = [
            (ENV_USERNAME, "env-user"),
            (ENV_PASSWORD, "env-pass"),
            (ENV_SERVER, "env.preservica.com"),
            (ENV_TENANT, "ACME"),
        ]
        .into_iter()
        .collect();
        let lookup = |k: &str| env.get(k).map(|v| v.to_string());
        let (credentials, source) = Credentials::resolve_with(&explicit, lookup, &[]).unwrap();
        assert_eq!(source, CredentialSource::Environment);
        assert_eq!(credentials.username, "env-user");
        assert_eq!(credentials.tenant.as_deref(), Some("ACME"));
    }

    #[test]
    fn test_credentials_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CREDENTIALS_FILE);
        std::fs::write(
            &path,
            concat!(
                "[credentials]\n",
                "username = \"file-user\"\n",
                "password = \"secret\"\n",
                "server = \"eu.preservica.com\"\n",
            ),
        )
        .unwrap();

        let missing = temp.path().join("missing.toml");
        let explicit = ExplicitCredentials::default();
        let (credentials, source) =
            Credentials::resolve_with(&explicit, no_env, &[missing, path.clone()]).unwrap();
        assert_eq!(source, CredentialSource::File(path));
        assert_eq!(credentials.server, "eu.preservica.com");
        assert_eq!(credentials.tenant, None);
    }

    #[test]
    fn test_malformed_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CREDENTIALS_FILE);
        std::fs::write(&path, "[credentials]\nusername = ").unwrap();
        let explicit = ExplicitCredentials::default();
        let err = Credentials::resolve_with(&explicit, no_env, &[path]).unwrap_err();
        assert!(matches!(err, OcflError::ConfigurationError { .. }));
    }

    #[test]
    fn test_nothing_found() {
        let explicit = ExplicitCredentials::default();
        let err = Credentials::resolve_with(&explicit, no_env, &[]).unwrap_err();
        assert!(err.to_string().contains("no credentials"));
    }

    #[test]
    fn test_debug_hides_password() {
        let (credentials, _) = Credentials::resolve_with(&explicit_all(), no_env, &[]).unwrap();
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("cli-pass"));
    }
}
