//! Configuration types for the Nexus client.
//!
//! Connection settings live in [`NexusConfig`]. On disk they are kept in a
//! plain `key=value` file (see [`ConfigFile`]):
//!
//! ```text
//! nexus_url=https://nexus.example.com
//! login=cleaner
//! password=secret
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ClientError;

/// Default name of the configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "nexus-cleaner.conf";

/// Configuration for the Nexus client.
#[derive(Debug, Clone)]
pub struct NexusConfig {
    /// Nexus base URL (e.g., "<https://nexus.example.com>").
    pub url: String,

    /// Authentication configuration.
    pub auth: NexusAuth,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl NexusConfig {
    /// Creates a new configuration with the given base URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use nexus_cleaner_client::NexusConfig;
    ///
    /// let config = NexusConfig::new("https://nexus.example.com");
    /// assert_eq!(config.url, "https://nexus.example.com");
    /// ```
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth: NexusAuth::None,
            timeout: Duration::from_secs(30),
            user_agent: format!("nexus-cleaner/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Sets the authentication method.
    #[must_use]
    pub fn with_auth(mut self, auth: NexusAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Authentication methods for Nexus access.
#[derive(Clone)]
pub enum NexusAuth {
    /// Anonymous access.
    None,

    /// HTTP basic authentication.
    Basic {
        /// Login.
        username: String,
        /// Password.
        password: String,
    },
}

impl NexusAuth {
    /// Creates basic authentication.
    ///
    /// # Examples
    ///
    /// ```
    /// use nexus_cleaner_client::NexusAuth;
    ///
    /// let auth = NexusAuth::basic("cleaner", "secret");
    /// ```
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for NexusAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Contents of a `key=value` configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    /// Nexus base URL.
    pub nexus_url: String,
    /// Login.
    pub login: String,
    /// Password.
    pub password: String,
}

impl ConfigFile {
    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, cannot be read, or lacks a
    /// required key.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ClientError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let text = std::fs::read_to_string(path).map_err(|e| ClientError::ConfigIo {
            path: PathBuf::from(path),
            source: e,
        })?;

        Self::parse(&text, &path.display().to_string())
    }

    /// Parses configuration text.
    ///
    /// Lines are split on the first `=`. Blank lines, `#` comments and lines
    /// without `=` are skipped; the last occurrence of a key wins. `origin` is
    /// only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingConfigKey`] if `nexus_url`, `login` or
    /// `password` is absent or empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use nexus_cleaner_client::ConfigFile;
    ///
    /// let config = ConfigFile::parse(
    ///     "nexus_url=https://nexus.example.com\nlogin=cleaner\npassword=a=b",
    ///     "inline",
    /// )?;
    /// assert_eq!(config.password, "a=b");
    /// # Ok::<(), nexus_cleaner_client::ClientError>(())
    /// ```
    pub fn parse(text: &str, origin: &str) -> Result<Self, ClientError> {
        let mut keys: HashMap<&str, &str> = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                keys.insert(key.trim(), value.trim());
            }
        }

        let required = |key: &str| -> Result<String, ClientError> {
            keys.get(key)
                .filter(|value| !value.is_empty())
                .map(|value| (*value).to_string())
                .ok_or_else(|| ClientError::MissingConfigKey {
                    key: key.to_string(),
                    path: origin.to_string(),
                })
        };

        Ok(Self {
            nexus_url: required("nexus_url")?,
            login: required("login")?,
            password: required("password")?,
        })
    }

    /// Converts the file contents into a client configuration using basic
    /// authentication.
    #[must_use]
    pub fn into_config(self) -> NexusConfig {
        NexusConfig::new(self.nexus_url).with_auth(NexusAuth::basic(self.login, self.password))
    }
}
