//! Credential types
//!
//! These hold resolved secrets (after config files and environment
//! variables have been read).

use base64::Engine as _;
use std::collections::BTreeMap;

/// Credentials attached to every request a transport sends
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    /// No authentication
    #[default]
    None,

    /// HTTP Basic authentication (account email + API token)
    Basic {
        /// Username or account email
        username: String,
        /// Password or API token
        password: String,
    },

    /// Bearer token authentication
    Bearer {
        /// The bearer token
        token: String,
    },

    /// Arbitrary headers, passed through untouched
    Headers(BTreeMap<String, String>),
}

impl Credentials {
    /// Create Basic credentials
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Create Bearer credentials
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Check if any credentials are configured
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Render the credentials as request headers
    pub fn headers(&self) -> Vec<(String, String)> {
        match self {
            Self::None => Vec::new(),
            Self::Basic { username, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{password}"));
                vec![("Authorization".to_string(), format!("Basic {encoded}"))]
            }
            Self::Bearer { token } => {
                vec![("Authorization".to_string(), format!("Bearer {token}"))]
            }
            Self::Headers(headers) => headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("Credentials::None"),
            Self::Basic { username, .. } => f
                .debug_struct("Credentials::Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Bearer { .. } => f
                .debug_struct("Credentials::Bearer")
                .field("token", &"<redacted>")
                .finish(),
            Self::Headers(headers) => f
                .debug_struct("Credentials::Headers")
                .field("names", &headers.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}
