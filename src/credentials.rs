//! Login material for one client session.

/// Username/password plus the token pair issued for them.
///
/// The token fields start empty unless the caller already holds tokens.
/// [`TokenManager`](crate::auth::TokenManager) fills them after a successful
/// password grant.
#[derive(Clone, Default)]
pub struct Credentials {
    /// API user name for the password grant.
    pub username: String,
    /// API user password for the password grant.
    pub password: String,
    /// Bearer token sent with every resource request.
    pub access_token: String,
    /// Refresh token issued alongside the access token.
    pub refresh_token: String,
}

impl Credentials {
    /// Credentials for a password grant; no tokens yet.
    pub fn new(username: &str, password: &str) -> Self {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
            ..Default::default()
        }
    }

    /// Credentials holding a pre-issued token pair. Skips the password grant.
    pub fn with_tokens(access_token: &str, refresh_token: &str) -> Self {
        Credentials {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            ..Default::default()
        }
    }

    /// True once an access token is held.
    pub fn has_access_token(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// True once a refresh token is held.
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}

// Secrets stay out of logs and panic messages.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<empty>" } else { "<redacted>" }
}
