// ── Daemon endpoints ──

use std::fmt;

use url::Url;

/// Opaque handle to a stored secret. The host's
/// [`SecretResolver`](crate::SecretResolver) turns it into a password at
/// connect time; the endpoint itself never carries the password.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretRef(String);

impl SecretRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn key(&self) -> &str {
        &self.0
    }
}

/// A daemon the engine can connect to. Immutable once selected.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Display name (the profile name for configured servers).
    pub name: String,
    /// Full RPC URL, e.g. `http://nas:9091/transmission/rpc`.
    pub url: Url,
    pub username: Option<String>,
    pub secret: Option<SecretRef>,
    /// Prompt for the password on every connect instead of resolving `secret`.
    pub ask_for_password: bool,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, url: Url) -> Self {
        Self {
            name: name.into(),
            url,
            username: None,
            secret: None,
            ask_for_password: false,
        }
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn with_secret(mut self, secret: SecretRef) -> Self {
        self.secret = Some(secret);
        self
    }

    #[must_use]
    pub fn asking_for_password(mut self) -> Self {
        self.ask_for_password = true;
        self
    }

    /// Host part of the URL, used in name-resolution messages.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }
}

/// Same daemon address and same user.
impl PartialEq for Endpoint {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url && self.username == other.username
    }
}

impl Eq for Endpoint {}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_display_name_and_secret() {
        let url = Url::parse("http://nas:9091/transmission/rpc").unwrap();
        let a = Endpoint::new("home", url.clone()).with_username("me");
        let b = Endpoint::new("nas", url)
            .with_username("me")
            .with_secret(SecretRef::new("nas"));
        assert_eq!(a, b);
        assert_ne!(a, b.clone().with_username("other"));
    }
}
