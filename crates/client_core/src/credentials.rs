//! Token sources injected into the transport. The engine never stores or
//! refreshes tokens itself.

use std::sync::{PoisonError, RwLock};

pub trait CredentialProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

pub struct MissingCredentialProvider;

impl CredentialProvider for MissingCredentialProvider {
    fn token(&self) -> Option<String> {
        None
    }
}

/// Fixed token, or one the host application swaps after a re-login.
pub struct StaticCredentialProvider {
    token: RwLock<Option<String>>,
}

impl StaticCredentialProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn replace(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }
}

impl CredentialProvider for StaticCredentialProvider {
    fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Reads the token from an environment variable on every request.
pub struct EnvCredentialProvider {
    var: String,
}

impl EnvCredentialProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn token(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

impl<F> CredentialProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}
