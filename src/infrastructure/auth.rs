use crate::core::error::{AppError, AppResult};
use async_trait::async_trait;

/// Supplies a bearer token for the mail provider. The OAuth flow itself lives
/// outside this crate; scans only need a valid token at run start.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> AppResult<String>;
}

/// Reads the token from the environment, refreshed out-of-band.
pub struct EnvTokenProvider {
    var: String,
}

impl EnvTokenProvider {
    pub fn new() -> Self {
        Self::with_var("GMAIL_ACCESS_TOKEN")
    }

    pub fn with_var(var: &str) -> Self {
        dotenv::dotenv().ok();
        Self {
            var: var.to_string(),
        }
    }
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccessTokenProvider for EnvTokenProvider {
    async fn access_token(&self) -> AppResult<String> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(AppError::ServiceUnavailable(format!(
                "No access token available ({} not set)",
                self.var
            ))),
        }
    }
}
