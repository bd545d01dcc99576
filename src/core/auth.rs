use anyhow::Result;

use crate::core::config::ApiConfig;

pub const SESSION_KEY_ENV: &str = "CLAUDE_SESSION_KEY";

#[derive(Debug, Clone)]
pub struct SessionCredentials {
    pub session_key: String,
}

impl SessionCredentials {
    /// Value for the `Cookie` request header.
    pub fn cookie_header(&self) -> String {
        format!("sessionKey={}", self.session_key)
    }
}

/// Resolve the session key: environment first, then the config file.
pub fn resolve_session(api: &ApiConfig) -> Result<SessionCredentials> {
    let from_env = std::env::var(SESSION_KEY_ENV).ok();
    session_from(from_env, api.session_key.clone())
}

fn session_from(env: Option<String>, configured: Option<String>) -> Result<SessionCredentials> {
    let key = env
        .filter(|k| !k.trim().is_empty())
        .or(configured.filter(|k| !k.trim().is_empty()));
    match key {
        Some(key) => Ok(SessionCredentials {
            session_key: key.trim().to_string(),
        }),
        None => anyhow::bail!(
            "No session key found: set {} or api.session_key in the config file",
            SESSION_KEY_ENV
        ),
    }
}
