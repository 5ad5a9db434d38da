//! Account endpoints

use eduvid_core::TokenResponse;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::error::ClientResult;
use super::transport::Transport;

#[derive(Serialize)]
struct LoginForm<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterQuery<'a> {
    email: &'a str,
    password: &'a str,
    full_name: &'a str,
}

#[derive(Debug, Clone)]
pub struct AuthService {
    transport: Arc<Transport>,
}

impl AuthService {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// Exchange credentials for an access token (OAuth2 password form)
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<TokenResponse> {
        let token: TokenResponse = self
            .transport
            .post_form("auth/token", &LoginForm { username, password })
            .await?;
        info!("🔑 Logged in as {}", username);
        Ok(token)
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> ClientResult<serde_json::Value> {
        let response = self
            .transport
            .post_query(
                "auth/register",
                &RegisterQuery {
                    email,
                    password,
                    full_name,
                },
            )
            .await?;
        info!("👤 Registered {}", email);
        Ok(response)
    }
}
