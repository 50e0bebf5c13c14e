//! Login, registration and profile.

use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{LoginRequest, LoginResponse, RegisterPayload, RegisterRequest, User};
use crate::normalize::{normalize_user, user_payload};
use crate::transport::Transport;

#[derive(Clone)]
pub struct AuthService {
    transport: Arc<dyn Transport>,
}

impl AuthService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// `POST /auth/login`. The user is read from `user` or, failing that,
    /// from the top level of the response.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = serde_json::to_value(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let response = self
            .transport
            .request(Method::POST, "/auth/login", Some(body))
            .await?;

        let token = response
            .get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::decode("Login response has no token"))?
            .to_string();
        let user = normalize_user(user_payload(&response))
            .ok_or_else(|| ApiError::decode("Login response has no user"))?;

        tracing::info!(user_id = user.id, role = ?user.role, "Logged in");
        Ok(LoginResponse { token, user })
    }

    /// `POST /auth/register`. Returns the created user when the backend
    /// echoes it.
    pub async fn register(&self, request: &RegisterRequest) -> Result<Option<User>, ApiError> {
        let body = serde_json::to_value(RegisterPayload::from(request))?;
        let response = self
            .transport
            .request(Method::POST, "/auth/register", Some(body))
            .await?;

        let payload = user_payload(&response);
        if payload.get("id").is_none() && payload.get("email").is_none() {
            tracing::info!(email = %request.email, "Registered (no user in response)");
            return Ok(None);
        }
        let user = normalize_user(payload);
        tracing::info!(email = %request.email, "Registered");
        Ok(user)
    }

    /// `GET /users/profile`
    pub async fn profile(&self) -> Result<Option<User>, ApiError> {
        let response = self
            .transport
            .request(Method::GET, "/users/profile", None)
            .await?;
        Ok(normalize_user(user_payload(&response)))
    }
}
