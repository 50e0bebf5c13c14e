//! User model and auth DTOs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Account role in the client's vocabulary.
///
/// Backend values outside the known vocabulary are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    Tourist,
    Accommodation,
    Admin,
    Other(String),
}

impl UserRole {
    /// Map a backend `type` value (French or English) onto a known role.
    pub fn from_backend(value: &str) -> Option<Self> {
        match value.trim() {
            "hébergement" | "accommodation" => Some(Self::Accommodation),
            "touriste" | "tourist" => Some(Self::Tourist),
            "admin" | "administrateur" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Tourist => "tourist",
            Self::Accommodation => "accommodation",
            Self::Admin => "admin",
            Self::Other(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for UserRole {
    fn from(s: String) -> Self {
        Self::from_backend(&s).unwrap_or(Self::Other(s))
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.as_str().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub role: Option<UserRole>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Result of a successful login, user already normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Roles a visitor may pick when signing up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Tourist,
    Accommodation,
}

impl AccountType {
    /// Value of the backend `type` column
    pub fn backend_type(&self) -> &'static str {
        match self {
            Self::Tourist => "touriste",
            Self::Accommodation => "hébergement",
        }
    }

    /// Value of the backend `role` column
    pub fn backend_role(&self) -> &'static str {
        match self {
            Self::Tourist => "touriste",
            Self::Accommodation => "organisateur",
        }
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tourist" | "touriste" => Ok(Self::Tourist),
            "accommodation" | "hébergement" | "hebergement" => Ok(Self::Accommodation),
            other => Err(format!(
                "unknown account type '{}' (expected tourist or accommodation)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: AccountType,
}

/// Wire body of `POST /auth/register`, in the backend's vocabulary.
#[derive(Debug, Serialize)]
pub struct RegisterPayload<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
    pub nom: &'a str,
    #[serde(rename = "type")]
    pub account_type: &'static str,
    pub role: &'static str,
}

impl<'a> From<&'a RegisterRequest> for RegisterPayload<'a> {
    fn from(req: &'a RegisterRequest) -> Self {
        Self {
            email: &req.email,
            password: &req.password,
            name: &req.name,
            nom: &req.name,
            account_type: req.role.backend_type(),
            role: req.role.backend_role(),
        }
    }
}
