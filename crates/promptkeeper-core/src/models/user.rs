use serde::{Deserialize, Serialize};

/// Account details returned next to the token by login and registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl AuthUser {
    pub fn display_name(&self) -> &str {
        &self.username
    }
}
