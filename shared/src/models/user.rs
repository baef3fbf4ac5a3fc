//! User and Restaurant Models

use serde::{Deserialize, Serialize};

/// Account role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Manager,
    #[default]
    Customer,
}

impl UserRole {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "manager" => Some(Self::Manager),
            "customer" => Some(Self::Customer),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Customer => "customer",
        }
    }
}

/// Response of `GET /me`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: i64,
}

/// Response of `GET /managed-restaurant`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub manager_id: Option<String>,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip() {
        assert_eq!(UserRole::from_db("manager"), Some(UserRole::Manager));
        assert_eq!(UserRole::from_db(UserRole::Customer.as_db()), Some(UserRole::Customer));
        assert_eq!(UserRole::from_db("admin"), None);
    }
}
