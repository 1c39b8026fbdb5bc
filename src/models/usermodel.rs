use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Engineer,
    Inspector,
    Specialist,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Engineer => "engineer",
            UserRole::Inspector => "inspector",
            UserRole::Specialist => "specialist",
        }
    }

    /// Admins and engineers may adjudicate pause requests.
    pub fn can_review_pauses(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Engineer)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: Option<DateTime<Utc>>, // Database has DEFAULT NOW()
}
