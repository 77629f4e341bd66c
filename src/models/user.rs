// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use super::timestamp;

/// Account role. Only consulted by the route layer for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Older records use `user`.
    #[default]
    #[serde(alias = "user")]
    Student,
    Teacher,
    Admin,
}

impl Role {
    /// Parses a role name as accepted from administrators.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }
}

/// Gamification sub-record carried by every normalized user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gamification {
    pub points: u64,
    /// Always >= 1.
    pub level: u32,
    /// Unique badge names in award order.
    pub badges: Vec<String>,
    pub streak: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Gamification {
    fn default() -> Self {
        Self {
            points: 0,
            level: 1,
            badges: Vec::new(),
            streak: 0,
            extra: Map::new(),
        }
    }
}

impl Gamification {
    pub fn has_badge(&self, name: &str) -> bool {
        self.badges.iter().any(|b| b == name)
    }

    /// Appends `name` unless it is already held. Returns whether it was added.
    pub fn add_badge(&mut self, name: String) -> bool {
        if self.has_badge(&name) {
            return false;
        }
        self.badges.push(name);
        true
    }
}

/// A user record as persisted in `users.json` after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,

    /// Unique across users; secondary lookup key for login.
    pub email: String,

    /// Legacy identity field kept for records that predate email logins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Argon2 password hash. Never part of a public view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,

    pub role: Role,

    pub gamification: Gamification,

    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,

    /// Fields this version does not understand pass through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The gamification sub-record as it may appear on older records: any field
/// may be missing, and counters may be out of range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyGamification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badges: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streak: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A user record of unknown vintage, exactly as read from disk.
/// Only `id` is mandatory; the normalizer repairs everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gamification: Option<LegacyGamification>,
    /// Kept raw: older records use naive timestamps, and unreadable values
    /// must survive a heal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Gamification> for LegacyGamification {
    fn from(g: Gamification) -> Self {
        Self {
            points: Some(i64::try_from(g.points).unwrap_or(i64::MAX)),
            level: Some(i64::from(g.level)),
            badges: Some(g.badges),
            streak: Some(i64::try_from(g.streak).unwrap_or(i64::MAX)),
            extra: g.extra,
        }
    }
}

impl From<User> for LegacyUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: Some(user.email),
            username: user.username,
            password_hash: user.password_hash,
            role: Some(user.role),
            gamification: Some(user.gamification.into()),
            created_at: user.created_at.and_then(|t| serde_json::to_value(t).ok()),
            extra: user.extra,
        }
    }
}

/// User view safe to send to clients (no credential material).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub gamification: Gamification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            gamification: user.gamification.clone(),
            created_at: user.created_at,
        }
    }
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "email must be a valid email"))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for an admin creating an account directly.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "email must be a valid email"))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub password: String,
    /// Display name, stored as `username`.
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    /// Role name; `student` when omitted.
    pub role: Option<String>,
}

/// DTO for an admin changing a user's role.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}
