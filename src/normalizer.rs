// src/normalizer.rs

//! Schema repair for user records of any vintage.
//!
//! Older `users.json` files contain records without a gamification
//! sub-record, records with only a `username`, and the old `user` role. Every
//! read of the Users collection passes each record through [`normalize`].

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::models::timestamp;
use crate::models::user::{Gamification, LegacyGamification, LegacyUser, Role, User};

/// Domain used for placeholder emails derived from legacy identity fields.
const PLACEHOLDER_EMAIL_DOMAIN: &str = "example.com";

/// Output of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub user: User,
    /// True when any field had to be synthesized or corrected.
    pub repaired: bool,
}

/// Repairs a raw record so it satisfies every `User` invariant.
///
/// Idempotent: normalizing an already normalized record changes nothing and
/// reports `repaired == false`. Unknown fields are carried over verbatim.
pub fn normalize(raw: LegacyUser) -> Normalized {
    let mut repaired = false;

    let email = match raw.email {
        Some(email) => email,
        None => {
            repaired = true;
            placeholder_email(raw.username.as_deref().unwrap_or(&raw.id))
        }
    };

    let role = raw.role.unwrap_or_else(|| {
        repaired = true;
        Role::default()
    });

    let gamification = match raw.gamification {
        Some(legacy) => {
            let (g, fixed) = repair_gamification(legacy);
            repaired |= fixed;
            g
        }
        None => {
            repaired = true;
            Gamification::default()
        }
    };

    let mut extra = raw.extra;
    let created_at = match raw.created_at {
        Some(value) => {
            let (parsed, fixed) = repair_created_at(value, &mut extra);
            repaired |= fixed;
            parsed
        }
        None => None,
    };

    Normalized {
        user: User {
            id: raw.id,
            email,
            username: raw.username,
            password_hash: raw.password_hash,
            role,
            gamification,
            created_at,
            extra,
        },
        repaired,
    }
}

/// Naive timestamps become UTC (a repair). Values that are not timestamps at
/// all stay in `extra` under their original key, so they are written back
/// unchanged.
fn repair_created_at(value: Value, extra: &mut Map<String, Value>) -> (Option<DateTime<Utc>>, bool) {
    if let Value::String(raw) = &value {
        if let Some(parsed) = timestamp::parse(raw) {
            return (Some(parsed), !timestamp::is_canonical(raw));
        }
    }
    extra.insert("createdAt".to_string(), value);
    (None, false)
}

fn placeholder_email(identity: &str) -> String {
    format!("{identity}@{PLACEHOLDER_EMAIL_DOMAIN}")
}

fn repair_gamification(legacy: LegacyGamification) -> (Gamification, bool) {
    let mut fixed = false;

    let mut counter = |value: Option<i64>, floor: i64| -> i64 {
        match value {
            Some(v) if v >= floor => v,
            _ => {
                fixed = true;
                floor
            }
        }
    };

    let points = counter(legacy.points, 0);
    let level = counter(legacy.level, 1);
    let streak = counter(legacy.streak, 0);

    let badges = match legacy.badges {
        Some(list) => {
            let original_len = list.len();
            let mut unique: Vec<String> = Vec::with_capacity(original_len);
            for badge in list {
                if !unique.contains(&badge) {
                    unique.push(badge);
                }
            }
            if unique.len() != original_len {
                fixed = true;
            }
            unique
        }
        None => {
            fixed = true;
            Vec::new()
        }
    };

    let level = match u32::try_from(level) {
        Ok(level) => level,
        Err(_) => {
            fixed = true;
            u32::MAX
        }
    };

    (
        Gamification {
            points: points as u64,
            level,
            badges,
            streak: streak as u64,
            extra: legacy.extra,
        },
        fixed,
    )
}
