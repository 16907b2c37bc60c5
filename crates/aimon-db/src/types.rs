use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use ts_rs::TS;

/// A named ability with a short description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Power {
    pub name: String,
    pub description: String,
}

/// Creature row returned from SELECT / RETURNING queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Creature {
    pub id: i64,
    pub name: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub creature_type: String,
    #[sqlx(json)]
    pub powers: Vec<Power>,
    pub characteristics: String,
    pub image_url: String,
    /// Truncated doodle payload, kept for provenance only
    pub doodle_source: String,
    pub like_count: i32,
    /// Power name -> stored image reference
    #[sqlx(json)]
    #[serde(default)]
    pub action_images: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl Creature {
    /// Look up one of this creature's powers by name
    pub fn power(&self, name: &str) -> Option<&Power> {
        self.powers.iter().find(|p| p.name == name)
    }

    /// Stored action image for a power, if one was generated before
    pub fn action_image(&self, power: &str) -> Option<&str> {
        self.action_images.get(power).map(String::as_str)
    }
}

/// Parameters for inserting a newly generated creature
#[derive(Debug, Clone)]
pub struct NewCreature {
    pub name: String,
    pub creature_type: String,
    pub powers: Vec<Power>,
    pub characteristics: String,
    pub image_url: String,
    pub doodle_source: String,
}
