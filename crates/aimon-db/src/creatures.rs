use crate::types::{Creature, NewCreature};
use sqlx::types::Json;
use sqlx::PgPool;

const CREATURE_COLUMNS: &str = r#"
    id, name, type, powers, characteristics, image_url,
    doodle_source, like_count, action_images, created_at
"#;

/// List every creature, newest first
pub async fn list(pool: &PgPool) -> Result<Vec<Creature>, sqlx::Error> {
    sqlx::query_as::<_, Creature>(&format!(
        "SELECT {CREATURE_COLUMNS} FROM creatures ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(pool)
    .await
}

/// Get a single creature by id
pub async fn get(pool: &PgPool, id: i64) -> Result<Option<Creature>, sqlx::Error> {
    sqlx::query_as::<_, Creature>(&format!(
        "SELECT {CREATURE_COLUMNS} FROM creatures WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Insert a creature, returning the stored row with its assigned id
pub async fn insert(pool: &PgPool, p: &NewCreature) -> Result<Creature, sqlx::Error> {
    sqlx::query_as::<_, Creature>(&format!(
        r#"
        INSERT INTO creatures (name, type, powers, characteristics, image_url, doodle_source)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {CREATURE_COLUMNS}
        "#
    ))
    .bind(&p.name)
    .bind(&p.creature_type)
    .bind(Json(&p.powers))
    .bind(&p.characteristics)
    .bind(&p.image_url)
    .bind(&p.doodle_source)
    .fetch_one(pool)
    .await
}

/// Increment the like count, returning the updated row (None if the id is unknown)
pub async fn like(pool: &PgPool, id: i64) -> Result<Option<Creature>, sqlx::Error> {
    sqlx::query_as::<_, Creature>(&format!(
        r#"
        UPDATE creatures SET like_count = like_count + 1
        WHERE id = $1
        RETURNING {CREATURE_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Record the action image for one power, replacing any earlier one
pub async fn set_action_image(
    pool: &PgPool,
    id: i64,
    power: &str,
    image_url: &str,
) -> Result<Option<Creature>, sqlx::Error> {
    sqlx::query_as::<_, Creature>(&format!(
        r#"
        UPDATE creatures
        SET action_images = action_images || jsonb_build_object($2::text, $3::text)
        WHERE id = $1
        RETURNING {CREATURE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(power)
    .bind(image_url)
    .fetch_optional(pool)
    .await
}
