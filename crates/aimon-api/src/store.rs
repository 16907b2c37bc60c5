use aimon_db::{Creature, NewCreature};
use async_trait::async_trait;
use sqlx::postgres::PgPool;

/// Creature persistence used by the route handlers and the gallery cache
#[async_trait]
pub trait CreatureStore: Send + Sync {
    /// All creatures, newest first
    async fn list(&self) -> Result<Vec<Creature>, sqlx::Error>;

    async fn get(&self, id: i64) -> Result<Option<Creature>, sqlx::Error>;

    async fn insert(&self, creature: &NewCreature) -> Result<Creature, sqlx::Error>;

    /// Increment the like count; `None` if the id is unknown
    async fn like(&self, id: i64) -> Result<Option<Creature>, sqlx::Error>;

    /// Attach an action image for `power`; `None` if the id is unknown
    async fn set_action_image(
        &self,
        id: i64,
        power: &str,
        image_url: &str,
    ) -> Result<Option<Creature>, sqlx::Error>;
}

/// PostgreSQL-backed store
pub struct PgCreatureStore {
    pool: PgPool,
}

impl PgCreatureStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CreatureStore for PgCreatureStore {
    async fn list(&self) -> Result<Vec<Creature>, sqlx::Error> {
        aimon_db::creatures::list(&self.pool).await
    }

    async fn get(&self, id: i64) -> Result<Option<Creature>, sqlx::Error> {
        aimon_db::creatures::get(&self.pool, id).await
    }

    async fn insert(&self, creature: &NewCreature) -> Result<Creature, sqlx::Error> {
        aimon_db::creatures::insert(&self.pool, creature).await
    }

    async fn like(&self, id: i64) -> Result<Option<Creature>, sqlx::Error> {
        aimon_db::creatures::like(&self.pool, id).await
    }

    async fn set_action_image(
        &self,
        id: i64,
        power: &str,
        image_url: &str,
    ) -> Result<Option<Creature>, sqlx::Error> {
        aimon_db::creatures::set_action_image(&self.pool, id, power, image_url).await
    }
}
