pub mod creatures;
pub mod migrate;
pub mod types;

pub use sqlx::postgres::PgPool;
pub use types::*;
