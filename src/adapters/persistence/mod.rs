pub mod account;

use sqlx::PgPool;

/// Postgres-backed persistence. One struct implements every repository trait;
/// adapters stay thin mappings between rows and entities.
pub struct PostgresPersistence {
    pub pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}
