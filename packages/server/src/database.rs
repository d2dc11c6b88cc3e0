use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use crate::config::DatabaseConfig;

/// Open the connection pool and bring the schema in sync with the entities.
///
/// Finish transactions hold an entry-row lock for only a handful of
/// statements and leaderboard reads are short, so a small pool is enough;
/// a large one would just move contention from the lock to the database.
/// Statement logging stays off because keystroke replacement emits one
/// insert per finish and would drown the log.
pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(16)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(120))
        .max_lifetime(Duration::from_secs(30 * 60))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("server::entity::*").sync(&db).await?;

    Ok(db)
}
