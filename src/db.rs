use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

pub async fn connect_sqlite(database_url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::testing;

    #[tokio::test]
    async fn test_database_files_are_removed_on_drop() {
        let db = testing::pool().await;
        let dir = db.dir().to_path_buf();
        testing::patient(&db, "Qian Er").await;
        assert!(dir.join("clinic.db").exists());

        db.pool.close().await;
        drop(db);
        assert!(!dir.exists());
    }
}
