use log::{debug, info};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement,
};
use std::fs;
use std::path::Path;

use crate::config::AppConfig;

const SQLITE_SCHEMA: &str = include_str!("../schema-sqlite.sql");
const MYSQL_SCHEMA: &str = include_str!("../schema-mysql.sql");

pub async fn connect_db(config: &AppConfig) -> Result<DatabaseConnection, DbErr> {
    let url = config.database_url();
    ensure_sqlite_dir(&url);
    connect_url(&url).await
}

/// Opens a pool for `url` and makes sure every table exists.
pub async fn connect_url(url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(url.to_string());
    opt.sqlx_logging_level(log::LevelFilter::Debug);
    if url.contains(":memory:") {
        // each connection would otherwise see its own empty database
        opt.max_connections(1).min_connections(1);
    }
    let db = Database::connect(opt).await?;
    init_schema(&db).await?;
    info!("database ready ({:?})", db.get_database_backend());
    Ok(db)
}

fn ensure_sqlite_dir(url: &str) {
    if !url.starts_with("sqlite:") || url.contains(":memory:") {
        return;
    }
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = fs::create_dir_all(parent);
        }
    }
}

async fn init_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let sql = match backend {
        DatabaseBackend::Sqlite => SQLITE_SCHEMA,
        DatabaseBackend::MySql => MYSQL_SCHEMA,
        other => {
            return Err(DbErr::Custom(format!("unsupported database backend {:?}", other)));
        }
    };
    for stmt in split_sql(sql) {
        debug!("schema: {}", stmt.lines().next().unwrap_or_default());
        db.execute(Statement::from_string(backend, stmt)).await?;
    }
    Ok(())
}

fn split_sql(input: &str) -> Vec<String> {
    let mut buf = String::new();
    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") || trimmed.is_empty() {
            continue;
        }
        buf.push_str(line);
        buf.push('\n');
    }
    buf.split(';')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_sql_drops_comments_and_blank_statements() {
        let stmts = split_sql("-- header\nCREATE TABLE a (id INT);\n\nCREATE TABLE b (id INT);\n;");
        assert_eq!(stmts, vec!["CREATE TABLE a (id INT)", "CREATE TABLE b (id INT)"]);
    }

    #[test]
    fn sqlite_schema_declares_every_table() {
        let stmts = split_sql(SQLITE_SCHEMA);
        for table in ["user", "post", "vote", "comment", "session"] {
            let needle = format!("CREATE TABLE IF NOT EXISTS {} (", table);
            assert!(stmts.iter().any(|s| s.starts_with(&needle)), "missing {}", table);
        }
        assert!(stmts
            .iter()
            .any(|s| s.contains("UNIQUE INDEX IF NOT EXISTS uk_vote_user_post ON vote (user_id, post_id)")));
    }

    #[actix_web::test]
    async fn memory_database_bootstraps_twice() {
        let db = connect_url("sqlite::memory:").await.unwrap();
        // CREATE ... IF NOT EXISTS makes start-up idempotent
        init_schema(&db).await.unwrap();
    }
}
