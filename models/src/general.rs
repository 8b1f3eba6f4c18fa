use common::env::Database;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;

use crate::{DbError, DbRes, MemoryDb, PgLocalCli};

const INIT_SQL: &str = include_str!("../migrations/init.sql");

/// Where request handlers get their client from.
#[derive(Clone)]
pub enum DbSource {
    Postgres(Pool),
    Memory(MemoryDb),
}

impl DbSource {
    pub async fn get_cli(&self) -> DbRes<PgLocalCli<'static>> {
        match self {
            DbSource::Postgres(pool) => Ok(PgLocalCli::Conn(pool.get().await?)),
            DbSource::Memory(db) => Ok(PgLocalCli::Memory(db.clone())),
        }
    }
}

pub fn connect_pool(conf: &Database) -> DbRes<Pool> {
    let mut cfg = Config::new();
    cfg.host = Some(conf.host.clone());
    cfg.port = Some(conf.port);
    cfg.user = Some(conf.user.clone());
    cfg.password = Some(conf.password.clone());
    cfg.dbname = Some(conf.dbname.clone());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });
    cfg.pool = Some(PoolConfig::new(conf.pool_size));
    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(|e| DbError::Backend(format!("create pool for {} failed: {}", conf.dbname, e)))
}

/// Create every table the service uses when missing.
pub async fn init_schema(cli: &mut PgLocalCli<'_>) -> DbRes<()> {
    cli.batch_execute(INIT_SQL).await?;
    info!("database schema is ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_declares_every_table() {
        for table in [
            "users",
            "verification_attempts",
            "posts",
            "comments",
            "post_likes",
            "comment_likes",
            "token_blacklist",
        ] {
            assert!(INIT_SQL.contains(&format!("create table if not exists {}(", table)));
        }
    }

    #[tokio::test]
    async fn test_memory_source_shares_tables() {
        let source = DbSource::Memory(MemoryDb::new());
        let mut cli = source.get_cli().await.unwrap();
        init_schema(&mut cli).await.unwrap();
        assert!(matches!(cli, PgLocalCli::Memory(_)));
    }
}
