use std::fmt;
use std::sync::Mutex;

use common::data_structures::token::BlacklistedToken;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::memory::MemoryDb;
use crate::{parse_uuid, DbRes, Entity, FormatSql, Immutable, MemFilter, PsqlOp};

#[derive(Clone, Debug)]
pub enum BlacklistFilter<'a> {
    ByJti(&'a Uuid),
}

impl fmt::Display for BlacklistFilter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            BlacklistFilter::ByJti(jti) => format!("jti={}", jti.string4sql()),
        };
        write!(f, "{}", description)
    }
}

impl MemFilter<BlacklistedToken> for BlacklistFilter<'_> {
    fn matches(&self, row: &BlacklistedToken) -> bool {
        match self {
            BlacklistFilter::ByJti(jti) => row.jti == **jti,
        }
    }
}

impl PsqlOp for BlacklistedToken {
    //rows are never updated
    type UpdaterContent<'a> = Immutable;
    type FilterContent<'b> = BlacklistFilter<'b>;

    const TABLE: &'static str = "token_blacklist";
    const COLUMNS: &'static str = "jti,user_id,expires_at";

    fn from_row(row: &Row) -> DbRes<Self> {
        Ok(BlacklistedToken {
            jti: parse_uuid(row.try_get(0)?)?,
            user_id: parse_uuid(row.try_get(1)?)?,
            expires_at: row.try_get::<usize, i64>(2)? as u64,
        })
    }

    fn insert_sql(&self) -> String {
        format!(
            "({}) values ({},{},{})",
            Self::COLUMNS,
            self.jti.string4sql(),
            self.user_id.string4sql(),
            self.expires_at
        )
    }

    fn row_id(&self) -> Uuid {
        self.jti
    }

    fn memory_table(db: &MemoryDb) -> &Mutex<Vec<Entity<Self>>> {
        &db.tables().token_blacklist
    }
}
