//! encapsulation of some postgresql interface for easy call
//!
//! Every table is reachable through [`PsqlOp`]. A [`PgLocalCli`] is either a
//! pooled connection, an open transaction or the in-process [`MemoryDb`];
//! filters and updaters render to sql through `Display` and are evaluated
//! directly against rows by the memory backend.

pub mod account_manager;
pub mod comment;
pub mod general;
pub mod like;
pub mod memory;
pub mod post;
pub mod token_blacklist;
pub mod verification;

#[macro_use]
extern crate tracing;

use std::fmt::Display;
use std::sync::Mutex;

use async_trait::async_trait;
use common::error_code::BackendError;
use common::utils::time::current_date;
use deadpool_postgres::{Object, Transaction};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_postgres::error::SqlState;
use tokio_postgres::Row;
use uuid::Uuid;

pub use memory::MemoryDb;

pub type DbRes<T> = Result<T, DbError>;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("DBError::DataNotFound: {0}")]
    DataNotFound(String),
    #[error("DBError::RepeatedData: {0}")]
    RepeatedData(String),
    #[error("DBError::KeyAlreadyExist: {0}")]
    KeyAlreadyExist(String),
    #[error("DBError::Backend: {0}")]
    Backend(String),
}

impl From<tokio_postgres::Error> for DbError {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
            DbError::KeyAlreadyExist(err.to_string())
        } else {
            DbError::Backend(err.to_string())
        }
    }
}

impl From<deadpool_postgres::PoolError> for DbError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        DbError::Backend(err.to_string())
    }
}

impl From<DbError> for BackendError {
    fn from(err: DbError) -> Self {
        BackendError::DB(err.to_string())
    }
}

/// A stored row together with its audit timestamps.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Entity<T> {
    pub inner: T,
    pub updated_at: String,
    pub created_at: String,
}

impl<T> Entity<T> {
    pub fn new(inner: T) -> Self {
        Entity {
            inner,
            updated_at: "".to_string(),
            created_at: "".to_string(),
        }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

pub enum PgLocalCli<'a> {
    Conn(Object),
    Trans(Transaction<'a>),
    Memory(MemoryDb),
}

impl PgLocalCli<'_> {
    pub async fn execute(&mut self, sql: &str) -> DbRes<u64> {
        let line = match self {
            PgLocalCli::Conn(c) => c.execute(sql, &[]).await?,
            PgLocalCli::Trans(t) => t.execute(sql, &[]).await?,
            PgLocalCli::Memory(_) => Err(DbError::Backend(
                "raw sql is not supported by the memory backend".to_string(),
            ))?,
        };
        Ok(line)
    }

    pub async fn query(&mut self, sql: &str) -> DbRes<Vec<Row>> {
        let rows = match self {
            PgLocalCli::Conn(c) => c.query(sql, &[]).await?,
            PgLocalCli::Trans(t) => t.query(sql, &[]).await?,
            PgLocalCli::Memory(_) => Err(DbError::Backend(
                "raw sql is not supported by the memory backend".to_string(),
            ))?,
        };
        Ok(rows)
    }

    pub async fn batch_execute(&mut self, sql: &str) -> DbRes<()> {
        match self {
            PgLocalCli::Conn(c) => c.batch_execute(sql).await?,
            PgLocalCli::Trans(t) => t.batch_execute(sql).await?,
            PgLocalCli::Memory(_) => {}
        }
        Ok(())
    }

    /// Writes to the memory backend apply immediately, so its transactions
    /// only group calls.
    pub async fn begin(&mut self) -> DbRes<PgLocalCli<'_>> {
        match self {
            PgLocalCli::Conn(c) => {
                let trans = c.transaction().await?;
                Ok(PgLocalCli::Trans(trans))
            }
            PgLocalCli::Trans(_t) => Err(DbError::Backend("It is already a trans".to_string())),
            PgLocalCli::Memory(db) => Ok(PgLocalCli::Memory(db.clone())),
        }
    }

    pub async fn commit(self) -> DbRes<()> {
        match self {
            PgLocalCli::Conn(_c) => Err(DbError::Backend("it's not a trans".to_string())),
            PgLocalCli::Trans(t) => Ok(t.commit().await?),
            PgLocalCli::Memory(_) => Ok(()),
        }
    }

    fn memory(&self) -> Option<MemoryDb> {
        match self {
            PgLocalCli::Memory(db) => Some(db.clone()),
            _ => None,
        }
    }
}

impl From<Object> for PgLocalCli<'_> {
    fn from(value: Object) -> Self {
        Self::Conn(value)
    }
}

impl<'a> From<Transaction<'a>> for PgLocalCli<'a> {
    fn from(value: Transaction<'a>) -> Self {
        Self::Trans(value)
    }
}

impl From<MemoryDb> for PgLocalCli<'_> {
    fn from(value: MemoryDb) -> Self {
        Self::Memory(value)
    }
}

/// Row predicate used by the memory backend, the sql twin of a filter's `Display`.
pub trait MemFilter<T> {
    fn matches(&self, row: &T) -> bool;

    /// newest rows first instead of creation order
    fn newest_first(&self) -> bool {
        false
    }
}

/// Row mutation used by the memory backend, the sql twin of an updater's `Display`.
pub trait MemUpdater<T> {
    fn apply(&self, row: &mut T);
}

/// Updater of tables whose rows are only inserted and deleted.
#[derive(Clone, Debug)]
pub enum Immutable {}

impl Display for Immutable {
    fn fmt(&self, _f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {}
    }
}

impl<T> MemUpdater<T> for Immutable {
    fn apply(&self, _row: &mut T) {
        match *self {}
    }
}

pub(crate) fn lock_err<E: Display>(err: E) -> DbError {
    DbError::Backend(format!("memory table poisoned: {}", err))
}

fn order_clause(newest_first: bool) -> &'static str {
    if newest_first {
        "order by created_at desc"
    } else {
        "order by created_at asc"
    }
}

fn memory_select<T, F>(
    table: &Mutex<Vec<Entity<T>>>,
    filter: &F,
    limit: Option<(u64, u64)>,
) -> DbRes<Vec<Entity<T>>>
where
    T: Clone,
    F: MemFilter<T> + ?Sized,
{
    let rows = table.lock().map_err(lock_err)?;
    let mut found: Vec<Entity<T>> = rows
        .iter()
        .filter(|row| filter.matches(&row.inner))
        .cloned()
        .collect();
    if filter.newest_first() {
        found.reverse();
    }
    if let Some((limit, offset)) = limit {
        found = found
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
    }
    Ok(found)
}

#[async_trait]
pub trait PsqlOp: Sized + Clone + Send + Sync + 'static {
    type UpdaterContent<'a>: Display + Send + Sync + MemUpdater<Self>;
    type FilterContent<'b>: Display + Send + Sync + MemFilter<Self>;

    const TABLE: &'static str;
    /// select list read by `from_row`, timestamps excluded
    const COLUMNS: &'static str;

    fn from_row(row: &Row) -> DbRes<Self>;

    /// `(columns) values (...)` part of the insert statement
    fn insert_sql(&self) -> String;

    fn row_id(&self) -> Uuid;

    fn memory_table(db: &MemoryDb) -> &Mutex<Vec<Entity<Self>>>;

    /// whether `self` and `other` collide on a unique key
    fn conflicts_with(&self, _other: &Self) -> bool {
        false
    }

    /// memory twin of `on delete cascade`
    fn cascade_delete(_db: &MemoryDb, _removed: &[Self]) -> DbRes<()> {
        Ok(())
    }

    fn entity_from_row(row: &Row) -> DbRes<Entity<Self>> {
        let len = row.len();
        Ok(Entity {
            inner: Self::from_row(row)?,
            updated_at: row.try_get(len - 2)?,
            created_at: row.try_get(len - 1)?,
        })
    }

    async fn find(
        filter: Self::FilterContent<'_>,
        cli: &mut PgLocalCli<'_>,
    ) -> DbRes<Vec<Entity<Self>>> {
        if let Some(db) = cli.memory() {
            return memory_select(Self::memory_table(&db), &filter, None);
        }
        let sql = format!(
            "select {},cast(updated_at as text),cast(created_at as text) from {} where {} {}",
            Self::COLUMNS,
            Self::TABLE,
            filter,
            order_clause(filter.newest_first())
        );
        debug!("find {}: raw sql {}", Self::TABLE, sql);
        let rows = cli.query(sql.as_str()).await?;
        rows.iter().map(Self::entity_from_row).collect()
    }

    async fn find_page(
        filter: Self::FilterContent<'_>,
        limit: u64,
        offset: u64,
        cli: &mut PgLocalCli<'_>,
    ) -> DbRes<Vec<Entity<Self>>> {
        if let Some(db) = cli.memory() {
            return memory_select(Self::memory_table(&db), &filter, Some((limit, offset)));
        }
        let sql = format!(
            "select {},cast(updated_at as text),cast(created_at as text) from {} where {} {} limit {} offset {}",
            Self::COLUMNS,
            Self::TABLE,
            filter,
            order_clause(filter.newest_first()),
            limit,
            offset
        );
        debug!("find page {}: raw sql {}", Self::TABLE, sql);
        let rows = cli.query(sql.as_str()).await?;
        rows.iter().map(Self::entity_from_row).collect()
    }

    async fn count(filter: Self::FilterContent<'_>, cli: &mut PgLocalCli<'_>) -> DbRes<u64> {
        if let Some(db) = cli.memory() {
            return Ok(memory_select(Self::memory_table(&db), &filter, None)?.len() as u64);
        }
        let sql = format!("select count(1) from {} where {}", Self::TABLE, filter);
        let rows = cli.query(sql.as_str()).await?;
        let num: i64 = match rows.first() {
            Some(row) => row.try_get(0)?,
            None => 0,
        };
        Ok(num as u64)
    }

    async fn find_single(
        filter: Self::FilterContent<'_>,
        cli: &mut PgLocalCli<'_>,
    ) -> DbRes<Entity<Self>> {
        let filter_str = filter.to_string();
        let mut get_res = Self::find(filter, cli).await?;
        match get_res.len() {
            0 => Err(DbError::DataNotFound(format!("{} where {}", Self::TABLE, filter_str))),
            1 => get_res
                .pop()
                .ok_or_else(|| DbError::DataNotFound(Self::TABLE.to_string())),
            _ => {
                error!("repeated data in {} where {}", Self::TABLE, filter_str);
                Err(DbError::RepeatedData(format!("{} where {}", Self::TABLE, filter_str)))
            }
        }
    }

    async fn update(
        new_value: Self::UpdaterContent<'_>,
        filter: Self::FilterContent<'_>,
        cli: &mut PgLocalCli<'_>,
    ) -> DbRes<u64> {
        if let Some(db) = cli.memory() {
            let mut rows = Self::memory_table(&db).lock().map_err(lock_err)?;
            let now = current_date();
            let mut changed = vec![];
            for (index, row) in rows.iter().enumerate() {
                if filter.matches(&row.inner) {
                    let mut next = row.inner.clone();
                    new_value.apply(&mut next);
                    changed.push((index, next));
                }
            }
            for (index, next) in &changed {
                let clash = rows.iter().enumerate().any(|(other, row)| {
                    other != *index
                        && row.inner.row_id() != next.row_id()
                        && next.conflicts_with(&row.inner)
                });
                if clash {
                    return Err(DbError::KeyAlreadyExist(format!(
                        "{} set {}",
                        Self::TABLE,
                        new_value
                    )));
                }
            }
            let num = changed.len() as u64;
            for (index, next) in changed {
                rows[index].inner = next;
                rows[index].updated_at = now.clone();
            }
            return Ok(num);
        }
        let sql = format!(
            "update {} set {},updated_at=CURRENT_TIMESTAMP where {}",
            Self::TABLE,
            new_value,
            filter
        );
        debug!("start update {} ", sql);
        let execute_res = cli.execute(sql.as_str()).await?;
        debug!("success update {} rows", execute_res);
        Ok(execute_res)
    }

    async fn update_single(
        new_value: Self::UpdaterContent<'_>,
        filter: Self::FilterContent<'_>,
        cli: &mut PgLocalCli<'_>,
    ) -> DbRes<()> {
        let filter_str = filter.to_string();
        let row_num = Self::update(new_value, filter, cli).await?;
        match row_num {
            0 => Err(DbError::DataNotFound(format!("{} where {}", Self::TABLE, filter_str))),
            1 => Ok(()),
            _ => Err(DbError::RepeatedData(format!("{} where {}", Self::TABLE, filter_str))),
        }
    }

    async fn insert(self, cli: &mut PgLocalCli<'_>) -> DbRes<()> {
        if let Some(db) = cli.memory() {
            let mut rows = Self::memory_table(&db).lock().map_err(lock_err)?;
            if rows
                .iter()
                .any(|row| row.inner.row_id() == self.row_id() || self.conflicts_with(&row.inner))
            {
                return Err(DbError::KeyAlreadyExist(format!(
                    "{} {}",
                    Self::TABLE,
                    self.row_id()
                )));
            }
            let now = current_date();
            rows.push(Entity {
                inner: self,
                updated_at: now.clone(),
                created_at: now,
            });
            return Ok(());
        }
        let sql = format!("insert into {} {};", Self::TABLE, self.insert_sql());
        debug!("row sql {}", sql);
        let execute_res = cli.execute(sql.as_str()).await?;
        debug!("success insert {} rows", execute_res);
        Ok(())
    }

    /// insert after check key, returns whether a row was written
    async fn safe_insert(
        self,
        filter: Self::FilterContent<'_>,
        cli: &mut PgLocalCli<'_>,
    ) -> DbRes<bool> {
        let filter_str = filter.to_string();
        let find_res = Self::find(filter, cli).await?;
        if find_res.is_empty() {
            match self.insert(cli).await {
                Ok(()) => Ok(true),
                //lost a race against an identical insert
                Err(DbError::KeyAlreadyExist(_)) => Ok(false),
                Err(err) => Err(err),
            }
        } else {
            info!("data {} already exist", filter_str);
            Ok(false)
        }
    }

    async fn delete(filter: Self::FilterContent<'_>, cli: &mut PgLocalCli<'_>) -> DbRes<u64> {
        if let Some(db) = cli.memory() {
            let removed: Vec<Self> = {
                let mut rows = Self::memory_table(&db).lock().map_err(lock_err)?;
                let (removed, kept): (Vec<_>, Vec<_>) = rows
                    .drain(..)
                    .partition(|row| filter.matches(&row.inner));
                *rows = kept;
                removed.into_iter().map(Entity::into_inner).collect()
            };
            Self::cascade_delete(&db, &removed)?;
            return Ok(removed.len() as u64);
        }
        let sql = format!("delete from {} where {}", Self::TABLE, filter);
        debug!("start delete {} ", sql);
        let execute_res = cli.execute(sql.as_str()).await?;
        Ok(execute_res)
    }
}

pub trait FormatSql {
    fn string4sql(&self) -> String;
}

impl FormatSql for str {
    fn string4sql(&self) -> String {
        format!("'{}'", self.replace('\'', "''"))
    }
}

impl FormatSql for String {
    fn string4sql(&self) -> String {
        self.as_str().string4sql()
    }
}

impl FormatSql for Uuid {
    fn string4sql(&self) -> String {
        format!("'{}'", self)
    }
}

impl<T: FormatSql> FormatSql for Option<T> {
    fn string4sql(&self) -> String {
        self.as_ref()
            .map(|x| x.string4sql())
            .unwrap_or("NULL".to_string())
    }
}

pub(crate) fn parse_uuid(raw: &str) -> DbRes<Uuid> {
    raw.parse()
        .map_err(|e: uuid::Error| DbError::Backend(format!("invalid uuid {}: {}", raw, e)))
}

pub(crate) fn parse_column<T>(raw: &str) -> DbRes<T>
where
    T: std::str::FromStr,
    T::Err: Display,
{
    raw.parse()
        .map_err(|e: T::Err| DbError::Backend(format!("invalid column value {}: {}", raw, e)))
}
