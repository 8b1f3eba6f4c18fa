use std::fmt;
use std::sync::Mutex;

use common::data_structures::account_manager::{AuthStage, UserInfo};
use tokio_postgres::Row;
use uuid::Uuid;

use crate::memory::MemoryDb;
use crate::{parse_column, parse_uuid, DbRes, Entity, FormatSql, MemFilter, MemUpdater, PsqlOp};

pub type UserInfoEntity = Entity<UserInfo>;

#[derive(Clone, Debug)]
pub enum UserFilter<'a> {
    ById(&'a Uuid),
    ByUsername(&'a str),
    ByEmail(&'a str),
    ByPhone(&'a str),
}

impl fmt::Display for UserFilter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            UserFilter::ById(id) => format!("id={}", id.string4sql()),
            UserFilter::ByUsername(name) => format!("username={}", name.string4sql()),
            UserFilter::ByEmail(email) => format!("email={}", email.string4sql()),
            UserFilter::ByPhone(number) => format!("phone_number={}", number.string4sql()),
        };
        write!(f, "{}", description)
    }
}

impl MemFilter<UserInfo> for UserFilter<'_> {
    fn matches(&self, row: &UserInfo) -> bool {
        match self {
            UserFilter::ById(id) => row.id == **id,
            UserFilter::ByUsername(name) => row.username == *name,
            UserFilter::ByEmail(email) => row.email.as_deref() == Some(*email),
            UserFilter::ByPhone(number) => row.phone_number.as_deref() == Some(*number),
        }
    }
}

#[derive(Clone, Debug)]
pub enum UserUpdater<'a> {
    AuthStatus(AuthStage),
    Profile {
        username: &'a str,
        first_name: &'a str,
        last_name: &'a str,
        pwd_hash: &'a str,
        auth_status: AuthStage,
    },
    Photo(&'a str, AuthStage),
    PwdHash(&'a str),
}

impl fmt::Display for UserUpdater<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            UserUpdater::AuthStatus(stage) => format!("auth_status='{}'", stage),
            UserUpdater::Profile {
                username,
                first_name,
                last_name,
                pwd_hash,
                auth_status,
            } => format!(
                "username={},first_name={},last_name={},pwd_hash={},auth_status='{}'",
                username.string4sql(),
                first_name.string4sql(),
                last_name.string4sql(),
                pwd_hash.string4sql(),
                auth_status
            ),
            UserUpdater::Photo(photo, stage) => {
                format!("photo={},auth_status='{}'", photo.string4sql(), stage)
            }
            UserUpdater::PwdHash(hash) => format!("pwd_hash={}", hash.string4sql()),
        };
        write!(f, "{}", description)
    }
}

impl MemUpdater<UserInfo> for UserUpdater<'_> {
    fn apply(&self, row: &mut UserInfo) {
        match self {
            UserUpdater::AuthStatus(stage) => row.auth_status = *stage,
            UserUpdater::Profile {
                username,
                first_name,
                last_name,
                pwd_hash,
                auth_status,
            } => {
                row.username = username.to_string();
                row.first_name = first_name.to_string();
                row.last_name = last_name.to_string();
                row.pwd_hash = pwd_hash.to_string();
                row.auth_status = *auth_status;
            }
            UserUpdater::Photo(photo, stage) => {
                row.photo = Some(photo.to_string());
                row.auth_status = *stage;
            }
            UserUpdater::PwdHash(hash) => row.pwd_hash = hash.to_string(),
        }
    }
}

impl PsqlOp for UserInfo {
    type UpdaterContent<'a> = UserUpdater<'a>;
    type FilterContent<'b> = UserFilter<'b>;

    const TABLE: &'static str = "users";
    const COLUMNS: &'static str = "id,\
        username,\
        first_name,\
        last_name,\
        email,\
        phone_number,\
        pwd_hash,\
        user_role,\
        auth_type,\
        auth_status,\
        photo";

    fn from_row(row: &Row) -> DbRes<Self> {
        Ok(UserInfo {
            id: parse_uuid(row.try_get(0)?)?,
            username: row.try_get(1)?,
            first_name: row.try_get(2)?,
            last_name: row.try_get(3)?,
            email: row.try_get(4)?,
            phone_number: row.try_get(5)?,
            pwd_hash: row.try_get(6)?,
            user_role: parse_column(row.try_get(7)?)?,
            auth_type: parse_column(row.try_get(8)?)?,
            auth_status: parse_column(row.try_get(9)?)?,
            photo: row.try_get(10)?,
        })
    }

    fn insert_sql(&self) -> String {
        let UserInfo {
            id,
            username,
            first_name,
            last_name,
            email,
            phone_number,
            pwd_hash,
            user_role,
            auth_type,
            auth_status,
            photo,
        } = self;
        format!(
            "({}) values ({},{},{},{},{},{},{},'{}','{}','{}',{})",
            Self::COLUMNS,
            id.string4sql(),
            username.string4sql(),
            first_name.string4sql(),
            last_name.string4sql(),
            email.string4sql(),
            phone_number.string4sql(),
            pwd_hash.string4sql(),
            user_role,
            auth_type,
            auth_status,
            photo.string4sql()
        )
    }

    fn row_id(&self) -> Uuid {
        self.id
    }

    fn memory_table(db: &MemoryDb) -> &Mutex<Vec<Entity<Self>>> {
        &db.tables().users
    }

    fn conflicts_with(&self, other: &Self) -> bool {
        let same = |a: &Option<String>, b: &Option<String>| a.is_some() && a == b;
        self.username == other.username
            || same(&self.email, &other.email)
            || same(&self.phone_number, &other.phone_number)
    }

    fn cascade_delete(db: &MemoryDb, removed: &[Self]) -> DbRes<()> {
        db.remove_user_rows(&removed.iter().map(|u| u.id).collect::<Vec<_>>())
    }
}
