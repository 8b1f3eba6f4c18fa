use std::fmt;
use std::sync::Mutex;

use common::constants::MAX_CODE_FAILURES;
use common::data_structures::verification::{CodePurpose, VerificationAttempt};
use tokio_postgres::Row;
use uuid::Uuid;

use crate::memory::MemoryDb;
use crate::{parse_column, parse_uuid, DbRes, Entity, FormatSql, MemFilter, MemUpdater, PsqlOp};

pub type VerificationAttemptEntity = Entity<VerificationAttempt>;

/// Attempts a submitted code is checked against.
#[derive(Clone, Copy, Debug)]
pub enum CodeScope<'a> {
    /// activation codes of the account
    Activation(&'a Uuid),
    /// the single password reset attempt a reset token was issued with
    Reset {
        user_id: &'a Uuid,
        attempt_id: &'a Uuid,
    },
}

impl fmt::Display for CodeScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeScope::Activation(user_id) => write!(
                f,
                "user_id={} and purpose='{}'",
                user_id.string4sql(),
                CodePurpose::Activation
            ),
            CodeScope::Reset {
                user_id,
                attempt_id,
            } => write!(
                f,
                "id={} and user_id={} and purpose='{}'",
                attempt_id.string4sql(),
                user_id.string4sql(),
                CodePurpose::PasswordReset
            ),
        }
    }
}

impl CodeScope<'_> {
    fn matches(&self, row: &VerificationAttempt) -> bool {
        match self {
            CodeScope::Activation(user_id) => {
                row.user_id == **user_id && row.purpose == CodePurpose::Activation
            }
            CodeScope::Reset {
                user_id,
                attempt_id,
            } => {
                row.id == **attempt_id
                    && row.user_id == **user_id
                    && row.purpose == CodePurpose::PasswordReset
            }
        }
    }
}

fn pending_sql(now: u64) -> String {
    format!(
        "is_confirmed=false and expires_at>={} and failures<{}",
        now, MAX_CODE_FAILURES
    )
}

#[derive(Clone, Debug)]
pub enum VerificationFilter<'a> {
    /// every attempt of the account, newest first
    ByUser(&'a Uuid),
    /// attempts of the account of any purpose still valid at `now`
    Pending { user_id: &'a Uuid, now: u64 },
    /// attempts in `scope` still valid at `now`
    PendingInScope { scope: CodeScope<'a>, now: u64 },
    /// pending attempts in `scope` carrying `code`
    PendingWithCode {
        scope: CodeScope<'a>,
        code: &'a str,
        now: u64,
    },
    /// attempts in `scope` that were confirmed
    Confirmed(CodeScope<'a>),
}

impl fmt::Display for VerificationFilter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            VerificationFilter::ByUser(user_id) => format!("user_id={}", user_id.string4sql()),
            VerificationFilter::Pending { user_id, now } => {
                format!("user_id={} and {}", user_id.string4sql(), pending_sql(*now))
            }
            VerificationFilter::PendingInScope { scope, now } => {
                format!("{} and {}", scope, pending_sql(*now))
            }
            VerificationFilter::PendingWithCode { scope, code, now } => format!(
                "{} and code={} and {}",
                scope,
                code.string4sql(),
                pending_sql(*now)
            ),
            VerificationFilter::Confirmed(scope) => format!("{} and is_confirmed=true", scope),
        };
        write!(f, "{}", description)
    }
}

impl MemFilter<VerificationAttempt> for VerificationFilter<'_> {
    fn matches(&self, row: &VerificationAttempt) -> bool {
        match self {
            VerificationFilter::ByUser(user_id) => row.user_id == **user_id,
            VerificationFilter::Pending { user_id, now } => {
                row.user_id == **user_id && row.is_pending(*now)
            }
            VerificationFilter::PendingInScope { scope, now } => {
                scope.matches(row) && row.is_pending(*now)
            }
            VerificationFilter::PendingWithCode { scope, code, now } => {
                scope.matches(row) && row.code == *code && row.is_pending(*now)
            }
            VerificationFilter::Confirmed(scope) => scope.matches(row) && row.is_confirmed,
        }
    }

    fn newest_first(&self) -> bool {
        true
    }
}

#[derive(Clone, Debug)]
pub enum VerificationUpdater {
    Confirmed,
    /// one more wrong code
    Failed,
}

impl fmt::Display for VerificationUpdater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            VerificationUpdater::Confirmed => "is_confirmed=true",
            VerificationUpdater::Failed => "failures=failures+1",
        };
        write!(f, "{}", description)
    }
}

impl MemUpdater<VerificationAttempt> for VerificationUpdater {
    fn apply(&self, row: &mut VerificationAttempt) {
        match self {
            VerificationUpdater::Confirmed => row.is_confirmed = true,
            VerificationUpdater::Failed => row.failures += 1,
        }
    }
}

impl PsqlOp for VerificationAttempt {
    type UpdaterContent<'a> = VerificationUpdater;
    type FilterContent<'b> = VerificationFilter<'b>;

    const TABLE: &'static str = "verification_attempts";
    const COLUMNS: &'static str = "id,user_id,code,channel,purpose,expires_at,is_confirmed,failures";

    fn from_row(row: &Row) -> DbRes<Self> {
        Ok(VerificationAttempt {
            id: parse_uuid(row.try_get(0)?)?,
            user_id: parse_uuid(row.try_get(1)?)?,
            code: row.try_get(2)?,
            channel: parse_column(row.try_get(3)?)?,
            purpose: parse_column(row.try_get(4)?)?,
            expires_at: row.try_get::<usize, i64>(5)? as u64,
            is_confirmed: row.try_get(6)?,
            failures: row.try_get::<usize, i32>(7)? as u32,
        })
    }

    fn insert_sql(&self) -> String {
        format!(
            "({}) values ({},{},{},'{}','{}',{},{},{})",
            Self::COLUMNS,
            self.id.string4sql(),
            self.user_id.string4sql(),
            self.code.string4sql(),
            self.channel,
            self.purpose,
            self.expires_at,
            self.is_confirmed,
            self.failures
        )
    }

    fn row_id(&self) -> Uuid {
        self.id
    }

    fn memory_table(db: &MemoryDb) -> &Mutex<Vec<Entity<Self>>> {
        &db.tables().verification_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PgLocalCli;
    use common::data_structures::account_manager::AuthChannel;

    #[tokio::test]
    async fn test_pending_lookup_respects_expiry_and_confirmation() {
        let mut cli = PgLocalCli::Memory(MemoryDb::new());
        let user_id = Uuid::new_v4();
        let attempt = VerificationAttempt::new(user_id, AuthChannel::Email, "1234".into(), 1_000);
        let expires_at = attempt.expires_at;
        attempt.insert(&mut cli).await.unwrap();

        let pending = VerificationAttempt::count(
            VerificationFilter::Pending {
                user_id: &user_id,
                now: expires_at,
            },
            &mut cli,
        )
        .await
        .unwrap();
        assert_eq!(pending, 1);
        let expired = VerificationAttempt::count(
            VerificationFilter::Pending {
                user_id: &user_id,
                now: expires_at + 1,
            },
            &mut cli,
        )
        .await
        .unwrap();
        assert_eq!(expired, 0);

        let scope = CodeScope::Activation(&user_id);
        let wrong_code = VerificationAttempt::update(
            VerificationUpdater::Confirmed,
            VerificationFilter::PendingWithCode {
                scope,
                code: "9999",
                now: 1_000,
            },
            &mut cli,
        )
        .await
        .unwrap();
        assert_eq!(wrong_code, 0);
        let confirmed = VerificationAttempt::update(
            VerificationUpdater::Confirmed,
            VerificationFilter::PendingWithCode {
                scope,
                code: "1234",
                now: 1_000,
            },
            &mut cli,
        )
        .await
        .unwrap();
        assert_eq!(confirmed, 1);

        let latest = VerificationAttempt::find_page(VerificationFilter::ByUser(&user_id), 1, 0, &mut cli)
            .await
            .unwrap();
        assert!(latest[0].inner.is_confirmed);
    }

    #[tokio::test]
    async fn test_reset_scope_only_sees_its_attempt() {
        let mut cli = PgLocalCli::Memory(MemoryDb::new());
        let user_id = Uuid::new_v4();
        let activation = VerificationAttempt::new(user_id, AuthChannel::Email, "1234".into(), 0);
        let reset = VerificationAttempt::new(user_id, AuthChannel::Email, "1234".into(), 0)
            .with_purpose(CodePurpose::PasswordReset);
        let reset_id = reset.id;
        activation.insert(&mut cli).await.unwrap();
        reset.insert(&mut cli).await.unwrap();

        let scope = CodeScope::Reset {
            user_id: &user_id,
            attempt_id: &reset_id,
        };
        for _ in 0..MAX_CODE_FAILURES {
            let failed = VerificationAttempt::update(
                VerificationUpdater::Failed,
                VerificationFilter::PendingInScope { scope, now: 0 },
                &mut cli,
            )
            .await
            .unwrap();
            assert_eq!(failed, 1);
        }
        //locked now, the right code no longer confirms it
        let confirmed = VerificationAttempt::update(
            VerificationUpdater::Confirmed,
            VerificationFilter::PendingWithCode {
                scope,
                code: "1234",
                now: 0,
            },
            &mut cli,
        )
        .await
        .unwrap();
        assert_eq!(confirmed, 0);

        let activation_pending = VerificationAttempt::count(
            VerificationFilter::PendingInScope {
                scope: CodeScope::Activation(&user_id),
                now: 0,
            },
            &mut cli,
        )
        .await
        .unwrap();
        assert_eq!(activation_pending, 1);
    }

    #[test]
    fn test_pending_with_code_sql() {
        let user_id = Uuid::nil();
        assert_eq!(
            VerificationFilter::PendingWithCode {
                scope: CodeScope::Activation(&user_id),
                code: "1234",
                now: 7,
            }
            .to_string(),
            "user_id='00000000-0000-0000-0000-000000000000' and purpose='activation' \
             and code='1234' and is_confirmed=false and expires_at>=7 and failures<5"
        );
        assert_eq!(
            VerificationFilter::Confirmed(CodeScope::Reset {
                user_id: &user_id,
                attempt_id: &user_id,
            })
            .to_string(),
            "id='00000000-0000-0000-0000-000000000000' \
             and user_id='00000000-0000-0000-0000-000000000000' \
             and purpose='password_reset' and is_confirmed=true"
        );
    }
}
