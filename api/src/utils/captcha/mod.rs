pub mod email;
pub mod sms;

use common::data_structures::account_manager::{AuthChannel, AuthStage, UserInfo};
use common::data_structures::verification::{CodePurpose, VerificationAttempt};
use common::env::ServiceMode;
use common::error_code::AccountManagerError::{
    CodeNotConfirmed, InvalidIdentifier, InvalidOrExpiredCode, VerificationPending,
};
use common::error_code::{AccountManagerError, BackendError};
use lazy_static::lazy_static;
use models::account_manager::{UserFilter, UserUpdater};
use models::verification::{CodeScope, VerificationFilter, VerificationUpdater};
use models::{PgLocalCli, PsqlOp};
use phonenumber::Mode;
use regex::Regex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::utils::AppContext;

pub const EMAIL_SUBJECT: &str = "Instagram authentication";

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,7}$").expect("email regex");
}

/// A classified login or signup identifier, already normalized:
/// emails lower-cased, phone numbers in E.164.
#[derive(PartialEq, Debug, Clone)]
pub enum Identity {
    Email(String),
    Phone(String),
}

impl Identity {
    pub fn channel(&self) -> AuthChannel {
        match self {
            Identity::Email(_) => AuthChannel::Email,
            Identity::Phone(_) => AuthChannel::Phone,
        }
    }

    pub fn user_filter(&self) -> UserFilter<'_> {
        match self {
            Identity::Email(email) => UserFilter::ByEmail(email),
            Identity::Phone(number) => UserFilter::ByPhone(number),
        }
    }
}

pub fn validate(input: &str) -> Result<Identity, AccountManagerError> {
    let input = input.trim();
    if EMAIL_RE.is_match(input) {
        return Ok(Identity::Email(input.to_lowercase()));
    }
    //must be a number that can actually be assigned, not just digit shaped
    if let Ok(number) = phonenumber::parse(None, input) {
        if phonenumber::is_valid(&number) {
            return Ok(Identity::Phone(number.format().mode(Mode::E164).to_string()));
        }
    }
    Err(InvalidIdentifier(
        "you must send a valid email address or phone number".to_string(),
    ))
}

pub struct Captcha;

impl Captcha {
    /// Persist a fresh code for `user` on `channel`.
    ///
    /// Fails with `VerificationPending` while an earlier code of any purpose
    /// is still pending. Two concurrent calls may both pass that check; both
    /// codes then stay valid.
    pub async fn issue(
        ctx: &AppContext,
        user: &UserInfo,
        channel: AuthChannel,
        purpose: CodePurpose,
        cli: &mut PgLocalCli<'_>,
    ) -> Result<VerificationAttempt, BackendError> {
        let now = ctx.now_millis();
        let pending = VerificationAttempt::count(
            VerificationFilter::Pending {
                user_id: &user.id,
                now,
            },
            cli,
        )
        .await?;
        if pending > 0 {
            Err(VerificationPending)?;
        }
        let code = ctx.gen_verify_code()?;
        let attempt =
            VerificationAttempt::new(user.id, channel, code.clone(), now).with_purpose(purpose);
        info!(
            "issue {} {} code for user {}, expires at {}",
            purpose, channel, user.id, attempt.expires_at
        );
        attempt.clone().insert(cli).await?;
        if ctx.service_mode != ServiceMode::Product {
            debug!("verification code of user {} is {}", user.id, code);
        }
        Ok(attempt)
    }

    /// Queue the code for delivery. Never waits for or reports the outcome.
    pub fn deliver(
        ctx: &AppContext,
        user: &UserInfo,
        channel: AuthChannel,
        code: &str,
    ) -> Result<(), BackendError> {
        let contact = user.contact(channel).ok_or_else(|| {
            BackendError::InternalError(format!("user {} has no {}", user.id, channel.label()))
        })?;
        let body = format!("Your confirmation code: {}", code);
        match channel {
            AuthChannel::Email => {
                ctx.notifier
                    .send_email(EMAIL_SUBJECT, &body, vec![contact.to_owned()])
            }
            AuthChannel::Phone => ctx.notifier.send_sms(contact, &body),
        }
        Ok(())
    }

    /// Confirm every pending attempt in `scope` carrying `code` and advance
    /// the account to `code_verified` unless it is already further.
    ///
    /// A wrong code counts against every pending attempt in `scope`; an
    /// attempt stops accepting codes after `MAX_CODE_FAILURES` of them.
    pub async fn check_user_code(
        ctx: &AppContext,
        user: &UserInfo,
        scope: CodeScope<'_>,
        code: &str,
        cli: &mut PgLocalCli<'_>,
    ) -> Result<AuthStage, BackendError> {
        let now = ctx.now_millis();
        let confirmed = VerificationAttempt::update(
            VerificationUpdater::Confirmed,
            VerificationFilter::PendingWithCode { scope, code, now },
            cli,
        )
        .await?;
        if confirmed == 0 {
            let failed = VerificationAttempt::update(
                VerificationUpdater::Failed,
                VerificationFilter::PendingInScope { scope, now },
                cli,
            )
            .await?;
            warn!("user {} sent a wrong code, {} attempts charged", user.id, failed);
            Err(InvalidOrExpiredCode)?;
        }
        let stage = user.auth_status.after_code_confirmed();
        if stage != user.auth_status {
            UserInfo::update_single(UserUpdater::AuthStatus(stage), UserFilter::ById(&user.id), cli)
                .await?;
        }
        Ok(stage)
    }

    /// Use up the confirmed reset attempt `attempt_id`. A second call for the
    /// same attempt fails with `CodeNotConfirmed`.
    pub async fn consume_reset(
        user_id: &Uuid,
        attempt_id: &Uuid,
        cli: &mut PgLocalCli<'_>,
    ) -> Result<(), BackendError> {
        let removed = VerificationAttempt::delete(
            VerificationFilter::Confirmed(CodeScope::Reset {
                user_id,
                attempt_id,
            }),
            cli,
        )
        .await?;
        if removed == 0 {
            Err(CodeNotConfirmed)?;
        }
        Ok(())
    }
}
