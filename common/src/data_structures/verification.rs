use serde_derive::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use super::account_manager::AuthChannel;
use crate::constants::MAX_CODE_FAILURES;

/// What a confirmed code unlocks.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CodePurpose {
    /// moves a new account to `code_verified`
    Activation,
    /// allows one password reset through the reset token it was issued with
    PasswordReset,
}

/// One issued code for one account on one channel.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct VerificationAttempt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code: String,
    pub channel: AuthChannel,
    pub purpose: CodePurpose,
    /// unix millis, fixed at creation
    pub expires_at: u64,
    pub is_confirmed: bool,
    /// wrong codes submitted against this attempt
    pub failures: u32,
}

impl VerificationAttempt {
    pub fn new(user_id: Uuid, channel: AuthChannel, code: String, now: u64) -> Self {
        VerificationAttempt {
            id: Uuid::new_v4(),
            user_id,
            code,
            channel,
            purpose: CodePurpose::Activation,
            expires_at: now + channel.code_ttl(),
            is_confirmed: false,
            failures: 0,
        }
    }

    pub fn with_purpose(mut self, purpose: CodePurpose) -> Self {
        self.purpose = purpose;
        self
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at < now
    }

    pub fn is_locked(&self) -> bool {
        self.failures >= MAX_CODE_FAILURES
    }

    /// Still able to be confirmed: not confirmed, not expired and not
    /// locked by too many wrong codes.
    pub fn is_pending(&self, now: u64) -> bool {
        !self.is_confirmed && !self.is_expired(now) && !self.is_locked()
    }
}
