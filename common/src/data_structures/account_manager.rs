use serde_derive::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use crate::constants::{EMAIL_CODE_EXPIRE_TIME, PHONE_CODE_EXPIRE_TIME};
use crate::error_code::AccountManagerError;

/// Medium an account registered with; codes are delivered over the same medium.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
pub enum AuthChannel {
    #[serde(rename = "via_email")]
    #[strum(serialize = "via_email")]
    Email,
    #[serde(rename = "via_phone")]
    #[strum(serialize = "via_phone")]
    Phone,
}

impl AuthChannel {
    /// Lifetime of a verification code issued on this channel, in milliseconds.
    pub fn code_ttl(&self) -> u64 {
        match self {
            AuthChannel::Email => EMAIL_CODE_EXPIRE_TIME,
            AuthChannel::Phone => PHONE_CODE_EXPIRE_TIME,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuthChannel::Email => "email",
            AuthChannel::Phone => "phone number",
        }
    }
}

/// Registration progress of an account.
///
/// Stages are totally ordered and an account only ever moves forward:
/// `New -> CodeVerified -> Done -> PhotoDone`.
#[derive(
    Deserialize,
    Serialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumString,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuthStage {
    New,
    CodeVerified,
    Done,
    PhotoDone,
}

impl AuthStage {
    /// Only accounts that finished their profile may authenticate.
    pub fn can_login(&self) -> bool {
        *self >= AuthStage::Done
    }

    /// Stage after a verification code was confirmed. Accounts already at
    /// `Done` or beyond keep their stage.
    pub fn after_code_confirmed(self) -> AuthStage {
        if self < AuthStage::Done {
            AuthStage::CodeVerified
        } else {
            self
        }
    }

    /// Stage after the profile fields were submitted. A `New` account has
    /// to confirm its code first.
    pub fn after_profile_completed(self) -> Result<AuthStage, AccountManagerError> {
        match self {
            AuthStage::New => Err(AccountManagerError::RegistrationIncomplete),
            AuthStage::CodeVerified => Ok(AuthStage::Done),
            AuthStage::Done | AuthStage::PhotoDone => Ok(self),
        }
    }

    /// Stage after a profile photo was attached.
    pub fn after_photo_attached(self) -> Result<AuthStage, AccountManagerError> {
        match self {
            AuthStage::New | AuthStage::CodeVerified => {
                Err(AccountManagerError::RegistrationIncomplete)
            }
            AuthStage::Done | AuthStage::PhotoDone => Ok(AuthStage::PhotoDone),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserRole {
    OrdinaryUser,
    Manager,
    Admin,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    //stored lower-cased
    pub email: Option<String>,
    //stored in E.164 form
    pub phone_number: Option<String>,
    pub pwd_hash: String,
    pub user_role: UserRole,
    pub auth_type: AuthChannel,
    pub auth_status: AuthStage,
    pub photo: Option<String>,
}

impl UserInfo {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Address a code for `channel` is delivered to.
    pub fn contact(&self, channel: AuthChannel) -> Option<&str> {
        match channel {
            AuthChannel::Email => self.email.as_deref(),
            AuthChannel::Phone => self.phone_number.as_deref(),
        }
    }
}
