/***
success 0
common 1-5
account_manage api 2000
post api 3000

error message is correspond with error code
*/

use thiserror::Error;

use crate::data_structures::account_manager::AuthChannel;

pub type BackendRes<D, E = BackendError> = Result<Option<D>, E>;

pub trait ErrorCode {
    fn code(&self) -> u16;
    /// http status the error is rendered with
    fn http_status(&self) -> u16;
}

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("internal error: {0}")]
    InternalError(String),
    #[error("Request param is invalid: {0}")]
    RequestParamInvalid(String),
    #[error("Db error: {0}")]
    DB(String),
    #[error("Authorization error: {0}")]
    Authorization(String),
    #[error("{0}")]
    AccountManager(#[from] AccountManagerError),
    #[error("{0}")]
    Post(#[from] PostError),
}

impl ErrorCode for BackendError {
    fn code(&self) -> u16 {
        match self {
            Self::InternalError(_) => 1,
            Self::RequestParamInvalid(_) => 2,
            Self::DB(_) => 3,
            Self::Authorization(_) => 5,
            Self::AccountManager(err) => err.code(),
            Self::Post(err) => err.code(),
        }
    }

    fn http_status(&self) -> u16 {
        match self {
            Self::InternalError(_) | Self::DB(_) => 500,
            Self::RequestParamInvalid(_) => 400,
            Self::Authorization(_) => 401,
            Self::AccountManager(err) => err.http_status(),
            Self::Post(err) => err.http_status(),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum AccountManagerError {
    #[error("{0}")]
    InvalidIdentifier(String),
    #[error("this {} is already taken", .0.label())]
    DuplicateIdentifier(AuthChannel),
    #[error("your verification code is invalid or has expired")]
    InvalidOrExpiredCode,
    #[error("a verification code was already sent and is still valid")]
    VerificationPending,
    #[error("registration is not complete for this account")]
    RegistrationIncomplete,
    #[error("no account is registered with this {0}")]
    AccountNotFound(&'static str),
    #[error("login or password is incorrect")]
    InvalidCredentials,
    #[error("{0}")]
    ValidationFailure(String),
    #[error("the verification code must be confirmed first")]
    CodeNotConfirmed,
    #[error("administrator role required")]
    AdminRequired,
}

impl ErrorCode for AccountManagerError {
    fn code(&self) -> u16 {
        match self {
            Self::InvalidIdentifier(_) => 2001,
            Self::DuplicateIdentifier(_) => 2002,
            Self::InvalidOrExpiredCode => 2003,
            Self::VerificationPending => 2004,
            Self::RegistrationIncomplete => 2005,
            Self::AccountNotFound(_) => 2006,
            Self::InvalidCredentials => 2007,
            Self::ValidationFailure(_) => 2008,
            Self::CodeNotConfirmed => 2009,
            Self::AdminRequired => 2010,
        }
    }

    fn http_status(&self) -> u16 {
        match self {
            Self::AccountNotFound(_) => 404,
            Self::InvalidCredentials => 401,
            Self::RegistrationIncomplete | Self::CodeNotConfirmed | Self::AdminRequired => 403,
            Self::VerificationPending => 429,
            _ => 400,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum PostError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("you do not have permission to {0}")]
    PermissionDenied(&'static str),
}

impl ErrorCode for PostError {
    fn code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 3001,
            Self::PermissionDenied(_) => 3002,
        }
    }

    fn http_status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::PermissionDenied(_) => 403,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_error_keeps_inner_code() {
        let err: BackendError = AccountManagerError::VerificationPending.into();
        assert_eq!(err.code(), 2004);
        assert_eq!(err.http_status(), 429);

        let err: BackendError = PostError::PermissionDenied("delete this post").into();
        assert_eq!(err.code(), 3002);
        assert_eq!(err.to_string(), "you do not have permission to delete this post");
    }

    #[test]
    fn test_duplicate_message_names_channel() {
        let err = AccountManagerError::DuplicateIdentifier(AuthChannel::Phone);
        assert_eq!(err.to_string(), "this phone number is already taken");
    }
}
