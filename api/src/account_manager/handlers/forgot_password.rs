use common::data_structures::account_manager::UserInfo;
use common::data_structures::verification::CodePurpose;
use common::error_code::AccountManagerError::AccountNotFound;
use common::error_code::BackendRes;
use models::{DbError, PsqlOp};
use serde::{Deserialize, Serialize};

use crate::account_manager::ForgotPasswordRequest;
use crate::utils::captcha::{self, Captcha};
use crate::utils::token_auth::create_reset_token;
use crate::utils::AppContext;

#[derive(Serialize, Deserialize, Debug)]
pub struct ForgotPasswordResponse {
    pub reset_token: String,
}

/// Send a reset code to the given contact. The returned token only works on
/// `/users/verify` and `/users/reset-password`, for this code.
pub async fn req(
    ctx: &AppContext,
    request_data: ForgotPasswordRequest,
) -> BackendRes<ForgotPasswordResponse> {
    let identity = captcha::validate(&request_data.email_or_phone_number)?;
    let channel = identity.channel();
    let mut db_cli = ctx.db_cli().await?;
    let user = match UserInfo::find_single(identity.user_filter(), &mut db_cli).await {
        Ok(user) => user.into_inner(),
        Err(DbError::DataNotFound(_)) => Err(AccountNotFound(channel.label()))?,
        Err(err) => Err(err)?,
    };

    let attempt =
        Captcha::issue(ctx, &user, channel, CodePurpose::PasswordReset, &mut db_cli).await?;
    Captcha::deliver(ctx, &user, channel, &attempt.code)?;
    Ok(Some(ForgotPasswordResponse {
        reset_token: create_reset_token(ctx, &user.id, &attempt.id)?,
    }))
}
