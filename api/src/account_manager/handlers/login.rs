use common::data_structures::account_manager::{AuthStage, UserInfo};
use common::error_code::AccountManagerError::{
    AccountNotFound, InvalidCredentials, RegistrationIncomplete,
};
use common::error_code::BackendRes;
use common::hash::verify_password;
use models::account_manager::UserFilter;
use models::{DbError, PsqlOp};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::account_manager::LoginRequest;
use crate::utils::captcha;
use crate::utils::token_auth::issue_token_pair;
use crate::utils::AppContext;

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub auth_status: AuthStage,
    pub full_name: String,
}

pub async fn req(ctx: &AppContext, request_data: LoginRequest) -> BackendRes<LoginResponse> {
    let LoginRequest {
        userinput,
        password,
    } = request_data;
    let userinput = userinput.trim();
    let identity = captcha::validate(userinput).ok();
    //anything that is neither an email nor a phone number is tried as a username
    let (filter, searched_by) = match &identity {
        Some(identity) => (identity.user_filter(), identity.channel().label()),
        None => (UserFilter::ByUsername(userinput), "username"),
    };

    let mut db_cli = ctx.db_cli().await?;
    let user = match UserInfo::find_single(filter, &mut db_cli).await {
        Ok(user) => user.into_inner(),
        Err(DbError::DataNotFound(_)) => Err(AccountNotFound(searched_by))?,
        Err(err) => Err(err)?,
    };
    if !user.auth_status.can_login() {
        Err(RegistrationIncomplete)?;
    }
    if !verify_password(&password, &user.pwd_hash) {
        debug!("wrong password for user {}", user.id);
        Err(InvalidCredentials)?;
    }

    let tokens = issue_token_pair(ctx, &user.id)?;
    Ok(Some(LoginResponse {
        access: tokens.access,
        refresh: tokens.refresh,
        auth_status: user.auth_status,
        full_name: user.full_name(),
    }))
}
