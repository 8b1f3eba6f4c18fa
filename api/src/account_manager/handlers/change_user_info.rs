use actix_web::HttpRequest;
use common::data_structures::account_manager::{AuthStage, UserInfo};
use common::error_code::{AccountManagerError, BackendError, BackendRes};
use common::hash::hash_password;
use models::account_manager::{UserFilter, UserUpdater};
use models::{DbError, PsqlOp};
use serde::{Deserialize, Serialize};

use super::validation::{check_name, check_password, check_username};
use crate::account_manager::ChangeUserInfoRequest;
use crate::utils::{get_current_user, AppContext};

#[derive(Serialize, Deserialize, Debug)]
pub struct AuthStatusResponse {
    pub auth_status: AuthStage,
}

pub async fn req(
    req: HttpRequest,
    ctx: &AppContext,
    request_data: ChangeUserInfoRequest,
) -> BackendRes<AuthStatusResponse> {
    let ChangeUserInfoRequest {
        first_name,
        last_name,
        username,
        password,
        confirm_password,
    } = request_data;
    let mut db_cli = ctx.db_cli().await?;
    let user = get_current_user(&req, ctx, &mut db_cli).await?;
    let auth_status = user.auth_status.after_profile_completed()?;

    let username = username.trim();
    check_username(username)?;
    check_name("first name", first_name.trim())?;
    check_name("last name", last_name.trim())?;
    check_password(&password, &confirm_password, username)?;

    let taken = || {
        BackendError::from(AccountManagerError::ValidationFailure(
            "this username is already taken".to_string(),
        ))
    };
    if username != user.username
        && UserInfo::count(UserFilter::ByUsername(username), &mut db_cli).await? > 0
    {
        Err(taken())?;
    }

    let pwd_hash = hash_password(&password, ctx.hash_iterations);
    UserInfo::update_single(
        UserUpdater::Profile {
            username,
            first_name: first_name.trim(),
            last_name: last_name.trim(),
            pwd_hash: &pwd_hash,
            auth_status,
        },
        UserFilter::ById(&user.id),
        &mut db_cli,
    )
    .await
    .map_err(|err| match err {
        DbError::KeyAlreadyExist(_) => taken(),
        other => other.into(),
    })?;
    Ok(Some(AuthStatusResponse { auth_status }))
}
