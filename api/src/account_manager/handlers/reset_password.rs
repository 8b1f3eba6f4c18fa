use actix_web::HttpRequest;
use common::data_structures::account_manager::UserInfo;
use common::error_code::BackendRes;
use common::hash::hash_password;
use models::account_manager::{UserFilter, UserUpdater};
use models::PsqlOp;
use tracing::info;

use super::validation::check_password;
use crate::account_manager::ResetPasswordRequest;
use crate::utils::captcha::Captcha;
use crate::utils::token_auth::reset_credentials;
use crate::utils::{find_user_by_id, AppContext};

pub async fn req(
    req: HttpRequest,
    ctx: &AppContext,
    request_data: ResetPasswordRequest,
) -> BackendRes<String> {
    let (user_id, attempt_id) = reset_credentials(&req, ctx)?;
    let mut db_cli = ctx.db_cli().await?;
    let user = find_user_by_id(&user_id, &mut db_cli).await?;
    check_password(
        &request_data.password,
        &request_data.confirm_password,
        &user.username,
    )?;

    let pwd_hash = hash_password(&request_data.password, ctx.hash_iterations);
    let mut trans = db_cli.begin().await?;
    Captcha::consume_reset(&user.id, &attempt_id, &mut trans).await?;
    UserInfo::update_single(
        UserUpdater::PwdHash(&pwd_hash),
        UserFilter::ById(&user.id),
        &mut trans,
    )
    .await?;
    trans.commit().await?;
    info!("user {} reset the password", user.id);
    Ok(None)
}
