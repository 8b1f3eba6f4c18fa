use actix_web::HttpRequest;
use common::data_structures::verification::CodePurpose;
use common::error_code::BackendRes;

use crate::utils::captcha::Captcha;
use crate::utils::{get_current_user, AppContext};

/// Send another code over the channel the account registered with.
pub async fn req(req: HttpRequest, ctx: &AppContext) -> BackendRes<String> {
    let mut db_cli = ctx.db_cli().await?;
    let user = get_current_user(&req, ctx, &mut db_cli).await?;
    let attempt =
        Captcha::issue(ctx, &user, user.auth_type, CodePurpose::Activation, &mut db_cli).await?;
    Captcha::deliver(ctx, &user, user.auth_type, &attempt.code)?;
    Ok(Some(format!(
        "a new verification code was sent to your {}",
        user.auth_type.label()
    )))
}
