use actix_web::HttpRequest;
use common::constants::PHOTO_EXTENSIONS;
use common::data_structures::account_manager::UserInfo;
use common::data_structures::has_allowed_extension;
use common::error_code::AccountManagerError::ValidationFailure;
use common::error_code::BackendRes;
use models::account_manager::{UserFilter, UserUpdater};
use models::PsqlOp;

use super::change_user_info::AuthStatusResponse;
use crate::account_manager::ChangeUserPhotoRequest;
use crate::utils::{get_current_user, AppContext};

pub async fn req(
    req: HttpRequest,
    ctx: &AppContext,
    request_data: ChangeUserPhotoRequest,
) -> BackendRes<AuthStatusResponse> {
    let photo = request_data.photo.trim();
    let mut db_cli = ctx.db_cli().await?;
    let user = get_current_user(&req, ctx, &mut db_cli).await?;
    let auth_status = user.auth_status.after_photo_attached()?;
    if !has_allowed_extension(photo, &PHOTO_EXTENSIONS) {
        Err(ValidationFailure(format!(
            "photo must be one of {}",
            PHOTO_EXTENSIONS.join(", ")
        )))?;
    }
    UserInfo::update_single(
        UserUpdater::Photo(photo, auth_status),
        UserFilter::ById(&user.id),
        &mut db_cli,
    )
    .await?;
    Ok(Some(AuthStatusResponse { auth_status }))
}
