use actix_web::HttpRequest;
use common::data_structures::account_manager::{AuthChannel, AuthStage, UserRole};
use common::error_code::BackendRes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::{get_current_user, AppContext};

#[derive(Serialize, Deserialize, Debug)]
pub struct UserInfoResponse {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub photo: Option<String>,
    pub user_role: UserRole,
    pub auth_type: AuthChannel,
    pub auth_status: AuthStage,
}

pub async fn req(req: HttpRequest, ctx: &AppContext) -> BackendRes<UserInfoResponse> {
    let mut db_cli = ctx.db_cli().await?;
    let user = get_current_user(&req, ctx, &mut db_cli).await?;
    Ok(Some(UserInfoResponse {
        id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        email: user.email,
        phone_number: user.phone_number,
        photo: user.photo,
        user_role: user.user_role,
        auth_type: user.auth_type,
        auth_status: user.auth_status,
    }))
}
