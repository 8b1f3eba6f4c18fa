use actix_web::HttpRequest;
use common::data_structures::account_manager::{UserInfo, UserRole};
use common::error_code::AccountManagerError::{AccountNotFound, AdminRequired};
use common::error_code::BackendRes;
use models::account_manager::UserFilter;
use models::PsqlOp;
use tracing::info;
use uuid::Uuid;

use crate::utils::{get_current_user, AppContext};

/// Remove an account together with its codes, posts, comments and likes.
pub async fn req(req: HttpRequest, ctx: &AppContext, user_id: Uuid) -> BackendRes<String> {
    let mut db_cli = ctx.db_cli().await?;
    let operator = get_current_user(&req, ctx, &mut db_cli).await?;
    if operator.user_role != UserRole::Admin {
        Err(AdminRequired)?;
    }
    let deleted = UserInfo::delete(UserFilter::ById(&user_id), &mut db_cli).await?;
    if deleted == 0 {
        Err(AccountNotFound("id"))?;
    }
    info!("admin {} deleted user {}", operator.id, user_id);
    Ok(None)
}
