use actix_web::HttpRequest;
use common::error_code::BackendRes;
use tracing::info;

use crate::account_manager::LogoutRequest;
use crate::utils::token_auth::{self, validate_credentials};
use crate::utils::AppContext;

pub async fn req(
    req: HttpRequest,
    ctx: &AppContext,
    request_data: LogoutRequest,
) -> BackendRes<String> {
    let user_id = validate_credentials(&req, ctx)?;
    let mut db_cli = ctx.db_cli().await?;
    token_auth::blacklist(ctx, &request_data.refresh, &user_id, &mut db_cli).await?;
    info!("user {} logged out", user_id);
    Ok(None)
}
