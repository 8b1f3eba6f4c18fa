use common::error_code::BackendRes;
use serde::{Deserialize, Serialize};

use crate::account_manager::RefreshRequest;
use crate::utils::token_auth;
use crate::utils::AppContext;

#[derive(Serialize, Deserialize, Debug)]
pub struct RefreshResponse {
    pub access: String,
}

pub async fn req(ctx: &AppContext, request_data: RefreshRequest) -> BackendRes<RefreshResponse> {
    let mut db_cli = ctx.db_cli().await?;
    let access = token_auth::refresh(ctx, &request_data.refresh, &mut db_cli).await?;
    Ok(Some(RefreshResponse { access }))
}
