use actix_web::HttpRequest;
use common::data_structures::account_manager::AuthStage;
use common::error_code::BackendRes;
use serde::{Deserialize, Serialize};

use crate::account_manager::VerifyRequest;
use crate::utils::captcha::Captcha;
use crate::utils::token_auth::{code_credentials, issue_token_pair, CodeCredential};
use crate::utils::{find_user_by_id, AppContext};

/// Tokens are only handed out for activation codes; a reset token stays the
/// credential of the reset flow.
#[derive(Serialize, Deserialize, Debug)]
pub struct VerifyResponse {
    pub auth_status: AuthStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

pub async fn req(
    req: HttpRequest,
    ctx: &AppContext,
    request_data: VerifyRequest,
) -> BackendRes<VerifyResponse> {
    let credential = code_credentials(&req, ctx)?;
    let mut db_cli = ctx.db_cli().await?;
    let user = find_user_by_id(credential.user_id(), &mut db_cli).await?;
    let auth_status = Captcha::check_user_code(
        ctx,
        &user,
        credential.scope(),
        request_data.verification_code.trim(),
        &mut db_cli,
    )
    .await?;
    let (access, refresh) = match credential {
        CodeCredential::Access(_) => {
            let tokens = issue_token_pair(ctx, &user.id)?;
            (Some(tokens.access), Some(tokens.refresh))
        }
        CodeCredential::Reset { .. } => (None, None),
    };
    Ok(Some(VerifyResponse {
        auth_status,
        access,
        refresh,
    }))
}
