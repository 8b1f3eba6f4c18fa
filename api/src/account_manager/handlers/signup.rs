use common::data_structures::account_manager::{AuthChannel, AuthStage, UserInfo, UserRole};
use common::data_structures::verification::CodePurpose;
use common::error_code::{AccountManagerError, BackendError, BackendRes};
use common::hash::ensure_hashed;
use models::{DbError, PsqlOp};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{gen_unique_username, last_uuid_group};
use crate::account_manager::SignupRequest;
use crate::utils::captcha::{self, Captcha, Identity};
use crate::utils::token_auth::issue_token_pair;
use crate::utils::AppContext;

#[derive(Serialize, Deserialize, Debug)]
pub struct SignupResponse {
    pub id: Uuid,
    pub auth_type: AuthChannel,
    pub auth_status: AuthStage,
    pub access: String,
    pub refresh: String,
}

pub async fn req(ctx: &AppContext, request_data: SignupRequest) -> BackendRes<SignupResponse> {
    let identity = captcha::validate(&request_data.email_or_phone_number)?;
    let channel = identity.channel();
    let duplicated = || BackendError::from(AccountManagerError::DuplicateIdentifier(channel));

    let mut db_cli = ctx.db_cli().await?;
    if UserInfo::count(identity.user_filter(), &mut db_cli).await? > 0 {
        Err(duplicated())?;
    }

    let id = Uuid::new_v4();
    let auto_password = format!("password-{}", last_uuid_group(&Uuid::new_v4()));
    let (email, phone_number) = match identity {
        Identity::Email(email) => (Some(email), None),
        Identity::Phone(number) => (None, Some(number)),
    };
    let user = UserInfo {
        id,
        username: gen_unique_username(ctx, &mut db_cli).await?,
        first_name: "".to_string(),
        last_name: "".to_string(),
        email,
        phone_number,
        pwd_hash: ensure_hashed(&auto_password, ctx.hash_iterations),
        user_role: UserRole::OrdinaryUser,
        auth_type: channel,
        auth_status: AuthStage::New,
        photo: None,
    };

    let mut trans = db_cli.begin().await?;
    user.clone().insert(&mut trans).await.map_err(|err| match err {
        //lost a race against a concurrent signup with the same identifier
        DbError::KeyAlreadyExist(_) => duplicated(),
        other => other.into(),
    })?;
    let attempt = Captcha::issue(ctx, &user, channel, CodePurpose::Activation, &mut trans).await?;
    trans.commit().await?;
    Captcha::deliver(ctx, &user, channel, &attempt.code)?;
    info!("user {} signed up {}", user.id, channel);

    let tokens = issue_token_pair(ctx, &user.id)?;
    Ok(Some(SignupResponse {
        id,
        auth_type: channel,
        auth_status: user.auth_status,
        access: tokens.access,
        refresh: tokens.refresh,
    }))
}
