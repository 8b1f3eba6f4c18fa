use actix_web::http::header;
use actix_web::HttpRequest;
use common::constants::RESET_TOKEN_EXPIRE_TIME;
use common::data_structures::token::BlacklistedToken;
use common::error_code::BackendError;
use common::error_code::BackendError::Authorization;
use common::utils::time::clock_secs;
use jsonwebtoken::{decode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use models::token_blacklist::BlacklistFilter;
use models::verification::CodeScope;
use models::{PgLocalCli, PsqlOp};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use uuid::Uuid;

use crate::utils::AppContext;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
    /// handed out by forgot-password; only good for checking the reset
    /// code and setting the new password
    Reset,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub jti: Uuid,
    pub token_type: TokenType,
    /// reset attempt a `Reset` token was issued with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt: Option<Uuid>,
    //seconds
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

fn encode_claims(
    ctx: &AppContext,
    user_id: &Uuid,
    token_type: TokenType,
    attempt: Option<Uuid>,
) -> Result<String, BackendError> {
    let iat = clock_secs(ctx.clock.as_ref());
    let ttl_millis = match token_type {
        TokenType::Access => ctx.token.access_ttl,
        TokenType::Refresh => ctx.token.refresh_ttl,
        TokenType::Reset => RESET_TOKEN_EXPIRE_TIME,
    };
    let claims = Claims {
        sub: *user_id,
        jti: Uuid::new_v4(),
        token_type,
        attempt,
        iat,
        exp: iat + ttl_millis / 1000,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(ctx.token.secret.as_bytes()),
    )
    .map_err(|e| BackendError::InternalError(format!("encode token failed: {}", e)))
}

pub fn create_jwt(
    ctx: &AppContext,
    user_id: &Uuid,
    token_type: TokenType,
) -> Result<String, BackendError> {
    encode_claims(ctx, user_id, token_type, None)
}

/// Token bound to the password reset attempt `attempt_id`.
pub fn create_reset_token(
    ctx: &AppContext,
    user_id: &Uuid,
    attempt_id: &Uuid,
) -> Result<String, BackendError> {
    encode_claims(ctx, user_id, TokenType::Reset, Some(*attempt_id))
}

pub fn issue_token_pair(ctx: &AppContext, user_id: &Uuid) -> Result<TokenPair, BackendError> {
    Ok(TokenPair {
        access: create_jwt(ctx, user_id, TokenType::Access)?,
        refresh: create_jwt(ctx, user_id, TokenType::Refresh)?,
    })
}

//expiry is checked against the injected clock, not the system time
fn validate_jwt(ctx: &AppContext, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(ctx.token.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
}

fn decode_claims(ctx: &AppContext, token: &str) -> Result<Claims, BackendError> {
    let claim_dat = validate_jwt(ctx, token)
        .map_err(|_err| Authorization("Invalid token signature".to_string()))?;
    if clock_secs(ctx.clock.as_ref()) > claim_dat.exp {
        Err(Authorization("Token has expired.".to_string()))?
    }
    Ok(claim_dat)
}

pub fn decode_token(
    ctx: &AppContext,
    token: &str,
    expected: TokenType,
) -> Result<Claims, BackendError> {
    let claim_dat = decode_claims(ctx, token)?;
    if claim_dat.token_type != expected {
        Err(Authorization(format!("Token is not an {} token", expected)))?
    }
    Ok(claim_dat)
}

fn bearer_token(req: &HttpRequest) -> Result<Option<&str>, BackendError> {
    let Some(auth_header) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let auth_str = auth_header
        .to_str()
        .map_err(|_err| Authorization("Token is invalid".to_string()))?;
    if auth_str.starts_with("bearer ") || auth_str.starts_with("Bearer ") {
        Ok(Some(&auth_str["bearer ".len()..]))
    } else {
        Err(Authorization("Token is invalid or malformed".to_string()))
    }
}

/// Account id of a request that must carry a valid access token.
pub fn validate_credentials(req: &HttpRequest, ctx: &AppContext) -> Result<Uuid, BackendError> {
    let token =
        bearer_token(req)?.ok_or(Authorization("No Authorization header".to_string()))?;
    Ok(decode_token(ctx, token, TokenType::Access)?.sub)
}

/// Like [`validate_credentials`] but an absent header means an anonymous
/// caller. A present but invalid token is still rejected.
pub fn optional_credentials(
    req: &HttpRequest,
    ctx: &AppContext,
) -> Result<Option<Uuid>, BackendError> {
    match bearer_token(req)? {
        Some(token) => Ok(Some(decode_token(ctx, token, TokenType::Access)?.sub)),
        None => Ok(None),
    }
}

/// Bearer of a code submission: an account owner checking an activation
/// code, or a forgot-password caller checking the reset code.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CodeCredential {
    Access(Uuid),
    Reset { user_id: Uuid, attempt_id: Uuid },
}

impl CodeCredential {
    pub fn user_id(&self) -> &Uuid {
        match self {
            CodeCredential::Access(user_id) => user_id,
            CodeCredential::Reset { user_id, .. } => user_id,
        }
    }

    pub fn scope(&self) -> CodeScope<'_> {
        match self {
            CodeCredential::Access(user_id) => CodeScope::Activation(user_id),
            CodeCredential::Reset {
                user_id,
                attempt_id,
            } => CodeScope::Reset {
                user_id,
                attempt_id,
            },
        }
    }
}

/// Credential of `/users/verify`, the only route besides reset-password
/// that takes a reset token.
pub fn code_credentials(
    req: &HttpRequest,
    ctx: &AppContext,
) -> Result<CodeCredential, BackendError> {
    let token =
        bearer_token(req)?.ok_or(Authorization("No Authorization header".to_string()))?;
    let claims = decode_claims(ctx, token)?;
    match (claims.token_type, claims.attempt) {
        (TokenType::Access, _) => Ok(CodeCredential::Access(claims.sub)),
        (TokenType::Reset, Some(attempt_id)) => Ok(CodeCredential::Reset {
            user_id: claims.sub,
            attempt_id,
        }),
        _ => Err(Authorization("Token can not verify a code".to_string())),
    }
}

/// Account id and reset attempt of a request carrying a reset token.
pub fn reset_credentials(
    req: &HttpRequest,
    ctx: &AppContext,
) -> Result<(Uuid, Uuid), BackendError> {
    let token =
        bearer_token(req)?.ok_or(Authorization("No Authorization header".to_string()))?;
    let claims = decode_token(ctx, token, TokenType::Reset)?;
    let attempt_id = claims
        .attempt
        .ok_or(Authorization("Reset token carries no attempt".to_string()))?;
    Ok((claims.sub, attempt_id))
}

/// Fresh access token for a refresh token that was not logged out.
pub async fn refresh(
    ctx: &AppContext,
    refresh_token: &str,
    cli: &mut PgLocalCli<'_>,
) -> Result<String, BackendError> {
    let claims = decode_token(ctx, refresh_token, TokenType::Refresh)?;
    let revoked = BlacklistedToken::count(BlacklistFilter::ByJti(&claims.jti), cli).await?;
    if revoked > 0 {
        Err(Authorization("Token is blacklisted".to_string()))?
    }
    create_jwt(ctx, &claims.sub, TokenType::Access)
}

/// Revoke a refresh token owned by `user_id`; revoking twice is a no-op.
pub async fn blacklist(
    ctx: &AppContext,
    refresh_token: &str,
    user_id: &Uuid,
    cli: &mut PgLocalCli<'_>,
) -> Result<(), BackendError> {
    let claims = decode_token(ctx, refresh_token, TokenType::Refresh)?;
    if claims.sub != *user_id {
        Err(Authorization("Token belongs to another account".to_string()))?
    }
    let record = BlacklistedToken {
        jti: claims.jti,
        user_id: claims.sub,
        expires_at: claims.exp,
    };
    record
        .safe_insert(BlacklistFilter::ByJti(&claims.jti), cli)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::api_test::{create_done_user, test_context, MutableClock};
    use common::utils::time::{DAY1, HOUR1};
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_token_roundtrip_and_expiry() {
        let clock = Arc::new(MutableClock::default());
        let ctx = test_context(clock.clone());
        let user_id = Uuid::new_v4();
        let pair = issue_token_pair(&ctx, &user_id).unwrap();

        let claims = decode_token(&ctx, &pair.access, TokenType::Access).unwrap();
        assert_eq!(claims.sub, user_id);
        assert!(decode_token(&ctx, &pair.access, TokenType::Refresh).is_err());
        assert!(decode_token(&ctx, "garbage", TokenType::Access).is_err());

        let reset = create_reset_token(&ctx, &user_id, &user_id).unwrap();
        let claims = decode_token(&ctx, &reset, TokenType::Reset).unwrap();
        assert_eq!(claims.attempt, Some(user_id));
        assert!(decode_token(&ctx, &reset, TokenType::Access).is_err());
        assert!(decode_token(&ctx, &pair.access, TokenType::Access)
            .unwrap()
            .attempt
            .is_none());

        clock.advance_millis(HOUR1 + 1000);
        assert!(decode_token(&ctx, &pair.access, TokenType::Access).is_err());
        assert!(decode_token(&ctx, &reset, TokenType::Reset).is_err());
        assert!(decode_token(&ctx, &pair.refresh, TokenType::Refresh).is_ok());
        clock.advance_millis(15 * DAY1);
        assert!(decode_token(&ctx, &pair.refresh, TokenType::Refresh).is_err());
    }

    #[actix_web::test]
    async fn test_blacklisted_refresh_is_rejected() {
        let ctx = test_context(Arc::new(MutableClock::default()));
        let (user, pair) = create_done_user(&ctx, "tokenuser", "s3cret-pass").await;
        let mut cli = ctx.db_cli().await.unwrap();

        let access = refresh(&ctx, &pair.refresh, &mut cli).await.unwrap();
        assert_eq!(
            decode_token(&ctx, &access, TokenType::Access).unwrap().sub,
            user.id
        );

        let res = blacklist(&ctx, &pair.refresh, &Uuid::new_v4(), &mut cli).await;
        assert!(matches!(res, Err(BackendError::Authorization(_))));
        blacklist(&ctx, &pair.refresh, &user.id, &mut cli).await.unwrap();
        blacklist(&ctx, &pair.refresh, &user.id, &mut cli).await.unwrap();
        let res = refresh(&ctx, &pair.refresh, &mut cli).await;
        assert!(matches!(res, Err(BackendError::Authorization(_))));
    }
}
