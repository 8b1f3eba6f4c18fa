use std::sync::{Arc, Mutex};

use actix_web::HttpRequest;
use common::data_structures::account_manager::UserInfo;
use common::env::{EnvConf, ServiceMode, TokenConf};
use common::error_code::BackendError;
use common::utils::math::{gen_random_digit, gen_random_verify_code};
use common::utils::time::clock_millis;
use mockable::{Clock, DefaultClock};
use models::account_manager::UserFilter;
use models::general::{connect_pool, DbSource};
use models::{DbError, MemoryDb, PgLocalCli, PsqlOp};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::utils::captcha::email::SmtpSender;
use crate::utils::captcha::sms::SmsGateway;
use crate::utils::notifier::{ExternalSender, LogSender, NotificationSender, Notifier};

pub mod api_test;
pub mod captcha;
pub mod notifier;
pub mod respond;
pub mod token_auth;

pub type SharedClock = Arc<dyn Clock + Send + Sync>;
pub type SharedRng = Arc<Mutex<dyn RngCore + Send>>;

/// Everything a handler needs besides the request itself.
#[derive(Clone)]
pub struct AppContext {
    pub db: DbSource,
    pub clock: SharedClock,
    pub rng: SharedRng,
    pub notifier: Notifier,
    pub token: TokenConf,
    pub hash_iterations: u32,
    pub service_mode: ServiceMode,
}

impl AppContext {
    /// Build from configuration; must run inside the tokio runtime because
    /// the notification workers are spawned here.
    pub fn from_conf(conf: &EnvConf) -> Result<Self, BackendError> {
        let (db, sender): (DbSource, Arc<dyn NotificationSender>) =
            if conf.service_mode.is_offline() {
                (DbSource::Memory(MemoryDb::new()), Arc::new(LogSender))
            } else {
                let database = conf.database.as_ref().ok_or_else(|| {
                    BackendError::InternalError("database config is required".to_string())
                })?;
                let sender = ExternalSender {
                    smtp: conf.smtp.clone().map(SmtpSender::new),
                    sms: conf.sms.clone().map(SmsGateway::new),
                };
                (DbSource::Postgres(connect_pool(database)?), Arc::new(sender))
            };
        Ok(AppContext {
            db,
            clock: Arc::new(DefaultClock),
            rng: Arc::new(Mutex::new(StdRng::from_entropy())),
            notifier: Notifier::start(sender, &conf.notify),
            token: conf.token.clone(),
            hash_iterations: conf.password_hash_iterations,
            service_mode: conf.service_mode,
        })
    }

    pub async fn db_cli(&self) -> Result<PgLocalCli<'static>, BackendError> {
        Ok(self.db.get_cli().await?)
    }

    pub fn now_millis(&self) -> u64 {
        clock_millis(self.clock.as_ref())
    }

    pub fn gen_verify_code(&self) -> Result<String, BackendError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|e| BackendError::InternalError(e.to_string()))?;
        Ok(gen_random_verify_code(&mut *rng))
    }

    pub fn gen_digit(&self) -> Result<char, BackendError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|e| BackendError::InternalError(e.to_string()))?;
        Ok(gen_random_digit(&mut *rng))
    }
}

/// Account behind the bearer token of `req`.
pub async fn get_current_user(
    req: &HttpRequest,
    ctx: &AppContext,
    cli: &mut PgLocalCli<'_>,
) -> Result<UserInfo, BackendError> {
    let user_id = token_auth::validate_credentials(req, ctx)?;
    find_user_by_id(&user_id, cli).await
}

pub async fn find_user_by_id(
    user_id: &uuid::Uuid,
    cli: &mut PgLocalCli<'_>,
) -> Result<UserInfo, BackendError> {
    let user = UserInfo::find_single(UserFilter::ById(user_id), cli)
        .await
        .map_err(|err| match err {
            DbError::DataNotFound(_) => {
                BackendError::Authorization("account of this token no longer exists".to_string())
            }
            other => other.into(),
        })?
        .into_inner();
    Ok(user)
}
