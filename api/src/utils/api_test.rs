#[macro_export]
macro_rules! test_service_call {
    ( $service:expr,$method:expr,$api:expr,$payload:expr,$token:expr) => {{
        let mut parameters = match $method {
            "post" => test::TestRequest::post(),
            "put" => test::TestRequest::put(),
            "delete" => test::TestRequest::delete(),
            _ => test::TestRequest::get(),
        }
        .uri($api)
        .insert_header(header::ContentType::json());

        if let Some(data) = $payload {
            parameters = parameters.set_payload(data);
        };

        if let Some(data) = $token {
            parameters =
                parameters.insert_header((header::AUTHORIZATION, format!("bearer {}", data)));
        };

        let req = parameters.to_request();
        let body = test::call_and_read_body(&$service, req).await;
        let body_str = String::from_utf8(body.to_vec()).unwrap();
        println!("body_str {}", body_str);
        serde_json::from_str::<_>(&body_str).unwrap()
    }};
}

#[cfg(test)]
pub use support::*;

#[cfg(test)]
mod support {
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, Local, TimeZone, Utc};
    use common::data_structures::account_manager::{AuthChannel, AuthStage, UserInfo, UserRole};
    use common::env::{NotifyConf, ServiceMode, TokenConf};
    use common::hash::hash_password;
    use mockable::Clock;
    use models::general::DbSource;
    use models::{MemoryDb, PsqlOp};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    use crate::utils::notifier::{LogSender, Notifier};
    use crate::utils::token_auth::{issue_token_pair, TokenPair};
    use crate::utils::AppContext;

    pub const TEST_HASH_ITERATIONS: u32 = 1000;

    /// Clock that only moves when a test says so.
    pub struct MutableClock(Mutex<DateTime<Utc>>);

    impl Default for MutableClock {
        fn default() -> Self {
            let start = Utc
                .timestamp_opt(1_700_000_000, 0)
                .single()
                .expect("valid start time");
            MutableClock(Mutex::new(start))
        }
    }

    impl MutableClock {
        pub fn advance_millis(&self, millis: u64) {
            *self.0.lock().expect("clock mutex") += chrono::Duration::milliseconds(millis as i64);
        }
    }

    impl Clock for MutableClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            *self.0.lock().expect("clock mutex")
        }
    }

    /// Memory database, seeded rng, logged notifications.
    pub fn test_context(clock: Arc<MutableClock>) -> AppContext {
        AppContext {
            db: DbSource::Memory(MemoryDb::new()),
            clock,
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(7))),
            notifier: Notifier::start(Arc::new(LogSender), &NotifyConf::default()),
            token: TokenConf {
                secret: "test-secret".to_string(),
                access_ttl: common::constants::ACCESS_TOKEN_EXPIRE_TIME,
                refresh_ttl: common::constants::REFRESH_TOKEN_EXPIRE_TIME,
            },
            hash_iterations: TEST_HASH_ITERATIONS,
            service_mode: ServiceMode::Test,
        }
    }

    /// Store an account that finished registration and log it in.
    pub async fn create_done_user(
        ctx: &AppContext,
        username: &str,
        password: &str,
    ) -> (UserInfo, TokenPair) {
        create_user_with_role(ctx, username, password, UserRole::OrdinaryUser).await
    }

    pub async fn create_user_with_role(
        ctx: &AppContext,
        username: &str,
        password: &str,
        user_role: UserRole,
    ) -> (UserInfo, TokenPair) {
        let user = UserInfo {
            id: Uuid::new_v4(),
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: Some(format!("{}@example.com", username)),
            phone_number: None,
            pwd_hash: hash_password(password, TEST_HASH_ITERATIONS),
            user_role,
            auth_type: AuthChannel::Email,
            auth_status: AuthStage::Done,
            photo: None,
        };
        let mut cli = ctx.db_cli().await.unwrap();
        user.clone().insert(&mut cli).await.unwrap();
        let tokens = issue_token_pair(ctx, &user.id).unwrap();
        (user, tokens)
    }
}
