//! account manager http service
pub mod handlers;

use actix_web::{delete, get, post, put, web, HttpRequest, Responder};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::utils::respond::gen_extra_respond;
use crate::utils::AppContext;

/**
 * @api {post} /users/signup 用邮箱或手机号注册
 * @apiVersion 0.0.1
 * @apiName Signup
 * @apiGroup AccountManager
 * @apiBody {String} email_or_phone_number   邮箱 test000001@gmail.com 或者手机号 +998901234567
 * @apiExample {curl} Example usage:
 *   curl -X POST http://127.0.0.1:8066/users/signup -H "Content-Type: application/json" -d
 *  '{"email_or_phone_number": "test000001@gmail.com"}'
 * @apiSuccess {string=0,1,2,3,2001,2002,2004} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,RequestParamInvalid,InvalidIdentifier,DuplicateIdentifier} msg
 * @apiSuccess {object} data                {id, auth_type, auth_status, access, refresh}.
 * @apiSampleRequest http://127.0.0.1:8066/users/signup
 */
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SignupRequest {
    pub email_or_phone_number: String,
}
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[post("/users/signup")]
async fn signup(
    ctx: web::Data<AppContext>,
    request_data: web::Json<SignupRequest>,
) -> impl Responder {
    debug!("{:?}", request_data.0);
    gen_extra_respond(handlers::signup::req(&ctx, request_data.into_inner()).await)
}

/**
 * @api {post} /users/verify 提交验证码
 * @apiVersion 0.0.1
 * @apiName Verify
 * @apiGroup AccountManager
 * @apiHeader {String} Authorization  user's access token, or the reset token of forgot-password
 * @apiBody {String} verification_code   四位数字验证码
 * @apiExample {curl} Example usage:
 *   curl -X POST http://127.0.0.1:8066/users/verify -H "Content-Type: application/json"
 *   -H "Authorization: Bearer eyJ0eXAiOiJKV1Q..." -d '{"verification_code": "4821"}'
 * @apiSuccess {string=0,1,3,5,2003} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,Authorization,InvalidOrExpiredCode} msg
 * @apiSuccess {object} data                {auth_status, access, refresh}, no tokens for a reset token.
 * @apiSampleRequest http://127.0.0.1:8066/users/verify
 */
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct VerifyRequest {
    pub verification_code: String,
}
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[post("/users/verify")]
async fn verify(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    request_data: web::Json<VerifyRequest>,
) -> impl Responder {
    gen_extra_respond(handlers::verify::req(req, &ctx, request_data.into_inner()).await)
}

/**
 * @api {get} /users/new-verify 重新发送验证码
 * @apiVersion 0.0.1
 * @apiName NewVerify
 * @apiGroup AccountManager
 * @apiHeader {String} Authorization  user's access token
 * @apiExample {curl} Example usage:
 *   curl -X GET http://127.0.0.1:8066/users/new-verify -H "Authorization: Bearer eyJ0eXAiOiJKV1Q..."
 * @apiSuccess {string=0,1,3,5,2004} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,Authorization,VerificationPending} msg
 * @apiSuccess {string} data                description of where the code went.
 * @apiSampleRequest http://127.0.0.1:8066/users/new-verify
 */
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[get("/users/new-verify")]
async fn new_verify(req: HttpRequest, ctx: web::Data<AppContext>) -> impl Responder {
    gen_extra_respond(handlers::new_verify::req(req, &ctx).await)
}

/**
 * @api {put} /users/change-user-info 完善个人资料
 * @apiVersion 0.0.1
 * @apiName ChangeUserInfo
 * @apiGroup AccountManager
 * @apiHeader {String} Authorization  user's access token
 * @apiBody {String} first_name        1-50 characters
 * @apiBody {String} last_name         1-50 characters
 * @apiBody {String} username          4-32 characters, not all digits
 * @apiBody {String} password          at least 8 characters
 * @apiBody {String} confirm_password  same as password
 * @apiExample {curl} Example usage:
 *   curl -X PUT http://127.0.0.1:8066/users/change-user-info -H "Content-Type: application/json"
 *   -H "Authorization: Bearer eyJ0eXAiOiJKV1Q..." -d
 *  '{"first_name":"John","last_name":"Doe","username":"john_doe","password":"Tr1cky-horse","confirm_password":"Tr1cky-horse"}'
 * @apiSuccess {string=0,1,3,5,2005,2008} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,Authorization,RegistrationIncomplete,ValidationFailure} msg
 * @apiSuccess {object} data                {auth_status}.
 * @apiSampleRequest http://127.0.0.1:8066/users/change-user-info
 */
#[derive(Deserialize, Serialize, Clone)]
pub struct ChangeUserInfoRequest {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[put("/users/change-user-info")]
async fn change_user_info(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    request_data: web::Json<ChangeUserInfoRequest>,
) -> impl Responder {
    gen_extra_respond(handlers::change_user_info::req(req, &ctx, request_data.into_inner()).await)
}

/**
 * @api {put} /users/change-user-photo 上传头像
 * @apiVersion 0.0.1
 * @apiName ChangeUserPhoto
 * @apiGroup AccountManager
 * @apiHeader {String} Authorization  user's access token
 * @apiBody {String} photo   reference of the stored picture, jpg/jpeg/png/heic
 * @apiExample {curl} Example usage:
 *   curl -X PUT http://127.0.0.1:8066/users/change-user-photo -H "Content-Type: application/json"
 *   -H "Authorization: Bearer eyJ0eXAiOiJKV1Q..." -d '{"photo":"avatars/john.png"}'
 * @apiSuccess {string=0,1,3,5,2005,2008} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,Authorization,RegistrationIncomplete,ValidationFailure} msg
 * @apiSuccess {object} data                {auth_status}.
 * @apiSampleRequest http://127.0.0.1:8066/users/change-user-photo
 */
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ChangeUserPhotoRequest {
    pub photo: String,
}
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[put("/users/change-user-photo")]
async fn change_user_photo(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    request_data: web::Json<ChangeUserPhotoRequest>,
) -> impl Responder {
    debug!("{:?}", request_data.0);
    gen_extra_respond(handlers::change_user_photo::req(req, &ctx, request_data.into_inner()).await)
}

/**
 * @api {post} /users/login 登录
 * @apiVersion 0.0.1
 * @apiName Login
 * @apiGroup AccountManager
 * @apiBody {String} userinput   邮箱、手机号或者用户名
 * @apiBody {String} password    密码
 * @apiExample {curl} Example usage:
 *   curl -X POST http://127.0.0.1:8066/users/login -H "Content-Type: application/json" -d
 *  '{"userinput": "test000001@gmail.com","password":"Tr1cky-horse"}'
 * @apiSuccess {string=0,1,3,2005,2006,2007} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,RegistrationIncomplete,AccountNotFound,InvalidCredentials} msg
 * @apiSuccess {object} data                {access, refresh, auth_status, full_name}.
 * @apiSampleRequest http://127.0.0.1:8066/users/login
 */
#[derive(Deserialize, Serialize, Clone)]
pub struct LoginRequest {
    pub userinput: String,
    pub password: String,
}
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[post("/users/login")]
async fn login(
    ctx: web::Data<AppContext>,
    request_data: web::Json<LoginRequest>,
) -> impl Responder {
    debug!("login attempt of {}", request_data.userinput);
    gen_extra_respond(handlers::login::req(&ctx, request_data.into_inner()).await)
}

/**
 * @api {post} /users/login/refresh 刷新access token
 * @apiVersion 0.0.1
 * @apiName RefreshToken
 * @apiGroup AccountManager
 * @apiBody {String} refresh   refresh token
 * @apiExample {curl} Example usage:
 *   curl -X POST http://127.0.0.1:8066/users/login/refresh -H "Content-Type: application/json" -d
 *  '{"refresh": "eyJ0eXAiOiJKV1Q..."}'
 * @apiSuccess {string=0,1,3,5} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,Authorization} msg
 * @apiSuccess {object} data                {access}.
 * @apiSampleRequest http://127.0.0.1:8066/users/login/refresh
 */
#[derive(Deserialize, Serialize, Clone)]
pub struct RefreshRequest {
    pub refresh: String,
}
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[post("/users/login/refresh")]
async fn refresh(
    ctx: web::Data<AppContext>,
    request_data: web::Json<RefreshRequest>,
) -> impl Responder {
    gen_extra_respond(handlers::refresh::req(&ctx, request_data.into_inner()).await)
}

/**
 * @api {post} /users/logout 登出，作废refresh token
 * @apiVersion 0.0.1
 * @apiName Logout
 * @apiGroup AccountManager
 * @apiHeader {String} Authorization  user's access token
 * @apiBody {String} refresh   refresh token to revoke
 * @apiExample {curl} Example usage:
 *   curl -X POST http://127.0.0.1:8066/users/logout -H "Content-Type: application/json"
 *   -H "Authorization: Bearer eyJ0eXAiOiJKV1Q..." -d '{"refresh": "eyJ0eXAiOiJKV1Q..."}'
 * @apiSuccess {string=0,1,3,5} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,Authorization} msg
 * @apiSuccess {string} data                nothing.
 * @apiSampleRequest http://127.0.0.1:8066/users/logout
 */
#[derive(Deserialize, Serialize, Clone)]
pub struct LogoutRequest {
    pub refresh: String,
}
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[post("/users/logout")]
async fn logout(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    request_data: web::Json<LogoutRequest>,
) -> impl Responder {
    gen_extra_respond(handlers::logout::req(req, &ctx, request_data.into_inner()).await)
}

/**
 * @api {post} /users/forgot-password 忘记密码，发送验证码
 * @apiVersion 0.0.1
 * @apiName ForgotPassword
 * @apiGroup AccountManager
 * @apiBody {String} email_or_phone_number   注册时使用的邮箱或手机号
 * @apiExample {curl} Example usage:
 *   curl -X POST http://127.0.0.1:8066/users/forgot-password -H "Content-Type: application/json" -d
 *  '{"email_or_phone_number": "test000001@gmail.com"}'
 * @apiSuccess {string=0,1,3,2001,2004,2006} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,InvalidIdentifier,VerificationPending,AccountNotFound} msg
 * @apiSuccess {object} data                {reset_token}, only accepted by verify and reset-password.
 * @apiSampleRequest http://127.0.0.1:8066/users/forgot-password
 */
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ForgotPasswordRequest {
    pub email_or_phone_number: String,
}
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[post("/users/forgot-password")]
async fn forgot_password(
    ctx: web::Data<AppContext>,
    request_data: web::Json<ForgotPasswordRequest>,
) -> impl Responder {
    debug!("{:?}", request_data.0);
    gen_extra_respond(handlers::forgot_password::req(&ctx, request_data.into_inner()).await)
}

/**
 * @api {put} /users/reset-password 验证码确认后重置密码
 * @apiVersion 0.0.1
 * @apiName ResetPassword
 * @apiGroup AccountManager
 * @apiHeader {String} Authorization  reset token of forgot-password
 * @apiBody {String} password          new password
 * @apiBody {String} confirm_password  same as password
 * @apiExample {curl} Example usage:
 *   curl -X PUT http://127.0.0.1:8066/users/reset-password -H "Content-Type: application/json"
 *   -H "Authorization: Bearer eyJ0eXAiOiJKV1Q..." -d '{"password":"N3w-horse!","confirm_password":"N3w-horse!"}'
 * @apiSuccess {string=0,1,3,5,2008,2009} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,Authorization,ValidationFailure,CodeNotConfirmed} msg
 * @apiSuccess {string} data                nothing.
 * @apiSampleRequest http://127.0.0.1:8066/users/reset-password
 */
#[derive(Deserialize, Serialize, Clone)]
pub struct ResetPasswordRequest {
    pub password: String,
    pub confirm_password: String,
}
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[put("/users/reset-password")]
async fn reset_password(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    request_data: web::Json<ResetPasswordRequest>,
) -> impl Responder {
    gen_extra_respond(handlers::reset_password::req(req, &ctx, request_data.into_inner()).await)
}

/**
 * @api {get} /users/me 当前用户资料
 * @apiVersion 0.0.1
 * @apiName UserInfo
 * @apiGroup AccountManager
 * @apiHeader {String} Authorization  user's access token
 * @apiExample {curl} Example usage:
 *   curl -X GET http://127.0.0.1:8066/users/me -H "Authorization: Bearer eyJ0eXAiOiJKV1Q..."
 * @apiSuccess {string=0,1,3,5} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,Authorization} msg
 * @apiSuccess {object} data                profile of the token owner.
 * @apiSampleRequest http://127.0.0.1:8066/users/me
 */
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[get("/users/me")]
async fn user_info(req: HttpRequest, ctx: web::Data<AppContext>) -> impl Responder {
    gen_extra_respond(handlers::user_info::req(req, &ctx).await)
}

/**
 * @api {delete} /admin/users/:id 管理员删除账户
 * @apiVersion 0.0.1
 * @apiName DeleteUser
 * @apiGroup AccountManager
 * @apiHeader {String} Authorization  admin's access token
 * @apiParam {String} id   account id
 * @apiExample {curl} Example usage:
 *   curl -X DELETE http://127.0.0.1:8066/admin/users/67e55044-10b1-426f-9247-bb680e5fe0c8
 *   -H "Authorization: Bearer eyJ0eXAiOiJKV1Q..."
 * @apiSuccess {string=0,1,2,3,5,2006,2010} status_code         status code.
 * @apiSuccess {string=Successfully,InternalError,RequestParamInvalid,Authorization,AccountNotFound,AdminRequired} msg
 * @apiSuccess {string} data                nothing.
 * @apiSampleRequest http://127.0.0.1:8066/admin/users/:id
 */
#[tracing::instrument(skip_all,fields(trace_id = common::log::generate_trace_id()))]
#[delete("/admin/users/{id}")]
async fn delete_user(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    user_id: web::Path<Uuid>,
) -> impl Responder {
    gen_extra_respond(handlers::delete_user::req(req, &ctx, user_id.into_inner()).await)
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(signup)
        .service(verify)
        .service(new_verify)
        .service(change_user_info)
        .service(change_user_photo)
        .service(login)
        .service(refresh)
        .service(logout)
        .service(forgot_password)
        .service(reset_password)
        .service(user_info)
        .service(delete_user);
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::test_service_call;
    use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
    use actix_web::http::header;
    use actix_web::{test, App, Error};
    use common::constants::MAX_CODE_FAILURES;
    use common::data_structures::account_manager::{AuthChannel, AuthStage, UserRole};
    use common::data_structures::verification::VerificationAttempt;
    use common::utils::time::{MINUTE1, MINUTE5, SECOND1};
    use models::verification::VerificationFilter;
    use models::PsqlOp;

    use crate::account_manager::handlers::change_user_info::AuthStatusResponse;
    use crate::account_manager::handlers::forgot_password::ForgotPasswordResponse;
    use crate::account_manager::handlers::login::LoginResponse;
    use crate::account_manager::handlers::refresh::RefreshResponse;
    use crate::account_manager::handlers::signup::SignupResponse;
    use crate::account_manager::handlers::user_info::UserInfoResponse;
    use crate::account_manager::handlers::verify::VerifyResponse;
    use crate::utils::api_test::{create_user_with_role, test_context, MutableClock};
    use crate::utils::respond::{configure_extractors, BackendRespond};

    fn init(
        ctx: AppContext,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(ctx))
            .configure(configure_extractors)
            .configure(configure_routes)
    }

    async fn latest_code(ctx: &AppContext, user_id: &Uuid) -> String {
        let mut cli = ctx.db_cli().await.unwrap();
        let attempts =
            VerificationAttempt::find_page(VerificationFilter::ByUser(user_id), 1, 0, &mut cli)
                .await
                .unwrap();
        attempts[0].inner.code.clone()
    }

    #[actix_web::test]
    async fn test_email_registration_to_login() {
        let clock = Arc::new(MutableClock::default());
        let ctx = test_context(clock.clone());
        let service = test::init_service(init(ctx.clone())).await;

        //signup
        let payload = r#"{ "email_or_phone_number": "Test000001@Gmail.com" }"#;
        let res: BackendRespond<SignupResponse> =
            test_service_call!(service, "post", "/users/signup", Some(payload), None::<String>);
        assert_eq!(res.status_code, 0);
        let signed_up = res.data.unwrap();
        assert_eq!(signed_up.auth_type, AuthChannel::Email);
        assert_eq!(signed_up.auth_status, AuthStage::New);

        let res: BackendRespond<SignupResponse> =
            test_service_call!(service, "post", "/users/signup", Some(payload), None::<String>);
        assert_eq!(res.status_code, 2002);

        //an unexpired code is still pending
        let res: BackendRespond<String> = test_service_call!(
            service,
            "get",
            "/users/new-verify",
            None::<&str>,
            Some(&signed_up.access)
        );
        assert_eq!(res.status_code, 2004);

        let payload = r#"{ "userinput": "test000001@gmail.com", "password": "whatever-it-is" }"#;
        let res: BackendRespond<LoginResponse> =
            test_service_call!(service, "post", "/users/login", Some(payload), None::<String>);
        assert_eq!(res.status_code, 2005);

        let payload = r#"{ "photo": "avatars/me.png" }"#;
        let res: BackendRespond<AuthStatusResponse> = test_service_call!(
            service,
            "put",
            "/users/change-user-photo",
            Some(payload),
            Some(&signed_up.access)
        );
        assert_eq!(res.status_code, 2005);

        //verify
        let payload = r#"{ "verification_code": "0000" }"#;
        let res: BackendRespond<VerifyResponse> = test_service_call!(
            service,
            "post",
            "/users/verify",
            Some(payload),
            Some(&signed_up.access)
        );
        assert_eq!(res.status_code, 2003);

        clock.advance_millis(MINUTE1);
        let code = latest_code(&ctx, &signed_up.id).await;
        let payload = format!(r#"{{ "verification_code": "{}" }}"#, code);
        let res: BackendRespond<VerifyResponse> = test_service_call!(
            service,
            "post",
            "/users/verify",
            Some(payload),
            Some(&signed_up.access)
        );
        assert_eq!(res.status_code, 0);
        let verified = res.data.unwrap();
        assert_eq!(verified.auth_status, AuthStage::CodeVerified);
        let verified_access = verified.access.unwrap();

        //change-user-info
        let payload = r#"{
            "first_name": "John",
            "last_name": "Doe",
            "username": "john_doe",
            "password": "12345678",
            "confirm_password": "12345678"
        }"#;
        let res: BackendRespond<AuthStatusResponse> = test_service_call!(
            service,
            "put",
            "/users/change-user-info",
            Some(payload),
            Some(&verified_access)
        );
        assert_eq!(res.status_code, 2008);

        let payload = r#"{
            "first_name": "John",
            "last_name": "Doe",
            "username": "john_doe",
            "password": "Tr1cky-horse",
            "confirm_password": "Tr1cky-horse"
        }"#;
        let res: BackendRespond<AuthStatusResponse> = test_service_call!(
            service,
            "put",
            "/users/change-user-info",
            Some(payload),
            Some(&verified_access)
        );
        assert_eq!(res.status_code, 0);
        assert_eq!(res.data.unwrap().auth_status, AuthStage::Done);

        //change-user-photo
        let payload = r#"{ "photo": "avatars/me.gif" }"#;
        let res: BackendRespond<AuthStatusResponse> = test_service_call!(
            service,
            "put",
            "/users/change-user-photo",
            Some(payload),
            Some(&verified_access)
        );
        assert_eq!(res.status_code, 2008);

        let payload = r#"{ "photo": "avatars/me.PNG" }"#;
        let res: BackendRespond<AuthStatusResponse> = test_service_call!(
            service,
            "put",
            "/users/change-user-photo",
            Some(payload),
            Some(&verified_access)
        );
        assert_eq!(res.status_code, 0);
        assert_eq!(res.data.unwrap().auth_status, AuthStage::PhotoDone);

        //login
        let payload = r#"{ "userinput": "john_doe", "password": "Tr1cky-horse" }"#;
        let res: BackendRespond<LoginResponse> =
            test_service_call!(service, "post", "/users/login", Some(payload), None::<String>);
        assert_eq!(res.status_code, 0);
        let logged_in = res.data.unwrap();
        assert_eq!(logged_in.full_name, "John Doe");
        assert_eq!(logged_in.auth_status, AuthStage::PhotoDone);

        let payload = r#"{ "userinput": "TEST000001@gmail.com", "password": "Tr1cky-horse" }"#;
        let res: BackendRespond<LoginResponse> =
            test_service_call!(service, "post", "/users/login", Some(payload), None::<String>);
        assert_eq!(res.status_code, 0);

        let payload = r#"{ "userinput": "john_doe", "password": "Wr0ng-horse" }"#;
        let res: BackendRespond<LoginResponse> =
            test_service_call!(service, "post", "/users/login", Some(payload), None::<String>);
        assert_eq!(res.status_code, 2007);

        let payload = r#"{ "userinput": "nobody_here", "password": "Tr1cky-horse" }"#;
        let res: BackendRespond<LoginResponse> =
            test_service_call!(service, "post", "/users/login", Some(payload), None::<String>);
        assert_eq!(res.status_code, 2006);

        //me
        let res: BackendRespond<UserInfoResponse> = test_service_call!(
            service,
            "get",
            "/users/me",
            None::<&str>,
            Some(&logged_in.access)
        );
        let me = res.data.unwrap();
        assert_eq!(me.username, "john_doe");
        assert_eq!(me.email.as_deref(), Some("test000001@gmail.com"));
        assert_eq!(me.photo.as_deref(), Some("avatars/me.PNG"));
    }

    #[actix_web::test]
    async fn test_expired_code_and_resend() {
        let clock = Arc::new(MutableClock::default());
        let ctx = test_context(clock.clone());
        let service = test::init_service(init(ctx.clone())).await;

        let payload = r#"{ "email_or_phone_number": "late@example.com" }"#;
        let res: BackendRespond<SignupResponse> =
            test_service_call!(service, "post", "/users/signup", Some(payload), None::<String>);
        let signed_up = res.data.unwrap();
        let stale_code = latest_code(&ctx, &signed_up.id).await;

        clock.advance_millis(MINUTE5 + MINUTE1);
        let payload = format!(r#"{{ "verification_code": "{}" }}"#, stale_code);
        let res: BackendRespond<VerifyResponse> = test_service_call!(
            service,
            "post",
            "/users/verify",
            Some(payload),
            Some(&signed_up.access)
        );
        assert_eq!(res.status_code, 2003);

        let res: BackendRespond<String> = test_service_call!(
            service,
            "get",
            "/users/new-verify",
            None::<&str>,
            Some(&signed_up.access)
        );
        assert_eq!(res.status_code, 0);

        let code = latest_code(&ctx, &signed_up.id).await;
        let payload = format!(r#"{{ "verification_code": "{}" }}"#, code);
        let res: BackendRespond<VerifyResponse> = test_service_call!(
            service,
            "post",
            "/users/verify",
            Some(payload),
            Some(&signed_up.access)
        );
        assert_eq!(res.status_code, 0);
        assert_eq!(res.data.unwrap().auth_status, AuthStage::CodeVerified);
    }

    #[actix_web::test]
    async fn test_phone_code_lives_two_minutes() {
        let clock = Arc::new(MutableClock::default());
        let ctx = test_context(clock.clone());
        let service = test::init_service(init(ctx.clone())).await;

        let payload = r#"{ "email_or_phone_number": "+998 90 123 45 67" }"#;
        let res: BackendRespond<SignupResponse> =
            test_service_call!(service, "post", "/users/signup", Some(payload), None::<String>);
        assert_eq!(res.status_code, 0);
        let signed_up = res.data.unwrap();
        assert_eq!(signed_up.auth_type, AuthChannel::Phone);

        let payload = r#"{ "email_or_phone_number": "+998901234567" }"#;
        let res: BackendRespond<SignupResponse> =
            test_service_call!(service, "post", "/users/signup", Some(payload), None::<String>);
        assert_eq!(res.status_code, 2002);

        let payload = r#"{ "email_or_phone_number": "not-a-contact" }"#;
        let res: BackendRespond<SignupResponse> =
            test_service_call!(service, "post", "/users/signup", Some(payload), None::<String>);
        assert_eq!(res.status_code, 2001);

        clock.advance_millis(2 * MINUTE1 + SECOND1);
        let code = latest_code(&ctx, &signed_up.id).await;
        let payload = format!(r#"{{ "verification_code": "{}" }}"#, code);
        let res: BackendRespond<VerifyResponse> = test_service_call!(
            service,
            "post",
            "/users/verify",
            Some(payload),
            Some(&signed_up.access)
        );
        assert_eq!(res.status_code, 2003);
    }

    #[actix_web::test]
    async fn test_refresh_and_logout() {
        let ctx = test_context(Arc::new(MutableClock::default()));
        let service = test::init_service(init(ctx.clone())).await;
        let (_user, pair) =
            create_user_with_role(&ctx, "tokenuser", "s3cret-pass", UserRole::OrdinaryUser).await;

        let payload = format!(r#"{{ "refresh": "{}" }}"#, pair.refresh);
        let res: BackendRespond<RefreshResponse> = test_service_call!(
            service,
            "post",
            "/users/login/refresh",
            Some(payload.clone()),
            None::<String>
        );
        assert_eq!(res.status_code, 0);

        let res: BackendRespond<String> = test_service_call!(
            service,
            "post",
            "/users/logout",
            Some(payload.clone()),
            Some(&pair.access)
        );
        assert_eq!(res.status_code, 0);

        let res: BackendRespond<RefreshResponse> = test_service_call!(
            service,
            "post",
            "/users/login/refresh",
            Some(payload),
            None::<String>
        );
        assert_eq!(res.status_code, 5);

        //an access token can not be used as refresh token
        let payload = format!(r#"{{ "refresh": "{}" }}"#, pair.access);
        let res: BackendRespond<RefreshResponse> = test_service_call!(
            service,
            "post",
            "/users/login/refresh",
            Some(payload),
            None::<String>
        );
        assert_eq!(res.status_code, 5);
    }

    fn forgot_payload(contact: &str) -> String {
        format!(r#"{{ "email_or_phone_number": "{}" }}"#, contact)
    }

    #[actix_web::test]
    async fn test_forgot_and_reset_password() {
        let ctx = test_context(Arc::new(MutableClock::default()));
        let service = test::init_service(init(ctx.clone())).await;
        let (user, pair) =
            create_user_with_role(&ctx, "forgetful", "0ld-password", UserRole::OrdinaryUser).await;
        let new_password = r#"{ "password": "N3w-horse-pw", "confirm_password": "N3w-horse-pw" }"#;

        //an ordinary access token can not reset the password
        let res: BackendRespond<String> = test_service_call!(
            service,
            "put",
            "/users/reset-password",
            Some(new_password),
            Some(&pair.access)
        );
        assert_eq!(res.status_code, 5);

        let res: BackendRespond<ForgotPasswordResponse> = test_service_call!(
            service,
            "post",
            "/users/forgot-password",
            Some(forgot_payload("nobody@example.com")),
            None::<String>
        );
        assert_eq!(res.status_code, 2006);
        let res: BackendRespond<ForgotPasswordResponse> = test_service_call!(
            service,
            "post",
            "/users/forgot-password",
            Some(forgot_payload("forgetful@example.com")),
            None::<String>
        );
        assert_eq!(res.status_code, 0);
        let reset_token = res.data.unwrap().reset_token;
        let res: BackendRespond<ForgotPasswordResponse> = test_service_call!(
            service,
            "post",
            "/users/forgot-password",
            Some(forgot_payload("forgetful@example.com")),
            None::<String>
        );
        assert_eq!(res.status_code, 2004);

        let res: BackendRespond<String> = test_service_call!(
            service,
            "put",
            "/users/reset-password",
            Some(new_password),
            Some(&reset_token)
        );
        assert_eq!(res.status_code, 2009);

        //the account owner's activation check does not confirm a reset code
        let code = latest_code(&ctx, &user.id).await;
        let payload = format!(r#"{{ "verification_code": "{}" }}"#, code);
        let res: BackendRespond<VerifyResponse> = test_service_call!(
            service,
            "post",
            "/users/verify",
            Some(payload.clone()),
            Some(&pair.access)
        );
        assert_eq!(res.status_code, 2003);

        let res: BackendRespond<VerifyResponse> = test_service_call!(
            service,
            "post",
            "/users/verify",
            Some(payload),
            Some(&reset_token)
        );
        assert_eq!(res.status_code, 0);
        let verified = res.data.unwrap();
        assert_eq!(verified.auth_status, AuthStage::Done);
        assert!(verified.access.is_none());
        assert!(verified.refresh.is_none());

        let res: BackendRespond<String> = test_service_call!(
            service,
            "put",
            "/users/reset-password",
            Some(new_password),
            Some(&reset_token)
        );
        assert_eq!(res.status_code, 0);

        //the confirmed code is used up by the reset
        let payload = r#"{ "password": "Th1rd-horse-pw", "confirm_password": "Th1rd-horse-pw" }"#;
        let res: BackendRespond<String> = test_service_call!(
            service,
            "put",
            "/users/reset-password",
            Some(payload),
            Some(&reset_token)
        );
        assert_eq!(res.status_code, 2009);

        let payload = r#"{ "userinput": "forgetful", "password": "0ld-password" }"#;
        let res: BackendRespond<LoginResponse> =
            test_service_call!(service, "post", "/users/login", Some(payload), None::<String>);
        assert_eq!(res.status_code, 2007);

        let payload = r#"{ "userinput": "forgetful", "password": "N3w-horse-pw" }"#;
        let res: BackendRespond<LoginResponse> =
            test_service_call!(service, "post", "/users/login", Some(payload), None::<String>);
        assert_eq!(res.status_code, 0);
    }

    #[actix_web::test]
    async fn test_reset_token_only_opens_the_reset_flow() {
        let ctx = test_context(Arc::new(MutableClock::default()));
        let service = test::init_service(
            init(ctx.clone()).configure(crate::post::configure_routes),
        )
        .await;
        create_user_with_role(&ctx, "victim", "v1ctim-secret", UserRole::OrdinaryUser).await;

        let res: BackendRespond<ForgotPasswordResponse> = test_service_call!(
            service,
            "post",
            "/users/forgot-password",
            Some(forgot_payload("victim@example.com")),
            None::<String>
        );
        assert_eq!(res.status_code, 0);
        let reset_token = res.data.unwrap().reset_token;

        let payload = r#"{
            "first_name": "Eve",
            "last_name": "Intruder",
            "username": "victim",
            "password": "Att4cker-pw",
            "confirm_password": "Att4cker-pw"
        }"#;
        let res: BackendRespond<AuthStatusResponse> = test_service_call!(
            service,
            "put",
            "/users/change-user-info",
            Some(payload),
            Some(&reset_token)
        );
        assert_eq!(res.status_code, 5);

        let payload = r#"{ "media": "uploads/pic.png", "caption": "mine now" }"#;
        let res: BackendRespond<String> = test_service_call!(
            service,
            "post",
            "/post/posts/create",
            Some(payload),
            Some(&reset_token)
        );
        assert_eq!(res.status_code, 5);

        let res: BackendRespond<UserInfoResponse> = test_service_call!(
            service,
            "get",
            "/users/me",
            None::<&str>,
            Some(&reset_token)
        );
        assert_eq!(res.status_code, 5);

        let payload = format!(r#"{{ "refresh": "{}" }}"#, reset_token);
        let res: BackendRespond<RefreshResponse> = test_service_call!(
            service,
            "post",
            "/users/login/refresh",
            Some(payload),
            None::<String>
        );
        assert_eq!(res.status_code, 5);

        let payload = r#"{ "userinput": "victim", "password": "Att4cker-pw" }"#;
        let res: BackendRespond<LoginResponse> =
            test_service_call!(service, "post", "/users/login", Some(payload), None::<String>);
        assert_eq!(res.status_code, 2007);
        let payload = r#"{ "userinput": "victim", "password": "v1ctim-secret" }"#;
        let res: BackendRespond<LoginResponse> =
            test_service_call!(service, "post", "/users/login", Some(payload), None::<String>);
        assert_eq!(res.status_code, 0);
    }

    #[actix_web::test]
    async fn test_reset_code_locks_after_wrong_guesses() {
        let ctx = test_context(Arc::new(MutableClock::default()));
        let service = test::init_service(init(ctx.clone())).await;
        let (user, _pair) =
            create_user_with_role(&ctx, "guessed", "gu3ssed-secret", UserRole::OrdinaryUser).await;

        let res: BackendRespond<ForgotPasswordResponse> = test_service_call!(
            service,
            "post",
            "/users/forgot-password",
            Some(forgot_payload("guessed@example.com")),
            None::<String>
        );
        let reset_token = res.data.unwrap().reset_token;
        let code = latest_code(&ctx, &user.id).await;
        let wrong = if code == "1000" { "1001" } else { "1000" };

        for _ in 0..MAX_CODE_FAILURES {
            let payload = format!(r#"{{ "verification_code": "{}" }}"#, wrong);
            let res: BackendRespond<VerifyResponse> = test_service_call!(
                service,
                "post",
                "/users/verify",
                Some(payload),
                Some(&reset_token)
            );
            assert_eq!(res.status_code, 2003);
        }
        let payload = format!(r#"{{ "verification_code": "{}" }}"#, code);
        let res: BackendRespond<VerifyResponse> = test_service_call!(
            service,
            "post",
            "/users/verify",
            Some(payload),
            Some(&reset_token)
        );
        assert_eq!(res.status_code, 2003);

        let payload = r#"{ "password": "N3w-horse-pw", "confirm_password": "N3w-horse-pw" }"#;
        let res: BackendRespond<String> = test_service_call!(
            service,
            "put",
            "/users/reset-password",
            Some(payload),
            Some(&reset_token)
        );
        assert_eq!(res.status_code, 2009);
    }

    #[actix_web::test]
    async fn test_admin_delete_user() {
        let ctx = test_context(Arc::new(MutableClock::default()));
        let service = test::init_service(init(ctx.clone())).await;
        let (admin, admin_pair) =
            create_user_with_role(&ctx, "the_admin", "adm1n-secret", UserRole::Admin).await;
        let (user, user_pair) =
            create_user_with_role(&ctx, "the_user", "us3r-secret", UserRole::OrdinaryUser).await;

        let uri = format!("/admin/users/{}", admin.id);
        let res: BackendRespond<String> = test_service_call!(
            service,
            "delete",
            &uri,
            None::<&str>,
            Some(&user_pair.access)
        );
        assert_eq!(res.status_code, 2010);

        let uri = format!("/admin/users/{}", user.id);
        let res: BackendRespond<String> = test_service_call!(
            service,
            "delete",
            &uri,
            None::<&str>,
            Some(&admin_pair.access)
        );
        assert_eq!(res.status_code, 0);

        let res: BackendRespond<String> = test_service_call!(
            service,
            "delete",
            &uri,
            None::<&str>,
            Some(&admin_pair.access)
        );
        assert_eq!(res.status_code, 2006);

        let res: BackendRespond<UserInfoResponse> = test_service_call!(
            service,
            "get",
            "/users/me",
            None::<&str>,
            Some(&user_pair.access)
        );
        assert_eq!(res.status_code, 5);

        let res: BackendRespond<String> = test_service_call!(
            service,
            "delete",
            "/admin/users/not-a-uuid",
            None::<&str>,
            Some(&admin_pair.access)
        );
        assert_eq!(res.status_code, 2);
    }
}
