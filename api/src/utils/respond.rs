use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use common::error_code::{BackendError, BackendRes, ErrorCode};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::{debug, warn};

#[derive(Deserialize, Serialize, Debug)]
pub struct BackendRespond<T> {
    pub success: bool,
    //0 success
    pub status_code: u16,
    pub msg: String,
    pub data: Option<T>,
}

pub fn generate_ok_respond<D: Serialize>(info: Option<D>) -> HttpResponse {
    HttpResponse::Ok().json(BackendRespond {
        success: true,
        msg: "successfully".to_string(),
        status_code: 0u16,
        data: info,
    })
}

pub fn generate_error_respond<E: ErrorCode + Display>(error: E) -> HttpResponse {
    let status = StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::BAD_REQUEST);
    if status.is_server_error() {
        warn!("return_error_respond: {}", error);
    } else {
        debug!("return_error_respond: {}", error);
    }
    HttpResponse::build(status).json(BackendRespond::<()> {
        success: false,
        msg: error.to_string(),
        status_code: error.code(),
        data: None,
    })
}

pub fn gen_extra_respond<D: Serialize, E: ErrorCode + Display>(
    inner_res: BackendRes<D, E>,
) -> HttpResponse {
    match inner_res {
        Ok(data) => generate_ok_respond(data),
        Err(error) => generate_error_respond(error),
    }
}

fn param_invalid<E: std::fmt::Debug + Display + 'static>(err: E) -> actix_web::Error {
    let response = generate_error_respond(BackendError::RequestParamInvalid(err.to_string()));
    InternalError::from_response(err, response).into()
}

/// Malformed bodies, queries and path ids answer with the usual envelope.
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| param_invalid(err)))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| param_invalid(err)))
        .app_data(web::PathConfig::default().error_handler(|err, _req| param_invalid(err)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::error_code::AccountManagerError;

    #[test]
    fn test_error_status_follows_error_code() {
        let res = gen_extra_respond::<(), BackendError>(Err(
            AccountManagerError::RegistrationIncomplete.into(),
        ));
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = gen_extra_respond::<(), BackendError>(Err(BackendError::Authorization(
            "Token has expired.".to_string(),
        )));
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = gen_extra_respond::<String, BackendError>(Ok(None));
        assert_eq!(res.status(), StatusCode::OK);
    }
}
