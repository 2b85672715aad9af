//! 安全的路径参数提取器
//!
//! 解析失败或非正数时直接返回 400，处理器拿到的 ID 一定是正整数。

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, error::InternalError};
use futures_util::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

fn parse_positive_id(req: &HttpRequest, name: &str) -> Result<i64, actix_web::Error> {
    req.match_info()
        .get(name)
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| {
            let message = format!("Invalid path parameter: {name}");
            let response = HttpResponse::BadRequest().json(ApiResponse::<()>::error_empty(
                ErrorCode::BadRequest,
                message.clone(),
            ));
            InternalError::from_response(message, response).into()
        })
}

macro_rules! define_safe_id {
    ($($(#[$meta:meta])* $name:ident => $segment:literal),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $name(pub i64);

            impl FromRequest for $name {
                type Error = actix_web::Error;
                type Future = Ready<Result<Self, Self::Error>>;

                fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
                    ready(parse_positive_id(req, $segment).map($name))
                }
            }
        )*
    };
}

define_safe_id! {
    /// `{id}`
    SafeIDI64 => "id",
    SafeBatchIdI64 => "batch_id",
    SafeScheduleIdI64 => "schedule_id",
    SafeStudentIdI64 => "student_id",
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_parse_positive_id() {
        let req = TestRequest::default()
            .param("batch_id", "42")
            .to_http_request();
        assert_eq!(parse_positive_id(&req, "batch_id").unwrap(), 42);

        let req = TestRequest::default()
            .param("batch_id", "-1")
            .to_http_request();
        assert!(parse_positive_id(&req, "batch_id").is_err());

        let req = TestRequest::default().param("id", "abc").to_http_request();
        assert!(parse_positive_id(&req, "id").is_err());
        assert!(parse_positive_id(&req, "batch_id").is_err());
    }
}
