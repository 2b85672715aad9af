/*!
 * 速率限制中间件
 *
 * 固定窗口计数：键由端点前缀、调用者标识与窗口序号组成，超出上限返回 429。
 * 已认证请求按用户 ID 计数，否则按客户端 IP。
 *
 * ```rust,ignore
 * web::resource("/login").route(web::post().to(login).wrap(RateLimit::login()))
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::CONTENT_TYPE,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::net::IpAddr;
use std::rc::Rc;
use std::time::Duration;
use tracing::warn;

use crate::models::{ApiResponse, ErrorCode, RequestContext};

// 计数器最长保留一小时，足以覆盖所有预设窗口
static COUNTERS: Lazy<Cache<String, u32>> = Lazy::new(|| {
    Cache::builder()
        .time_to_live(Duration::from_secs(3600))
        .max_capacity(100_000)
        .build()
});

#[derive(Clone)]
pub struct RateLimit {
    max_requests: u32,
    window_secs: u64,
    scope: &'static str,
}

impl RateLimit {
    pub fn new(scope: &'static str, max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs: window_secs.max(1),
            scope,
        }
    }

    /// 登录：5 次/分钟
    pub fn login() -> Self {
        Self::new("login", 5, 60)
    }

    /// 刷新令牌：10 次/分钟
    pub fn refresh_token() -> Self {
        Self::new("refresh", 10, 60)
    }

    /// 资源上传：20 次/分钟
    pub fn upload() -> Self {
        Self::new("upload", 20, 60)
    }

    fn bucket_key(&self, caller: &str, now_secs: u64) -> String {
        format!("{}:{}:{}", self.scope, caller, now_secs / self.window_secs)
    }
}

fn client_ip(req: &ServiceRequest) -> String {
    let peer = req
        .connection_info()
        .realip_remote_addr()
        .map(str::to_string);

    if let Some(ref ip) = peer
        && ip.parse::<IpAddr>().is_ok()
    {
        return ip.clone();
    }

    // 反向代理场景：取 X-Forwarded-For 中最靠近客户端的地址
    if let Some(ip) = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| ip.parse::<IpAddr>().is_ok())
    {
        return ip.to_string();
    }

    peer.unwrap_or_else(|| "unknown".to_string())
}

fn caller_identity(req: &ServiceRequest) -> String {
    match req.extensions().get::<RequestContext>() {
        Some(ctx) => format!("user:{}", ctx.user_id),
        None => format!("ip:{}", client_ip(req)),
    }
}

fn too_many_requests(retry_after: u64) -> HttpResponse {
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
        .insert_header(("Retry-After", retry_after.to_string()))
        .json(ApiResponse::<()>::error_empty(
            ErrorCode::RateLimitExceeded,
            "Too many requests, please try again later",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            limit: self.clone(),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    limit: RateLimit,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let limit = self.limit.clone();

        Box::pin(async move {
            let now = chrono::Utc::now().timestamp().max(0) as u64;
            let key = limit.bucket_key(&caller_identity(&req), now);

            let count = COUNTERS.get(&key).await.unwrap_or(0);
            if count >= limit.max_requests {
                warn!(
                    "Rate limit exceeded for key: {} ({}/{})",
                    key, count, limit.max_requests
                );
                let retry_after = limit.window_secs - now % limit.window_secs;
                return Ok(req.into_response(too_many_requests(retry_after).map_into_right_body()));
            }
            COUNTERS.insert(key, count + 1).await;

            Ok(srv.call(req).await?.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let login = RateLimit::login();
        assert_eq!(login.max_requests, 5);
        assert_eq!(login.window_secs, 60);
        assert_eq!(RateLimit::upload().scope, "upload");
    }

    #[test]
    fn test_bucket_rolls_over_per_window() {
        let limit = RateLimit::login();
        let a = limit.bucket_key("ip:1.2.3.4", 120);
        let b = limit.bucket_key("ip:1.2.3.4", 179);
        let c = limit.bucket_key("ip:1.2.3.4", 180);
        assert_eq!(a, b);
        assert_ne!(b, c);
        assert!(a.starts_with("login:ip:1.2.3.4:"));
    }
}
