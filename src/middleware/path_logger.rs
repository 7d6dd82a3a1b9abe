use std::future::{ready, Ready};
use std::time::Instant;

use actix_web::{
    dev::{self, Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    Error,
};
use futures_util::future::LocalBoxFuture;
use log::Level;

/// Logs every `/api` exchange. Radar calls that end in a 5xx (the exchange
/// failed us) are raised to `warn`, everything else stays at `debug`.
pub struct PathLogger;

/// Log level for a finished request.
pub fn level_for(status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::Warn
    } else {
        Level::Debug
    }
}

impl<S, B> Transform<S, ServiceRequest> for PathLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = PathLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(PathLoggerMiddleware { service }))
    }
}

pub struct PathLoggerMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for PathLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();
        let target = format!("{} {}?{}", req.method(), req.path(), req.query_string());
        log::debug!("--> {target}");

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;
            let status = res.status();
            log::log!(
                level_for(status),
                "<-- {target} {status} in {:?}",
                started.elapsed()
            );
            Ok(res)
        })
    }
}
