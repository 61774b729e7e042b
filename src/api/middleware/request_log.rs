//! Request log middleware
//!
//! Reports every incoming request to the log sink as `Incoming {METHOD} {PATH}`
//! and records method, path, status and latency in local tracing output.

use actix_service::{Service, Transform};
use actix_web::{
    Error,
    dev::{ServiceRequest, ServiceResponse},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::services::LogNotifier;

/// Request log middleware factory
#[derive(Clone)]
pub struct RequestLogMiddleware {
    notifier: Arc<dyn LogNotifier>,
}

impl RequestLogMiddleware {
    pub fn new(notifier: Arc<dyn LogNotifier>) -> Self {
        Self { notifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestLogMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLogService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLogService {
            service: Rc::new(service),
            notifier: Arc::clone(&self.notifier),
        }))
    }
}

pub struct RequestLogService<S> {
    service: Rc<S>,
    notifier: Arc<dyn LogNotifier>,
}

impl<S, B> Service<ServiceRequest> for RequestLogService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
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
        let start = Instant::now();
        let method = req.method().clone();
        let path = req.path().to_string();

        self.notifier
            .info("middleware", &format!("Incoming {} {}", method, path));

        Box::pin(async move {
            let result = srv.call(req).await;

            let status = match &result {
                Ok(response) => response.status().as_u16(),
                Err(e) => e.as_response_error().status_code().as_u16(),
            };
            debug!(
                "{} {} -> {} in {:?}",
                method,
                path,
                status,
                start.elapsed()
            );

            result
        })
    }
}
