use crate::error::AppError;
use crate::logging::{ComponentLogger, SharedLogger};
use actix_web::{
    Error,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use std::any::Any;
use std::future::{Ready, ready};
use std::panic::AssertUnwindSafe;

/// Turns a panicking handler into a 500 response for that request only.
pub struct RecoverPanic {
    logger: SharedLogger,
}

impl RecoverPanic {
    pub fn new(logger: SharedLogger) -> Self {
        Self { logger }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RecoverPanic
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RecoverPanicService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RecoverPanicService {
            service,
            logger: ComponentLogger::new(self.logger.clone(), "recover_panic"),
        }))
    }
}

pub struct RecoverPanicService<S> {
    service: S,
    logger: ComponentLogger,
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl<S, B> Service<ServiceRequest> for RecoverPanicService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // the router needs sole ownership of the request, so keep copies only
        let method = req.method().clone();
        let path = req.path().to_owned();
        let logger = self.logger.clone();
        let fut = self.service.call(req);

        Box::pin(async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(res) => res,
                Err(payload) => {
                    let reason = panic_reason(payload.as_ref());
                    logger.error(format_args!("Handler panicked on {method} {path}: {reason}"));
                    Err(AppError::InternalError(reason).into())
                }
            }
        })
    }
}
