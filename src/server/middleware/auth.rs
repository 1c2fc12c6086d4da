//! Permission-check middleware
//!
//! `CheckPermissions` wires the gate into one route: it reads the
//! process-boundary headers, runs the permission check, rewrites the
//! credential carrier to a canonical `Bearer` header, and attaches the
//! resulting [`AccessGrant`] to the request extensions for downstream
//! handlers.

use crate::auth::gate::{AccessGrant, CheckOptions, PermissionGate};
use crate::server::middleware::helpers::gate_request_from;
use crate::utils::error::GatewayError;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::header;
use actix_web::{HttpMessage, HttpRequest, web};
use futures::future::{Ready, ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

/// Per-route permission check middleware for Actix-web
pub struct CheckPermissions {
    required: Arc<Vec<String>>,
    options: Arc<CheckOptions>,
}

impl CheckPermissions {
    /// Protect a route with a set of permissions; the caller must hold at
    /// least one of them
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: Arc::new(required.into_iter().map(Into::into).collect()),
            options: Arc::new(CheckOptions::default()),
        }
    }

    /// Override the default check options
    pub fn with_options(mut self, options: CheckOptions) -> Self {
        self.options = Arc::new(options);
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for CheckPermissions
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>
        + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = CheckPermissionsService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CheckPermissionsService {
            service: Rc::new(service),
            required: Arc::clone(&self.required),
            options: Arc::clone(&self.options),
        }))
    }
}

/// Service implementation for the permission check middleware
pub struct CheckPermissionsService<S> {
    service: Rc<S>,
    required: Arc<Vec<String>>,
    options: Arc<CheckOptions>,
}

impl<S, B> Service<ServiceRequest> for CheckPermissionsService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>
        + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required = Arc::clone(&self.required);
        let options = Arc::clone(&self.options);

        Box::pin(async move {
            let gate = req
                .app_data::<web::Data<PermissionGate>>()
                .cloned()
                .ok_or_else(|| {
                    actix_web::Error::from(GatewayError::internal(
                        "Missing permission gate",
                    ))
                })?;

            let input = gate_request_from(&req);
            let grant = gate.check_permissions(&required, &options, &input).await?;

            // Downstream bearer-token middleware sees one canonical scheme
            // whatever the original header carried
            if let Some(bearer) = &grant.canonical_bearer {
                if let Ok(value) = header::HeaderValue::from_str(bearer) {
                    req.headers_mut().insert(header::AUTHORIZATION, value);
                }
            }

            req.extensions_mut().insert(grant);
            service.call(req).await
        })
    }
}

/// Access grant attached to the request by [`CheckPermissions`]
pub fn get_access_grant(req: &HttpRequest) -> Result<AccessGrant, actix_web::Error> {
    req.extensions()
        .get::<AccessGrant>()
        .cloned()
        .ok_or_else(|| {
            actix_web::Error::from(GatewayError::internal("Missing access grant"))
        })
}
