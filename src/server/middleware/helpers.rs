//! Helper functions for middleware

use crate::auth::api_key::parse_key;
use crate::auth::gate::{
    API_KEY_HEADER, ENV_HEADER, GateRequest, ORGANIZATION_ID_HEADER, PLATFORM_ID_HEADER,
    TARGET_USER_ID_HEADER, WORKFLOW_KEY_HEADER,
};
use crate::auth::types::Plan;
use actix_web::HttpMessage;
use actix_web::dev::ServiceRequest;
use actix_web::http::header::HeaderMap;

/// System bypass hash, inserted into request extensions by internal
/// service-to-service callers before the gate runs
#[derive(Debug, Clone)]
pub struct SystemHash(pub String);

/// Subscription plan resolved for the platform, inserted into request
/// extensions by upstream platform-resolution middleware
#[derive(Debug, Clone)]
pub struct RequestPlan(pub Plan);

/// Header value as a string, when present and valid UTF-8
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Build the gate input from the request's headers and extensions
///
/// The environment falls back to the env segment embedded in the API key
/// when the header is absent.
pub fn gate_request_from(req: &ServiceRequest) -> GateRequest {
    let headers = req.headers();

    let authorization = header_str(headers, "authorization").map(str::to_string);
    let api_key = header_str(headers, API_KEY_HEADER).map(str::to_string);

    let env = header_str(headers, ENV_HEADER)
        .map(str::to_string)
        .or_else(|| {
            let raw_key = api_key.as_deref().or_else(|| {
                authorization
                    .as_deref()
                    .and_then(|raw| raw.split_whitespace().nth(1))
            })?;
            parse_key(raw_key).env
        })
        .unwrap_or_else(|| "test".to_string());

    let extensions = req.extensions();
    GateRequest {
        platform_id: header_str(headers, PLATFORM_ID_HEADER)
            .unwrap_or_default()
            .to_string(),
        env,
        authorization,
        api_key,
        system_hash: extensions.get::<SystemHash>().map(|hash| hash.0.clone()),
        workflow_key: header_str(headers, WORKFLOW_KEY_HEADER).map(str::to_string),
        organization_id: header_str(headers, ORGANIZATION_ID_HEADER).map(str::to_string),
        target_user_id: header_str(headers, TARGET_USER_ID_HEADER).map(str::to_string),
        plan: extensions.get::<RequestPlan>().map(|plan| plan.0.clone()),
        body: None,
    }
}
