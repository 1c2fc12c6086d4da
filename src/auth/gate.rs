//! Permission gate
//!
//! Per-request orchestration: determine the credential source, resolve the
//! caller's access info, and enforce that at least one requested permission
//! is granted. Credential sources form an ordered chain; each strategy
//! either produces a resolution or declines, and the first resolution wins:
//!
//! 1. System bypass (internal service-to-service hash)
//! 2. Workflow bypass (this process's workflow runner key)
//! 3. Secret API key
//! 4. User token (with optional organization override)
//! 5. Anonymous (`public` role only)
//!
//! The gate holds no per-request state; every failure at any stage is
//! terminal for the request and propagates untouched.

use crate::auth::access::{AccessInfo, AccessParams, compute_access_info, dedupe};
use crate::auth::api_key::{PUBLISHABLE_KEY_TYPE, get_base_key, parse_key};
use crate::auth::credentials::{canonical_bearer, credential_from_headers};
use crate::auth::namespaces::WILDCARD_NAMESPACE;
use crate::auth::request_data::{RequestDataParams, check_request_data};
use crate::auth::security::SecurityContext;
use crate::auth::services::Services;
use crate::auth::token::{TokenVerifier, VerifiedToken};
use crate::auth::types::{Claims, Credential, Plan};
use crate::config::AuthConfig;
use crate::utils::error::{GatewayError, Result};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Sentinel permission controlling `platformData` writes, always resolved
/// even when the operation does not require it
pub const PLATFORM_DATA_EDIT_ALL: &str = "platformData:edit:all";

/// Role implicitly held by token- and anonymous-sourced requests
pub const PUBLIC_ROLE: &str = "public";

/// Legacy API key header
pub const API_KEY_HEADER: &str = "x-api-key";
/// Workflow bypass key header
pub const WORKFLOW_KEY_HEADER: &str = "x-stelace-workflow-key";
/// Organization override header
pub const ORGANIZATION_ID_HEADER: &str = "x-stelace-organization-id";
/// Target-user override header
pub const TARGET_USER_ID_HEADER: &str = "x-stelace-user-id";
/// Platform selection header
pub const PLATFORM_ID_HEADER: &str = "x-platform-id";
/// Environment selection header
pub const ENV_HEADER: &str = "x-stelace-env";

/// How the request authenticated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CredentialSource {
    /// Internal service-to-service call
    System,
    /// This process's workflow runner
    Workflow,
    /// Secret API key
    ApiKey,
    /// Verified user token
    Token,
    /// No usable credential
    #[default]
    Anonymous,
}

impl CredentialSource {
    /// Name used in diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Workflow => "workflowKey",
            Self::ApiKey => "apiKey",
            Self::Token => "token",
            Self::Anonymous => "public",
        }
    }
}

/// Per-operation check options
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Resolve access info but never throw on missing permissions
    pub optional_check: bool,
    /// Validate `metadata` / `platformData` in the request body
    pub check_data: bool,
    /// The operation explicitly allows editing protected namespaces
    pub edit_protected_namespaces: bool,
    /// Run the full permission resolution even for system-bypass calls
    pub check_permissions_from_system: bool,
}

/// Process-boundary inputs the gate reads
#[derive(Debug, Clone, Default)]
pub struct GateRequest {
    /// Platform the request runs against
    pub platform_id: String,
    /// Environment, `live` or `test`
    pub env: String,
    /// Raw `Authorization` header
    pub authorization: Option<String>,
    /// Legacy `x-api-key` header
    pub api_key: Option<String>,
    /// System bypass hash, attached by internal callers
    pub system_hash: Option<String>,
    /// `x-stelace-workflow-key` header
    pub workflow_key: Option<String>,
    /// `x-stelace-organization-id` header
    pub organization_id: Option<String>,
    /// `x-stelace-user-id` header
    pub target_user_id: Option<String>,
    /// Subscription plan for the platform
    pub plan: Option<Plan>,
    /// Parsed JSON request body, when the operation opted into data checks
    pub body: Option<serde_json::Value>,
}

/// What the gate attaches to the request context for downstream handlers
#[derive(Debug, Clone, Default)]
pub struct AccessGrant {
    /// Requested permissions that were granted
    pub matched_permissions: HashMap<String, bool>,
    /// Permissions withheld by the subscription plan
    pub missing_plan_permissions: Vec<String>,
    /// Roles the resolution ran with
    pub roles: Vec<String>,
    /// Namespaces the caller can read
    pub read_namespaces: Vec<String>,
    /// Namespaces the caller can edit
    pub edit_namespaces: Vec<String>,
    /// Authenticated user, when a token supplied one
    pub user_id: Option<String>,
    /// Organization id supplied by the caller
    pub organization_id: Option<String>,
    /// Canonical organization id resolved by the membership check
    pub real_organization_id: Option<String>,
    /// Target-user override, honored only for fully all-scoped operations
    pub target_user_id: Option<String>,
    /// Whether the system bypass hash matched
    pub is_system: bool,
    /// Winning credential source
    pub source: CredentialSource,
    /// Canonical `Bearer <token>` carrier for downstream middleware
    pub canonical_bearer: Option<String>,
}

struct Resolution {
    source: CredentialSource,
    info: AccessInfo,
    user_id: Option<String>,
    organization_id: Option<String>,
    real_organization_id: Option<String>,
}

/// The orchestrating middleware core
pub struct PermissionGate {
    services: Services,
    security: Arc<SecurityContext>,
    verifier: TokenVerifier,
}

impl PermissionGate {
    /// Create a new gate over the collaborator handles
    pub fn new(
        services: Services,
        security: Arc<SecurityContext>,
        config: &AuthConfig,
    ) -> Self {
        info!("Initializing permission gate");

        let verifier = TokenVerifier::new(services.authentication.clone(), config);
        Self {
            services,
            security,
            verifier,
        }
    }

    /// Security context handle
    pub fn security(&self) -> &SecurityContext {
        &self.security
    }

    /// Run the permission check for one request
    pub async fn check_permissions(
        &self,
        required_permissions: &[String],
        options: &CheckOptions,
        request: &GateRequest,
    ) -> Result<AccessGrant> {
        // The namespace guard depends on the sentinel's grant status, so it
        // is always resolved alongside the requested permissions
        let mut permissions_to_check = required_permissions.to_vec();
        if !permissions_to_check.iter().any(|p| p == PLATFORM_DATA_EDIT_ALL) {
            permissions_to_check.push(PLATFORM_DATA_EDIT_ALL.to_string());
        }

        let credential = credential_from_headers(
            request.authorization.as_deref(),
            request.api_key.as_deref(),
        )?;

        let verified = match &credential.token {
            Some(token) => {
                self.verifier
                    .verify(token, &request.platform_id, &request.env)
                    .await?
            }
            None => VerifiedToken {
                claims: None,
                is_internal: false,
            },
        };

        let is_system = request
            .system_hash
            .as_deref()
            .map(|hash| {
                self.security
                    .is_system(hash, &request.platform_id, &request.env)
            })
            .unwrap_or(false);

        let mut sources_checked: Vec<&'static str> = Vec::new();
        let resolution = self
            .resolve(
                &permissions_to_check,
                options,
                request,
                &credential,
                verified.claims.as_ref(),
                is_system,
                &mut sources_checked,
            )
            .await?;

        let mut info = resolution.info;

        // Directly-attached permissions always win over role grants
        for permission in &info.array_permissions {
            info.hash_permissions.insert(permission.clone(), true);
        }

        let matched_permissions: HashMap<String, bool> = permissions_to_check
            .iter()
            .filter(|p| info.hash_permissions.get(p.as_str()).copied().unwrap_or(false))
            .map(|p| (p.clone(), true))
            .collect();

        check_enough_permissions(
            required_permissions,
            &matched_permissions,
            options.optional_check,
            &sources_checked,
        )?;

        if options.check_data {
            if let Some(body) = &request.body {
                check_request_data(&RequestDataParams {
                    metadata: body.get("metadata"),
                    platform_data: body.get("platformData"),
                    is_system_request: is_system,
                    matched_permissions: &matched_permissions,
                    edit_namespaces: &info.edit_namespaces,
                    edit_protected_namespaces: options.edit_protected_namespaces,
                })?;
            }
        }

        // The override header only applies when the operation is entirely
        // all-scoped and every required permission was matched; a
        // narrowly-scoped caller cannot impersonate another user with it.
        // An empty required list honors the override.
        let allow_target_user_id = required_permissions.iter().all(|p| {
            p.ends_with(":all")
                && matched_permissions.get(p).copied().unwrap_or(false)
        });
        let target_user_id = if allow_target_user_id {
            request.target_user_id.clone()
        } else {
            None
        };

        debug!(
            source = resolution.source.as_str(),
            matched = matched_permissions.len(),
            "permissions checked"
        );

        Ok(AccessGrant {
            matched_permissions,
            missing_plan_permissions: info.missing_plan_permissions,
            roles: info.roles,
            read_namespaces: info.read_namespaces,
            edit_namespaces: info.edit_namespaces,
            user_id: resolution.user_id,
            organization_id: resolution.organization_id,
            real_organization_id: resolution.real_organization_id,
            target_user_id,
            is_system,
            source: resolution.source,
            canonical_bearer: canonical_bearer(&credential),
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn resolve(
        &self,
        permissions_to_check: &[String],
        options: &CheckOptions,
        request: &GateRequest,
        credential: &Credential,
        claims: Option<&Claims>,
        is_system: bool,
        sources_checked: &mut Vec<&'static str>,
    ) -> Result<Resolution> {
        if let Some(resolution) =
            self.try_system(permissions_to_check, options, is_system, sources_checked)
        {
            return Ok(resolution);
        }
        if let Some(resolution) =
            self.try_workflow(permissions_to_check, request, sources_checked)?
        {
            return Ok(resolution);
        }
        if let Some(resolution) = self
            .try_api_key(permissions_to_check, request, credential, sources_checked)
            .await?
        {
            return Ok(resolution);
        }
        if let Some(resolution) = self
            .try_token(permissions_to_check, request, claims, sources_checked)
            .await?
        {
            return Ok(resolution);
        }
        self.resolve_anonymous(permissions_to_check, request, sources_checked)
            .await
    }

    fn try_system(
        &self,
        permissions_to_check: &[String],
        options: &CheckOptions,
        is_system: bool,
        sources_checked: &mut Vec<&'static str>,
    ) -> Option<Resolution> {
        if !is_system {
            return None;
        }
        sources_checked.push("system");

        // Callers may opt into real permission checks even from the system
        // source; the bypass then declines and the chain continues
        if options.check_permissions_from_system {
            return None;
        }

        Some(Resolution {
            source: CredentialSource::System,
            info: grant_all(permissions_to_check),
            user_id: None,
            organization_id: None,
            real_organization_id: None,
        })
    }

    fn try_workflow(
        &self,
        permissions_to_check: &[String],
        request: &GateRequest,
        sources_checked: &mut Vec<&'static str>,
    ) -> Result<Option<Resolution>> {
        let Some(workflow_key) = request.workflow_key.as_deref() else {
            return Ok(None);
        };
        sources_checked.push("workflowKey");

        // A non-matching key is a caller bug, not an anonymous fallback
        if workflow_key != self.security.workflow_key() {
            return Err(GatewayError::bad_request("Invalid workflow key"));
        }

        Ok(Some(Resolution {
            source: CredentialSource::Workflow,
            info: grant_all(permissions_to_check),
            user_id: None,
            organization_id: None,
            real_organization_id: None,
        }))
    }

    async fn try_api_key(
        &self,
        permissions_to_check: &[String],
        request: &GateRequest,
        credential: &Credential,
        sources_checked: &mut Vec<&'static str>,
    ) -> Result<Option<Resolution>> {
        let Some(raw_key) = credential.api_key.as_deref() else {
            return Ok(None);
        };

        // Publishable keys are excluded from the secret-key path; their
        // requests resolve through the token or anonymous strategies
        if parse_key(raw_key).key_type.as_deref() == Some(PUBLISHABLE_KEY_TYPE) {
            return Ok(None);
        }
        sources_checked.push("apiKey");

        let api_key = self
            .services
            .api_keys
            .get_api_key(&get_base_key(raw_key), &request.platform_id, &request.env)
            .await?
            .ok_or_else(|| GatewayError::unauthorized("Invalid API key"))?;

        let info = compute_access_info(
            &self.services,
            AccessParams {
                roles: api_key.roles,
                permissions: api_key.permissions,
                read_namespaces: api_key.read_namespaces,
                edit_namespaces: api_key.edit_namespaces,
                restricted_roles: None,
                platform_id: request.platform_id.clone(),
                env: request.env.clone(),
                plan: request.plan.clone(),
                permissions_to_check: permissions_to_check.to_vec(),
            },
        )
        .await?;

        Ok(Some(Resolution {
            source: CredentialSource::ApiKey,
            info,
            user_id: None,
            organization_id: None,
            real_organization_id: None,
        }))
    }

    async fn try_token(
        &self,
        permissions_to_check: &[String],
        request: &GateRequest,
        claims: Option<&Claims>,
        sources_checked: &mut Vec<&'static str>,
    ) -> Result<Option<Resolution>> {
        let Some(claims) = claims else {
            return Ok(None);
        };
        sources_checked.push("token");

        if let Some(organization_id) = request.organization_id.as_deref() {
            return self
                .resolve_organization_member(
                    permissions_to_check,
                    request,
                    claims,
                    organization_id,
                )
                .await
                .map(Some);
        }

        let roles = dedupe(claims.roles.clone(), vec![PUBLIC_ROLE.to_string()]);
        let info = compute_access_info(
            &self.services,
            AccessParams {
                roles,
                permissions: claims.declared_permissions(),
                restricted_roles: None,
                platform_id: request.platform_id.clone(),
                env: request.env.clone(),
                plan: request.plan.clone(),
                permissions_to_check: permissions_to_check.to_vec(),
                ..Default::default()
            },
        )
        .await?;

        Ok(Some(Resolution {
            source: CredentialSource::Token,
            info,
            user_id: claims.subject().map(str::to_string),
            organization_id: None,
            real_organization_id: None,
        }))
    }

    async fn resolve_organization_member(
        &self,
        permissions_to_check: &[String],
        request: &GateRequest,
        claims: &Claims,
        organization_id: &str,
    ) -> Result<Resolution> {
        let Some(user_id) = claims.subject() else {
            return Err(GatewayError::forbidden(format!(
                "Cannot provide the header \"{}\" if there is no sub or userId in the token",
                ORGANIZATION_ID_HEADER
            )));
        };

        let membership = self
            .services
            .users
            .is_organization_member(
                &request.platform_id,
                &request.env,
                user_id,
                organization_id,
            )
            .await?;

        if membership.errors.user_not_found {
            return Err(GatewayError::forbidden(format!(
                "User {} not found",
                user_id
            )));
        }
        if membership.errors.organization_not_found {
            return Err(GatewayError::forbidden(format!(
                "Organization {} not found",
                organization_id
            )));
        }
        if !membership.is_org_member {
            return Err(GatewayError::forbidden(format!(
                "User {} is not a member of organization {}",
                user_id, organization_id
            )));
        }

        // The member's roles further restricted by what the organization
        // allows; this never grants beyond the member's base roles
        let restricted_roles = membership
            .organization
            .as_ref()
            .map(|organization| organization.roles.clone())
            .filter(|roles| !roles.is_empty());

        let roles = dedupe(membership.roles, vec![PUBLIC_ROLE.to_string()]);
        let info = compute_access_info(
            &self.services,
            AccessParams {
                roles,
                restricted_roles,
                platform_id: request.platform_id.clone(),
                env: request.env.clone(),
                plan: request.plan.clone(),
                permissions_to_check: permissions_to_check.to_vec(),
                ..Default::default()
            },
        )
        .await?;

        Ok(Resolution {
            source: CredentialSource::Token,
            info,
            user_id: Some(user_id.to_string()),
            organization_id: Some(organization_id.to_string()),
            real_organization_id: membership
                .real_organization_id
                .or_else(|| Some(organization_id.to_string())),
        })
    }

    async fn resolve_anonymous(
        &self,
        permissions_to_check: &[String],
        request: &GateRequest,
        sources_checked: &mut Vec<&'static str>,
    ) -> Result<Resolution> {
        sources_checked.push("public");

        let info = compute_access_info(
            &self.services,
            AccessParams {
                roles: vec![PUBLIC_ROLE.to_string()],
                platform_id: request.platform_id.clone(),
                env: request.env.clone(),
                plan: request.plan.clone(),
                permissions_to_check: permissions_to_check.to_vec(),
                ..Default::default()
            },
        )
        .await?;

        Ok(Resolution {
            source: CredentialSource::Anonymous,
            info,
            user_id: None,
            organization_id: None,
            real_organization_id: None,
        })
    }
}

/// At least one requested permission must be granted, unless the caller
/// asked for an optional (non-throwing) check
pub(crate) fn check_enough_permissions(
    required_permissions: &[String],
    matched_permissions: &HashMap<String, bool>,
    optional_check: bool,
    sources_checked: &[&'static str],
) -> Result<()> {
    if required_permissions.is_empty() || optional_check {
        return Ok(());
    }

    let satisfied = required_permissions
        .iter()
        .any(|p| matched_permissions.get(p).copied().unwrap_or(false));
    if satisfied {
        return Ok(());
    }

    let mut matched: Vec<&String> = matched_permissions.keys().collect();
    matched.sort();

    Err(GatewayError::forbidden_with_details(
        "Insufficient permissions",
        json!({
            "sourcesChecked": sources_checked,
            "requiredPermissions": required_permissions,
            "matchedPermissions": matched,
        }),
    ))
}

/// Every checked permission granted, wildcard namespaces; the trusted
/// internal grant
fn grant_all(permissions_to_check: &[String]) -> AccessInfo {
    AccessInfo {
        roles: Vec::new(),
        hash_permissions: permissions_to_check
            .iter()
            .map(|p| (p.clone(), true))
            .collect(),
        array_permissions: Vec::new(),
        read_namespaces: vec![WILDCARD_NAMESPACE.to_string()],
        edit_namespaces: vec![WILDCARD_NAMESPACE.to_string()],
        missing_plan_permissions: Vec::new(),
    }
}
