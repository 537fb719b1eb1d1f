//! Tenant scoping middleware.
//!
//! Module routes act on the organization named by the `X-Org-Id` header.
//! The extractor in `centro-core` enforces that the header is present;
//! this middleware additionally rejects ids that name no existing org,
//! so a mistyped id cannot silently read or write an empty tenant.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use centro_core::{ORG_HEADER, ServiceError};
use org::service::OrgService;

use crate::auth_middleware::is_public_path;

pub async fn org_guard(
    State(orgs): State<Arc<OrgService>>,
    request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let path = request.uri().path();
    // The org module itself manages tenants and is not scoped by one.
    if is_public_path(path) || path == "/org" || path.starts_with("/org/") {
        return Ok(next.run(request).await);
    }

    if let Some(org_id) = request
        .headers()
        .get(ORG_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
    {
        if !orgs.exists(org_id)? {
            return Err(ServiceError::NotFound(format!("org '{org_id}' not found")));
        }
    }
    // A missing header falls through to the extractor, which reports it.

    Ok(next.run(request).await)
}
