//! Organization scoping for multi-tenant requests.
//!
//! Every business endpoint operates inside one organization. Clients name
//! it with the `X-Org-Id` header; the [`OrgId`] extractor pulls it out and
//! rejects requests that omit it. Whether the organization actually exists
//! is checked by middleware in the server binary, not here.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::ServiceError;

/// Header carrying the organization ID on every scoped request.
pub const ORG_HEADER: &str = "x-org-id";

/// The organization an API request is scoped to.
///
/// Extracted from the `X-Org-Id` header. Missing or empty values reject
/// the request with `VALIDATION_FAILED` before the handler runs.
#[derive(Debug, Clone)]
pub struct OrgId(pub String);

impl OrgId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for OrgId
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(ORG_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();

        if value.is_empty() {
            return Err(ServiceError::Validation(
                "missing X-Org-Id header".to_string(),
            ));
        }

        Ok(OrgId(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> Result<OrgId, ServiceError> {
        let (mut parts, _) = req.into_parts();
        OrgId::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn extracts_header() {
        let req = Request::builder()
            .header("X-Org-Id", "org123")
            .body(())
            .unwrap();
        let org = extract(req).await.unwrap();
        assert_eq!(org.as_str(), "org123");
    }

    #[tokio::test]
    async fn missing_header_rejected() {
        let req = Request::builder().body(()).unwrap();
        let err = extract(req).await.unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn blank_header_rejected() {
        let req = Request::builder()
            .header("X-Org-Id", "   ")
            .body(())
            .unwrap();
        assert!(extract(req).await.is_err());
    }
}
