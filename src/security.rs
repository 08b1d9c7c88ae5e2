//! Response decoration with a fixed set of security headers.
//!
//! Every response leaving the router passes through [`security_headers`]. The
//! only variation is the environment: production enforces the content security
//! policy and adds HSTS, everything else reports policy violations only.

use axum::extract::{Request, State};
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

pub const CONTENT_SECURITY_POLICY: &str = concat!(
    "default-src 'self'; ",
    "script-src 'self'; ",
    "style-src 'self'; ",
    "img-src 'self' data: https:; ",
    "font-src 'self' data:; ",
    "frame-ancestors 'self'; ",
    "form-action 'self'; ",
    "base-uri 'self'; ",
    "object-src 'none'"
);
pub const STRICT_TRANSPORT_SECURITY: &str = "max-age=31536000; includeSubDomains; preload";

pub static PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");
pub static X_POWERED_BY: HeaderName = HeaderName::from_static("x-powered-by");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SecurityHeaders {
    production: bool,
}

impl SecurityHeaders {
    pub fn new(production: bool) -> Self {
        Self { production }
    }
    pub fn production(&self) -> bool {
        self.production
    }
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
        let csp = if self.production {
            header::CONTENT_SECURITY_POLICY
        } else {
            header::CONTENT_SECURITY_POLICY_REPORT_ONLY
        };
        headers.insert(csp, HeaderValue::from_static(CONTENT_SECURITY_POLICY));
        headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        headers.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block"));
        headers.insert(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        );
        headers.insert(
            PERMISSIONS_POLICY.clone(),
            HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
        );
        if self.production {
            headers.insert(
                header::STRICT_TRANSPORT_SECURITY,
                HeaderValue::from_static(STRICT_TRANSPORT_SECURITY),
            );
        }
        headers.remove(&X_POWERED_BY);
        headers.remove(header::SERVER);
    }
}

pub async fn security_headers(
    State(policy): State<SecurityHeaders>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    policy.apply(response.headers_mut());
    response
}
