/// Gate middleware and header extraction
use crate::{auth::AgentContext, context::GateContext, error::GateError};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use futures::future::BoxFuture;

/// Primary header carrying the agent DID
pub const AGENT_DID_HEADER: &str = "x-agent-did";
/// Fallback header, honored when the primary is absent
pub const AGENT_IDENTITY_HEADER: &str = "x-agent-identity";

/// Extract the agent DID from request headers
///
/// The primary header wins when both are present; a header whose value is
/// blank or not visible ASCII counts as absent.
pub fn extract_agent_did(headers: &HeaderMap) -> Option<String> {
    for name in [AGENT_DID_HEADER, AGENT_IDENTITY_HEADER] {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    None
}

/// Require a verified agent, rejecting the request otherwise
///
/// Use with `axum::middleware::from_fn_with_state`. The verified
/// `AgentContext` is inserted into request extensions for handlers and
/// downstream extractors.
pub async fn require_agent(
    State(ctx): State<GateContext>,
    mut req: Request,
    next: Next,
) -> Result<Response, GateError> {
    let agent = verify_request(&ctx, req.headers()).await?;
    req.extensions_mut().insert(agent);

    Ok(next.run(req).await)
}

/// Attach the agent identity when present and verified, never failing
///
/// Requests without an identifier, and identifiers the service does not
/// verify, pass through anonymously.
pub async fn attach_agent(State(ctx): State<GateContext>, mut req: Request, next: Next) -> Response {
    if let Ok(agent) = verify_request(&ctx, req.headers()).await {
        req.extensions_mut().insert(agent);
    }

    next.run(req).await
}

/// Middleware factory requiring a minimum reputation on top of a
/// verified identity
///
/// The required-identity checks run first, so an unverified agent is
/// rejected with 401 before the threshold is ever compared.
///
/// ```no_run
/// use agent_gate::{require_reputation, GateConfig, GateContext};
/// use axum::{middleware, routing::get, Router};
///
/// # async fn run() -> agent_gate::GateResult<()> {
/// let ctx = GateContext::new(GateConfig::from_env()).await?;
///
/// let app: Router = Router::new()
///     .route("/premium", get(|| async { "Welcome to the premium endpoint!" }))
///     .layer(middleware::from_fn_with_state(
///         ctx.clone(),
///         require_reputation(4.0),
///     ))
///     .with_state(ctx);
/// # Ok(())
/// # }
/// ```
pub fn require_reputation(
    min_reputation: f64,
) -> impl Fn(State<GateContext>, Request, Next) -> BoxFuture<'static, Result<Response, GateError>>
       + Clone
       + Send
       + 'static {
    move |State(ctx): State<GateContext>, mut req: Request, next: Next| {
        Box::pin(async move {
            let agent = verify_request(&ctx, req.headers()).await?;

            if agent.identity.reputation < min_reputation {
                return Err(GateError::InsufficientReputation {
                    required: min_reputation,
                    actual: agent.identity.reputation,
                    did: agent.did,
                });
            }

            req.extensions_mut().insert(agent);
            Ok(next.run(req).await)
        })
    }
}

/// Shared gate logic: header extraction, then verification
pub(crate) async fn verify_request(
    ctx: &GateContext,
    headers: &HeaderMap,
) -> Result<AgentContext, GateError> {
    let did = extract_agent_did(headers).ok_or_else(|| GateError::MissingIdentity {
        register_url: ctx.register_url(),
    })?;

    let identity = ctx
        .verifier
        .verify(&did)
        .await
        .ok_or_else(|| GateError::NotVerified {
            did: did.clone(),
            register_url: ctx.register_url(),
        })?;

    Ok(AgentContext { did, identity })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn primary_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(AGENT_DID_HEADER, HeaderValue::from_static("did:agent:a"));
        headers.insert(
            AGENT_IDENTITY_HEADER,
            HeaderValue::from_static("did:agent:b"),
        );

        assert_eq!(extract_agent_did(&headers).as_deref(), Some("did:agent:a"));
    }

    #[test]
    fn fallback_header_honored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            AGENT_IDENTITY_HEADER,
            HeaderValue::from_static("did:agent:b"),
        );

        assert_eq!(extract_agent_did(&headers).as_deref(), Some("did:agent:b"));
    }

    #[test]
    fn blank_primary_falls_through_to_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(AGENT_DID_HEADER, HeaderValue::from_static("   "));
        headers.insert(
            AGENT_IDENTITY_HEADER,
            HeaderValue::from_static("did:agent:b"),
        );

        assert_eq!(extract_agent_did(&headers).as_deref(), Some("did:agent:b"));
    }

    #[test]
    fn absent_headers_yield_none() {
        assert!(extract_agent_did(&HeaderMap::new()).is_none());
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let mut headers = HeaderMap::new();
        headers.insert(AGENT_DID_HEADER, HeaderValue::from_static(" did:agent:a "));

        assert_eq!(extract_agent_did(&headers).as_deref(), Some("did:agent:a"));
    }
}
