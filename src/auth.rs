/// Agent authentication extractors
use crate::{context::GateContext, error::GateError, identity::AgentIdentity, middleware};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

/// Verified agent context - extracts the DID headers and verifies them
///
/// Rejects the request with 401 when no identifier header is present or
/// the remote service does not verify the identifier.
#[derive(Debug, Clone)]
pub struct AgentContext {
    pub did: String,
    pub identity: AgentIdentity,
}

#[async_trait]
impl<S> FromRequestParts<S> for AgentContext
where
    GateContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // A gating middleware may already have verified this request
        if let Some(agent) = parts.extensions.get::<AgentContext>() {
            return Ok(agent.clone());
        }

        let ctx = GateContext::from_ref(state);
        middleware::verify_request(&ctx, &parts.headers).await
    }
}

/// Optional agent context - does not fail when no identity is provided
/// or the identifier is not verified
#[derive(Debug, Clone)]
pub struct OptionalAgentContext {
    pub agent: Option<AgentContext>,
}

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAgentContext
where
    GateContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(agent) = parts.extensions.get::<AgentContext>() {
            return Ok(OptionalAgentContext {
                agent: Some(agent.clone()),
            });
        }

        let ctx = GateContext::from_ref(state);

        let agent = match middleware::extract_agent_did(&parts.headers) {
            Some(did) => ctx
                .verifier
                .verify(&did)
                .await
                .map(|identity| AgentContext { did, identity }),
            None => None,
        };

        Ok(OptionalAgentContext { agent })
    }
}
