//! Agent identity verification middleware for axum.
//!
//! Reads an agent DID from the `X-Agent-DID` (or `X-Agent-Identity`)
//! request header, verifies it against a remote identity service, caches
//! the outcome, and either rejects the request with a structured JSON
//! error or hands the verified identity to the handler.
//!
//! ```no_run
//! use agent_gate::{AgentContext, GateConfig, GateContext, OptionalAgentContext};
//! use axum::{routing::get, Json, Router};
//!
//! async fn agent_only(agent: AgentContext) -> Json<serde_json::Value> {
//!     Json(serde_json::json!({
//!         "message": format!("Hello, {}!", agent.identity.name),
//!         "your_reputation": agent.identity.reputation,
//!     }))
//! }
//!
//! async fn tracked(agent: OptionalAgentContext) -> Json<serde_json::Value> {
//!     match agent.agent {
//!         Some(agent) => Json(serde_json::json!({
//!             "message": format!("Tracked request from {}", agent.identity.name),
//!         })),
//!         None => Json(serde_json::json!({ "message": "Anonymous request" })),
//!     }
//! }
//!
//! # async fn run() -> agent_gate::GateResult<()> {
//! let ctx = GateContext::new(GateConfig::from_env()).await?;
//! let _sweeper = ctx.start_sweeper();
//!
//! let app: Router = Router::new()
//!     .route("/agent-only", get(agent_only))
//!     .route("/tracked", get(tracked))
//!     .with_state(ctx);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod identity;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod rate_limit;

pub use auth::{AgentContext, OptionalAgentContext};
pub use config::GateConfig;
pub use context::GateContext;
pub use error::{GateError, GateResult};
pub use identity::{
    AgentIdentity, AgentVerifier, CachedVerification, IdentityStore, MemoryIdentityStore,
    RedisIdentityStore,
};
pub use jobs::spawn_cache_sweeper;
pub use middleware::{attach_agent, extract_agent_did, require_agent, require_reputation};
