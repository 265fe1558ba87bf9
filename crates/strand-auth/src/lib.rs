//! # strand-auth
//!
//! Authentication boundary for the strand transport.
//!
//! Credential issuance and verification belong to an external identity
//! system; the transport only consumes a yes/no predicate per request.
//! This crate defines that predicate ([`Authenticator`]) and the two
//! implementations the gateway ships with: [`AllowAll`] for local
//! development and [`StaticToken`] for deployments fronted by a shared
//! bearer token.

#![deny(unsafe_code)]

/// Caller-identity view of one inbound request.
///
/// Deliberately minimal: the transport never inspects anything beyond
/// what the predicate needs.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    bearer_token: Option<String>,
}

impl RequestContext {
    /// A request carrying no credentials.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A request carrying the given bearer token.
    pub fn with_bearer(token: impl Into<String>) -> Self {
        Self {
            bearer_token: Some(token.into()),
        }
    }

    /// Build from a raw `Authorization` header value, if any.
    ///
    /// Only the `Bearer` scheme is recognized; anything else yields an
    /// anonymous context.
    #[must_use]
    pub fn from_authorization_header(value: Option<&str>) -> Self {
        let bearer_token = value
            .and_then(|v| v.strip_prefix("Bearer "))
            .filter(|t| !t.is_empty())
            .map(ToOwned::to_owned);
        Self { bearer_token }
    }

    /// The bearer token presented by the caller, if any.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }
}

/// The authentication predicate the transport consumes.
///
/// Implementations decide whether a caller may open streams or deliver
/// messages; the transport treats the answer as opaque.
pub trait Authenticator: Send + Sync {
    /// Whether the caller behind `ctx` is authenticated.
    fn is_authenticated(&self, ctx: &RequestContext) -> bool;
}

/// Accepts every caller. Development default.
pub struct AllowAll;

impl Authenticator for AllowAll {
    fn is_authenticated(&self, _ctx: &RequestContext) -> bool {
        true
    }
}

/// Accepts callers presenting one pre-shared bearer token.
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    /// Create an authenticator for the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Authenticator for StaticToken {
    fn is_authenticated(&self, ctx: &RequestContext) -> bool {
        ctx.bearer_token() == Some(self.token.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
