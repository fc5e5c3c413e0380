//! Authorization guards.
//!
//! A guard reads the identity the authenticator attached under its `ContextKey` and
//! either lets the request through or answers it:
//! - 401 when there is no identity,
//! - 403 when there is one but it lacks the group / scope / validator approval.
//!
//! Guards are applied per router with `route_layer`, inside the authenticator.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, request::Parts},
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::identity::{Attachment, ContextKey, lookup};

/// Custom authorization decision for [`is_allowed`].
///
/// `groups` and `scopes` are empty when the identity lacks them, or when there is no
/// identity at all.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, request: &Parts, groups: &[String], scopes: &[String]) -> bool;
}

/// Adapts a synchronous closure into a [`Validator`].
pub struct FnValidator<F>(F);

pub fn validator_fn<F>(f: F) -> FnValidator<F>
where
    F: Fn(&Parts, &[String], &[String]) -> bool + Send + Sync,
{
    FnValidator(f)
}

#[async_trait]
impl<F> Validator for FnValidator<F>
where
    F: Fn(&Parts, &[String], &[String]) -> bool + Send + Sync,
{
    async fn validate(&self, request: &Parts, groups: &[String], scopes: &[String]) -> bool {
        (self.0)(request, groups, scopes)
    }
}

#[derive(Clone)]
enum Rule {
    Authenticated,
    Group(Arc<str>),
    Scope(Arc<str>),
    Allowed(Arc<dyn Validator>),
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Authenticated => f.write_str("Authenticated"),
            Rule::Group(group) => f.debug_tuple("Group").field(group).finish(),
            Rule::Scope(scope) => f.debug_tuple("Scope").field(scope).finish(),
            Rule::Allowed(_) => f.write_str("Allowed"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Guard {
    key: ContextKey,
    rule: Rule,
}

/// Continue when an identity is attached; 401 otherwise.
pub fn is_authenticated(key: &ContextKey) -> Guard {
    Guard::new(key, Rule::Authenticated)
}

/// 401 without identity; 403 unless `cognito:groups` contains `group` exactly.
pub fn has_group(key: &ContextKey, group: impl AsRef<str>) -> Guard {
    Guard::new(key, Rule::Group(Arc::from(group.as_ref())))
}

/// 401 without identity; 403 unless the space-separated `scope` contains `scope` exactly.
pub fn has_scope(key: &ContextKey, scope: impl AsRef<str>) -> Guard {
    Guard::new(key, Rule::Scope(Arc::from(scope.as_ref())))
}

/// Asks `validator`, even without an identity. Denial is 403 with an identity, 401 without.
pub fn is_allowed<V>(key: &ContextKey, validator: V) -> Guard
where
    V: Validator + 'static,
{
    Guard::new(key, Rule::Allowed(Arc::new(validator)))
}

impl Guard {
    fn new(key: &ContextKey, rule: Rule) -> Self {
        Self {
            key: key.clone(),
            rule,
        }
    }

    /// Puts this guard in front of the routes of `router`.
    ///
    /// Routes added to `router` afterwards are not guarded.
    pub fn apply<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(middleware::from_fn_with_state(self, enforce))
    }

    /// Decides a request from its parts.
    pub async fn check(&self, parts: &Parts) -> Result<(), AppError> {
        let attachment = lookup(&parts.extensions, &self.key);
        if let Attachment::Unchecked = attachment {
            tracing::warn!(
                context_key = %self.key,
                "guard ran without an authenticator for this key"
            );
        }
        let identity = attachment.identity();

        match &self.rule {
            Rule::Authenticated => identity.map(|_| ()).ok_or(AppError::Unauthorized),
            Rule::Group(group) => {
                let identity = identity.ok_or(AppError::Unauthorized)?;
                if identity.has_group(group) {
                    Ok(())
                } else {
                    Err(AppError::Forbidden)
                }
            }
            Rule::Scope(scope) => {
                let identity = identity.ok_or(AppError::Unauthorized)?;
                if identity.has_scope(scope) {
                    Ok(())
                } else {
                    Err(AppError::Forbidden)
                }
            }
            Rule::Allowed(validator) => {
                let groups = identity.and_then(|i| i.groups()).unwrap_or_default();
                let scopes = identity.and_then(|i| i.scopes()).unwrap_or_default();

                if validator.validate(parts, groups, scopes).await {
                    Ok(())
                } else if identity.is_some() {
                    Err(AppError::Forbidden)
                } else {
                    Err(AppError::Unauthorized)
                }
            }
        }
    }
}

async fn enforce(
    State(guard): State<Guard>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let (parts, body) = req.into_parts();

    if let Err(err) = guard.check(&parts).await {
        tracing::debug!(rule = ?guard.rule, path = %parts.uri.path(), status = %err.status(), "request denied");
        return Err(err);
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}
