//! Token claims as returned by an identity resolver.
//!
//! Only the claims guards depend on are typed (`exp`, `cognito:groups`, `scope`).
//! Everything else is preserved as-is in `extra`.

use serde::Deserialize;
use serde_json::{Map, Value};

pub const GROUPS_CLAIM: &str = "cognito:groups";
pub const SCOPE_CLAIM: &str = "scope";

/// Validated claims of a resolved token.
///
/// - `groups` is `None` when the claim is missing or is not an array.
/// - `scopes` is the space-separated `scope` claim, pre-split. `None` when the claim is
///   missing or is not a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawClaims")]
pub struct Claims {
    pub exp: i64,
    pub groups: Option<Vec<String>>,
    pub scopes: Option<Vec<String>>,
    pub extra: Map<String, Value>,
}

// Wire shape. Groups/scope are taken out of `extra` loosely typed, so a malformed claim
// degrades to "absent" instead of failing the whole token.
#[derive(Deserialize)]
struct RawClaims {
    exp: i64,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RawClaims> for Claims {
    fn from(mut raw: RawClaims) -> Self {
        let groups = match raw.extra.remove(GROUPS_CLAIM) {
            Some(Value::Array(items)) => Some(
                items
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        };

        let scopes = match raw.extra.remove(SCOPE_CLAIM) {
            Some(Value::String(s)) => Some(split_scope(&s)),
            _ => None,
        };

        Self {
            exp: raw.exp,
            groups,
            scopes,
            extra: raw.extra,
        }
    }
}

fn split_scope(scope: &str) -> Vec<String> {
    scope
        .split(' ')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Claims {
    pub fn new(exp: i64) -> Self {
        Self {
            exp,
            groups: None,
            scopes: None,
            extra: Map::new(),
        }
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    /// Sets scopes from a space-separated string, as found in the `scope` claim.
    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scopes = Some(split_scope(scope));
        self
    }

    pub fn with_claim(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.groups
            .as_deref()
            .is_some_and(|groups| groups.iter().any(|g| g == group))
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes
            .as_deref()
            .is_some_and(|scopes| scopes.iter().any(|s| s == scope))
    }

    /// Looks up a claim that is not modelled as a typed field (`sub`, `username`, ...).
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}
