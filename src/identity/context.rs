/*
 * Responsibility
 * - request extensions 上の「identity 置き場」(IdentityContext)
 * - ContextKey ごとに「確認済み・不在」と「確認済み・存在」を区別して保持する
 * - middleware が一度だけ書き込み、guard / extractor は読むだけ
 */
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use super::Identity;

/// Conventional slot name for the resolved identity.
pub const DEFAULT_CONTEXT_KEY: &str = "user";

/// Name of the slot an authenticator attaches its identity under.
///
/// Fixed when the pipeline is built and handed to every guard that reads the slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextKey(Cow<'static, str>);

impl ContextKey {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ContextKey {
    fn default() -> Self {
        Self(Cow::Borrowed(DEFAULT_CONTEXT_KEY))
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a reader finds under a key.
#[derive(Debug, Clone, Copy)]
pub enum Attachment<'a> {
    /// No authenticator has run for this key.
    Unchecked,
    /// An authenticator ran and resolved nothing.
    Absent,
    Present(&'a Arc<Identity>),
}

impl<'a> Attachment<'a> {
    pub fn identity(self) -> Option<&'a Arc<Identity>> {
        match self {
            Attachment::Present(identity) => Some(identity),
            Attachment::Unchecked | Attachment::Absent => None,
        }
    }
}

/// Per-request identity slots, stored in the request extensions.
#[derive(Debug, Clone, Default)]
pub struct IdentityContext {
    slots: Vec<(ContextKey, Option<Arc<Identity>>)>,
}

impl IdentityContext {
    /// Attaches an identity (or its absence) under `key`.
    ///
    /// Returns `false` and leaves the slot untouched if `key` was already attached.
    pub fn attach(&mut self, key: ContextKey, identity: Option<Arc<Identity>>) -> bool {
        if self.slots.iter().any(|(k, _)| *k == key) {
            return false;
        }
        self.slots.push((key, identity));
        true
    }

    pub fn lookup(&self, key: &ContextKey) -> Attachment<'_> {
        match self.slots.iter().find(|(k, _)| k == key) {
            None => Attachment::Unchecked,
            Some((_, None)) => Attachment::Absent,
            Some((_, Some(identity))) => Attachment::Present(identity),
        }
    }
}

/// Reads `key` from request extensions.
pub fn lookup<'a>(extensions: &'a axum::http::Extensions, key: &ContextKey) -> Attachment<'a> {
    extensions
        .get::<IdentityContext>()
        .map_or(Attachment::Unchecked, |ctx| ctx.lookup(key))
}
