//! Error types. `MarkupError` boxes its kind to keep `Result`s small.

use std::fmt;

use kstring::KString;
use thiserror::Error;

use crate::rewrite::DeferredKind;

#[derive(Error, Debug)]
pub enum MarkupErrorKind {
    #[error("cannot classify call arguments into attributes and content: \
             a = {a}, b = {b}")]
    ArgumentShape { a: String, b: String },

    #[error("deferred variable \"{name}\" is used as {second} but was already \
             used as {first} in the same body")]
    DeferredKindConflict { name: KString, first: DeferredKind, second: DeferredKind },

    #[error("missing required assign \"{name}\", available assigns: [{}]",
            .available.join(", "))]
    MissingRequiredAssign { name: KString, available: Vec<KString> },

    #[error("invalid attribute name \"{name}\"")]
    InvalidAttributeName { name: KString },

    #[error("void element <{tag}> cannot have content")]
    VoidElementContent { tag: KString },

    #[error("unknown tag \"{tag}\"")]
    UnknownTag { tag: KString },

    #[error("no component named \"{name}\" in the registry")]
    UnknownComponent { name: KString },

    #[error("no template named \"{name}\" in the registry")]
    UnknownTemplate { name: KString },

    #[error("a component call needs a registry to resolve \"{name}\"")]
    NoRegistry { name: KString },

    #[error("invalid JSON markup at {path}: {message}")]
    Json { path: String, message: String },
}

pub struct MarkupError(Box<MarkupErrorKind>);

impl MarkupError {
    pub fn kind(&self) -> &MarkupErrorKind {
        &self.0
    }

    pub fn into_kind(self) -> MarkupErrorKind {
        *self.0
    }
}

impl std::ops::Deref for MarkupError {
    type Target = MarkupErrorKind;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<E> From<E> for MarkupError where MarkupErrorKind: From<E> {
    fn from(err: E) -> Self {
        MarkupError(Box::new(MarkupErrorKind::from(err)))
    }
}

impl fmt::Debug for MarkupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for MarkupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl std::error::Error for MarkupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

pub type Result<T, E = MarkupError> = std::result::Result<T, E>;


/// Problems with configuration values, detected when the
/// configuration is read, never during rendering.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown casing policy {0:?}, expected one of snake, snake_upcase, \
             pascal, camel, lisp, lisp_upcase")]
    UnknownCasing(String),
    #[error("unknown void content policy {0:?}, expected error or ignore")]
    UnknownVoidContent(String),
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_messages_quote_names() {
        let e = MarkupError::from(MarkupErrorKind::DeferredKindConflict {
            name: KString::from_static("x"),
            first: DeferredKind::Cond,
            second: DeferredKind::Var,
        });
        let msg = e.to_string();
        assert!(msg.starts_with("deferred variable \"x\" is used as"), "{msg}");
        let e = MarkupError::from(MarkupErrorKind::UnknownTag { tag: KString::from_ref("blink") });
        assert_eq!(e.to_string(), "unknown tag \"blink\"");
    }
}
