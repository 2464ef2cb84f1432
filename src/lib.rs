//! Build HTML element trees once, render them with fresh assigns many
//! times.
//!
//! Authoring (`builder`, `json`) produces `node::Node` trees. A body is
//! rewritten once when it is defined as a `template::Template` or
//! `template::Component`; rendering (`render`) is then a pure walk over
//! the tree, the assigns and the binding set, producing escaped
//! `value::SafeHtml`.

pub mod myfrom;
pub mod error;
pub mod config;
pub mod casing;
pub mod selector;
pub mod value;
pub mod node;
pub mod args;
pub mod rewrite;
pub mod render;
pub mod template;
pub mod builder;
pub mod json;

pub use error::{MarkupError, MarkupErrorKind, ConfigError};
pub use config::{Config, VoidContent};
pub use casing::Casing;
pub use selector::{Selector, sel};
pub use value::{Assigns, Encode, SafeHtml, Value, html_escape};
pub use node::{Attr, Element, Expr, Node, att, opt_att};
pub use args::{Arg, Block};
pub use rewrite::assign;
pub use render::Bindings;
pub use template::{Component, Registry, Template, CONTENT_KEY};
pub use builder::Builder;
pub use json::JsonReader;
