//! The registry of concrete HTML tag names used by amarkup.

pub mod types;
pub mod meta;

pub use meta::{TagDb, TagMeta, TAGDB, builtin_tag_db, opt_get_env, read_tag_db};
