//! Serialized form of tag metadata, as read from JSON override files.

use kstring::KString;
use serde::{Deserialize, Serialize};

/// One entry of a tag metadata file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagEntry {
    pub tag_name: KString,
    /// False for void elements, which are printed self-closing.
    #[serde(default = "default_has_closing_tag")]
    pub has_closing_tag: bool,
}

fn default_has_closing_tag() -> bool {
    true
}
