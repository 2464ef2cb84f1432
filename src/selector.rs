//! Compact `tag#id.class` selector literals.

use kstring::KString;
use lazy_static::lazy_static;
use regex::Regex;

use crate::{error::{MarkupErrorKind, Result},
            myfrom::{MyFrom, ks}};

pub const DEFAULT_TAG: &str = "div";

lazy_static!{
    static ref SELECTOR_TOKEN: Regex = Regex::new(r"[.#]?[A-Za-z0-9_:-]+")
        .expect("valid regex literal");
    static ref NAME: Regex = Regex::new(r"^[A-Za-z0-9_:-]+$")
        .expect("valid regex literal");
}

/// Attribute names are written into the output as they are, so they
/// are restricted to the characters a selector token may have.
pub fn check_attr_name(name: &str) -> Result<()> {
    if NAME.is_match(name) {
        Ok(())
    } else {
        Err(MarkupErrorKind::InvalidAttributeName { name: KString::from_ref(name) })?
    }
}

/// A selector literal as given by the author, parsed on use. A distinct
/// type so that argument normalization can tell it apart from text
/// content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector(KString);

pub fn sel<T>(s: T) -> Selector
where KString: MyFrom<T>
{
    Selector(ks(s))
}

impl Selector {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn parse(&self) -> ParsedSelector {
        parse_selector(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSelector {
    pub tag: KString,
    /// `("class", ..)` and `("id", ..)` pairs, in order of appearance.
    pub attrs: Vec<(KString, KString)>,
}

pub fn parse_selector(s: &str) -> ParsedSelector {
    let mut tag = None;
    let mut attrs = Vec::new();
    for (i, m) in SELECTOR_TOKEN.find_iter(s).enumerate() {
        let token = m.as_str();
        if let Some(class) = token.strip_prefix('.') {
            attrs.push((KString::from_static("class"), KString::from_ref(class)));
        } else if let Some(id) = token.strip_prefix('#') {
            attrs.push((KString::from_static("id"), KString::from_ref(id)));
        } else if i == 0 {
            tag = Some(KString::from_ref(token));
        }
        // XX a bare word after the first token is dropped silently
    }
    ParsedSelector {
        tag: tag.unwrap_or_else(|| KString::from_static(DEFAULT_TAG)),
        attrs,
    }
}

/// The inverse of `parse_selector` for attribute lists consisting of
/// `class` and `id` entries only; other attributes are skipped.
pub fn format_selector(tag: &str, attrs: &[(KString, KString)]) -> String {
    let mut s = String::from(tag);
    for (name, value) in attrs {
        match name.as_str() {
            "class" => s.push('.'),
            "id" => s.push('#'),
            _ => continue,
        }
        s.push_str(value);
    }
    s
}
