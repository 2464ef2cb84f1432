//! Indexed tag metadata for void-element handling and tag verification.

use std::{collections::HashMap, path::{Path, PathBuf}, env, fmt, io::BufReader, fs::File,
          str::FromStr};
use anyhow::{anyhow, Result, Context, bail};
use kstring::KString;
use lazy_static::lazy_static;

use crate::types::TagEntry;

// https://html.spec.whatwg.org/multipage/syntax.html#void-elements
const VOID_TAG_NAMES: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link",
    "meta", "param", "source", "track", "wbr",
];

// https://developer.mozilla.org/en-US/docs/Web/HTML/Element, without
// the obsolete ones.
const TAG_NAMES: &[&str] = &[
    "a", "abbr", "address", "article", "aside", "audio", "b", "bdi", "bdo",
    "blockquote", "body", "button", "canvas", "caption", "cite", "code",
    "colgroup", "data", "datalist", "dd", "del", "details", "dfn", "dialog",
    "div", "dl", "dt", "em", "fieldset", "figcaption", "figure", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup",
    "html", "i", "iframe", "ins", "kbd", "label", "legend", "li", "main",
    "map", "mark", "menu", "meter", "nav", "noscript", "object", "ol",
    "optgroup", "option", "output", "p", "picture", "pre", "progress", "q",
    "rp", "rt", "ruby", "s", "samp", "script", "search", "section", "select",
    "slot", "small", "span", "strong", "style", "sub", "summary", "sup",
    "table", "tbody", "td", "template", "textarea", "tfoot", "th", "thead",
    "time", "title", "tr", "u", "ul", "var", "video",
    // SVG and MathML roots are allowed as opaque containers
    "svg", "math",
];

/// Name of the env var pointing to a JSON file with additional or
/// overriding tag entries.
pub const TAG_DB_JSON_ENV: &str = "AMARKUP_TAG_DB_JSON";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMeta {
    pub tag_name: KString,
    pub has_closing_tag: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TagDb {
    pub tagmeta: HashMap<KString, TagMeta>,
}

impl TagDb {
    pub fn get(&self, tag_name: &str) -> Option<&TagMeta> {
        self.tagmeta.get(tag_name)
    }

    pub fn contains(&self, tag_name: &str) -> bool {
        self.tagmeta.contains_key(tag_name)
    }

    /// Unknown tags are never void.
    pub fn is_void(&self, tag_name: &str) -> bool {
        match self.get(tag_name) {
            Some(meta) => !meta.has_closing_tag,
            None => false,
        }
    }

    /// Later entries replace earlier ones with the same tag name.
    pub fn merge(&mut self, entries: impl IntoIterator<Item = TagEntry>) {
        for TagEntry { tag_name, has_closing_tag } in entries {
            self.tagmeta.insert(tag_name.clone(), TagMeta {
                tag_name,
                has_closing_tag,
            });
        }
    }

    pub fn len(&self) -> usize {
        self.tagmeta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tagmeta.is_empty()
    }
}

pub fn builtin_tag_db() -> TagDb {
    let mut db = TagDb::default();
    db.merge(TAG_NAMES.iter().map(|&n| TagEntry {
        tag_name: KString::from_static(n),
        has_closing_tag: true,
    }));
    db.merge(VOID_TAG_NAMES.iter().map(|&n| TagEntry {
        tag_name: KString::from_static(n),
        has_closing_tag: false,
    }));
    db
}

pub fn read_tag_entries_from_json(path: &Path) -> Result<Vec<TagEntry>> {
    (|| -> Result<Vec<TagEntry>> {
        let entries: Vec<TagEntry> = serde_json::from_reader(
            BufReader::new(File::open(path)?))?;
        for entry in &entries {
            if entry.tag_name.is_empty() {
                bail!("empty tag_name in entry {entry:?}")
            }
        }
        Ok(entries)
    })().with_context(|| anyhow!("reading tag entries from {path:?}"))
}

/// `None` if the env var is not set; its contents parsed otherwise.
pub fn opt_get_env<T: FromStr>(varname: &str) -> Result<Option<T>>
    where T::Err: fmt::Display
{
    match env::var(varname) {
        Ok(s) => {
            Ok(Some(s.parse().map_err(
                |e| anyhow!("could not parse {varname:?} env var with contents {s:?}: {e}"))?))
        },
        Err(e) => match e {
            env::VarError::NotPresent => Ok(None),
            env::VarError::NotUnicode(_) => bail!("could not decode {varname:?} env var: {e}")
        }
    }
}

/// The built-in tag db, with the entries from the file named by
/// `AMARKUP_TAG_DB_JSON` merged over it if that env var is set.
pub fn read_tag_db() -> Result<TagDb> {
    let mut db = builtin_tag_db();
    if let Some(path) = opt_get_env::<PathBuf>(TAG_DB_JSON_ENV)? {
        db.merge(read_tag_entries_from_json(&path)?);
    }
    Ok(db)
}

lazy_static!{
    pub static ref TAGDB: TagDb = read_tag_db().unwrap_or_else(|e| {
        tracing::warn!("{e:#}; falling back to the built-in tag db");
        builtin_tag_db()
    });
}
