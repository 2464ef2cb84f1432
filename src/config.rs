//! Engine configuration: defaults, a JSON file, and env var
//! overrides (in increasing priority).

use std::{path::Path, fs::File, io::BufReader, str::FromStr};

use amarkup_html::opt_get_env;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use strum_macros::{Display, EnumString};

use crate::{casing::Casing, error::ConfigError};

/// What to do with content given to a void element like `<input>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default,
         Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VoidContent {
    #[default]
    Error,
    /// Drop the content (with a log message).
    Ignore,
}

impl VoidContent {
    pub fn from_name(name: &str) -> Result<VoidContent, ConfigError> {
        VoidContent::from_str(name).map_err(|_| ConfigError::UnknownVoidContent(name.into()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// How canonical tag identifiers are shown in the output.
    pub casing: Casing,
    pub void_content: VoidContent,
    /// Reject tags unknown to the tag db at build time.
    pub verify_tags: bool,
    /// Turn `name$` references into deferred `Var`s.
    pub deferred: bool,
    /// Prefix an outermost `<html>` with the doctype.
    pub doctype: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            casing: Casing::Snake,
            void_content: VoidContent::Error,
            verify_tags: false,
            deferred: true,
            doctype: true,
        }
    }
}

pub const ENV_CASING: &str = "AMARKUP_CASING";
pub const ENV_VOID_CONTENT: &str = "AMARKUP_VOID_CONTENT";
pub const ENV_VERIFY_TAGS: &str = "AMARKUP_VERIFY_TAGS";
pub const ENV_DEFERRED: &str = "AMARKUP_DEFERRED";

impl Config {
    pub fn from_json_str(s: &str) -> Result<Config> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Config> {
        (|| -> Result<Config> {
            Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
        })().with_context(|| anyhow!("reading config from {path:?}"))
    }

    /// Defaults plus env overrides.
    pub fn from_env() -> Result<Config> {
        Config::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Result<Config> {
        if let Some(s) = opt_get_env::<String>(ENV_CASING)? {
            self.casing = Casing::from_name(&s)?;
        }
        if let Some(s) = opt_get_env::<String>(ENV_VOID_CONTENT)? {
            self.void_content = VoidContent::from_name(&s)?;
        }
        if let Some(b) = opt_get_env::<bool>(ENV_VERIFY_TAGS)? {
            self.verify_tags = b;
        }
        if let Some(b) = opt_get_env::<bool>(ENV_DEFERRED)? {
            self.deferred = b;
        }
        Ok(self)
    }
}
