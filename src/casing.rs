//! Turning canonical `snake_case` tag identifiers into their display
//! form.

use std::str::FromStr;

use itertools::Itertools;
use kstring::KString;
use serde::Deserialize;
use strum_macros::{Display, EnumString};

use crate::error::ConfigError;

pub const WORD_SEPARATOR: char = '_';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default,
         Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Casing {
    /// `foo_bar`
    #[default]
    Snake,
    /// `FOO_BAR`
    SnakeUpcase,
    /// `FooBar`
    Pascal,
    /// `fooBar`
    Camel,
    /// `foo-bar`
    Lisp,
    /// `FOO-BAR`
    LispUpcase,
}

fn capitalize(word: &str) -> String {
    let mut cs = word.chars();
    match cs.next() {
        Some(c) => c.to_uppercase().chain(cs).collect(),
        None => String::new(),
    }
}

impl Casing {
    pub const ALL: [Casing; 6] = [
        Casing::Snake, Casing::SnakeUpcase, Casing::Pascal,
        Casing::Camel, Casing::Lisp, Casing::LispUpcase,
    ];

    /// Parse a policy name as used in configuration.
    pub fn from_name(name: &str) -> Result<Casing, ConfigError> {
        Casing::from_str(name).map_err(|_| ConfigError::UnknownCasing(name.into()))
    }

    pub fn apply(self, ident: &str) -> KString {
        let words = || ident.split(WORD_SEPARATOR);
        let s = match self {
            Casing::Snake => return KString::from_ref(ident),
            Casing::SnakeUpcase => ident.to_uppercase(),
            Casing::Pascal => words().map(capitalize).collect(),
            Casing::Camel => {
                let mut ws = words();
                let first = ws.next().unwrap_or("").to_lowercase();
                std::iter::once(first).chain(ws.map(capitalize)).collect()
            }
            Casing::Lisp => words().join("-"),
            Casing::LispUpcase => words().map(str::to_uppercase).join("-"),
        };
        KString::from_string(s)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_apply() {
        let id = "my_fancy_widget";
        assert_eq!(Casing::Snake.apply(id).as_str(), "my_fancy_widget");
        assert_eq!(Casing::SnakeUpcase.apply(id).as_str(), "MY_FANCY_WIDGET");
        assert_eq!(Casing::Pascal.apply(id).as_str(), "MyFancyWidget");
        assert_eq!(Casing::Camel.apply(id).as_str(), "myFancyWidget");
        assert_eq!(Casing::Lisp.apply(id).as_str(), "my-fancy-widget");
        assert_eq!(Casing::LispUpcase.apply(id).as_str(), "MY-FANCY-WIDGET");
    }

    #[test]
    fn t_single_word() {
        for casing in Casing::ALL {
            let out = casing.apply("div");
            assert_eq!(out.to_lowercase(), "div", "{casing}");
        }
        assert_eq!(Casing::Pascal.apply("div").as_str(), "Div");
        assert_eq!(Casing::Camel.apply("div").as_str(), "div");
        assert_eq!(Casing::Lisp.apply("div").as_str(), "div");
    }

    #[test]
    fn t_lisp_roundtrip() {
        for id in ["a", "a_b", "one_two_three"] {
            let lisp = Casing::Lisp.apply(id);
            assert_eq!(lisp.split('-').join("-"), lisp.as_str());
            assert_eq!(lisp.replace('-', "_"), id);
        }
    }

    #[test]
    fn t_names() {
        assert_eq!(Casing::from_name("lisp_upcase").unwrap(), Casing::LispUpcase);
        assert_eq!(Casing::from_name("pascal").unwrap(), Casing::Pascal);
        assert_eq!(Casing::SnakeUpcase.to_string(), "snake_upcase");
        assert!(matches!(Casing::from_name("kebab"),
                         Err(ConfigError::UnknownCasing(s)) if s == "kebab"));
        for casing in Casing::ALL {
            assert_eq!(Casing::from_name(&casing.to_string()).unwrap(), casing);
        }
    }
}
