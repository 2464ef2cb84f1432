//! Values flowing through assigns and bindings, and how they are
//! encoded into HTML.

use std::{borrow::Cow, collections::HashMap, fmt::{self, Display}, sync::Arc};

use itertools::Itertools;
use kstring::KString;

use crate::{myfrom::{MyFrom, ks}, node::Node};

/// Serialized HTML that must not be escaped again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SafeHtml(KString);

impl SafeHtml {
    /// The caller vouches for `s` being well-formed, trusted HTML.
    pub fn from_trusted<T>(s: T) -> SafeHtml
    where KString: MyFrom<T>
    {
        SafeHtml(ks(s))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn into_kstring(self) -> KString {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for SafeHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two ways something can end up in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoded<'t> {
    /// Text, to be escaped.
    Raw(Cow<'t, str>),
    /// Emitted verbatim.
    Safe(Cow<'t, str>),
    Empty,
}

/// Anything that can be put into HTML content or attribute values.
pub trait Encode {
    fn encode(&self) -> Encoded<'_>;
}

impl Encode for str {
    fn encode(&self) -> Encoded<'_> {
        Encoded::Raw(Cow::Borrowed(self))
    }
}

impl Encode for String {
    fn encode(&self) -> Encoded<'_> {
        Encoded::Raw(Cow::Borrowed(self.as_str()))
    }
}

impl Encode for KString {
    fn encode(&self) -> Encoded<'_> {
        Encoded::Raw(Cow::Borrowed(self.as_str()))
    }
}

impl Encode for SafeHtml {
    fn encode(&self) -> Encoded<'_> {
        Encoded::Safe(Cow::Borrowed(self.as_str()))
    }
}

impl Encode for bool {
    fn encode(&self) -> Encoded<'_> {
        Encoded::Raw(Cow::Borrowed(if *self { "true" } else { "false" }))
    }
}

impl Encode for i64 {
    fn encode(&self) -> Encoded<'_> {
        Encoded::Raw(Cow::Owned(self.to_string()))
    }
}

impl Encode for f64 {
    fn encode(&self) -> Encoded<'_> {
        Encoded::Raw(Cow::Owned(self.to_string()))
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self) -> Encoded<'_> {
        (**self).encode()
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self) -> Encoded<'_> {
        match self {
            Some(v) => v.encode(),
            None => Encoded::Empty,
        }
    }
}

/// Append `s` to `out`, replacing the characters significant in HTML
/// text and quoted attribute values.
pub fn html_escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c)
        }
    }
}

pub fn html_escape(s: &str) -> Cow<'_, str> {
    if s.contains(|c| matches!(c, '&' | '<' | '>' | '"' | '\'')) {
        let mut out = String::with_capacity(s.len() + 16);
        html_escape_into(&mut out, s);
        Cow::Owned(out)
    } else {
        Cow::Borrowed(s)
    }
}

impl<'t> Encoded<'t> {
    pub fn write_to(&self, out: &mut String) {
        match self {
            Encoded::Raw(s) => html_escape_into(out, s),
            Encoded::Safe(s) => out.push_str(s),
            Encoded::Empty => (),
        }
    }
}


/// A parameter or binding value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(KString),
    Safe(SafeHtml),
    List(Vec<Value>),
    /// Markup passed around as a value, e.g. the content given to a
    /// component call.
    Nodes(Arc<Vec<Node>>),
}

impl Value {
    /// Only null and false are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn nodes(nodes: Vec<Node>) -> Value {
        Value::Nodes(Arc::new(nodes))
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl Encode for Value {
    /// Lists are encoded space-separated (which is what attribute
    /// values like `class` want); `Nodes` need the renderer and encode
    /// as empty here.
    fn encode(&self) -> Encoded<'_> {
        match self {
            Value::Null => Encoded::Empty,
            Value::Bool(b) => b.encode(),
            Value::Int(i) => i.encode(),
            Value::Float(x) => x.encode(),
            Value::Str(s) => s.encode(),
            Value::Safe(s) => s.encode(),
            Value::List(vs) => {
                let mut all_safe = true;
                let parts: Vec<Cow<str>> = vs.iter().filter_map(|v| match v.encode() {
                    Encoded::Raw(s) => {
                        all_safe = false;
                        Some(s)
                    }
                    Encoded::Safe(s) => Some(s),
                    Encoded::Empty => None,
                }).collect();
                let joined = parts.iter().join(" ");
                if all_safe {
                    Encoded::Safe(Cow::Owned(joined))
                } else {
                    // Safe items get escaped too, mixing can't be
                    // represented in one Encoded.
                    Encoded::Raw(Cow::Owned(joined))
                }
            }
            Value::Nodes(_) => Encoded::Empty,
        }
    }
}

macro_rules! value_from {
    ($($t:ty => |$v:ident| $e:expr;)*) => {
        $(
            impl From<$t> for Value {
                fn from($v: $t) -> Self {
                    $e
                }
            }
        )*
    }
}

value_from! {
    &str => |s| Value::Str(ks(s));
    String => |s| Value::Str(ks(s));
    KString => |s| Value::Str(s);
    &KString => |s| Value::Str(s.clone());
    SafeHtml => |s| Value::Safe(s);
    bool => |b| Value::Bool(b);
    i64 => |i| Value::Int(i);
    i32 => |i| Value::Int(i64::from(i));
    u32 => |i| Value::Int(i64::from(i));
    usize => |i| Value::Int(i as i64);
    f64 => |x| Value::Float(x);
    Vec<Value> => |vs| Value::List(vs);
    Vec<Node> => |nodes| Value::nodes(nodes);
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}


/// The parameters given to a template or component invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assigns(HashMap<KString, Value>);

impl Assigns {
    pub fn new() -> Assigns {
        Assigns(HashMap::new())
    }

    pub fn insert<K>(&mut self, name: K, value: impl Into<Value>) -> Option<Value>
    where KString: MyFrom<K>
    {
        self.0.insert(ks(name), value.into())
    }

    /// Builder-style `insert`.
    pub fn with<K>(mut self, name: K, value: impl Into<Value>) -> Assigns
    where KString: MyFrom<K>
    {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Sorted, for error messages.
    pub fn names(&self) -> Vec<KString> {
        self.0.keys().cloned().sorted().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(KString, Value)> for Assigns {
    fn from_iter<I: IntoIterator<Item = (KString, Value)>>(iter: I) -> Self {
        Assigns(iter.into_iter().collect())
    }
}
