//! Normalizing the (up to) two positional arguments of an element or
//! component call into attributes and content.
//!
//! The shapes are tried in a fixed order, first match wins:
//!
//! 1. block with a sequence, nothing else: `([], seq)`
//! 2. block with a single expression, nothing else: `([], [expr])`
//! 3. selector, nothing else: `(selector attrs, [])`
//! 4. selector, then content: `(selector attrs, content)`
//! 5. non-empty attribute list, nothing else: `(attrs, [])`
//! 6. attribute list, then content: `(attrs, content)`
//! 7. anything else, nothing else: `([], it)`
//! 8. content, then attribute list: `(attrs, content)`
//!
//! Everything else is an `ArgumentShape` error. Selectors are checked
//! before attribute lists.

use kstring::KString;

use crate::{error::{MarkupErrorKind, Result},
            node::{AssignRef, Attr, Expr, Node, Element},
            selector::Selector,
            value::{Value, SafeHtml}};

/// The body of a block: either a sequence or a single expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Many(Vec<Node>),
    One(Node),
}

impl Block {
    pub fn one(node: impl Into<Node>) -> Block {
        Block::One(node.into())
    }

    fn into_nodes(self) -> Vec<Node> {
        match self {
            Block::Many(nodes) => nodes,
            Block::One(node) => vec![node],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Absent,
    Block(Block),
    Selector(Selector),
    Attrs(Vec<Attr>),
    /// A single raw value or node.
    Value(Node),
}

impl Arg {
    pub fn is_absent(&self) -> bool {
        matches!(self, Arg::Absent)
    }

    /// Whether this can stand in content position when it isn't the
    /// only argument.
    fn is_content(&self) -> bool {
        matches!(self, Arg::Block(_) | Arg::Value(_))
    }

    /// Unwraps a block or a value as content; `Absent` is no content.
    /// Anything else is returned back.
    pub fn into_content(self) -> Result<Vec<Node>, Arg> {
        match self {
            Arg::Absent => Ok(Vec::new()),
            Arg::Block(block) => Ok(block.into_nodes()),
            Arg::Value(node) => Ok(vec![node]),
            arg => Err(arg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Normalized {
    pub attrs: Vec<Attr>,
    pub content: Vec<Node>,
}

impl Normalized {
    /// Add to an element; nothing already there is replaced.
    pub fn apply_to(self, element: Element) -> Element {
        element.merge_attrs(self.attrs).append_content(self.content)
    }
}

fn selector_attrs(selector: &Selector) -> Vec<Attr> {
    selector.parse().attrs.into_iter().map(|(name, value)| Attr {
        name,
        value: Expr::Lit(Value::Str(value)),
    }).collect()
}

fn shape_error(a: &Arg, b: &Arg) -> MarkupErrorKind {
    MarkupErrorKind::ArgumentShape {
        a: format!("{a:?}"),
        b: format!("{b:?}"),
    }
}

// Callers check `is_content` first.
fn content(arg: Arg) -> Vec<Node> {
    match arg {
        Arg::Block(block) => block.into_nodes(),
        Arg::Value(node) => vec![node],
        _ => vec![],
    }
}

/// A single argument that must be content, e.g. a conditional branch.
pub fn content_arg(arg: Arg) -> Result<Vec<Node>> {
    arg.into_content().map_err(|arg| shape_error(&arg, &Arg::Absent).into())
}

pub fn normalize(a: Arg, b: Arg) -> Result<Normalized> {
    Ok(match (a, b) {
        (Arg::Block(Block::Many(nodes)), Arg::Absent) =>
            Normalized { attrs: vec![], content: nodes },
        (Arg::Block(Block::One(node)), Arg::Absent) =>
            Normalized { attrs: vec![], content: vec![node] },
        (Arg::Selector(selector), Arg::Absent) =>
            Normalized { attrs: selector_attrs(&selector), content: vec![] },
        (Arg::Selector(selector), b) if b.is_content() =>
            Normalized { attrs: selector_attrs(&selector), content: content(b) },
        (Arg::Attrs(attrs), Arg::Absent) if !attrs.is_empty() =>
            Normalized { attrs, content: vec![] },
        // An empty attribute list is still an attribute list when
        // content follows.
        (Arg::Attrs(attrs), b) if b.is_content() =>
            Normalized { attrs, content: content(b) },
        (a @ (Arg::Absent | Arg::Attrs(_) | Arg::Value(_)), Arg::Absent) => {
            // Only the empty attribute list can get here from Attrs.
            let content = match a {
                Arg::Value(node) => vec![node],
                _ => vec![],
            };
            Normalized { attrs: vec![], content }
        }
        (a, Arg::Attrs(attrs)) if a.is_content() =>
            Normalized { attrs, content: content(a) },
        (a, b) => Err(shape_error(&a, &b))?,
    })
}


// Conversions for call sites: `()` is a missing argument, arrays and
// vectors of nodes are blocks, of attributes attribute lists; anything
// that converts to a `Node` is a single value.

impl From<()> for Arg {
    fn from(_: ()) -> Self {
        Arg::Absent
    }
}

impl From<Block> for Arg {
    fn from(b: Block) -> Self {
        Arg::Block(b)
    }
}

impl From<Selector> for Arg {
    fn from(s: Selector) -> Self {
        Arg::Selector(s)
    }
}

impl From<Vec<Attr>> for Arg {
    fn from(attrs: Vec<Attr>) -> Self {
        Arg::Attrs(attrs)
    }
}

impl<const N: usize> From<[Attr; N]> for Arg {
    fn from(attrs: [Attr; N]) -> Self {
        Arg::Attrs(attrs.into())
    }
}

impl<const N: usize> From<[Option<Attr>; N]> for Arg {
    fn from(attrs: [Option<Attr>; N]) -> Self {
        Arg::Attrs(attrs.into_iter().flatten().collect())
    }
}

impl From<Vec<Node>> for Arg {
    fn from(nodes: Vec<Node>) -> Self {
        Arg::Block(Block::Many(nodes))
    }
}

impl<const N: usize> From<[Node; N]> for Arg {
    fn from(nodes: [Node; N]) -> Self {
        Arg::Block(Block::Many(nodes.into()))
    }
}

macro_rules! arg_from_node {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Arg {
                fn from(v: $t) -> Self {
                    Arg::Value(Node::from(v))
                }
            }
        )*
    }
}

arg_from_node! { Node, Element, Expr, AssignRef, &str, String, KString, SafeHtml, bool, i64, i32,
                 u32, usize, f64, Value }
