//! The intermediate representation: elements, their attributes and
//! content, expressions, and the deferred `Var` / `If` nodes.

use kstring::KString;
use strum_macros::Display;

use crate::{myfrom::{MyFrom, ks}, value::{Value, SafeHtml}};

/// Internal containers that carry content and scope but never show up
/// in the output themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Wrapper {
    Fragment,
    Template,
    Component,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Already in display casing.
    Html(KString),
    Wrapper(Wrapper),
}

impl Tag {
    pub fn html_name(&self) -> Option<&str> {
        match self {
            Tag::Html(name) => Some(name.as_str()),
            Tag::Wrapper(_) => None,
        }
    }
}

impl From<Wrapper> for Tag {
    fn from(w: Wrapper) -> Self {
        Tag::Wrapper(w)
    }
}

impl From<&str> for Tag {
    fn from(s: &str) -> Self {
        Tag::Html(ks(s))
    }
}

impl From<KString> for Tag {
    fn from(s: KString) -> Self {
        Tag::Html(s)
    }
}

/// A reference to a value resolved only at render time, against the
/// binding set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Var {
    pub name: KString,
}

impl Var {
    pub fn new<T>(name: T) -> Var
    where KString: MyFrom<T>
    {
        Var { name: ks(name) }
    }
}

/// An assign reference as written by the author, markers included.
/// Replaced by `Expr::Lookup` or `Expr::Var` when a body is rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssignRef {
    pub name: KString,
}

/// A parameter lookup, resolved against the assigns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lookup {
    pub name: KString,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Lit(Value),
    Ref(AssignRef),
    Lookup(Lookup),
    Var(Var),
    Not(Box<Expr>),
    Eq(Box<Expr>, Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    pub fn not(e: impl Into<Expr>) -> Expr {
        Expr::Not(Box::new(e.into()))
    }

    pub fn equals(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
        Expr::Eq(Box::new(a.into()), Box::new(b.into()))
    }

    /// Every `Var` anywhere inside, in order of appearance.
    pub fn vars(&self) -> Vec<&Var> {
        let mut out = Vec::new();
        self.collect_vars(&mut out);
        out
    }

    fn collect_vars<'s>(&'s self, out: &mut Vec<&'s Var>) {
        match self {
            Expr::Var(v) => out.push(v),
            Expr::Lit(_) | Expr::Ref(_) | Expr::Lookup(_) => (),
            Expr::Not(e) => e.collect_vars(out),
            Expr::Eq(a, b) => {
                a.collect_vars(out);
                b.collect_vars(out);
            }
            Expr::And(es) | Expr::Or(es) => {
                for e in es {
                    e.collect_vars(out)
                }
            }
        }
    }

    pub fn has_vars(&self) -> bool {
        !self.vars().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub name: KString,
    pub value: Expr,
}

pub fn att<T>(name: T, value: impl Into<Expr>) -> Attr
where KString: MyFrom<T>
{
    Attr { name: ks(name), value: value.into() }
}

/// For use with `.into_iter().flatten()` or `Builder` arguments
/// collected from optional parts.
pub fn opt_att<T, V: Into<Expr>>(name: T, value: Option<V>) -> Option<Attr>
where KString: MyFrom<T>
{
    value.map(|value| att(name, value))
}

/// An `if` whose test can be decided from the assigns alone.
#[derive(Debug, Clone, PartialEq)]
pub struct Cond {
    pub test: Expr,
    pub do_branch: Vec<Node>,
    pub else_branch: Vec<Node>,
}

/// An `if` whose test depends on at least one `Var`.
#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub test: Expr,
    pub do_branch: Vec<Node>,
    pub else_branch: Vec<Node>,
}

/// A component call site; attrs and content are already normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: KString,
    pub attrs: Vec<Attr>,
    pub content: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Value(Value),
    List(Vec<Node>),
    Expr(Expr),
    Var(Var),
    Cond(Box<Cond>),
    If(Box<If>),
    Call(Box<Call>),
}

impl Node {
    pub fn text<T>(s: T) -> Node
    where KString: MyFrom<T>
    {
        Node::Value(Value::Str(ks(s)))
    }

    pub fn safe(s: SafeHtml) -> Node {
        Node::Value(Value::Safe(s))
    }

    pub fn empty() -> Node {
        Node::List(Vec::new())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }
}

macro_rules! node_from_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Node {
                fn from(v: $t) -> Self {
                    Node::Value(Value::from(v))
                }
            }
            impl From<$t> for Expr {
                fn from(v: $t) -> Self {
                    Expr::Lit(Value::from(v))
                }
            }
        )*
    }
}

node_from_value! { &str, String, KString, SafeHtml, bool, i64, i32, u32, usize, f64, Value }

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

impl From<Vec<Node>> for Node {
    fn from(nodes: Vec<Node>) -> Self {
        Node::List(nodes)
    }
}

impl From<Var> for Node {
    fn from(v: Var) -> Self {
        Node::Var(v)
    }
}

impl From<Expr> for Node {
    fn from(e: Expr) -> Self {
        match e {
            Expr::Var(v) => Node::Var(v),
            e => Node::Expr(e),
        }
    }
}

impl From<Var> for Expr {
    fn from(v: Var) -> Self {
        Expr::Var(v)
    }
}

impl From<AssignRef> for Expr {
    fn from(r: AssignRef) -> Self {
        Expr::Ref(r)
    }
}

impl From<AssignRef> for Node {
    fn from(r: AssignRef) -> Self {
        Node::Expr(Expr::Ref(r))
    }
}

/// Append `node` to `out`, splicing nested lists instead of nesting
/// them.
pub fn push_flat(out: &mut Vec<Node>, node: Node) {
    match node {
        Node::List(nodes) => {
            for n in nodes {
                push_flat(out, n)
            }
        }
        n => out.push(n),
    }
}

pub fn flatten(nodes: impl IntoIterator<Item = Node>) -> Vec<Node> {
    let mut out = Vec::new();
    for n in nodes {
        push_flat(&mut out, n);
    }
    out
}


/// The canonical IR node. Built by consuming and returning `self`, so
/// a value handed out earlier is never changed behind its owner's
/// back.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: Tag,
    pub attrs: Vec<Attr>,
    pub content: Vec<Node>,
    /// Bindings for deferred nodes below; only meaningful on wrappers.
    pub scope: Vec<(KString, Value)>,
}

impl Element {
    pub fn new(tag: impl Into<Tag>) -> Element {
        Element {
            tag: tag.into(),
            attrs: Vec::new(),
            content: Vec::new(),
            scope: Vec::new(),
        }
    }

    pub fn wrapper(kind: Wrapper) -> Element {
        Element::new(kind)
    }

    pub fn is_wrapper(&self) -> bool {
        matches!(self.tag, Tag::Wrapper(_))
    }

    /// Appends; attributes of the same name are kept side by side.
    pub fn merge_attrs(mut self, attrs: impl IntoIterator<Item = Attr>) -> Element {
        self.attrs.extend(attrs);
        self
    }

    pub fn append_content(mut self, nodes: impl IntoIterator<Item = Node>) -> Element {
        for n in nodes {
            push_flat(&mut self.content, n);
        }
        self
    }

    pub fn with_scope(mut self, bindings: impl IntoIterator<Item = (KString, Value)>) -> Element {
        self.scope.extend(bindings);
        self
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_merge_attrs_keeps_duplicates() {
        let e = Element::new("div")
            .merge_attrs([att("class", "a")])
            .merge_attrs([att("class", "b"), att("id", "x")]);
        let names: Vec<&str> = e.attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["class", "class", "id"]);
        assert_eq!(e.attrs[1].value, Expr::from("b"));
    }

    #[test]
    fn t_append_content_flattens() {
        let e = Element::new("ul").append_content([
            Node::from(1),
            Node::List(vec![Node::from(2), Node::List(vec![Node::from(3)])]),
        ]).append_content([Node::from(4)]);
        assert_eq!(e.content, vec![Node::from(1), Node::from(2), Node::from(3), Node::from(4)]);
    }

    #[test]
    fn t_builds_are_independent() {
        let base = Element::new("p").merge_attrs([att("a", 1)]);
        let copy = base.clone();
        let extended = base.append_content([Node::text("x")]);
        assert!(copy.content.is_empty());
        assert_eq!(extended.content.len(), 1);
        assert_eq!(copy.attrs, extended.attrs);
    }

    #[test]
    fn t_vars() {
        let e = Expr::And(vec![
            Expr::from(true),
            Expr::not(Expr::equals(Var::new("a"), Expr::Lookup(Lookup {
                name: ks("x"), required: false
            }))),
            Expr::Or(vec![Expr::from(Var::new("b"))]),
        ]);
        let names: Vec<&str> = e.vars().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert!(!Expr::from(1).has_vars());
    }

    #[test]
    fn t_opt_att() {
        let atts: Vec<Attr> = [opt_att("a", Some(1)), opt_att::<_, i64>("b", None)]
            .into_iter().flatten().collect();
        assert_eq!(atts, vec![att("a", 1)]);
    }
}
