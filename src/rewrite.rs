//! The definition-time pass over a template or component body.
//!
//! Assign references (`Expr::Ref`) are replaced by parameter lookups or,
//! in deferred mode, by `Var`s. Conditionals whose test ends up
//! containing a `Var` are promoted from `Cond` to `If`, all others are
//! left for eager evaluation. Substitution happens before descending
//! into a node's children, promotion after.

use std::collections::HashMap;

use kstring::KString;
use strum_macros::Display;

use crate::{error::{MarkupErrorKind, Result}, myfrom::{MyFrom, ks},
            node::{AssignRef, Attr, Call, Cond, Element, Expr, If, Lookup, Node, Var}};

/// Suffix making a reference required even where optional references
/// are allowed.
pub const REQUIRED_MARKER: char = '!';
/// Suffix turning a reference into a deferred `Var`.
pub const DEFERRED_MARKER: char = '$';

/// How a deferred variable is used within one body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DeferredKind {
    /// Substituted into content or an attribute value.
    Var,
    /// Drives a conditional.
    Cond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteOptions {
    /// References without the required marker yield null when absent.
    pub allow_optional: bool,
    pub deferred: bool,
}

/// What an assign reference stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Lookup(Lookup),
    Var(Var),
}

impl RewriteOptions {
    pub fn resolve(&self, r: &AssignRef) -> Resolved {
        let name = r.name.as_str();
        if self.deferred {
            if let Some(base) = name.strip_suffix(DEFERRED_MARKER) {
                return Resolved::Var(Var::new(base))
            }
        }
        if let Some(base) = name.strip_suffix(REQUIRED_MARKER) {
            Resolved::Lookup(Lookup { name: KString::from_ref(base), required: true })
        } else {
            Resolved::Lookup(Lookup { name: r.name.clone(), required: !self.allow_optional })
        }
    }
}

/// An authoring reference to an assign, to be rewritten.
pub fn assign<T>(name: T) -> AssignRef
where KString: MyFrom<T>
{
    AssignRef { name: ks(name) }
}

pub struct Rewriter {
    options: RewriteOptions,
    kinds: HashMap<KString, DeferredKind>,
}

impl Rewriter {
    pub fn new(options: RewriteOptions) -> Rewriter {
        Rewriter { options, kinds: HashMap::new() }
    }

    /// The kind registered so far for each deferred variable name.
    pub fn kinds(&self) -> &HashMap<KString, DeferredKind> {
        &self.kinds
    }

    fn register(&mut self, var: &Var, kind: DeferredKind) -> Result<()> {
        match self.kinds.get(&var.name) {
            Some(&first) if first != kind =>
                Err(MarkupErrorKind::DeferredKindConflict {
                    name: var.name.clone(),
                    first,
                    second: kind,
                })?,
            Some(_) => (),
            None => {
                self.kinds.insert(var.name.clone(), kind);
            }
        }
        Ok(())
    }

    fn register_all(&mut self, expr: &Expr, kind: DeferredKind) -> Result<()> {
        for var in expr.vars() {
            self.register(var, kind)?;
        }
        Ok(())
    }

    /// Replace every assign reference in `expr`.
    pub fn substitute(&self, expr: Expr) -> Expr {
        match expr {
            Expr::Ref(r) => match self.options.resolve(&r) {
                Resolved::Lookup(l) => Expr::Lookup(l),
                Resolved::Var(v) => Expr::Var(v),
            },
            Expr::Not(e) => Expr::Not(Box::new(self.substitute(*e))),
            Expr::Eq(a, b) => Expr::Eq(Box::new(self.substitute(*a)),
                                       Box::new(self.substitute(*b))),
            Expr::And(es) => Expr::And(es.into_iter().map(|e| self.substitute(e)).collect()),
            Expr::Or(es) => Expr::Or(es.into_iter().map(|e| self.substitute(e)).collect()),
            e @ (Expr::Lit(_) | Expr::Lookup(_) | Expr::Var(_)) => e,
        }
    }

    /// Substitute in value position; any `Var` is a plain substitution.
    fn value_expr(&mut self, expr: Expr) -> Result<Expr> {
        let expr = self.substitute(expr);
        self.register_all(&expr, DeferredKind::Var)?;
        Ok(expr)
    }

    fn attrs(&mut self, attrs: Vec<Attr>) -> Result<Vec<Attr>> {
        attrs.into_iter().map(|Attr { name, value }| -> Result<Attr> {
            Ok(Attr { name, value: self.value_expr(value)? })
        }).collect()
    }

    pub fn nodes(&mut self, nodes: Vec<Node>) -> Result<Vec<Node>> {
        nodes.into_iter().map(|n| self.node(n)).collect()
    }

    fn conditional(&mut self, test: Expr, do_branch: Vec<Node>, else_branch: Vec<Node>)
                   -> Result<Node>
    {
        let test = self.substitute(test);
        let deferred = test.has_vars();
        if deferred {
            self.register_all(&test, DeferredKind::Cond)?;
        }
        let do_branch = self.nodes(do_branch)?;
        let else_branch = self.nodes(else_branch)?;
        if deferred {
            tracing::debug!(?test, "promoting conditional to deferred If");
            Ok(Node::If(Box::new(If { test, do_branch, else_branch })))
        } else {
            Ok(Node::Cond(Box::new(Cond { test, do_branch, else_branch })))
        }
    }

    pub fn node(&mut self, node: Node) -> Result<Node> {
        Ok(match node {
            Node::Expr(e) => match self.value_expr(e)? {
                Expr::Var(v) => Node::Var(v),
                e => Node::Expr(e),
            },
            Node::Var(v) => {
                self.register(&v, DeferredKind::Var)?;
                Node::Var(v)
            }
            Node::Element(Element { tag, attrs, content, scope }) => Node::Element(Element {
                tag,
                attrs: self.attrs(attrs)?,
                content: self.nodes(content)?,
                scope,
            }),
            Node::List(nodes) => Node::List(self.nodes(nodes)?),
            Node::Cond(c) => {
                let Cond { test, do_branch, else_branch } = *c;
                self.conditional(test, do_branch, else_branch)?
            }
            Node::If(i) => {
                let If { test, do_branch, else_branch } = *i;
                self.conditional(test, do_branch, else_branch)?
            }
            Node::Call(c) => {
                let Call { name, attrs, content } = *c;
                Node::Call(Box::new(Call {
                    name,
                    attrs: self.attrs(attrs)?,
                    content: self.nodes(content)?,
                }))
            }
            n @ Node::Value(_) => n,
        })
    }
}

/// Rewrite a whole body with a fresh name registry.
pub fn rewrite_body(body: Vec<Node>, options: RewriteOptions) -> Result<Vec<Node>> {
    Rewriter::new(options).nodes(body)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{node::att, value::Value};

    const COMPONENT: RewriteOptions = RewriteOptions { allow_optional: true, deferred: true };
    const TEMPLATE: RewriteOptions = RewriteOptions { allow_optional: false, deferred: true };

    fn lookup(name: &str, required: bool) -> Expr {
        Expr::Lookup(Lookup { name: KString::from_ref(name), required })
    }

    fn cond(test: impl Into<Expr>, do_branch: Vec<Node>) -> Node {
        Node::Cond(Box::new(Cond { test: test.into(), do_branch, else_branch: vec![] }))
    }

    #[test]
    fn t_resolve() {
        assert_eq!(COMPONENT.resolve(&assign("a")),
                   Resolved::Lookup(Lookup { name: KString::from_static("a"), required: false }));
        assert_eq!(COMPONENT.resolve(&assign("a!")),
                   Resolved::Lookup(Lookup { name: KString::from_static("a"), required: true }));
        assert_eq!(TEMPLATE.resolve(&assign("a")),
                   Resolved::Lookup(Lookup { name: KString::from_static("a"), required: true }));
        assert_eq!(COMPONENT.resolve(&assign("a$")), Resolved::Var(Var::new("a")));
        let eager = RewriteOptions { allow_optional: true, deferred: false };
        assert_eq!(eager.resolve(&assign("a$")),
                   Resolved::Lookup(Lookup { name: KString::from_static("a$"), required: false }));
    }

    #[test]
    fn t_substitutes_everywhere() {
        let body = vec![Node::Element(
            Element::new("div")
                .merge_attrs([att("class", assign("cls"))])
                .append_content([
                    Node::from(assign("x!")),
                    Node::Element(Element::new("span").append_content([Node::from(assign("y"))])),
                ]))];
        let out = rewrite_body(body, COMPONENT).unwrap();
        let div = out[0].as_element().unwrap();
        assert_eq!(div.attrs[0].value, lookup("cls", false));
        assert_eq!(div.content[0], Node::Expr(lookup("x", true)));
        let span = div.content[1].as_element().unwrap();
        assert_eq!(span.content[0], Node::Expr(lookup("y", false)));
    }

    #[test]
    fn t_deferred_var() {
        let out = rewrite_body(vec![Node::from(assign("v$"))], COMPONENT).unwrap();
        assert_eq!(out, vec![Node::Var(Var::new("v"))]);
    }

    #[test]
    fn t_promotion() {
        let body = vec![
            cond(assign("flag"), vec![Node::text("eager")]),
            cond(Expr::And(vec![Expr::from(true), Expr::not(assign("open$"))]),
                 vec![Node::text("deferred")]),
        ];
        let mut rw = Rewriter::new(COMPONENT);
        let out = rw.nodes(body).unwrap();
        match &out[0] {
            Node::Cond(c) => assert_eq!(c.test, lookup("flag", false)),
            n => panic!("expected eager Cond, got {n:?}"),
        }
        match &out[1] {
            Node::If(i) => {
                assert_eq!(i.test.vars(), vec![&Var::new("open")]);
                assert_eq!(i.do_branch, vec![Node::text("deferred")]);
            }
            n => panic!("expected If, got {n:?}"),
        }
        assert_eq!(rw.kinds().get("open"), Some(&DeferredKind::Cond));
    }

    #[test]
    fn t_nested_conditionals() {
        // The inner one is promoted, the outer one stays eager.
        let body = vec![cond(assign("a"), vec![cond(assign("b$"), vec![Node::from(1)])])];
        let out = rewrite_body(body, COMPONENT).unwrap();
        match &out[0] {
            Node::Cond(c) => assert!(matches!(c.do_branch[0], Node::If(_))),
            n => panic!("{n:?}"),
        }
    }

    #[test]
    fn t_conflict() {
        let body = vec![
            Node::from(assign("x$")),
            cond(assign("x$"), vec![Node::text("shown")]),
        ];
        let err = rewrite_body(body, COMPONENT).unwrap_err();
        match err.kind() {
            MarkupErrorKind::DeferredKindConflict { name, first, second } => {
                assert_eq!(name.as_str(), "x");
                assert_eq!(*first, DeferredKind::Var);
                assert_eq!(*second, DeferredKind::Cond);
            }
            e => panic!("unexpected {e}"),
        }
        assert!(err.to_string().contains("\"x\""));

        // Same in the other order, and via an attribute.
        let body = vec![
            cond(assign("x$"), vec![]),
            Node::Element(Element::new("p").merge_attrs([att("title", assign("x$"))])),
        ];
        assert!(matches!(rewrite_body(body, COMPONENT).unwrap_err().kind(),
                         MarkupErrorKind::DeferredKindConflict { .. }));

        // The test is seen before the branches.
        let body = vec![cond(assign("x$"), vec![Node::from(assign("x$"))])];
        match rewrite_body(body, COMPONENT).unwrap_err().kind() {
            MarkupErrorKind::DeferredKindConflict { first, second, .. } => {
                assert_eq!(*first, DeferredKind::Cond);
                assert_eq!(*second, DeferredKind::Var);
            }
            e => panic!("unexpected {e}"),
        }
    }

    #[test]
    fn t_same_kind_reuse() {
        let body = vec![
            Node::from(assign("x$")),
            Node::from(assign("x$")),
            cond(assign("y$"), vec![]),
            cond(Expr::equals(assign("y$"), Value::from(1)), vec![]),
        ];
        assert!(rewrite_body(body, COMPONENT).is_ok());
    }

    #[test]
    fn t_registry_is_per_body() {
        assert!(rewrite_body(vec![Node::from(assign("x$"))], COMPONENT).is_ok());
        assert!(rewrite_body(vec![cond(assign("x$"), vec![])], COMPONENT).is_ok());
    }
}
