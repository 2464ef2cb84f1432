//! Walking a finished tree into HTML.
//!
//! `render` does everything in one pass. `invoke` only does the eager
//! half (parameter lookups, eager conditionals, component calls whose
//! arguments are known) and leaves the deferred `Var` and `If` nodes
//! in place, to be rendered later against a binding set.

use amarkup_html::{TagDb, TAGDB};
use kstring::KString;

use crate::{config::{Config, VoidContent},
            error::{MarkupErrorKind, Result},
            node::{Attr, Call, Cond, Element, Expr, If, Lookup, Node, Tag, Var, Wrapper},
            rewrite::{Resolved, RewriteOptions},
            selector::check_attr_name,
            template::{Registry, call_assigns},
            value::{Assigns, Value, SafeHtml, Encode, html_escape_into}};

pub const DOCTYPE: &str = "<!doctype html>\n";

// How references are resolved in trees that never went through the
// rewriter.
const UNREWRITTEN: RewriteOptions = RewriteOptions { allow_optional: true, deferred: true };

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub void_content: VoidContent,
    pub doctype: bool,
    pub tagdb: &'static TagDb,
}

impl RenderOptions {
    pub fn new(config: &Config) -> RenderOptions {
        RenderOptions::with_tagdb(config, &TAGDB)
    }

    pub fn with_tagdb(config: &Config, tagdb: &'static TagDb) -> RenderOptions {
        RenderOptions {
            void_content: config.void_content,
            doctype: config.doctype,
            tagdb,
        }
    }

    pub fn is_void(&self, tag: &str) -> bool {
        if tag.bytes().any(|b| b.is_ascii_uppercase()) {
            self.tagdb.is_void(&tag.to_ascii_lowercase())
        } else {
            self.tagdb.is_void(tag)
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions::new(&Config::default())
    }
}

/// Values for deferred nodes: a chain of scopes, innermost first.
#[derive(Debug, Clone, Copy)]
pub struct Bindings<'b> {
    vars: &'b [(KString, Value)],
    parent: Option<&'b Bindings<'b>>,
}

impl<'b> Bindings<'b> {
    pub fn empty() -> Bindings<'static> {
        Bindings { vars: &[], parent: None }
    }

    pub fn new(vars: &'b [(KString, Value)]) -> Bindings<'b> {
        Bindings { vars, parent: None }
    }

    /// A scope nested inside this one; its bindings shadow ours.
    pub fn push<'c>(&'c self, vars: &'c [(KString, Value)]) -> Bindings<'c> {
        Bindings { vars, parent: Some(self) }
    }

    pub fn get(&self, name: &str) -> Option<&'b Value> {
        // Later entries in the same scope shadow earlier ones.
        if let Some((_, v)) = self.vars.iter().rev().find(|(n, _)| n.as_str() == name) {
            return Some(v)
        }
        self.parent.and_then(|p| p.get(name))
    }
}

/// Everything a render needs besides the tree and the bindings.
#[derive(Debug, Clone, Copy)]
pub struct Env<'e> {
    pub assigns: &'e Assigns,
    pub registry: Option<&'e Registry>,
    pub options: &'e RenderOptions,
}

impl<'e> Env<'e> {
    pub fn new(assigns: &'e Assigns, registry: Option<&'e Registry>, options: &'e RenderOptions)
               -> Env<'e>
    {
        Env { assigns, registry, options }
    }

    fn lookup(&self, l: &Lookup) -> Result<Value> {
        match self.assigns.get(&l.name) {
            Some(v) => Ok(v.clone()),
            None if l.required => Err(MarkupErrorKind::MissingRequiredAssign {
                name: l.name.clone(),
                available: self.assigns.names(),
            })?,
            None => Ok(Value::Null),
        }
    }
}

fn resolve_var(v: &Var, bindings: &Bindings) -> Value {
    match bindings.get(&v.name) {
        Some(value) => value.clone(),
        None => {
            tracing::warn!(name = v.name.as_str(), "unbound deferred variable, rendering nothing");
            Value::Null
        }
    }
}

pub fn eval(expr: &Expr, env: Env, bindings: &Bindings) -> Result<Value> {
    Ok(match expr {
        Expr::Lit(v) => v.clone(),
        Expr::Ref(r) => match UNREWRITTEN.resolve(r) {
            Resolved::Lookup(l) => env.lookup(&l)?,
            Resolved::Var(v) => resolve_var(&v, bindings),
        },
        Expr::Lookup(l) => env.lookup(l)?,
        Expr::Var(v) => resolve_var(v, bindings),
        Expr::Not(e) => Value::Bool(!eval(e, env, bindings)?.is_truthy()),
        Expr::Eq(a, b) => Value::Bool(eval(a, env, bindings)? == eval(b, env, bindings)?),
        Expr::And(es) => {
            for e in es {
                if !eval(e, env, bindings)?.is_truthy() {
                    return Ok(Value::Bool(false))
                }
            }
            Value::Bool(true)
        }
        Expr::Or(es) => {
            for e in es {
                if eval(e, env, bindings)?.is_truthy() {
                    return Ok(Value::Bool(true))
                }
            }
            Value::Bool(false)
        }
    })
}

struct Renderer {
    out: String,
    /// Number of emitted (non-wrapper) elements we are inside of.
    depth: usize,
}

impl Renderer {
    fn new(depth: usize) -> Renderer {
        Renderer { out: String::new(), depth }
    }

    fn nodes(&mut self, nodes: &[Node], env: Env, bindings: &Bindings) -> Result<()> {
        for node in nodes {
            self.node(node, env, bindings)?;
        }
        Ok(())
    }

    fn branch(&mut self, test: &Expr, do_branch: &[Node], else_branch: &[Node],
              env: Env, bindings: &Bindings) -> Result<()>
    {
        if eval(test, env, bindings)?.is_truthy() {
            self.nodes(do_branch, env, bindings)
        } else {
            self.nodes(else_branch, env, bindings)
        }
    }

    fn node(&mut self, node: &Node, env: Env, bindings: &Bindings) -> Result<()> {
        match node {
            Node::Element(e) => self.element(e, env, bindings),
            Node::Value(v) => self.value(v, env, bindings),
            Node::List(nodes) => self.nodes(nodes, env, bindings),
            Node::Expr(e) => {
                let v = eval(e, env, bindings)?;
                self.value(&v, env, bindings)
            }
            Node::Var(v) => {
                let v = resolve_var(v, bindings);
                self.value(&v, env, bindings)
            }
            Node::Cond(c) => {
                let Cond { test, do_branch, else_branch } = &**c;
                self.branch(test, do_branch, else_branch, env, bindings)
            }
            Node::If(i) => {
                let If { test, do_branch, else_branch } = &**i;
                self.branch(test, do_branch, else_branch, env, bindings)
            }
            Node::Call(c) => self.call(c, env, bindings),
        }
    }

    fn value(&mut self, v: &Value, env: Env, bindings: &Bindings) -> Result<()> {
        match v {
            Value::Nodes(nodes) => self.nodes(nodes, env, bindings),
            Value::List(vs) => {
                for v in vs {
                    self.value(v, env, bindings)?;
                }
                Ok(())
            }
            v => {
                v.encode().write_to(&mut self.out);
                Ok(())
            }
        }
    }

    fn attr(&mut self, attr: &Attr, env: Env, bindings: &Bindings) -> Result<()> {
        check_attr_name(&attr.name)?;
        let value = eval(&attr.value, env, bindings)?;
        match value {
            Value::Null | Value::Bool(false) => (),
            Value::Bool(true) => {
                self.out.push(' ');
                self.out.push_str(&attr.name);
            }
            value => {
                self.out.push(' ');
                self.out.push_str(&attr.name);
                self.out.push_str("='");
                if let Value::Nodes(nodes) = &value {
                    let mut sub = Renderer::new(self.depth + 1);
                    sub.nodes(nodes, env, bindings)?;
                    html_escape_into(&mut self.out, &sub.out);
                } else {
                    value.encode().write_to(&mut self.out);
                }
                self.out.push('\'');
            }
        }
        Ok(())
    }

    fn element(&mut self, e: &Element, env: Env, bindings: &Bindings) -> Result<()> {
        let tag = match &e.tag {
            Tag::Wrapper(_) => {
                let inner = bindings.push(&e.scope);
                return self.nodes(&e.content, env, &inner)
            }
            Tag::Html(tag) => tag,
        };
        if self.depth == 0 && self.out.is_empty() && env.options.doctype
            && tag.eq_ignore_ascii_case("html")
        {
            self.out.push_str(DOCTYPE);
        }
        self.out.push('<');
        self.out.push_str(tag);
        for attr in &e.attrs {
            self.attr(attr, env, bindings)?;
        }
        if env.options.is_void(tag) {
            if !e.content.is_empty() {
                match env.options.void_content {
                    VoidContent::Error =>
                        Err(MarkupErrorKind::VoidElementContent { tag: tag.clone() })?,
                    VoidContent::Ignore =>
                        tracing::debug!(tag = tag.as_str(), "dropping content of void element"),
                }
            }
            self.out.push_str("/>");
            return Ok(())
        }
        self.out.push('>');
        self.depth += 1;
        self.nodes(&e.content, env, bindings)?;
        self.depth -= 1;
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
        Ok(())
    }

    fn call(&mut self, call: &Call, env: Env, bindings: &Bindings) -> Result<()> {
        let registry = env.registry.ok_or_else(
            || MarkupErrorKind::NoRegistry { name: call.name.clone() })?;
        let component = registry.get_component(&call.name)?;
        let assigns = call_assigns(&call.attrs, &call.content, env, bindings)?;
        let sub_env = Env::new(&assigns, env.registry, component.options());
        self.element(component.body(), sub_env, bindings)
    }
}

pub fn render(nodes: &[Node], env: Env, bindings: &Bindings) -> Result<SafeHtml> {
    let mut r = Renderer::new(0);
    r.nodes(nodes, env, bindings)?;
    Ok(SafeHtml::from_trusted(r.out))
}

pub fn render_element(e: &Element, env: Env, bindings: &Bindings) -> Result<SafeHtml> {
    let mut r = Renderer::new(0);
    r.element(e, env, bindings)?;
    Ok(SafeHtml::from_trusted(r.out))
}


// ------------------------------------------------------------------
// Eager half

/// Resolve lookups in `expr`, folding it to a literal if no `Var`
/// remains.
fn partial(expr: &Expr, env: Env) -> Result<Expr> {
    let e = match expr {
        Expr::Lit(_) | Expr::Var(_) => return Ok(expr.clone()),
        Expr::Ref(r) => match UNREWRITTEN.resolve(r) {
            Resolved::Lookup(l) => return Ok(Expr::Lit(env.lookup(&l)?)),
            Resolved::Var(v) => return Ok(Expr::Var(v)),
        },
        Expr::Lookup(l) => return Ok(Expr::Lit(env.lookup(l)?)),
        Expr::Not(e) => Expr::Not(Box::new(partial(e, env)?)),
        Expr::Eq(a, b) => Expr::Eq(Box::new(partial(a, env)?), Box::new(partial(b, env)?)),
        Expr::And(es) => Expr::And(es.iter().map(|e| partial(e, env)).collect::<Result<_>>()?),
        Expr::Or(es) => Expr::Or(es.iter().map(|e| partial(e, env)).collect::<Result<_>>()?),
    };
    if e.has_vars() {
        Ok(e)
    } else {
        Ok(Expr::Lit(eval(&e, env, &Bindings::empty())?))
    }
}

fn partial_attrs(attrs: &[Attr], env: Env) -> Result<Vec<Attr>> {
    attrs.iter().map(|a| -> Result<Attr> {
        Ok(Attr { name: a.name.clone(), value: partial(&a.value, env)? })
    }).collect()
}

fn invoke_into(out: &mut Vec<Node>, node: &Node, env: Env) -> Result<()> {
    match node {
        Node::Element(e) => out.push(Node::Element(Element {
            tag: e.tag.clone(),
            attrs: partial_attrs(&e.attrs, env)?,
            content: invoke(&e.content, env)?,
            scope: e.scope.clone(),
        })),
        Node::Value(_) | Node::Var(_) => out.push(node.clone()),
        Node::List(nodes) => {
            for n in nodes {
                invoke_into(out, n, env)?;
            }
        }
        Node::Expr(e) => match partial(e, env)? {
            Expr::Lit(v) => out.push(Node::Value(v)),
            e => out.push(Node::Expr(e)),
        },
        Node::Cond(c) => {
            // A test with a Var in it means the tree wasn't rewritten;
            // keep it for render time like an If.
            match partial(&c.test, env)? {
                Expr::Lit(v) => {
                    let branch = if v.is_truthy() { &c.do_branch } else { &c.else_branch };
                    for n in branch {
                        invoke_into(out, n, env)?;
                    }
                }
                test => out.push(Node::If(Box::new(If {
                    test,
                    do_branch: invoke(&c.do_branch, env)?,
                    else_branch: invoke(&c.else_branch, env)?,
                }))),
            }
        }
        Node::If(i) => out.push(Node::If(Box::new(If {
            test: partial(&i.test, env)?,
            do_branch: invoke(&i.do_branch, env)?,
            else_branch: invoke(&i.else_branch, env)?,
        }))),
        Node::Call(c) => {
            let call = Call {
                name: c.name.clone(),
                attrs: partial_attrs(&c.attrs, env)?,
                content: invoke(&c.content, env)?,
            };
            if call.attrs.iter().any(|a| a.value.has_vars()) {
                // Arguments only known once bindings are.
                out.push(Node::Call(Box::new(call)));
            } else {
                let registry = env.registry.ok_or_else(
                    || MarkupErrorKind::NoRegistry { name: call.name.clone() })?;
                let component = registry.get_component(&call.name)?;
                let assigns = call_assigns(&call.attrs, &call.content, env,
                                           &Bindings::empty())?;
                let sub_env = Env::new(&assigns, env.registry, component.options());
                let body = invoke(&component.body().content, sub_env)?;
                out.push(Node::Element(Element::wrapper(Wrapper::Component)
                                       .append_content(body)));
            }
        }
    }
    Ok(())
}

pub fn invoke(nodes: &[Node], env: Env) -> Result<Vec<Node>> {
    let mut out = Vec::new();
    for n in nodes {
        invoke_into(&mut out, n, env)?;
    }
    Ok(out)
}
