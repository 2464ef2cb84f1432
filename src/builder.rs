//! The authoring surface. Every element goes through `el`, which
//! normalizes the call arguments, checks the tag and casts it to its
//! display form.

use amarkup_html::{TagDb, TAGDB};
use kstring::KString;

use crate::{args::{Arg, content_arg, normalize},
            casing::Casing,
            config::{Config, VoidContent},
            error::{MarkupErrorKind, Result},
            myfrom::{MyFrom, ks},
            node::{AssignRef, Call, Cond, Element, Expr, Node, Wrapper, flatten},
            rewrite,
            selector::{check_attr_name, sel},
            value::{SafeHtml, Value}};

#[derive(Debug, Clone, Copy)]
pub struct Builder {
    casing: Casing,
    void_content: VoidContent,
    verify_tags: bool,
    tagdb: &'static TagDb,
}

macro_rules! def_tags {
    ($($name:ident),* $(,)?) => {
        $(
            pub fn $name(&self, a: impl Into<Arg>, b: impl Into<Arg>) -> Result<Node> {
                self.el(stringify!($name), a, b)
            }
        )*
    }
}

impl Builder {
    pub fn new(config: &Config) -> Builder {
        Builder::with_tagdb(config, &TAGDB)
    }

    pub fn with_tagdb(config: &Config, tagdb: &'static TagDb) -> Builder {
        Builder {
            casing: config.casing,
            void_content: config.void_content,
            verify_tags: config.verify_tags,
            tagdb,
        }
    }

    /// `tag` is the canonical (snake case) name.
    pub fn el(&self, tag: &str, a: impl Into<Arg>, b: impl Into<Arg>) -> Result<Node> {
        let normalized = normalize(a.into(), b.into())?;
        for attr in &normalized.attrs {
            check_attr_name(&attr.name)?;
        }
        if self.verify_tags && !self.tagdb.contains(tag) {
            Err(MarkupErrorKind::UnknownTag { tag: KString::from_ref(tag) })?
        }
        let mut content = flatten(normalized.content);
        if self.tagdb.is_void(tag) && !content.is_empty() {
            match self.void_content {
                VoidContent::Error =>
                    Err(MarkupErrorKind::VoidElementContent { tag: KString::from_ref(tag) })?,
                VoidContent::Ignore => {
                    tracing::debug!(tag, "dropping content of void element");
                    content.clear();
                }
            }
        }
        Ok(Node::Element(Element::new(self.casing.apply(tag))
                         .merge_attrs(normalized.attrs)
                         .append_content(content)))
    }

    /// An element whose tag, classes and id come from `selector`.
    pub fn sel(&self, selector: &str, b: impl Into<Arg>) -> Result<Node> {
        let selector = sel(selector);
        let tag = selector.parse().tag;
        self.el(&tag, selector, b)
    }

    def_tags! {
        div, p, span, h1, h2, h3, h4, h5, h6, a, ul, li, video, input, img, br, hr, meta,
        html, head, body, title, section, button, label, form, table, tr, td,
    }

    pub fn text<T>(&self, s: T) -> Node
    where KString: MyFrom<T>
    {
        Node::text(s)
    }

    pub fn safe(&self, s: SafeHtml) -> Node {
        Node::safe(s)
    }

    pub fn fragment(&self, content: impl Into<Arg>) -> Result<Node> {
        Ok(Node::Element(Element::wrapper(Wrapper::Fragment)
                         .append_content(content_arg(content.into())?)))
    }

    /// A fragment providing `bindings` to the deferred nodes in
    /// `content`.
    pub fn scope(&self, bindings: impl IntoIterator<Item = (KString, Value)>,
                 content: impl Into<Arg>) -> Result<Node>
    {
        Ok(Node::Element(Element::wrapper(Wrapper::Fragment)
                         .with_scope(bindings)
                         .append_content(content_arg(content.into())?)))
    }

    pub fn assign<T>(&self, name: T) -> AssignRef
    where KString: MyFrom<T>
    {
        rewrite::assign(name)
    }

    pub fn if_(&self, test: impl Into<Expr>, then: impl Into<Arg>) -> Result<Node> {
        self.if_else(test, then, ())
    }

    pub fn if_else(&self, test: impl Into<Expr>, then: impl Into<Arg>,
                   otherwise: impl Into<Arg>) -> Result<Node>
    {
        Ok(Node::Cond(Box::new(Cond {
            test: test.into(),
            do_branch: content_arg(then.into())?,
            else_branch: content_arg(otherwise.into())?,
        })))
    }

    /// A call site for a registered component, expanded at render time.
    pub fn component<T>(&self, name: T, a: impl Into<Arg>, b: impl Into<Arg>) -> Result<Node>
    where KString: MyFrom<T>
    {
        let normalized = normalize(a.into(), b.into())?;
        for attr in &normalized.attrs {
            check_attr_name(&attr.name)?;
        }
        Ok(Node::Call(Box::new(Call {
            name: ks(name),
            attrs: normalized.attrs,
            content: normalized.content,
        })))
    }
}
