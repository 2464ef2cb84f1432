//! Named, reusable bodies: templates (all references required) and
//! components (references optional unless marked), plus the registry
//! component calls are resolved against.

use std::{collections::HashMap, sync::Arc};

use amarkup_html::{TagDb, TAGDB};
use kstring::KString;

use crate::{args::{Arg, normalize},
            config::Config,
            error::{MarkupErrorKind, Result},
            myfrom::{MyFrom, ks},
            node::{Attr, Element, Node, Wrapper},
            render::{Bindings, Env, RenderOptions, eval, invoke, render_element},
            rewrite::{RewriteOptions, rewrite_body},
            value::{Assigns, SafeHtml, Value}};

/// The assign under which a component receives the content it was
/// called with.
pub const CONTENT_KEY: &str = "__content__";

#[derive(Debug)]
struct Definition {
    name: KString,
    body: Element,
    options: RenderOptions,
}

impl Definition {
    fn new(name: KString, kind: Wrapper, body: Vec<Node>, config: &Config,
           tagdb: &'static TagDb, allow_optional: bool) -> Result<Definition>
    {
        let body = rewrite_body(body, RewriteOptions {
            allow_optional,
            deferred: config.deferred,
        })?;
        tracing::debug!(name = name.as_str(), %kind, "defined");
        Ok(Definition {
            name,
            body: Element::wrapper(kind).append_content(body),
            options: RenderOptions::with_tagdb(config, tagdb),
        })
    }

    fn render(&self, assigns: &Assigns, bindings: &Bindings, registry: Option<&Registry>)
              -> Result<SafeHtml>
    {
        let env = Env::new(assigns, registry, &self.options);
        render_element(&self.body, env, bindings)
    }
}

#[derive(Debug, Clone)]
pub struct Template(Arc<Definition>);

impl Template {
    /// Rewrites `body`; all plain references are required.
    pub fn define<T>(name: T, body: Vec<Node>, config: &Config) -> Result<Template>
    where KString: MyFrom<T>
    {
        Template::define_with_tagdb(name, body, config, &TAGDB)
    }

    pub fn define_with_tagdb<T>(name: T, body: Vec<Node>, config: &Config,
                                tagdb: &'static TagDb) -> Result<Template>
    where KString: MyFrom<T>
    {
        Ok(Template(Arc::new(Definition::new(ks(name), Wrapper::Template, body, config,
                                             tagdb, false)?)))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The rewritten body, inside its template wrapper.
    pub fn body(&self) -> &Element {
        &self.0.body
    }

    pub fn options(&self) -> &RenderOptions {
        &self.0.options
    }

    pub fn render(&self, assigns: &Assigns) -> Result<SafeHtml> {
        self.0.render(assigns, &Bindings::empty(), None)
    }

    pub fn render_with(&self, assigns: &Assigns, bindings: &Bindings,
                       registry: Option<&Registry>) -> Result<SafeHtml>
    {
        self.0.render(assigns, bindings, registry)
    }

    /// The eager half of rendering: the result still holds the
    /// deferred nodes, ready to be rendered against bindings with
    /// `render::render`.
    pub fn invoke(&self, assigns: &Assigns, registry: Option<&Registry>) -> Result<Node> {
        let env = Env::new(assigns, registry, &self.0.options);
        Ok(Node::Element(Element::wrapper(Wrapper::Template)
                         .append_content(invoke(&self.0.body.content, env)?)))
    }
}

#[derive(Debug, Clone)]
pub struct Component(Arc<Definition>);

impl Component {
    /// Rewrites `body`; plain references are optional, `name!` ones
    /// required.
    pub fn define<T>(name: T, body: Vec<Node>, config: &Config) -> Result<Component>
    where KString: MyFrom<T>
    {
        Component::define_with_tagdb(name, body, config, &TAGDB)
    }

    pub fn define_with_tagdb<T>(name: T, body: Vec<Node>, config: &Config,
                                tagdb: &'static TagDb) -> Result<Component>
    where KString: MyFrom<T>
    {
        Ok(Component(Arc::new(Definition::new(ks(name), Wrapper::Component, body, config,
                                              tagdb, true)?)))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn body(&self) -> &Element {
        &self.0.body
    }

    pub fn options(&self) -> &RenderOptions {
        &self.0.options
    }

    /// Render with `assigns` given directly, as if called with them.
    pub fn render_with(&self, assigns: &Assigns, bindings: &Bindings,
                       registry: Option<&Registry>) -> Result<SafeHtml>
    {
        self.0.render(assigns, bindings, registry)
    }

    /// Call with the usual two positional arguments: the attributes
    /// become assigns, the content is passed as `__content__`.
    pub fn call(&self, a: impl Into<Arg>, b: impl Into<Arg>, registry: Option<&Registry>)
                -> Result<SafeHtml>
    {
        let normalized = normalize(a.into(), b.into())?;
        let caller = Assigns::new();
        let env = Env::new(&caller, registry, &self.0.options);
        let assigns = call_assigns(&normalized.attrs, &normalized.content, env,
                                   &Bindings::empty())?;
        self.0.render(&assigns, &Bindings::empty(), registry)
    }
}

/// The assigns a component sees: attributes evaluated in the caller's
/// environment (later duplicates win), and the content with the
/// caller's eager parts resolved.
pub(crate) fn call_assigns(attrs: &[Attr], content: &[Node], caller: Env, bindings: &Bindings)
                           -> Result<Assigns>
{
    let mut assigns = Assigns::new();
    for attr in attrs {
        assigns.insert(&attr.name, eval(&attr.value, caller, bindings)?);
    }
    assigns.insert(CONTENT_KEY, Value::nodes(invoke(content, caller)?));
    Ok(assigns)
}

/// Filled in at startup, read-only afterwards.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    templates: HashMap<KString, Template>,
    components: HashMap<KString, Component>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Returns the template previously registered under the same name.
    pub fn add_template(&mut self, template: Template) -> Option<Template> {
        self.templates.insert(KString::from_ref(template.name()), template)
    }

    pub fn add_component(&mut self, component: Component) -> Option<Component> {
        self.components.insert(KString::from_ref(component.name()), component)
    }

    pub fn template(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }

    pub(crate) fn get_component(&self, name: &str) -> Result<&Component> {
        Ok(self.component(name).ok_or_else(
            || MarkupErrorKind::UnknownComponent { name: KString::from_ref(name) })?)
    }

    pub fn render(&self, name: &str, assigns: &Assigns) -> Result<SafeHtml> {
        let template = self.template(name).ok_or_else(
            || MarkupErrorKind::UnknownTemplate { name: KString::from_ref(name) })?;
        template.render_with(assigns, &Bindings::empty(), Some(self))
    }
}
