use amarkup::{Assigns, Bindings, Builder, Component, Config, JsonReader, MarkupErrorKind,
              Node, Registry, SafeHtml, Template, Value, assign, att, sel,
              render::{Env, render}};
use kstring::KString;
use serde_json::json;

fn html() -> Builder {
    Builder::new(&Config::default())
}

fn render_body(body: Vec<Node>, assigns: &Assigns) -> String {
    Template::define("test", body, &Config::default()).unwrap()
        .render(assigns).unwrap().as_str().to_string()
}

#[test]
fn t_readme_examples() {
    let h = html();
    let none = Assigns::new();
    assert_eq!(render_body(vec![h.div(42, ()).unwrap()], &none), "<div>42</div>");
    assert_eq!(render_body(vec![h.div([att("a", 1)], 42).unwrap()], &none),
               "<div a='1'>42</div>");
    assert_eq!(render_body(vec![h.div(42, [att("a", 1)]).unwrap()], &none),
               "<div a='1'>42</div>");
    assert_eq!(render_body(vec![h.video([att("autoplay", true)], ()).unwrap()], &none),
               "<video autoplay></video>");
    assert_eq!(render_body(vec![h.video([att("autoplay", false)], ()).unwrap()], &none),
               "<video></video>");
    assert_eq!(render_body(vec![h.h1("Tom & Jerry", ()).unwrap()], &none),
               "<h1>Tom &amp; Jerry</h1>");
    assert_eq!(render_body(vec![h.h1(h.safe(SafeHtml::from_trusted("Tom & Jerry")), ())
                                .unwrap()], &none),
               "<h1>Tom & Jerry</h1>");
}

#[test]
fn t_page() {
    let h = html();
    let page = h.html(vec![
        h.head(h.title(assign("title"), ()).unwrap(), ()).unwrap(),
        h.body(vec![
            h.sel("section#main.wide", vec![
                h.p([att("class", Value::List(vec![Value::from("a"), Value::from("b")]))],
                    assign("title")).unwrap(),
                h.input([att("type", "checkbox"), att("checked", assign("done"))], ())
                    .unwrap(),
                h.br((), ()).unwrap(),
            ]).unwrap(),
        ], ()).unwrap(),
    ], ()).unwrap();
    let assigns = Assigns::new().with("title", "<Hi>").with("done", true);
    assert_eq!(render_body(vec![page], &assigns),
               "<!doctype html>\n<html><head><title>&lt;Hi&gt;</title></head>\
                <body><section id='main' class='wide'><p class='a b'>&lt;Hi&gt;</p>\
                <input type='checkbox' checked/><br/></section></body></html>");

    // Only an html element that starts the output gets the doctype.
    let none = Assigns::new();
    assert_eq!(render_body(vec![h.p("x", ()).unwrap(), h.html((), ()).unwrap()], &none),
               "<p>x</p><html></html>");
}

#[test]
fn t_missing_required_assign() {
    let h = html();
    let t = Template::define("greeting", vec![h.p(assign("name"), ()).unwrap()],
                             &Config::default()).unwrap();
    let err = t.render(&Assigns::new().with("nam", "typo").with("age", 3)).unwrap_err();
    match err.kind() {
        MarkupErrorKind::MissingRequiredAssign { name, available } => {
            assert_eq!(name.as_str(), "name");
            let available: Vec<&str> = available.iter().map(|k| k.as_str()).collect();
            assert_eq!(available, ["age", "nam"]);
        }
        e => panic!("unexpected {e}"),
    }
    assert_eq!(t.render(&Assigns::new().with("name", "Ann")).unwrap().as_str(), "<p>Ann</p>");
}

#[test]
fn t_optional_assigns_in_components() {
    let h = html();
    let c = Component::define("badge", vec![
        h.span([att("title", assign("tip"))], vec![Node::from(assign("label!"))]).unwrap()
    ], &Config::default()).unwrap();
    assert_eq!(c.call([att("label", "new")], (), None).unwrap().as_str(),
               "<span>new</span>");
    let err = c.call([att("tip", "t")], (), None).unwrap_err();
    assert!(matches!(err.kind(), MarkupErrorKind::MissingRequiredAssign { .. }));
}

#[test]
fn t_deferred_through_scope() {
    let h = html();
    let body = vec![
        h.ul(vec![
            h.li(assign("item$"), ()).unwrap(),
            h.if_else(assign("more$"), h.li("...", ()).unwrap(), ()).unwrap(),
        ], ()).unwrap(),
    ];
    let t = Template::define("list", body, &Config::default()).unwrap();
    let vars = [(KString::from_static("item"), Value::from("one")),
                (KString::from_static("more"), Value::from(true))];
    assert_eq!(t.render_with(&Assigns::new(), &Bindings::new(&vars), None).unwrap().as_str(),
               "<ul><li>one</li><li>...</li></ul>");

    // The same via a scope wrapper inside the tree.
    let body = vec![
        h.scope([(KString::from_static("item"), Value::from("two")),
                 (KString::from_static("more"), Value::from(false))],
                vec![h.li(assign("item$"), ()).unwrap(),
                     h.if_(assign("more$"), "...").unwrap()]).unwrap(),
    ];
    assert_eq!(render_body(body, &Assigns::new()), "<li>two</li>");
}

#[test]
fn t_deferred_conflict_at_definition() {
    let h = html();
    let body = vec![
        h.p(assign("x$"), ()).unwrap(),
        h.if_(assign("x$"), "shown").unwrap(),
    ];
    let err = Template::define("bad", body, &Config::default()).unwrap_err();
    assert!(matches!(err.kind(), MarkupErrorKind::DeferredKindConflict { .. }));

    // Without deferred mode the `$` is just part of a name.
    let config = Config { deferred: false, ..Config::default() };
    let body = vec![h.p(assign("x$"), ()).unwrap(), h.if_(assign("x$"), "shown").unwrap()];
    let t = Template::define("plain", body, &config).unwrap();
    assert_eq!(t.render(&Assigns::new().with("x$", "v")).unwrap().as_str(), "<p>v</p>shown");
}

#[test]
fn t_invoke_then_render() {
    let h = html();
    let body = vec![h.div([att("id", assign("id"))], vec![
        h.if_(assign("show"), h.span(assign("x$"), ()).unwrap()).unwrap(),
        h.if_(assign("y$"), "y").unwrap(),
    ]).unwrap()];
    let t = Template::define("t", body, &Config::default()).unwrap();
    let assigns = Assigns::new().with("id", "d").with("show", true);
    let vars = [(KString::from_static("x"), Value::from(1)),
                (KString::from_static("y"), Value::from(true))];
    let direct = t.render_with(&assigns, &Bindings::new(&vars), None).unwrap();
    let invoked = t.invoke(&assigns, None).unwrap();
    let none = Assigns::new();
    let later = render(&[invoked], Env::new(&none, None, t.options()), &Bindings::new(&vars))
        .unwrap();
    assert_eq!(direct.as_str(), "<div id='d'><span>1</span>y</div>");
    assert_eq!(direct, later);
}

#[test]
fn t_components_and_content() {
    let h = html();
    let mut registry = Registry::new();
    registry.add_component(Component::define("card", vec![
        h.div([att("class", "card")], vec![
            h.h2(assign("heading"), ()).unwrap(),
            Node::from(assign("__content__")),
        ]).unwrap()
    ], &Config::default()).unwrap());
    registry.add_template(Template::define("page", vec![
        h.component("card", [att("heading", assign("title"))],
                    vec![h.p(assign("text"), ()).unwrap()]).unwrap()
    ], &Config::default()).unwrap());

    let assigns = Assigns::new().with("title", "T").with("text", "a < b");
    assert_eq!(registry.render("page", &assigns).unwrap().as_str(),
               "<div class='card'><h2>T</h2><p>a &lt; b</p></div>");
}

#[test]
fn t_selector_roundtrip() {
    let s = sel("a#top.x.y");
    let parsed = s.parse();
    assert_eq!(amarkup::selector::format_selector(&parsed.tag, &parsed.attrs), "a#top.x.y");
}

#[test]
fn t_json_front_end() {
    let config = Config::default();
    let builder = Builder::new(&config);
    let body = JsonReader::new(&builder).body(&json!([
        {"el": "h1", "args": ["Tom & Jerry"]},
        {"el": "p.note", "args": [{"title": {"@": "tip"}}, [{"@": "text"}]]},
        {"if": {"not": {"@": "hide"}}, "do": {"safe": "<hr/>"}},
        {"el": "input", "args": [{"disabled": false, "value": 3}]}
    ])).unwrap();
    let t = Template::define("doc", body, &config).unwrap();
    let assigns = amarkup::json::assigns_from_json(&json!({
        "tip": "it's", "text": "body", "hide": false
    })).unwrap();
    assert_eq!(t.render(&assigns).unwrap().as_str(),
               "<h1>Tom &amp; Jerry</h1><p class='note' title='it&#39;s'>body</p>\
                <hr/><input value='3'/>");
}
