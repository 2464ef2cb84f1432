//! Markup, parameters and bindings written as JSON.
//!
//! Content: strings are text, other scalars are values, arrays are
//! sequences. Objects are one of the forms
//!
//! ```text
//! {"el": "<selector>", "args": [a, b]}
//! {"@": "name"}
//! {"if": test, "do": content, "else": content}
//! {"safe": "<html>"}
//! {"fragment": content}
//! {"component": "name", "args": [a, b]}
//! ```
//!
//! In `args`, a plain object is an attribute list (in key order), an
//! array a block, `{"sel": "..."}` a selector; anything else is a
//! single value. Tests and attribute values are expressions: scalars,
//! `{"@": ..}`, `{"not": e}`, `{"eq": [a, b]}`, `{"and": [..]}`,
//! `{"or": [..]}`.

use kstring::KString;
use serde_json::{Map, Value as JsonValue};

use crate::{args::{Arg, Block, normalize},
            builder::Builder,
            error::{MarkupErrorKind, Result},
            node::{Attr, Expr, Node},
            rewrite::assign,
            selector::{check_attr_name, parse_selector, sel},
            value::{Assigns, SafeHtml, Value}};

const NODE_FORMS: &[&str] = &["el", "@", "if", "safe", "fragment", "component"];

fn json_error(path: &str, message: impl Into<String>) -> MarkupErrorKind {
    MarkupErrorKind::Json { path: path.into(), message: message.into() }
}

fn get_str<'v>(obj: &'v Map<String, JsonValue>, key: &str, path: &str) -> Result<&'v str> {
    match obj.get(key) {
        Some(JsonValue::String(s)) => Ok(s.as_str()),
        Some(v) => Err(json_error(path, format!("{key:?} must be a string, got {v}")))?,
        None => Err(json_error(path, format!("missing {key:?}")))?,
    }
}

fn scalar(v: &JsonValue) -> Option<Value> {
    match v {
        JsonValue::Null => Some(Value::Null),
        JsonValue::Bool(b) => Some(Value::Bool(*b)),
        JsonValue::Number(n) => Some(match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        }),
        JsonValue::String(s) => Some(Value::Str(KString::from_ref(s))),
        _ => None,
    }
}

/// A parameter or binding value: scalars, arrays (lists), and
/// `{"safe": ".."}`.
pub fn value_from_json(v: &JsonValue) -> Result<Value> {
    value_at(v, "$")
}

fn value_at(v: &JsonValue, path: &str) -> Result<Value> {
    if let Some(value) = scalar(v) {
        return Ok(value)
    }
    match v {
        JsonValue::Array(vs) => Ok(Value::List(
            vs.iter().enumerate()
                .map(|(i, v)| value_at(v, &format!("{path}[{i}]")))
                .collect::<Result<_>>()?)),
        JsonValue::Object(obj) if obj.len() == 1 && obj.contains_key("safe") =>
            Ok(Value::Safe(SafeHtml::from_trusted(get_str(obj, "safe", path)?))),
        _ => Err(json_error(path, format!("not a value: {v}")))?,
    }
}

pub fn assigns_from_json(v: &JsonValue) -> Result<Assigns> {
    match v {
        JsonValue::Object(obj) => obj.iter()
            .map(|(k, v)| -> Result<(KString, Value)> {
                Ok((KString::from_ref(k), value_at(v, &format!("$.{k}"))?))
            })
            .collect(),
        _ => Err(json_error("$", "parameters must be an object"))?,
    }
}

pub fn bindings_from_json(v: &JsonValue) -> Result<Vec<(KString, Value)>> {
    match v {
        JsonValue::Object(obj) => obj.iter()
            .map(|(k, v)| -> Result<(KString, Value)> {
                Ok((KString::from_ref(k), value_at(v, &format!("$.{k}"))?))
            })
            .collect(),
        _ => Err(json_error("$", "bindings must be an object"))?,
    }
}

pub fn expr_from_json(v: &JsonValue) -> Result<Expr> {
    expr_at(v, "$")
}

fn expr_list(v: &JsonValue, path: &str) -> Result<Vec<Expr>> {
    match v {
        JsonValue::Array(vs) => vs.iter().enumerate()
            .map(|(i, v)| expr_at(v, &format!("{path}[{i}]")))
            .collect(),
        _ => Err(json_error(path, "expected an array of expressions"))?,
    }
}

fn expr_at(v: &JsonValue, path: &str) -> Result<Expr> {
    let obj = match v {
        JsonValue::Object(obj) if obj.len() == 1 => obj,
        JsonValue::Object(_) => Err(json_error(path, "expression objects have a single key"))?,
        v => return Ok(Expr::Lit(value_at(v, path)?)),
    };
    let (key, arg) = obj.iter().next()
        .ok_or_else(|| json_error(path, "empty expression"))?;
    let sub = format!("{path}.{key}");
    Ok(match key.as_str() {
        "@" => match arg {
            JsonValue::String(name) => Expr::Ref(assign(name)),
            _ => Err(json_error(&sub, "reference name must be a string"))?,
        },
        "not" => Expr::not(expr_at(arg, &sub)?),
        "eq" => {
            let mut es = expr_list(arg, &sub)?;
            if es.len() != 2 {
                Err(json_error(&sub, "\"eq\" takes exactly two expressions"))?
            }
            let b = es.pop();
            let a = es.pop();
            match (a, b) {
                (Some(a), Some(b)) => Expr::equals(a, b),
                _ => Err(json_error(&sub, "\"eq\" takes exactly two expressions"))?,
            }
        }
        "and" => Expr::And(expr_list(arg, &sub)?),
        "or" => Expr::Or(expr_list(arg, &sub)?),
        "safe" => Expr::Lit(value_at(v, path)?),
        _ => Err(json_error(path, format!("unknown expression form {key:?}")))?,
    })
}

/// Builds IR from JSON, with every element going through `builder`.
pub struct JsonReader<'b> {
    builder: &'b Builder,
}

impl<'b> JsonReader<'b> {
    pub fn new(builder: &'b Builder) -> JsonReader<'b> {
        JsonReader { builder }
    }

    pub fn node(&self, v: &JsonValue) -> Result<Node> {
        self.node_at(v, "$")
    }

    /// A whole body: an array is its sequence of nodes, anything else a
    /// single node.
    pub fn body(&self, v: &JsonValue) -> Result<Vec<Node>> {
        self.content_at(v, "$")
    }

    fn content_at(&self, v: &JsonValue, path: &str) -> Result<Vec<Node>> {
        match v {
            JsonValue::Array(vs) => vs.iter().enumerate()
                .map(|(i, v)| self.node_at(v, &format!("{path}[{i}]")))
                .collect(),
            v => Ok(vec![self.node_at(v, path)?]),
        }
    }

    fn node_at(&self, v: &JsonValue, path: &str) -> Result<Node> {
        match v {
            JsonValue::String(s) => Ok(Node::text(s)),
            JsonValue::Array(_) => Ok(Node::List(self.content_at(v, path)?)),
            JsonValue::Object(obj) => self.form(obj, path),
            v => Ok(Node::Value(value_at(v, path)?)),
        }
    }

    fn args(&self, obj: &Map<String, JsonValue>, path: &str) -> Result<(Arg, Arg)> {
        let path = format!("{path}.args");
        let args = match obj.get("args") {
            None => return Ok((Arg::Absent, Arg::Absent)),
            Some(JsonValue::Array(args)) => args,
            Some(_) => Err(json_error(&path, "\"args\" must be an array"))?,
        };
        let mut args = args.iter().enumerate().map(|(i, v)| self.arg(v, &format!("{path}[{i}]")));
        let a = args.next().transpose()?.unwrap_or(Arg::Absent);
        let b = args.next().transpose()?.unwrap_or(Arg::Absent);
        if args.next().is_some() {
            Err(json_error(&path, "at most two arguments"))?
        }
        Ok((a, b))
    }

    fn arg(&self, v: &JsonValue, path: &str) -> Result<Arg> {
        match v {
            JsonValue::Array(_) => Ok(Arg::Block(Block::Many(self.content_at(v, path)?))),
            JsonValue::Object(obj) if obj.len() == 1 && obj.contains_key("sel") =>
                Ok(Arg::Selector(sel(get_str(obj, "sel", path)?))),
            JsonValue::Object(obj) if !NODE_FORMS.iter().any(|k| obj.contains_key(*k)) =>
                Ok(Arg::Attrs(obj.iter().map(|(name, v)| -> Result<Attr> {
                    check_attr_name(name)
                        .map_err(|e| json_error(&format!("{path}.{name}"), e.to_string()))?;
                    Ok(Attr {
                        name: KString::from_ref(name),
                        value: expr_at(v, &format!("{path}.{name}"))?,
                    })
                }).collect::<Result<_>>()?)),
            v => Ok(Arg::Value(self.node_at(v, path)?)),
        }
    }

    fn form(&self, obj: &Map<String, JsonValue>, path: &str) -> Result<Node> {
        let b = self.builder;
        if obj.contains_key("el") {
            let parsed = parse_selector(get_str(obj, "el", path)?);
            let (x, y) = self.args(obj, path)?;
            let n = normalize(x, y)?;
            let mut attrs: Vec<Attr> = parsed.attrs.into_iter()
                .map(|(name, value)| Attr { name, value: Expr::Lit(Value::Str(value)) })
                .collect();
            attrs.extend(n.attrs);
            b.el(&parsed.tag, attrs, n.content)
        } else if obj.contains_key("@") {
            Ok(Node::from(assign(get_str(obj, "@", path)?)))
        } else if let Some(test) = obj.get("if") {
            let empty = JsonValue::Array(vec![]);
            let do_branch = self.content_at(obj.get("do").unwrap_or(&empty),
                                            &format!("{path}.do"))?;
            let else_branch = self.content_at(obj.get("else").unwrap_or(&empty),
                                              &format!("{path}.else"))?;
            b.if_else(expr_at(test, &format!("{path}.if"))?, do_branch, else_branch)
        } else if obj.contains_key("safe") {
            Ok(b.safe(SafeHtml::from_trusted(get_str(obj, "safe", path)?)))
        } else if let Some(content) = obj.get("fragment") {
            b.fragment(self.content_at(content, &format!("{path}.fragment"))?)
        } else if obj.contains_key("component") {
            let name = get_str(obj, "component", path)?;
            let (x, y) = self.args(obj, path)?;
            b.component(name, x, y)
        } else {
            let keys: Vec<&str> = obj.keys().map(|k| k.as_str()).collect();
            Err(json_error(path, format!("unknown node form with keys {keys:?}")))?
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::{config::Config, node::{Cond, att}};

    fn reader_nodes(v: JsonValue) -> Result<Vec<Node>> {
        let builder = Builder::new(&Config::default());
        JsonReader::new(&builder).body(&v)
    }

    #[test]
    fn t_element() {
        let nodes = reader_nodes(json!([
            {"el": "p.a", "args": [{"title": "t", "hidden": true}, ["x", 1]]}
        ])).unwrap();
        let e = nodes[0].as_element().unwrap();
        assert_eq!(e.tag.html_name(), Some("p"));
        assert_eq!(e.attrs, vec![att("class", "a"), att("title", "t"), att("hidden", true)]);
        assert_eq!(e.content, vec![Node::text("x"), Node::from(1)]);
    }

    #[test]
    fn t_args_order_and_selector() {
        let nodes = reader_nodes(json!({"el": "div", "args": [42, {"a": 1}]})).unwrap();
        let e = nodes[0].as_element().unwrap();
        assert_eq!(e.attrs, vec![att("a", 1)]);
        assert_eq!(e.content, vec![Node::from(42)]);

        let nodes = reader_nodes(json!({"el": "span", "args": [{"sel": "#i"}, "x"]})).unwrap();
        assert_eq!(nodes[0].as_element().unwrap().attrs, vec![att("id", "i")]);

        let err = reader_nodes(json!({"el": "div", "args": [1, 2]})).unwrap_err();
        assert!(matches!(err.kind(), MarkupErrorKind::ArgumentShape { .. }));
    }

    #[test]
    fn t_conditional() {
        let nodes = reader_nodes(json!({
            "if": {"and": [{"@": "a"}, {"not": {"eq": [{"@": "b"}, 2]}}]},
            "do": "yes",
        })).unwrap();
        match &nodes[0] {
            Node::Cond(c) => {
                let Cond { test, do_branch, else_branch } = &**c;
                assert!(matches!(test, Expr::And(es) if es.len() == 2));
                assert_eq!(do_branch, &vec![Node::text("yes")]);
                assert!(else_branch.is_empty());
            }
            n => panic!("{n:?}"),
        }
    }

    #[test]
    fn t_errors() {
        let err = reader_nodes(json!([1, {"bogus": 1}])).unwrap_err();
        match err.kind() {
            MarkupErrorKind::Json { path, message } => {
                assert_eq!(path, "$[1]");
                assert!(message.contains("bogus"), "{message}");
            }
            e => panic!("unexpected {e}"),
        }
        let err = reader_nodes(json!({"el": "p", "args": [1, 2, 3]})).unwrap_err();
        assert!(matches!(err.kind(), MarkupErrorKind::Json { path, .. } if path == "$.args"));
        assert!(expr_from_json(&json!({"eq": [1]})).is_err());

        let err = reader_nodes(json!({"el": "p", "args": [{"x='1' onmouseover='alert(1)' y": 1}]}))
            .unwrap_err();
        match err.kind() {
            MarkupErrorKind::Json { path, message } => {
                assert_eq!(path, "$.args[0].x='1' onmouseover='alert(1)' y");
                assert!(message.contains("invalid attribute name"), "{message}");
            }
            e => panic!("unexpected {e}"),
        }
    }

    #[test]
    fn t_assigns() {
        let a = assigns_from_json(&json!({
            "n": 1, "f": 1.5, "s": "x", "l": ["a", "b"], "h": {"safe": "<b>"}, "z": null
        })).unwrap();
        assert_eq!(a.get("n"), Some(&Value::Int(1)));
        assert_eq!(a.get("f"), Some(&Value::Float(1.5)));
        assert_eq!(a.get("l"), Some(&Value::List(vec![Value::from("a"), Value::from("b")])));
        assert_eq!(a.get("h"), Some(&Value::Safe(SafeHtml::from_trusted("<b>"))));
        assert_eq!(a.get("z"), Some(&Value::Null));
        assert!(assigns_from_json(&json!([1])).is_err());
        assert!(assigns_from_json(&json!({"o": {"x": 1}})).is_err());
    }
}
