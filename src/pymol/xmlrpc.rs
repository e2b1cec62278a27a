//! Minimal XML-RPC codec for talking to PyMOL's RPC listener.
//!
//! Covers the value types PyMOL actually sends and receives: scalars, `nil`,
//! arrays and structs. Requests are written by hand; responses are read with
//! `xml-rs` into a small element tree and then interpreted.

use std::fmt;

use xml::escape::escape_str_pcdata;
use xml::reader::{EventReader, XmlEvent};

use crate::error::RpcError;

// ── Value model ─────────────────────────────────────────────────────────────

/// A single XML-RPC value.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlValue {
    Nil,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Array(Vec<XmlValue>),
    /// Members in document order.
    Struct(Vec<(String, XmlValue)>),
}

impl XmlValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            XmlValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            XmlValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a struct member by name.
    pub fn member(&self, name: &str) -> Option<&XmlValue> {
        match self {
            XmlValue::Struct(members) => members.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl fmt::Display for XmlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmlValue::Nil => f.write_str("(none)"),
            XmlValue::Bool(b) => write!(f, "{b}"),
            XmlValue::Int(i) => write!(f, "{i}"),
            XmlValue::Double(d) => write!(f, "{d}"),
            XmlValue::String(s) => f.write_str(s),
            XmlValue::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            XmlValue::Struct(members) => {
                f.write_str("{")?;
                for (i, (k, v)) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for XmlValue {
    fn from(s: &str) -> Self {
        XmlValue::String(s.to_string())
    }
}

impl From<String> for XmlValue {
    fn from(s: String) -> Self {
        XmlValue::String(s)
    }
}

impl From<i64> for XmlValue {
    fn from(i: i64) -> Self {
        XmlValue::Int(i)
    }
}

impl From<f64> for XmlValue {
    fn from(d: f64) -> Self {
        XmlValue::Double(d)
    }
}

impl From<bool> for XmlValue {
    fn from(b: bool) -> Self {
        XmlValue::Bool(b)
    }
}

// ── Encoding ────────────────────────────────────────────────────────────────

/// Serialize a `methodCall` document.
pub fn encode_call(method: &str, params: &[XmlValue]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodCall><methodName>");
    out.push_str(&escape_str_pcdata(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        write_value(&mut out, param);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>\n");
    out
}

fn write_value(out: &mut String, value: &XmlValue) {
    out.push_str("<value>");
    match value {
        XmlValue::Nil => out.push_str("<nil/>"),
        XmlValue::Bool(b) => {
            out.push_str(if *b { "<boolean>1</boolean>" } else { "<boolean>0</boolean>" })
        }
        XmlValue::Int(i) => {
            out.push_str("<int>");
            out.push_str(&i.to_string());
            out.push_str("</int>");
        }
        XmlValue::Double(d) => {
            out.push_str("<double>");
            out.push_str(&d.to_string());
            out.push_str("</double>");
        }
        XmlValue::String(s) => {
            out.push_str("<string>");
            out.push_str(&escape_str_pcdata(s));
            out.push_str("</string>");
        }
        XmlValue::Array(items) => {
            out.push_str("<array><data>");
            for item in items {
                write_value(out, item);
            }
            out.push_str("</data></array>");
        }
        XmlValue::Struct(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                out.push_str("<member><name>");
                out.push_str(&escape_str_pcdata(name));
                out.push_str("</name>");
                write_value(out, member);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
}

// ── Decoding ────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Node {
    name: String,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

fn parse_tree(body: &[u8]) -> Result<Node, RpcError> {
    let mut stack: Vec<Node> = Vec::new();
    let mut root = None;

    for event in EventReader::new(body) {
        match event? {
            XmlEvent::StartElement { name, .. } => stack.push(Node {
                name: name.local_name,
                ..Node::default()
            }),
            XmlEvent::Characters(text) | XmlEvent::CData(text) | XmlEvent::Whitespace(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            XmlEvent::EndElement { .. } => {
                let node = stack
                    .pop()
                    .ok_or_else(|| RpcError::malformed("unbalanced end tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }
            _ => {}
        }
    }

    root.ok_or_else(|| RpcError::malformed("empty document"))
}

fn decode_value(node: &Node) -> Result<XmlValue, RpcError> {
    // An untyped <value> is a string.
    let Some(typed) = node.children.first() else {
        return Ok(XmlValue::String(node.text.clone()));
    };

    let text = typed.text.trim();
    match typed.name.as_str() {
        "int" | "i4" | "i8" | "i2" | "i1" => text
            .parse::<i64>()
            .map(XmlValue::Int)
            .map_err(|_| RpcError::malformed(format!("invalid integer {text:?}"))),
        "boolean" => match text {
            "1" => Ok(XmlValue::Bool(true)),
            "0" => Ok(XmlValue::Bool(false)),
            other => Err(RpcError::malformed(format!("invalid boolean {other:?}"))),
        },
        "double" => text
            .parse::<f64>()
            .map(XmlValue::Double)
            .map_err(|_| RpcError::malformed(format!("invalid double {text:?}"))),
        "string" => Ok(XmlValue::String(typed.text.clone())),
        "nil" => Ok(XmlValue::Nil),
        "base64" | "dateTime.iso8601" => Ok(XmlValue::String(text.to_string())),
        "array" => {
            let Some(data) = typed.child("data") else {
                return Ok(XmlValue::Array(Vec::new()));
            };
            data.children_named("value")
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()
                .map(XmlValue::Array)
        }
        "struct" => {
            let mut members = Vec::new();
            for member in typed.children_named("member") {
                let name = member
                    .child("name")
                    .ok_or_else(|| RpcError::malformed("struct member without <name>"))?;
                let value = member
                    .child("value")
                    .ok_or_else(|| RpcError::malformed("struct member without <value>"))?;
                members.push((name.text.trim().to_string(), decode_value(value)?));
            }
            Ok(XmlValue::Struct(members))
        }
        other => Err(RpcError::malformed(format!("unsupported value type <{other}>"))),
    }
}

/// Parse a `methodResponse` document. A `<fault>` becomes `RpcError::Fault`.
pub fn decode_response(body: &[u8]) -> Result<XmlValue, RpcError> {
    let root = parse_tree(body)?;
    if root.name != "methodResponse" {
        return Err(RpcError::malformed(format!(
            "expected <methodResponse>, got <{}>",
            root.name
        )));
    }

    if let Some(fault) = root.child("fault") {
        let detail = fault
            .child("value")
            .map(decode_value)
            .transpose()?
            .unwrap_or(XmlValue::Nil);
        let code = detail.member("faultCode").and_then(XmlValue::as_i64).unwrap_or(0);
        let message = detail
            .member("faultString")
            .map(ToString::to_string)
            .unwrap_or_default();
        return Err(RpcError::Fault { code, message });
    }

    let value = root
        .child("params")
        .and_then(|p| p.child("param"))
        .and_then(|p| p.child("value"))
        .ok_or_else(|| RpcError::malformed("missing params/param/value"))?;
    decode_value(value)
}
