//! Tool dispatcher: validates arguments, forwards to PyMOL, formats text.
//!
//! `dispatch` never fails. Missing connections, bad arguments and remote
//! faults all come back as a single error content item so the calling agent
//! can read them in-band.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::registry::Tool;
use super::selection_info::selection_info;
use crate::error::BridgeError;
use crate::models::ToolResult;
use crate::pymol::{PymolConnection, XmlValue};

/// `pymol_get_pdb` output is cut to this many characters.
pub const PDB_DISPLAY_LIMIT: usize = 2000;

// ── Arguments ───────────────────────────────────────────────────────────────

/// Typed view over a `tools/call` arguments object. A missing or `null`
/// argument counts as absent.
struct Args<'a> {
    map: Option<&'a Map<String, Value>>,
}

impl<'a> Args<'a> {
    fn new(arguments: &'a Value) -> Self {
        Self {
            map: arguments.as_object(),
        }
    }

    fn get(&self, name: &str) -> Option<&'a Value> {
        self.map.and_then(|m| m.get(name)).filter(|v| !v.is_null())
    }

    fn missing(name: &str) -> BridgeError {
        BridgeError::validation(format!("missing required argument: {name}"))
    }

    fn wrong_type(name: &str, expected: &str) -> BridgeError {
        BridgeError::validation(format!("argument '{name}' must be {expected}"))
    }

    fn opt_str(&self, name: &str) -> Result<Option<&'a str>, BridgeError> {
        match self.get(name) {
            None => Ok(None),
            Some(v) => v.as_str().map(Some).ok_or_else(|| Self::wrong_type(name, "a string")),
        }
    }

    fn str(&self, name: &str) -> Result<&'a str, BridgeError> {
        self.opt_str(name)?.ok_or_else(|| Self::missing(name))
    }

    fn str_or(&self, name: &str, default: &'a str) -> Result<&'a str, BridgeError> {
        Ok(self.opt_str(name)?.unwrap_or(default))
    }

    fn opt_f64(&self, name: &str) -> Result<Option<f64>, BridgeError> {
        match self.get(name) {
            None => Ok(None),
            Some(v) => v.as_f64().map(Some).ok_or_else(|| Self::wrong_type(name, "a number")),
        }
    }

    fn f64(&self, name: &str) -> Result<f64, BridgeError> {
        self.opt_f64(name)?.ok_or_else(|| Self::missing(name))
    }

    fn f64_or(&self, name: &str, default: f64) -> Result<f64, BridgeError> {
        Ok(self.opt_f64(name)?.unwrap_or(default))
    }

    /// Integers may arrive as integral floats (`800.0`).
    fn i64_or(&self, name: &str, default: i64) -> Result<i64, BridgeError> {
        let Some(v) = self.get(name) else {
            return Ok(default);
        };
        if let Some(i) = v.as_i64() {
            return Ok(i);
        }
        match v.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
            _ => Err(Self::wrong_type(name, "an integer")),
        }
    }

    fn bool_or(&self, name: &str, default: bool) -> Result<bool, BridgeError> {
        match self.get(name) {
            None => Ok(default),
            Some(v) => v.as_bool().ok_or_else(|| Self::wrong_type(name, "a boolean")),
        }
    }
}

// ── Shared remote helpers ───────────────────────────────────────────────────

pub(crate) async fn count_atoms(conn: &PymolConnection, selection: &str) -> Result<i64, BridgeError> {
    let value = conn.invoke("count_atoms", &[XmlValue::from(selection)]).await?;
    value.as_i64().ok_or_else(|| {
        BridgeError::unexpected_reply("count_atoms", format!("expected an integer, got {value}"))
    })
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn join_names(value: &XmlValue) -> String {
    match value {
        XmlValue::Array(items) => items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        XmlValue::Nil => String::new(),
        other => other.to_string(),
    }
}

// ── Dispatcher ──────────────────────────────────────────────────────────────

/// Routes tool invocations to PyMOL through a shared connection.
#[derive(Clone)]
pub struct ToolDispatcher {
    connection: Arc<PymolConnection>,
}

impl ToolDispatcher {
    pub fn new(connection: Arc<PymolConnection>) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &Arc<PymolConnection> {
        &self.connection
    }

    /// Invoke `name` with `arguments`. Always returns a non-empty result.
    pub async fn dispatch(&self, name: &str, arguments: &Value) -> ToolResult {
        if !self.connection.is_connected() {
            return ToolResult::error(format!("Error: {}", BridgeError::NotConnected));
        }

        let Some(tool) = Tool::from_name(name) else {
            tracing::warn!(tool = %name, "unknown tool requested");
            return ToolResult::error(format!("Unknown tool: {name}"));
        };

        match self.run(tool, &Args::new(arguments)).await {
            Ok(text) => ToolResult::text(text),
            Err(e) => {
                tracing::warn!(tool = %name, "tool call failed: {}", e);
                ToolResult::error(format!("Error: {e}"))
            }
        }
    }

    async fn run(&self, tool: Tool, args: &Args<'_>) -> Result<String, BridgeError> {
        let conn = self.connection.as_ref();

        match tool {
            Tool::Load => {
                let filename = args.str("filename")?;
                let object = args.str_or("object_name", "")?;
                let format = args.str_or("format", "")?;
                let result = conn
                    .invoke(
                        "load",
                        &[filename.into(), object.into(), XmlValue::Int(0), format.into()],
                    )
                    .await?;
                Ok(format!("Loaded file: {filename}, object name: {result}"))
            }
            Tool::Fetch => {
                let code = args.str("code")?;
                let name = args.str_or("name", "")?;
                conn.invoke("fetch", &[code.into(), name.into()]).await?;
                Ok(format!("Fetched from PDB: {code}"))
            }
            Tool::Save => {
                let filename = args.str("filename")?;
                let selection = args.str_or("selection", "(all)")?;
                let format = args.str_or("format", "")?;
                conn.invoke(
                    "save",
                    &[filename.into(), selection.into(), XmlValue::Int(-1), format.into()],
                )
                .await?;
                Ok(format!("Saved to: {filename}"))
            }
            Tool::Show => {
                let rep = args.str("representation")?;
                let selection = args.str_or("selection", "all")?;
                conn.invoke("show", &[rep.into(), selection.into()]).await?;
                Ok(format!("Shown {rep} for {selection}"))
            }
            Tool::Hide => {
                let rep = args.str_or("representation", "all")?;
                let selection = args.str_or("selection", "all")?;
                conn.invoke("hide", &[rep.into(), selection.into()]).await?;
                Ok(format!("Hidden {rep} for {selection}"))
            }
            Tool::Color => {
                let color = args.str("color")?;
                let selection = args.str_or("selection", "all")?;
                conn.invoke("color", &[color.into(), selection.into()]).await?;
                Ok(format!("Colored {selection} {color}"))
            }
            Tool::BgColor => {
                let color = args.str("color")?;
                conn.invoke("bg_color", &[color.into()]).await?;
                Ok(format!("Background color set to: {color}"))
            }
            Tool::Zoom => {
                let selection = args.str_or("selection", "all")?;
                let buffer = args.f64_or("buffer", 0.0)?;
                conn.invoke("zoom", &[selection.into(), buffer.into()]).await?;
                Ok(format!("Zoomed to: {selection}"))
            }
            Tool::Orient => {
                let selection = args.str_or("selection", "all")?;
                conn.invoke("orient", &[selection.into()]).await?;
                Ok(format!("Oriented to: {selection}"))
            }
            Tool::Rotate => {
                let axis = args.str("axis")?;
                let angle = args.f64("angle")?;
                let selection = args.str_or("selection", "")?;
                if selection.is_empty() {
                    conn.invoke("turn", &[axis.into(), angle.into()]).await?;
                    Ok(format!("Rotated view about {axis} axis by {angle} degrees"))
                } else {
                    conn.invoke("rotate", &[axis.into(), angle.into(), selection.into()])
                        .await?;
                    Ok(format!("Rotated {selection} about {axis} axis by {angle} degrees"))
                }
            }
            Tool::Reset => {
                conn.invoke("reset", &[]).await?;
                Ok("View reset".to_string())
            }
            Tool::Select => {
                let name = args.str("name")?;
                let expression = args.str("expression")?;
                conn.invoke("select", &[name.into(), expression.into()]).await?;
                Ok(format!("Created selection '{name}': {expression}"))
            }
            Tool::Delete => {
                let name = args.str("name")?;
                conn.invoke("delete", &[name.into()]).await?;
                Ok(format!("Deleted: {name}"))
            }
            Tool::GetNames => {
                let kind = args.str_or("type", "objects")?;
                let names = conn.invoke("get_names", &[kind.into(), XmlValue::Int(1)]).await?;
                Ok(format!("{kind}: {}", join_names(&names)))
            }
            Tool::CountAtoms => {
                let selection = args.str_or("selection", "all")?;
                let count = count_atoms(conn, selection).await?;
                Ok(format!("Atom count in {selection}: {count}"))
            }
            Tool::GetPdb => {
                let selection = args.str_or("selection", "all")?;
                let pdb = conn.invoke("get_pdbstr", &[selection.into()]).await?;
                let text = pdb.to_string();
                Ok(format!(
                    "PDB format:\n```\n{}\n```",
                    truncate_chars(&text, PDB_DISPLAY_LIMIT)
                ))
            }
            Tool::GetSelectionInfo => {
                let selection = args.str_or("selection", "sele")?;
                selection_info(conn, selection).await
            }
            Tool::Ray => {
                let width = args.i64_or("width", 0)?;
                let height = args.i64_or("height", 0)?;
                conn.invoke("ray", &[width.into(), height.into()]).await?;
                Ok(format!("Ray traced ({width}x{height})"))
            }
            Tool::Draw => {
                let width = args.i64_or("width", 0)?;
                let height = args.i64_or("height", 0)?;
                conn.invoke("draw", &[width.into(), height.into()]).await?;
                Ok(format!("Drew view ({width}x{height})"))
            }
            Tool::Png => {
                let filename = args.str("filename")?;
                let width = args.i64_or("width", 0)?;
                let height = args.i64_or("height", 0)?;
                let dpi = args.i64_or("dpi", -1)?;
                let ray = args.bool_or("ray", false)?;
                conn.invoke(
                    "png",
                    &[
                        filename.into(),
                        width.into(),
                        height.into(),
                        dpi.into(),
                        XmlValue::Int(i64::from(ray)),
                    ],
                )
                .await?;
                Ok(format!("Saved PNG: {filename}"))
            }
            Tool::Do => {
                let command = args.str("command")?;
                let result = conn.invoke("do", &[command.into()]).await?;
                Ok(format!("Executed command: {command}\nResult: {result}"))
            }
        }
    }
}
