//! PyMOL tool surface exposed over MCP.
//!
//! - `registry`: the fixed tool list and its JSON Schemas.
//! - `dispatch`: argument validation and forwarding to PyMOL.
//! - `selection_info`: the chain/residue summary composite.

pub mod dispatch;
pub mod registry;
pub mod selection_info;

pub use dispatch::{PDB_DISPLAY_LIMIT, ToolDispatcher};
pub use registry::{ParamKind, ParamSpec, Tool, ToolDescriptor, list_tools};
