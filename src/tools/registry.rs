//! Static registry of the tools published to MCP clients.
//!
//! Every tool is a [`Tool`] variant. `name()`, `descriptor()` and the
//! dispatcher all match on the enum exhaustively, so a tool cannot be listed
//! without a dispatch branch or dispatched without being listed.
//! [`Tool::ALL`] fixes the listing order.

use serde_json::{json, Map, Value};

// ── Tool set ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Load,
    Fetch,
    Save,
    Show,
    Hide,
    Color,
    BgColor,
    Zoom,
    Orient,
    Rotate,
    Reset,
    Select,
    Delete,
    GetNames,
    CountAtoms,
    GetPdb,
    GetSelectionInfo,
    Ray,
    Draw,
    Png,
    Do,
}

impl Tool {
    /// Declaration order; clients may display tools in this order.
    pub const ALL: [Tool; 21] = [
        Tool::Load,
        Tool::Fetch,
        Tool::Save,
        Tool::Show,
        Tool::Hide,
        Tool::Color,
        Tool::BgColor,
        Tool::Zoom,
        Tool::Orient,
        Tool::Rotate,
        Tool::Reset,
        Tool::Select,
        Tool::Delete,
        Tool::GetNames,
        Tool::CountAtoms,
        Tool::GetPdb,
        Tool::GetSelectionInfo,
        Tool::Ray,
        Tool::Draw,
        Tool::Png,
        Tool::Do,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tool::Load => "pymol_load",
            Tool::Fetch => "pymol_fetch",
            Tool::Save => "pymol_save",
            Tool::Show => "pymol_show",
            Tool::Hide => "pymol_hide",
            Tool::Color => "pymol_color",
            Tool::BgColor => "pymol_bg_color",
            Tool::Zoom => "pymol_zoom",
            Tool::Orient => "pymol_orient",
            Tool::Rotate => "pymol_rotate",
            Tool::Reset => "pymol_reset",
            Tool::Select => "pymol_select",
            Tool::Delete => "pymol_delete",
            Tool::GetNames => "pymol_get_names",
            Tool::CountAtoms => "pymol_count_atoms",
            Tool::GetPdb => "pymol_get_pdb",
            Tool::GetSelectionInfo => "pymol_get_selection_info",
            Tool::Ray => "pymol_ray",
            Tool::Draw => "pymol_draw",
            Tool::Png => "pymol_png",
            Tool::Do => "pymol_do",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        Tool::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn descriptor(self) -> ToolDescriptor {
        use ParamKind::{Boolean, Integer, Number, Str};

        let (description, params) = match self {
            Tool::Load => (
                "Load a molecular structure from a file into PyMOL",
                vec![
                    param("filename", Str, "Path of the file to load (pdb, mol, cif, ...)").required(),
                    param("object_name", Str, "Object name (optional, defaults to the file name)"),
                    param("format", Str, "File format (optional, auto-detected)"),
                ],
            ),
            Tool::Fetch => (
                "Fetch a structure from the PDB",
                vec![
                    param("code", Str, "PDB code (e.g. 1abc)").required(),
                    param("name", Str, "Object name (optional)"),
                ],
            ),
            Tool::Save => (
                "Save the current structure to a file",
                vec![
                    param("filename", Str, "Destination file path").required(),
                    param("selection", Str, "Selection expression (default: all)"),
                    param("format", Str, "File format (optional)"),
                ],
            ),
            Tool::Show => (
                "Show a molecular representation",
                vec![
                    param(
                        "representation",
                        Str,
                        "Representation: lines, sticks, spheres, surface, mesh, cartoon, ribbon, dots",
                    )
                    .required()
                    .choices(REPRESENTATIONS),
                    param("selection", Str, "Selection expression (default: all)"),
                ],
            ),
            Tool::Hide => (
                "Hide a molecular representation",
                vec![
                    param("representation", Str, "Representation (default: all)"),
                    param("selection", Str, "Selection expression (default: all)"),
                ],
            ),
            Tool::Color => (
                "Set the color of atoms or objects",
                vec![
                    param("color", Str, "Color name or value (red, blue, green, rainbow, cpk, ...)")
                        .required(),
                    param("selection", Str, "Selection expression (default: all)"),
                ],
            ),
            Tool::BgColor => (
                "Set the background color",
                vec![param("color", Str, "Color name (white, black, gray, ...)").required()],
            ),
            Tool::Zoom => (
                "Zoom the camera onto a selection",
                vec![
                    param("selection", Str, "Selection expression (default: all)"),
                    param("buffer", Number, "Extra space around the selection in Angstrom"),
                ],
            ),
            Tool::Orient => (
                "Orient the view onto a selection",
                vec![param("selection", Str, "Selection expression (default: all)")],
            ),
            Tool::Rotate => (
                "Rotate the view, or the atoms of a selection",
                vec![
                    param("axis", Str, "Rotation axis: x, y, z").required().choices(&["x", "y", "z"]),
                    param("angle", Number, "Rotation angle in degrees").required(),
                    param(
                        "selection",
                        Str,
                        "Selection expression (default empty, which rotates the view)",
                    ),
                ],
            ),
            Tool::Reset => ("Reset the view", vec![]),
            Tool::Select => (
                "Create a named selection",
                vec![
                    param("name", Str, "Selection name").required(),
                    param("expression", Str, "Selection expression (e.g. chain A, resi 1-100, name CA)")
                        .required(),
                ],
            ),
            Tool::Delete => (
                "Delete an object or selection",
                vec![param("name", Str, "Object or selection name").required()],
            ),
            Tool::GetNames => (
                "List object names",
                vec![
                    param("type", Str, "Kind of names: objects, selections, all")
                        .choices(&["objects", "selections", "all"]),
                ],
            ),
            Tool::CountAtoms => (
                "Count the atoms in a selection",
                vec![param("selection", Str, "Selection expression (default: all)")],
            ),
            Tool::GetPdb => (
                "Get a selection as PDB-format text",
                vec![param("selection", Str, "Selection expression (default: all)")],
            ),
            Tool::GetSelectionInfo => (
                "Report the chains and residue ranges contained in a selection",
                vec![param("selection", Str, "Selection expression (default: 'sele')")],
            ),
            Tool::Ray => (
                "Ray-trace the current scene",
                vec![
                    param("width", Integer, "Width in pixels"),
                    param("height", Integer, "Height in pixels"),
                ],
            ),
            Tool::Draw => (
                "Render the current view with OpenGL",
                vec![
                    param("width", Integer, "Width in pixels"),
                    param("height", Integer, "Height in pixels"),
                ],
            ),
            Tool::Png => (
                "Save the current view as a PNG image",
                vec![
                    param("filename", Str, "PNG file path").required(),
                    param("width", Integer, "Width in pixels"),
                    param("height", Integer, "Height in pixels"),
                    param("dpi", Integer, "Dots per inch"),
                    param("ray", Boolean, "Ray-trace before saving"),
                ],
            ),
            Tool::Do => (
                DO_DESCRIPTION,
                vec![
                    param(
                        "command",
                        Str,
                        "PyMOL command text in full command-line syntax. May be a single command or \
                         several separated by semicolons, e.g. \
                         'remove solvent; color marine, chain A; show sticks, organic'",
                    )
                    .required(),
                ],
            ),
        };

        ToolDescriptor {
            name: self.name(),
            description,
            params,
        }
    }
}

/// Full descriptor list in declaration order.
pub fn list_tools() -> Vec<ToolDescriptor> {
    Tool::ALL.into_iter().map(Tool::descriptor).collect()
}

const REPRESENTATIONS: &[&str] = &[
    "lines",
    "sticks",
    "spheres",
    "surface",
    "mesh",
    "cartoon",
    "ribbon",
    "dots",
    "nonbonded",
    "nb_spheres",
];

const DO_DESCRIPTION: &str = "\
Run any PyMOL command, like cmd.do(). Accepts the full PyMOL command-line language.
Common command families:
[Files]
- load <file> [, <object>] [, <state>]
- save <file> [, <selection>] [, <state>] [, <format>]
- fetch <code> [, <name>] [, <state>]
- delete <name>
- create <name>, <selection> [, <source_state>] [, <target_state>]
[Display]
- show / hide / as <representation> [, <selection>]
- representations: lines, sticks, spheres, surface, mesh, cartoon, ribbon, dots, nonbonded, nb_spheres
[Color]
- color <color> [, <selection>]
- bg_color <color>
- util.cbc (color by chain), util.chainbow, util.rainbow, util.ss
[Presets]
- preset.simple / preset.ball_and_stick / preset.ligands / preset.pretty
- preset.publication / preset.technical / preset.b_factor_putty <selection>
[View]
- zoom <selection> [, <buffer>], orient <selection>, center <selection>, reset
- turn <axis>, <angle>; move <axis>, <distance>; rock [<frames>]
[Selections]
- select <name>, <selection>; deselect; enable <name>; disable <name>
[Rendering]
- ray [<width>], [<height>]; draw [<width>], [<height>]
- png <filename> [, <width>], [<height>], [<dpi>], [<ray>]; mpng <prefix> [, <first>], [<last>]
- scene <name>, <action>; view <name>, <action>; mset <frames>; mplay; mstop
[Editing]
- remove <selection>; extract <name>, <selection>; h_add / h_remove <selection>
- alter <selection>, <expression>; iterate <selection>, <expression>
[Analysis]
- distance <name>, <s1>, <s2>; angle <name>, <s1>, <s2>, <s3>; dihedral <name>, <s1>, <s2>, <s3>, <s4>
- rms / align / super <mobile>, <target>; centerofmass <selection>; get_area <selection>
[Settings]
- set <setting>, <value> [, <selection>]; cartoon <type>; set_bond ...; set_view (...)
[Selection syntax]
- all, chain A, resi 1-100, resn ALA, name CA, elem C, organic, hetatm, solvent
- (chain A and resi 50-100), (all within 5 of resi 100)
Examples: \"remove solvent\", \"color marine, chain A\", \"show sticks, organic\", \"ray 2400, 2400\"";

// ── Descriptors ─────────────────────────────────────────────────────────────

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Str,
    Number,
    Integer,
    Boolean,
}

impl ParamKind {
    pub fn json_type(self) -> &'static str {
        match self {
            ParamKind::Str => "string",
            ParamKind::Number => "number",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    pub required: bool,
    pub choices: &'static [&'static str],
}

impl ParamSpec {
    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn choices(mut self, choices: &'static [&'static str]) -> Self {
        self.choices = choices;
        self
    }
}

fn param(name: &'static str, kind: ParamKind, description: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        description,
        required: false,
        choices: &[],
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
}

impl ToolDescriptor {
    /// JSON Schema for the tool's arguments. Properties keep declaration order.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for p in &self.params {
            let mut prop = json!({
                "type": p.kind.json_type(),
                "description": p.description,
            });
            if !p.choices.is_empty() {
                prop["enum"] = json!(p.choices);
            }
            properties.insert(p.name.to_string(), prop);
        }

        let required: Vec<&str> = self.params.iter().filter(|p| p.required).map(|p| p.name).collect();

        let mut schema = json!({
            "type": "object",
            "properties": properties,
        });
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        schema
    }

    /// The MCP `Tool` object returned by `tools/list`.
    pub fn to_mcp(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema(),
        })
    }
}
