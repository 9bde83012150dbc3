//! Plain integer schema for unsigned MCP output fields.

use schemars::{Schema, SchemaGenerator, json_schema};

/// `{"type": "integer", "minimum": 0}`, without schemars' `uint16`/`uint` formats.
pub fn uint(_generator: &mut SchemaGenerator) -> Schema {
    json_schema!({ "type": "integer", "minimum": 0 })
}
