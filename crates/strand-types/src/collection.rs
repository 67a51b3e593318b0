//! Collection schemas and index metadata.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Name of the collection every canonical thread must contain.
pub const FILES_COLLECTION: &str = "files";

/// A JSON schema handed verbatim to the database service on collection creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionSchema(serde_json::Value);

impl CollectionSchema {
    pub fn new(schema: serde_json::Value) -> Self {
        Self(schema)
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    /// Schema of the [`FILES_COLLECTION`]: one document per file the user
    /// has pushed to the storage network.
    pub fn files() -> Self {
        Self(json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "$id": "https://strand.dev/schemas/file.json",
            "title": "File",
            "type": "object",
            "required": ["_id", "name", "cid", "size", "owner", "createdAt"],
            "properties": {
                "_id": { "type": "string" },
                "name": { "type": "string" },
                "cid": {
                    "type": "string",
                    "description": "Content identifier on the storage network"
                },
                "size": { "type": "integer", "minimum": 0 },
                "mimeType": { "type": "string" },
                "owner": {
                    "type": "string",
                    "description": "Wallet address of the uploader"
                },
                "encrypted": { "type": "boolean", "default": false },
                "createdAt": { "type": "integer" }
            }
        }))
    }
}

/// One index reported by the service for a collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub path: String,
    #[serde(default)]
    pub unique: bool,
}
