//! Record schema registry
//!
//! Static JSON Schema (draft-07) documents, one per stream. Optional fields
//! are `["null", "<type>"]` unions; mandatory ones are listed in `required`.

use crate::error::{ConnectorError, Result};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// JSON Schema dialect of every document
pub const SCHEMA_DIALECT: &str = "http://json-schema.org/draft-07/schema#";

/// Built-in schemas for the Factorial streams
pub static REGISTRY: LazyLock<SchemaRegistry> = LazyLock::new(SchemaRegistry::builtin);

/// Stream name to schema document
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Value>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the `customers`, `employees`, and `fac` schemas
    pub fn builtin() -> Self {
        Self::new()
            .with_schema("customers", customers_schema())
            .with_schema("employees", employees_schema())
            .with_schema("fac", fac_schema())
    }

    pub fn with_schema(mut self, stream: impl Into<String>, schema: Value) -> Self {
        self.schemas.insert(stream.into(), schema);
        self
    }

    pub fn get(&self, stream: &str) -> Option<&Value> {
        self.schemas.get(stream)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(|s| s.as_str())
    }

    /// Check every document; the first inconsistency is returned
    pub fn validate(&self) -> Result<()> {
        self.schemas
            .iter()
            .try_for_each(|(stream, schema)| validate_document(stream, schema))
    }
}

/// Check that a document is an object schema whose `required` names are all
/// declared in `properties`
pub fn validate_document(stream: &str, schema: &Value) -> Result<()> {
    if schema.get("type").and_then(Value::as_str) != Some("object") {
        return Err(ConnectorError::Schema(format!(
            "schema for '{stream}' must have type \"object\""
        )));
    }
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .ok_or_else(|| ConnectorError::Schema(format!("schema for '{stream}' has no properties")))?;

    let Some(required) = schema.get("required") else {
        return Ok(());
    };
    let required = required.as_array().ok_or_else(|| {
        ConnectorError::Schema(format!("schema for '{stream}' has a non-array `required`"))
    })?;
    for name in required {
        let name = name.as_str().ok_or_else(|| {
            ConnectorError::Schema(format!("schema for '{stream}' has a non-string required entry"))
        })?;
        if !properties.contains_key(name) {
            return Err(ConnectorError::Schema(format!(
                "schema for '{stream}' requires undeclared property '{name}'"
            )));
        }
    }
    Ok(())
}

fn customers_schema() -> Value {
    json!({
        "$schema": SCHEMA_DIALECT,
        "type": "object",
        "properties": {
            "customer_id": {"type": "integer"},
            "name": {"type": "string"},
            "legal_name": {"type": ["null", "string"]},
            "tax_id": {"type": ["null", "string"]},
            "email": {"type": ["null", "string"], "format": "email"},
            "phone_number": {"type": ["null", "string"]},
            "country": {"type": ["null", "string"]},
            "city": {"type": ["null", "string"]},
            "address_line_1": {"type": ["null", "string"]},
            "created_at": {"type": ["null", "string"], "format": "date-time"},
            "updated_at": {"type": ["null", "string"], "format": "date-time"}
        },
        "required": ["customer_id", "name"]
    })
}

fn employees_schema() -> Value {
    json!({
        "$schema": SCHEMA_DIALECT,
        "type": "object",
        "properties": {
            "employee_id": {"type": "integer"},
            "start_date": {"type": ["null", "string"], "format": "date"},
            "id": {"type": ["null", "string"]},
            "first_name": {"type": ["null", "string"]},
            "last_name": {"type": ["null", "string"]},
            "full_name": {"type": ["null", "string"]},
            "email": {"type": ["null", "string"]},
            "birthday_on": {"type": ["null", "string"], "format": "date"},
            "terminated_on": {"type": ["null", "string"], "format": "date"},
            "termination_reason": {"type": ["null", "string"]},
            "termination_reason_type": {"type": ["null", "string"]},
            "termination_observations": {"type": ["null", "string"]},
            "termination_type_description": {"type": ["null", "string"]},
            "identifier": {"type": ["null", "string"]},
            "identifier_type": {"type": ["null", "string"]},
            "gender": {"type": ["null", "string"]},
            "nationality": {"type": ["null", "string"]},
            "bank_number": {"type": ["null", "string"]},
            "swift_bic": {"type": ["null", "string"]},
            "bank_number_format": {"type": ["null", "string"]},
            "country": {"type": ["null", "string"]},
            "city": {"type": ["null", "string"]},
            "state": {"type": ["null", "string"]},
            "postal_code": {"type": ["null", "string"]},
            "address_line_1": {"type": ["null", "string"]},
            "address_line_2": {"type": ["null", "string"]},
            "company_id": {"type": ["null", "integer"]},
            "legal_entity_id": {"type": ["null", "integer"]},
            "created_at": {"type": ["null", "string"], "format": "date-time"},
            "updated_at": {"type": ["null", "string"], "format": "date-time"},
            "manager_id": {"type": ["null", "integer"]},
            "location_id": {"type": ["null", "integer"]},
            "timeoff_manager_id": {"type": ["null", "integer"]},
            "social_security_number": {"type": ["null", "string"]},
            "tax_id": {"type": ["null", "string"]},
            "timeoff_policy_id": {"type": ["null", "integer"]},
            "team_ids": {"type": ["null", "array"], "items": {"type": "integer"}},
            "phone_number": {"type": ["null", "string"]},
            "company_identifier": {"type": ["null", "string"]},
            "contact_name": {"type": ["null", "string"]},
            "contact_number": {"type": ["null", "string"]}
        },
        "required": ["employee_id"]
    })
}

fn fac_schema() -> Value {
    json!({
        "$schema": SCHEMA_DIALECT,
        "type": "object",
        "properties": {
            "id": {"type": "integer"},
            "first_name": {"type": "string"},
            "last_name": {"type": "string"},
            "full_name": {"type": "string"},
            "email": {"type": "string", "format": "email"},
            "birthday_on": {"type": "string", "format": "date"},
            "terminated_on": {"type": ["null", "string"], "format": "date"},
            "termination_reason": {"type": ["null", "string"]},
            "termination_reason_type": {"type": ["null", "string"]},
            "termination_observations": {"type": ["null", "string"]},
            "termination_type_description": {"type": ["null", "string"]},
            "identifier": {"type": "string"},
            "identifier_type": {"type": "string"},
            "gender": {"type": "string"},
            "nationality": {"type": "string"},
            "bank_number": {"type": "string"},
            "swift_bic": {"type": "string"},
            "bank_number_format": {"type": ["null", "string"]},
            "country": {"type": "string"},
            "city": {"type": "string"},
            "state": {"type": "string"},
            "postal_code": {"type": "string"},
            "address_line_1": {"type": "string"},
            "address_line_2": {"type": ["null", "string"]},
            "company_id": {"type": "integer"},
            "legal_entity_id": {"type": "integer"},
            "created_at": {"type": "string", "format": "date-time"},
            "updated_at": {"type": "string", "format": "date-time"},
            "manager_id": {"type": "integer"},
            "location_id": {"type": "integer"},
            "timeoff_manager_id": {"type": ["null", "integer"]},
            "social_security_number": {"type": ["null", "string"]},
            "tax_id": {"type": ["null", "string"]},
            "timeoff_policy_id": {"type": "integer"},
            "team_ids": {"type": "array", "items": {"type": "integer"}},
            "phone_number": {"type": "string"},
            "company_identifier": {"type": "string"},
            "contact_name": {"type": ["null", "string"]},
            "contact_number": {"type": ["null", "string"]}
        },
        "required": [
            "id", "first_name", "last_name", "full_name", "email", "birthday_on",
            "identifier", "identifier_type", "gender", "nationality", "bank_number",
            "swift_bic", "country", "city", "state", "postal_code", "address_line_1",
            "company_id", "legal_entity_id", "created_at", "updated_at", "manager_id",
            "location_id", "timeoff_policy_id", "team_ids", "phone_number", "company_identifier"
        ]
    })
}
