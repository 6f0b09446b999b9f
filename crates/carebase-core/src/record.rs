use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FieldError;

/// Store-assigned record identifier.
pub type RecordId = i64;

/// A persisted record as returned by the stores and the HTTP surface.
///
/// Optional fields serialize as `null` rather than being omitted, so clients
/// always see the full shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub id: RecordId,
    pub name: String,
    pub age: Option<i32>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Fields of a record that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRecord {
    pub name: String,
    pub age: Option<i32>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Wire shape of a create payload. `name` stays optional here so that a
/// missing name is reported as a field error instead of a serde message.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreatePayload {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    age: Option<i32>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    phone: Option<String>,
}

impl NewRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age: None,
            address: None,
            phone: None,
        }
    }

    #[must_use]
    pub fn with_age(mut self, age: i32) -> Self {
        self.age = Some(age);
        self
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Decodes and validates a create payload.
    ///
    /// Rejects non-object bodies, unknown fields, wrong JSON types, a missing
    /// or blank `name` and a negative `age`.
    pub fn from_json(payload: Value) -> Result<Self, FieldError> {
        if !payload.is_object() {
            return Err(FieldError::payload("expected a JSON object"));
        }

        let raw: CreatePayload = serde_json::from_value(payload)?;
        let record = Self {
            name: raw
                .name
                .ok_or_else(|| FieldError::field("name", "is required"))?,
            age: raw.age,
            address: raw.address,
            phone: raw.phone,
        };
        record.validate()?;
        Ok(record)
    }

    /// Checks the record invariants. Every store calls this before writing.
    pub fn validate(&self) -> Result<(), FieldError> {
        if self.name.trim().is_empty() {
            return Err(FieldError::field("name", "must not be blank"));
        }
        if let Some(age) = self.age
            && age < 0
        {
            return Err(FieldError::field("age", "must be non-negative"));
        }
        Ok(())
    }

    /// Attaches the store-assigned id.
    pub fn into_record(self, id: RecordId) -> ResourceRecord {
        ResourceRecord {
            id,
            name: self.name,
            age: self.age,
            address: self.address,
            phone: self.phone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_minimal() {
        let record = NewRecord::from_json(json!({"name": "Ada"})).unwrap();
        assert_eq!(record, NewRecord::new("Ada"));
    }

    #[test]
    fn test_from_json_all_fields() {
        let record = NewRecord::from_json(json!({
            "name": "Ada",
            "age": 30,
            "address": "12 Analytical St",
            "phone": "555-0100"
        }))
        .unwrap();
        assert_eq!(record.age, Some(30));
        assert_eq!(record.address.as_deref(), Some("12 Analytical St"));
        assert_eq!(record.phone.as_deref(), Some("555-0100"));
    }

    #[test]
    fn test_explicit_nulls_are_absent() {
        let record =
            NewRecord::from_json(json!({"name": "Ada", "age": null, "phone": null})).unwrap();
        assert_eq!(record.age, None);
        assert_eq!(record.phone, None);
    }

    #[test]
    fn test_missing_name_rejected() {
        let err = NewRecord::from_json(json!({"age": 30})).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("name"));
    }

    #[test]
    fn test_null_name_rejected() {
        let err = NewRecord::from_json(json!({"name": null})).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("name"));
    }

    #[test]
    fn test_blank_name_rejected() {
        let err = NewRecord::from_json(json!({"name": "   "})).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("name"));
    }

    #[test]
    fn test_negative_age_rejected() {
        let err = NewRecord::from_json(json!({"name": "Ada", "age": -1})).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("age"));
    }

    #[test]
    fn test_wrong_types_rejected() {
        assert!(NewRecord::from_json(json!({"name": 42})).is_err());
        assert!(NewRecord::from_json(json!({"name": "Ada", "age": "30"})).is_err());
        assert!(NewRecord::from_json(json!({"name": "Ada", "age": 30.5})).is_err());
        assert!(NewRecord::from_json(json!({"name": "Ada", "phone": 5550100})).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = NewRecord::from_json(json!({"name": "Ada", "id": 7})).unwrap_err();
        assert!(err.message.contains("unknown field"));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(NewRecord::from_json(json!(["Ada"])).is_err());
        assert!(NewRecord::from_json(json!("Ada")).is_err());
    }

    #[test]
    fn test_record_serializes_nulls() {
        let record = NewRecord::new("Ada").with_age(30).into_record(1);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({"id": 1, "name": "Ada", "age": 30, "address": null, "phone": null})
        );
    }
}
