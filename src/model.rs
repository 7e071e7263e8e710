//! Record data model.
//!
//! A record is an `id`/`value` pair. Both fields are required and must be
//! non-empty; there is no versioning or soft-delete, a record is either
//! present in the store or absent.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single key/value record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Unique key within the store.
    pub id: String,

    /// Stored value.
    pub value: String,
}

/// A required record field was missing or empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("id is required")]
    MissingId,
    #[error("value is required")]
    MissingValue,
}

impl Record {
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }

    /// Check that both fields are present.
    pub fn validate(&self) -> Result<(), FieldError> {
        validate_id(&self.id)?;
        validate_value(&self.value)
    }
}

pub fn validate_id(id: &str) -> Result<(), FieldError> {
    if id.is_empty() {
        return Err(FieldError::MissingId);
    }
    Ok(())
}

pub fn validate_value(value: &str) -> Result<(), FieldError> {
    if value.is_empty() {
        return Err(FieldError::MissingValue);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert_eq!(Record::new("1", "a").validate(), Ok(()));
        assert_eq!(Record::new("", "a").validate(), Err(FieldError::MissingId));
        assert_eq!(Record::new("1", "").validate(), Err(FieldError::MissingValue));
        // id is checked first
        assert_eq!(Record::new("", "").validate(), Err(FieldError::MissingId));
    }

    #[test]
    fn test_wire_shape() {
        let record = Record::new("1", "a");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"id": "1", "value": "a"}));
    }
}
