//! Request bodies.
//!
//! Missing fields decode as empty strings so they fail validation with a
//! field-specific message instead of a generic decode error.

use serde::Deserialize;

use crate::model::{FieldError, Record};

/// Body of `POST /data`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub value: String,
}

impl CreateRecord {
    pub fn into_record(self) -> Result<Record, FieldError> {
        let record = Record::new(self.id, self.value);
        record.validate()?;
        Ok(record)
    }
}

/// Body of `PUT /data/{id}`; the id comes from the path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRecord {
    #[serde(default)]
    pub value: String,
}

impl UpdateRecord {
    pub fn into_record(self, id: String) -> Result<Record, FieldError> {
        let record = Record::new(id, self.value);
        record.validate()?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_fail_validation() {
        let payload: CreateRecord = serde_json::from_str(r#"{"id": "1"}"#).unwrap();
        assert_eq!(payload.into_record(), Err(FieldError::MissingValue));

        let payload: UpdateRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(payload.into_record("1".into()), Err(FieldError::MissingValue));
    }

    #[test]
    fn test_update_takes_path_id() {
        let payload: UpdateRecord =
            serde_json::from_str(r#"{"id": "ignored", "value": "b"}"#).unwrap();
        assert_eq!(payload.into_record("1".into()), Ok(Record::new("1", "b")));
    }
}
