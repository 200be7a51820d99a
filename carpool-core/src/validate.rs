use uuid::Uuid;
use crate::{CoreError, CoreResult};

/// Collects presence checks so a request reports every missing field at once.
#[derive(Debug, Default)]
pub struct Required {
    missing: Vec<&'static str>,
}

impl Required {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the trimmed value; blank or absent values are recorded as missing.
    pub fn take(&mut self, field: &'static str, value: Option<String>) -> String {
        match value.map(|v| v.trim().to_string()) {
            Some(v) if !v.is_empty() => v,
            _ => {
                self.missing.push(field);
                String::new()
            }
        }
    }

    pub fn finish(self) -> CoreResult<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::ValidationError(format!(
                "Missing required fields: {}",
                self.missing.join(", ")
            )))
        }
    }
}

/// Blank strings count as absent.
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses an entity identifier. Absent is a validation failure; an id that is not
/// a UUID cannot resolve to anything and is reported as `NotFound`.
pub fn parse_id(value: Option<String>, field: &'static str, entity: &'static str) -> CoreResult<Uuid> {
    let raw = optional(value)
        .ok_or_else(|| CoreError::ValidationError(format!("Missing required fields: {}", field)))?;
    Uuid::parse_str(&raw).map_err(|_| CoreError::NotFound(entity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_all_missing_fields() {
        let mut req = Required::new();
        let a = req.take("email", Some(" a@x.com ".into()));
        req.take("password", None);
        req.take("studentId", Some("   ".into()));
        assert_eq!(a, "a@x.com");

        match req.finish() {
            Err(CoreError::ValidationError(msg)) => {
                assert_eq!(msg, "Missing required fields: password, studentId")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn ids_distinguish_missing_from_unknown() {
        assert!(matches!(
            parse_id(None, "bookingId", "Booking"),
            Err(CoreError::ValidationError(_))
        ));
        assert!(matches!(
            parse_id(Some("42".into()), "bookingId", "Booking"),
            Err(CoreError::NotFound("Booking"))
        ));
        let id = Uuid::new_v4();
        assert_eq!(parse_id(Some(id.to_string()), "bookingId", "Booking").unwrap(), id);
    }
}
