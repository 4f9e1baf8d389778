use std::slice;

use thiserror::Error;

use super::message::Value;

/// Payload decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The payload ended before a required field.
    #[error("{member}: missing field {index}")]
    MissingField {
        /// Member being decoded.
        member: String,
        /// Zero-based field position.
        index: usize,
    },
    /// A field held the wrong type.
    #[error("{member}: field {index} should be {expected}, found {found}")]
    FieldType {
        /// Member being decoded.
        member: String,
        /// Zero-based field position.
        index: usize,
        /// Expected type label.
        expected: &'static str,
        /// Received type label.
        found: &'static str,
    },
    /// The payload carried more fields than the member defines.
    #[error("{member}: unexpected field {index}")]
    TrailingField {
        /// Member being decoded.
        member: String,
        /// Zero-based position of the first surplus field.
        index: usize,
    },
}

/// Positional decoder over a message payload.
#[derive(Debug)]
pub struct FieldReader<'a> {
    member: &'a str,
    fields: slice::Iter<'a, Value>,
    index: usize,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(member: &'a str, fields: &'a [Value]) -> Self {
        Self {
            member,
            fields: fields.iter(),
            index: 0,
        }
    }

    fn next_value(&mut self) -> Result<&'a Value, ProtocolError> {
        let index = self.index;
        self.index += 1;
        self.fields.next().ok_or_else(|| ProtocolError::MissingField {
            member: self.member.to_owned(),
            index,
        })
    }

    fn mismatch(&self, expected: &'static str, found: &Value) -> ProtocolError {
        ProtocolError::FieldType {
            member: self.member.to_owned(),
            index: self.index.saturating_sub(1),
            expected,
            found: found.type_name(),
        }
    }

    /// Reads a string field.
    ///
    /// # Errors
    ///
    /// Fails when the field is absent or not a string.
    pub fn string(&mut self) -> Result<&'a str, ProtocolError> {
        match self.next_value()? {
            Value::String(text) => Ok(text.as_str()),
            other => Err(self.mismatch("string", other)),
        }
    }

    /// Reads an int32 field.
    ///
    /// # Errors
    ///
    /// Fails when the field is absent or not an int32.
    pub fn int32(&mut self) -> Result<i32, ProtocolError> {
        match self.next_value()? {
            Value::Int32(number) => Ok(*number),
            other => Err(self.mismatch("int32", other)),
        }
    }

    /// Reads a bool field.
    ///
    /// # Errors
    ///
    /// Fails when the field is absent or not a bool.
    pub fn boolean(&mut self) -> Result<bool, ProtocolError> {
        match self.next_value()? {
            Value::Bool(flag) => Ok(*flag),
            other => Err(self.mismatch("bool", other)),
        }
    }

    /// Asserts the payload has been fully consumed.
    ///
    /// # Errors
    ///
    /// Fails when surplus fields remain.
    pub fn finish(mut self) -> Result<(), ProtocolError> {
        if self.fields.next().is_some() {
            return Err(ProtocolError::TrailingField {
                member: self.member.to_owned(),
                index: self.index,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> Vec<Value> {
        vec![Value::from("n1"), Value::from(5), Value::from(true)]
    }

    #[test]
    fn reads_fields_in_order() {
        let fields = payload();
        let mut reader = FieldReader::new("probe", &fields);
        assert_eq!(reader.string(), Ok("n1"));
        assert_eq!(reader.int32(), Ok(5));
        assert_eq!(reader.boolean(), Ok(true));
        assert_eq!(reader.finish(), Ok(()));
    }

    #[test]
    fn reports_type_mismatch_position() {
        let fields = payload();
        let mut reader = FieldReader::new("probe", &fields);
        let error = reader.int32().expect_err("first field is a string");
        assert_eq!(
            error,
            ProtocolError::FieldType {
                member: "probe".to_owned(),
                index: 0,
                expected: "int32",
                found: "string",
            }
        );
    }

    #[test]
    fn reports_missing_and_trailing_fields() {
        let fields = payload();
        let mut short = FieldReader::new("probe", &fields[..1]);
        assert!(short.string().is_ok());
        assert!(matches!(
            short.int32(),
            Err(ProtocolError::MissingField { index: 1, .. })
        ));

        let mut long = FieldReader::new("probe", &fields);
        assert!(long.string().is_ok());
        assert!(matches!(
            long.finish(),
            Err(ProtocolError::TrailingField { index: 1, .. })
        ));
    }
}
