use serde::{Deserialize, Serialize};

use super::fields::FieldReader;
use super::names::{Interface, member};

/// Message kinds distinguished by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Request expecting a return.
    Call,
    /// Reply to a call.
    Return,
    /// Unsolicited notification.
    Signal,
    /// Failure reply to a call.
    Error,
}

/// Typed field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// Signed 32-bit integer.
    Int32(i32),
    /// UTF-8 string.
    String(String),
    /// Boolean flag.
    Bool(bool),
}

impl Value {
    /// Short type label used in diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Int32(_) => "int32",
            Self::String(_) => "string",
            Self::Bool(_) => "bool",
        }
    }

    /// Builds a string value.
    #[must_use]
    pub fn string(text: impl Into<String>) -> Self {
        Self::String(text.into())
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int32(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// One frame exchanged over a broker channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Interface tag; unknown tags are carried through untouched.
    pub interface: String,
    /// Operation name.
    pub member: String,
    /// Message kind.
    pub kind: MessageKind,
    /// Sender-assigned serial. Zero means "not yet assigned".
    #[serde(default)]
    pub serial: u32,
    /// Serial of the call this message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_serial: Option<u32>,
    /// Alias of the originating participant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Identity the message is addressed to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// Ordered payload.
    #[serde(default)]
    pub fields: Vec<Value>,
}

impl Message {
    fn new(interface: Interface, member: &str, kind: MessageKind, fields: Vec<Value>) -> Self {
        Self {
            interface: interface.tag().to_owned(),
            member: member.to_owned(),
            kind,
            serial: 0,
            reply_serial: None,
            sender: None,
            destination: None,
            fields,
        }
    }

    /// Builds a method call.
    #[must_use]
    pub fn call(interface: Interface, member: &str, fields: Vec<Value>) -> Self {
        Self::new(interface, member, MessageKind::Call, fields)
    }

    /// Builds a signal.
    #[must_use]
    pub fn signal(interface: Interface, member: &str, fields: Vec<Value>) -> Self {
        Self::new(interface, member, MessageKind::Signal, fields)
    }

    /// Builds the return answering `request`.
    #[must_use]
    pub fn method_return(request: &Self, fields: Vec<Value>) -> Self {
        Self {
            interface: request.interface.clone(),
            member: request.member.clone(),
            kind: MessageKind::Return,
            serial: 0,
            reply_serial: Some(request.serial),
            sender: None,
            destination: request.sender.clone(),
            fields,
        }
    }

    /// Builds an error reply to `request` carrying a description.
    #[must_use]
    pub fn error_reply(request: &Self, name: &str, description: impl Into<String>) -> Self {
        Self {
            interface: request.interface.clone(),
            member: name.to_owned(),
            kind: MessageKind::Error,
            serial: 0,
            reply_serial: Some(request.serial),
            sender: None,
            destination: request.sender.clone(),
            fields: vec![Value::String(description.into())],
        }
    }

    /// Builds the error reply for a call that has no route.
    #[must_use]
    pub fn unknown_method(request: &Self) -> Self {
        let description = format!(
            "no handler for {} {:?} {}",
            request.interface, request.kind, request.member
        );
        Self::error_reply(request, member::UNKNOWN_METHOD, description)
    }

    /// Returns the message relabelled onto `interface`.
    #[must_use]
    pub fn relabelled(mut self, interface: Interface) -> Self {
        interface.tag().clone_into(&mut self.interface);
        self
    }

    /// Parses the interface tag, if it is one the broker knows.
    #[must_use]
    pub fn known_interface(&self) -> Option<Interface> {
        self.interface.parse().ok()
    }

    /// Positional reader over the payload.
    #[must_use]
    pub fn reader(&self) -> FieldReader<'_> {
        FieldReader::new(&self.member, &self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_uses_tagged_values() {
        let message = Message::call(
            Interface::Node,
            member::JOIN,
            vec![Value::from("n1"), Value::from("s1"), Value::from(1)],
        );
        let json = serde_json::to_value(&message).expect("serialise message");
        assert_eq!(json["interface"], "org.whiteboard.node");
        assert_eq!(json["kind"], "call");
        assert_eq!(json["fields"][2]["int32"], 1);
        assert!(json.get("sender").is_none(), "absent sender is omitted");
    }

    #[test]
    fn decodes_minimal_frame() {
        let message: Message = serde_json::from_str(
            r#"{"interface":"org.whiteboard.discovery","member":"get_sibs","kind":"call"}"#,
        )
        .expect("minimal frame");
        assert_eq!(message.known_interface(), Some(Interface::Discovery));
        assert_eq!(message.serial, 0);
        assert!(message.fields.is_empty());
    }

    #[test]
    fn return_echoes_request_addressing() {
        let mut request = Message::call(Interface::Register, member::REGISTER_NODE, Vec::new());
        request.serial = 42;
        request.sender = Some(":7".to_owned());

        let reply = Message::method_return(&request, vec![Value::from(0)]);

        assert_eq!(reply.kind, MessageKind::Return);
        assert_eq!(reply.reply_serial, Some(42));
        assert_eq!(reply.destination.as_deref(), Some(":7"));
        assert_eq!(reply.member, member::REGISTER_NODE);
    }

    #[test]
    fn relabelling_keeps_payload() {
        let message = Message::signal(Interface::SibAccess, member::JOIN_COMPLETE, vec![
            Value::from(3),
            Value::from(0),
        ]);
        let relabelled = message.clone().relabelled(Interface::Node);
        assert_eq!(relabelled.known_interface(), Some(Interface::Node));
        assert_eq!(relabelled.fields, message.fields);
    }
}
