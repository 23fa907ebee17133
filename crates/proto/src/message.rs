use super::Operation;
use tuple::{Template, Tuple, Value};

/// Message is the request envelope: an operation tag and a body value.
/// Responses are not enveloped; they are the bare value each operation
/// specifies.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub operation: Operation,
    pub body: Value,
}

impl Message {
    pub fn new(operation: Operation, body: Value) -> Self {
        Self { operation, body }
    }

    pub fn tuple(operation: Operation, t: Tuple) -> Self {
        Self::new(operation, Value::Tuple(t))
    }

    pub fn template(operation: Operation, tp: Template) -> Self {
        Self::new(operation, Value::Template(tp))
    }

    /// The body as a tuple, for operations whose body must be one.
    pub fn into_tuple(self) -> Result<Tuple, crate::Error> {
        match self.body {
            Value::Tuple(t) => Ok(t),
            _ => Err(crate::Error::UnsupportedOperation(format!(
                "{} body is not a tuple",
                self.operation
            ))),
        }
    }

    /// The body as a template, for operations whose body must be one.
    pub fn into_template(self) -> Result<Template, crate::Error> {
        match self.body {
            Value::Template(tp) => Ok(tp),
            _ => Err(crate::Error::UnsupportedOperation(format!(
                "{} body is not a template",
                self.operation
            ))),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tuple::tuple;

    #[test]
    fn envelope_is_self_describing() {
        let msg = Message::tuple(Operation::PutRequest, tuple!["book", 200_i64]);
        let encoded = serde_json::to_string(&msg).unwrap();

        insta::assert_snapshot!(
            encoded,
            @r###"{"operation":"PUT_REQUEST","body":{"tuple":{"fields":[{"str":"book"},{"int":200}]}}}"###
        );

        let decoded: Message = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn body_accessors_enforce_shape() {
        let msg = Message::tuple(Operation::PutRequest, tuple![1_i64]);
        assert!(msg.clone().into_tuple().is_ok());
        assert!(msg.into_template().is_err());
    }
}
