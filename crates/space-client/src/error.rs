/// The classes of failure a space operation can surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SpaceErrorKind {
    /// An operation on a null or uninitialized space.
    InvalidSpace,
    /// Connect, send or receive failed.
    TransportFailure,
    /// The codec could not serialize or deserialize a value.
    EncodingFailure,
    /// The peer did not recognize the request.
    UnsupportedOperation,
    /// No aggregation policy permits this action.
    PolicyDenied,
    /// The fold produced no result on non-empty input.
    AggregationFailure,
    /// The server reported a false acknowledgement.
    OperationUnsuccessful,
}

impl SpaceErrorKind {
    fn as_str(&self) -> &'static str {
        match self {
            SpaceErrorKind::InvalidSpace => "operation performed on an invalid space",
            SpaceErrorKind::TransportFailure => "could not reach the space",
            SpaceErrorKind::EncodingFailure => "could not encode or decode a value",
            SpaceErrorKind::UnsupportedOperation => "operation is not supported by the space",
            SpaceErrorKind::PolicyDenied => "no aggregation policy permits this operation",
            SpaceErrorKind::AggregationFailure => "aggregation produced no result",
            SpaceErrorKind::OperationUnsuccessful => "operation on this space failed",
        }
    }
}

impl std::fmt::Display for SpaceErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// SpaceError is the error half of every public operation's result:
/// the operation that failed, the space it was addressed to, and a
/// one-line cause.
#[derive(Debug, thiserror::Error)]
#[error("{op} on space {space:?}: {kind}")]
pub struct SpaceError {
    op: &'static str,
    space: String,
    kind: SpaceErrorKind,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SpaceError {
    pub(crate) fn new(op: &'static str, space: &str, kind: SpaceErrorKind) -> Self {
        Self {
            op,
            space: space.to_string(),
            kind,
            source: None,
        }
    }

    pub(crate) fn with_source(
        op: &'static str,
        space: &str,
        kind: SpaceErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            op,
            space: space.to_string(),
            kind,
            source: Some(Box::new(source)),
        }
    }

    pub fn kind(&self) -> SpaceErrorKind {
        self.kind
    }

    /// The public operation which produced the error.
    pub fn operation(&self) -> &'static str {
        self.op
    }

    /// The identifier of the space the operation addressed.
    pub fn space(&self) -> &str {
        &self.space
    }
}
