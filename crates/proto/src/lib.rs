//! The request/response protocol: one operation-tagged request per
//! connection, answered by the bare value the operation specifies, all
//! framed with a length header over a self-describing encoding.

mod operations;
pub use operations::Operation;

mod message;
pub use message::Message;

mod codec;
pub use codec::{read_frame, write_frame, MAX_FRAME};

mod uri;
pub use uri::{Mode, SpaceUri};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("encoding message body")]
    Encoding(#[source] serde_json::Error),
    #[error("frame length {0} is too large")]
    FrameTooLarge(u32),
    #[error("unsupported operation {0:?}")]
    UnsupportedOperation(String),
    #[error("invalid space URI {uri:?}")]
    InvalidUri {
        uri: String,
        #[source]
        source: Option<url::ParseError>,
    },
}
