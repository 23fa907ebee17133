//! The space engine: the concurrent tuple multiset with blocking-waiter
//! rendezvous, the aggregation pipeline over it, and the listener which
//! dispatches protocol requests into both.

mod engine;
pub use engine::TupleSpace;

mod waiter;
pub(crate) use waiter::WaitingClient;

mod agg;

mod serve;
pub use serve::{AsyncStream, Conn, LocalConnector};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Proto(#[from] proto::Error),
    #[error("binding space listener")]
    Bind(#[source] std::io::Error),
    #[error("aggregate template must carry a fold function in its first field")]
    FoldMissing,
    #[error("fold function {0:?} is not registered with this space")]
    FoldUnresolved(String),
    #[error("aggregation for action {0} produced no result on non-empty input")]
    AggregationFailure(String),
    #[error(transparent)]
    Transformation(#[from] policy::TransformationError),
    #[error("peer closed the connection before sending a request")]
    ConnectionClosed,
    #[error("space is no longer serving connections")]
    Stopped,
}
