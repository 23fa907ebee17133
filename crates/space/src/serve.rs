use crate::{engine::Serving, Error, TupleSpace};
use policy::Composable;
use proto::{read_frame, write_frame, Message, Operation};
use registry::Registry;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tuple::{Tuple, Value};

/// The transport-agnostic byte stream a space serves: a TCP socket, or
/// one half of an in-process pipe.
pub trait AsyncStream: AsyncRead + AsyncWrite + Send + Unpin {}
impl<T: AsyncRead + AsyncWrite + Send + Unpin> AsyncStream for T {}

pub type Conn = Box<dyn AsyncStream>;

/// LocalConnector opens in-process connections to a space, bypassing the
/// network: each connect publishes one half of an in-memory duplex pipe
/// onto the space's connection channel.
#[derive(Clone)]
pub struct LocalConnector {
    conn_tx: mpsc::Sender<Conn>,
}

impl LocalConnector {
    pub async fn connect(&self) -> Result<tokio::io::DuplexStream, Error> {
        let (client, server) = tokio::io::duplex(1 << 16);
        self.conn_tx
            .send(Box::new(server))
            .await
            .map_err(|_| Error::Stopped)?;
        Ok(client)
    }
}

impl TupleSpace {
    /// Binds a serving space: a listener accepts connections and
    /// publishes them onto the connection channel, and a drain task
    /// spawns one handler per connection. Port zero binds an ephemeral
    /// port, reported by [`TupleSpace::local_addr`].
    pub async fn bind(
        addr: &str,
        policy: Option<Composable>,
        registry: Registry,
    ) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr).await.map_err(Error::Bind)?;
        let local_addr = listener.local_addr().map_err(Error::Bind)?;

        let (conn_tx, conn_rx) = mpsc::channel::<Conn>(8);
        let space = Self::build(
            policy,
            registry,
            Some(Serving {
                local_addr,
                conn_tx: conn_tx.clone(),
            }),
        );

        tokio::spawn(accept_loop(listener, conn_tx));
        tokio::spawn(drain_connections(space.clone(), conn_rx));

        tracing::debug!(%local_addr, "space is listening");
        Ok(space)
    }

    /// An in-process connector to this space, if it is serving.
    pub fn connector(&self) -> Option<LocalConnector> {
        self.serving().map(|s| LocalConnector {
            conn_tx: s.conn_tx.clone(),
        })
    }
}

// Accepts connections for as long as the space drains them.
async fn accept_loop(listener: TcpListener, conn_tx: mpsc::Sender<Conn>) {
    loop {
        match listener.accept().await {
            Ok((socket, _remote)) => {
                if conn_tx.send(Box::new(socket)).await.is_err() {
                    return;
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to accept connection");
            }
        }
    }
}

async fn drain_connections(space: TupleSpace, mut conn_rx: mpsc::Receiver<Conn>) {
    while let Some(conn) = conn_rx.recv().await {
        tokio::spawn(handle(space.clone(), conn));
    }
}

// Handles one connection: read a single request, dispatch it, write the
// response if the operation has one, and drop the connection. Errors are
// recovered here: logged, and the connection closed with no further
// state touched. The peer observes the dropped connection.
async fn handle(space: TupleSpace, mut conn: Conn) {
    if let Err(error) = serve_one(&space, &mut conn).await {
        tracing::error!(%error, "failed to serve connection");
    }
}

async fn serve_one(space: &TupleSpace, conn: &mut Conn) -> Result<(), Error> {
    let Some(mut message) = read_frame::<_, Message>(conn).await? else {
        return Err(Error::ConnectionClosed);
    };
    let reg = space.registry();

    // Inbound values may reference functions by external name.
    registry::decode_value(reg, &mut message.body);

    let operation = message.operation;
    match operation {
        Operation::PutRequest => {
            let t = message.into_tuple()?;
            let ack = space.put(t).await;
            write_frame(conn, &Value::Bool(ack)).await?;
        }
        Operation::PutPRequest => {
            let t = message.into_tuple()?;
            space.put_p(t).await;
        }
        Operation::GetRequest | Operation::QueryRequest => {
            let tp = message.into_template()?;
            let mut found = if operation == Operation::GetRequest {
                space.get(tp).await
            } else {
                space.query(tp).await
            };
            registry::encode_tuple(reg, &mut found);
            write_frame(conn, &Value::Tuple(found)).await?;
        }
        Operation::GetPRequest | Operation::QueryPRequest => {
            let tp = message.into_template()?;
            let found = if operation == Operation::GetPRequest {
                space.get_p(&tp).await
            } else {
                space.query_p(&tp).await
            };
            let (ok, mut t) = match found {
                Some(t) => (true, t),
                None => (false, Tuple::empty()),
            };
            registry::encode_tuple(reg, &mut t);
            write_frame(conn, &Value::List(vec![Value::Bool(ok), Value::Tuple(t)])).await?;
        }
        Operation::GetAllRequest | Operation::QueryAllRequest => {
            let tp = message.into_template()?;
            let tuples = if operation == Operation::GetAllRequest {
                space.get_all(&tp).await
            } else {
                space.query_all(&tp).await
            };
            let tuples = tuples
                .into_iter()
                .map(|mut t| {
                    registry::encode_tuple(reg, &mut t);
                    Value::Tuple(t)
                })
                .collect();
            write_frame(conn, &Value::List(tuples)).await?;
        }
        Operation::PutAggRequest | Operation::GetAggRequest | Operation::QueryAggRequest => {
            let tp = message.into_template()?;
            let mut t = crate::agg::aggregate_op(space, operation, tp).await?;
            registry::encode_tuple(reg, &mut t);
            write_frame(conn, &Value::Tuple(t)).await?;
        }
        Operation::SizeRequest => {
            write_frame(conn, &Value::Int(space.size().await as i64)).await?;
        }
        other => {
            return Err(proto::Error::UnsupportedOperation(other.as_str().to_string()).into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use tuple::{template, tuple, Template, TypeTag};

    async fn request(conn: &mut impl AsyncStream, message: Message) -> Option<Value> {
        write_frame(conn, &message).await.unwrap();
        read_frame::<_, Value>(conn).await.unwrap()
    }

    #[tokio::test]
    async fn local_connections_dispatch_operations() {
        let ts = TupleSpace::bind("127.0.0.1:0", None, Registry::new())
            .await
            .unwrap();
        let connector = ts.connector().unwrap();

        // put is acknowledged.
        let mut conn = connector.connect().await.unwrap();
        let ack = request(
            &mut conn,
            Message::tuple(Operation::PutRequest, tuple!["book", 200_i64]),
        )
        .await;
        assert_eq!(ack, Some(Value::Bool(true)));

        // query returns the matching tuple and leaves it in place.
        let mut conn = connector.connect().await.unwrap();
        let found = request(
            &mut conn,
            Message::template(
                Operation::QueryRequest,
                template![formal TypeTag::Str, formal TypeTag::Int],
            ),
        )
        .await;
        assert_eq!(found, Some(Value::Tuple(tuple!["book", 200_i64])));

        // size sees the tuple still stored.
        let mut conn = connector.connect().await.unwrap();
        let size = request(&mut conn, Message::new(Operation::SizeRequest, Value::Unit)).await;
        assert_eq!(size, Some(Value::Int(1)));
    }

    #[tokio::test]
    async fn tcp_connections_are_served() {
        let port = portpicker::pick_unused_port().expect("no free port");
        let addr = format!("127.0.0.1:{port}");
        let _ts = TupleSpace::bind(&addr, None, Registry::new()).await.unwrap();

        let mut sock = tokio::net::TcpStream::connect(&addr).await.unwrap();
        write_frame(
            &mut sock,
            &Message::tuple(Operation::PutRequest, tuple![1_i64]),
        )
        .await
        .unwrap();
        let ack = read_frame::<_, Value>(&mut sock).await.unwrap();
        assert_eq!(ack, Some(Value::Bool(true)));
    }

    #[tokio::test]
    async fn malformed_and_unsupported_requests_drop_the_connection() {
        let ts = TupleSpace::bind("127.0.0.1:0", None, Registry::new())
            .await
            .unwrap();
        let connector = ts.connector().unwrap();

        // A response tag sent as a request is unsupported: no response
        // comes back, the connection just closes.
        let mut conn = connector.connect().await.unwrap();
        let reply = request(
            &mut conn,
            Message::tuple(Operation::PutResponse, tuple![1_i64]),
        )
        .await;
        assert_eq!(reply, None);

        // A put whose body is not a tuple is likewise dropped, and the
        // space is left unchanged.
        let mut conn = connector.connect().await.unwrap();
        let reply = request(
            &mut conn,
            Message::new(Operation::PutRequest, Value::Int(3)),
        )
        .await;
        assert_eq!(reply, None);
        assert_eq!(ts.size().await, 0);
    }

    #[tokio::test]
    async fn blocking_get_parks_until_a_put_arrives() {
        let ts = TupleSpace::bind("127.0.0.1:0", None, Registry::new())
            .await
            .unwrap();
        let connector = ts.connector().unwrap();

        let waiter = tokio::spawn({
            let connector = connector.clone();
            async move {
                let mut conn = connector.connect().await.unwrap();
                request(
                    &mut conn,
                    Message::template(Operation::GetRequest, template![formal TypeTag::Int]),
                )
                .await
            }
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let mut conn = connector.connect().await.unwrap();
        write_frame(
            &mut conn,
            &Message::tuple(Operation::PutPRequest, tuple![7_i64]),
        )
        .await
        .unwrap();

        assert_eq!(waiter.await.unwrap(), Some(Value::Tuple(tuple![7_i64])));
        assert_eq!(ts.size().await, 0);
    }

    #[tokio::test]
    async fn empty_templates_are_legal() {
        let ts = TupleSpace::bind("127.0.0.1:0", None, Registry::new())
            .await
            .unwrap();
        let connector = ts.connector().unwrap();

        let mut conn = connector.connect().await.unwrap();
        let found = request(
            &mut conn,
            Message::template(Operation::QueryAllRequest, Template::default()),
        )
        .await;
        assert_eq!(found, Some(Value::List(vec![])));
    }
}
