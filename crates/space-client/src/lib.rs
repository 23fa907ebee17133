//! The public space API. Spaces are addressed by URI; a handle either
//! hosts the space in this process or reaches one hosted elsewhere.

use proto::{read_frame, write_frame, Message, Operation, SpaceUri};
use registry::Registry;
use space::{Conn, TupleSpace};
use std::time::Duration;
use tuple::{FuncRef, Template, TemplateField, Tuple, Value};

mod error;
pub use error::{SpaceError, SpaceErrorKind};

mod transport;
use transport::Transport;

/// Space is the public handle to a tuple space, local or remote.
///
/// Every operation serializes its value over the wire codec and reads
/// the response from a fresh connection. For a space hosted by this
/// process the "wire" is an in-memory pipe; hostnames resolving to
/// loopback select that path automatically.
#[derive(Clone)]
pub struct Space {
    id: String,
    uri: SpaceUri,
    transport: Transport,
    registry: Registry,
    engine: Option<TupleSpace>,
}

impl std::fmt::Debug for Space {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Space").field("id", &self.id).finish()
    }
}

impl Space {
    /// Creates a space served by this process at the URI's port, and
    /// returns a handle to it.
    pub async fn new(uri: &str) -> Result<Self, SpaceError> {
        Self::new_with(uri, None, Registry::global()).await
    }

    /// As [`Space::new`], with an aggregation policy governing the
    /// space's aggregate operations, and an explicit function registry.
    pub async fn new_with(
        uri: &str,
        policy: Option<policy::Composable>,
        registry: Registry,
    ) -> Result<Self, SpaceError> {
        let parsed = SpaceUri::parse(uri).map_err(|err| {
            SpaceError::with_source("new_space", uri, SpaceErrorKind::InvalidSpace, err)
        })?;

        let bind = format!("0.0.0.0:{}", parsed.port());
        let engine = TupleSpace::bind(&bind, policy, registry.clone())
            .await
            .map_err(|err| {
                SpaceError::with_source("new_space", uri, SpaceErrorKind::TransportFailure, err)
            })?;

        let connector = engine
            .connector()
            .expect("a bound space serves connections");
        transport::publish_local(parsed.space(), connector.clone());

        Ok(Self {
            id: uri.to_string(),
            uri: parsed,
            transport: Transport::Local(connector),
            registry,
            engine: Some(engine),
        })
    }

    /// A handle to a space hosted elsewhere. If the URI resolves to
    /// loopback and the named space lives in this process, operations
    /// bypass the network.
    pub fn remote(uri: &str) -> Result<Self, SpaceError> {
        Self::remote_with(uri, Registry::global())
    }

    pub fn remote_with(uri: &str, registry: Registry) -> Result<Self, SpaceError> {
        let parsed = SpaceUri::parse(uri).map_err(|err| {
            SpaceError::with_source("remote_space", uri, SpaceErrorKind::InvalidSpace, err)
        })?;

        let transport = if parsed.is_loopback() {
            transport::lookup_local(parsed.space()).map(Transport::Local)
        } else {
            None
        }
        .unwrap_or_else(|| Transport::Remote(parsed.addr()));

        Ok(Self {
            id: uri.to_string(),
            uri: parsed,
            transport,
            registry,
            engine: None,
        })
    }

    /// The URI string this handle was created from.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn uri(&self) -> &SpaceUri {
        &self.uri
    }

    /// The function registry values of this handle are encoded against.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The bound endpoint, for spaces hosted by this process. Useful
    /// when the URI asked for an ephemeral port.
    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        self.engine.as_ref().and_then(|e| e.local_addr())
    }

    /// Blocking placement. Returns the tuple placed.
    pub async fn put(&self, t: Tuple) -> Result<Tuple, SpaceError> {
        let mut body = t.clone();
        registry::encode_tuple(&self.registry, &mut body);

        match self
            .request_blocking("put", Message::tuple(Operation::PutRequest, body))
            .await?
        {
            Value::Bool(true) => Ok(t),
            Value::Bool(false) => Err(self.error("put", SpaceErrorKind::OperationUnsuccessful)),
            other => Err(self.unexpected("put", &other)),
        }
    }

    /// Non-blocking placement. The space sends no response.
    pub async fn put_p(&self, t: Tuple) -> Result<Tuple, SpaceError> {
        let mut body = t.clone();
        registry::encode_tuple(&self.registry, &mut body);

        let mut conn = self.connect_once("put_p").await?;
        write_frame(&mut conn, &Message::tuple(Operation::PutPRequest, body))
            .await
            .map_err(|err| self.proto_error("put_p", err))?;
        Ok(t)
    }

    /// Blocking retrieval of one matching tuple, which is removed.
    pub async fn get(&self, template: Template) -> Result<Tuple, SpaceError> {
        self.fetch_blocking("get", Operation::GetRequest, template)
            .await
    }

    /// Blocking query of one matching tuple, which stays in the space.
    pub async fn query(&self, template: Template) -> Result<Tuple, SpaceError> {
        self.fetch_blocking("query", Operation::QueryRequest, template)
            .await
    }

    /// Non-blocking retrieval probe.
    pub async fn get_p(&self, template: Template) -> Result<Option<Tuple>, SpaceError> {
        self.probe("get_p", Operation::GetPRequest, template).await
    }

    /// Non-blocking query probe.
    pub async fn query_p(&self, template: Template) -> Result<Option<Tuple>, SpaceError> {
        self.probe("query_p", Operation::QueryPRequest, template)
            .await
    }

    /// Removes and returns every matching tuple. An empty list is a
    /// legal result.
    pub async fn get_all(&self, template: Template) -> Result<Vec<Tuple>, SpaceError> {
        self.fetch_list("get_all", Operation::GetAllRequest, template)
            .await
    }

    /// Returns a copy of every matching tuple.
    pub async fn query_all(&self, template: Template) -> Result<Vec<Tuple>, SpaceError> {
        self.fetch_list("query_all", Operation::QueryAllRequest, template)
            .await
    }

    /// Aggregates matching tuples with `fold`, stores the result in the
    /// space, and returns it.
    pub async fn put_agg(&self, fold: FuncRef, template: Template) -> Result<Tuple, SpaceError> {
        self.aggregate("put_agg", Operation::PutAggRequest, fold, template)
            .await
    }

    /// Removes matching tuples and returns their aggregate.
    pub async fn get_agg(&self, fold: FuncRef, template: Template) -> Result<Tuple, SpaceError> {
        self.aggregate("get_agg", Operation::GetAggRequest, fold, template)
            .await
    }

    /// Returns the aggregate of matching tuples without consuming them.
    pub async fn query_agg(&self, fold: FuncRef, template: Template) -> Result<Tuple, SpaceError> {
        self.aggregate("query_agg", Operation::QueryAggRequest, fold, template)
            .await
    }

    /// The number of tuples in the space.
    pub async fn size(&self) -> Result<usize, SpaceError> {
        match self
            .request_once("size", Message::new(Operation::SizeRequest, Value::Unit))
            .await?
        {
            Value::Int(n) if n >= 0 => Ok(n as usize),
            other => Err(self.unexpected("size", &other)),
        }
    }

    async fn fetch_blocking(
        &self,
        op: &'static str,
        operation: Operation,
        mut template: Template,
    ) -> Result<Tuple, SpaceError> {
        registry::encode_template(&self.registry, &mut template);
        let response = self
            .request_blocking(op, Message::template(operation, template))
            .await?;
        self.interpret_tuple(op, response)
    }

    async fn probe(
        &self,
        op: &'static str,
        operation: Operation,
        mut template: Template,
    ) -> Result<Option<Tuple>, SpaceError> {
        registry::encode_template(&self.registry, &mut template);
        let response = self
            .request_once(op, Message::template(operation, template))
            .await?;

        // The response is the pair (found, tuple).
        match response {
            Value::List(fields) => match <[Value; 2]>::try_from(fields) {
                Ok([Value::Bool(false), _]) => Ok(None),
                Ok([Value::Bool(true), Value::Tuple(mut t)]) => {
                    registry::decode_tuple(&self.registry, &mut t);
                    Ok(Some(t))
                }
                Ok([a, _]) => Err(self.unexpected(op, &a)),
                Err(_) => Err(self.error(op, SpaceErrorKind::EncodingFailure)),
            },
            other => Err(self.unexpected(op, &other)),
        }
    }

    async fn fetch_list(
        &self,
        op: &'static str,
        operation: Operation,
        mut template: Template,
    ) -> Result<Vec<Tuple>, SpaceError> {
        registry::encode_template(&self.registry, &mut template);
        let response = self
            .request_once(op, Message::template(operation, template))
            .await?;

        let Value::List(items) = response else {
            return Err(self.unexpected(op, &response));
        };
        items
            .into_iter()
            .map(|item| self.interpret_tuple(op, item))
            .collect()
    }

    async fn aggregate(
        &self,
        op: &'static str,
        operation: Operation,
        fold: FuncRef,
        template: Template,
    ) -> Result<Tuple, SpaceError> {
        let mut fields = Vec::with_capacity(template.len() + 1);
        fields.push(TemplateField::Actual(Value::Func(fold)));
        fields.extend(template.into_fields());

        let result = self
            .fetch_blocking(op, operation, Template::new(fields))
            .await?;

        // A policy-bearing space answers a denied aggregate with the
        // empty tuple.
        if result.is_empty() {
            return Err(self.error(op, SpaceErrorKind::PolicyDenied));
        }
        Ok(result)
    }

    fn interpret_tuple(&self, op: &'static str, response: Value) -> Result<Tuple, SpaceError> {
        match response {
            Value::Tuple(mut t) => {
                registry::decode_tuple(&self.registry, &mut t);
                Ok(t)
            }
            other => Err(self.unexpected(op, &other)),
        }
    }

    // Blocking calls retry connection establishment until it succeeds;
    // only then is the request sent, exactly once.
    async fn request_blocking(
        &self,
        op: &'static str,
        message: Message,
    ) -> Result<Value, SpaceError> {
        let mut conn = self.connect_retrying(op).await;
        self.exchange(op, &mut conn, &message).await
    }

    // Non-blocking calls surface a transport failure immediately.
    async fn request_once(&self, op: &'static str, message: Message) -> Result<Value, SpaceError> {
        let mut conn = self.connect_once(op).await?;
        self.exchange(op, &mut conn, &message).await
    }

    async fn exchange(
        &self,
        op: &'static str,
        conn: &mut Conn,
        message: &Message,
    ) -> Result<Value, SpaceError> {
        write_frame(conn, message)
            .await
            .map_err(|err| self.proto_error(op, err))?;

        match read_frame::<_, Value>(conn)
            .await
            .map_err(|err| self.proto_error(op, err))?
        {
            Some(value) => Ok(value),
            // The server recovered from an error by dropping us.
            None => Err(self.error(op, SpaceErrorKind::TransportFailure)),
        }
    }

    async fn connect_retrying(&self, op: &'static str) -> Conn {
        let mut delay = Duration::from_millis(10);
        loop {
            match self.transport.connect().await {
                Ok(conn) => return conn,
                Err(err) => {
                    tracing::warn!(space = %self.id, %op, %err, "connection failed; retrying");
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(Duration::from_secs(1));
                }
            }
        }
    }

    async fn connect_once(&self, op: &'static str) -> Result<Conn, SpaceError> {
        self.transport.connect().await.map_err(|err| {
            SpaceError::with_source(op, &self.id, SpaceErrorKind::TransportFailure, err)
        })
    }

    fn error(&self, op: &'static str, kind: SpaceErrorKind) -> SpaceError {
        SpaceError::new(op, &self.id, kind)
    }

    fn unexpected(&self, op: &'static str, response: &Value) -> SpaceError {
        tracing::debug!(space = %self.id, %op, %response, "response value has an unexpected shape");
        self.error(op, SpaceErrorKind::EncodingFailure)
    }

    fn proto_error(&self, op: &'static str, err: proto::Error) -> SpaceError {
        let kind = match &err {
            proto::Error::Encoding(_) => SpaceErrorKind::EncodingFailure,
            proto::Error::UnsupportedOperation(_) => SpaceErrorKind::UnsupportedOperation,
            _ => SpaceErrorKind::TransportFailure,
        };
        SpaceError::with_source(op, &self.id, kind, err)
    }
}
