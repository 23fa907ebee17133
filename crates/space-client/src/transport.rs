use space::{Conn, LocalConnector};
use std::collections::HashMap;
use std::sync::Mutex;

lazy_static::lazy_static! {
    // Spaces hosted by this process, by space name. Lets a client whose
    // URI resolves to loopback bypass the network entirely.
    static ref LOCAL_SPACES: Mutex<HashMap<String, LocalConnector>> = Mutex::new(HashMap::new());
}

pub(crate) fn publish_local(name: &str, connector: LocalConnector) {
    let previous = LOCAL_SPACES
        .lock()
        .unwrap()
        .insert(name.to_string(), connector);
    if previous.is_some() {
        tracing::debug!(space = %name, "replacing in-process connector");
    }
}

pub(crate) fn lookup_local(name: &str) -> Option<LocalConnector> {
    LOCAL_SPACES.lock().unwrap().get(name).cloned()
}

/// How a Space handle reaches its space: over an in-process pipe for a
/// space hosted by this process, or by dialing its endpoint.
#[derive(Clone)]
pub(crate) enum Transport {
    Local(LocalConnector),
    Remote(String),
}

impl Transport {
    pub(crate) async fn connect(&self) -> Result<Conn, std::io::Error> {
        match self {
            Transport::Local(connector) => match connector.connect().await {
                Ok(pipe) => Ok(Box::new(pipe)),
                Err(err) => Err(std::io::Error::new(std::io::ErrorKind::NotConnected, err)),
            },
            Transport::Remote(addr) => {
                let socket = tokio::net::TcpStream::connect(addr).await?;
                Ok(Box::new(socket))
            }
        }
    }
}
