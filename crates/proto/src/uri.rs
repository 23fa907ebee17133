/// Mode selects how a client maintains its connection to a space.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Mode {
    /// Keep the connection across operations.
    #[default]
    Keep,
    /// Connect once per operation.
    Conn,
    Push,
    Pull,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Keep => "KEEP",
            Mode::Conn => "CONN",
            Mode::Push => "PUSH",
            Mode::Pull => "PULL",
        }
    }

    // Scans a query string for a recognized mode, case-insensitively.
    // Anything else is the default.
    fn from_query(query: &str) -> Mode {
        let query = query.to_ascii_uppercase();
        for mode in [Mode::Keep, Mode::Conn, Mode::Push, Mode::Pull] {
            if query.contains(mode.as_str()) {
                return mode;
            }
        }
        Mode::Keep
    }
}

/// The port a space listens on when its URI does not name one.
pub const DEFAULT_PORT: u16 = 31415;

/// SpaceUri locates a space: `scheme://host[:port]/space[?mode]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceUri {
    scheme: String,
    host: String,
    port: u16,
    space: String,
    mode: Mode,
}

impl SpaceUri {
    /// Parses a raw URI, applying defaults for every omitted part:
    /// scheme `tcp`, host `localhost`, port 31415, mode KEEP. A bare
    /// name parses as a space on the local default endpoint.
    pub fn parse(raw: &str) -> Result<Self, crate::Error> {
        let invalid = |source| crate::Error::InvalidUri {
            uri: raw.to_string(),
            source,
        };

        if raw.is_empty() {
            return Err(invalid(None));
        }

        // A bare space name has no authority part; give it the default.
        let normalized = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("tcp://localhost/{}", raw.trim_start_matches('/'))
        };

        let url = url::Url::parse(&normalized).map_err(|err| invalid(Some(err)))?;

        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => "localhost".to_string(),
        };

        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            port: url.port().unwrap_or(DEFAULT_PORT),
            space: url.path().trim_matches('/').to_string(),
            mode: Mode::from_query(url.query().unwrap_or("")),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn hostname(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The space name: the trimmed path.
    pub fn space(&self) -> &str {
        &self.space
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The `host:port` endpoint of the space.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// True if the host names this process's loopback interface, which
    /// lets a client reach a space hosted in the same process without
    /// the network.
    pub fn is_loopback(&self) -> bool {
        matches!(self.host.as_str(), "localhost" | "127.0.0.1" | "::1")
    }
}

impl std::fmt::Display for SpaceUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}://{}:{}/{}?{}",
            self.scheme,
            self.host,
            self.port,
            self.space,
            self.mode.as_str()
        )
    }
}

impl std::str::FromStr for SpaceUri {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn full_uri() {
        let uri = SpaceUri::parse("tcp4://host:0/space_name?CONN").unwrap();
        assert_eq!(uri.scheme(), "tcp4");
        assert_eq!(uri.hostname(), "host");
        assert_eq!(uri.port(), 0);
        assert_eq!(uri.space(), "space_name");
        assert_eq!(uri.mode(), Mode::Conn);
    }

    #[test]
    fn defaults_apply() {
        let uri = SpaceUri::parse("tcp://localhost/fridge").unwrap();
        assert_eq!(uri.port(), 31415);
        assert_eq!(uri.mode(), Mode::Keep);
        insta::assert_snapshot!(uri.to_string(), @"tcp://localhost:31415/fridge?KEEP");
    }

    #[test]
    fn bare_names_are_local_spaces() {
        let uri = SpaceUri::parse("bookstore").unwrap();
        assert_eq!(uri.scheme(), "tcp");
        assert_eq!(uri.hostname(), "localhost");
        assert_eq!(uri.space(), "bookstore");
        assert!(uri.is_loopback());
    }

    #[test]
    fn modes_are_case_insensitive_and_default_on_unknown() {
        assert_eq!(
            SpaceUri::parse("tcp://h/s?pull").unwrap().mode(),
            Mode::Pull
        );
        assert_eq!(
            SpaceUri::parse("tcp://h/s?Push").unwrap().mode(),
            Mode::Push
        );
        assert_eq!(
            SpaceUri::parse("tcp://h/s?SIDEWAYS").unwrap().mode(),
            Mode::Keep
        );
    }

    #[test]
    fn empty_uris_are_invalid() {
        assert!(SpaceUri::parse("").is_err());
    }
}
