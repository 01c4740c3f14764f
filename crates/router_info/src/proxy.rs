use std::fmt;
use std::time::Duration;

use crate::error::ProxyParseError;

/// The stable logical name of a remotely invocable object: `{category}/{name}`.
///
/// Example: `Glacier2/router`
/// - `category`: `Glacier2`
/// - `name`: `router`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity {
    pub category: String,
    pub name: String,
}

impl Identity {
    /// Create an identity with an empty category.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            category: String::new(),
            name: name.into(),
        }
    }

    /// Set the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Parse a stringified identity.
    ///
    /// Expected format: `{name}` or `{category}/{name}`
    pub fn parse(s: &str) -> Result<Self, ProxyParseError> {
        let s = s.trim();
        let (category, name) = match s.split_once('/') {
            Some((category, name)) => (category, name),
            None => ("", s),
        };

        if name.is_empty() || name.contains('/') {
            return Err(ProxyParseError::Identity(s.to_owned()));
        }

        Ok(Identity {
            category: category.to_owned(),
            name: name.to_owned(),
        })
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.category.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.category, self.name)
        }
    }
}

/// A transport-level address describing how to open a connection to a peer.
///
/// Stringified as `{transport} -h {host} -p {port} [-t {timeout_ms}]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Endpoint {
    pub transport: String,
    pub host: String,
    pub port: u16,
    /// Connection timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Endpoint {
    pub fn new(transport: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            transport: transport.into(),
            host: host.into(),
            port,
            timeout: None,
        }
    }

    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::new("tcp", host, port)
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Parse a stringified endpoint.
    ///
    /// Options may appear in any order; `-t -1` and `-t infinite` mean no timeout.
    pub fn parse(s: &str) -> Result<Self, ProxyParseError> {
        let mut tokens = s.split_whitespace();
        let transport = tokens
            .next()
            .ok_or_else(|| ProxyParseError::Endpoint("empty endpoint".to_owned()))?;

        let mut host = None;
        let mut port = None;
        let mut timeout = None;

        while let Some(option) = tokens.next() {
            let value = tokens.next().ok_or_else(|| {
                ProxyParseError::Endpoint(format!("option '{option}' requires a value in '{s}'"))
            })?;

            match option {
                "-h" => host = Some(value.to_owned()),
                "-p" => {
                    let parsed = value.parse::<u16>().map_err(|_| {
                        ProxyParseError::Endpoint(format!("invalid port '{value}' in '{s}'"))
                    })?;
                    port = Some(parsed);
                }
                "-t" => {
                    timeout = match value {
                        "-1" | "infinite" => None,
                        ms => {
                            let ms = ms.parse::<u64>().map_err(|_| {
                                ProxyParseError::Endpoint(format!("invalid timeout '{ms}' in '{s}'"))
                            })?;
                            Some(Duration::from_millis(ms))
                        }
                    }
                }
                other => {
                    return Err(ProxyParseError::Endpoint(format!(
                        "unknown option '{other}' in '{s}'"
                    )));
                }
            }
        }

        let host = host
            .ok_or_else(|| ProxyParseError::Endpoint(format!("missing host in '{s}'")))?;
        let port = port
            .ok_or_else(|| ProxyParseError::Endpoint(format!("missing port in '{s}'")))?;

        Ok(Endpoint {
            transport: transport.to_owned(),
            host,
            port,
            timeout,
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -h {} -p {}", self.transport, self.host, self.port)?;
        if let Some(timeout) = self.timeout {
            write!(f, " -t {}", timeout.as_millis())?;
        }
        Ok(())
    }
}

/// A local reference to a remote object: its identity, the endpoints it is
/// reachable at, and optionally the router its requests are relayed through.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectProxy {
    identity: Identity,
    endpoints: Vec<Endpoint>,
    router: Option<Box<ObjectProxy>>,
}

impl ObjectProxy {
    pub fn new(identity: Identity, endpoints: Vec<Endpoint>) -> Self {
        Self {
            identity,
            endpoints,
            router: None,
        }
    }

    /// Parse a stringified proxy.
    ///
    /// Expected format: `{identity}:{endpoint}:{endpoint}...`. A proxy without
    /// endpoints is allowed.
    pub fn parse(s: &str) -> Result<Self, ProxyParseError> {
        let mut parts = s.split(':');
        let identity = parts
            .next()
            .filter(|identity| !identity.trim().is_empty())
            .ok_or_else(|| ProxyParseError::Proxy(format!("missing identity in '{s}'")))?;
        let identity = Identity::parse(identity)?;

        let endpoints = parts
            .map(Endpoint::parse)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ObjectProxy::new(identity, endpoints))
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// The router this proxy's requests are relayed through, if any.
    pub fn router(&self) -> Option<&ObjectProxy> {
        self.router.as_deref()
    }

    pub fn is_routed(&self) -> bool {
        self.router.is_some()
    }

    /// Return a copy of this proxy relayed through `router`.
    pub fn with_router(&self, router: Option<ObjectProxy>) -> Self {
        Self {
            identity: self.identity.clone(),
            endpoints: self.endpoints.clone(),
            router: router.map(Box::new),
        }
    }

    /// Return a copy of this proxy with any router indirection stripped.
    pub fn without_router(&self) -> Self {
        self.with_router(None)
    }

    /// Return a copy of this proxy with every endpoint's timeout replaced.
    pub fn with_timeout(&self, timeout: Option<Duration>) -> Self {
        Self {
            identity: self.identity.clone(),
            endpoints: self
                .endpoints
                .iter()
                .cloned()
                .map(|endpoint| endpoint.with_timeout(timeout))
                .collect(),
            router: self.router.clone(),
        }
    }
}

impl fmt::Display for ObjectProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity)?;
        for endpoint in &self.endpoints {
            write!(f, ":{endpoint}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_parse() {
        let identity = Identity::parse("Glacier2/router").unwrap();
        assert_eq!(identity.category, "Glacier2");
        assert_eq!(identity.name, "router");
        assert_eq!(identity.to_string(), "Glacier2/router");
    }

    #[test]
    fn test_identity_without_category() {
        let identity = Identity::parse("hello").unwrap();
        assert_eq!(identity, Identity::new("hello"));
        assert_eq!(identity.to_string(), "hello");
    }

    #[test]
    fn test_identity_rejects_empty_name() {
        assert!(Identity::parse("Glacier2/").is_err());
        assert!(Identity::parse("").is_err());
        assert!(Identity::parse("a/b/c").is_err());
    }

    #[test]
    fn test_endpoint_parse() {
        let endpoint = Endpoint::parse("tcp -h 10.0.0.1 -p 4063 -t 5000").unwrap();
        assert_eq!(endpoint.transport, "tcp");
        assert_eq!(endpoint.host, "10.0.0.1");
        assert_eq!(endpoint.port, 4063);
        assert_eq!(endpoint.timeout, Some(Duration::from_millis(5000)));
        assert_eq!(endpoint.to_string(), "tcp -h 10.0.0.1 -p 4063 -t 5000");
    }

    #[test]
    fn test_endpoint_infinite_timeout() {
        let endpoint = Endpoint::parse("ssl -p 4064 -h router.example.com -t infinite").unwrap();
        assert_eq!(endpoint, Endpoint::new("ssl", "router.example.com", 4064));
    }

    #[test]
    fn test_endpoint_missing_port() {
        assert!(Endpoint::parse("tcp -h localhost").is_err());
        assert!(Endpoint::parse("tcp -h localhost -p").is_err());
        assert!(Endpoint::parse("tcp -h localhost -p 99999").is_err());
        assert!(Endpoint::parse("tcp -h localhost -p 1 -z 3").is_err());
    }

    #[test]
    fn test_proxy_parse() {
        let proxy =
            ObjectProxy::parse("Glacier2/router:tcp -h 10.0.0.1 -p 4063:ssl -h 10.0.0.1 -p 4064")
                .unwrap();
        assert_eq!(proxy.identity(), &Identity::new("router").with_category("Glacier2"));
        assert_eq!(proxy.endpoints().len(), 2);
        assert_eq!(proxy.endpoints()[1].transport, "ssl");
        assert!(!proxy.is_routed());
        assert_eq!(
            proxy.to_string(),
            "Glacier2/router:tcp -h 10.0.0.1 -p 4063:ssl -h 10.0.0.1 -p 4064"
        );
    }

    #[test]
    fn test_proxy_without_endpoints() {
        let proxy = ObjectProxy::parse("printer").unwrap();
        assert!(proxy.endpoints().is_empty());
        assert!(ObjectProxy::parse(":tcp -h a -p 1").is_err());
    }

    #[test]
    fn test_without_router_strips_indirection() {
        let router = ObjectProxy::parse("Glacier2/router:tcp -h gw -p 4063").unwrap();
        let proxy = ObjectProxy::parse("printer:tcp -h backend -p 10000").unwrap();

        let routed = proxy.with_router(Some(router.clone()));
        assert!(routed.is_routed());
        assert_eq!(routed.router(), Some(&router));
        assert_ne!(routed, proxy);
        assert_eq!(routed.without_router(), proxy);
    }

    #[test]
    fn test_with_timeout_rewrites_every_endpoint() {
        let proxy = ObjectProxy::parse("printer:tcp -h a -p 1 -t 100:tcp -h b -p 2").unwrap();
        let rewritten = proxy.with_timeout(Some(Duration::from_secs(3)));
        assert!(
            rewritten
                .endpoints()
                .iter()
                .all(|endpoint| endpoint.timeout == Some(Duration::from_secs(3)))
        );
        assert_eq!(rewritten.identity(), proxy.identity());
    }
}
