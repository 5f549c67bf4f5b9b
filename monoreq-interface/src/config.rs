//! Transport configuration handed to connection factories.

/// An HTTP proxy endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proxy {
    /// Proxy host name or address.
    pub host: String,
    /// Proxy port.
    pub port: u16,
}

/// Caller-owned transport knobs applied to every connection created from it.
///
/// The facade keeps one instance per request and passes it to
/// [`crate::ConnectionFactory::open`] when the connection is finally created. Changing
/// a field therefore affects connections created afterwards and never a connection that
/// already exists.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    /// Proxy to route the exchange through, if any.
    pub proxy: Option<Proxy>,
    /// Host patterns that bypass the proxy.
    pub non_proxy_hosts: Vec<String>,
    /// Whether the transport should be kept alive after the exchange, when the
    /// platform supports pooling. `None` leaves the platform default in place.
    pub keep_alive: Option<bool>,
    /// Upper bound on concurrent connections per destination, when the platform
    /// supports it.
    pub max_connections: Option<u32>,
    /// Whether platform-level response caches may serve this exchange.
    pub use_caches: bool,
    /// Disables server certificate validation.
    pub trust_all_certs: bool,
    /// Disables host name verification.
    pub trust_all_hosts: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            non_proxy_hosts: vec![],
            keep_alive: None,
            max_connections: None,
            use_caches: true,
            trust_all_certs: false,
            trust_all_hosts: false,
        }
    }
}
