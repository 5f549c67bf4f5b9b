#[cfg(test)]
mod tests {
    use monoreq::{Proxy, Request, TransportConfig};
    use monoreq_backend_memory::Script;

    #[test]
    fn test_default_transport_reaches_factory() {
        const PATH: &str = "/transport/defaults";
        let backend = crate::mount(PATH, Script::ok());

        let mut request = Request::get(crate::url(PATH)).unwrap();
        assert!(request.ok().unwrap());

        assert_eq!(
            backend.recorded(PATH).unwrap().transport,
            TransportConfig::default()
        );
    }

    #[test]
    fn test_proxy_reaches_factory() {
        const PATH: &str = "/transport/proxy";
        let backend = crate::mount(PATH, Script::ok());

        let mut request = Request::get(crate::url(PATH))
            .unwrap()
            .use_proxy("proxy.local", 3128)
            .unwrap();
        assert!(request.ok().unwrap());

        assert_eq!(
            backend.recorded(PATH).unwrap().transport.proxy,
            Some(Proxy {
                host: "proxy.local".to_string(),
                port: 3128,
            })
        );
    }

    #[test]
    fn test_transport_flags_recorded() {
        const PATH: &str = "/transport/flags";
        let backend = crate::mount(PATH, Script::ok());

        let mut request = Request::get(crate::url(PATH))
            .unwrap()
            .trust_all_certs()
            .trust_all_hosts()
            .keep_alive(false)
            .max_connections(8)
            .use_caches(false)
            .non_proxy_hosts(["localhost", "*.internal"]);
        assert!(request.ok().unwrap());

        let transport = backend.recorded(PATH).unwrap().transport;
        assert!(transport.trust_all_certs);
        assert!(transport.trust_all_hosts);
        assert_eq!(transport.keep_alive, Some(false));
        assert_eq!(transport.max_connections, Some(8));
        assert!(!transport.use_caches);
        assert_eq!(transport.non_proxy_hosts, vec!["localhost", "*.internal"]);
    }

    #[test]
    fn test_transport_config_replaces_everything() {
        const PATH: &str = "/transport/replace";
        let backend = crate::mount(PATH, Script::ok());

        let config = TransportConfig {
            proxy: Some(Proxy {
                host: "gateway".to_string(),
                port: 8080,
            }),
            non_proxy_hosts: vec!["db.internal".to_string()],
            keep_alive: Some(true),
            max_connections: Some(2),
            use_caches: false,
            trust_all_certs: true,
            trust_all_hosts: false,
        };
        let mut request = Request::get(crate::url(PATH))
            .unwrap()
            .keep_alive(false)
            .transport_config(config.clone())
            .unwrap();
        assert!(request.ok().unwrap());

        assert_eq!(backend.recorded(PATH).unwrap().transport, config);
    }
}
