#[cfg(test)]
mod tests {
    use monoreq::{BodyMode, Error, Part, Request, TransportConfig};
    use monoreq_backend_memory::Script;

    const TERMINATOR: &[u8] = b"--00content0boundary00--";

    fn occurrences(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn test_repeated_reads_close_output_once() {
        const PATH: &str = "/lifecycle/close_once";
        let backend = crate::mount(PATH, Script::ok());

        let mut request = Request::post(crate::url(PATH))
            .unwrap()
            .part(Part::text("f", "hi"))
            .unwrap();
        assert_eq!(request.code().unwrap().code(), 200);
        assert_eq!(request.code().unwrap().code(), 200);
        assert_eq!(request.message().unwrap(), "OK");

        let recording = backend.recorded(PATH).unwrap();
        assert!(recording.body_closed);
        assert_eq!(occurrences(&recording.body, TERMINATOR), 1);
    }

    #[test]
    fn test_bodyless_request_never_opens_output() {
        const PATH: &str = "/lifecycle/no_output";
        let backend = crate::mount(PATH, Script::ok().body("hi"));

        let mut request = Request::get(crate::url(PATH)).unwrap();
        assert_eq!(request.body().unwrap(), "hi");

        let recording = backend.recorded(PATH).unwrap();
        assert!(!recording.body_opened);
        assert!(!recording.body_closed);
        assert!(recording.body.is_empty());
    }

    #[test]
    fn test_writes_after_response_rejected() {
        const PATH: &str = "/lifecycle/write_after_close";
        crate::mount(PATH, Script::ok());

        let mut request = Request::post(crate::url(PATH))
            .unwrap()
            .send_bytes(b"payload")
            .unwrap();
        assert!(request.ok().unwrap());
        let err = request.send_bytes(b"more").unwrap_err();
        assert!(matches!(err, Error::OutputClosed));

        // The closed check fires before the mode check.
        let mut request = Request::post(crate::url(PATH))
            .unwrap()
            .send_bytes(b"payload")
            .unwrap();
        assert!(request.ok().unwrap());
        let err = request.form("late", "pair").unwrap_err();
        assert!(matches!(err, Error::OutputClosed));
    }

    #[test]
    fn test_body_mode_conflicts_rejected() {
        const PATH: &str = "/lifecycle/mode_conflict";
        crate::mount(PATH, Script::ok());

        let err = Request::post(crate::url(PATH))
            .unwrap()
            .form("user", "alice")
            .unwrap()
            .part(Part::text("f", "hi"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ModeConflict {
                active: BodyMode::Form,
                requested: BodyMode::Multipart,
            }
        ));

        let err = Request::post(crate::url(PATH))
            .unwrap()
            .send_text("raw")
            .unwrap()
            .form("user", "alice")
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ModeConflict {
                active: BodyMode::Plain,
                requested: BodyMode::Form,
            }
        ));

        let err = Request::post(crate::url(PATH))
            .unwrap()
            .part(Part::text("f", "hi"))
            .unwrap()
            .send_bytes(b"raw")
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ModeConflict {
                active: BodyMode::Multipart,
                requested: BodyMode::Plain,
            }
        ));
    }

    #[test]
    fn test_transport_changes_rejected_after_connection() {
        const PATH: &str = "/lifecycle/late_transport";
        crate::mount(PATH, Script::ok());

        let mut request = Request::get(crate::url(PATH)).unwrap();
        assert!(request.ok().unwrap());
        let err = request.use_proxy("proxy.local", 3128).unwrap_err();
        assert!(matches!(err, Error::ConnectionAlreadyOpen));

        let mut request = Request::get(crate::url(PATH)).unwrap();
        assert!(request.ok().unwrap());
        let err = request.transport_config(TransportConfig::default()).unwrap_err();
        assert!(matches!(err, Error::ConnectionAlreadyOpen));
    }

    #[test]
    fn test_disconnect_counts_every_call() {
        const PATH: &str = "/lifecycle/disconnect";
        let backend = crate::mount(PATH, Script::ok());

        let mut request = Request::get(crate::url(PATH)).unwrap();
        request.disconnect().unwrap();
        request.disconnect().unwrap();

        let recording = backend.recorded(PATH).unwrap();
        assert_eq!(recording.method, "GET");
        assert_eq!(recording.disconnects, 2);
    }
}
