#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};

    use monoreq::{Error, Request};
    use monoreq_backend_memory::Script;

    #[test]
    fn test_close_failure_swallowed_by_default() {
        const PATH: &str = "/errors/close_swallowed";
        let backend = crate::mount(PATH, Script::ok().fail_body_close());

        let mut request = Request::post(crate::url(PATH))
            .unwrap()
            .send_bytes(b"payload")
            .unwrap();
        assert!(request.ok().unwrap());

        let recording = backend.recorded(PATH).unwrap();
        assert_eq!(recording.body, b"payload");
        assert!(recording.body_closed);
    }

    #[test]
    fn test_close_failure_surfaced_when_not_ignored() {
        const PATH: &str = "/errors/close_surfaced";
        crate::mount(PATH, Script::ok().fail_body_close());

        let mut request = Request::post(crate::url(PATH))
            .unwrap()
            .ignore_close_errors(false)
            .send_bytes(b"payload")
            .unwrap();
        let err = request.code().unwrap_err();
        assert!(matches!(err, Error::Io(_)));

        // The channel closed on the first attempt; the status is still there.
        assert_eq!(request.code().unwrap().code(), 200);
    }

    #[test]
    fn test_buffered_flush_failure_swallowed_at_close() {
        const PATH: &str = "/errors/flush_at_close";
        let backend = crate::mount(PATH, Script::ok().fail_body_write_at(0));

        // Two bytes sit in the sink buffer until the close flush pushes them
        // into the failing writer.
        let mut request = Request::post(crate::url(PATH))
            .unwrap()
            .send_text("hi")
            .unwrap();
        assert!(request.ok().unwrap());

        let recording = backend.recorded(PATH).unwrap();
        assert!(recording.body.is_empty());
        assert!(recording.body_closed);
    }

    #[test]
    fn test_flush_error_wins_over_close_error() {
        const PATH: &str = "/errors/flush_wins";
        crate::mount(PATH, Script::ok().fail_body_write_at(0).fail_body_close());

        let mut request = Request::post(crate::url(PATH))
            .unwrap()
            .ignore_close_errors(false)
            .send_text("hi")
            .unwrap();
        let err = request.code().unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn test_flush_failure_surfaces_after_text_copy() {
        const PATH: &str = "/errors/reader_flush";
        crate::mount(PATH, Script::ok().fail_body_write_at(0));

        // The copy itself lands in the sink buffer and succeeds; the flush that
        // follows it must still report the damage.
        let err = Request::post(crate::url(PATH))
            .unwrap()
            .send_reader(Cursor::new("hi"))
            .unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn test_write_failure_fails_the_send() {
        const PATH: &str = "/errors/write_failure";
        crate::mount(PATH, Script::ok().fail_body_write_at(0).fail_body_close());

        let err = Request::post(crate::url(PATH))
            .unwrap()
            .buffer_size(2)
            .send_bytes(b"hello")
            .unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn test_missing_script_surfaces_open_error() {
        monoreq_backend_memory::install();

        let err = Request::get(crate::url("/errors/never_mounted"))
            .unwrap()
            .send_bytes(b"x")
            .unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::NotFound));
    }
}
