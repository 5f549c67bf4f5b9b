#[cfg(test)]
mod tests {
    use std::fs;
    use std::future::Future;
    use std::io::{self, Cursor};
    use std::pin::pin;
    use std::task::{Context, Poll};

    use futures::stream;
    use futures::task::noop_waker_ref;
    use monoreq::{Part, Request};
    use monoreq_backend_memory::Script;

    const TERMINATOR: &[u8] = b"--00content0boundary00--";

    /// Drives a future that is known to resolve without waiting.
    fn poll_once<F: Future<Output = T>, T>(fut: F) -> T {
        let fut = pin!(fut);
        match fut.poll(&mut Context::from_waker(noop_waker_ref())) {
            Poll::Ready(val) => val,
            Poll::Pending => panic!("future did not resolve immediately"),
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    struct FormItem {
        name: String,
        file_name: Option<String>,
        content_type: Option<String>,
        bytes: Vec<u8>,
    }

    /// Parses a recorded multipart body back into its parts.
    fn parse_back(content_type: &str, body: Vec<u8>) -> Vec<FormItem> {
        let boundary = multer::parse_boundary(content_type).unwrap();
        let mut multipart = multer::Multipart::new(
            stream::once(async move { Ok::<_, io::Error>(body) }),
            boundary,
        );
        let mut items = Vec::new();
        while let Some(field) = poll_once(multipart.next_field()).unwrap() {
            items.push(FormItem {
                name: field.name().unwrap_or_default().to_owned(),
                file_name: field.file_name().map(str::to_owned),
                content_type: field.content_type().map(|mime| mime.to_string()),
                bytes: poll_once(field.bytes()).unwrap().to_vec(),
            });
        }
        items
    }

    fn occurrences(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn test_multipart_parts_parse_back() {
        const PATH: &str = "/multipart/parse_back";
        let backend = crate::mount(PATH, Script::ok());

        let mut request = Request::post(crate::url(PATH))
            .unwrap()
            .part(Part::text("caption", "ttt").content_type("text/plain"))
            .unwrap()
            .part(
                Part::bytes("track", b"ID3")
                    .filename("3253212.mp3")
                    .content_type("audio/mpeg"),
            )
            .unwrap()
            .part(Part::display("count", 2))
            .unwrap();
        assert!(request.ok().unwrap());

        let recording = backend.recorded(PATH).unwrap();
        let content_type = recording.header("content-type").unwrap().to_owned();
        assert_eq!(
            content_type,
            "multipart/form-data; boundary=00content0boundary00"
        );
        assert_eq!(occurrences(&recording.body, TERMINATOR), 1);

        let items = parse_back(&content_type, recording.body.clone());
        assert_eq!(
            items,
            vec![
                FormItem {
                    name: "caption".to_owned(),
                    file_name: None,
                    content_type: Some("text/plain".to_owned()),
                    bytes: b"ttt".to_vec(),
                },
                FormItem {
                    name: "track".to_owned(),
                    file_name: Some("3253212.mp3".to_owned()),
                    content_type: Some("audio/mpeg".to_owned()),
                    bytes: b"ID3".to_vec(),
                },
                FormItem {
                    name: "count".to_owned(),
                    file_name: None,
                    content_type: None,
                    bytes: b"2".to_vec(),
                },
            ]
        );
    }

    #[test]
    fn test_single_part_wire_format() {
        const PATH: &str = "/multipart/wire_format";
        let backend = crate::mount(PATH, Script::ok());

        let mut request = Request::post(crate::url(PATH))
            .unwrap()
            .part(
                Part::text("f", "hi")
                    .filename("a.txt")
                    .content_type("text/plain"),
            )
            .unwrap();
        assert!(request.ok().unwrap());

        let expected = "--00content0boundary00\r\n\
            Content-Disposition: form-data; name=\"f\"; filename=\"a.txt\"\r\n\
            Content-Type: text/plain\r\n\
            \r\n\
            hi\r\n\
            --00content0boundary00--\r\n";
        assert_eq!(backend.recorded(PATH).unwrap().body, expected.as_bytes());
    }

    #[test]
    fn test_multipart_file_and_stream_parts() {
        const PATH: &str = "/multipart/file_and_stream";
        let backend = crate::mount(PATH, Script::ok());

        let file = std::env::temp_dir().join(format!("monoreq-part-{}.txt", std::process::id()));
        fs::write(&file, b"file payload").unwrap();
        let mut request = Request::post(crate::url(PATH))
            .unwrap()
            .part(Part::file("upload", &file).filename("data.txt"))
            .unwrap()
            .part(Part::stream("feed", Cursor::new(b"streamed".to_vec())))
            .unwrap();
        assert!(request.ok().unwrap());
        fs::remove_file(&file).unwrap();

        let recording = backend.recorded(PATH).unwrap();
        let items = parse_back(recording.header("content-type").unwrap(), recording.body.clone());
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "upload");
        assert_eq!(items[0].file_name.as_deref(), Some("data.txt"));
        assert_eq!(items[0].bytes, b"file payload");
        assert_eq!(items[1].name, "feed");
        assert_eq!(items[1].bytes, b"streamed");

        // Only the file length was known up front; both payloads were metered.
        assert_eq!(request.total_expected(), Some(12));
        assert_eq!(request.total_written(), 20);
    }
}
