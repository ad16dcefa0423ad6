#![allow(dead_code)]

pub mod http {
    use serde_json::Value;
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Status, content type and body of a raw HTTP response.
    #[derive(Debug)]
    pub struct TestResponse {
        pub status: u16,
        pub content_type: String,
        pub body: Vec<u8>,
    }

    impl TestResponse {
        pub fn json(&self) -> Value {
            serde_json::from_slice(&self.body).unwrap_or_else(|e| {
                panic!(
                    "body is not JSON ({e}): {}",
                    String::from_utf8_lossy(&self.body)
                )
            })
        }

        pub fn text(&self) -> String {
            String::from_utf8_lossy(&self.body).into_owned()
        }
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    /// Status, content type and content length from the response head.
    fn parse_head(head: &str) -> (u16, String, usize) {
        let mut status = 0;
        let mut content_type = String::new();
        let mut content_length = 0;
        for line in head.lines() {
            if line.starts_with("HTTP/1.1") {
                status = line
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or("0")
                    .parse()
                    .unwrap();
            } else if let Some((name, val)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-type") {
                    content_type = val.trim().to_string();
                } else if name.eq_ignore_ascii_case("content-length") {
                    content_length = val.trim().parse().unwrap();
                }
            }
        }
        (status, content_type, content_length)
    }

    /// Send raw request bytes and read one complete response.
    pub fn send_raw(addr: SocketAddr, request: &[u8]) -> TestResponse {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        stream.write_all(request).unwrap();

        let mut buf = Vec::new();
        let mut tmp = [0u8; 4096];
        loop {
            if let Some(end) = find(&buf, b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).into_owned();
                let (status, content_type, len) = parse_head(&head);
                if buf.len() >= end + 4 + len {
                    return TestResponse {
                        status,
                        content_type,
                        body: buf[end + 4..end + 4 + len].to_vec(),
                    };
                }
            }
            match stream.read(&mut tmp) {
                Ok(0) => panic!(
                    "connection closed mid-response: {}",
                    String::from_utf8_lossy(&buf)
                ),
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(e) => panic!("read error: {e:?}"),
            }
        }
    }

    pub fn request(
        addr: SocketAddr,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> TestResponse {
        let mut raw = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\n");
        for (name, value) in headers {
            raw.push_str(&format!("{name}: {value}\r\n"));
        }
        raw.push_str(&format!("Content-Length: {}\r\n\r\n", body.len()));
        let mut bytes = raw.into_bytes();
        bytes.extend_from_slice(body);
        send_raw(addr, &bytes)
    }

    pub fn get(addr: SocketAddr, path: &str) -> TestResponse {
        request(addr, "GET", path, &[], b"")
    }

    pub fn send_json(addr: SocketAddr, method: &str, path: &str, body: &Value) -> TestResponse {
        request(
            addr,
            method,
            path,
            &[("Content-Type", "application/json")],
            body.to_string().as_bytes(),
        )
    }

    pub fn post_form(
        addr: SocketAddr,
        path: &str,
        fields: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let mut all_headers = vec![("Content-Type", "application/x-www-form-urlencoded")];
        all_headers.extend_from_slice(headers);
        request(addr, "POST", path, &all_headers, body.as_bytes())
    }

    /// POST one file as `multipart/form-data`.
    pub fn post_file(
        addr: SocketAddr,
        path: &str,
        field: &str,
        filename: &str,
        content_type: &str,
        contents: &[u8],
    ) -> TestResponse {
        let boundary = "----person-api-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(contents);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        let content_type = format!("multipart/form-data; boundary={boundary}");
        request(
            addr,
            "POST",
            path,
            &[("Content-Type", content_type.as_str())],
            &body,
        )
    }
}

pub mod test_server {
    use person_api::config::AppConfig;
    use person_api::registry::build_service;
    use person_api::server::{HttpServer, ServerHandle};
    use std::net::{SocketAddr, TcpListener};
    use std::sync::Once;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }

    /// A running service on a free local port, stopped on drop.
    pub struct TestServer {
        handle: Option<ServerHandle>,
        addr: SocketAddr,
    }

    impl TestServer {
        pub fn start() -> Self {
            Self::with_config(AppConfig::default())
        }

        pub fn with_config(config: AppConfig) -> Self {
            setup_may_runtime();
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let addr = listener.local_addr().unwrap();
            drop(listener);

            let service = unsafe { build_service(config) };
            let handle = HttpServer(service).start(addr).unwrap();
            handle.wait_ready().unwrap();
            Self {
                handle: Some(handle),
                addr,
            }
        }

        pub fn addr(&self) -> SocketAddr {
            self.addr
        }
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            if let Some(handle) = self.handle.take() {
                handle.stop();
            }
        }
    }
}
