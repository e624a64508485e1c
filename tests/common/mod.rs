#![allow(dead_code)]

pub mod temp_files {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

    /// Creates a temporary spec file with a unique name
    pub fn create_temp_spec(content: &str, ext: &str) -> PathBuf {
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::SeqCst);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();

        let path = std::env::temp_dir().join(format!(
            "apiform_test_{}_{}_{}.{}",
            std::process::id(),
            counter,
            nanos,
            ext
        ));

        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn create_temp_yaml(content: &str) -> PathBuf {
        create_temp_spec(content, "yaml")
    }

    pub fn create_temp_json(content: &str) -> PathBuf {
        create_temp_spec(content, "json")
    }

    /// Cleanup temporary files (best effort)
    pub fn cleanup_temp_files(paths: &[PathBuf]) {
        for path in paths {
            let _ = std::fs::remove_file(path);
        }
    }
}

pub mod mock_server {
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc::{channel, Receiver};
    use std::thread;
    use std::time::Duration;

    /// One canned HTTP answer
    #[derive(Debug, Clone)]
    pub struct Reply {
        pub status: u16,
        pub content_type: &'static str,
        pub body: String,
        /// Wait this long before answering
        pub delay: Duration,
    }

    impl Reply {
        pub fn json(status: u16, body: serde_json::Value) -> Self {
            Reply {
                status,
                content_type: "application/json",
                body: body.to_string(),
                delay: Duration::ZERO,
            }
        }

        pub fn text(status: u16, body: &str) -> Self {
            Reply {
                status,
                content_type: "text/plain",
                body: body.to_string(),
                delay: Duration::ZERO,
            }
        }

        pub fn delayed(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    /// What the server saw for one request
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub method: String,
        /// Request target (path plus query)
        pub target: String,
        /// Header names lowercased
        pub headers: Vec<(String, String)>,
        pub body: String,
    }

    impl RecordedRequest {
        pub fn header(&self, name: &str) -> Option<&str> {
            let name = name.to_ascii_lowercase();
            self.headers
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| v.as_str())
        }
    }

    pub struct MockServer {
        pub base_url: String,
        requests: Receiver<RecordedRequest>,
    }

    impl MockServer {
        /// Next recorded request, waiting up to five seconds
        pub fn next_request(&self) -> RecordedRequest {
            self.requests
                .recv_timeout(Duration::from_secs(5))
                .expect("mock server saw no request")
        }
    }

    fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let header_end = loop {
            let n = stream.read(&mut chunk).ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let mut lines = head.split("\r\n");
        let mut request_line = lines.next()?.split_whitespace();
        let method = request_line.next()?.to_string();
        let target = request_line.next()?.to_string();
        let headers: Vec<(String, String)> = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(n, v)| (n.trim().to_ascii_lowercase(), v.trim().to_string()))
            .collect();

        let length = headers
            .iter()
            .find(|(n, _)| n == "content-length")
            .and_then(|(_, v)| v.parse::<usize>().ok())
            .unwrap_or(0);
        let mut body = buf[header_end + 4..].to_vec();
        while body.len() < length {
            let n = stream.read(&mut chunk).ok()?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }

        Some(RecordedRequest {
            method,
            target,
            headers,
            body: String::from_utf8_lossy(&body).to_string(),
        })
    }

    fn reason(status: u16) -> &'static str {
        match status {
            200 => "OK",
            201 => "Created",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            _ => "Status",
        }
    }

    /// Serve `replies` in order, one connection each, then stop
    pub fn start(replies: Vec<Reply>) -> MockServer {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = channel();
        thread::spawn(move || {
            for reply in replies {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                if let Some(request) = read_request(&mut stream) {
                    let _ = tx.send(request);
                }
                thread::sleep(reply.delay);
                let resp = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    reply.status,
                    reason(reply.status),
                    reply.content_type,
                    reply.body.len(),
                    reply.body
                );
                let _ = stream.write_all(resp.as_bytes());
                let _ = stream.flush();
            }
        });
        MockServer {
            base_url: format!("http://{}:{}", addr.ip(), addr.port()),
            requests: rx,
        }
    }
}

pub mod fixtures {
    use serde_json::{json, Value};

    /// A small pet store with a login endpoint, a protected list and a JSON body
    pub fn petstore() -> Value {
        json!({
            "openapi": "3.0.3",
            "info": {"title": "Pet Store", "version": "1.2.0", "description": "Pets and owners"},
            "tags": [
                {"name": "pets", "description": "Everything about pets"},
                {"name": "auth"}
            ],
            "components": {
                "securitySchemes": {
                    "bearerAuth": {"type": "http", "scheme": "bearer"},
                    "apiKeyAuth": {"type": "apiKey", "in": "header", "name": "X-API-Key"}
                },
                "schemas": {
                    "Owner": {
                        "type": "object",
                        "required": ["name"],
                        "properties": {
                            "name": {"type": "string"},
                            "email": {"type": "string"}
                        }
                    },
                    "Pet": {
                        "type": "object",
                        "required": ["name", "status"],
                        "properties": {
                            "name": {"type": "string"},
                            "age": {"type": "integer"},
                            "status": {"type": "string", "enum": ["available", "sold"], "default": "available"},
                            "owner": {"$ref": "#/components/schemas/Owner"},
                            "vaccinations": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "required": ["vaccine"],
                                    "properties": {
                                        "vaccine": {"type": "string"},
                                        "year": {"type": "integer"}
                                    }
                                }
                            },
                            "nicknames": {"type": "array", "items": {"type": "string"}}
                        }
                    }
                }
            },
            "paths": {
                "/auth/login": {
                    "post": {
                        "tags": ["auth"],
                        "operationId": "login",
                        "requestBody": {"content": {"application/x-www-form-urlencoded": {"schema": {
                            "type": "object",
                            "required": ["username", "password"],
                            "properties": {
                                "grant_type": {"type": "string", "pattern": "^password$"},
                                "username": {"type": "string"},
                                "password": {"type": "string"},
                                "scope": {"type": "string"}
                            }
                        }}}}
                    }
                },
                "/pets": {
                    "get": {
                        "tags": ["pets"],
                        "operationId": "listPets",
                        "summary": "List pets",
                        "security": [{"bearerAuth": []}],
                        "parameters": [
                            {"name": "limit", "in": "query", "schema": {"type": "integer"}}
                        ]
                    },
                    "post": {
                        "tags": ["pets"],
                        "operationId": "createPet",
                        "requestBody": {"content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}}
                    }
                },
                "/pets/{petId}": {
                    "parameters": [
                        {"name": "petId", "in": "path", "required": true, "schema": {"type": "string"}}
                    ],
                    "get": {"tags": ["pets"], "operationId": "getPet"},
                    "delete": {"tags": ["pets"], "operationId": "deletePet"}
                },
                "/health": {
                    "get": {"operationId": "health"}
                }
            }
        })
    }
}
