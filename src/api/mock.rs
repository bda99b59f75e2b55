//! Scripted backend for HTTP tests.

use std::{io::Read, thread, time::Duration};

use serde_json::Value;
use tiny_http::{Header, Response, Server};

/// A request as the backend saw it.
#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub method: String,
    /// Path plus query string.
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub(crate) struct MockServer {
    pub origin: String,
    handle: thread::JoinHandle<Vec<Recorded>>,
}

impl MockServer {
    /// Waits for the script to run out and returns what was received.
    pub fn finish(self) -> Vec<Recorded> {
        self.handle.join().expect("server thread")
    }
}

/// Answers requests in order with the given `(status, body)` replies.
///
/// Stops after the last reply, or after two quiet seconds.
pub(crate) fn serve(replies: Vec<(u16, &'static str)>) -> MockServer {
    let server = Server::http("127.0.0.1:0").expect("http server");
    let origin = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for (status, body) in replies {
            let Ok(Some(mut request)) = server.recv_timeout(Duration::from_secs(2)) else {
                break;
            };
            let mut bytes = Vec::new();
            request
                .as_reader()
                .read_to_end(&mut bytes)
                .expect("read body");
            seen.push(Recorded {
                method: request.method().to_string(),
                path: request.url().to_string(),
                headers: request
                    .headers()
                    .iter()
                    .map(|h| (h.field.to_string(), h.value.to_string()))
                    .collect(),
                body: bytes,
            });
            let response = Response::from_string(body)
                .with_status_code(status)
                .with_header(
                    Header::from_bytes("Content-Type", "application/json").expect("header"),
                );
            request.respond(response).expect("respond");
        }
        seen
    });

    MockServer { origin, handle }
}
