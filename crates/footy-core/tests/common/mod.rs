//! Minimal HTTP server standing in for the football API and the backend.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Clone)]
struct Route {
    status: u16,
    body: String,
    delay: Duration,
}

/// One request as the server saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: String,
    pub target: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct State {
    routes: HashMap<String, Route>,
    hits: HashMap<String, usize>,
    api_keys: Vec<Option<String>>,
    requests: Vec<Recorded>,
}

/// Serves canned JSON keyed by request target relative to `/v3/`
/// (e.g. `standings?league=39&season=2023`) and counts hits per target.
/// A route registered with a method (`"DELETE users/x"`) wins over the
/// bare target.
#[derive(Clone)]
pub struct FakeApi {
    addr: std::net::SocketAddr,
    state: Arc<Mutex<State>>,
}

impl FakeApi {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(State::default()));

        let accept_state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&accept_state)));
            }
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/v3/", self.addr)
    }

    pub fn route(&self, target: &str, body: Value) -> &Self {
        self.route_with(target, 200, body, Duration::ZERO)
    }

    pub fn slow_route(&self, target: &str, body: Value, delay: Duration) -> &Self {
        self.route_with(target, 200, body, delay)
    }

    pub fn route_with(&self, target: &str, status: u16, body: Value, delay: Duration) -> &Self {
        self.state.lock().unwrap().routes.insert(
            target.to_string(),
            Route {
                status,
                body: body.to_string(),
                delay,
            },
        );
        self
    }

    pub fn hits(&self, target: &str) -> usize {
        self.state.lock().unwrap().hits.get(target).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.state.lock().unwrap().hits.values().sum()
    }

    pub fn api_keys(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().api_keys.clone()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn last_request(&self) -> Recorded {
        self.requests().pop().expect("no request recorded")
    }
}

fn header<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(n, _)| n.trim().eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim())
}

async fn serve(mut stream: TcpStream, state: Arc<Mutex<State>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let split = buf.windows(4).position(|w| w == b"\r\n\r\n").unwrap() + 4;
    let head = String::from_utf8_lossy(&buf[..split]).to_string();
    let mut request_line = head.lines().next().unwrap_or("").split_whitespace();
    let method = request_line.next().unwrap_or("GET").to_string();
    let target = request_line
        .next()
        .unwrap_or("/")
        .trim_start_matches("/v3/")
        .to_string();
    let api_key = header(&head, "x-rapidapi-key").map(str::to_string);
    let authorization = header(&head, "authorization").map(str::to_string);

    let length: usize = header(&head, "content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut body = buf[split..].to_vec();
    while body.len() < length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => body.extend_from_slice(&chunk[..n]),
        }
    }
    let body = (!body.is_empty()).then(|| serde_json::from_slice(&body).unwrap_or(Value::Null));

    let route = {
        let mut state = state.lock().unwrap();
        *state.hits.entry(target.clone()).or_insert(0) += 1;
        state.api_keys.push(api_key);
        state.requests.push(Recorded {
            method: method.clone(),
            target: target.clone(),
            authorization,
            body,
        });
        let by_method = format!("{} {}", method, target);
        state
            .routes
            .get(&by_method)
            .or_else(|| state.routes.get(&target))
            .cloned()
    };
    let route = route.unwrap_or(Route {
        status: 404,
        body: format!("{{\"message\":\"no route for {}\"}}", target),
        delay: Duration::ZERO,
    });

    if !route.delay.is_zero() {
        tokio::time::sleep(route.delay).await;
    }

    let response = format!(
        "HTTP/1.1 {} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        route.status,
        route.body.len(),
        route.body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}
