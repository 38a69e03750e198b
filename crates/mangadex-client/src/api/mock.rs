//! Scripted in-memory transport for unit tests.

use std::sync::Mutex;

use serde_json::Value;

use super::query::QueryParams;
use super::transport::Transport;
use super::Method;
use crate::error::Result;

/// One request as the transport saw it.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Call {
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

type Handler = Box<dyn Fn(&Call) -> Result<Value> + Send + Sync>;

pub struct MockTransport {
    handler: Handler,
    calls: Mutex<Vec<Call>>,
}

impl MockTransport {
    pub fn new(handler: impl Fn(&Call) -> Result<Value> + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A transport that must never be reached.
    pub fn unreachable() -> Self {
        Self::new(|call| panic!("unexpected request: {} {}", call.method, call.path))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn dispatch(&self, call: Call) -> Result<Value> {
        let response = (self.handler)(&call);
        self.calls.lock().unwrap().push(call);
        response
    }
}

impl Transport for MockTransport {
    async fn request(&self, path: &str, method: Method, body: Option<&Value>) -> Result<Value> {
        self.dispatch(Call {
            method,
            path: path.to_string(),
            query: Vec::new(),
            body: body.cloned(),
        })
    }

    async fn parameterized_request(&self, path: &str, params: &QueryParams) -> Result<Value> {
        self.dispatch(Call {
            method: Method::GET,
            path: path.to_string(),
            query: params.to_pairs(),
            body: None,
        })
    }
}
