//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use stripe_api::clients::{HttpError, HttpRequest, HttpResponse, Transport};
use stripe_api::{ApiKey, StripeClient};

/// A transport that answers from a script and records every request.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response with the given status and body.
    pub fn respond(&self, code: u16, body: Value) -> &Self {
        self.respond_with_headers(code, &[], body)
    }

    /// Queues a response with headers.
    pub fn respond_with_headers(&self, code: u16, headers: &[(&str, &str)], body: Value) -> &Self {
        let headers = headers
            .iter()
            .map(|(name, value)| (name.to_lowercase(), vec![(*value).to_string()]))
            .collect::<HashMap<_, _>>();
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(code, headers, body)));
        self
    }

    /// Queues a transport error.
    pub fn fail(&self, error: HttpError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Returns copies of the requests sent so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Returns the query parameters of the `n`th request as a map.
    pub fn query(&self, n: usize) -> HashMap<String, String> {
        self.requests.lock().unwrap()[n].query.iter().cloned().collect()
    }
}

impl Transport for ScriptedTransport {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, HttpError>> + Send {
        self.requests.lock().unwrap().push(request);
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted response left");
        async move { response }
    }
}

/// Creates a client over the bundled manifests and a scripted transport.
pub fn scripted_client() -> (StripeClient<ScriptedTransport>, Arc<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport::new());
    let client = StripeClient::builder()
        .api_key(ApiKey::new("sk_test_123").unwrap())
        .build_with_transport(Arc::clone(&transport))
        .unwrap();
    (client, transport)
}

/// Builds a Stripe list page of charges with the given ids.
pub fn charge_page(ids: &[&str], has_more: bool) -> Value {
    let data: Vec<Value> = ids
        .iter()
        .map(|id| json!({"id": id, "object": "charge", "amount": 100}))
        .collect();
    json!({
        "object": "list",
        "url": "/v1/charges",
        "has_more": has_more,
        "data": data,
    })
}
