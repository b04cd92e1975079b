//! WireMock-based Ringo API mocking infrastructure
//!
//! Simulates the Ringo cloud endpoints under `/api/` so the client can be
//! exercised without vendor credentials. Every mock can carry an expected
//! call count, verified when the server is dropped.

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::{
    matchers::{body_partial_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

pub const CLIENT_ID: &str = "test-client";
pub const SECRET: &str = "test-secret";
pub const TOKEN: &str = "tok-0123456789abcdef";

/// Mock Ringo cloud API
pub struct MockRingoServer {
    pub server: MockServer,
    pub base_url: String,
}

impl MockRingoServer {
    /// Start an empty mock server; tests mount the endpoints they need
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = format!("{}/api/", server.uri());
        Self { server, base_url }
    }

    /// Start a server answering token, locks and key-list requests
    pub async fn with_defaults() -> Self {
        let mock = Self::start().await;
        mock.mock_token(None).await;
        mock.mock_locks(sample_locks(), None).await;
        mock.mock_key_list(sample_keys(), None).await;
        mock
    }

    /// Token endpoint accepting the test credentials
    pub async fn mock_token(&self, expected_calls: Option<u64>) {
        self.mock_token_delayed(Duration::ZERO, expected_calls).await;
    }

    /// Token endpoint that answers after `delay`
    pub async fn mock_token_delayed(&self, delay: Duration, expected_calls: Option<u64>) {
        let mock = Mock::given(method("GET"))
            .and(path("/api/token"))
            .and(header("Ringo-Api-Client", CLIENT_ID))
            .and(header("Ringo-Api-Secret", SECRET))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": TOKEN }))
                    .set_delay(delay),
            );
        mount(mock, expected_calls, &self.server).await;
    }

    /// Token endpoint rejecting every credential pair
    pub async fn mock_token_rejected(&self) {
        Mock::given(method("GET"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_locks(&self, body: Value, expected_calls: Option<u64>) {
        let response = ResponseTemplate::new(200).set_body_json(body);
        self.mock_get("/api/locks", response, expected_calls).await;
    }

    pub async fn mock_key_list(&self, body: Value, expected_calls: Option<u64>) {
        let response = ResponseTemplate::new(200).set_body_json(body);
        self.mock_get("/api/key-list", response, expected_calls).await;
    }

    pub async fn mock_users(&self, body: Value, expected_calls: Option<u64>) {
        let response = ResponseTemplate::new(200).set_body_json(body);
        self.mock_get("/api/users", response, expected_calls).await;
    }

    /// Authenticated GET on `endpoint` answering with `response`
    pub async fn mock_get(
        &self,
        endpoint: &str,
        response: ResponseTemplate,
        expected_calls: Option<u64>,
    ) {
        let mock = Mock::given(method("GET"))
            .and(path(endpoint))
            .and(header("Authorization", format!("Bearer {TOKEN}").as_str()))
            .respond_with(response);
        mount(mock, expected_calls, &self.server).await;
    }

    /// `GET /key?digital_key=...`
    pub async fn mock_key_status(
        &self,
        digital_key: &str,
        valid: bool,
        expected_calls: Option<u64>,
    ) {
        let mock = Mock::given(method("GET"))
            .and(path("/api/key"))
            .and(query_param("digital_key", digital_key))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "digital_key": digital_key,
                "valid": valid,
            })));
        mount(mock, expected_calls, &self.server).await;
    }

    /// `POST /key` issuing `digital_key`
    pub async fn mock_create_key(&self, digital_key: &str, expected_calls: Option<u64>) {
        let mock = Mock::given(method("POST"))
            .and(path("/api/key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 200,
                "digital_key": digital_key,
            })));
        mount(mock, expected_calls, &self.server).await;
    }

    /// `POST /open-door` for one lock/relay pair, answering `{"status": status}`
    pub async fn mock_open_door(
        &self,
        lock_id: i64,
        relay_id: i64,
        status: i64,
        expected_calls: Option<u64>,
    ) {
        let mock = Mock::given(method("POST"))
            .and(path("/api/open-door"))
            .and(body_partial_json(json!({"lock_id": lock_id, "relay_id": relay_id})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": status })));
        mount(mock, expected_calls, &self.server).await;
    }

    /// Number of requests received on `endpoint`
    pub async fn request_count(&self, endpoint: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == endpoint)
            .count()
    }
}

async fn mount(mock: Mock, expected_calls: Option<u64>, server: &MockServer) {
    match expected_calls {
        Some(n) => mock.expect(n).mount(server).await,
        None => mock.mount(server).await,
    }
}

/// Two locks, the first one named
pub fn sample_locks() -> Value {
    json!({
        "data": [
            {"lock_id": 1, "relay_id": 1, "name": "Front door", "online": true},
            {"lock_id": 2, "relay_id": 2}
        ]
    })
}

/// Keys A (valid, (1,1)), B (invalid, (1,1)) and C (valid, (2,2))
pub fn sample_keys() -> Value {
    json!({
        "data": [
            {
                "digital_key": "KEY-B",
                "name": "Revoked",
                "is_valid": 0,
                "is_ended": 0,
                "locks": [{"lock_id": 1, "relay_id": 1}],
                "times": []
            },
            {
                "digital_key": "KEY-A",
                "name": "Resident",
                "is_valid": 1,
                "is_ended": 0,
                "locks": [{"lock_id": 1, "relay_id": 1}],
                "times": [{
                    "type": "schedule",
                    "monday": true,
                    "start_time": "08:00",
                    "end_time": "18:00"
                }],
                "pins": []
            },
            {
                "digital_key": "KEY-C",
                "name": "Garage",
                "is_valid": true,
                "is_ended": false,
                "locks": [{"lock_id": 2, "relay_id": 2}],
                "times": [{"type": "date", "start": 1700000000, "end": 1900000000}]
            }
        ]
    })
}
