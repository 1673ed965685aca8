//! Shared fakes and wiremock helpers for the reporting client tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reporting_client::{Clock, Config, ReportService, Sleeper};

pub const TOKEN_PATH: &str = "/CxRestAPI/auth/identity/connect/token";
pub const REPORTS_PATH: &str = "/api/reports";

/// Clock that only moves when told to
#[derive(Debug)]
pub struct FakeClock {
    now: Mutex<DateTime<Utc>>,
}

impl FakeClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2021, 11, 16, 9, 0, 0).unwrap()),
        })
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::from_std(duration).unwrap();
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Sleeper that returns immediately, records each wait and advances the fake clock
pub struct RecordingSleeper {
    clock: Arc<FakeClock>,
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new(clock: Arc<FakeClock>) -> Arc<Self> {
        Arc::new(Self {
            clock,
            sleeps: Mutex::new(Vec::new()),
        })
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        self.clock.advance(duration);
    }
}

pub struct TestHarness {
    pub server: MockServer,
    pub clock: Arc<FakeClock>,
    pub sleeper: Arc<RecordingSleeper>,
    pub service: ReportService,
}

pub async fn harness() -> TestHarness {
    harness_with(|_| {}).await
}

/// Service wired to a mock server serving both identity and reporting endpoints
pub async fn harness_with(customize: impl FnOnce(&mut Config)) -> TestHarness {
    let server = MockServer::start().await;
    let clock = FakeClock::new();
    let sleeper = RecordingSleeper::new(Arc::clone(&clock));

    let mut config = Config::new(&server.uri(), &server.uri(), "analyst", "s3cret").unwrap();
    customize(&mut config);

    let service = ReportService::with_time(config, clock.clone(), sleeper.clone());

    TestHarness {
        server,
        clock,
        sleeper,
        service,
    }
}

pub async fn mount_token(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": token,
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .mount(server)
        .await;
}

pub async fn mount_create(server: &MockServer, report_id: i64) {
    Mock::given(method("POST"))
        .and(path(REPORTS_PATH))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({ "reportId": report_id })),
        )
        .mount(server)
        .await;
}

pub fn status_body(status: &str) -> serde_json::Value {
    serde_json::json!({ "reportStatus": status })
}

pub async fn mount_artifact(server: &MockServer, report_id: i64, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("{}/{}", REPORTS_PATH, report_id)))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(body.to_vec()),
        )
        .mount(server)
        .await;
}

/// Number of requests the mock server received on a path
pub async fn request_count(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == request_path)
        .count()
}
