use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::{Value, json};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use studylog_server::assistant::{Assistant, AssistantError};
use studylog_server::{server, storage};

struct StubAssistant {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl Assistant for StubAssistant {
    async fn generate(&self, prompt: &str) -> Result<String, AssistantError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok("Keep going, you are on track.".into())
    }
}

struct TestServer {
    base: String,
    client: Client,
    handle: tokio::task::JoinHandle<()>,
    _tempdir: tempfile::TempDir,
}

impl TestServer {
    async fn spawn(assistant: Option<Arc<StubAssistant>>) -> Option<Self> {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let (addr, handle) = match start_server(&db_path, assistant).await {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                eprintln!("Skipping test due to sandbox restrictions: {e}");
                return None;
            }
            Err(e) => panic!("failed to start server: {e}"),
        };
        Some(Self {
            base: format!("http://{}", addr),
            client: Client::new(),
            handle,
            _tempdir: dir,
        })
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let url = format!("{}{}", self.base, path);
        let mut req = match method {
            "GET" => self.client.get(&url),
            "POST" => self.client.post(&url),
            "DELETE" => self.client.delete(&url),
            other => panic!("unsupported method {other}"),
        };
        if let Some(b) = body {
            req = req.json(&b);
        }
        let resp = req.send().await.unwrap();
        let status = resp.status();
        let text = resp.text().await.unwrap();
        let val = if text.is_empty() {
            json!(null)
        } else {
            serde_json::from_str(&text).unwrap_or(json!({"raw": text}))
        };
        (status, val)
    }

    async fn request_expect(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        expected: StatusCode,
    ) -> Value {
        let (status, value) = self.request(method, path, body).await;
        assert_eq!(
            status, expected,
            "{method} {path} returned {status:?} with body {value:?}",
        );
        value
    }

    async fn add_record(&self, date: &str, subject: &str, hours: i64, minutes: i64) -> i64 {
        let body = self
            .request_expect(
                "POST",
                "/api/records",
                Some(json!({
                    "date": date,
                    "subject": subject,
                    "hours": hours,
                    "minutes": minutes,
                    "study_type": "school",
                })),
                StatusCode::OK,
            )
            .await;
        assert_eq!(body["success"], json!(true));
        body["id"].as_i64().expect("id missing from create response")
    }

    /// March 2024: 1h30 + 30m in week 1, 30m in week 2, plus a February session.
    async fn seed_march(&self) {
        self.add_record("2024-03-03", "Math", 1, 30).await;
        self.add_record("2024-03-05", "English", 0, 30).await;
        self.add_record("2024-03-10", "Math", 0, 30).await;
        self.add_record("2024-02-20", "Math", 2, 0).await;
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn start_server(
    tmp_db: &Path,
    assistant: Option<Arc<StubAssistant>>,
) -> Result<(SocketAddr, tokio::task::JoinHandle<()>), std::io::Error> {
    let config = server::AppConfig::default();
    let store = storage::Store::connect_sqlite(tmp_db.to_str().unwrap())
        .await
        .expect("db");

    let mut state = server::AppState::new(config, store)
        .expect("state")
        .with_today(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    if let Some(a) = assistant {
        state = state.with_assistant(a);
    }
    let app = server::router(state);

    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Ok((addr, handle))
}

fn hours_of(series: &Value) -> Vec<f64> {
    series["data"]
        .as_array()
        .expect("data array")
        .iter()
        .map(|item| item["hours"].as_f64().unwrap())
        .collect()
}

#[tokio::test]
async fn health_and_unknown_paths() {
    let Some(server) = TestServer::spawn(None).await else {
        return;
    };
    let resp = server
        .client
        .get(format!("{}/healthz", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
    assert_eq!(resp.text().await.unwrap(), "ok");

    let body = server
        .request_expect("GET", "/api/nope", None, StatusCode::NOT_FOUND)
        .await;
    assert_eq!(body["success"], json!(false));

    server
        .request_expect("GET", "/index.html", None, StatusCode::NOT_FOUND)
        .await;
}

#[tokio::test]
async fn records_lifecycle() {
    let Some(server) = TestServer::spawn(None).await else {
        return;
    };
    let first = server.add_record("2024-03-03", "Math", 1, 30).await;
    server.add_record("2024-03-10", "English", 0, 45).await;
    server.add_record("2024-04-01", "Math", 1, 0).await;

    let body = server
        .request_expect("GET", "/api/records/2024/3", None, StatusCode::OK)
        .await;
    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    // Newest date first
    assert_eq!(records[0]["date"], json!("2024-03-10"));
    assert_eq!(records[1]["subject"], json!("Math"));
    assert_eq!(records[1]["study_type"], json!("school"));

    server
        .request_expect(
            "DELETE",
            &format!("/api/records/{first}"),
            None,
            StatusCode::OK,
        )
        .await;
    let body = server
        .request_expect(
            "DELETE",
            &format!("/api/records/{first}"),
            None,
            StatusCode::NOT_FOUND,
        )
        .await;
    assert_eq!(body["success"], json!(false));

    let body = server
        .request_expect("GET", "/api/records/2024/3", None, StatusCode::OK)
        .await;
    assert_eq!(body["records"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_input_is_rejected() {
    let Some(server) = TestServer::spawn(None).await else {
        return;
    };
    let cases = vec![
        json!({"date": "2024-13-01", "subject": "Math", "hours": 1, "minutes": 0, "study_type": "school"}),
        json!({"date": "2024-03-01", "subject": "  ", "hours": 1, "minutes": 0, "study_type": "school"}),
        json!({"date": "2024-03-01", "subject": "Math", "hours": -1, "minutes": 0, "study_type": "school"}),
        json!({"date": "2024-03-01", "subject": "Math", "hours": 1, "minutes": 60, "study_type": "school"}),
        json!({"date": "2024-03-01", "subject": "Math", "hours": 1, "minutes": 0, "study_type": "nap"}),
        json!({"subject": "Math"}),
    ];
    for case in cases {
        let body = server
            .request_expect("POST", "/api/records", Some(case), StatusCode::BAD_REQUEST)
            .await;
        assert_eq!(body["success"], json!(false));
        assert!(body["message"].as_str().is_some());
    }

    for path in [
        "/api/records/2024/13",
        "/api/study-time/2024/0",
        "/api/study-time/weekly/abc/3",
        "/api/goal-progress/10000/1",
    ] {
        server
            .request_expect("GET", path, None, StatusCode::BAD_REQUEST)
            .await;
    }

    server
        .request_expect(
            "POST",
            "/api/monthly-goals",
            Some(json!({"year": 2024, "month": 3, "target_hours": -5.0})),
            StatusCode::BAD_REQUEST,
        )
        .await;
}

#[tokio::test]
async fn subjects_crud_and_duplicates() {
    let Some(server) = TestServer::spawn(None).await else {
        return;
    };
    let body = server
        .request_expect(
            "POST",
            "/api/subjects",
            Some(json!({"name": "Physics", "comment": "mechanics"})),
            StatusCode::OK,
        )
        .await;
    let id = body["id"].as_i64().unwrap();

    let body = server
        .request_expect(
            "POST",
            "/api/subjects",
            Some(json!({"name": "Physics"})),
            StatusCode::BAD_REQUEST,
        )
        .await;
    assert_eq!(body["success"], json!(false));

    let body = server
        .request_expect("GET", "/api/subjects", None, StatusCode::OK)
        .await;
    let subjects = body["subjects"].as_array().unwrap();
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects[0]["name"], json!("Physics"));
    assert_eq!(subjects[0]["comment"], json!("mechanics"));

    server
        .request_expect("DELETE", &format!("/api/subjects/{id}"), None, StatusCode::OK)
        .await;
    server
        .request_expect(
            "DELETE",
            &format!("/api/subjects/{id}"),
            None,
            StatusCode::NOT_FOUND,
        )
        .await;
}

#[tokio::test]
async fn monthly_goal_upsert() {
    let Some(server) = TestServer::spawn(None).await else {
        return;
    };
    let body = server
        .request_expect("GET", "/api/monthly-goals/2024/3", None, StatusCode::OK)
        .await;
    assert_eq!(body["target_hours"].as_f64(), Some(0.0));

    for target in [20.0, 12.5] {
        server
            .request_expect(
                "POST",
                "/api/monthly-goals",
                Some(json!({"year": 2024, "month": 3, "target_hours": target})),
                StatusCode::OK,
            )
            .await;
    }
    let body = server
        .request_expect("GET", "/api/monthly-goals/2024/3", None, StatusCode::OK)
        .await;
    assert_eq!(body["target_hours"].as_f64(), Some(12.5));
}

#[tokio::test]
async fn study_time_series() {
    let Some(server) = TestServer::spawn(None).await else {
        return;
    };
    server.seed_march().await;

    let body = server
        .request_expect("GET", "/api/study-time/2024/3", None, StatusCode::OK)
        .await;
    assert_eq!(body["hours"], json!(2));
    assert_eq!(body["minutes"], json!(30));
    assert_eq!(body["total_minutes"], json!(150));

    let weekly = server
        .request_expect("GET", "/api/study-time/weekly/2024/3", None, StatusCode::OK)
        .await;
    assert_eq!(hours_of(&weekly), vec![2.0, 0.5, 0.0, 0.0, 0.0]);
    assert_eq!(weekly["data"][0]["label"], json!("Week 1"));

    // 2024-03-03 and 2024-03-10 are Sundays, 2024-03-05 a Tuesday
    let daily = server
        .request_expect("GET", "/api/study-time/daily/2024/3", None, StatusCode::OK)
        .await;
    assert_eq!(hours_of(&daily), vec![2.0, 0.0, 0.5, 0.0, 0.0, 0.0, 0.0]);
    assert_eq!(daily["data"][0]["day"], json!("Sun"));

    let monthly = server
        .request_expect("GET", "/api/study-time/monthly/2024/3", None, StatusCode::OK)
        .await;
    let data = monthly["data"].as_array().unwrap();
    assert_eq!(data.len(), 12);
    assert_eq!(data[0]["label"], json!("2023-04"));
    assert_eq!(data[10]["label"], json!("2024-02"));
    assert_eq!(data[10]["hours"].as_f64(), Some(2.0));
    assert_eq!(data[11]["year"], json!(2024));
    assert_eq!(data[11]["month"], json!(3));
    assert_eq!(data[11]["hours"].as_f64(), Some(2.5));

    let subjects = server
        .request_expect("GET", "/api/study-time/subjects/2024/3", None, StatusCode::OK)
        .await;
    assert_eq!(subjects["data"][0]["subject"], json!("Math"));
    assert_eq!(hours_of(&subjects), vec![2.0, 0.5]);
}

#[tokio::test]
async fn empty_month_is_zero_filled() {
    let Some(server) = TestServer::spawn(None).await else {
        return;
    };
    let weekly = server
        .request_expect("GET", "/api/study-time/weekly/2023/2", None, StatusCode::OK)
        .await;
    assert_eq!(hours_of(&weekly), vec![0.0; 4]);
    let subjects = server
        .request_expect("GET", "/api/study-time/subjects/2023/2", None, StatusCode::OK)
        .await;
    assert!(subjects["data"].as_array().unwrap().is_empty());
    let progress = server
        .request_expect("GET", "/api/goal-progress/2023/2", None, StatusCode::OK)
        .await;
    assert_eq!(progress["achievement_percent"].as_f64(), Some(0.0));
    assert_eq!(progress["remaining_days"], json!(0));
    assert_eq!(progress["daily_goal"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn monthly_series_before_year_one_is_rejected() {
    let Some(server) = TestServer::spawn(None).await else {
        return;
    };
    let body = server
        .request_expect("GET", "/api/study-time/monthly/1/5", None, StatusCode::BAD_REQUEST)
        .await;
    assert_eq!(body["success"], json!(false));
    assert!(
        body["message"].as_str().unwrap().contains("starts before 0001-01"),
        "{body}"
    );
    let earliest = server
        .request_expect("GET", "/api/study-time/monthly/1/12", None, StatusCode::OK)
        .await;
    assert_eq!(earliest["data"].as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn goal_progress_for_current_month() {
    let Some(server) = TestServer::spawn(None).await else {
        return;
    };
    server.seed_march().await;
    server
        .request_expect(
            "POST",
            "/api/monthly-goals",
            Some(json!({"year": 2024, "month": 3, "target_hours": 10.0})),
            StatusCode::OK,
        )
        .await;

    let body = server
        .request_expect("GET", "/api/goal-progress/2024/3", None, StatusCode::OK)
        .await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["goal_hours"].as_f64(), Some(10.0));
    assert_eq!(body["study_hours"].as_f64(), Some(2.5));
    assert_eq!(body["achievement_percent"].as_f64(), Some(25.0));
    // Today is pinned to 2024-03-15
    assert_eq!(body["remaining_days"], json!(16));
    // 7.5h over 16 days, rounded up to a tenth
    assert_eq!(body["daily_goal"].as_f64(), Some(0.5));
}

#[tokio::test]
async fn nearly_met_goal_keeps_a_pace() {
    let Some(server) = TestServer::spawn(None).await else {
        return;
    };
    server.add_record("2024-03-02", "Math", 9, 57).await;
    server
        .request_expect(
            "POST",
            "/api/monthly-goals",
            Some(json!({"year": 2024, "month": 3, "target_hours": 10.0})),
            StatusCode::OK,
        )
        .await;

    let body = server
        .request_expect("GET", "/api/goal-progress/2024/3", None, StatusCode::OK)
        .await;
    assert_eq!(body["study_hours"].as_f64(), Some(10.0));
    let achieved = body["achievement_percent"].as_f64().unwrap();
    assert!(achieved < 100.0, "achievement {achieved} with 3 minutes left");
    assert_eq!(body["daily_goal"].as_f64(), Some(0.1));
}

#[tokio::test]
async fn chat_without_assistant_is_unavailable() {
    let Some(server) = TestServer::spawn(None).await else {
        return;
    };
    let body = server
        .request_expect(
            "POST",
            "/api/chat",
            Some(json!({"message": "how am I doing?"})),
            StatusCode::SERVICE_UNAVAILABLE,
        )
        .await;
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn chat_uses_records_and_saves_history() {
    let stub = Arc::new(StubAssistant {
        prompts: Mutex::new(Vec::new()),
    });
    let Some(server) = TestServer::spawn(Some(stub.clone())).await else {
        return;
    };
    server.seed_march().await;
    server
        .request_expect(
            "POST",
            "/api/monthly-goals",
            Some(json!({"year": 2024, "month": 3, "target_hours": 10.0})),
            StatusCode::OK,
        )
        .await;

    server
        .request_expect(
            "POST",
            "/api/chat",
            Some(json!({"message": "   "})),
            StatusCode::BAD_REQUEST,
        )
        .await;

    let body = server
        .request_expect(
            "POST",
            "/api/chat",
            Some(json!({"message": "How should I split my time?"})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(body["response"], json!("Keep going, you are on track."));

    let prompts = stub.prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];
    assert!(prompt.contains("Goal achievement: 25%"), "{prompt}");
    assert!(prompt.contains("- Math: 2"), "{prompt}");
    // Only 2024-03-10 falls within the week before the pinned today
    assert!(prompt.contains("2024-03-10: Math 0h 30m"), "{prompt}");
    assert!(!prompt.contains("2024-03-03"), "{prompt}");
    assert!(prompt.trim_end().ends_with("How should I split my time?"), "{prompt}");

    let history = server
        .request_expect("GET", "/api/chat-history", None, StatusCode::OK)
        .await;
    let items = history["history"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["user_message"], json!("How should I split my time?"));
}

#[tokio::test]
async fn chat_recent_window_includes_future_sessions() {
    let stub = Arc::new(StubAssistant {
        prompts: Mutex::new(Vec::new()),
    });
    let Some(server) = TestServer::spawn(Some(stub.clone())).await else {
        return;
    };
    server.add_record("2024-03-07", "History", 0, 45).await;
    server.add_record("2024-03-08", "English", 0, 15).await;
    server.add_record("2024-03-20", "Science", 1, 0).await;

    server
        .request_expect(
            "POST",
            "/api/chat",
            Some(json!({"message": "Plan my week"})),
            StatusCode::OK,
        )
        .await;

    let prompts = stub.prompts.lock().unwrap().clone();
    let prompt = &prompts[0];
    // Window opens seven days before the pinned today, with no upper bound
    assert!(prompt.contains("2024-03-20: Science 1h 0m"), "{prompt}");
    assert!(prompt.contains("2024-03-08: English 0h 15m"), "{prompt}");
    assert!(!prompt.contains("2024-03-07"), "{prompt}");
}
