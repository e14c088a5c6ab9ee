//! Request execution against a local mock server.
//!
//! Each test starts an axum server on a random port in its own thread and
//! drives an `ApiService` whose delegate forwards every notification into a
//! channel.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::RawQuery;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use entity_http_client::codec::{Entity, FieldTable};
use entity_http_client::http::{ErrorKind, FileUpload};
use entity_http_client::{ApiError, ApiRequest, ApiResponse, ApiService, ClientConfig, Delegate};

#[derive(Debug, Default, PartialEq)]
struct Ping {
    message: String,
    count: i32,
}

impl Entity for Ping {
    fn fields(table: FieldTable<Self>) -> FieldTable<Self> {
        table
            .field("message", |p| &p.message, |p| &mut p.message)
            .field("count", |p| &p.count, |p| &mut p.count)
    }
}

#[derive(Debug)]
enum Outcome {
    Response {
        id: String,
        data: Option<Ping>,
        raw: String,
        status: u16,
    },
    Failure {
        id: String,
        error: ApiError,
        status: Option<u16>,
    },
}

struct Recorder {
    tx: Sender<Outcome>,
}

impl Delegate<Ping> for Recorder {
    fn did_receive_response(&self, response: ApiResponse<Ping>, _exec_time: Duration, id: &str) {
        let status = response.status();
        let raw = response.raw().to_string();
        let _ = self.tx.send(Outcome::Response {
            id: id.to_string(),
            data: response.into_data(),
            raw,
            status,
        });
    }

    fn did_fail(&self, error: ApiError, id: &str, status: Option<u16>) {
        let _ = self.tx.send(Outcome::Failure {
            id: id.to_string(),
            error,
            status,
        });
    }
}

fn json_reply(message: &str, count: i32) -> ([(header::HeaderName, &'static str); 1], String) {
    (
        [(header::CONTENT_TYPE, "application/json")],
        serde_json::json!({ "message": message, "count": count }).to_string(),
    )
}

async fn ping(RawQuery(query): RawQuery) -> ([(header::HeaderName, &'static str); 1], String) {
    json_reply(&query.unwrap_or_default(), 3)
}

async fn echo(body: String) -> String {
    body
}

async fn echo_headers(headers: HeaderMap) -> ([(header::HeaderName, &'static str); 1], String) {
    let value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    let message = format!(
        "{}|{}|{}",
        value(header::USER_AGENT),
        value(header::ACCEPT_CHARSET),
        value(header::CONTENT_TYPE)
    );
    json_reply(&message, 0)
}

async fn upload(headers: HeaderMap, body: Bytes) -> ([(header::HeaderName, &'static str); 1], String) {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let text = String::from_utf8_lossy(&body);
    let ok = content_type.starts_with("multipart/form-data")
        && text.contains("name=\"file-to-be-uploaded\"")
        && text.contains("filename=\"notes.txt\"")
        && text.contains("hello upload");
    json_reply(if ok { "stored" } else { "rejected" }, body.len() as i32)
}

async fn slow() -> ([(header::HeaderName, &'static str); 1], String) {
    tokio::time::sleep(Duration::from_secs(3)).await;
    json_reply("late", 0)
}

fn app() -> Router {
    Router::new()
        .route("/ping", get(ping).post(echo).put(echo))
        .route("/headers", get(echo_headers))
        .route("/upload", post(upload))
        .route("/slow", get(slow))
        .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "no such thing") }))
        .route("/garbage", get(|| async { "this is not json" }))
        .route("/list", get(|| async { "[1,2,3]" }))
}

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            axum::serve(listener, app()).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn prepared_service() -> (ApiService<Ping>, Receiver<Outcome>) {
    let (tx, rx) = mpsc::channel();
    let mut service = ApiService::new(Arc::new(Recorder { tx }), ClientConfig::default()).unwrap();
    service.prepare().unwrap();
    (service, rx)
}

fn next(rx: &Receiver<Outcome>) -> Outcome {
    rx.recv_timeout(Duration::from_secs(10))
        .expect("delegate was not notified")
}

#[test]
fn get_decodes_the_response() {
    let base = start_server();
    let (service, rx) = prepared_service();

    let mut request = ApiRequest::get(&format!("{base}/ping"));
    request.add_url_param("who", "me & you");
    service.exec(request, "ping").unwrap();

    match next(&rx) {
        Outcome::Response {
            id, data, status, ..
        } => {
            assert_eq!(id, "ping");
            assert_eq!(status, 200);
            assert_eq!(
                data,
                Some(Ping {
                    message: "who=me%20%26%20you".to_string(),
                    count: 3,
                })
            );
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn post_and_put_send_the_encoded_entity() {
    let base = start_server();
    let (service, rx) = prepared_service();
    let sent = Ping {
        message: "hello".to_string(),
        count: 7,
    };

    let post = ApiRequest::post(&format!("{base}/ping"))
        .with_entity(&sent)
        .unwrap();
    service.exec(post, "post").unwrap();
    match next(&rx) {
        Outcome::Response { id, data, raw, .. } => {
            assert_eq!(id, "post");
            assert_eq!(raw, r#"{"message":"hello","count":7}"#);
            assert_eq!(data.as_ref(), Some(&sent));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let mut body = serde_json::Map::new();
    body.insert("count".to_string(), serde_json::Value::from(9));
    let put = ApiRequest::put(&format!("{base}/ping")).with_raw_body(body);
    service.exec(put, "put").unwrap();
    match next(&rx) {
        Outcome::Response { id, data, .. } => {
            assert_eq!(id, "put");
            assert_eq!(
                data,
                Some(Ping {
                    message: String::new(),
                    count: 9,
                })
            );
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn configured_headers_are_sent() {
    let base = start_server();
    let (service, rx) = prepared_service();

    let mut request = ApiRequest::get(&format!("{base}/headers"));
    request.set_charset("iso-8859-1");
    service.exec(request, "headers").unwrap();

    match next(&rx) {
        Outcome::Response { data, .. } => {
            let config = ClientConfig::default();
            let expected = format!(
                "{}|iso-8859-1|{}",
                config.user_agent, config.content_type
            );
            assert_eq!(data.map(|p| p.message), Some(expected));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn upload_sends_a_multipart_form() {
    let base = start_server();
    let (service, rx) = prepared_service();

    let file = FileUpload::from_bytes("notes.txt", b"hello upload".to_vec(), None);
    let request = ApiRequest::upload(&format!("{base}/upload"), file);
    service.exec(request, "upload").unwrap();

    match next(&rx) {
        Outcome::Response { data, .. } => {
            assert_eq!(data.map(|p| p.message), Some("stored".to_string()));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn error_status_is_reported_with_its_code() {
    let base = start_server();
    let (service, rx) = prepared_service();

    service
        .exec(ApiRequest::get(&format!("{base}/missing")), "missing")
        .unwrap();

    match next(&rx) {
        Outcome::Failure { id, error, status } => {
            assert_eq!(id, "missing");
            assert_eq!(status, Some(404));
            assert!(matches!(
                error,
                ApiError::Status { status: 404, ref body } if body == "no such thing"
            ));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn undecodable_body_is_a_decode_error() {
    let base = start_server();
    let (service, rx) = prepared_service();

    service
        .exec(ApiRequest::get(&format!("{base}/garbage")), "garbage")
        .unwrap();
    match next(&rx) {
        Outcome::Failure { error, status, .. } => {
            assert_eq!(error.kind(), ErrorKind::JsonDecode);
            assert_eq!(status, None);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    service
        .exec(ApiRequest::get(&format!("{base}/list")), "list")
        .unwrap();
    match next(&rx) {
        Outcome::Failure { error, .. } => assert_eq!(error.kind(), ErrorKind::JsonDecode),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn response_without_entity_keeps_the_raw_body() {
    let base = start_server();
    let (service, rx) = prepared_service();

    let request = ApiRequest::get(&format!("{base}/garbage")).without_response();
    service.exec(request, "raw").unwrap();

    match next(&rx) {
        Outcome::Response { data, raw, .. } => {
            assert_eq!(data, None);
            assert_eq!(raw, "this is not json");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn request_timeout_is_a_connection_failure() {
    let base = start_server();
    let (service, rx) = prepared_service();

    let mut request = ApiRequest::get(&format!("{base}/slow"));
    request.set_timeout_seconds(1);
    service.exec(request, "slow").unwrap();

    match next(&rx) {
        Outcome::Failure { error, .. } => assert_eq!(error.kind(), ErrorKind::ConnectionTimeout),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn unreachable_host_is_a_connection_failure() {
    let (service, rx) = prepared_service();

    // Bind and drop to get a port nothing listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    service
        .exec(ApiRequest::get(&format!("http://127.0.0.1:{port}/ping")), "down")
        .unwrap();

    match next(&rx) {
        Outcome::Failure { error, .. } => assert_eq!(error.kind(), ErrorKind::ConnectionTimeout),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn exec_requires_a_prepared_service() {
    let (tx, _rx) = mpsc::channel();
    let mut service =
        ApiService::<Ping>::new(Arc::new(Recorder { tx }), ClientConfig::default()).unwrap();

    let err = service
        .exec(ApiRequest::get("http://127.0.0.1:1/ping"), "early")
        .unwrap_err();
    assert!(matches!(err, ApiError::NotPrepared));

    service.prepare().unwrap();
    service.prepare().unwrap();
    service.release();
    let err = service
        .exec(ApiRequest::get("http://127.0.0.1:1/ping"), "late")
        .unwrap_err();
    assert!(matches!(err, ApiError::NotPrepared));
}

#[test]
fn cancel_notifies_exactly_once() {
    let base = start_server();
    let (service, rx) = prepared_service();

    let task = service
        .exec(ApiRequest::get(&format!("{base}/slow")), "cancelled")
        .unwrap();
    assert_eq!(task.identifier(), "cancelled");
    assert!(task.cancel());
    assert!(!task.cancel());

    match next(&rx) {
        Outcome::Failure { id, error, status } => {
            assert_eq!(id, "cancelled");
            assert!(matches!(error, ApiError::Cancelled));
            assert_eq!(status, None);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let joined = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(task.join());
    assert!(matches!(joined, Err(ApiError::Cancelled)));

    // The aborted worker must not report a second outcome.
    assert!(rx.recv_timeout(Duration::from_secs(4)).is_err());
}

#[test]
fn cancel_after_completion_is_a_no_op() {
    let base = start_server();
    let (service, rx) = prepared_service();

    let task = service
        .exec(ApiRequest::get(&format!("{base}/ping")), "done")
        .unwrap();
    assert!(matches!(next(&rx), Outcome::Response { .. }));
    assert!(!task.cancel());
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}

#[test]
fn generated_identifiers_are_unique() {
    let base = start_server();
    let (service, rx) = prepared_service();

    let first = service
        .exec_with_generated_id(ApiRequest::get(&format!("{base}/ping")))
        .unwrap();
    let second = service
        .exec_with_generated_id(ApiRequest::get(&format!("{base}/ping")))
        .unwrap();
    assert_ne!(first.identifier(), second.identifier());

    let mut ids: Vec<String> = (0..2)
        .map(|_| match next(&rx) {
            Outcome::Response { id, .. } => id,
            other => panic!("unexpected outcome: {other:?}"),
        })
        .collect();
    ids.sort();
    let mut expected = vec![first.identifier().to_string(), second.identifier().to_string()];
    expected.sort();
    assert_eq!(ids, expected);
}

#[test]
fn release_reports_requests_still_in_flight() {
    let base = start_server();
    let (mut service, rx) = prepared_service();

    let task = service
        .exec(ApiRequest::get(&format!("{base}/slow")), "inflight")
        .unwrap();
    std::thread::sleep(Duration::from_millis(300));
    service.release();

    match next(&rx) {
        Outcome::Failure { id, error, status } => {
            assert_eq!(id, "inflight");
            assert!(matches!(error, ApiError::Cancelled));
            assert_eq!(status, None);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(!task.cancel());
    assert!(rx.recv_timeout(Duration::from_secs(4)).is_err());
}

#[test]
fn dropping_the_service_reports_requests_still_in_flight() {
    let base = start_server();
    let (service, rx) = prepared_service();

    service
        .exec(ApiRequest::get(&format!("{base}/slow")), "dropped")
        .unwrap();
    drop(service);

    match next(&rx) {
        Outcome::Failure { id, error, .. } => {
            assert_eq!(id, "dropped");
            assert!(matches!(error, ApiError::Cancelled));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn release_leaves_finished_requests_alone() {
    let base = start_server();
    let (mut service, rx) = prepared_service();

    service
        .exec(ApiRequest::get(&format!("{base}/ping")), "finished")
        .unwrap();
    assert!(matches!(next(&rx), Outcome::Response { .. }));
    service.release();
    assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());
}

#[test]
fn request_timeout_can_exceed_the_configured_one() {
    let base = start_server();
    let (tx, rx) = mpsc::channel();
    let config = ClientConfig {
        timeout_seconds: 1,
        ..ClientConfig::default()
    };
    let mut service = ApiService::new(Arc::new(Recorder { tx }), config).unwrap();
    service.prepare().unwrap();

    let mut request = ApiRequest::get(&format!("{base}/slow"));
    request.set_timeout_seconds(6);
    service.exec(request, "patient").unwrap();

    match next(&rx) {
        Outcome::Response { id, data, .. } => {
            assert_eq!(id, "patient");
            assert_eq!(data.map(|p| p.message), Some("late".to_string()));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}
