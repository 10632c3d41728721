use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use backend_application::ingest::{ScanOutcome, ScanSession};
use backend_application::AppState;
use backend_domain::ScanSessionSummary;
use backend_interfaces_http::build_router;

use crate::context::AppContext;

fn build_router_with_layers(state: AppState) -> Router {
    build_router(state.clone())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(
            usize::try_from(state.config.max_body_bytes).unwrap_or(usize::MAX),
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.request_timeout_seconds,
        )))
        .layer(TraceLayer::new_for_http())
}

pub async fn run_serve(context: AppContext) -> Result<()> {
    let state = context.state;
    let addr: std::net::SocketAddr = state.config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("listening on {}", addr);
    serve(state, listener, shutdown_signal()).await
}

pub async fn serve<F>(state: AppState, listener: TcpListener, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router_with_layers(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("http server stopped");
    Ok(())
}

/// Checks in every line read from stdin until EOF or Ctrl-C.
pub async fn run_scan(context: AppContext, event_id: String, operator_id: String) -> Result<ScanSessionSummary> {
    let stdin = BufReader::new(tokio::io::stdin());
    scan_lines(context.state, event_id, operator_id, stdin, shutdown_signal()).await
}

pub async fn scan_lines<R, F>(
    state: AppState,
    event_id: String,
    operator_id: String,
    reader: R,
    shutdown: F,
) -> Result<ScanSessionSummary>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = ()>,
{
    let read_error = Arc::new(Mutex::new(None));
    let slot = read_error.clone();
    let codes = futures_util::stream::unfold(reader, move |mut reader| {
        let slot = slot.clone();
        async move {
            let mut buf = Vec::new();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => None,
                Ok(_) => Some((decode_line(&buf), reader)),
                Err(err) => {
                    *slot.lock().await = Some(err);
                    None
                }
            }
        }
    });

    let session = ScanSession::new(state, event_id, operator_id);
    let summary = session
        .run(codes, shutdown, |code, outcome| match outcome {
            ScanOutcome::Recorded(receipt) => println!("recorded\t{}\t{}", code, receipt.message),
            ScanOutcome::Rejected(reason) => println!("rejected\t{}\t{}", code, reason),
            ScanOutcome::Failed(reason) => println!("failed\t{}\t{}", code, reason),
        })
        .await;

    if let Some(err) = read_error.lock().await.take() {
        warn!(
            "scan input stopped after {} codes ({} recorded)",
            summary.decoded, summary.recorded
        );
        anyhow::bail!("reading scanned codes failed: {}", err);
    }
    Ok(summary)
}

/// Bytes that are not UTF-8 decode to U+FFFD, which the check-in rejects as
/// unreadable; the session moves on to the next line.
fn decode_line(buf: &[u8]) -> String {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("sigterm handler unavailable: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;
    use reqwest::{Client, StatusCode};
    use serde_json::{json, Value};
    use tokio::sync::oneshot;
    use tokio_tungstenite::tungstenite;

    use backend_domain::{AttendanceRepository, EventRepository, StudentDirectory};
    use backend_infrastructure::AppConfig;

    use super::*;

    fn memory_config() -> AppConfig {
        AppConfig {
            api_token: Some("secret".to_string()),
            database_url: "sqlite::memory:".to_string(),
            ..AppConfig::default()
        }
    }

    async fn seeded_state() -> AppState {
        let context = AppContext::new(&memory_config()).await.expect("context");
        let state = context.state;
        state
            .student_directory
            .upsert_student(&backend_domain::StudentIdentity {
                id: "acc-1".to_string(),
                student_number: "S100".to_string(),
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
            })
            .await
            .expect("student");
        state
            .event_repo
            .insert_event(&backend_domain::Event {
                id: "evt-1".to_string(),
                name: "Orientation".to_string(),
                description: None,
                location: None,
                starts_at: None,
                created_by: None,
                created_at: 1,
            })
            .await
            .expect("event");
        state
    }

    #[tokio::test]
    async fn scan_lines_records_each_decoded_line() {
        let state = seeded_state().await;
        let input: &[u8] = b"S100\nS100\n\nS200\n";

        let summary = scan_lines(
            state.clone(),
            "evt-1".to_string(),
            "op-1".to_string(),
            input,
            std::future::pending::<()>(),
        )
        .await
        .expect("scan");

        assert_eq!(summary.decoded, 4);
        assert_eq!(summary.recorded, 3);
        assert_eq!(summary.rejected, 1);
        let rows = state
            .attendance_repo
            .list_event_attendance(&backend_domain::EventId::parse("evt-1").expect("id"))
            .await
            .expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].scan_count, 2);
        assert_eq!(rows[1].student_name, "Unknown");
    }

    #[tokio::test]
    async fn scan_lines_rejects_undecodable_lines_and_continues() {
        let state = seeded_state().await;
        let input: &[u8] = b"S100\r\n\xff\xfeQR\nS200";

        let summary = scan_lines(
            state.clone(),
            "evt-1".to_string(),
            "op-1".to_string(),
            input,
            std::future::pending::<()>(),
        )
        .await
        .expect("scan");

        assert_eq!(summary.decoded, 3);
        assert_eq!(summary.recorded, 2);
        assert_eq!(summary.rejected, 1);
        let rows = state
            .attendance_repo
            .list_event_attendance(&backend_domain::EventId::parse("evt-1").expect("id"))
            .await
            .expect("rows");
        let numbers = rows.iter().map(|row| row.student_number.as_str()).collect::<Vec<_>>();
        assert_eq!(numbers, vec!["S100", "S200"]);
    }

    #[tokio::test]
    async fn http_check_in_flow() {
        let context = AppContext::new(&memory_config()).await.expect("context");
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let base = format!("http://{}", listener.local_addr().expect("addr"));
        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(context.state, listener, async move {
            let _ = rx.await;
        }));
        let client = Client::new();

        let live = client
            .get(format!("{base}/v1/ops/health/live"))
            .send()
            .await
            .expect("live");
        assert_eq!(live.status(), StatusCode::OK);

        let anonymous = client
            .post(format!("{base}/v1/events"))
            .json(&json!({ "name": "Orientation" }))
            .send()
            .await
            .expect("anonymous");
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let student = client
            .put(format!("{base}/v1/directory/students"))
            .bearer_auth("secret")
            .json(&json!({
                "id": "acc-1",
                "student_number": "S100",
                "first_name": "Jane",
                "last_name": "Doe"
            }))
            .send()
            .await
            .expect("student");
        assert_eq!(student.status(), StatusCode::OK);

        let organizer = client
            .put(format!("{base}/v1/directory/organizers"))
            .bearer_auth("secret")
            .json(&json!({ "id": "op-1", "display_name": "Olive" }))
            .send()
            .await
            .expect("organizer");
        assert_eq!(organizer.status(), StatusCode::OK);

        let created = client
            .post(format!("{base}/v1/events"))
            .bearer_auth("secret")
            .header("X-Operator-Id", "op-1")
            .json(&json!({ "name": "Orientation", "location": "Hall A" }))
            .send()
            .await
            .expect("create");
        assert_eq!(created.status(), StatusCode::CREATED);
        let event: Value = created.json().await.expect("event json");
        let event_id = event["id"].as_str().expect("event id").to_string();

        let check_in = |code: &'static str| {
            client
                .post(format!("{base}/v1/events/{event_id}/check-ins"))
                .bearer_auth("secret")
                .header("X-Operator-Id", "op-1")
                .json(&json!({ "code": code }))
                .send()
        };
        let first = check_in("S100").await.expect("first scan");
        assert_eq!(first.status(), StatusCode::CREATED);
        let second = check_in("S100").await.expect("second scan");
        assert_eq!(second.status(), StatusCode::OK);
        let receipt: Value = second.json().await.expect("receipt");
        assert_eq!(receipt["record"]["scan_count"], json!(2));
        assert_eq!(receipt["record"]["student_name"], json!("Jane Doe"));
        let blank = check_in("   ").await.expect("blank scan");
        assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

        let no_operator = client
            .post(format!("{base}/v1/events/{event_id}/check-ins"))
            .bearer_auth("secret")
            .json(&json!({ "code": "S100" }))
            .send()
            .await
            .expect("no operator");
        assert_eq!(no_operator.status(), StatusCode::UNAUTHORIZED);

        let attendance: Value = client
            .get(format!("{base}/v1/events/{event_id}/attendance"))
            .bearer_auth("secret")
            .send()
            .await
            .expect("attendance")
            .json()
            .await
            .expect("attendance json");
        assert_eq!(attendance.as_array().map(Vec::len), Some(1));
        assert_eq!(attendance[0]["operator_name"], json!("Olive"));

        let history: Value = client
            .get(format!("{base}/v1/students/S100/attendance"))
            .bearer_auth("secret")
            .send()
            .await
            .expect("history")
            .json()
            .await
            .expect("history json");
        assert_eq!(history[0]["event_name"], json!("Orientation"));

        let last: Value = client
            .get(format!("{base}/v1/scan/last"))
            .bearer_auth("secret")
            .header("X-Operator-Id", "op-1")
            .send()
            .await
            .expect("last scan")
            .json()
            .await
            .expect("last scan json");
        assert_eq!(last["state"], json!("recorded"));

        let deleted: Value = client
            .delete(format!("{base}/v1/events/{event_id}"))
            .bearer_auth("secret")
            .send()
            .await
            .expect("delete")
            .json()
            .await
            .expect("delete json");
        assert_eq!(deleted["attendance_removed"], json!(1));

        let gone = client
            .get(format!("{base}/v1/events/{event_id}"))
            .bearer_auth("secret")
            .send()
            .await
            .expect("gone");
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);

        let _ = tx.send(());
        server.await.expect("join").expect("server");
    }

    #[tokio::test]
    async fn check_in_stream_delivers_records_over_websocket() {
        let state = seeded_state().await;
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(state, listener, async move {
            let _ = rx.await;
        }));

        let refused = tokio_tungstenite::connect_async(format!("ws://{addr}/v1/events/evt-1/check-ins/stream"))
            .await
            .expect_err("token required");
        match refused {
            tungstenite::Error::Http(response) => assert_eq!(response.status().as_u16(), 401),
            other => panic!("unexpected handshake error: {other}"),
        }
        let missing = tokio_tungstenite::connect_async(format!(
            "ws://{addr}/v1/events/evt-404/check-ins/stream?access_token=secret"
        ))
        .await
        .expect_err("unknown event");
        match missing {
            tungstenite::Error::Http(response) => assert_eq!(response.status().as_u16(), 404),
            other => panic!("unexpected handshake error: {other}"),
        }

        let (mut socket, _) = tokio_tungstenite::connect_async(format!(
            "ws://{addr}/v1/events/evt-1/check-ins/stream?access_token=secret"
        ))
        .await
        .expect("connect");

        let scan = Client::new()
            .post(format!("http://{addr}/v1/events/evt-1/check-ins"))
            .bearer_auth("secret")
            .header("X-Operator-Id", "op-1")
            .json(&json!({ "code": "S100" }))
            .send()
            .await
            .expect("check in");
        assert_eq!(scan.status(), StatusCode::CREATED);

        let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("record in time")
            .expect("stream open")
            .expect("frame");
        let text = match message {
            tungstenite::Message::Text(text) => text,
            other => panic!("expected a text frame, got {other:?}"),
        };
        let record: Value = serde_json::from_str(&text).expect("record json");
        assert_eq!(record["event_id"], json!("evt-1"));
        assert_eq!(record["student_number"], json!("S100"));
        assert_eq!(record["student_name"], json!("Jane Doe"));
        assert_eq!(record["scan_count"], json!(1));

        socket.close(None).await.expect("close");
        let _ = tx.send(());
        server.await.expect("join").expect("server");
    }
}
