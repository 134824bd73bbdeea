//! End-to-end poll loop tests.
//!
//! Serves a fake product page and a fake Telegram bot endpoint from a
//! local axum server, then drives the real HTTP page source, extractor,
//! journal and Telegram notifier through several cycles.

use axum::extract::{Form, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use secrecy::SecretString;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pricewatch::config::{ProductConfig, SelectorConfig};
use pricewatch::journal::PriceJournal;
use pricewatch::monitor::PriceMonitor;
use pricewatch::notify::telegram::TelegramNotifier;
use pricewatch::notify::{Notifier, PriceAlert};
use pricewatch::scrape::{HttpPageSource, PageSource, PriceExtractor};
use pricewatch::types::{CycleOutcome, MonitorError, MonitorState, PriceReading};

// ---------------------------------------------------------------------------
// Fake store + bot
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct FakeServer {
    /// Price text per request; `None` answers 503. Empty queue answers 404.
    prices: Arc<Mutex<VecDeque<Option<String>>>>,
    messages: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

async fn product_page(State(s): State<FakeServer>, headers: HeaderMap) -> Response {
    if !headers.contains_key("user-agent") || !headers.contains_key("referer") {
        return StatusCode::FORBIDDEN.into_response();
    }
    match s.prices.lock().unwrap().pop_front() {
        Some(Some(price)) => Html(format!(
            r#"<html><body>
                 <div class="ProductMeta__PriceList Heading">
                   <span class="ProductMeta__Price Price Price--highlight Text--subdued u-h4">{price}</span>
                 </div>
               </body></html>"#
        ))
        .into_response(),
        Some(None) => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn send_message(
    State(s): State<FakeServer>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    s.messages.lock().unwrap().push(form);
    Json(serde_json::json!({ "ok": true })).into_response()
}

async fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

async fn accepted_message() -> Response {
    (StatusCode::ACCEPTED, Json(serde_json::json!({ "ok": true }))).into_response()
}

async fn rejected_message() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "ok": false, "description": "Bad Request: chat not found" })),
    )
        .into_response()
}

/// Start the fake server, returning its base URL.
async fn spawn_server(state: FakeServer) -> String {
    let app = Router::new()
        .route("/products/x1-carbon", get(product_page))
        .route("/products/empty", get(no_content))
        .route("/accepted/:bot/sendMessage", post(accepted_message))
        .route("/ok/:bot/sendMessage", post(send_message))
        .route("/bad/:bot/sendMessage", post(rejected_message))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn temp_path() -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("pricewatch_e2e_{}.txt", uuid::Uuid::new_v4()));
    p
}

fn telegram(base: &str, prefix: &str) -> Box<dyn Notifier> {
    Box::new(
        TelegramNotifier::new(
            format!("{base}/{prefix}"),
            SecretString::new("123:abc".into()),
            "4242",
            Duration::from_secs(5),
        )
        .unwrap(),
    )
}

fn build_monitor(base: &str, log: &PathBuf, notifiers: Vec<Box<dyn Notifier>>) -> PriceMonitor {
    let product = ProductConfig {
        name: "Bambulab".into(),
        url: format!("{base}/products/x1-carbon"),
        ..ProductConfig::default()
    };
    PriceMonitor::new(
        Box::new(HttpPageSource::new(&product, Duration::from_secs(5)).unwrap()),
        PriceExtractor::new(&SelectorConfig::default()).unwrap(),
        PriceJournal::new(log),
        notifiers,
        "Bambulab Price Monitor",
        MonitorState::new(Duration::from_secs(60), false),
    )
}

fn journal_lines(path: &PathBuf) -> Vec<String> {
    std::fs::read_to_string(path)
        .map(|s| s.lines().map(String::from).collect())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_change_steady_miss_change() {
    let server = FakeServer::default();
    server.prices.lock().unwrap().extend([
        Some("999 €".to_string()),
        Some("999 €".to_string()),
        None,
        Some("949 €".to_string()),
    ]);
    let base = spawn_server(server.clone()).await;
    let log = temp_path();
    let mut monitor = build_monitor(&base, &log, vec![telegram(&base, "ok")]);

    let first = monitor.run_cycle().await;
    assert_eq!(
        first,
        CycleOutcome::Changed { previous: None, current: PriceReading::new("999.00") }
    );
    assert_eq!(server.messages.lock().unwrap().len(), 1);

    let second = monitor.run_cycle().await;
    assert_eq!(second, CycleOutcome::Steady(PriceReading::new("999.00")));
    assert_eq!(server.messages.lock().unwrap().len(), 1);

    let third = monitor.run_cycle().await;
    assert_eq!(third, CycleOutcome::NoReading);
    assert_eq!(monitor.state().last_known_price, Some(PriceReading::new("999.00")));

    let fourth = monitor.run_cycle().await;
    assert!(fourth.is_change());
    assert_eq!(monitor.state().last_known_price, Some(PriceReading::new("949.00")));

    let lines = journal_lines(&log);
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("New price: 999.00€ - "));
    assert!(lines[1].starts_with("Checked, no change, current price: 999.00€ - "));
    assert!(lines[2].starts_with("New price: 949.00€ - "));

    let messages = server.messages.lock().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["chat_id"], "4242");
    assert_eq!(messages[0]["parse_mode"], "Markdown");
    assert_eq!(
        messages[0]["text"],
        "📢 *Bambulab Price Monitor*\n\nThe new price is: *999.00€*"
    );
    assert!(messages[1]["text"].ends_with("Previous: 999.00€ (-50.00€)"));

    let state = monitor.state();
    assert_eq!((state.cycles, state.changes, state.steady, state.misses), (4, 2, 1, 1));

    std::fs::remove_file(&log).unwrap();
}

#[tokio::test]
async fn test_rejected_bot_message_does_not_block_delivery() {
    let server = FakeServer::default();
    server.prices.lock().unwrap().push_back(Some("1.299,00 €".to_string()));
    let base = spawn_server(server.clone()).await;
    let log = temp_path();
    let mut monitor = build_monitor(
        &base,
        &log,
        vec![telegram(&base, "bad"), telegram(&base, "ok")],
    );

    let outcome = monitor.run_cycle().await;

    assert!(outcome.is_change());
    assert_eq!(server.messages.lock().unwrap().len(), 1);
    assert_eq!(monitor.state().last_known_price, Some(PriceReading::new("1.299,00")));
    std::fs::remove_file(&log).unwrap();
}

#[tokio::test]
async fn test_unreachable_page_is_no_reading() {
    // Nothing listens on this port once the listener is dropped.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let log = temp_path();
    let mut monitor = build_monitor(&base, &log, vec![]);

    assert_eq!(monitor.run_cycle().await, CycleOutcome::NoReading);
    assert!(monitor.state().last_known_price.is_none());
    assert!(journal_lines(&log).is_empty());
}

#[tokio::test]
async fn test_page_requires_status_200() {
    let base = spawn_server(FakeServer::default()).await;
    let product = ProductConfig {
        url: format!("{base}/products/empty"),
        ..ProductConfig::default()
    };
    let source = HttpPageSource::new(&product, Duration::from_secs(5)).unwrap();

    let err = source.fetch_page().await.unwrap_err();
    assert!(matches!(err, MonitorError::Status(204)));
}

#[tokio::test]
async fn test_bot_requires_status_200() {
    let base = spawn_server(FakeServer::default()).await;
    let alert = PriceAlert::new("Bambulab Price Monitor", None, PriceReading::new("999.00"));

    let err = telegram(&base, "accepted").notify(&alert).await.unwrap_err();
    match err {
        MonitorError::Notify { channel, message } => {
            assert_eq!(channel, "telegram");
            assert!(message.contains("202"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
