//! Integration tests for the Telegram handler.

use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded};
use parking_lot::Mutex;

use crate::exception::ExceptionInfo;
use crate::filters::RequestContextFilter;
use crate::handler::{Handler, HandlerError};
use crate::level::Level;
use crate::log_record::LogRecord;
use crate::request::RequestInfo;
use crate::test_utils::spawn_mock_server;

use super::{DeliveryError, SendMessage, TelegramHandler, TelegramHandlerConfig, Transport};

// ------------------------------------------------------------------
// In-process transports
// ------------------------------------------------------------------

/// Records delivered texts and tracks how many sends overlap.
#[derive(Clone, Default)]
struct RecordingTransport {
    sent: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl Transport for RecordingTransport {
    fn send(&mut self, _endpoint: &str, body: &SendMessage<'_>) -> Result<(), DeliveryError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.sent.lock().push(body.text.to_owned());
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Blocks the first delivery until released, announcing when it started.
struct GatedTransport {
    entered: Sender<()>,
    release: Receiver<()>,
    sent: Arc<Mutex<Vec<String>>>,
    gated: bool,
}

impl Transport for GatedTransport {
    fn send(&mut self, _endpoint: &str, body: &SendMessage<'_>) -> Result<(), DeliveryError> {
        if self.gated {
            self.gated = false;
            let _ = self.entered.send(());
            let _ = self.release.recv();
        }
        self.sent.lock().push(body.text.to_owned());
        Ok(())
    }
}

fn plain_config(capacity: usize) -> TelegramHandlerConfig {
    let mut config = TelegramHandlerConfig::new("123:ABC", "-1001");
    config.capacity = capacity;
    config.formatter = crate::formatter::SharedFormatter::new(crate::formatter::DefaultFormatter);
    config
}

fn error_record(message: &str) -> LogRecord {
    LogRecord::new("app", Level::Error, message)
}

#[test]
fn full_queue_drops_the_newest_record() {
    let (handler, entered_rx, release_tx, sent) = gated_handler(2);

    // Occupy the worker so nothing drains while the queue fills.
    handler.handle(error_record("plug")).expect("plug accepted");
    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("worker picked up the plug");

    assert_eq!(handler.handle(error_record("first")), Ok(()));
    assert_eq!(handler.handle(error_record("second")), Ok(()));
    assert_eq!(
        handler.handle(error_record("third")),
        Err(HandlerError::QueueFull)
    );

    release_tx.send(()).expect("release worker");
    assert!(handler.shutdown());

    let texts = sent.lock().clone();
    assert_eq!(
        texts,
        ["app [ERROR] plug", "app [ERROR] first", "app [ERROR] second"]
    );
    let stats = handler.stats();
    assert_eq!((stats.accepted, stats.dropped, stats.delivered), (3, 1, 3));
}

/// Handler whose worker parks on its first delivery, plus the gate's
/// "entered" and "release" ends and the delivered texts.
type GatedHandler = (
    TelegramHandler,
    Receiver<()>,
    Sender<()>,
    Arc<Mutex<Vec<String>>>,
);

fn gated_handler(capacity: usize) -> GatedHandler {
    let (entered_tx, entered_rx) = bounded(1);
    let (release_tx, release_rx) = bounded(1);
    let sent = Arc::new(Mutex::new(Vec::new()));
    let transport = GatedTransport {
        entered: entered_tx,
        release: release_rx,
        sent: Arc::clone(&sent),
        gated: true,
    };
    let handler =
        TelegramHandler::with_transport(plain_config(capacity), transport).expect("spawn");
    (handler, entered_rx, release_tx, sent)
}

#[test]
fn pending_flush_leaves_message_capacity_intact() {
    let (handler, entered, release, sent) = gated_handler(2);
    let handler = Arc::new(handler);

    handler.handle(error_record("plug")).expect("plug accepted");
    entered
        .recv_timeout(Duration::from_secs(5))
        .expect("worker picked up the plug");
    handler.handle(error_record("first")).expect("accepted");

    let flusher = {
        let handler = Arc::clone(&handler);
        thread::spawn(move || handler.flush())
    };
    // Give the flush marker time to reach the queue behind "first".
    thread::sleep(Duration::from_millis(100));

    assert_eq!(handler.handle(error_record("second")), Ok(()));
    assert_eq!(
        handler.handle(error_record("third")),
        Err(HandlerError::QueueFull)
    );

    release.send(()).expect("release worker");
    assert!(flusher.join().expect("flusher panicked"));
    assert!(handler.shutdown());
    assert_eq!(
        *sent.lock(),
        ["app [ERROR] plug", "app [ERROR] first", "app [ERROR] second"]
    );
    let stats = handler.stats();
    assert_eq!((stats.accepted, stats.dropped), (3, 1));
}

#[test]
fn concurrent_producers_keep_per_thread_order() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: usize = 50;

    let transport = RecordingTransport::default();
    let handler = Arc::new(
        TelegramHandler::with_transport(plain_config(PRODUCERS * PER_PRODUCER), transport.clone())
            .expect("spawn"),
    );

    let threads: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let handler = Arc::clone(&handler);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    handler
                        .handle(error_record(&format!("{p}:{i}")))
                        .expect("capacity covers every record");
                }
            })
        })
        .collect();
    for t in threads {
        t.join().expect("producer panicked");
    }
    assert!(handler.flush());

    let sent = transport.sent.lock().clone();
    assert_eq!(sent.len(), PRODUCERS * PER_PRODUCER);
    for p in 0..PRODUCERS {
        let prefix = format!("app [ERROR] {p}:");
        let seen: Vec<usize> = sent
            .iter()
            .filter_map(|s| s.strip_prefix(&prefix))
            .map(|i| i.parse().expect("numeric suffix"))
            .collect();
        assert_eq!(seen, (0..PER_PRODUCER).collect::<Vec<_>>());
    }
    assert_eq!(transport.max_in_flight.load(Ordering::SeqCst), 1);
}

#[test]
fn records_below_level_are_ignored() {
    let transport = RecordingTransport::default();
    let handler =
        TelegramHandler::with_transport(plain_config(4), transport.clone()).expect("spawn");

    handler
        .handle(LogRecord::new("app", Level::Warn, "just a warning"))
        .expect("ignored records are not errors");
    handler.handle(error_record("real")).expect("accepted");
    assert!(handler.flush());

    assert_eq!(*transport.sent.lock(), ["app [ERROR] real"]);
    assert_eq!(handler.stats().accepted, 1);
}

#[test]
fn closed_handler_rejects_records() {
    let handler = TelegramHandler::with_transport(plain_config(4), RecordingTransport::default())
        .expect("spawn");
    assert!(handler.shutdown());
    assert!(handler.is_closed());
    assert_eq!(
        handler.handle(error_record("late")),
        Err(HandlerError::Closed)
    );
    assert!(!handler.flush());
    assert_eq!(handler.stats().dropped, 1);
    assert!(handler.shutdown(), "second shutdown is a no-op");
}

#[test]
fn shutdown_drains_queued_messages() {
    let transport = RecordingTransport::default();
    let handler =
        TelegramHandler::with_transport(plain_config(32), transport.clone()).expect("spawn");
    for i in 0..20 {
        handler.handle(error_record(&format!("m{i}"))).expect("accepted");
    }
    assert!(handler.shutdown());
    assert_eq!(transport.sent.lock().len(), 20);
}

#[test]
fn alert_template_places_traceback_once() {
    let transport = RecordingTransport::default();
    let mut config = TelegramHandlerConfig::new("123:ABC", "-1001");
    config.filters.push(Arc::new(RequestContextFilter));
    let handler = TelegramHandler::with_transport(config, transport.clone()).expect("spawn");

    let request = RequestInfo::new("DELETE", "/api/v1/items/9")
        .with_user("ops")
        .with_remote_addr("203.0.113.5");
    let record = error_record("delete failed")
        .with_request(Arc::new(request))
        .with_exception(ExceptionInfo::new("PermissionDenied", "read-only replica"));
    handler.handle(record).expect("accepted");
    assert!(handler.flush());

    let sent = transport.sent.lock();
    let text = sent.first().expect("one alert");
    assert!(text.starts_with(concat!(
        "*🚨 Error Alert*\n",
        "*Level:* ERROR\n",
        "*Message:* delete failed\n",
    )));
    assert!(text.contains(concat!(
        "*User:* ops\n",
        "*Method:* DELETE\n",
        "*Path:* /api/v1/items/9\n",
        "*IP:* 203.0.113.5\n",
    )));
    assert_eq!(text.matches("PermissionDenied: read-only replica").count(), 1);
    assert!(text.ends_with("PermissionDenied: read-only replica\n```"));
}

// ------------------------------------------------------------------
// Real HTTP round trips against a mock server
// ------------------------------------------------------------------

fn http_handler(addr: SocketAddr) -> TelegramHandler {
    let mut config = plain_config(8);
    config.api_base = format!("http://{addr}");
    config.request_timeout = Duration::from_secs(2);
    TelegramHandler::with_config(config).expect("spawn")
}

#[test]
fn posts_send_message_json() {
    let (addr, rx) = spawn_mock_server(vec![200]);
    let handler = http_handler(addr);
    handler.handle(error_record("disk full")).expect("accepted");

    let captured = rx.recv_timeout(Duration::from_secs(5)).expect("request");
    assert_eq!(captured.method, "POST");
    assert_eq!(captured.path, "/bot123:ABC/sendMessage");
    assert_eq!(captured.header("content-type"), Some("application/json"));
    assert_eq!(
        captured.json(),
        serde_json::json!({
            "chat_id": "-1001",
            "text": "app [ERROR] disk full",
            "parse_mode": "Markdown",
        })
    );

    assert!(handler.flush());
    assert_eq!(handler.stats().delivered, 1);
}

#[test]
fn failed_delivery_does_not_stop_the_worker() {
    let (addr, rx) = spawn_mock_server(vec![500, 400, 200]);
    let handler = http_handler(addr);
    for msg in ["first", "second", "third"] {
        handler.handle(error_record(msg)).expect("accepted");
    }

    for expected in ["first", "second", "third"] {
        let captured = rx.recv_timeout(Duration::from_secs(5)).expect("request");
        assert!(captured.body.contains(expected));
    }
    assert!(handler.flush());
    let stats = handler.stats();
    assert_eq!((stats.delivered, stats.failed), (1, 2));
}

#[test]
fn long_messages_are_truncated_on_the_wire() {
    let (addr, rx) = spawn_mock_server(vec![200]);
    let handler = http_handler(addr);
    handler
        .handle(error_record(&"é".repeat(5000)))
        .expect("accepted");

    let captured = rx.recv_timeout(Duration::from_secs(5)).expect("request");
    let body = captured.json();
    let text = body["text"].as_str().expect("text field");
    assert_eq!(text.chars().count(), 4000);
    assert!(text.starts_with("app [ERROR] é"));
}

#[test]
fn unreachable_endpoint_counts_failures() {
    // Bind then drop to obtain a port with nothing listening.
    let addr = TcpListener::bind(("127.0.0.1", 0))
        .and_then(|l| l.local_addr())
        .expect("ephemeral port");
    let handler = http_handler(addr);
    handler.handle(error_record("nobody home")).expect("accepted");
    assert!(handler.flush());
    assert_eq!(handler.stats().failed, 1);
}
