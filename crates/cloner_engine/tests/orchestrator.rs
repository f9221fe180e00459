use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use cloner_engine::{
    BackendSettings, CloneError, CloneOrchestrator, PassthroughTransformer, ProgressEvent,
    ProgressSink, RemoteAiTransformer, ScrapeClient,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(cloner_logging::initialize_for_tests);
}

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl TestSink {
    fn percents(&self) -> Vec<u8> {
        self.events.lock().unwrap().iter().map(|e| e.percent).collect()
    }

    fn labels(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.stage.label())
            .collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

const PAGE: &str = "<html><head><title>t</title></head>\
                    <body><script>track()</script><p>content</p></body></html>";

fn scrape_body(html: &str) -> serde_json::Value {
    json!({
        "url": "https://example.com/",
        "title": "Example",
        "html": html,
        "screenshot": "c2hvdA==",
        "styles": [],
        "assets": [],
        "meta_data": {"description": "demo"},
        "status": "success",
        "processing_time": 842.0
    })
}

fn passthrough_orchestrator(server: &MockServer) -> CloneOrchestrator {
    let client = ScrapeClient::new(BackendSettings {
        base_url: server.uri(),
        ..BackendSettings::default()
    })
    .expect("scrape client");
    CloneOrchestrator::new(client, Box::new(PassthroughTransformer))
}

#[tokio::test]
async fn successful_run_emits_ordered_progress_and_one_result() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(200).set_body_json(scrape_body(PAGE)))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = passthrough_orchestrator(&server);
    let sink = TestSink::default();
    let result = orchestrator
        .run("https://example.com/", &sink)
        .await
        .expect("clone ok");

    assert_eq!(sink.percents(), vec![33, 66, 90, 100]);
    assert_eq!(
        sink.labels(),
        vec![
            "Scraping website...",
            "Processing with AI...",
            "Generating HTML...",
            "Complete!"
        ]
    );
    assert_eq!(result.original_url, "https://example.com/");
    assert_eq!(result.screenshot.as_deref(), Some("c2hvdA=="));
    assert_eq!(result.processing_time_ms, Some(842.0));
    assert!(chrono::DateTime::parse_from_rfc3339(&result.timestamp).is_ok());
    // Raw scraped markup never reaches the caller unsanitized.
    assert!(!result.html.contains("<script"));
    assert!(result.html.contains("<p>content</p>"));
    assert!(result.html.contains("name=\"viewport\""));
}

#[tokio::test]
async fn scrape_failure_stops_the_progress_stream() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "boom"})))
        .mount(&server)
        .await;

    let orchestrator = passthrough_orchestrator(&server);
    let sink = TestSink::default();
    let err = orchestrator
        .run("https://example.com/", &sink)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        CloneError::Remote {
            status: 500,
            detail: "boom".to_string()
        }
    );
    assert_eq!(sink.percents(), vec![33]);
}

#[tokio::test]
async fn validation_failure_issues_zero_requests() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(200).set_body_json(scrape_body(PAGE)))
        .expect(0)
        .mount(&server)
        .await;

    let orchestrator = passthrough_orchestrator(&server);
    let sink = TestSink::default();
    let err = orchestrator.run("not a url", &sink).await.unwrap_err();

    assert!(matches!(err, CloneError::Validation(_)), "got {err:?}");
    assert_eq!(sink.percents(), vec![33]);
    server.verify().await;
}

#[tokio::test]
async fn concurrent_second_run_is_rejected_and_first_unaffected() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(300))
                .set_body_json(scrape_body(PAGE)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator = Arc::new(passthrough_orchestrator(&server));
    let first_sink = Arc::new(TestSink::default());
    let second_sink = Arc::new(TestSink::default());

    let first = {
        let orchestrator = orchestrator.clone();
        let sink = first_sink.clone();
        async move { orchestrator.run("https://example.com/", &*sink).await }
    };
    let second = {
        let orchestrator = orchestrator.clone();
        let sink = second_sink.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            orchestrator.run("https://example.com/second", &*sink).await
        }
    };

    let (first_result, second_result) = tokio::join!(first, second);

    assert_eq!(second_result.unwrap_err(), CloneError::Busy);
    assert!(second_sink.percents().is_empty());
    let first_result = first_result.expect("first run unaffected");
    assert_eq!(first_sink.percents(), vec![33, 66, 90, 100]);
    assert!(first_result.html.contains("<p>content</p>"));
}

#[tokio::test]
async fn failed_run_frees_the_orchestrator_for_resubmission() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "boom"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(200).set_body_json(scrape_body(PAGE)))
        .mount(&server)
        .await;

    let orchestrator = passthrough_orchestrator(&server);

    let sink = TestSink::default();
    orchestrator
        .run("https://example.com/", &sink)
        .await
        .unwrap_err();

    let sink = TestSink::default();
    let result = orchestrator
        .run("https://example.com/", &sink)
        .await
        .expect("resubmitted run succeeds");
    assert_eq!(sink.percents(), vec![33, 66, 90, 100]);
    assert!(result.html.contains("<p>content</p>"));
}

#[tokio::test]
async fn remote_ai_transformer_posts_context_and_result_is_sanitized() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(200).set_body_json(scrape_body(PAGE)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/clone"))
        .and(body_partial_json(json!({
            "context": {
                "url": "https://example.com/",
                "title": "Example",
                "html": PAGE,
                "meta_data": {"description": "demo"},
                "screenshot": "c2hvdA=="
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cloned_html": "<html><head></head>\
                            <body><script>x()</script><p>rebuilt</p></body></html>"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let settings = BackendSettings {
        base_url: server.uri(),
        ..BackendSettings::default()
    };
    let client = ScrapeClient::new(settings.clone()).expect("scrape client");
    let transformer = RemoteAiTransformer::new(settings).expect("transformer");
    let orchestrator = CloneOrchestrator::new(client, Box::new(transformer));

    let sink = TestSink::default();
    let result = orchestrator
        .run("https://example.com/", &sink)
        .await
        .expect("clone ok");

    assert_eq!(sink.percents(), vec![33, 66, 90, 100]);
    assert!(result.html.contains("<p>rebuilt</p>"));
    assert!(!result.html.contains("<script"));
    assert!(result.html.contains("name=\"viewport\""));
}

#[tokio::test]
async fn transform_failure_maps_to_transform_error() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(200).set_body_json(scrape_body(PAGE)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/clone"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "model overloaded"})),
        )
        .mount(&server)
        .await;

    let settings = BackendSettings {
        base_url: server.uri(),
        ..BackendSettings::default()
    };
    let client = ScrapeClient::new(settings.clone()).expect("scrape client");
    let transformer = RemoteAiTransformer::new(settings).expect("transformer");
    let orchestrator = CloneOrchestrator::new(client, Box::new(transformer));

    let sink = TestSink::default();
    let err = orchestrator
        .run("https://example.com/", &sink)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        CloneError::Transform {
            status: 500,
            detail: "model overloaded".to_string()
        }
    );
    assert_eq!(sink.percents(), vec![33, 66]);
}
