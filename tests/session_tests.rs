//! End-to-end session tests against fake host capabilities and a mock
//! completion endpoint.

use std::sync::{Arc, Mutex};

use expound::{
    ContentRegion, CursorPosition, DisplaySurface, EditorAccess, ElaborationSession, ProviderKind,
    ProviderSettings, SessionState, prompt,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct FakeEditor {
    selection: String,
    line: String,
}

impl EditorAccess for FakeEditor {
    fn selection(&self) -> String {
        self.selection.clone()
    }

    fn cursor_position(&self) -> CursorPosition {
        CursorPosition { line: 0, column: 11 }
    }

    fn line_text(&self, _line: usize) -> String {
        self.line.clone()
    }
}

fn editor() -> FakeEditor {
    FakeEditor {
        selection: "photosynthesis".to_string(),
        line: "Plants use photosynthesis to convert light into energy.".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Shown {
    Markdown(String),
    ErrorNotice(String),
}

#[derive(Default)]
struct RegionState {
    closed: bool,
    shown: Option<Shown>,
    markdown_renders: Vec<String>,
    /// When set, the region closes itself after this many markdown renders,
    /// simulating the user dismissing the panel mid-stream.
    close_after_renders: Option<usize>,
}

#[derive(Clone)]
struct SharedRegion(Arc<Mutex<RegionState>>);

impl SharedRegion {
    fn new(close_after_renders: Option<usize>) -> Self {
        Self(Arc::new(Mutex::new(RegionState {
            close_after_renders,
            ..RegionState::default()
        })))
    }

    fn shown(&self) -> Option<Shown> {
        self.0.lock().unwrap().shown.clone()
    }

    fn markdown_renders(&self) -> Vec<String> {
        self.0.lock().unwrap().markdown_renders.clone()
    }
}

impl ContentRegion for SharedRegion {
    fn set_markdown(&mut self, text: &str) {
        let mut state = self.0.lock().unwrap();
        assert!(!state.closed, "must not mutate a disposed region");
        state.shown = Some(Shown::Markdown(text.to_string()));
        state.markdown_renders.push(text.to_string());
        if let Some(limit) = state.close_after_renders
            && state.markdown_renders.len() >= limit
        {
            state.closed = true;
        }
    }

    fn set_error_notice(&mut self, text: &str) {
        let mut state = self.0.lock().unwrap();
        assert!(!state.closed, "must not mutate a disposed region");
        state.shown = Some(Shown::ErrorNotice(text.to_string()));
    }

    fn is_open(&self) -> bool {
        !self.0.lock().unwrap().closed
    }
}

struct FakeDisplay {
    region: SharedRegion,
    titles: Arc<Mutex<Vec<String>>>,
}

impl FakeDisplay {
    fn new(region: SharedRegion) -> Self {
        Self {
            region,
            titles: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl DisplaySurface for FakeDisplay {
    fn open_panel(&self, title: &str) -> Box<dyn ContentRegion> {
        self.titles.lock().unwrap().push(title.to_string());
        Box::new(self.region.clone())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn settings_for(server: &MockServer) -> ProviderSettings {
    init_tracing();
    let mut settings = ProviderSettings::default();
    settings.apply_preset(ProviderKind::Custom);
    settings.base_url = server.uri();
    settings.model = "gpt-3.5-turbo".to_string();
    settings.api_key = "sk-test".to_string();
    settings
}

fn sse_body(fragments: &[&str], done: bool) -> String {
    let mut body = String::from("data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n");
    for fragment in fragments {
        let encoded = serde_json::to_string(fragment).unwrap();
        body.push_str(&format!(
            "data: {{\"choices\":[{{\"delta\":{{\"content\":{encoded}}}}}]}}\n\n"
        ));
    }
    if done {
        body.push_str("data: [DONE]\n\n");
    }
    body
}

async fn mount_stream(server: &MockServer, body: String) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn session_streams_to_completion() {
    let server = MockServer::start().await;
    mount_stream(&server, sse_body(&["Hel", "lo, ", "world"], true)).await;

    let region = SharedRegion::new(None);
    let display = FakeDisplay::new(region.clone());
    let titles = Arc::clone(&display.titles);

    let mut session =
        ElaborationSession::new(editor(), display, settings_for(&server)).expect("session");
    assert_eq!(session.state(), SessionState::Idle);

    let final_state = session.run().await;

    assert_eq!(final_state, SessionState::Completed);
    assert_eq!(session.state(), SessionState::Completed);
    assert_eq!(*titles.lock().unwrap(), vec!["photosynthesis".to_string()]);
    assert_eq!(
        region.markdown_renders(),
        vec!["Hel", "Hello, ", "Hello, world"]
    );
    assert_eq!(
        region.shown(),
        Some(Shown::Markdown("Hello, world".to_string()))
    );
}

#[tokio::test]
async fn final_content_does_not_echo_the_prompts() {
    let server = MockServer::start().await;
    mount_stream(&server, sse_body(&["Photosynthesis is how plants eat."], true)).await;

    let region = SharedRegion::new(None);
    let mut session = ElaborationSession::new(
        editor(),
        FakeDisplay::new(region.clone()),
        settings_for(&server),
    )
    .expect("session");
    session.run().await;

    let Some(Shown::Markdown(content)) = region.shown() else {
        panic!("expected markdown content");
    };
    assert!(!content.contains("Elaborate on"));
    assert!(!content.contains(prompt::SYSTEM_PROMPT));
}

#[tokio::test]
async fn rejected_credential_renders_only_the_error_notice() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let region = SharedRegion::new(None);
    let mut session = ElaborationSession::new(
        editor(),
        FakeDisplay::new(region.clone()),
        settings_for(&server),
    )
    .expect("session");

    let final_state = session.run().await;

    assert_eq!(final_state, SessionState::Failed);
    assert!(region.markdown_renders().is_empty());
    assert_eq!(
        region.shown(),
        Some(Shown::ErrorNotice(prompt::ERROR_NOTICE.to_string()))
    );
}

#[tokio::test]
async fn mid_stream_failure_discards_partial_content() {
    let server = MockServer::start().await;
    // Fragments arrive but the body ends without the terminal marker.
    mount_stream(&server, sse_body(&["partial ", "answer"], false)).await;

    let region = SharedRegion::new(None);
    let mut session = ElaborationSession::new(
        editor(),
        FakeDisplay::new(region.clone()),
        settings_for(&server),
    )
    .expect("session");

    let final_state = session.run().await;

    assert_eq!(final_state, SessionState::Failed);
    assert_eq!(region.markdown_renders(), vec!["partial ", "partial answer"]);
    assert_eq!(
        region.shown(),
        Some(Shown::ErrorNotice(prompt::ERROR_NOTICE.to_string())),
        "the error notice replaces the partial accumulator"
    );
}

#[tokio::test]
async fn closing_the_region_stops_rendering_but_not_the_session() {
    let server = MockServer::start().await;
    mount_stream(&server, sse_body(&["Hel", "lo, ", "world"], true)).await;

    let region = SharedRegion::new(Some(1));
    let mut session = ElaborationSession::new(
        editor(),
        FakeDisplay::new(region.clone()),
        settings_for(&server),
    )
    .expect("session");

    let final_state = session.run().await;

    // The stream is still drained to its end; only rendering stops.
    assert_eq!(final_state, SessionState::Completed);
    assert_eq!(region.markdown_renders(), vec!["Hel"]);
    assert_eq!(region.shown(), Some(Shown::Markdown("Hel".to_string())));
}

#[tokio::test]
async fn closed_region_is_not_mutated_by_a_late_failure() {
    let server = MockServer::start().await;
    mount_stream(&server, sse_body(&["Hel", "lo"], false)).await;

    let region = SharedRegion::new(Some(1));
    let mut session = ElaborationSession::new(
        editor(),
        FakeDisplay::new(region.clone()),
        settings_for(&server),
    )
    .expect("session");

    let final_state = session.run().await;

    assert_eq!(final_state, SessionState::Failed);
    assert_eq!(
        region.shown(),
        Some(Shown::Markdown("Hel".to_string())),
        "a disposed region keeps its last content"
    );
}

#[tokio::test]
async fn a_finished_session_never_streams_again() {
    let server = MockServer::start().await;
    mount_stream(&server, sse_body(&["once"], true)).await;

    let region = SharedRegion::new(None);
    let display = FakeDisplay::new(region.clone());
    let titles = Arc::clone(&display.titles);

    let mut session =
        ElaborationSession::new(editor(), display, settings_for(&server)).expect("session");

    assert_eq!(session.run().await, SessionState::Completed);
    assert_eq!(session.run().await, SessionState::Completed);

    assert_eq!(titles.lock().unwrap().len(), 1, "no second panel is opened");
    let requests = server.received_requests().await.expect("recorded requests");
    assert_eq!(requests.len(), 1, "no second request is issued");
    assert_eq!(region.shown(), Some(Shown::Markdown("once".to_string())));
}

#[tokio::test]
async fn concurrent_sessions_keep_independent_state() {
    let server_a = MockServer::start().await;
    let server_b = MockServer::start().await;
    mount_stream(&server_a, sse_body(&["alpha"], true)).await;
    mount_stream(&server_b, sse_body(&["beta"], true)).await;

    let region_a = SharedRegion::new(None);
    let region_b = SharedRegion::new(None);

    let mut session_a = ElaborationSession::new(
        editor(),
        FakeDisplay::new(region_a.clone()),
        settings_for(&server_a),
    )
    .expect("session");
    let mut session_b = ElaborationSession::new(
        editor(),
        FakeDisplay::new(region_b.clone()),
        settings_for(&server_b),
    )
    .expect("session");

    let (state_a, state_b) = tokio::join!(session_a.run(), session_b.run());

    assert_eq!(state_a, SessionState::Completed);
    assert_eq!(state_b, SessionState::Completed);
    assert_eq!(region_a.shown(), Some(Shown::Markdown("alpha".to_string())));
    assert_eq!(region_b.shown(), Some(Shown::Markdown("beta".to_string())));
}
