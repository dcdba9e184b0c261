//! Integration tests for the watcher
//!
//! These tests use wiremock to serve a paginated incident feed and run full
//! crawl cycles against it, with the watermark persisted in a temp directory.

use avherald_watch::config::{Config, OutputKind};
use avherald_watch::crawler::{watch_once, Scheduler, WalkStop};
use avherald_watch::output::{ChannelSink, IncidentEvent, OutputError};
use avherald_watch::storage::{FileStateStore, StateStore};
use avherald_watch::{CrawlWatermark, WatchError};
use std::path::Path;
use tempfile::TempDir;
use tokio::sync::mpsc::Receiver;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One incident row as the feed renders it
fn row(id: &str, airline: &str, reason: &str) -> String {
    format!(
        r#"<tr>
            <td><img src="/images/incident.gif" alt="Incident"></td>
            <td><a href="/h?article={id}&opt=0"><span class="headline_avherald">{airline} B738 at Chicago on Jan 3rd 2013, {reason}</span></a></td>
        </tr>"#
    )
}

/// A feed page of `(id, airline, reason)` rows, newest first
fn page(rows: &[(&str, &str, &str)], next: Option<&str>) -> String {
    let rows: Vec<String> = rows.iter().map(|(id, a, r)| row(id, a, r)).collect();
    let nav = next
        .map(|href| format!(r#"<a href="{}"><img src="/images/next.jpg"></a>"#, href))
        .unwrap_or_default();
    format!(
        "<html><body><table class=\"feed\">{}</table>{}</body></html>",
        rows.join("\n"),
        nav
    )
}

async fn mount(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn test_config(server: &MockServer, start: &str, state: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.root_url = server.uri();
    config.crawler.start_position = start.parse().unwrap();
    config.state.sincedb_path = Some(state.display().to_string());
    config
}

fn scheduler(config: &Config, sink: ChannelSink) -> Scheduler {
    let store = FileStateStore::new(config.state.resolved_path());
    Scheduler::new(config, Box::new(store), Box::new(sink), false).unwrap()
}

fn drain(receiver: &mut Receiver<IncidentEvent>) -> Vec<IncidentEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

fn ids(events: &[IncidentEvent]) -> Vec<&str> {
    events.iter().map(|e| e.id.as_str()).collect()
}

fn persisted(state: &Path) -> Option<CrawlWatermark> {
    FileStateStore::new(state).load().unwrap()
}

#[tokio::test]
async fn test_backfill_emits_oldest_first_across_pages() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/",
        page(
            &[("f6", "Delta", "smoke"), ("e5", "United", "bird strike")],
            Some("/page2"),
        ),
    )
    .await;
    mount(
        &server,
        "/page2",
        page(&[("d4", "KLM", "tail strike"), ("c3", "AF", "icing")], None),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let state = dir.path().join("sincedb");
    let config = test_config(&server, "beginning", &state);
    let (sink, mut receiver) = ChannelSink::bounded(16);

    let stats = scheduler(&config, sink).run_cycle().await.unwrap();

    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.stop, Some(WalkStop::NoNextPage));
    let events = drain(&mut receiver);
    assert_eq!(ids(&events), vec!["c3", "d4", "e5", "f6"]);
    assert_eq!(
        events[0].url,
        format!("{}/h?article=c3&opt=0", server.uri())
    );
    assert_eq!(events[0].airline.as_deref(), Some("AF"));
    assert_eq!(persisted(&state), Some(CrawlWatermark::new("f6")));
}

#[tokio::test]
async fn test_watermark_on_second_page_fetches_two_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(
            &[("i9", "Delta", "smoke"), ("i8", "Delta", "smoke")],
            Some("/page2"),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(
            &[("i7", "Delta", "smoke"), ("i6", "Delta", "smoke")],
            Some("/page3"),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(
            &[("i5", "Delta", "smoke")],
            None,
        )))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, "i6", &dir.path().join("sincedb"));
    let (sink, mut receiver) = ChannelSink::bounded(16);

    let stats = scheduler(&config, sink).run_cycle().await.unwrap();

    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(ids(&drain(&mut receiver)), vec!["i7", "i8", "i9"]);
}

#[tokio::test]
async fn test_second_cycle_without_new_incidents_emits_nothing() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/",
        page(&[("b2", "Delta", "smoke"), ("a1", "AF", "icing")], None),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, "beginning", &dir.path().join("sincedb"));
    let (sink, mut receiver) = ChannelSink::bounded(16);
    let mut scheduler = scheduler(&config, sink);

    let first = scheduler.run_cycle().await.unwrap();
    assert_eq!(first.events_emitted, 2);
    assert_eq!(drain(&mut receiver).len(), 2);

    let second = scheduler.run_cycle().await.unwrap();
    assert_eq!(second.incidents_seen, 0);
    assert_eq!(second.events_emitted, 0);
    assert_eq!(second.stop, Some(WalkStop::FoundWatermark));
    assert!(drain(&mut receiver).is_empty());
}

#[tokio::test]
async fn test_restart_resumes_from_persisted_watermark() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/",
        page(&[("b2", "Delta", "smoke"), ("a1", "AF", "icing")], None),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let state = dir.path().join("sincedb");
    let config = test_config(&server, "beginning", &state);

    {
        let (sink, _receiver) = ChannelSink::bounded(16);
        let mut first_run = scheduler(&config, sink);
        first_run.run_cycle().await.unwrap();
        first_run.shutdown().unwrap();
    }

    server.reset().await;
    mount(
        &server,
        "/",
        page(
            &[
                ("c3", "United", "engine fire"),
                ("b2", "Delta", "smoke"),
                ("a1", "AF", "icing"),
            ],
            None,
        ),
    )
    .await;

    let (sink, mut receiver) = ChannelSink::bounded(16);
    let mut second_run = scheduler(&config, sink);
    assert_eq!(second_run.watermark(), &CrawlWatermark::new("b2"));

    second_run.run_cycle().await.unwrap();
    assert_eq!(ids(&drain(&mut receiver)), vec!["c3"]);
    assert_eq!(persisted(&state), Some(CrawlWatermark::new("c3")));
}

#[tokio::test]
async fn test_end_position_then_new_incident_via_jsonl_output() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/",
        page(&[("b2", "Delta", "smoke"), ("a1", "AF", "icing")], None),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let state = dir.path().join("sincedb");
    let output = dir.path().join("incidents.jsonl");
    let mut config = test_config(&server, "end", &state);
    config.output.kind = OutputKind::Jsonl;
    config.output.path = Some(output.display().to_string());

    let primed = watch_once(&config, false).await.unwrap();
    assert!(primed.primed);
    assert_eq!(primed.events_emitted, 0);
    assert_eq!(persisted(&state), Some(CrawlWatermark::new("b2")));
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "");

    server.reset().await;
    mount(
        &server,
        "/",
        page(
            &[
                ("c3", "United", "engine fire"),
                ("b2", "Delta", "smoke"),
                ("a1", "AF", "icing"),
            ],
            None,
        ),
    )
    .await;

    let cycle = watch_once(&config, false).await.unwrap();
    assert_eq!(cycle.events_emitted, 1);

    let content = std::fs::read_to_string(&output).unwrap();
    let events: Vec<IncidentEvent> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(ids(&events), vec!["c3"]);
    assert_eq!(events[0].reason_text.as_deref(), Some("engine fire"));
}

#[tokio::test]
async fn test_last_position_emits_single_newest_incident() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/",
        page(&[("b2", "Delta", "smoke"), ("a1", "AF", "icing")], None),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&server, "last", &dir.path().join("sincedb"));
    let (sink, mut receiver) = ChannelSink::bounded(16);
    let mut scheduler = scheduler(&config, sink);

    scheduler.run_cycle().await.unwrap();
    assert_eq!(ids(&drain(&mut receiver)), vec!["b2"]);

    scheduler.run_cycle().await.unwrap();
    assert!(drain(&mut receiver).is_empty());
}

#[tokio::test]
async fn test_fetch_failure_leaves_watermark_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let state = dir.path().join("sincedb");
    FileStateStore::new(&state)
        .save(&CrawlWatermark::new("a1"))
        .unwrap();

    let config = test_config(&server, "beginning", &state);
    let (sink, mut receiver) = ChannelSink::bounded(16);
    let mut scheduler = scheduler(&config, sink);

    let error = scheduler.run_cycle().await.unwrap_err();
    assert!(matches!(error, WatchError::Fetch(_)));
    assert!(error.is_retryable());
    assert_eq!(scheduler.watermark(), &CrawlWatermark::new("a1"));

    server.reset().await;
    mount(
        &server,
        "/",
        page(&[("b2", "Delta", "smoke"), ("a1", "AF", "icing")], None),
    )
    .await;

    scheduler.run_cycle().await.unwrap();
    assert_eq!(ids(&drain(&mut receiver)), vec!["b2"]);
    assert_eq!(persisted(&state), Some(CrawlWatermark::new("b2")));
}

#[tokio::test]
async fn test_backpressure_resumes_without_duplicates() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/",
        page(
            &[
                ("d4", "Delta", "smoke"),
                ("c3", "Delta", "smoke"),
                ("b2", "Delta", "smoke"),
            ],
            None,
        ),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let state = dir.path().join("sincedb");
    let config = test_config(&server, "beginning", &state);
    let (sink, mut receiver) = ChannelSink::bounded(2);
    let mut scheduler = scheduler(&config, sink);

    let error = scheduler.run_cycle().await.unwrap_err();
    assert!(matches!(
        error,
        WatchError::Output(OutputError::Backpressure)
    ));
    assert_eq!(persisted(&state), Some(CrawlWatermark::new("c3")));
    assert_eq!(ids(&drain(&mut receiver)), vec!["b2", "c3"]);

    scheduler.run_cycle().await.unwrap();
    assert_eq!(ids(&drain(&mut receiver)), vec!["d4"]);
}

#[tokio::test]
async fn test_keyword_fan_out_tags_each_record() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/",
        page(
            &[
                ("b2", "Delta", "bird strike and engine fire"),
                ("a1", "AF", "icing"),
            ],
            None,
        ),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server, "beginning", &dir.path().join("sincedb"));
    config.filter.keywords = vec!["bird".to_string(), "engine".to_string()];
    let (sink, mut receiver) = ChannelSink::bounded(16);

    scheduler(&config, sink).run_cycle().await.unwrap();

    let events = drain(&mut receiver);
    let keywords: Vec<Option<&str>> = events
        .iter()
        .map(|e| e.matched_keyword.as_deref())
        .collect();
    assert_eq!(ids(&events), vec!["b2", "b2"]);
    assert_eq!(keywords, vec![Some("bird"), Some("engine")]);
}
