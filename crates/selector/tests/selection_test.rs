//! Integration tests for the selection cycle.
//!
//! Finders are scripted in memory; image downloads go to a local mock server
//! and land in a temporary directory.

use async_trait::async_trait;
use finders::{Candidate, Finder, FinderError, StaticFinder};
use selector::{
    JsonFileCache, MAX_PAGINATION_ITERATIONS, SelectorConfig, SelectorError, SequenceRandom,
    WallpaperCache, WallpaperSelector,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IMAGE_BYTES: &[u8] = b"\x89PNG fake image payload";

fn candidate(server: &MockServer, id: &str) -> Candidate {
    Candidate::new(id, format!("title {id}"), "test", format!("{}/img/{id}.jpg", server.uri()))
}

fn candidates(server: &MockServer, ids: &[&str]) -> Vec<Candidate> {
    ids.iter().map(|id| candidate(server, id)).collect()
}

async fn image_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/img/.+"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(IMAGE_BYTES))
        .mount(&server)
        .await;
    server
}

/// Paginated finder replaying fixed pages and recording every cursor it got.
#[derive(Clone)]
struct ScriptedFinder {
    pages: Arc<Vec<Vec<Candidate>>>,
    cursors: Arc<Mutex<Vec<Option<String>>>>,
    /// When set, pages past the script keep producing fresh candidates
    endless_base: Option<String>,
    delay: Duration,
    /// Zero-based call index that returns an error instead of a page
    fail_on_call: Option<usize>,
    active: Arc<AtomicUsize>,
    max_active: Arc<AtomicUsize>,
}

impl ScriptedFinder {
    fn new(pages: Vec<Vec<Candidate>>) -> Self {
        Self {
            pages: Arc::new(pages),
            cursors: Arc::new(Mutex::new(Vec::new())),
            endless_base: None,
            delay: Duration::ZERO,
            fail_on_call: None,
            active: Arc::new(AtomicUsize::new(0)),
            max_active: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn endless(base_url: String) -> Self {
        let mut finder = Self::new(Vec::new());
        finder.endless_base = Some(base_url);
        finder
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn failing_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    fn cursors(&self) -> Vec<Option<String>> {
        self.cursors.lock().unwrap().clone()
    }

    fn calls(&self) -> usize {
        self.cursors.lock().unwrap().len()
    }
}

#[async_trait]
impl Finder for ScriptedFinder {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn list_available_wallpapers(
        &self,
        cursor: Option<&str>,
    ) -> finders::Result<Vec<Candidate>> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);

        let call = {
            let mut cursors = self.cursors.lock().unwrap();
            cursors.push(cursor.map(str::to_string));
            cursors.len() - 1
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.fail_on_call == Some(call) {
            self.active.fetch_sub(1, Ordering::SeqCst);
            return Err(FinderError::Status {
                finder: "scripted".to_string(),
                status: 503,
            });
        }

        let page = match (&self.endless_base, self.pages.get(call)) {
            (_, Some(page)) => page.clone(),
            (Some(base), None) => (0..2)
                .map(|i| {
                    let id = format!("p{call}_{i}");
                    Candidate::new(id.clone(), id.clone(), "test", format!("{base}/img/{id}.jpg"))
                })
                .collect(),
            (None, None) => Vec::new(),
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(page)
    }
}

struct FailingFinder;

#[async_trait]
impl Finder for FailingFinder {
    fn name(&self) -> &str {
        "failing"
    }

    async fn list_available_wallpapers(
        &self,
        _cursor: Option<&str>,
    ) -> finders::Result<Vec<Candidate>> {
        Err(FinderError::Other("source unavailable".to_string()))
    }
}

fn config(dir: &tempfile::TempDir, minimum: usize) -> SelectorConfig {
    SelectorConfig::new(dir.path()).with_minimum_pool_size(minimum)
}

fn saved_files(dir: &tempfile::TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_selected_path_embeds_pooled_id() {
    let server = image_server().await;
    let dir = tempfile::tempdir().unwrap();
    let pool_ids = ["t3_a", "t3_b", "t3_c"];

    let selector = WallpaperSelector::builder(config(&dir, 1))
        .add_finder(StaticFinder::new("first", candidates(&server, &pool_ids[..2])))
        .add_finder(StaticFinder::new("second", candidates(&server, &pool_ids[2..])))
        .build()
        .unwrap();

    let path = selector.select_new_wallpaper().await.unwrap();

    assert!(path.is_absolute());
    assert!(path.starts_with(dir.path()));
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));

    let file_name = path.file_name().unwrap().to_str().unwrap();
    assert!(
        pool_ids
            .iter()
            .any(|id| file_name == format!("wallpaper.{id}.jpg"))
    );
    assert_eq!(std::fs::read(&path).unwrap(), IMAGE_BYTES);
    assert_eq!(saved_files(&dir), vec![file_name.to_string()]);
}

#[tokio::test]
async fn test_deterministic_selection() {
    let server = image_server().await;
    let dir = tempfile::tempdir().unwrap();

    let selector = WallpaperSelector::builder(config(&dir, 1))
        .add_finder(StaticFinder::new(
            "fixed",
            candidates(&server, &["a", "b", "c", "d"]),
        ))
        .random_source(SequenceRandom::new([0.99]))
        .build()
        .unwrap();

    let path = selector.select_new_wallpaper().await.unwrap();
    assert_eq!(path, dir.path().join("wallpaper.d.jpg"));
}

#[tokio::test]
async fn test_empty_pool_fails_without_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(IMAGE_BYTES))
        .expect(0)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    let no_finders = WallpaperSelector::builder(config(&dir, 5)).build().unwrap();
    assert!(matches!(
        no_finders.select_new_wallpaper().await,
        Err(SelectorError::EmptyPool)
    ));

    let paginated = ScriptedFinder::new(Vec::new());
    let all_empty = WallpaperSelector::builder(config(&dir, 5))
        .add_finder(StaticFinder::new("empty", Vec::new()))
        .paginated_finder(paginated.clone())
        .build()
        .unwrap();
    assert!(matches!(
        all_empty.select_new_wallpaper().await,
        Err(SelectorError::EmptyPool)
    ));
    assert_eq!(paginated.calls(), 1);
    assert!(saved_files(&dir).is_empty());
}

#[tokio::test]
async fn test_pagination_stops_at_minimum_and_threads_cursor() {
    let server = image_server().await;
    let dir = tempfile::tempdir().unwrap();

    let paginated = ScriptedFinder::new(vec![
        candidates(&server, &["p1", "p2", "p3"]),
        candidates(&server, &["p4", "p5", "p6"]),
        candidates(&server, &["p7", "p8", "p9"]),
        candidates(&server, &["p10", "p11", "p12"]),
    ]);

    let selector = WallpaperSelector::builder(config(&dir, 7))
        .add_finder(StaticFinder::new("generic", candidates(&server, &["g1"])))
        .paginated_finder(paginated.clone())
        .build()
        .unwrap();

    let pool = selector.accumulate().await.unwrap();

    assert_eq!(pool.len(), 7);
    assert_eq!(
        paginated.cursors(),
        vec![None, Some("p3".to_string())]
    );
}

#[tokio::test]
async fn test_pagination_respects_iteration_ceiling() {
    let server = image_server().await;
    let dir = tempfile::tempdir().unwrap();
    let paginated = ScriptedFinder::endless(server.uri());

    let selector = WallpaperSelector::builder(config(&dir, 10_000))
        .paginated_finder(paginated.clone())
        .build()
        .unwrap();

    let pool = selector.accumulate().await.unwrap();

    assert_eq!(paginated.calls(), MAX_PAGINATION_ITERATIONS);
    assert_eq!(pool.len(), 2 * MAX_PAGINATION_ITERATIONS);

    let cursors = paginated.cursors();
    assert_eq!(cursors[0], None);
    for (call, cursor) in cursors.iter().enumerate().skip(1) {
        assert_eq!(cursor.as_deref(), Some(format!("p{}_1", call - 1).as_str()));
    }
}

#[tokio::test]
async fn test_empty_page_stops_pagination_early() {
    let server = image_server().await;
    let dir = tempfile::tempdir().unwrap();

    let paginated = ScriptedFinder::new(vec![
        candidates(&server, &["p1", "p2"]),
        candidates(&server, &["p3"]),
        Vec::new(),
        candidates(&server, &["never"]),
    ]);

    let selector = WallpaperSelector::builder(config(&dir, 100))
        .paginated_finder(paginated.clone())
        .build()
        .unwrap();

    let path = selector.select_new_wallpaper().await.unwrap();

    assert_eq!(paginated.calls(), 3);
    assert_eq!(
        paginated.cursors(),
        vec![None, Some("p2".to_string()), Some("p3".to_string())]
    );
    assert!(!path.to_string_lossy().contains("never"));
}

#[tokio::test]
async fn test_pagination_skipped_when_generic_finders_fill_pool() {
    let server = image_server().await;
    let dir = tempfile::tempdir().unwrap();
    let paginated = ScriptedFinder::endless(server.uri());

    let selector = WallpaperSelector::builder(config(&dir, 2))
        .add_finder(StaticFinder::new("generic", candidates(&server, &["a", "b"])))
        .paginated_finder(paginated.clone())
        .build()
        .unwrap();

    let pool = selector.accumulate().await.unwrap();

    assert_eq!(pool.len(), 2);
    assert_eq!(paginated.calls(), 0);
}

#[tokio::test]
async fn test_failing_finder_aborts_cycle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(IMAGE_BYTES))
        .expect(0)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let paginated = ScriptedFinder::endless(server.uri());

    let selector = WallpaperSelector::builder(config(&dir, 5))
        .add_finder(StaticFinder::new("good", candidates(&server, &["a"])))
        .add_finder(FailingFinder)
        .paginated_finder(paginated.clone())
        .build()
        .unwrap();

    let err = selector.select_new_wallpaper().await.unwrap_err();

    assert!(matches!(err, SelectorError::Finder(FinderError::Other(_))));
    assert_eq!(paginated.calls(), 0);
    assert!(saved_files(&dir).is_empty());
}

#[tokio::test]
async fn test_paginated_failure_midway_aborts_cycle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(IMAGE_BYTES))
        .expect(0)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let paginated = ScriptedFinder::endless(server.uri()).failing_on_call(1);

    let selector = WallpaperSelector::builder(config(&dir, 10))
        .paginated_finder(paginated.clone())
        .build()
        .unwrap();

    let err = selector.select_new_wallpaper().await.unwrap_err();

    assert!(matches!(
        err,
        SelectorError::Finder(FinderError::Status { status: 503, .. })
    ));
    assert_eq!(paginated.cursors(), vec![None, Some("p0_1".to_string())]);
    assert!(saved_files(&dir).is_empty());
}

#[tokio::test]
async fn test_download_failure_leaves_no_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/img/.+"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    let selector = WallpaperSelector::builder(config(&dir, 1))
        .add_finder(StaticFinder::new("fixed", candidates(&server, &["a"])))
        .build()
        .unwrap();

    let err = selector.select_new_wallpaper().await.unwrap_err();

    assert!(matches!(err, SelectorError::Download { .. }));
    assert!(saved_files(&dir).is_empty());
}

#[tokio::test]
async fn test_empty_body_is_download_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/img/.+"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    let selector = WallpaperSelector::builder(config(&dir, 1))
        .add_finder(StaticFinder::new("fixed", candidates(&server, &["a"])))
        .build()
        .unwrap();

    let err = selector.select_new_wallpaper().await.unwrap_err();

    assert!(matches!(err, SelectorError::Download { .. }));
    assert!(saved_files(&dir).is_empty());
}

#[tokio::test]
async fn test_save_directory_is_created() {
    let server = image_server().await;
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("walls").join("reddit");

    let selector = WallpaperSelector::builder(SelectorConfig::new(&nested))
        .add_finder(StaticFinder::new("fixed", candidates(&server, &["a"])))
        .build()
        .unwrap();

    let path = selector.select_new_wallpaper().await.unwrap();
    assert_eq!(path, nested.join("wallpaper.a.jpg"));
    assert!(path.exists());
}

#[tokio::test]
async fn test_cache_records_seen_and_used() {
    let server = image_server().await;
    let dir = tempfile::tempdir().unwrap();
    let cache_dir = tempfile::tempdir().unwrap();
    let cache_path = cache_dir.path().join("cache.json");

    let selector = WallpaperSelector::builder(config(&dir, 1))
        .add_finder(StaticFinder::new("fixed", candidates(&server, &["a", "b", "c"])))
        .random_source(SequenceRandom::new([0.0]))
        .cache(JsonFileCache::new(&cache_path))
        .build()
        .unwrap();

    selector.select_new_wallpaper().await.unwrap();

    let unused: Vec<String> = JsonFileCache::new(&cache_path)
        .list_unused()
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(unused, vec!["b", "c"]);
}

#[tokio::test]
async fn test_concurrent_cycles_are_serialized() {
    let server = image_server().await;
    let dir = tempfile::tempdir().unwrap();
    let paginated = ScriptedFinder::new(vec![
        candidates(&server, &["a"]),
        candidates(&server, &["b"]),
    ])
    .with_delay(Duration::from_millis(25));

    let selector = WallpaperSelector::builder(config(&dir, 1))
        .paginated_finder(paginated.clone())
        .build()
        .unwrap();

    let (first, second) = tokio::join!(
        selector.select_new_wallpaper(),
        selector.select_new_wallpaper()
    );

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(paginated.calls(), 2);
    assert_eq!(paginated.max_active.load(Ordering::SeqCst), 1);
}
