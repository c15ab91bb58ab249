//! DeviceMatchingService tests
//!
//! Tests for the find-or-create-then-increment protocol and the validation
//! boundary of the service layer.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use devicematcher::domain::{DeviceProfile, UserAgent, UserAgentIdGenerator};
use devicematcher::errors::{DeviceMatcherError, Result};
use devicematcher::parser::{RegexParser, UserAgentParser, WootheeParser};
use devicematcher::services::DeviceMatchingService;
use devicematcher::storage::{DeviceProfileRepository, MemoryRepository};

const CHROME_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const FIREFOX_LINUX: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0";

// =============================================================================
// Test Setup
// =============================================================================

/// Counting wrapper around the memory repository
struct CountingRepository {
    inner: MemoryRepository,
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl CountingRepository {
    fn new() -> Self {
        Self {
            inner: MemoryRepository::new(10),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeviceMatcherError::storage("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceProfileRepository for CountingRepository {
    async fn find_by_id(&self, device_id: &str) -> Result<Option<DeviceProfile>> {
        self.enter()?;
        self.inner.find_by_id(device_id).await
    }

    async fn find_by_user_agent(&self, user_agent: &UserAgent) -> Result<Vec<DeviceProfile>> {
        self.enter()?;
        self.inner.find_by_user_agent(user_agent).await
    }

    async fn find_by_os_name(&self, os_name: &str) -> Result<Vec<DeviceProfile>> {
        self.enter()?;
        self.inner.find_by_os_name(os_name).await
    }

    async fn persist(&self, profile: &DeviceProfile) -> Result<()> {
        self.enter()?;
        self.inner.persist(profile).await
    }

    async fn delete_by_id(&self, device_id: &str) -> Result<()> {
        self.enter()?;
        self.inner.delete_by_id(device_id).await
    }

    async fn increment_hit_count(&self, device_id: &str) -> Result<u64> {
        self.enter()?;
        self.inner.increment_hit_count(device_id).await
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }

    async fn ping(&self) -> Result<()> {
        self.enter()
    }
}

fn service_with(
    parser: Arc<dyn UserAgentParser>,
) -> (Arc<DeviceMatchingService>, Arc<CountingRepository>) {
    let repository = Arc::new(CountingRepository::new());
    let service = Arc::new(DeviceMatchingService::new(
        parser,
        repository.clone(),
        Arc::new(UserAgentIdGenerator),
    ));
    (service, repository)
}

fn woothee_service() -> (Arc<DeviceMatchingService>, Arc<CountingRepository>) {
    service_with(Arc::new(WootheeParser::new()))
}

// =============================================================================
// match_device
// =============================================================================

#[tokio::test]
async fn test_new_device_is_created_with_one_hit() {
    let (service, _) = woothee_service();

    let profile = service.match_device(Some(CHROME_WINDOWS)).await.unwrap();

    assert_eq!(profile.hit_count(), 1);
    assert!(!profile.device_id().trim().is_empty());
    assert!(
        profile.device_id().starts_with("windows10-"),
        "unexpected id {}",
        profile.device_id()
    );
    assert_eq!(profile.user_agent().os_name(), "windows 10");
    assert_eq!(profile.user_agent().browser_name(), "chrome");
}

#[tokio::test]
async fn test_match_is_idempotent_per_fingerprint() {
    let (service, _) = woothee_service();

    let first = service.match_device(Some(CHROME_WINDOWS)).await.unwrap();
    let second = service.match_device(Some(CHROME_WINDOWS)).await.unwrap();

    assert_eq!(first.device_id(), second.device_id());
    assert_eq!(first.hit_count(), 1);
    assert_eq!(second.hit_count(), 2);
}

#[tokio::test]
async fn test_distinct_fingerprints_get_distinct_devices() {
    let (service, _) = woothee_service();

    let chrome = service.match_device(Some(CHROME_WINDOWS)).await.unwrap();
    let firefox = service.match_device(Some(FIREFOX_LINUX)).await.unwrap();

    assert_ne!(chrome.device_id(), firefox.device_id());
    assert_eq!(firefox.hit_count(), 1);
}

#[tokio::test]
async fn test_blank_user_agent_is_rejected_without_storage_calls() {
    let (service, repository) = woothee_service();

    for input in [None, Some(""), Some("   ")] {
        let err = service.match_device(input).await.unwrap_err();
        assert!(matches!(err, DeviceMatcherError::Validation(_)));
    }
    assert_eq!(repository.calls(), 0);
}

#[tokio::test]
async fn test_parse_failure_is_wrapped_and_skips_storage() {
    let (service, repository) = service_with(Arc::new(RegexParser::new()));

    let err = service.match_device(Some("curl/8.4.0")).await.unwrap_err();

    assert!(matches!(err, DeviceMatcherError::DeviceMatch { .. }));
    assert_eq!(err.http_status().as_u16(), 400);
    match err.root_cause() {
        DeviceMatcherError::Parsing { input, .. } => assert_eq!(input, "curl/8.4.0"),
        other => panic!("expected parsing root cause, got {:?}", other),
    }
    assert_eq!(repository.calls(), 0);
}

#[tokio::test]
async fn test_storage_failure_is_wrapped() {
    let (service, repository) = woothee_service();
    repository.fail.store(true, Ordering::SeqCst);

    let err = service.match_device(Some(CHROME_WINDOWS)).await.unwrap_err();

    assert!(matches!(err, DeviceMatcherError::DeviceMatch { .. }));
    assert!(matches!(err.root_cause(), DeviceMatcherError::Storage(_)));
    assert_eq!(err.http_status().as_u16(), 500);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_matches_of_known_device_count_every_hit() {
    let (service, repository) = woothee_service();

    let ua = WootheeParser::new().parse(CHROME_WINDOWS).unwrap();
    let known = DeviceProfile::new("windows10-known", 0, ua).unwrap();
    repository.persist(&known).await.unwrap();

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.match_device(Some(CHROME_WINDOWS)).await })
        })
        .collect();

    let mut counts = Vec::new();
    let mut ids = HashSet::new();
    for handle in handles {
        let profile = handle.await.unwrap().unwrap();
        ids.insert(profile.device_id().to_string());
        counts.push(profile.hit_count());
    }
    counts.sort_unstable();

    assert_eq!(counts, (1..=50).collect::<Vec<u64>>());
    assert_eq!(ids.len(), 1);
    assert!(ids.contains("windows10-known"));
}

// =============================================================================
// Lookup and delete
// =============================================================================

#[tokio::test]
async fn test_get_device_by_id() {
    let (service, repository) = woothee_service();
    let created = service.match_device(Some(FIREFOX_LINUX)).await.unwrap();

    let found = service
        .get_device_by_id(Some(created.device_id()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found, created);
    assert_eq!(found.hit_count(), 1);

    assert!(service.get_device_by_id(Some("missing")).await.unwrap().is_none());

    let before = repository.calls();
    let err = service.get_device_by_id(Some(" ")).await.unwrap_err();
    assert!(matches!(err, DeviceMatcherError::Validation(_)));
    assert_eq!(repository.calls(), before);
}

#[tokio::test]
async fn test_get_devices_by_os_lower_cases_input() {
    let (service, _) = woothee_service();
    let created = service.match_device(Some(CHROME_WINDOWS)).await.unwrap();

    let devices = service.get_devices_by_os(Some("Windows 10")).await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].device_id(), created.device_id());

    assert!(service.get_devices_by_os(Some("android")).await.unwrap().is_empty());
    assert!(matches!(
        service.get_devices_by_os(None).await.unwrap_err(),
        DeviceMatcherError::Validation(_)
    ));
}

#[tokio::test]
async fn test_delete_is_idempotent_and_next_match_recreates() {
    let (service, _) = woothee_service();
    let created = service.match_device(Some(CHROME_WINDOWS)).await.unwrap();

    service.delete_device_by_id(Some(created.device_id())).await.unwrap();
    service.delete_device_by_id(Some(created.device_id())).await.unwrap();
    assert!(
        service
            .get_device_by_id(Some(created.device_id()))
            .await
            .unwrap()
            .is_none()
    );

    let recreated = service.match_device(Some(CHROME_WINDOWS)).await.unwrap();
    assert_ne!(recreated.device_id(), created.device_id());
    assert_eq!(recreated.hit_count(), 1);
}

#[tokio::test]
async fn test_blank_ids_and_os_names_are_rejected_without_storage_calls() {
    let (service, repository) = woothee_service();

    for input in [None, Some(""), Some("  ")] {
        let err = service.get_device_by_id(input).await.unwrap_err();
        assert!(matches!(err, DeviceMatcherError::Validation(_)), "get {:?}", input);

        let err = service.delete_device_by_id(input).await.unwrap_err();
        assert!(matches!(err, DeviceMatcherError::Validation(_)), "delete {:?}", input);

        let err = service.get_devices_by_os(input).await.unwrap_err();
        assert!(matches!(err, DeviceMatcherError::Validation(_)), "os {:?}", input);
    }
    assert_eq!(repository.calls(), 0);
}

#[tokio::test]
async fn test_storage_failure_on_lookup_names_operation_and_input() {
    let (service, repository) = woothee_service();
    repository.fail.store(true, Ordering::SeqCst);

    let err = service.get_device_by_id(Some("abc")).await.unwrap_err();
    assert!(matches!(err, DeviceMatcherError::Storage(_)));
    assert_eq!(err.message(), "get_device_by_id(abc): connection refused");

    let err = service.delete_device_by_id(Some("abc")).await.unwrap_err();
    assert_eq!(err.message(), "delete_device_by_id(abc): connection refused");

    let err = service.get_devices_by_os(Some("Linux")).await.unwrap_err();
    assert_eq!(err.message(), "get_devices_by_os(linux): connection refused");
}
