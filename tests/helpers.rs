// Shared fakes for the harvest engine and server tests.
//
// - `ScriptedResolver` answers each domain from a per-domain script and counts calls
// - `MemorySink` keeps records in memory and can be told to fail a number of inserts
// - `FailingSink` rejects every insert

#![allow(dead_code)] // Not every test file uses every helper

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use txt_harvest::{
    HarvestSettings, Harvester, LookupError, ResolvedRecord, RetryPolicy, StorageError,
    StorageSink, TxtResolver,
};

pub type Step = Result<Vec<String>, LookupError>;

pub fn txt(values: &[&str]) -> Step {
    Ok(values.iter().map(|v| v.to_string()).collect())
}

pub fn nxdomain(domain: &str) -> Step {
    Err(LookupError::NoSuchHost(domain.to_string()))
}

pub fn timeout(domain: &str) -> Step {
    Err(LookupError::Timeout(domain.to_string()))
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Resolver that replays a script per domain.
///
/// Each call consumes the next step; the last step repeats forever. Unknown
/// domains get NXDOMAIN.
#[derive(Default)]
pub struct ScriptedResolver {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    panics: HashSet<String>,
    calls: Mutex<HashMap<String, u32>>,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn script(self, domain: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(domain.to_string(), steps.into());
        self
    }

    pub fn panics_on(mut self, domain: &str) -> Self {
        self.panics.insert(domain.to_string());
        self
    }

    pub fn calls(&self, domain: &str) -> u32 {
        self.calls.lock().unwrap().get(domain).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TxtResolver for ScriptedResolver {
    async fn lookup_txt(&self, domain: &str) -> Result<Vec<String>, LookupError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _in_flight = InFlight(&self.in_flight);
        self.peak.fetch_max(now, Ordering::SeqCst);
        *self
            .calls
            .lock()
            .unwrap()
            .entry(domain.to_string())
            .or_insert(0) += 1;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.panics.contains(domain) {
            panic!("scripted panic for {domain}");
        }

        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(domain) {
            Some(steps) if steps.len() > 1 => steps.pop_front().unwrap(),
            Some(steps) => steps.front().cloned().unwrap_or_else(|| Ok(Vec::new())),
            None => nxdomain(domain),
        }
    }
}

/// In-memory sink with an optional run of failing inserts.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<ResolvedRecord>>,
    fail_next: AtomicUsize,
    insert_calls: AtomicUsize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` inserts fail.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<ResolvedRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageSink for MemorySink {
    async fn insert(&self, record: &ResolvedRecord) -> Result<(), StorageError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StorageError::Unavailable("scripted failure".to_string()));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn find_by_keyword(&self, keyword: &str) -> Result<Vec<ResolvedRecord>, StorageError> {
        let keyword = keyword.to_lowercase();
        Ok(self
            .records()
            .into_iter()
            .filter(|r| {
                r.txt_records
                    .iter()
                    .any(|v| v.to_lowercase().contains(&keyword))
            })
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<ResolvedRecord>, StorageError> {
        Ok(self.records())
    }
}

/// Sink whose inserts always fail.
#[derive(Default)]
pub struct FailingSink {
    pub insert_calls: AtomicUsize,
}

#[async_trait]
impl StorageSink for FailingSink {
    async fn insert(&self, _record: &ResolvedRecord) -> Result<(), StorageError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Unavailable("disk full".to_string()))
    }

    async fn find_by_keyword(&self, _keyword: &str) -> Result<Vec<ResolvedRecord>, StorageError> {
        Ok(Vec::new())
    }

    async fn list_all(&self) -> Result<Vec<ResolvedRecord>, StorageError> {
        Ok(Vec::new())
    }
}

/// Settings with a short retry delay so tests stay fast.
pub fn fast_settings(capacity: usize, max_attempts: u32) -> HarvestSettings {
    HarvestSettings {
        capacity,
        policy: RetryPolicy::new(max_attempts, Duration::from_millis(5)),
        ..Default::default()
    }
}

pub fn harvester(
    resolver: &Arc<ScriptedResolver>,
    sink: Arc<dyn StorageSink>,
    settings: HarvestSettings,
) -> Harvester {
    Harvester::new(
        Arc::clone(resolver) as Arc<dyn TxtResolver>,
        sink,
        settings,
    )
}
