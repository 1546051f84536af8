//! End-to-end tests of the harvest engine with scripted DNS and in-memory storage.

#[path = "helpers.rs"]
mod helpers;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use helpers::*;
use txt_harvest::{HarvestError, HarvestSettings, InputError, RetryPolicy};

#[tokio::test]
async fn test_mixed_batch_outcomes() {
    let resolver = Arc::new(
        ScriptedResolver::new()
            .script("good.example", vec![txt(&["v=spf1 include:_spf.example -all"])])
            .script("nx.example", vec![nxdomain("nx.example")])
            .script(
                "flaky.example",
                vec![
                    timeout("flaky.example"),
                    timeout("flaky.example"),
                    txt(&["google-site-verification=abc"]),
                ],
            ),
    );
    let sink = Arc::new(MemorySink::new());
    let harvester = harvester(&resolver, sink.clone(), fast_settings(2, 4));

    let (progress, handle) = harvester
        .start_batch("b1", ["good.example", "nx.example", "flaky.example"])
        .expect("batch should start");
    let values: Vec<u8> = progress.collect().await;
    let report = handle.wait().await.expect("batch should succeed");

    assert_eq!(values, vec![33, 66, 100]);
    assert_eq!(report.total, 3);
    assert_eq!(report.completed, 3);
    assert_eq!(report.stored, 2);
    assert_eq!(report.permanent_failures, 1);
    assert_eq!(report.transient_failures, 0);
    assert!(!report.cancelled);

    assert_eq!(resolver.calls("good.example"), 1);
    assert_eq!(resolver.calls("nx.example"), 1, "NXDOMAIN is never retried");
    assert_eq!(resolver.calls("flaky.example"), 3);

    let mut stored: Vec<_> = sink.records().into_iter().map(|r| r.domain).collect();
    stored.sort();
    assert_eq!(stored, vec!["flaky.example", "good.example"]);
    assert!(sink.records().iter().all(|r| r.batch_id == "b1"));
}

#[tokio::test]
async fn test_transient_failures_exhaust_attempts() {
    let resolver =
        Arc::new(ScriptedResolver::new().script("down.example", vec![timeout("down.example")]));
    let sink = Arc::new(MemorySink::new());
    let harvester = harvester(&resolver, sink.clone(), fast_settings(4, 4));

    let (progress, handle) = harvester
        .start_batch("b", ["down.example"])
        .expect("batch should start");
    let values: Vec<u8> = progress.collect().await;
    let report = handle.wait().await.expect("batch should succeed");

    assert_eq!(resolver.calls("down.example"), 4);
    assert_eq!(report.transient_failures, 1);
    assert_eq!(report.completed, 1);
    assert_eq!(values, vec![100]);
    assert!(sink.records().is_empty());
}

#[tokio::test]
async fn test_permanent_failure_after_transient_stops_retrying() {
    let resolver = Arc::new(ScriptedResolver::new().script(
        "gone.example",
        vec![timeout("gone.example"), nxdomain("gone.example"), txt(&["x"])],
    ));
    let harvester = harvester(&resolver, Arc::new(MemorySink::new()), fast_settings(1, 4));

    let (_progress, handle) = harvester
        .start_batch("b", ["gone.example"])
        .expect("batch should start");
    let report = handle.wait().await.expect("batch should succeed");

    assert_eq!(resolver.calls("gone.example"), 2);
    assert_eq!(report.permanent_failures, 1);
    assert_eq!(report.stored, 0);
}

#[tokio::test]
async fn test_empty_answers_are_not_stored() {
    let resolver = Arc::new(
        ScriptedResolver::new()
            .script("none.example", vec![txt(&[])])
            .script("blank.example", vec![txt(&[""])])
            .script("mixed.example", vec![txt(&["", "v=DMARC1; p=none"])]),
    );
    let sink = Arc::new(MemorySink::new());
    let harvester = harvester(&resolver, sink.clone(), fast_settings(3, 4));

    let (_progress, handle) = harvester
        .start_batch("b", ["none.example", "blank.example", "mixed.example"])
        .expect("batch should start");
    let report = handle.wait().await.expect("batch should succeed");

    assert_eq!(report.empty_results, 2);
    assert_eq!(report.stored, 1);
    assert_eq!(resolver.calls("none.example"), 1, "empty answers are not retried");
    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].txt_records, vec!["v=DMARC1; p=none"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_is_bounded_and_progress_is_monotonic() {
    let mut resolver = ScriptedResolver::new().with_delay(Duration::from_millis(10));
    let domains: Vec<String> = (0..60).map(|i| format!("d{i}.example")).collect();
    for domain in &domains {
        resolver = resolver.script(domain, vec![txt(&["v=spf1 -all"])]);
    }
    let resolver = Arc::new(resolver);
    let sink = Arc::new(MemorySink::new());
    let harvester = harvester(&resolver, sink.clone(), fast_settings(5, 4));

    let (progress, handle) = harvester
        .start_batch("bulk", &domains)
        .expect("batch should start");
    let values: Vec<u8> = progress.collect().await;
    let report = handle.wait().await.expect("batch should succeed");

    assert!(resolver.peak_concurrency() <= 5);
    assert!(resolver.peak_concurrency() >= 2);
    assert_eq!(resolver.total_calls(), 60, "each domain resolved exactly once");
    assert!(values.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(values.last(), Some(&100));
    assert_eq!(report.stored, 60);
    assert_eq!(sink.records().len(), 60);
}

#[tokio::test]
async fn test_large_batch_progress_starts_at_one() {
    let domains: Vec<String> = (0..250).map(|i| format!("n{i}.example")).collect();
    let resolver = Arc::new(ScriptedResolver::new());
    let sink = Arc::new(MemorySink::new());
    let harvester = harvester(&resolver, sink.clone(), fast_settings(8, 1));

    let (progress, handle) = harvester
        .start_batch("large", &domains)
        .expect("batch should start");
    let values: Vec<u8> = progress.collect().await;
    let report = handle.wait().await.expect("batch should succeed");

    assert_eq!(values.first(), Some(&1));
    assert_eq!(values, (1..=100).collect::<Vec<u8>>());
    assert_eq!(report.completed, 250);
    assert_eq!(report.permanent_failures, 250);
}

#[tokio::test]
async fn test_empty_input_is_rejected() {
    let resolver = Arc::new(ScriptedResolver::new());
    let harvester = harvester(&resolver, Arc::new(MemorySink::new()), fast_settings(2, 4));

    let empty: [&str; 0] = [];
    assert!(matches!(
        harvester.start_batch("b", empty),
        Err(InputError::Empty)
    ));
    assert!(matches!(
        harvester.start_batch("b", ["", "   "]),
        Err(InputError::Empty)
    ));
    assert_eq!(resolver.total_calls(), 0);
}

#[tokio::test]
async fn test_blank_entries_do_not_count_towards_total() {
    let resolver = Arc::new(ScriptedResolver::new().script("a.example", vec![txt(&["a"])]));
    let harvester = harvester(&resolver, Arc::new(MemorySink::new()), fast_settings(2, 4));

    let (progress, handle) = harvester
        .start_batch("b", ["", " a.example ", "  "])
        .expect("batch should start");
    assert_eq!(handle.progress().total, 1);
    let values: Vec<u8> = progress.collect().await;
    assert_eq!(values, vec![100]);
    assert_eq!(resolver.calls("a.example"), 1, "domains are trimmed");
    handle.wait().await.expect("batch should succeed");
}

#[tokio::test]
async fn test_storage_breaker_aborts_batch() {
    let mut resolver = ScriptedResolver::new();
    let domains: Vec<String> = (0..20).map(|i| format!("d{i}.example")).collect();
    for domain in &domains {
        resolver = resolver.script(domain, vec![txt(&["v=spf1 -all"])]);
    }
    let resolver = Arc::new(resolver);
    let sink = Arc::new(FailingSink::default());
    let settings = HarvestSettings {
        storage_failure_threshold: 3,
        ..fast_settings(1, 4)
    };
    let harvester = harvester(&resolver, sink.clone(), settings);

    let (progress, handle) = harvester
        .start_batch("b", &domains)
        .expect("batch should start");
    let values: Vec<u8> = progress.collect().await;
    let result = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("batch must stop after the breaker opens");

    match result {
        Err(HarvestError::StorageUnavailable {
            consecutive_failures,
            last_error,
            report,
        }) => {
            assert_eq!(consecutive_failures, 3);
            assert!(last_error.contains("disk full"));
            assert!(report.completed < 20);
            assert!(report.storage_failures >= 3);
            assert_eq!(report.stored, 0);
        }
        other => panic!("expected StorageUnavailable, got {other:?}"),
    }
    assert!(sink.insert_calls.load(Ordering::SeqCst) < 20);
    assert_ne!(values.last(), Some(&100));
}

#[tokio::test]
async fn test_isolated_storage_failures_do_not_abort() {
    let mut resolver = ScriptedResolver::new();
    let domains: Vec<String> = (0..6).map(|i| format!("d{i}.example")).collect();
    for domain in &domains {
        resolver = resolver.script(domain, vec![txt(&["x"])]);
    }
    let resolver = Arc::new(resolver);
    let sink = Arc::new(MemorySink::new());
    sink.fail_next(2);
    let settings = HarvestSettings {
        storage_failure_threshold: 3,
        ..fast_settings(1, 4)
    };
    let harvester = harvester(&resolver, sink.clone(), settings);

    let (_progress, handle) = harvester
        .start_batch("b", &domains)
        .expect("batch should start");
    let report = handle.wait().await.expect("two failures stay under the threshold");

    assert_eq!(report.storage_failures, 2);
    assert_eq!(report.stored, 4);
    assert_eq!(report.completed, 6);
}

#[tokio::test]
async fn test_cancel_stops_batch_promptly() {
    let mut resolver = ScriptedResolver::new().with_delay(Duration::from_secs(30));
    let domains: Vec<String> = (0..10).map(|i| format!("d{i}.example")).collect();
    for domain in &domains {
        resolver = resolver.script(domain, vec![txt(&["x"])]);
    }
    let resolver = Arc::new(resolver);
    let harvester = harvester(&resolver, Arc::new(MemorySink::new()), fast_settings(2, 4));

    let (progress, handle) = harvester
        .start_batch("b", &domains)
        .expect("batch should start");
    let token = handle.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let values: Vec<u8> = progress.collect().await;
    let report = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("wait must return promptly after cancellation")
        .expect("cancellation is not an error");

    assert!(report.cancelled);
    assert_eq!(report.completed, 0);
    assert!(values.is_empty());
    assert!(resolver.total_calls() <= 2, "no lookups beyond the first slots");
}

#[tokio::test]
async fn test_dropping_progress_stream_cancels_batch() {
    let resolver = Arc::new(
        ScriptedResolver::new()
            .with_delay(Duration::from_secs(30))
            .script("slow.example", vec![txt(&["x"])]),
    );
    let harvester = harvester(&resolver, Arc::new(MemorySink::new()), fast_settings(1, 4));

    let (progress, handle) = harvester
        .start_batch("b", ["slow.example"])
        .expect("batch should start");
    drop(progress);

    let report = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("dropping the stream cancels the batch")
        .expect("cancellation is not an error");
    assert!(report.cancelled);
}

#[tokio::test]
async fn test_detached_stream_keeps_batch_running() {
    let resolver = Arc::new(ScriptedResolver::new().script("a.example", vec![txt(&["a"])]));
    let harvester = harvester(&resolver, Arc::new(MemorySink::new()), fast_settings(1, 4));

    let (mut progress, handle) = harvester
        .start_batch("b", ["a.example"])
        .expect("batch should start");
    progress.detach();
    drop(progress);

    let report = handle.wait().await.expect("batch should succeed");
    assert!(!report.cancelled);
    assert_eq!(report.stored, 1);
}

#[tokio::test]
async fn test_shutdown_token_cancels_running_batches() {
    let resolver = Arc::new(
        ScriptedResolver::new()
            .with_delay(Duration::from_secs(30))
            .script("slow.example", vec![txt(&["x"])]),
    );
    let harvester = harvester(&resolver, Arc::new(MemorySink::new()), fast_settings(1, 4));

    let (_progress, handle) = harvester
        .start_batch("b", ["slow.example"])
        .expect("batch should start");
    harvester.shutdown_token().cancel();

    let report = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("shutdown cancels the batch")
        .expect("cancellation is not an error");
    assert!(report.cancelled);
}

#[tokio::test]
async fn test_panicking_lookup_still_completes_batch() {
    let resolver = Arc::new(
        ScriptedResolver::new()
            .script("ok.example", vec![txt(&["ok"])])
            .panics_on("boom.example"),
    );
    let sink = Arc::new(MemorySink::new());
    let harvester = harvester(&resolver, sink.clone(), fast_settings(2, 4));

    let (progress, handle) = harvester
        .start_batch("b", ["boom.example", "ok.example"])
        .expect("batch should start");
    let values: Vec<u8> = progress.collect().await;
    let report = handle.wait().await.expect("a panic is not a batch failure");

    assert_eq!(values.last(), Some(&100));
    assert_eq!(report.completed, 2);
    assert_eq!(report.panicked, 1);
    assert_eq!(report.stored, 1);
}

#[tokio::test]
async fn test_single_attempt_policy_disables_retries() {
    let resolver = Arc::new(ScriptedResolver::new().script(
        "flaky.example",
        vec![timeout("flaky.example"), txt(&["x"])],
    ));
    let settings = HarvestSettings {
        policy: RetryPolicy::new(1, Duration::from_millis(5)),
        ..fast_settings(1, 1)
    };
    let harvester = harvester(&resolver, Arc::new(MemorySink::new()), settings);

    let (_progress, handle) = harvester
        .start_batch("b", ["flaky.example"])
        .expect("batch should start");
    let report = handle.wait().await.expect("batch should succeed");

    assert_eq!(resolver.calls("flaky.example"), 1);
    assert_eq!(report.transient_failures, 1);
}

#[tokio::test]
async fn test_batches_run_independently() {
    let resolver = Arc::new(
        ScriptedResolver::new()
            .script("a.example", vec![txt(&["a"])])
            .script("b.example", vec![txt(&["b"])]),
    );
    let sink = Arc::new(MemorySink::new());
    let harvester = harvester(&resolver, sink.clone(), fast_settings(2, 4));

    let (_p1, first) = harvester.start_batch("one", ["a.example"]).expect("start one");
    let (_p2, second) = harvester.start_batch("two", ["b.example"]).expect("start two");
    first.cancel();
    let _ = first.wait().await;
    let report = second.wait().await.expect("second batch is unaffected");

    assert!(!report.cancelled);
    assert_eq!(report.stored, 1);
    assert!(sink.records().iter().any(|r| r.batch_id == "two"));
}
