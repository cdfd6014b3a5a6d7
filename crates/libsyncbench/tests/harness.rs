//! End-to-end harness tests against the simulated engine.
//!
//! All async tests run on tokio's paused clock, so simulated operation
//! latency advances virtual time deterministically and nothing here waits on
//! the wall clock. With a fixed latency L and window D, the bound check
//! before each operation admits floor(D / L) + 1 operations.

use std::time::Duration;

use libsyncbench::counters::CounterKey;
use libsyncbench::phase::{default_phases, Phase, SyncOp};
use libsyncbench::runner::{FailurePolicy, PhaseRunner};
use libsyncbench::sim::SimEngine;
use libsyncbench::{BenchError, BenchmarkConfig, BenchmarkDriver, DocStore, EngineError, SyncEngine};

fn config_with(duration: Duration, cooldown: Duration) -> BenchmarkConfig {
    let mut config = BenchmarkConfig::new("https://example.com/bench-user/", "token-1");
    config.phase_duration = duration;
    config.cooldown = cooldown;
    config
}

#[tokio::test(start_paused = true)]
async fn zero_duration_phase_executes_exactly_once() {
    let config = config_with(Duration::ZERO, Duration::ZERO);
    let engine = SimEngine::new(&config).with_latency(Duration::from_millis(1));

    let store = engine.create().await.unwrap();
    let session = store.start_sync(&config.sync_options()).await.unwrap();
    let runner = PhaseRunner::new(&store, &session, FailurePolicy::Abort);

    let result = runner.run(&Phase::fetch(Duration::ZERO)).await.unwrap();

    // The bound check precedes the first operation, so one operation runs
    // even though the window is empty.
    assert_eq!(result.delta, 1);
    assert_eq!(result.elapsed, Duration::from_millis(1));
}

#[tokio::test(start_paused = true)]
async fn elapsed_overshoot_is_bounded_by_one_operation() {
    let duration = Duration::from_millis(100);
    let latency = Duration::from_millis(7);
    let config = config_with(duration, Duration::ZERO);
    let engine = SimEngine::new(&config).with_latency(latency);

    let store = engine.create().await.unwrap();
    let session = store.start_sync(&config.sync_options()).await.unwrap();
    let runner = PhaseRunner::new(&store, &session, FailurePolicy::Abort);

    let result = runner.run(&Phase::fetch(duration)).await.unwrap();

    assert!(result.elapsed >= duration);
    assert!(result.elapsed <= duration + latency);
    // floor(100 / 7) + 1 operations fit the window.
    assert_eq!(result.delta, 15);
}

#[tokio::test(start_paused = true)]
async fn phases_attribute_deltas_to_their_own_counter() {
    let config = config_with(Duration::from_millis(100), Duration::from_millis(20));
    let engine = SimEngine::new(&config).with_latency(Duration::from_millis(10));

    let phases = vec![
        Phase::fetch(config.phase_duration),
        Phase::put_and_push(config.phase_duration),
        Phase {
            name: "put volume".to_string(),
            duration: config.phase_duration,
            op: SyncOp::PutAndSync,
            counter: CounterKey::Put,
        },
    ];

    let driver = BenchmarkDriver::new(config, engine);
    let results = driver.run_all(&phases).await.unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].name, "fetch");
    assert_eq!(results[1].name, "put and push");
    assert_eq!(results[2].name, "put volume");

    // fetch: one 10ms sync per iteration, 11 iterations.
    assert_eq!(results[0].delta, 11);
    // put and push: 20ms per iteration (put + push), 6 iterations, measured
    // by the push counter only.
    assert_eq!(results[1].delta, 6);
    // put volume: also 6 iterations, measured by the put counter only even
    // though it bumps sync as well.
    assert_eq!(results[2].delta, 6);
}

#[tokio::test(start_paused = true)]
async fn per_phase_deltas_are_additive_across_the_session() {
    let config = config_with(Duration::from_millis(50), Duration::from_millis(30));
    let engine = SimEngine::new(&config).with_latency(Duration::from_millis(10));
    let inspect = engine.clone();
    let start = inspect.statistics();

    let phases = vec![
        Phase::fetch(config.phase_duration),
        Phase::put_and_sync(config.phase_duration),
    ];

    let driver = BenchmarkDriver::new(config, engine);
    let results = driver.run_all(&phases).await.unwrap();

    // Exact equality holds because the simulated engine schedules no
    // background work; with a real engine the sum is only accurate up to
    // the cross-phase leakage the cool-down bounds.
    let sync_total: i64 = results.iter().map(|r| r.delta).sum();
    let end = inspect.statistics();
    assert_eq!(sync_total, (end.sync - start.sync) as i64);
    assert_eq!(results[0].delta, 6);
    assert_eq!(results[1].delta, 3);
}

#[tokio::test(start_paused = true)]
async fn cooldown_separates_consecutive_phases() {
    let config = config_with(Duration::from_millis(100), Duration::from_millis(20));
    let engine = SimEngine::new(&config).with_latency(Duration::from_millis(10));

    let phases = vec![
        Phase::fetch(config.phase_duration),
        Phase::fetch(config.phase_duration),
    ];

    let driver = BenchmarkDriver::new(config, engine);
    let start = tokio::time::Instant::now();
    driver.run_all(&phases).await.unwrap();

    // Two 110ms windows plus one 20ms cool-down between them; no cool-down
    // before the first phase or after the last.
    assert_eq!(start.elapsed(), Duration::from_millis(240));
}

#[tokio::test(start_paused = true)]
async fn missing_remote_repository_does_not_fail_the_run() {
    let config = config_with(Duration::from_millis(20), Duration::ZERO);
    let engine = SimEngine::new(&config)
        .with_latency(Duration::from_millis(5))
        .missing_remote();

    let inspect = engine.clone();
    let driver = BenchmarkDriver::new(config.clone(), engine);
    let results = driver
        .run_all(&default_phases(config.phase_duration))
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(inspect.remote_destroy_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn operation_failure_aborts_the_run_and_still_tears_down() {
    let config = config_with(Duration::from_millis(100), Duration::ZERO);
    let engine = SimEngine::new(&config)
        .with_latency(Duration::from_millis(10))
        .fail_sync_after(3);
    let inspect = engine.clone();

    let phases = vec![
        Phase::fetch(config.phase_duration),
        Phase::put_and_push(config.phase_duration),
    ];

    let driver = BenchmarkDriver::new(config, engine);
    let err = driver.run_all(&phases).await.unwrap_err();

    match err {
        BenchError::Phase { phase, source } => {
            assert_eq!(phase, "fetch");
            assert!(matches!(source, EngineError::Network(_)));
        }
        other => panic!("expected phase abort, got {other}"),
    }

    // The three successful cycles ran, nothing after the failure, and the
    // second phase never pushed.
    assert_eq!(inspect.statistics().sync, 3);
    assert_eq!(inspect.statistics().push, 0);
    // Teardown still happened.
    assert!(inspect.local_destroyed());
}

#[tokio::test(start_paused = true)]
async fn continue_policy_finishes_the_window_and_counts_failures() {
    let mut config = config_with(Duration::from_millis(100), Duration::ZERO);
    config.failure_policy = FailurePolicy::Continue;
    let engine = SimEngine::new(&config)
        .with_latency(Duration::from_millis(10))
        .fail_sync_after(3);

    let driver = BenchmarkDriver::new(config.clone(), engine);
    let results = driver
        .run_all(&[Phase::fetch(config.phase_duration)])
        .await
        .unwrap();

    // 11 iterations fit the window; 3 succeed before the budget runs out.
    assert_eq!(results[0].delta, 3);
    assert_eq!(results[0].failures, 8);
}

#[tokio::test(start_paused = true)]
async fn session_start_failure_still_destroys_the_store() {
    let mut config = config_with(Duration::from_millis(20), Duration::ZERO);
    config.credential = String::new();
    let engine = SimEngine::new(&config);
    let inspect = engine.clone();

    let driver = BenchmarkDriver::new(config.clone(), engine);
    let err = driver
        .run_all(&default_phases(config.phase_duration))
        .await
        .unwrap_err();

    assert!(matches!(err, BenchError::Engine(EngineError::Auth(_))));
    assert!(inspect.local_destroyed());
}

#[tokio::test(start_paused = true)]
async fn teardown_failure_does_not_mask_a_successful_run() {
    let config = config_with(Duration::from_millis(20), Duration::ZERO);
    let engine = SimEngine::new(&config)
        .with_latency(Duration::from_millis(5))
        .failing_local_destroy();

    let driver = BenchmarkDriver::new(config.clone(), engine);
    let results = driver
        .run_all(&[Phase::fetch(config.phase_duration)])
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].delta > 0);
}

#[tokio::test(start_paused = true)]
async fn session_is_bound_to_the_normalized_remote_url() {
    let config = config_with(Duration::from_millis(10), Duration::ZERO);
    let engine = SimEngine::new(&config).with_latency(Duration::from_millis(5));

    let store = engine.create().await.unwrap();
    let _session = store.start_sync(&config.sync_options()).await.unwrap();

    let options = engine.last_sync_options().unwrap();
    assert_eq!(options.remote_url, "https://example.com/bench-user/bench");
    assert!(!options.live);
}
