//! End-to-end runs against a scripted storefront and feed.

use std::fs;
use std::thread;
use std::time::Duration;

use stocksync_core::testing::ScriptedTransport;
use stocksync_core::{
    CatalogConfig, FeedConfig, FeedDelimiter, FeedFailurePolicy, HttpRequest, HttpResponse,
    LocationId, LocationTarget, Method, ShopConfig, SyncAction,
    SyncConfig, TagMatch, Tally, Transport, TransportError, UpdateConfig, UpdateOutcome,
    UpdatePolicy,
};
use stocksync_sync::{plan, run, run_log, CancelToken, RunOptions, SyncError};
use tempfile::TempDir;

const ADMIN: &str = "https://adopt1toy.myshopify.com/admin/api/2024-07";
const FEED: &str = "https://feed.example/stock.csv";

fn config() -> SyncConfig {
    SyncConfig {
        shop: ShopConfig {
            base_url: "https://adopt1toy.myshopify.com".to_string(),
            access_token: "shpat_test".to_string(),
            api_version: "2024-07".to_string(),
        },
        feed: FeedConfig {
            url: FEED.to_string(),
            timeout: Duration::from_secs(5),
            delimiter: FeedDelimiter::Auto,
            on_failure: FeedFailurePolicy::Strict,
        },
        catalog: CatalogConfig {
            tag: "Manuel".to_string(),
            tag_match: TagMatch::Server,
        },
        location: LocationTarget::Name("adopt1toy".to_string()),
        update: UpdateConfig {
            policy: UpdatePolicy::OnMismatch,
            connect_first: true,
            delay: Duration::ZERO,
        },
        run_log_path: None,
        sync_interval: Duration::from_secs(60),
    }
}

fn products_url() -> String {
    format!("{ADMIN}/products.json?limit=250&tag=Manuel")
}

/// Feed, catalog and locations for the ABC123 / NOPE scenario.
fn storefront(variants: &str) -> ScriptedTransport {
    let t = ScriptedTransport::new();
    t.on(
        Method::Get,
        FEED,
        HttpResponse::new(200, "sku;stock\nABC123;5\nXYZ999;0\nBAD;lots\n"),
    )
    .on(
        Method::Get,
        products_url(),
        HttpResponse::new(
            200,
            format!(r#"{{"products": [{{"id": 1, "tags": "Manuel", "variants": [{variants}]}}]}}"#),
        ),
    )
    .on(
        Method::Get,
        format!("{ADMIN}/locations.json"),
        HttpResponse::new(
            200,
            r#"{"locations": [{"id": 1, "name": "Warehouse"}, {"id": 2, "name": "Adopt1Toy"}]}"#,
        ),
    )
    .on(
        Method::Post,
        format!("{ADMIN}/inventory_levels/connect.json"),
        HttpResponse::new(201, "{}"),
    );
    t
}

const ABC_AND_NOPE: &str = r#"
    {"id": 10, "sku": "ABC123", "inventory_item_id": 111, "inventory_quantity": 9},
    {"id": 11, "sku": "NOPE", "inventory_item_id": 222, "inventory_quantity": 3}
"#;

fn set_ok(t: &ScriptedTransport) {
    t.on(
        Method::Post,
        format!("{ADMIN}/inventory_levels/set.json"),
        HttpResponse::new(200, "{}"),
    );
}

#[test]
fn updates_matching_sku_and_skips_the_rest() {
    let t = storefront(ABC_AND_NOPE);
    set_ok(&t);

    let report = run(&config(), &t, &RunOptions::default()).expect("run");
    assert_eq!(
        report.summary.tally,
        Tally {
            updated: 1,
            skipped: 1,
            failed: 0,
            pending: 0
        }
    );
    assert_eq!(report.summary.feed_skus, 2);
    assert_eq!(report.summary.feed_rows_skipped, 1);
    assert_eq!(report.summary.variants, 2);
    assert!(!report.summary.cancelled);
    assert_eq!(report.location, LocationId(2));
    assert_eq!(report.decisions[0].action, SyncAction::Update);
    assert_eq!(report.decisions[1].action, SyncAction::SkipNoMatch);

    let sets = t.calls_to("set.json");
    assert_eq!(sets.len(), 1);
    assert_eq!(
        sets[0].json,
        Some(serde_json::json!({"location_id": 2, "inventory_item_id": 111, "available": 5}))
    );
    assert_eq!(report.attempts.len(), 1);
    assert_eq!(report.attempts[0].result, UpdateOutcome::Ok);
}

#[test]
fn failed_update_is_counted_and_run_continues() {
    let variants = r#"
        {"id": 10, "sku": "ABC123", "inventory_item_id": 111, "inventory_quantity": 9},
        {"id": 11, "sku": "XYZ999", "inventory_item_id": 333, "inventory_quantity": 4}
    "#;
    let t = storefront(variants);
    let set = format!("{ADMIN}/inventory_levels/set.json");
    t.on(Method::Post, &set, HttpResponse::new(422, r#"{"errors":"not stocked"}"#))
        .on(Method::Post, &set, HttpResponse::new(200, "{}"));

    let report = run(&config(), &t, &RunOptions::default()).expect("run");
    assert_eq!(report.summary.tally.updated, 1);
    assert_eq!(report.summary.tally.failed, 1);
    assert_eq!(t.calls_to("set.json").len(), 2);
    assert_eq!(report.attempts[0].result, UpdateOutcome::Error);
    assert!(report.attempts[0].message.contains("not stocked"));
    assert_eq!(report.attempts[1].sku.as_str(), "XYZ999");
}

#[test]
fn equal_quantity_is_skipped_unless_policy_is_always() {
    let variants = r#"{"id": 10, "sku": "ABC123", "inventory_item_id": 111, "inventory_quantity": 5}"#;
    let t = storefront(variants);
    set_ok(&t);

    let report = run(&config(), &t, &RunOptions::default()).expect("run");
    assert_eq!(report.summary.tally.updated, 0);
    assert_eq!(report.decisions[0].action, SyncAction::SkipUnchanged);
    assert!(t.calls_to("set.json").is_empty());

    let mut always = config();
    always.update.policy = UpdatePolicy::Always;
    let report = run(&always, &t, &RunOptions::default()).expect("run");
    assert_eq!(report.summary.tally.updated, 1);
}

#[test]
fn unknown_location_aborts_before_any_write() {
    let t = storefront(ABC_AND_NOPE);
    set_ok(&t);
    let mut cfg = config();
    cfg.location = LocationTarget::Name("Depot".to_string());

    let err = run(&cfg, &t, &RunOptions::default()).unwrap_err();
    assert!(matches!(err, SyncError::Location(_)), "got: {err}");
    assert!(t.calls().iter().all(|c| c.method == Method::Get));
}

#[test]
fn catalog_failure_is_fatal() {
    let t = ScriptedTransport::new();
    t.on(Method::Get, FEED, HttpResponse::new(200, "sku,stock\nA,1\n"))
        .on(Method::Get, products_url(), HttpResponse::new(500, "boom"));

    let err = plan(&config(), &t).unwrap_err();
    assert!(matches!(err, SyncError::Catalog(_)), "got: {err}");
}

#[test]
fn strict_feed_failure_aborts() {
    let t = ScriptedTransport::new();
    t.on(Method::Get, FEED, HttpResponse::new(503, "down"));

    let err = run(&config(), &t, &RunOptions::default()).unwrap_err();
    assert!(matches!(err, SyncError::Feed(_)), "got: {err}");
    assert!(err.to_string().contains("feed unavailable"));
    assert_eq!(t.calls().len(), 1, "nothing after the feed");
}

#[test]
fn tolerated_feed_failure_runs_with_empty_feed() {
    let t = ScriptedTransport::new();
    t.fail(Method::Get, FEED, "connection refused")
        .on(
            Method::Get,
            products_url(),
            HttpResponse::new(
                200,
                format!(r#"{{"products": [{{"id": 1, "tags": "Manuel", "variants": [{ABC_AND_NOPE}]}}]}}"#),
            ),
        )
        .on(
            Method::Get,
            format!("{ADMIN}/locations.json"),
            HttpResponse::new(200, r#"{"locations": [{"id": 2, "name": "adopt1toy"}]}"#),
        );
    let mut cfg = config();
    cfg.feed.on_failure = FeedFailurePolicy::Tolerate;

    let planned = plan(&cfg, &t).expect("plan");
    assert!(planned.feed_error.is_some());
    assert!(planned.feed.map.is_empty());
    assert_eq!(planned.updates().count(), 0);

    let report = run(&cfg, &t, &RunOptions::default()).expect("run");
    assert_eq!(report.summary.tally.skipped, 2);
    assert!(t.calls_to("set.json").is_empty());
}

#[test]
fn dry_run_issues_no_writes_and_no_log() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("run.csv");
    let t = storefront(ABC_AND_NOPE);
    set_ok(&t);
    let mut cfg = config();
    cfg.run_log_path = Some(log.clone());

    let options = RunOptions {
        dry_run: true,
        ..RunOptions::default()
    };
    let report = run(&cfg, &t, &options).expect("run");
    assert!(report.summary.dry_run);
    assert_eq!(report.summary.tally.updated, 0);
    assert_eq!(report.summary.tally.pending, 1);
    assert!(t.calls().iter().all(|c| c.method == Method::Get));
    assert!(!log.exists());
}

#[test]
fn attempts_are_appended_to_run_log() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("run.csv");
    let t = storefront(ABC_AND_NOPE);
    set_ok(&t);
    let mut cfg = config();
    cfg.run_log_path = Some(log.clone());

    run(&cfg, &t, &RunOptions::default()).expect("first run");
    run(&cfg, &t, &RunOptions::default()).expect("second run");

    let entries = run_log::read_entries(&log).unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.sku.as_str() == "ABC123" && e.quantity == 5));
    let text = fs::read_to_string(&log).unwrap();
    assert_eq!(text.matches("timestamp,sku").count(), 1);
}

#[test]
fn pre_cancelled_run_leaves_all_updates_pending() {
    let t = storefront(ABC_AND_NOPE);
    set_ok(&t);
    let cancel = CancelToken::new();
    cancel.cancel();

    let report = run(
        &config(),
        &t,
        &RunOptions {
            dry_run: false,
            cancel,
        },
    )
    .expect("run");
    assert!(report.summary.cancelled);
    assert_eq!(report.summary.tally.pending, 1);
    assert_eq!(report.summary.tally.updated, 0);
    assert!(t.calls_to("set.json").is_empty());
}

/// Cancels the run as soon as the first set call goes out.
struct CancelOnFirstSet {
    inner: ScriptedTransport,
    cancel: CancelToken,
}

impl Transport for CancelOnFirstSet {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        if request.url.ends_with("set.json") {
            self.cancel.cancel();
        }
        self.inner.send(request)
    }
}

#[test]
fn cancellation_between_updates_reports_partial_progress() {
    let variants = r#"
        {"id": 10, "sku": "ABC123", "inventory_item_id": 111, "inventory_quantity": 9},
        {"id": 11, "sku": "XYZ999", "inventory_item_id": 333, "inventory_quantity": 4}
    "#;
    let inner = storefront(variants);
    set_ok(&inner);
    let cancel = CancelToken::new();
    let transport = CancelOnFirstSet {
        inner,
        cancel: cancel.clone(),
    };

    let report = run(
        &config(),
        &transport,
        &RunOptions {
            dry_run: false,
            cancel,
        },
    )
    .expect("run");
    assert!(report.summary.cancelled);
    assert_eq!(report.summary.tally.updated, 1);
    assert_eq!(report.summary.tally.pending, 1);
    assert_eq!(transport.inner.calls_to("set.json").len(), 1);
}

/// Cancels shortly after the first set call, while the run waits out the
/// delay before the next update.
struct CancelDuringDelay {
    inner: ScriptedTransport,
    cancel: CancelToken,
}

impl Transport for CancelDuringDelay {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        if request.url.ends_with("set.json") {
            let cancel = self.cancel.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                cancel.cancel();
            });
        }
        self.inner.send(request)
    }
}

#[test]
fn cancel_during_update_delay_sends_no_further_calls() {
    let variants = r#"
        {"id": 10, "sku": "ABC123", "inventory_item_id": 111, "inventory_quantity": 9},
        {"id": 11, "sku": "XYZ999", "inventory_item_id": 333, "inventory_quantity": 4}
    "#;
    let inner = storefront(variants);
    set_ok(&inner);
    let cancel = CancelToken::new();
    let transport = CancelDuringDelay {
        inner,
        cancel: cancel.clone(),
    };
    let mut cfg = config();
    cfg.update.delay = Duration::from_millis(500);

    let report = run(
        &cfg,
        &transport,
        &RunOptions {
            dry_run: false,
            cancel,
        },
    )
    .expect("run");
    assert!(report.summary.cancelled);
    assert_eq!(report.summary.tally.updated, 1);
    assert_eq!(report.summary.tally.pending, 1);
    assert_eq!(transport.inner.calls_to("set.json").len(), 1);
    assert_eq!(transport.inner.calls_to("connect.json").len(), 1);
}

#[test]
fn summary_serializes_flat() {
    let t = storefront(ABC_AND_NOPE);
    set_ok(&t);
    let report = run(&config(), &t, &RunOptions::default()).expect("run");
    let value = serde_json::to_value(&report.summary).unwrap();
    for key in [
        "updated",
        "skipped",
        "failed",
        "pending",
        "feed_skus",
        "feed_rows_skipped",
        "variants",
        "cancelled",
        "dry_run",
        "duration_ms",
    ] {
        assert!(value.get(key).is_some(), "missing {key}");
    }
}
