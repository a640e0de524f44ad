//! Navigation Integration Tests
//!
//! End-to-end tests for route resolution, the state store and the history
//! adapter working together through a [`Router`].

use async_trait::async_trait;
use pathway::{
    Direction, GuardContext, GuardOutcome, Loader, LoaderContext, MemoryHistory, NavigationHost,
    NavigationMode, RouteError, RouteParams, RouteTable, Router, RouterConfig, RouterError,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const DEMO_ROUTES: [(&str, &str); 9] = [
    ("Home", "/"),
    ("About", "/about"),
    ("Products", "/products"),
    ("Product", "/products/:id"),
    ("ProductSpecs", "/products/:id/specs"),
    ("Users", "/users"),
    ("NewUser", "/users/new"),
    ("UserDetail", "/users/:userId"),
    ("Login", "/login"),
];

fn params(pairs: &[(&str, &str)]) -> RouteParams {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn router(url: &str) -> (Router, Arc<MemoryHistory>) {
    let host = Arc::new(MemoryHistory::new(url));
    let router = Router::new(
        DEMO_ROUTES,
        RouterConfig::default().use_hash(false),
        host.clone(),
    )
    .unwrap();
    router.start();
    (router, host)
}

/// Every built path matches back to the same parameters
#[test]
fn test_build_then_match_round_trip() {
    let table = RouteTable::new(DEMO_ROUTES).unwrap();
    let cases = [
        ("Home", params(&[])),
        ("Product", params(&[("id", "7")])),
        ("ProductSpecs", params(&[("id", "blue widget")])),
        ("UserDetail", params(&[("userId", "ünïcode/slash")])),
    ];

    for (name, expected) in cases {
        let path = table.build_path(name, &expected).unwrap();
        let matched = table.match_one(name, &path).unwrap();
        assert_eq!(matched.params, expected, "round trip for {}", name);
    }
}

/// Literal segments outrank parameters
#[test]
fn test_literal_route_wins() {
    let table = RouteTable::new(DEMO_ROUTES).unwrap();
    assert_eq!(table.match_path("/users/new").unwrap().name, "NewUser");
    assert_eq!(table.match_path("/users/42").unwrap().name, "UserDetail");

    let names: Vec<_> = table
        .match_all("/users/new")
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(names, vec!["NewUser", "UserDetail"]);
}

/// Building without a required parameter fails at the call site
#[test]
fn test_missing_param_error() {
    let table = RouteTable::new(DEMO_ROUTES).unwrap();
    let err = table.build_path("UserDetail", &RouteParams::new()).unwrap_err();
    assert_eq!(
        err,
        RouteError::MissingParam {
            param: "userId".to_string(),
            pattern: "/users/:userId".to_string(),
        }
    );

    let (router, _host) = router("/");
    assert!(matches!(
        router.goto("UserDetail", &RouteParams::new()),
        Err(RouterError::Route(RouteError::MissingParam { .. }))
    ));
}

/// Pushing the same path twice records one change
#[test]
fn test_store_idempotence() {
    let (router, host) = router("/");
    let mut changes = router.store().subscribe_changes();

    assert!(router.push("/about").is_some());
    assert!(router.push("/about").is_none());

    assert_eq!(router.current().path, "/about");
    assert_eq!(changes.try_recv().unwrap().to_state.path, "/about");
    assert!(changes.try_recv().is_err());
    assert_eq!(host.len(), 2);
}

/// push, push, back yields forward, forward, back
#[test]
fn test_direction_push_push_back() {
    init_tracing();
    let (router, _host) = router("/");

    let mut directions = vec![
        router.push("/a").unwrap().direction,
        router.push("/b").unwrap().direction,
    ];
    router.back();
    directions.extend(router.process_pending_events().iter().map(|n| n.direction));

    assert_eq!(
        directions,
        vec![Direction::Forward, Direction::Forward, Direction::Back]
    );
    assert_eq!(router.snapshot().direction, Direction::Back);
}

/// Two consecutive backs both report back
#[test]
fn test_direction_double_back() {
    let (router, _host) = router("/");
    router.push("/a");
    router.push("/b");
    router.push("/c");

    router.back();
    let first = router.process_pending_events();
    router.back();
    let second = router.process_pending_events();

    assert_eq!(first[0].direction, Direction::Back);
    assert_eq!(second[0].direction, Direction::Back);
    assert_eq!(router.current().path, "/a");

    router.forward();
    let third = router.process_pending_events();
    assert_eq!(third[0].direction, Direction::Forward);
    assert_eq!(router.current().path, "/b");
}

/// Sequence numbers grow across every kind of transition
#[test]
fn test_change_records_across_modes() {
    let (router, _host) = router("/");
    router.push("/a");
    router.replace("/b");
    router.redirect("/c");
    router.back();
    router.process_pending_events();

    let change = router.snapshot().change.unwrap();
    assert_eq!(change.mode, NavigationMode::Pop);
    assert_eq!(change.from_state.path, "/c");
    assert_eq!(change.to_state.path, "/");
    assert_eq!(change.sequence, 5);
}

/// Snapshots taken while another thread navigates never mix two navigations
#[test]
fn test_snapshot_consistent_under_concurrent_navigation() {
    let (router, _host) = router("/");
    let writer = router.clone();
    let done = Arc::new(AtomicBool::new(false));
    let finished = done.clone();

    let handle = std::thread::spawn(move || {
        for _ in 0..5_000 {
            writer.push("/about");
            writer.replace("/products");
        }
        finished.store(true, Ordering::Release);
    });

    let mut torn = 0;
    let mut taken = 0;
    while !done.load(Ordering::Acquire) || taken == 0 {
        let snapshot = router.snapshot();
        let change = snapshot.change.unwrap();
        let forward = snapshot.direction == Direction::Forward;
        if forward != (change.mode == NavigationMode::Push) || snapshot.path != change.to_state.path {
            torn += 1;
        }
        taken += 1;
    }
    handle.join().unwrap();

    assert_eq!(torn, 0, "{} of {} snapshots were torn", torn, taken);
}

/// Hash mode reads and writes the fragment under the base
#[test]
fn test_hash_mode_round_trip() {
    let host = Arc::new(MemoryHistory::new("/shop/#/products/3"));
    let router = Router::new(DEMO_ROUTES, RouterConfig::default(), host.clone()).unwrap();
    router.start();

    let snapshot = router.snapshot();
    assert_eq!(snapshot.path, "/products/3");
    assert_eq!(snapshot.to.unwrap().params["id"], "3");

    router.goto("ProductSpecs", &params(&[("id", "3")])).unwrap();
    assert_eq!(host.url(), "/shop#/products/3/specs");
    assert_eq!(
        router.href("About", &RouteParams::new()).href,
        "/shop#/about"
    );

    // User edits the fragment by hand
    host.set_hash("/users");
    let navs = router.process_pending_events();
    assert_eq!(navs.len(), 1);
    assert_eq!(navs[0].change.mode, NavigationMode::Pop);
    assert_eq!(router.current().path, "/users");
}

/// The session index is persisted with each entry
#[test]
fn test_session_index_persisted() {
    let (router, host) = router("/");
    assert_eq!(host.entry_state().unwrap().index, Some(0));

    router.push("/a");
    router.push("/b");
    assert_eq!(host.entry_state().unwrap().index, Some(2));

    router.replace("/c");
    assert_eq!(host.entry_state().unwrap().index, Some(2));
    assert!(host.entry_state().unwrap().key.is_some());
}

struct AuthGuard;

#[async_trait]
impl pathway::Guard for AuthGuard {
    async fn check(&self, ctx: &GuardContext) -> anyhow::Result<GuardOutcome> {
        match ctx.route.as_ref().map(|r| r.name.as_str()) {
            Some("Users") | Some("UserDetail") => Ok(GuardOutcome::Redirect("login".to_string())),
            Some("Products") => anyhow::bail!("session lookup failed"),
            _ => Ok(GuardOutcome::Allow),
        }
    }
}

/// Guard redirects replace the guarded entry; guard errors allow
#[tokio::test]
async fn test_guard_redirect_and_failure() {
    init_tracing();
    let host = Arc::new(MemoryHistory::new("/"));
    let router = Router::builder(DEMO_ROUTES, host.clone())
        .unwrap()
        .config(RouterConfig::default().use_hash(false))
        .guard(AuthGuard)
        .build()
        .unwrap();
    router.start();

    router.goto("UserDetail", &params(&[("userId", "1")])).unwrap();
    router.settle().await;

    let change = router.snapshot().change.unwrap();
    assert_eq!(change.mode, NavigationMode::Redirect);
    assert_eq!(change.from_state.path, "/users/1");
    assert_eq!(router.current().path, "/login");
    assert_eq!(host.url(), "/login");
    assert_eq!(host.len(), 2);

    router.push("/products");
    router.settle().await;
    assert_eq!(router.current().path, "/products");
}

struct ProductLoader;

#[async_trait]
impl Loader for ProductLoader {
    async fn load(&self, ctx: &LoaderContext) -> anyhow::Result<Option<RouteParams>> {
        let Some(id) = ctx.params.as_ref().and_then(|p| p.get("id")) else {
            return Ok(None);
        };
        if id == "slow" {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        let title = format!("Product {}", id);
        Ok(Some(params(&[("title", title.as_str())])))
    }
}

/// Only the loader result for the current navigation is kept
#[tokio::test(start_paused = true)]
async fn test_loader_results_follow_latest_navigation() {
    let host = Arc::new(MemoryHistory::new("/"));
    let router = Router::builder(DEMO_ROUTES, host)
        .unwrap()
        .config(RouterConfig::default().use_hash(false))
        .loader(ProductLoader)
        .build()
        .unwrap();
    router.start();

    router.push("/products/slow");
    router.push("/products/9");
    router.settle().await;

    let loaded = router.loaded().unwrap();
    assert_eq!(loaded.path, "/products/9");
    assert_eq!(loaded.params["title"], "Product 9");
}

/// The listener task applies host notifications as they arrive
#[tokio::test]
async fn test_listener_applies_back() {
    let (router, _host) = router("/");
    router.push("/about");
    let mut navigations = router.subscribe();
    let _listener = router.spawn_listener().unwrap();

    router.back();
    let nav = navigations.recv().await.unwrap();
    assert_eq!(nav.direction, Direction::Back);
    assert_eq!(router.current().path, "/");
}

/// Host write failures do not block navigation
#[test]
fn test_host_write_failure_tolerated() {
    let (router, host) = router("/");
    host.set_fail_writes(true);

    let nav = router.push("/about").unwrap();
    assert_eq!(nav.direction, Direction::Forward);
    assert_eq!(router.current().path, "/about");
    assert_eq!(host.url(), "/");
}
