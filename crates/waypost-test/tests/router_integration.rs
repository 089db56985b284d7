//! Integration tests for the router pipeline.
//!
//! Tests cover: route precedence, parameter extraction, route ids, start and
//! mode lifecycle, view reuse and disposal, the list/detail navigation
//! scenario, listener management, error propagation, and navigation raised
//! from inside a listener, a view hook, or a view's dispose.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use waypost_core::{RouterSettings, WaypostError, WaypostResult};
use waypost_router::pattern::Matcher;
use waypost_router::view::StaticMountResolver;
use waypost_router::{Location, MountPoint, Mode, Navigation, RouteConfig, Router, View};
use waypost_test::{
    ListenerLog, RecordingView, ScriptedLocator, ScriptedLocators, ViewEvent, ViewLog,
};

fn router_at(url: &str) -> (Router, ScriptedLocators) {
    router_with(url, RouterSettings::default())
}

fn router_with(url: &str, settings: RouterSettings) -> (Router, ScriptedLocators) {
    let locators = ScriptedLocators::new(url);
    let router = Router::builder()
        .settings(settings)
        .locator_factory(locators.factory())
        .mount_resolver(Arc::new(StaticMountResolver::new(["#main"])))
        .build();
    (router, locators)
}

/// Accepts `/item/<anything>` and captures the remainder.
#[derive(Debug)]
struct ItemMatcher;

impl Matcher for ItemMatcher {
    fn test(&self, path: &str) -> Option<Vec<Option<String>>> {
        path.strip_prefix("/item/")
            .map(|rest| vec![Some(rest.to_string())])
    }
}

// ═════════════════════════════════════════════════════════════════════
// 1. Precedence: the first registered match wins over a more specific one
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_first_registered_route_wins() {
    let (mut router, _locators) = router_at("/");
    let general = router.add_route(RouteConfig::new("/list/:x")).unwrap();
    let specific = router.add_route(RouteConfig::new("/list/all")).unwrap();
    let log = ListenerLog::new();
    router.listen(log.listener());
    router.start().unwrap();

    router.navigate("/list/all").unwrap();

    assert_eq!(log.route_ids(), vec![general]);
    assert_ne!(log.route_ids()[0], specific);
    assert_eq!(log.last().unwrap().location.param("x"), Some("all"));
}

// ═════════════════════════════════════════════════════════════════════
// 2. Parameter extraction: named and positional
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_named_parameter_lands_in_query() {
    let (mut router, _locators) = router_at("/");
    router.add(RouteConfig::new("/user/:id")).unwrap();
    let log = ListenerLog::new();
    router.listen(log.listener());
    router.start().unwrap();

    router.navigate("/user/42").unwrap();
    assert_eq!(log.last().unwrap().location.param("id"), Some("42"));
}

#[test]
fn test_path_parameter_overrides_query_parameter() {
    let (mut router, _locators) = router_at("/");
    router.add(RouteConfig::new("/user/:id")).unwrap();
    let log = ListenerLog::new();
    router.listen(log.listener());
    router.start().unwrap();

    router.navigate("/user/42?id=9&tab=info").unwrap();
    let location = log.last().unwrap().location;
    assert_eq!(location.param("id"), Some("42"));
    assert_eq!(location.param("tab"), Some("info"));
}

#[test]
fn test_custom_matcher_uses_positional_keys() {
    let (mut router, _locators) = router_at("/");
    let matcher: Arc<dyn Matcher> = Arc::new(ItemMatcher);
    router.add(RouteConfig::new(matcher)).unwrap();
    let log = ListenerLog::new();
    router.listen(log.listener());
    router.start().unwrap();

    router.navigate("/item/7").unwrap();
    assert_eq!(log.last().unwrap().location.param("1"), Some("7"));
}

#[test]
fn test_pattern_matching_is_case_insensitive() {
    let (mut router, _locators) = router_at("/");
    router.add(RouteConfig::new("/Docs/:page")).unwrap();
    let log = ListenerLog::new();
    router.listen(log.listener());
    router.start().unwrap();

    router.navigate("/docs/Intro").unwrap();
    assert_eq!(log.last().unwrap().location.param("page"), Some("Intro"));
}

// ═════════════════════════════════════════════════════════════════════
// 3. Route ids are distinct and increasing
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_route_ids_strictly_increase() {
    let mut router = Router::new();
    let a = router.add_route(RouteConfig::new("/a")).unwrap();
    let b = router.add_route(RouteConfig::new("/b")).unwrap();
    let c = router.add_route(RouteConfig::new("/c")).unwrap();
    assert!(a < b && b < c);
}

// ═════════════════════════════════════════════════════════════════════
// 4. Start, stop, and mode lifecycle
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_start_twice_starts_locator_once() {
    let (mut router, locators) = router_at("/");
    router.start().unwrap();
    router.start().unwrap();

    let locator = locators.current().unwrap();
    assert_eq!(locator.start_count(), 1);
    assert_eq!(locator.reload_count(), 1);
    assert_eq!(locator.handler_count(), 1);
}

#[test]
fn test_stop_unsubscribes() {
    let (mut router, locators) = router_at("/home");
    router.add(RouteConfig::new("/:page")).unwrap();
    let log = ListenerLog::new();
    router.listen(log.listener());
    router.start().unwrap();
    router.stop();

    let locator = locators.current().unwrap();
    assert_eq!(locator.handler_count(), 0);
    assert!(!locator.is_running());

    locator.emit("/elsewhere").unwrap();
    assert_eq!(log.len(), 1);
}

#[test]
fn test_same_mode_is_noop() {
    let (mut router, locators) = router_at("/");
    router.start().unwrap();
    router.set_mode(Mode::Hash).unwrap();
    router.set_mode_str("Hash").unwrap();

    assert_eq!(locators.built().len(), 1);
    let locator = locators.current().unwrap();
    assert_eq!(locator.stop_count(), 0);
    assert_eq!(locator.start_count(), 1);
}

#[test]
fn test_mode_switch_restarts_on_new_locator() {
    let (mut router, locators) = router_at("/page");
    router.add(RouteConfig::new("/page")).unwrap();
    let log = ListenerLog::new();
    router.listen(log.listener());
    router.start().unwrap();

    router.set_mode(Mode::Html5).unwrap();

    assert_eq!(locators.modes(), vec![Mode::Hash, Mode::Html5]);
    let built = locators.built();
    assert_eq!(built[0].stop_count(), 1);
    assert_eq!(built[0].handler_count(), 0);
    assert_eq!(built[1].start_count(), 1);
    assert_eq!(built[1].reload_count(), 1);
    assert_eq!(log.len(), 2);
}

#[test]
fn test_mode_switch_while_stopped_stays_stopped() {
    let (mut router, locators) = router_at("/");
    router.set_mode(Mode::Html5).unwrap();

    assert!(!router.is_started());
    assert_eq!(locators.current().unwrap().start_count(), 0);
}

// ═════════════════════════════════════════════════════════════════════
// 5. View reconciliation: reuse, disposal, and no-match teardown
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_same_route_reuses_view() {
    let (mut router, _locators) = router_at("/");
    let views = ViewLog::new();
    let id = router
        .add_route(RouteConfig::new("/list/:category").view(views.factory("list")))
        .unwrap();
    router.start().unwrap();

    router.navigate("/list/a").unwrap();
    router.navigate("/list/b").unwrap();

    assert_eq!(views.created(), vec!["list#1"]);
    assert_eq!(views.hook_count("list#1"), 2);
    assert!(views.disposed().is_empty());
    assert_eq!(router.mounted_route_ids(), vec![id]);
}

#[test]
fn test_switching_route_disposes_previous_view() {
    let (mut router, _locators) = router_at("/");
    let views = ViewLog::new();
    router
        .add(RouteConfig::new("/one").view(views.factory("one")))
        .unwrap();
    let two = router
        .add_route(RouteConfig::new("/two").view(views.factory("two")))
        .unwrap();
    router.start().unwrap();

    router.navigate("/one").unwrap();
    router.navigate("/two").unwrap();

    assert_eq!(views.created(), vec!["one#1", "two#1"]);
    assert_eq!(views.disposed(), vec!["one#1"]);
    assert_eq!(router.mounted_route_ids(), vec![two]);
}

#[test]
fn test_unmatched_location_disposes_everything() {
    let (mut router, _locators) = router_at("/");
    let views = ViewLog::new();
    router
        .add(RouteConfig::new("/one").view(views.factory("one")))
        .unwrap();
    router.start().unwrap();

    router.navigate("/one").unwrap();
    router.navigate("/nowhere").unwrap();

    assert_eq!(views.disposed(), vec!["one#1"]);
    assert!(router.mounted_route_ids().is_empty());
}

#[test]
fn test_view_attaches_to_resolved_target() {
    let (mut router, _locators) = router_at("/");
    let views = ViewLog::new();
    router
        .add(RouteConfig::new("/a").view(views.factory("a")))
        .unwrap();
    router
        .add(
            RouteConfig::new("/b")
                .target("#missing")
                .view(views.factory("b")),
        )
        .unwrap();
    router.start().unwrap();

    router.navigate("/a").unwrap();
    assert_eq!(views.attachments("a#1"), vec!["#main"]);

    router.navigate("/b").unwrap();
    assert!(views.attachments("b#1").is_empty());
    assert_eq!(router.mounted_route_ids().len(), 1);
}

#[test]
fn test_view_takes_precedence_over_handler() {
    let (mut router, _locators) = router_at("/");
    let views = ViewLog::new();
    let handled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&handled);
    router
        .add(
            RouteConfig::new("/both")
                .view(views.factory("both"))
                .handler(move |_| {
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                }),
        )
        .unwrap();
    router.start().unwrap();

    router.navigate("/both").unwrap();
    assert_eq!(views.created(), vec!["both#1"]);
    assert!(!handled.load(Ordering::SeqCst));
}

#[test]
fn test_settings_control_data_key_and_hook() {
    let settings = RouterSettings {
        data_key: "state".into(),
        route_hook: "on_route".into(),
        ..RouterSettings::default()
    };
    let (mut router, _locators) = router_with("/", settings);
    let views = ViewLog::new();
    router
        .add(RouteConfig::new("/a").view(views.factory("a")))
        .unwrap();
    router.start().unwrap();
    router.navigate("/a").unwrap();

    let events = views.events();
    assert!(events.iter().any(|e| matches!(e, ViewEvent::Data { key, .. } if key == "state")));
    assert!(events.iter().any(|e| matches!(e, ViewEvent::Hook { hook, .. } if hook == "on_route")));
}

// ═════════════════════════════════════════════════════════════════════
// 6. End-to-end: list, list again, then an unknown detail page
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_list_then_detail_scenario() {
    let (mut router, _locators) = router_at("/");
    let views = ViewLog::new();
    let id = router
        .add_route(
            RouteConfig::new("/list/:category")
                .target("#main")
                .view(views.factory("ListView")),
        )
        .unwrap();
    router.start().unwrap();

    router.navigate("/list/shoes").unwrap();
    assert_eq!(views.created(), vec!["ListView#1"]);
    assert_eq!(
        views.last_location("ListView#1").unwrap().param("category"),
        Some("shoes")
    );
    assert_eq!(router.mounted_route_ids(), vec![id]);

    router.navigate("/list/bags").unwrap();
    assert_eq!(views.created(), vec!["ListView#1"]);
    assert_eq!(views.hook_count("ListView#1"), 2);
    assert_eq!(
        views.last_location("ListView#1").unwrap().param("category"),
        Some("bags")
    );
    assert_eq!(router.mounted_route_ids(), vec![id]);

    router.navigate("/detail/9").unwrap();
    assert_eq!(views.disposed(), vec!["ListView#1"]);
    assert!(router.mounted_route_ids().is_empty());
}

// ═════════════════════════════════════════════════════════════════════
// 7. Listeners: order, referrer, and removal
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_listener_sees_referrer() {
    let (mut router, _locators) = router_at("/a");
    router.add(RouteConfig::new("/:page")).unwrap();
    let log = ListenerLog::new();
    router.listen(log.listener());
    router.start().unwrap();
    router.navigate("/b").unwrap();

    let locations = log.locations();
    assert_eq!(locations[0].referrer, None);
    assert_eq!(locations[1].referrer.as_deref(), Some("/a"));
}

#[test]
fn test_unlisten_removes_every_registration() {
    let (mut router, _locators) = router_at("/");
    router.add(RouteConfig::new("/:page")).unwrap();
    let log = ListenerLog::new();
    let listener = log.listener();
    router.listen(Arc::clone(&listener));
    router.listen(Arc::clone(&listener));
    assert_eq!(router.listener_count(), 2);

    assert_eq!(router.unlisten(&listener), 2);
    router.start().unwrap();
    router.navigate("/x").unwrap();
    assert!(log.is_empty());
}

#[test]
fn test_duplicate_listener_fires_twice() {
    let (mut router, _locators) = router_at("/");
    router.add(RouteConfig::new("/:page")).unwrap();
    let log = ListenerLog::new();
    let listener = log.listener();
    router.listen(Arc::clone(&listener)).listen(listener);
    router.start().unwrap();
    router.navigate("/x").unwrap();
    assert_eq!(log.len(), 2);
}

// ═════════════════════════════════════════════════════════════════════
// 8. Error propagation
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_listener_error_skips_reconciliation() {
    let (mut router, _locators) = router_at("/");
    let views = ViewLog::new();
    router
        .add(RouteConfig::new("/a").view(views.factory("a")))
        .unwrap();
    router.listen(Arc::new(|_: &Navigation| {
        Err(WaypostError::ListenerError("rejected".into()))
    }));
    router.start().unwrap();

    let err = router.navigate("/a").unwrap_err();
    assert!(matches!(err, WaypostError::ListenerError(_)));
    assert!(views.created().is_empty());
    assert!(router.mounted_route_ids().is_empty());
}

#[test]
fn test_isolated_listener_error_still_mounts() {
    let settings = RouterSettings {
        isolate_listener_errors: true,
        ..RouterSettings::default()
    };
    let (mut router, _locators) = router_with("/", settings);
    let views = ViewLog::new();
    router
        .add(RouteConfig::new("/a").view(views.factory("a")))
        .unwrap();
    router.listen(Arc::new(|_: &Navigation| {
        Err(WaypostError::ListenerError("rejected".into()))
    }));
    router.start().unwrap();

    router.navigate("/a").unwrap();
    assert_eq!(views.created(), vec!["a#1"]);
}

#[test]
fn test_handler_error_propagates() {
    let (mut router, _locators) = router_at("/");
    router
        .add(RouteConfig::new("/fail").handler(|_| {
            Err(WaypostError::HandlerError("boom".into()))
        }))
        .unwrap();
    router.start().unwrap();

    let err = router.navigate("/fail").unwrap_err();
    assert_eq!(err.kind(), "handler");
}

#[test]
fn test_hook_error_on_create_disposes_new_view() {
    let (mut router, _locators) = router_at("/");
    let views = ViewLog::new();
    router
        .add(RouteConfig::new("/bad").view(views.failing_factory("bad")))
        .unwrap();
    router.start().unwrap();

    let err = router.navigate("/bad").unwrap_err();
    assert!(matches!(err, WaypostError::HookError { .. }));
    assert_eq!(views.disposed(), vec!["bad#1"]);
    assert!(router.mounted_route_ids().is_empty());
}

#[test]
fn test_error_during_start_leaves_router_started() {
    let (mut router, _locators) = router_at("/fail");
    router
        .add(RouteConfig::new("/fail").handler(|_| {
            Err(WaypostError::HandlerError("boom".into()))
        }))
        .unwrap();

    assert!(router.start().is_err());
    assert!(router.is_started());
}

// ═════════════════════════════════════════════════════════════════════
// 9. Navigation raised from inside a listener
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_nested_navigation_wins() {
    let (mut router, locators) = router_at("/");
    let views = ViewLog::new();
    router
        .add(RouteConfig::new("/a").view(views.factory("a")))
        .unwrap();
    let b = router
        .add_route(RouteConfig::new("/b").view(views.factory("b")))
        .unwrap();

    let log = ListenerLog::new();
    router.listen(log.listener());
    let locator = locators.current().unwrap();
    router.listen(Arc::new(move |navigation: &Navigation| {
        if navigation.location.path == "/a" {
            locator.emit("/b")?;
        }
        Ok(())
    }));
    router.start().unwrap();

    router.navigate("/a").unwrap();

    let paths: Vec<String> = log.locations().into_iter().map(|l| l.path).collect();
    assert_eq!(paths, vec!["/a", "/b"]);
    assert_eq!(views.created(), vec!["b#1"]);
    assert_eq!(router.mounted_route_ids(), vec![b]);
}

// ═════════════════════════════════════════════════════════════════════
// 10. Navigation raised from inside a view
// ═════════════════════════════════════════════════════════════════════

type Redirector = fn(&Location) -> Option<String>;

/// A recording view that navigates from its hook or its dispose.
struct RedirectingView {
    inner: RecordingView,
    locator: Weak<ScriptedLocator>,
    location: Option<Location>,
    on_hook: Redirector,
    fail_after_redirect: bool,
    on_dispose: Option<&'static str>,
}

impl RedirectingView {
    fn emit(&self, url: &str) -> WaypostResult<()> {
        match self.locator.upgrade() {
            Some(locator) => locator.emit(url),
            None => Ok(()),
        }
    }
}

impl View for RedirectingView {
    fn set_data(&mut self, key: &str, location: &Location) {
        self.location = Some(location.clone());
        self.inner.set_data(key, location);
    }

    fn invoke_hook(&mut self, hook: &str) -> WaypostResult<()> {
        self.inner.invoke_hook(hook)?;
        let target = self.location.as_ref().and_then(self.on_hook);
        if let Some(url) = target {
            self.emit(&url)?;
            if self.fail_after_redirect {
                return Err(WaypostError::hook(hook, "redirected, then refused"));
            }
        }
        Ok(())
    }

    fn attach(&mut self, mount_point: &MountPoint) {
        self.inner.attach(mount_point);
    }

    fn dispose(&mut self) {
        self.inner.dispose();
        if let Some(url) = self.on_dispose {
            let _ = self.emit(url);
        }
    }
}

struct Redirecting {
    on_hook: Redirector,
    fail_after_redirect: bool,
    on_dispose: Option<&'static str>,
}

impl Redirecting {
    fn on_hook(on_hook: Redirector) -> Self {
        Self {
            on_hook,
            fail_after_redirect: false,
            on_dispose: None,
        }
    }

    fn on_dispose(url: &'static str) -> Self {
        Self {
            on_hook: |_| None,
            fail_after_redirect: false,
            on_dispose: Some(url),
        }
    }

    fn failing(mut self) -> Self {
        self.fail_after_redirect = true;
        self
    }

    fn factory(
        self,
        name: &'static str,
        views: &ViewLog,
        locators: &ScriptedLocators,
    ) -> impl Fn() -> Box<dyn View> + Send + Sync + 'static {
        let views = views.clone();
        let locator = Arc::downgrade(&locators.current().unwrap());
        let serial = std::sync::atomic::AtomicUsize::new(0);
        move || -> Box<dyn View> {
            let n = serial.fetch_add(1, Ordering::SeqCst) + 1;
            Box::new(RedirectingView {
                inner: RecordingView::new(format!("{name}#{n}"), views.clone(), false),
                locator: locator.clone(),
                location: None,
                on_hook: self.on_hook,
                fail_after_redirect: self.fail_after_redirect,
                on_dispose: self.on_dispose,
            })
        }
    }
}

fn lowercase_category(location: &Location) -> Option<String> {
    let category = location.param("category")?;
    let lower = category.to_lowercase();
    (lower != category).then(|| format!("/list/{lower}"))
}

#[test]
fn test_hook_normalising_same_route_keeps_instance() {
    let (mut router, locators) = router_at("/");
    let views = ViewLog::new();
    let list = router
        .add_route(
            RouteConfig::new("/list/:category")
                .view(Redirecting::on_hook(lowercase_category).factory("list", &views, &locators)),
        )
        .unwrap();
    router.start().unwrap();

    router.navigate("/list/shoes").unwrap();
    router.navigate("/list/Bags").unwrap();

    assert_eq!(views.created(), vec!["list#1"]);
    assert!(views.disposed().is_empty());
    assert_eq!(views.hook_count("list#1"), 3);
    let last = views.last_location("list#1").unwrap();
    assert_eq!(last.param("category"), Some("bags"));
    assert_eq!(router.mounted_route_ids(), vec![list]);
    assert_eq!(locators.current().unwrap().url(), "/list/bags");
}

#[test]
fn test_first_hook_normalising_same_route_builds_once() {
    let (mut router, locators) = router_at("/");
    let views = ViewLog::new();
    router
        .add(
            RouteConfig::new("/list/:category")
                .view(Redirecting::on_hook(lowercase_category).factory("list", &views, &locators)),
        )
        .unwrap();
    router.start().unwrap();

    router.navigate("/list/Bags").unwrap();

    assert_eq!(views.created(), vec!["list#1"]);
    assert_eq!(views.attachments("list#1"), vec!["#main"]);
    let last = views.last_location("list#1").unwrap();
    assert_eq!(last.param("category"), Some("bags"));
    assert_eq!(router.len(), 1);
}

#[test]
fn test_hook_redirecting_to_other_route_mounts_only_target() {
    let (mut router, locators) = router_at("/");
    let views = ViewLog::new();
    router
        .add(
            RouteConfig::new("/old")
                .view(Redirecting::on_hook(|_| Some("/new".into())).factory("old", &views, &locators)),
        )
        .unwrap();
    let new = router
        .add_route(RouteConfig::new("/new").view(views.factory("new")))
        .unwrap();
    router.start().unwrap();

    router.navigate("/old").unwrap();

    assert_eq!(views.created(), vec!["old#1", "new#1"]);
    assert_eq!(views.disposed(), vec!["old#1"]);
    assert!(views.attachments("old#1").is_empty());
    assert_eq!(views.attachments("new#1"), vec!["#main"]);
    assert_eq!(router.mounted_route_ids(), vec![new]);
}

#[test]
fn test_hook_failing_after_redirect_leaves_single_view() {
    let (mut router, locators) = router_at("/");
    let views = ViewLog::new();
    router
        .add(
            RouteConfig::new("/a/:n").view(
                Redirecting::on_hook(|location| {
                    (location.param("n") == Some("2")).then(|| "/b".to_string())
                })
                .failing()
                .factory("a", &views, &locators),
            ),
        )
        .unwrap();
    let b = router
        .add_route(RouteConfig::new("/b").view(views.factory("b")))
        .unwrap();
    router.start().unwrap();
    router.navigate("/a/1").unwrap();

    let err = router.navigate("/a/2").unwrap_err();

    assert!(matches!(err, WaypostError::HookError { .. }));
    assert_eq!(router.mounted_route_ids(), vec![b]);
    assert_eq!(router.len(), 1);
    assert_eq!(views.disposed(), vec!["a#1"]);
}

#[test]
fn test_dispose_redirecting_wins_over_pending_route() {
    let (mut router, locators) = router_at("/");
    let views = ViewLog::new();
    router
        .add(RouteConfig::new("/x").view(Redirecting::on_dispose("/z").factory("x", &views, &locators)))
        .unwrap();
    router
        .add(RouteConfig::new("/y").view(views.factory("y")))
        .unwrap();
    let z = router
        .add_route(RouteConfig::new("/z").view(views.factory("z")))
        .unwrap();
    router.start().unwrap();
    router.navigate("/x").unwrap();

    router.navigate("/y").unwrap();

    assert_eq!(views.created(), vec!["x#1", "z#1"]);
    assert_eq!(views.disposed(), vec!["x#1"]);
    assert_eq!(router.mounted_route_ids(), vec![z]);
}
