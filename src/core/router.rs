//! Purpose: Concurrency-safe registry mapping method names to routes.
//! Exports: `Router`, `RoutesGroup`, `format_routes`, `print_routes`, default-router helpers.
//! Role: Filled at startup by route groups, read by transports on every request.
//! Invariants: At most one route per method; re-registration replaces (last write wins).
//! Invariants: Each critical section is a single map insert or get, so readers never
//! Invariants: observe a partially registered method.
//! Notes: The process-wide router is a convenience; owned routers are preferred.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::{LazyLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::core::route::Route;

#[derive(Debug, Default)]
pub struct Router {
    routes: RwLock<HashMap<String, Route>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the route for `route.method()`.
    pub fn register(&self, route: Route) {
        let method = route.method().to_string();
        let replaced = self.write().insert(method, route);
        if let Some(previous) = replaced {
            tracing::warn!(method = previous.method(), "route replaced by later registration");
        }
    }

    /// Register each route of `group` in order. Not transactional.
    pub fn register_group(&self, group: RoutesGroup) {
        tracing::debug!(group = %group.name, routes = group.items.len(), "registering routes group");
        for route in group.items {
            self.register(route);
        }
    }

    pub fn register_groups(&self, groups: impl IntoIterator<Item = RoutesGroup>) {
        for group in groups {
            self.register_group(group);
        }
    }

    /// Look up the route for `method`; `None` means "method not found".
    pub fn get_method_handler(&self, method: &str) -> Option<Route> {
        self.read().get(method).cloned()
    }

    pub fn contains(&self, method: &str) -> bool {
        self.read().contains_key(method)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = self.read().keys().cloned().collect();
        methods.sort();
        methods
    }

    // Every write is a single insert, so a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Route>> {
        self.routes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Route>> {
        self.routes.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Named, ordered bundle of routes used for registration and listing.
#[derive(Clone, Debug, Default)]
pub struct RoutesGroup {
    pub name: String,
    pub items: Vec<Route>,
}

impl RoutesGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    pub fn with_route(mut self, route: impl Into<Route>) -> Self {
        self.items.push(route.into());
        self
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(Route::method)
    }
}

/// Human-readable listing of groups and their methods, in group order.
pub fn format_routes(groups: &[RoutesGroup]) -> String {
    let mut out = String::from("Registered routes:\n");
    for group in groups {
        let _ = writeln!(out, "\n{}:", group.name);
        for method in group.methods() {
            let _ = writeln!(out, "  - {method}");
        }
    }
    out
}

/// Log the listing of `groups`, one event per group.
pub fn print_routes(groups: &[RoutesGroup]) {
    tracing::info!(groups = groups.len(), "registered routes");
    for group in groups {
        let methods = group.methods().collect::<Vec<_>>().join(", ");
        tracing::info!(group = %group.name, methods = %methods, "routes group");
    }
}

static DEFAULT_ROUTER: LazyLock<Router> = LazyLock::new(Router::new);

/// Process-wide router used by the `register_*` free functions.
pub fn default_router() -> &'static Router {
    &DEFAULT_ROUTER
}

pub fn register_route(route: Route) {
    DEFAULT_ROUTER.register(route);
}

pub fn register_routes_group(group: RoutesGroup) {
    DEFAULT_ROUTER.register_group(group);
}

pub fn register_routes_groups(groups: impl IntoIterator<Item = RoutesGroup>) {
    DEFAULT_ROUTER.register_groups(groups);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_capture::LogCapture;
    use crate::core::route::decode_none;
    use crate::core::transmit::{Reply, Transmitter, channel};
    use serde_json::{Value, json};

    fn constant(method: &str, reply: Value) -> Route {
        Route::new(method, decode_none, move |(), transmitter: Transmitter| {
            transmitter.send(reply.clone())
        })
    }

    fn call(route: &Route) -> Reply {
        let (transmitter, receiver) = channel();
        let decoded = route.decode(b"").expect("decode");
        route.handle(decoded, transmitter.boxed());
        receiver.recv().expect("reply")
    }

    #[test]
    fn lookup_of_unregistered_method_is_none() {
        let router = Router::new();
        assert!(router.get_method_handler("missingMethod").is_none());
        assert!(router.is_empty());
    }

    #[test]
    fn re_registration_keeps_latest_route() {
        let router = Router::new();
        let first = constant("a", json!(1));
        let second = constant("a", json!(2));
        router.register(first.clone());
        router.register(second.clone());

        assert_eq!(router.len(), 1);
        let found = router.get_method_handler("a").expect("found");
        assert!(found.same_route(&second));
        assert!(!found.same_route(&first));
        assert_eq!(call(&found), Reply::Result(json!(2)));
    }

    #[test]
    fn registration_does_not_disturb_other_methods() {
        let router = Router::new();
        let b = constant("b", json!("b"));
        router.register(b.clone());
        router.register(constant("a", json!("a")));

        assert!(router.get_method_handler("b").expect("b").same_route(&b));
        assert!(router.get_method_handler("c").is_none());
        assert!(router.contains("a"));
        assert!(!router.contains("c"));
    }

    #[test]
    fn group_registration_matches_individual_registration() {
        let group = RoutesGroup::new("G")
            .with_route(constant("x", json!(1)))
            .with_route(constant("y", json!(2)))
            .with_route(constant("x", json!(3)));

        let grouped = Router::new();
        grouped.register_group(group.clone());

        let individual = Router::new();
        for route in group.items.iter().cloned() {
            individual.register(route);
        }

        assert_eq!(grouped.methods(), individual.methods());
        for method in grouped.methods() {
            let left = grouped.get_method_handler(&method).expect("grouped");
            let right = individual.get_method_handler(&method).expect("individual");
            assert!(left.same_route(&right));
        }
        assert_eq!(
            call(&grouped.get_method_handler("x").expect("x")),
            Reply::Result(json!(3))
        );
    }

    #[test]
    fn groups_registration_matches_sequential_groups() {
        let g1 = RoutesGroup::new("one")
            .with_route(constant("shared", json!("one")))
            .with_route(constant("only_one", json!(1)));
        let g2 = RoutesGroup::new("two")
            .with_route(constant("shared", json!("two")))
            .with_route(constant("only_two", json!(2)));

        let batched = Router::new();
        batched.register_groups([g1.clone(), g2.clone()]);

        let sequential = Router::new();
        sequential.register_group(g1);
        sequential.register_group(g2);

        assert_eq!(batched.methods(), vec!["only_one", "only_two", "shared"]);
        assert_eq!(batched.methods(), sequential.methods());
        for method in batched.methods() {
            let left = batched.get_method_handler(&method).expect("batched");
            let right = sequential.get_method_handler(&method).expect("sequential");
            assert!(left.same_route(&right));
        }
        assert_eq!(
            call(&batched.get_method_handler("shared").expect("shared")),
            Reply::Result(json!("two"))
        );
    }

    #[test]
    fn format_routes_lists_every_method_once_per_group() {
        let groups = vec![
            RoutesGroup::new("A").with_route(constant("x", json!(null))),
            RoutesGroup::new("B")
                .with_route(constant("y", json!(null)))
                .with_route(constant("z", json!(null))),
        ];
        let listing = format_routes(&groups);

        let a = listing.find("A:").expect("group A");
        let b = listing.find("B:").expect("group B");
        assert!(a < b);
        for method in ["x", "y", "z"] {
            assert_eq!(listing.matches(&format!("  - {method}\n")).count(), 1);
        }
        let x = listing.find("  - x").expect("x");
        let y = listing.find("  - y").expect("y");
        assert!(a < x && x < b && b < y);
    }

    #[test]
    fn print_routes_logs_one_event_per_group() {
        let groups = vec![
            RoutesGroup::new("A").with_route(constant("x", json!(null))),
            RoutesGroup::new("B")
                .with_route(constant("y", json!(null)))
                .with_route(constant("z", json!(null))),
        ];
        let capture = LogCapture::default();
        capture.run(|| print_routes(&groups));

        let lines = capture.lines();
        assert!(
            lines
                .iter()
                .any(|line| line.contains("registered routes") && line.contains("groups=2"))
        );
        let group_lines: Vec<&String> = lines
            .iter()
            .filter(|line| line.contains("routes group"))
            .collect();
        assert_eq!(group_lines.len(), 2);
        assert!(group_lines[0].contains("INFO"));
        assert!(group_lines[0].contains("group=A"));
        assert!(group_lines[0].contains("methods=x"));
        assert!(group_lines[1].contains("group=B"));
        assert!(group_lines[1].contains("methods=y, z"));
    }

    #[test]
    fn print_routes_with_no_groups_logs_only_summary() {
        let capture = LogCapture::default();
        capture.run(|| print_routes(&[]));

        let lines = capture.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("groups=0"));
    }

    #[test]
    fn default_router_is_shared() {
        register_route(constant("default_router_single", json!(true)));
        register_routes_group(
            RoutesGroup::new("single").with_route(constant("default_router_group", json!(1))),
        );
        register_routes_groups([
            RoutesGroup::new("batch").with_route(constant("default_router_groups", json!(2)))
        ]);
        assert!(default_router().contains("default_router_single"));
        assert!(default_router().contains("default_router_group"));
        assert!(default_router().contains("default_router_groups"));
    }
}
