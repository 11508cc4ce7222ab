//! Route registration.
//!
//! Routes are declared up front with a builder and compiled into a
//! [`RouteTable`] once, at startup. A controller's routes can share a base
//! path:
//!
//! ```rust
//! use switchyard::{ActionHandle, BoundArguments, ParameterSpec, Reply, Router, ScalarType};
//!
//! #[derive(Default)]
//! struct Users;
//!
//! impl Users {
//!     fn list(&mut self, _: BoundArguments) -> Reply { Reply::text("all") }
//!     fn show(&mut self, _: BoundArguments) -> Reply { Reply::text("one") }
//! }
//!
//! let table = Router::new()
//!     .controller("/users", |c| c
//!         .get("/", ActionHandle::new("list", Users::list))
//!         .get("/{id}", ActionHandle::new("show", Users::show)
//!             .param(ParameterSpec::path_var("id", ScalarType::Int))))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(table.len(), 2);
//! ```

use std::sync::Arc;

use tracing::info;

use crate::error::PatternError;
use crate::handler::ActionHandle;
use crate::method::Method;
use crate::pattern::PathPattern;
use crate::table::RouteTable;

struct Route {
    method: Method,
    path: String,
    handle: ActionHandle,
}

/// Collects routes; [`build`](Router::build) compiles them in order.
///
/// Each registration returns `self` so calls chain.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self { Self::default() }

    /// Registers `handle` for a method + path pair.
    pub fn on(mut self, method: Method, path: &str, handle: ActionHandle) -> Self {
        self.routes.push(Route { method, path: join_paths("", path), handle });
        self
    }

    pub fn get(self, path: &str, handle: ActionHandle) -> Self { self.on(Method::Get, path, handle) }
    pub fn post(self, path: &str, handle: ActionHandle) -> Self { self.on(Method::Post, path, handle) }
    pub fn put(self, path: &str, handle: ActionHandle) -> Self { self.on(Method::Put, path, handle) }
    pub fn delete(self, path: &str, handle: ActionHandle) -> Self { self.on(Method::Delete, path, handle) }

    /// Registers a group of routes under a common base path.
    pub fn controller(mut self, base: &str, routes: impl FnOnce(Scope) -> Scope) -> Self {
        let scope = routes(Scope { base: base.to_owned(), routes: Vec::new() });
        self.routes.extend(scope.routes);
        self
    }

    /// Compiles every route into a table, in registration order.
    ///
    /// Logs each mapping and the total. The first malformed template aborts
    /// the build.
    pub fn build(self) -> Result<RouteTable, PatternError> {
        let mut table = RouteTable::new();
        let total = self.routes.len();
        for Route { method, path, handle } in self.routes {
            let pattern = PathPattern::compile(&path, method)?;
            info!("{method} {path} -> {}::{}", handle.controller(), handle.name());
            table.register(pattern, Arc::new(handle));
        }
        info!(routes = total, "route table built");
        Ok(table)
    }
}

/// Routes under one base path. Obtained through [`Router::controller`].
pub struct Scope {
    base: String,
    routes: Vec<Route>,
}

impl Scope {
    pub fn on(mut self, method: Method, path: &str, handle: ActionHandle) -> Self {
        self.routes.push(Route { method, path: join_paths(&self.base, path), handle });
        self
    }

    pub fn get(self, path: &str, handle: ActionHandle) -> Self { self.on(Method::Get, path, handle) }
    pub fn post(self, path: &str, handle: ActionHandle) -> Self { self.on(Method::Post, path, handle) }
    pub fn put(self, path: &str, handle: ActionHandle) -> Self { self.on(Method::Put, path, handle) }
    pub fn delete(self, path: &str, handle: ActionHandle) -> Self { self.on(Method::Delete, path, handle) }
}

/// Joins a base path and a route path: one leading `/`, no repeated `/`, no
/// trailing `/` except for the root itself.
pub fn join_paths(base: &str, path: &str) -> String {
    let segments: Vec<&str> = base
        .split('/')
        .chain(path.split('/'))
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::BoundArguments;
    use crate::handler::Reply;

    #[derive(Default)]
    struct Shop;

    fn handle(name: &str) -> ActionHandle {
        ActionHandle::new(name, |_: &mut Shop, _: BoundArguments| Reply::text(""))
    }

    #[test]
    fn join_normalizes_slashes() {
        assert_eq!(join_paths("", ""), "/");
        assert_eq!(join_paths("/", "/"), "/");
        assert_eq!(join_paths("shop", "items"), "/shop/items");
        assert_eq!(join_paths("/shop/", "/items/"), "/shop/items");
        assert_eq!(join_paths("//shop", "items//{id}"), "/shop/items/{id}");
    }

    #[test]
    fn controller_routes_share_base() {
        let table = Router::new()
            .get("/", handle("index"))
            .controller("/shop", |c| c.get("", handle("list")).post("/items", handle("add")))
            .build()
            .unwrap();

        assert_eq!(table.lookup("/", "GET").unwrap().0.name(), "index");
        assert_eq!(table.lookup("/shop", "GET").unwrap().0.name(), "list");
        assert_eq!(table.lookup("/shop/items", "POST").unwrap().0.name(), "add");
    }

    #[test]
    fn malformed_template_fails_build() {
        let err = Router::new().get("/items/{id", handle("broken")).build().unwrap_err();
        assert!(matches!(err, PatternError::Unterminated { .. }));
    }
}
