//! One request through the whole pipeline: look up, bind, invoke, render.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::debug;

use crate::binder::ArgumentBinder;
use crate::dispatch::{self, Outcome};
use crate::invoker;
use crate::request::Request;
use crate::table::RouteTable;
use crate::upload::UploadCollector;

/// Routes requests to actions.
///
/// The route table sits behind an [`ArcSwap`]: [`reload`](Dispatcher::reload)
/// publishes a whole new table at once and each request sees either the old
/// one or the new one, never a mix.
#[derive(Debug)]
pub struct Dispatcher {
    routes: ArcSwap<RouteTable>,
    binder: ArgumentBinder,
}

impl Dispatcher {
    pub fn new(routes: RouteTable, uploads: UploadCollector) -> Self {
        Self {
            routes: ArcSwap::new(Arc::new(routes)),
            binder: ArgumentBinder::new(uploads),
        }
    }

    /// Replaces the route table for every later request.
    pub fn reload(&self, routes: RouteTable) {
        debug!(routes = routes.len(), "route table swapped");
        self.routes.store(Arc::new(routes));
    }

    /// The table in effect right now.
    pub fn routes(&self) -> Arc<RouteTable> {
        self.routes.load_full()
    }

    /// Handles one request.
    ///
    /// Never fails: a bad request value is a 400, a failed action a 500, and
    /// an unknown path [`Outcome::Unrouted`].
    pub fn handle(&self, request: &mut Request) -> Outcome {
        let Some((handle, path_vars)) = self.routes.load().lookup(request.path(), request.method()) else {
            debug!(method = request.method(), path = request.path(), "no route");
            return Outcome::Unrouted;
        };
        debug!(
            method = request.method(),
            path = request.path(),
            controller = handle.controller(),
            action = handle.name(),
            "route matched",
        );

        let args = match self.binder.bind(&handle, request, &path_vars) {
            Ok(args) => args,
            Err(e) => return Outcome::Respond(dispatch::bad_request(&handle, &e)),
        };

        let result = invoker::invoke(&handle, args);
        dispatch::render(&handle, result, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::BoundArguments;
    use crate::handler::{ActionHandle, Reply};
    use crate::router::Router;

    #[derive(Default)]
    struct Ping;

    fn table(reply: &'static str) -> RouteTable {
        Router::new()
            .get("/ping", ActionHandle::new("ping", move |_: &mut Ping, _: BoundArguments| Reply::text(reply)))
            .build()
            .unwrap()
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(table("pong"), UploadCollector::new(std::env::temp_dir()))
    }

    #[test]
    fn unknown_path_is_unrouted() {
        let mut req = Request::new("GET", "/missing");
        assert!(dispatcher().handle(&mut req).is_unrouted());
    }

    #[test]
    fn reload_swaps_the_table() {
        let d = dispatcher();
        let mut req = Request::new("GET", "/ping");
        assert!(d.handle(&mut req).response().unwrap().text_body().contains("Returned: pong"));

        d.reload(table("PONG"));
        let mut req = Request::new("GET", "/ping");
        assert!(d.handle(&mut req).response().unwrap().text_body().contains("Returned: PONG"));
    }
}
