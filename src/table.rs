//! Ordered route table.
//!
//! Lookup scans entries in registration order and returns the first whose
//! pattern matches, so a literal route registered before an overlapping
//! `{placeholder}` route wins, and vice versa.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::handler::ActionHandle;
use crate::pattern::PathPattern;

/// `(pattern → action)` pairs in registration order.
#[derive(Debug, Default)]
pub struct RouteTable {
    entries: Vec<(PathPattern, Arc<ActionHandle>)>,
}

impl RouteTable {
    pub fn new() -> Self { Self::default() }

    /// Adds a route. An equal pattern (same template shape and method) keeps
    /// its position and takes the new action.
    pub fn register(&mut self, pattern: PathPattern, handle: Arc<ActionHandle>) {
        if let Some(entry) = self.entries.iter_mut().find(|(p, _)| *p == pattern) {
            warn!(
                method = %pattern.method(),
                path = pattern.template(),
                previous = %format_args!("{}::{}", entry.1.controller(), entry.1.name()),
                "route registered twice, keeping the later action",
            );
            entry.1 = handle;
            return;
        }
        self.entries.push((pattern, handle));
    }

    /// First action whose pattern matches, with its path variables.
    pub fn lookup(&self, path: &str, method: &str) -> Option<(Arc<ActionHandle>, HashMap<String, String>)> {
        self.entries
            .iter()
            .find(|(pattern, _)| pattern.matches(path, method))
            .map(|(pattern, handle)| (Arc::clone(handle), pattern.extract_parameters(path)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathPattern, &ActionHandle)> {
        self.entries.iter().map(|(p, h)| (p, h.as_ref()))
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::BoundArguments;
    use crate::handler::Reply;
    use crate::method::Method;

    #[derive(Default)]
    struct Items;

    fn action(name: &str) -> Arc<ActionHandle> {
        Arc::new(ActionHandle::new(name, |_: &mut Items, _: BoundArguments| Reply::text("")))
    }

    fn pattern(template: &str, method: Method) -> PathPattern {
        PathPattern::compile(template, method).unwrap()
    }

    #[test]
    fn first_registered_match_wins() {
        let mut table = RouteTable::new();
        table.register(pattern("/items/new", Method::Get), action("fresh"));
        table.register(pattern("/items/{id}", Method::Get), action("show"));

        let (hit, vars) = table.lookup("/items/new", "GET").unwrap();
        assert_eq!(hit.name(), "fresh");
        assert!(vars.is_empty());

        let (hit, vars) = table.lookup("/items/9", "get").unwrap();
        assert_eq!(hit.name(), "show");
        assert_eq!(vars["id"], "9");
    }

    #[test]
    fn placeholder_first_shadows_literal() {
        let mut table = RouteTable::new();
        table.register(pattern("/items/{id}", Method::Get), action("show"));
        table.register(pattern("/items/new", Method::Get), action("fresh"));
        assert_eq!(table.lookup("/items/new", "GET").unwrap().0.name(), "show");
    }

    #[test]
    fn method_must_match() {
        let mut table = RouteTable::new();
        table.register(pattern("/items", Method::Get), action("list"));
        assert!(table.lookup("/items", "POST").is_none());
        assert!(table.lookup("/nothing", "GET").is_none());
    }

    #[test]
    fn duplicate_pattern_replaces_in_place() {
        let mut table = RouteTable::new();
        table.register(pattern("/a/{x}", Method::Get), action("old"));
        table.register(pattern("/b", Method::Get), action("b"));
        table.register(pattern("/a/{x}", Method::Get), action("new"));

        assert_eq!(table.len(), 2);
        let names: Vec<_> = table.iter().map(|(_, h)| h.name().to_owned()).collect();
        assert_eq!(names, ["new", "b"]);
    }
}
