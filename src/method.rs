//! HTTP method as a typed enum.
//!
//! Routes bind to one of the four methods a controller action can declare.
//! Requests keep their raw method string; any other verb (`HEAD`, `OPTIONS`,
//! …) simply never matches a route and falls through to static files or 404.

use std::fmt;
use std::str::FromStr;

/// A method a route can be registered for.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Delete,
    Get,
    Post,
    Put,
}

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Get    => "GET",
            Self::Post   => "POST",
            Self::Put    => "PUT",
        }
    }

    /// Case-insensitive comparison with a raw request method.
    pub fn matches(self, raw: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(raw)
    }
}

/// Parses a method name, ignoring case (`"get"`, `"Get"` and `"GET"` agree).
impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Delete, Self::Get, Self::Post, Self::Put]
            .into_iter()
            .find(|m| m.matches(s))
            .ok_or(())
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ignores_case() {
        assert_eq!("get".parse(), Ok(Method::Get));
        assert_eq!("Delete".parse(), Ok(Method::Delete));
        assert_eq!("PATCH".parse::<Method>(), Err(()));
    }

    #[test]
    fn matches_raw_method() {
        assert!(Method::Post.matches("post"));
        assert!(!Method::Post.matches("GET"));
    }
}
