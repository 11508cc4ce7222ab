//! Route templates compiled to anchored matchers.
//!
//! A template is literal path text with `{name}` placeholders:
//!
//! ```text
//! /users/{id}/posts/{slug}   →   ^/users/(?P<id>[^/]+)/posts/(?P<slug>[^/]+)$
//! ```
//!
//! Each placeholder captures one or more non-slash characters. Literal text is
//! escaped, so a `.` in a template matches only a dot. The matcher is anchored
//! at both ends: `/users/{id}` never matches `/users/42/edit`.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use regex::Regex;

use crate::error::PatternError;
use crate::method::Method;

/// A compiled route template bound to one HTTP method.
#[derive(Clone, Debug)]
pub struct PathPattern {
    template: String,
    method: Method,
    regex: Regex,
    names: Vec<String>,
}

impl PathPattern {
    /// Compiles `template` for `method`.
    ///
    /// Fails on an unterminated `{`, an empty `{}`, a name that is not an
    /// identifier, or a name used twice.
    pub fn compile(template: &str, method: Method) -> Result<Self, PatternError> {
        let mut source = String::from("^");
        let mut names: Vec<String> = Vec::new();
        let mut rest = template;
        let mut offset = 0;

        while let Some(open) = rest.find('{') {
            source.push_str(&regex::escape(&rest[..open]));

            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                return Err(PatternError::Unterminated {
                    template: template.to_owned(),
                    position: offset + open,
                });
            };

            let name = &after[..close];
            validate_name(template, name)?;
            if names.iter().any(|n| n == name) {
                return Err(PatternError::DuplicateName {
                    template: template.to_owned(),
                    name: name.to_owned(),
                });
            }
            source.push_str(&format!("(?P<{name}>[^/]+)"));
            names.push(name.to_owned());

            let consumed = open + 1 + close + 1;
            offset += consumed;
            rest = &rest[consumed..];
        }
        source.push_str(&regex::escape(rest));
        source.push('$');

        // Names are validated and literals escaped, so only the size limit
        // can still reject the expression.
        let regex = Regex::new(&source).map_err(|e| PatternError::Regex {
            template: template.to_owned(),
            message: e.to_string(),
        })?;

        Ok(Self { template: template.to_owned(), method, regex, names })
    }

    pub fn template(&self) -> &str { &self.template }
    pub fn method(&self) -> Method { self.method }

    /// Placeholder names in template order.
    pub fn param_names(&self) -> &[String] { &self.names }

    /// True iff `method` (any case) is this pattern's method and the whole of
    /// `path` matches the template.
    pub fn matches(&self, path: &str, method: &str) -> bool {
        self.method.matches(method) && self.regex.is_match(path)
    }

    /// Returns the captured value of every placeholder, keyed by name.
    ///
    /// Meant for a path already known to match; an empty map is returned
    /// otherwise.
    pub fn extract_parameters(&self, path: &str) -> HashMap<String, String> {
        let Some(caps) = self.regex.captures(path) else {
            return HashMap::new();
        };
        self.names
            .iter()
            .filter_map(|name| {
                caps.name(name).map(|m| (name.clone(), m.as_str().to_owned()))
            })
            .collect()
    }
}

fn validate_name(template: &str, name: &str) -> Result<(), PatternError> {
    if name.is_empty() {
        return Err(PatternError::EmptyPlaceholder { template: template.to_owned() });
    }
    let mut chars = name.chars();
    let head_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !head_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(PatternError::InvalidName {
            template: template.to_owned(),
            name: name.to_owned(),
        });
    }
    Ok(())
}

/// Two patterns are equal when they compile to the same matcher for the same
/// method; that is what makes them usable as a table key.
impl PartialEq for PathPattern {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method && self.regex.as_str() == other.regex.as_str()
    }
}

impl Eq for PathPattern {}

impl Hash for PathPattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.regex.as_str().hash(state);
        self.method.hash(state);
    }
}
