//! Incoming request as the dispatch core sees it.
//!
//! The host fills a [`Request`] from the wire (query string, form body,
//! multipart parts, session cookie). Everything downstream only reads these
//! already-parsed pieces, so the core never touches sockets or encodings.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde_json::Value;

use crate::DataMap;
use crate::session::Session;

// ── Params ────────────────────────────────────────────────────────────────────

/// Query and form parameters: each name maps to one or more values, in the
/// order they arrived.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params(BTreeMap<String, Vec<String>>);

impl Params {
    pub fn new() -> Self { Self::default() }

    /// Adds a value, keeping any earlier values under the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.entry(name.into()).or_default().push(value.into());
    }

    /// The first value for `name`, as a single-valued lookup would return.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.append(k, v);
        }
        params
    }
}

// ── FilePart ──────────────────────────────────────────────────────────────────

/// One already-parsed part of a `multipart/form-data` body.
///
/// Plain form fields sent as parts are `FilePart`s too; they simply carry no
/// `filename` in their `content-disposition` header.
#[derive(Clone, Debug)]
pub struct FilePart {
    name: String,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl FilePart {
    pub fn new(name: impl Into<String>, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self { name: name.into(), headers, body: body.into() }
    }

    /// A part as a browser sends it for `<input type="file">`.
    pub fn file(name: &str, filename: &str, body: impl Into<Bytes>) -> Self {
        let disposition = format!(r#"form-data; name="{name}"; filename="{filename}""#);
        Self::new(name, vec![("content-disposition".to_owned(), disposition)], body)
    }

    /// A part without a filename (a text field in a multipart form).
    pub fn field(name: &str, body: impl Into<Bytes>) -> Self {
        let disposition = format!(r#"form-data; name="{name}""#);
        Self::new(name, vec![("content-disposition".to_owned(), disposition)], body)
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn body(&self) -> &Bytes { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// ── Request ───────────────────────────────────────────────────────────────────

/// An incoming HTTP request, scoped to one pass through the dispatcher.
///
/// Request attributes start empty and are filled by a view result; the host
/// hands them to the forwarded view. The session is this request's copy of
/// the client's session; the host persists it afterwards.
#[derive(Debug)]
pub struct Request {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) params: Params,
    pub(crate) parts: Vec<FilePart>,
    pub(crate) attributes: DataMap,
    pub(crate) session: Session,
}

impl Request {
    /// A request with no parameters, parts or session data. An empty path is
    /// normalized to `/`.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            method: method.into(),
            path: if path.is_empty() { "/".to_owned() } else { path },
            headers: Vec::new(),
            params: Params::new(),
            parts: Vec::new(),
            attributes: DataMap::new(),
            session: Session::default(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.append(name, value);
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        for (name, values) in params.iter() {
            for value in values {
                self.params.append(name, value.as_str());
            }
        }
        self
    }

    pub fn with_part(mut self, part: FilePart) -> Self {
        self.parts.push(part);
        self
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn params(&self) -> &Params { &self.params }
    pub fn parts(&self) -> &[FilePart] { &self.parts }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the first value of a query or form parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.first(name)
    }

    /// Request-scoped attribute, visible to a forwarded view.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn attributes(&self) -> &DataMap { &self.attributes }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: Value) {
        self.attributes.insert(key.into(), value);
    }

    pub fn session(&self) -> &Session { &self.session }
    pub fn session_mut(&mut self) -> &mut Session { &mut self.session }

    /// Gives the session back to the host once dispatch is over.
    pub fn into_session(self) -> Session { self.session }
}
