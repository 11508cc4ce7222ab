//! Outgoing HTTP response type.
//!
//! Build a [`Response`] with a shortcut or the builder; the host turns it
//! into a hyper response with [`Response::into_inner`].

use bytes::Bytes;
use http_body_util::Full;
use tracing::error;

use crate::status::Status;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Content-type values the dispatcher and the static-file fallback emit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Css,          // text/css
    Gif,          // image/gif
    Html,         // text/html; charset=utf-8
    Icon,         // image/x-icon
    Javascript,   // application/javascript
    Jpeg,         // image/jpeg
    Json,         // application/json; charset=utf-8
    OctetStream,  // application/octet-stream
    Pdf,          // application/pdf
    Png,          // image/png
    Svg,          // image/svg+xml
    Text,         // text/plain; charset=utf-8
    Wasm,         // application/wasm
    Webp,         // image/webp
    Woff2,        // font/woff2
    Xml,          // application/xml
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Css         => "text/css",
            Self::Gif         => "image/gif",
            Self::Html        => "text/html; charset=utf-8",
            Self::Icon        => "image/x-icon",
            Self::Javascript  => "application/javascript",
            Self::Jpeg        => "image/jpeg",
            Self::Json        => "application/json; charset=utf-8",
            Self::OctetStream => "application/octet-stream",
            Self::Pdf         => "application/pdf",
            Self::Png         => "image/png",
            Self::Svg         => "image/svg+xml",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Wasm        => "application/wasm",
            Self::Webp        => "image/webp",
            Self::Woff2       => "font/woff2",
            Self::Xml         => "application/xml",
        }
    }

    /// Content type for a file extension, `OctetStream` when unknown.
    pub fn from_extension(extension: Option<&str>) -> Self {
        let ext = extension.map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("html" | "htm")  => Self::Html,
            Some("css")           => Self::Css,
            Some("txt" | "md")    => Self::Text,
            Some("xml")           => Self::Xml,
            Some("js" | "mjs")    => Self::Javascript,
            Some("json")          => Self::Json,
            Some("wasm")          => Self::Wasm,
            Some("png")           => Self::Png,
            Some("jpg" | "jpeg")  => Self::Jpeg,
            Some("gif")           => Self::Gif,
            Some("svg")           => Self::Svg,
            Some("ico")           => Self::Icon,
            Some("webp")          => Self::Webp,
            Some("woff2")         => Self::Woff2,
            Some("pdf")           => Self::Pdf,
            _                     => Self::OctetStream,
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK, no custom headers needed)
///
/// ```rust
/// use switchyard::{Response, Status};
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(Status::NotFound);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use switchyard::{ContentType, Response, Status};
///
/// Response::builder()
///     .status(Status::BadRequest)
///     .text("Bad Request");
///
/// Response::builder()
///     .header("set-cookie", "SWITCHYARDSESSID=abc; Path=/")
///     .bytes(ContentType::Html, b"<p>ok</p>".to_vec());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub(crate) body: Bytes,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: u16,
}

impl Response {
    /// `200 OK`, `application/json`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::builder().bytes(ContentType::Json, body)
    }

    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// `200 OK`, `text/html; charset=utf-8`.
    pub fn html(body: impl Into<String>) -> Self {
        let body: String = body.into();
        Self::builder().bytes(ContentType::Html, body)
    }

    /// Response with no body.
    pub fn status(code: Status) -> Self {
        Self::builder().status(code).no_body()
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: Status::Ok.into() }
    }

    pub fn status_code(&self) -> u16 { self.status }
    pub fn body(&self) -> &Bytes { &self.body }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Body as UTF-8 text, lossily.
    pub fn text_body(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn push_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Converts to the hyper response the host writes to the wire.
    pub fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder.body(Full::new(self.body)).unwrap_or_else(|e| {
            error!("invalid response head: {e}");
            let mut fallback = http::Response::new(Full::new(Bytes::new()));
            *fallback.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `Status::Ok` (200).
/// Terminated by a typed body method.
#[derive(Debug)]
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: u16,
}

impl ResponseBuilder {
    pub fn status(mut self, code: Status) -> Self {
        self.status = code.into();
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        let body: String = body.into();
        self.finish(ContentType::Text, Bytes::from(body))
    }

    /// Terminate with a typed body.
    pub fn bytes(self, content_type: ContentType, body: impl Into<Bytes>) -> Response {
        self.finish(content_type, body.into())
    }

    /// Terminate with no body.
    pub fn no_body(self) -> Response {
        Response { body: Bytes::new(), headers: self.headers, status: self.status }
    }

    fn finish(self, content_type: ContentType, body: Bytes) -> Response {
        let mut headers = vec![("content-type".to_owned(), content_type.as_str().to_owned())];
        headers.extend(self.headers);
        Response { body, headers, status: self.status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_status_and_headers() {
        let resp = Response::builder()
            .status(Status::BadRequest)
            .header("x-trace", "1")
            .text("nope");
        assert_eq!(resp.status_code(), 400);
        assert_eq!(resp.content_type(), Some("text/plain; charset=utf-8"));
        assert_eq!(resp.header("X-Trace"), Some("1"));
        assert_eq!(resp.text_body(), "nope");
    }

    #[test]
    fn converts_to_hyper_response() {
        let inner = Response::html("<p>hi</p>").into_inner();
        assert_eq!(inner.status(), http::StatusCode::OK);
        assert_eq!(inner.headers()["content-type"], "text/html; charset=utf-8");
    }

    #[test]
    fn extensions_map_to_content_types() {
        assert_eq!(ContentType::from_extension(Some("HTML")), ContentType::Html);
        assert_eq!(ContentType::from_extension(Some("png")), ContentType::Png);
        assert_eq!(ContentType::from_extension(Some("xyz")), ContentType::OctetStream);
        assert_eq!(ContentType::from_extension(None), ContentType::OctetStream);
    }
}
