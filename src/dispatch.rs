//! Turning an action's result into what the host sends back.
//!
//! | Result                         | Outcome                                   |
//! |--------------------------------|-------------------------------------------|
//! | invocation failed              | 500 text                                  |
//! | any result, forced JSON        | 200 JSON envelope (500 envelope on error) |
//! | `PlainText`                    | 200 text echo naming the action           |
//! | `StructuredView`               | forward to `/<view>` with attributes      |
//! | `Unclassified`                 | 200 text: unsupported return type         |

use serde_json::Value;
use tracing::{debug, error};

use crate::DataMap;
use crate::envelope::{self, Envelope};
use crate::error::{ConversionError, InvocationError};
use crate::handler::{ActionHandle, ModelView, ResponseMode};
use crate::invoker::ActionResult;
use crate::request::Request;
use crate::response::{ContentType, Response};
use crate::status::Status;

/// View data key whose object value replaces the whole session.
pub const SESSION_DATA_KEY: &str = "sessionData";

pub(crate) const BAD_REQUEST_BODY: &str = "Bad Request: a request value could not be converted";
pub(crate) const SERVER_ERROR_BODY: &str = "Internal Server Error: the action failed";

/// A request handed on to a view.
#[derive(Clone, Debug, PartialEq)]
pub struct Forward {
    path: String,
    attributes: DataMap,
}

impl Forward {
    /// Forwards to `/` followed by `view`, taken as is: `"/page"` forwards to
    /// `//page`.
    pub fn new(view: &str, attributes: DataMap) -> Self {
        Self { path: format!("/{view}"), attributes }
    }

    /// `/` followed by the view name.
    pub fn path(&self) -> &str { &self.path }

    /// The request attributes at the time of the forward.
    pub fn attributes(&self) -> &DataMap { &self.attributes }
}

/// What the host does with a request after dispatch.
#[derive(Debug)]
pub enum Outcome {
    /// Send this response.
    Respond(Response),
    /// Render this view.
    Forward(Forward),
    /// No route matched; try static files, then the 404 page.
    Unrouted,
}

impl Outcome {
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Respond(r) => Some(r),
            _ => None,
        }
    }

    pub fn forward(&self) -> Option<&Forward> {
        match self {
            Self::Forward(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_unrouted(&self) -> bool { matches!(self, Self::Unrouted) }
}

/// Renders the outcome of invoking `handle`.
///
/// A view result may replace the session and always sets request
/// attributes, hence `&mut Request`.
pub fn render(
    handle: &ActionHandle,
    result: Result<ActionResult, InvocationError>,
    request: &mut Request,
) -> Outcome {
    let result = match result {
        Ok(r) => r,
        Err(_) => return Outcome::Respond(server_error()),
    };

    if handle.response_mode() == ResponseMode::ForceJson {
        return Outcome::Respond(json(&result));
    }

    match result {
        ActionResult::PlainText(text) => Outcome::Respond(Response::text(format!(
            "Controller: {}\nAction: {}\nReturned: {}\n",
            handle.controller(),
            handle.name(),
            text,
        ))),
        ActionResult::StructuredView(view) => Outcome::Forward(forward(view, request)),
        ActionResult::Unclassified(payload) => Outcome::Respond(Response::text(format!(
            "Unsupported return type `{}`: an action must return text or a view.\n",
            payload.type_name(),
        ))),
    }
}

/// 400 for a request value that did not convert. The detail is only logged.
pub fn bad_request(handle: &ActionHandle, err: &ConversionError) -> Response {
    debug!(controller = handle.controller(), action = handle.name(), "bad request: {err}");
    Response::builder().status(Status::BadRequest).text(BAD_REQUEST_BODY)
}

pub fn server_error() -> Response {
    Response::builder().status(Status::InternalServerError).text(SERVER_ERROR_BODY)
}

/// Wraps `result` in the envelope; falls back to a 500 envelope, then to a
/// fixed literal.
fn json(result: &ActionResult) -> Response {
    match Envelope::success(result).and_then(|e| e.to_bytes()) {
        Ok(body) => Response::json(body),
        Err(e) => {
            error!("encoding the JSON envelope: {e}");
            let body = Envelope::error(format!("server error: {e}"))
                .to_bytes()
                .unwrap_or_else(|_| envelope::FALLBACK.as_bytes().to_vec());
            Response::builder()
                .status(Status::InternalServerError)
                .bytes(ContentType::Json, body)
        }
    }
}

/// Copies view data onto the request, replacing the session from
/// [`SESSION_DATA_KEY`] when it holds an object.
fn forward(view: ModelView, request: &mut Request) -> Forward {
    let (view, data) = view.into_parts();
    for (key, value) in data {
        if key == SESSION_DATA_KEY {
            if let Value::Object(entries) = &value {
                debug!(keys = entries.len(), "session replaced from view data");
                request.session_mut().replace_all(entries.clone());
            }
        }
        request.set_attribute(key, value);
    }
    Forward::new(&view, request.attributes().clone())
}

/// HTML page naming the path and method nothing was registered for.
pub fn not_found_page(path: &str, method: &str) -> Response {
    let body = format!(
        "<!DOCTYPE html>\n<html>\n<head><title>404 Not Found</title></head>\n<body>\n\
         <h1>404 Not Found</h1>\n\
         <p>No action is mapped to <code>{}</code> for method <code>{}</code>.</p>\n\
         </body>\n</html>\n",
        escape_html(path),
        escape_html(method),
    );
    Response::builder()
        .status(Status::NotFound)
        .bytes(ContentType::Html, body)
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
