//! HTTP host and graceful shutdown.
//!
//! The host does everything the dispatch core leaves to its surroundings:
//!
//! 1. Reads the body (up to `http.max_body_size`, else 413).
//! 2. Parses the query string, urlencoded forms and multipart forms into
//!    [`Params`] and [`FilePart`]s.
//! 3. Loads the client's session from the cookie.
//! 4. Runs [`Dispatcher::handle`] on the blocking pool.
//! 5. Renders a forward through the [`ViewRenderer`], or an unrouted path
//!    from the document root, else the 404 page.
//! 6. Saves the session and sets the cookie for a new one.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** or **Ctrl-C** the server stops accepting connections, lets
//! every in-flight connection finish, then returns from [`Server::serve`].

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use url::form_urlencoded;

use crate::config::Config;
use crate::dispatch::{self, Outcome};
use crate::dispatcher::Dispatcher;
use crate::error::Error;
use crate::request::{FilePart, Params, Request};
use crate::response::Response;
use crate::session::SessionStore;
use crate::static_files::{self, FileViews, ViewRenderer};
use crate::status::Status;
use crate::table::RouteTable;
use crate::upload::UploadCollector;

/// Shared state of a running server.
struct App {
    dispatcher: Arc<Dispatcher>,
    sessions: SessionStore,
    views: Box<dyn ViewRenderer>,
    document_root: PathBuf,
    cookie_name: String,
    max_body_size: usize,
}

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    config: Config,
    views: Box<dyn ViewRenderer>,
}

impl Server {
    /// A server listening where `config` says, serving views from
    /// `paths.views`.
    pub fn from_config(config: Config) -> Result<Self, Error> {
        let addr = config.socket_addr()?;
        let views = Box::new(FileViews::new(&config.paths.views));
        Ok(Self { addr, config, views })
    }

    /// Replaces the view renderer.
    pub fn with_views(mut self, views: impl ViewRenderer + 'static) -> Self {
        self.views = Box::new(views);
        self
    }

    /// A dispatcher over `routes` that stores uploads where the config says.
    pub fn dispatcher(&self, routes: RouteTable) -> Arc<Dispatcher> {
        Arc::new(Dispatcher::new(routes, UploadCollector::new(&self.config.paths.uploads)))
    }

    /// Serves `routes` until shutdown.
    pub async fn serve(self, routes: RouteTable) -> Result<(), Error> {
        let dispatcher = self.dispatcher(routes);
        self.serve_dispatcher(dispatcher).await
    }

    /// Serves through an existing dispatcher, so the caller can keep a
    /// handle to [`Dispatcher::reload`] it.
    ///
    /// Returns only after a full graceful shutdown.
    pub async fn serve_dispatcher(self, dispatcher: Arc<Dispatcher>) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        let app = Arc::new(App {
            dispatcher,
            sessions: SessionStore::with_idle_timeout(self.config.session.idle_timeout()),
            views: self.views,
            document_root: self.config.paths.document_root,
            cookie_name: self.config.session.cookie_name,
            max_body_size: self.config.http.max_body_size,
        });

        info!(addr = %self.addr, "switchyard listening");

        let sweeper = tokio::spawn(sweep_sessions(Arc::clone(&app)));

        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting at once.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = Arc::clone(&app);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let app = Arc::clone(&app);
                            async move { handle(app, req).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}
        sweeper.abort();

        info!("switchyard stopped");
        Ok(())
    }
}

/// Evicts idle sessions once per idle timeout (at least once a second).
async fn sweep_sessions(app: Arc<App>) {
    let period = app.sessions.idle_timeout().max(Duration::from_secs(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        app.sessions.evict_idle();
    }
}

// ── Request handling ──────────────────────────────────────────────────────────

/// Turns one hyper request into one response. Every failure becomes a
/// status code, so hyper never sees an error.
async fn handle(
    app: Arc<App>,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (head, body) = req.into_parts();
    let method = head.method.as_str().to_owned();
    let path = head.uri.path().to_owned();

    let body = match Limited::new(body, app.max_body_size).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            warn!(%method, %path, limit = app.max_body_size, "request body too large");
            let resp = Response::builder().status(Status::ContentTooLarge).text("Content Too Large");
            return Ok(resp.into_inner());
        }
        Err(e) => {
            debug!(%method, %path, "reading request body: {e}");
            return Ok(Response::status(Status::BadRequest).into_inner());
        }
    };

    let headers: Vec<(String, String)> = head
        .headers
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_owned(), v.to_owned())))
        .collect();
    let header = |name: &str| {
        headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.clone())
    };

    let mut params = Params::new();
    if let Some(query) = head.uri.query() {
        append_urlencoded(&mut params, query.as_bytes());
    }

    let mut parts = Vec::new();
    let content_type = header("content-type").unwrap_or_default();
    let media_type = content_type.to_ascii_lowercase();
    if media_type.starts_with("application/x-www-form-urlencoded") {
        append_urlencoded(&mut params, &body);
    } else if media_type.starts_with("multipart/form-data") {
        if let Err(e) = read_multipart(&content_type, body, &mut params, &mut parts).await {
            debug!(%method, %path, "malformed multipart body: {e}");
            return Ok(Response::builder().status(Status::BadRequest).text("Bad Request").into_inner());
        }
    }

    let cookie = header("cookie").and_then(|raw| cookie_value(&raw, &app.cookie_name));
    let (session_id, session, fresh) = app.sessions.load(cookie.as_deref());

    let mut request = Request::new(method, path).with_params(params).with_session(session);
    request.headers = headers;
    request.parts = parts;

    let worker = Arc::clone(&app);
    let joined = tokio::task::spawn_blocking(move || {
        let outcome = worker.dispatcher.handle(&mut request);
        let response = resolve(&worker, outcome, &request);
        (response, request.into_session())
    })
    .await;

    let (mut response, session) = match joined {
        Ok(done) => done,
        Err(e) => {
            error!("dispatch task failed: {e}");
            return Ok(dispatch::server_error().into_inner());
        }
    };

    // A new client gets a cookie only once something is stored for it.
    if !fresh || !session.is_empty() {
        app.sessions.save(session_id.clone(), session);
        if fresh {
            response.push_header("set-cookie", format!("{}={session_id}; Path=/; HttpOnly", app.cookie_name));
        }
    }

    Ok(response.into_inner())
}

/// Final response for an outcome: forwards go to the view renderer, unrouted
/// paths to the document root, and anything left to the 404 page.
fn resolve(app: &App, outcome: Outcome, request: &Request) -> Response {
    match outcome {
        Outcome::Respond(response) => response,
        Outcome::Forward(forward) => app.views.render(&forward).unwrap_or_else(|| {
            warn!(view = forward.path(), "forwarded view not found");
            dispatch::not_found_page(forward.path(), request.method())
        }),
        Outcome::Unrouted => static_files::serve(&app.document_root, request.path())
            .unwrap_or_else(|| dispatch::not_found_page(request.path(), request.method())),
    }
}

fn append_urlencoded(params: &mut Params, raw: &[u8]) {
    for (name, value) in form_urlencoded::parse(raw) {
        params.append(name.into_owned(), value.into_owned());
    }
}

/// Collects every part; text fields (no filename) are also parameters.
async fn read_multipart(
    content_type: &str,
    body: Bytes,
    params: &mut Params,
    parts: &mut Vec<FilePart>,
) -> Result<(), multer::Error> {
    let boundary = multer::parse_boundary(content_type)?;
    let stream = stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let is_file = field.file_name().is_some();
        let headers: Vec<(String, String)> = field
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_owned(), v.to_owned())))
            .collect();
        let bytes = field.bytes().await?;

        if !is_file {
            params.append(name.clone(), String::from_utf8_lossy(&bytes).into_owned());
        }
        parts.push(FilePart::new(name, headers, bytes));
    }
    Ok(())
}

/// The value of cookie `name` in a `Cookie` header.
fn cookie_value(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim().to_owned())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or Ctrl-C. A signal that cannot be
/// installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_named_cookie() {
        let header = "theme=dark; SWITCHYARDSESSID=abc123 ; other=1";
        assert_eq!(cookie_value(header, "SWITCHYARDSESSID").as_deref(), Some("abc123"));
        assert_eq!(cookie_value(header, "missing"), None);
    }

    #[test]
    fn urlencoded_values_accumulate() {
        let mut params = Params::new();
        append_urlencoded(&mut params, b"tag=a&tag=b&q=hello+world&e=%C3%A9");
        assert_eq!(params.values("tag").unwrap(), ["a", "b"]);
        assert_eq!(params.first("q"), Some("hello world"));
        assert_eq!(params.first("e"), Some("é"));
    }

    #[tokio::test]
    async fn multipart_fields_become_params_and_parts() {
        let body = concat!(
            "--XYZ\r\n",
            "Content-Disposition: form-data; name=\"title\"\r\n\r\n",
            "hello\r\n",
            "--XYZ\r\n",
            "Content-Disposition: form-data; name=\"doc\"; filename=\"a.txt\"\r\n",
            "Content-Type: text/plain\r\n\r\n",
            "file body\r\n",
            "--XYZ--\r\n",
        );
        let mut params = Params::new();
        let mut parts = Vec::new();
        read_multipart("multipart/form-data; boundary=XYZ", Bytes::from_static(body.as_bytes()), &mut params, &mut parts)
            .await
            .unwrap();

        assert_eq!(params.first("title"), Some("hello"));
        assert!(params.first("doc").is_none());
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].name(), "doc");
        assert_eq!(parts[1].body(), &Bytes::from_static(b"file body"));
        assert!(parts[1].header("content-disposition").unwrap().contains("a.txt"));
    }
}
