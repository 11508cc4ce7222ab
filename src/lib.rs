//! # switchyard
//!
//! A small MVC dispatch core: route a request to a controller action by
//! path pattern and method, bind the action's arguments from the request,
//! call it, and turn what it returns into a response.
//!
//! ## Pieces
//!
//! - [`PathPattern`] / [`RouteTable`]: `{name}` templates, first match wins.
//! - [`ArgumentBinder`]: path variables, query/form parameters, session,
//!   uploads and [`Descriptor`]-driven objects onto positional arguments.
//! - [`invoke`]: fresh controller per call; panics and errors are caught.
//! - [`render`]: JSON envelope, text echo, view forward, 400/500 pages.
//! - [`Dispatcher`]: all of the above behind one [`Dispatcher::handle`].
//! - [`Server`]: a hyper host that parses bodies, keeps sessions, serves
//!   views and static files.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use switchyard::{
//!     ActionError, ActionHandle, BoundArguments, Config, ModelView, ParameterSpec, Reply,
//!     Router, ScalarType, Server,
//! };
//!
//! #[derive(Default)]
//! struct Users;
//!
//! impl Users {
//!     fn show(&mut self, args: BoundArguments) -> Result<Reply, ActionError> {
//!         let id = args.int(0)?.unwrap_or_default();
//!         Ok(Reply::data(serde_json::json!({ "id": id })))
//!     }
//!
//!     fn profile(&mut self, _: BoundArguments) -> ModelView {
//!         ModelView::new("profile").with("name", "alice")
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), switchyard::Error> {
//!     let config = Config::load()?;
//!     switchyard::logging::init(&config.logging);
//!
//!     let routes = Router::new()
//!         .controller("/users", |c| c
//!             .get("/{id}", ActionHandle::new("show", Users::show)
//!                 .param(ParameterSpec::path_var("id", ScalarType::Int))
//!                 .json())
//!             .get("/me", ActionHandle::new("profile", Users::profile)))
//!         .build()?;
//!
//!     Server::from_config(config)?.serve(routes).await
//! }
//! ```

mod args;
mod binder;
mod convert;
mod dispatch;
mod dispatcher;
mod envelope;
mod error;
mod handler;
mod invoker;
mod method;
mod object;
mod pattern;
mod request;
mod response;
mod router;
mod server;
mod session;
mod static_files;
mod status;
mod table;
mod upload;

pub mod config;
pub mod logging;

/// String-keyed JSON values: session snapshots, parameter snapshots and view
/// data.
pub type DataMap = serde_json::Map<String, serde_json::Value>;

pub use args::{Arg, BoundArguments};
pub use binder::{ArgumentBinder, BindingSource, DeclaredType, ParameterSpec, param_snapshot};
pub use crate::config::Config;
pub use convert::{DATE_FORMAT, ScalarType, convert};
pub use dispatch::{Forward, Outcome, SESSION_DATA_KEY, bad_request, not_found_page, render, server_error};
pub use dispatcher::Dispatcher;
pub use envelope::{Envelope, FALLBACK as JSON_FALLBACK};
pub use error::{
    ActionError, ArgumentError, ConversionError, Error, InvocationError, PatternError,
    SerializationError, UploadError,
};
pub use handler::{Action, ActionHandle, Data, IntoReply, ModelView, Payload, Reply, ResponseMode};
pub use invoker::{ActionResult, invoke};
pub use method::Method;
pub use object::{Descriptor, ObjectBinder};
pub use pattern::PathPattern;
pub use request::{FilePart, Params, Request};
pub use response::{ContentType, Response, ResponseBuilder};
pub use router::{Router, Scope, join_paths};
pub use server::Server;
pub use session::{Session, SessionStore};
pub use static_files::{FileViews, ViewRenderer};
pub use status::Status;
pub use table::RouteTable;
pub use upload::{FileMap, UploadCollector, client_filename, sanitize};
