//! Controller actions and type erasure.
//!
//! # How actions are stored
//!
//! The route table holds actions of many controller types side by side, so
//! each action is hidden behind a trait object (`dyn ErasedAction`):
//!
//! ```text
//! fn show(&mut self, args: BoundArguments) -> Result<Reply, ActionError>
//!        ↓ ActionHandle::new("show", Users::show)
//! Users::show.into_boxed_action()                  ← Action blanket impl
//!        ↓
//! Arc::new(FnAction { f: Users::show, .. })        ← heap-allocated wrapper
//!        ↓  stored as BoxedAction = Arc<dyn ErasedAction>
//! action.call(args)  at request time               ← one vtable dispatch
//!        ↓
//! Users::default() then show(&mut users, args).into_reply()
//! ```
//!
//! A fresh controller is built with `Default` for every call; controllers
//! hold no state between requests.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::DataMap;
use crate::args::BoundArguments;
use crate::binder::ParameterSpec;
use crate::error::ActionError;

// ── Internal types ────────────────────────────────────────────────────────────

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` because it appears in the return type of the public
/// `Action` trait's `into_boxed_action` method.
#[doc(hidden)]
pub trait ErasedAction {
    fn call(&self, args: BoundArguments) -> Result<Reply, ActionError>;
}

/// A type-erased action shared by every request routed to it.
#[doc(hidden)]
pub type BoxedAction = Arc<dyn ErasedAction + Send + Sync + 'static>;

// ── Public Action trait ───────────────────────────────────────────────────────

/// Implemented for every valid action of controller `C`.
///
/// Satisfied automatically by any function or closure shaped like
///
/// ```text
/// fn name(&mut C, BoundArguments) -> impl IntoReply
/// ```
///
/// where `C: Default`. The trait is sealed; only the blanket impl below can
/// satisfy it.
pub trait Action<C>: private::Sealed<C> + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_action(self) -> BoxedAction;
}

mod private {
    pub trait Sealed<C> {}
}

impl<C, F, R> private::Sealed<C> for F
where
    C: Default + 'static,
    F: Fn(&mut C, BoundArguments) -> R + Send + Sync + 'static,
    R: IntoReply,
{
}

impl<C, F, R> Action<C> for F
where
    C: Default + 'static,
    F: Fn(&mut C, BoundArguments) -> R + Send + Sync + 'static,
    R: IntoReply,
{
    fn into_boxed_action(self) -> BoxedAction {
        Arc::new(FnAction { f: self, _controller: PhantomData })
    }
}

/// Holds a concrete action `F` of controller `C` and implements
/// [`ErasedAction`] for it.
struct FnAction<C, F> {
    f: F,
    _controller: PhantomData<fn() -> C>,
}

impl<C, F, R> ErasedAction for FnAction<C, F>
where
    C: Default,
    F: Fn(&mut C, BoundArguments) -> R,
    R: IntoReply,
{
    fn call(&self, args: BoundArguments) -> Result<Reply, ActionError> {
        let mut controller = C::default();
        (self.f)(&mut controller, args).into_reply()
    }
}

// ── ActionHandle ──────────────────────────────────────────────────────────────

/// How an action's return value is rendered.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ResponseMode {
    /// Text is echoed, a view is forwarded, anything else is unsupported.
    #[default]
    Auto,
    /// Every return value is wrapped in the JSON envelope.
    ForceJson,
}

/// A registered action: its controller, its declared parameters and how its
/// result is rendered.
///
/// ```rust
/// use switchyard::{ActionError, ActionHandle, BoundArguments, ParameterSpec, Reply, ScalarType};
///
/// #[derive(Default)]
/// struct Users;
///
/// impl Users {
///     fn show(&mut self, args: BoundArguments) -> Result<Reply, ActionError> {
///         Ok(Reply::text(format!("user {}", args.int(0)?.unwrap_or_default())))
///     }
/// }
///
/// let handle = ActionHandle::new("show", Users::show)
///     .param(ParameterSpec::path_var("id", ScalarType::Int))
///     .json();
/// ```
pub struct ActionHandle {
    controller: &'static str,
    name: String,
    params: Vec<ParameterSpec>,
    mode: ResponseMode,
    roles: Vec<String>,
    action: BoxedAction,
}

impl ActionHandle {
    pub fn new<C: Default + 'static>(name: impl Into<String>, action: impl Action<C>) -> Self {
        Self {
            controller: short_type_name::<C>(),
            name: name.into(),
            params: Vec::new(),
            mode: ResponseMode::Auto,
            roles: Vec::new(),
            action: action.into_boxed_action(),
        }
    }

    /// Declares the next positional parameter.
    pub fn param(mut self, spec: ParameterSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Renders every return value as a JSON envelope.
    pub fn json(mut self) -> Self {
        self.mode = ResponseMode::ForceJson;
        self
    }

    /// Records the roles allowed to call this action. Informational only;
    /// nothing checks them.
    pub fn authorized<S: Into<String>>(mut self, roles: impl IntoIterator<Item = S>) -> Self {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn controller(&self) -> &'static str { self.controller }
    pub fn name(&self) -> &str { &self.name }
    pub fn params(&self) -> &[ParameterSpec] { &self.params }
    pub fn response_mode(&self) -> ResponseMode { self.mode }
    pub fn roles(&self) -> &[String] { &self.roles }

    pub(crate) fn call(&self, args: BoundArguments) -> Result<Reply, ActionError> {
        self.action.call(args)
    }
}

impl fmt::Debug for ActionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionHandle")
            .field("controller", &self.controller)
            .field("name", &self.name)
            .field("params", &self.params)
            .field("mode", &self.mode)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

/// `my_app::controllers::Users` → `Users`.
fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

// ── Reply ─────────────────────────────────────────────────────────────────────

/// A view name plus the data handed to it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelView {
    view: String,
    data: DataMap,
}

impl ModelView {
    pub fn new(view: impl Into<String>) -> Self {
        Self { view: view.into(), data: DataMap::new() }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn view(&self) -> &str { &self.view }
    pub fn data(&self) -> &DataMap { &self.data }

    pub fn into_parts(self) -> (String, DataMap) {
        (self.view, self.data)
    }
}

trait ToJson {
    fn to_json(&self) -> serde_json::Result<Value>;
}

impl<T: Serialize> ToJson for T {
    fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// Any serializable value returned by an action.
pub struct Payload {
    type_name: &'static str,
    value: Box<dyn ToJson + Send>,
}

impl Payload {
    pub fn new<T: Serialize + Send + 'static>(value: T) -> Self {
        Self { type_name: short_type_name::<T>(), value: Box::new(value) }
    }

    pub fn type_name(&self) -> &'static str { self.type_name }

    pub fn to_json(&self) -> serde_json::Result<Value> {
        self.value.to_json()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Payload").field(&self.type_name).finish()
    }
}

/// What an action hands back to the dispatcher.
#[derive(Debug)]
pub enum Reply {
    Text(String),
    View(ModelView),
    Data(Payload),
}

impl Reply {
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text(body.into())
    }

    pub fn view(view: ModelView) -> Self {
        Self::View(view)
    }

    pub fn data<T: Serialize + Send + 'static>(value: T) -> Self {
        Self::Data(Payload::new(value))
    }
}

// ── IntoReply ─────────────────────────────────────────────────────────────────

/// Conversion of an action's return value into a [`Reply`].
pub trait IntoReply {
    fn into_reply(self) -> Result<Reply, ActionError>;
}

/// Wraps any serializable value as an action return.
pub struct Data<T>(pub T);

impl IntoReply for Reply {
    fn into_reply(self) -> Result<Reply, ActionError> { Ok(self) }
}

impl IntoReply for String {
    fn into_reply(self) -> Result<Reply, ActionError> { Ok(Reply::Text(self)) }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Result<Reply, ActionError> { Ok(Reply::text(self)) }
}

impl IntoReply for ModelView {
    fn into_reply(self) -> Result<Reply, ActionError> { Ok(Reply::View(self)) }
}

/// An action with nothing to return renders as `null`.
impl IntoReply for () {
    fn into_reply(self) -> Result<Reply, ActionError> { Ok(Reply::data(Value::Null)) }
}

impl<T: Serialize + Send + 'static> IntoReply for Data<T> {
    fn into_reply(self) -> Result<Reply, ActionError> { Ok(Reply::data(self.0)) }
}

impl<R, E> IntoReply for Result<R, E>
where
    R: IntoReply,
    E: Into<ActionError>,
{
    fn into_reply(self) -> Result<Reply, ActionError> {
        self.map_err(Into::into)?.into_reply()
    }
}
