//! Calls an action and classifies what it returned.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error};

use crate::args::BoundArguments;
use crate::error::{ActionError, ArgumentError, InvocationError};
use crate::handler::{ActionHandle, ModelView, Payload, Reply};

/// An action's return value, sorted by how it is rendered.
#[derive(Debug)]
pub enum ActionResult {
    PlainText(String),
    StructuredView(ModelView),
    Unclassified(Payload),
}

impl From<Reply> for ActionResult {
    fn from(reply: Reply) -> Self {
        match reply {
            Reply::Text(text)   => Self::PlainText(text),
            Reply::View(view)   => Self::StructuredView(view),
            Reply::Data(value)  => Self::Unclassified(value),
        }
    }
}

/// Builds the controller, runs the action with `args` and classifies the
/// result.
///
/// A panic, an `Err` from the action, and an argument read with the wrong
/// accessor all come back as an [`InvocationError`].
pub fn invoke(handle: &ActionHandle, args: BoundArguments) -> Result<ActionResult, InvocationError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| handle.call(args)));

    let result = match outcome {
        Ok(Ok(reply)) => Ok(ActionResult::from(reply)),
        Ok(Err(e)) => Err(action_failed(handle, e)),
        Err(payload) => Err(InvocationError::Panicked {
            controller: handle.controller(),
            action: handle.name().to_owned(),
            message: panic_message(payload.as_ref()),
        }),
    };

    match &result {
        Ok(r) => debug!(controller = handle.controller(), action = handle.name(), result = ?r, "action returned"),
        Err(e) => error!(controller = handle.controller(), action = handle.name(), "{e}"),
    }
    result
}

fn action_failed(handle: &ActionHandle, e: ActionError) -> InvocationError {
    match e.downcast::<ArgumentError>() {
        Ok(arg) => InvocationError::Argument(*arg),
        Err(e) => InvocationError::Action {
            controller: handle.controller(),
            action: handle.name().to_owned(),
            message: e.to_string(),
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
