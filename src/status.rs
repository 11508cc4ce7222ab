//! HTTP status codes as a typed enum.
//!
//! Only the codes the dispatcher and the host actually emit are listed.
//!
//! ```rust
//! use switchyard::{Response, Status};
//!
//! Response::builder()
//!     .status(Status::BadRequest)
//!     .text("Bad Request");
//! ```

/// A status code emitted by the dispatcher or the host.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    Ok,                  // 200
    BadRequest,          // 400
    NotFound,            // 404
    ContentTooLarge,     // 413
    InternalServerError, // 500
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        match s {
            Status::Ok                  => 200,
            Status::BadRequest          => 400,
            Status::NotFound            => 404,
            Status::ContentTooLarge     => 413,
            Status::InternalServerError => 500,
        }
    }
}
