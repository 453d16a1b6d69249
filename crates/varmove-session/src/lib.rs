//! Session layer for varmove.
//!
//! Exposes the tagged request/response records the presentation layer
//! exchanges with the core, and the [`Session`] coordinator that validates
//! requests, drives the migration engine, and aggregates one summary per
//! move. The transport carrying the records is the host application's
//! concern.

mod error;
mod protocol;
mod session;

pub use error::SessionError;
pub use protocol::{Request, Response, VariablePreview};
pub use session::{
    MSG_ALL_DUPLICATES, MSG_COLLECTION_NOT_FOUND, MSG_EMPTY_SELECTION, MSG_MISSING_SELECTION,
    MSG_NO_VALID_VARIABLES, MSG_SAME_COLLECTION, Session,
};
