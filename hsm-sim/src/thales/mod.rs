//! Thales-style host command processor
//!
//! [`Dispatcher`] maps command codes to handlers, [`HsmContext`] carries the
//! key hierarchy and collaborators they run against.

mod context;
mod dispatcher;
mod error;
pub mod handlers;
mod reader;

pub use context::{HsmContext, HsmIdentity, PROCESS_START};
pub use dispatcher::{Dispatcher, Handler, EXECUTE_EVENT};
pub use error::HsmError;
pub use reader::PayloadReader;
