//! Host command handlers
//!
//! One function per command code, grouped by family. Each reads its fields
//! through a [`PayloadReader`](super::PayloadReader) and returns either a
//! response (including verification failures) or an [`HsmError`](super::HsmError).

pub mod admin;
pub mod card;
pub mod keys;
pub mod mac;
pub mod pin;
