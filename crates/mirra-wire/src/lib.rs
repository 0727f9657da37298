//! MIRRA Wire Protocol - Component message framing
//!
//! Every component message is:
//! - ShortId (3 bytes, ASCII)
//! - Change flags (1 byte, kind-defined)
//! - Payload fields for set bits, lowest bit first
//!
//! The manager wraps each message in a 4-byte object envelope for routing.

pub mod envelope;
pub mod header;
pub mod reader;
pub mod writer;

pub use envelope::*;
pub use header::*;
pub use reader::*;
pub use writer::*;
