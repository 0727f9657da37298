//! MIRRA Render - Renderer state synchronization
//!
//! Mirrors a renderable's visibility and materials:
//! - `Enabled` (0x1): visibility flag
//! - `Materials` (0x2): material list structure and values
//! - `MaterialProperty` (0x4): value-only property updates, sent as their
//!   own message
//!
//! A structural material change suppresses `MaterialProperty` for that tick;
//! the material list already carries the current values.

pub mod changes;
pub mod encoding;
pub mod host;
pub mod kinds;
pub mod materials;
pub mod renderer;
pub mod service;

pub use changes::*;
pub use encoding::*;
pub use host::*;
pub use kinds::*;
pub use materials::*;
pub use renderer::*;
pub use service::*;
