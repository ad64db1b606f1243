//! Channel-state engine
//!
//! Everything with real state and timing lives here, independent of the
//! socket and the terminal:
//!
//! ```text
//! Payload ──▶ Dispatcher ──▶ [pending reset?] ──▶ ChannelRegistry
//!                 │                                   ▲
//!                 ├── Formatter (StyleTable) ─────────┘
//!                 └── IdleReset (restart deadline)
//! ```

pub mod channels;
pub mod dispatcher;
pub mod idle;
pub mod payload;
pub mod style;

pub use channels::{Channel, ChannelRegistry};
pub use dispatcher::{DispatchOutcome, Dispatcher, SharedDispatcher};
pub use payload::{DecodeError, Payload};
pub use style::StyleTable;
