//! UI Module - terminal output for winup
//!
//! Commands talk to [`Output`], which forwards events to a single actor
//! thread. The actor is the only writer to stdout during a batch, so the
//! per-item lines come out in the order the engine reported them.
//!
//! ```text
//! Commands -> Output (Reporter) -> UiActor -> stdout
//!                                      \-> Theme
//! ```
//!
//! Static listings (`winup list`) bypass the actor and render a
//! `comfy-table` directly.

pub mod actor;
pub mod output;
pub mod table;
pub mod theme;

pub use output::Output;
pub use theme::Theme;
