//! Contract between the runtime loop and the application.
//!
//! The runtime owns windows and GPU contexts; the application only sees
//! `App` callbacks and a per-frame `FrameCtx`.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
