//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod buttons;
pub mod engine;
pub mod status;

pub use buttons::button_task;
pub use engine::engine_task;
pub use status::status_task;
