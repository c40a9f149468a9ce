pub mod clock;
pub mod config;
pub mod countdown;
pub mod drag;
pub mod format;
pub mod logging;
pub mod model;
pub mod notify;
pub mod reminder;

pub use model::{ItemId, Planner, PlannerError, Progress};
