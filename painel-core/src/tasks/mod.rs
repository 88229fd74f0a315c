pub mod deadline;
pub mod queue_refresh;

pub use deadline::spawn_deadline_task;
pub use queue_refresh::spawn_queue_refresh_task;
