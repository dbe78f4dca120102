//! Daily content: the age-group task list and the wisdom of the day.

mod tasks;
mod wisdom;

pub use tasks::{builtin_tasks, DailyTasks, TaskStatus, FALLBACK_AGE_GROUP, TASKS_ASSET};
pub use wisdom::{wisdom_for_day, wisdom_index, WisdomCatalog, WISDOM_ASSET};
