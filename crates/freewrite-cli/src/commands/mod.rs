pub mod analyze;
pub mod common;
pub mod completions;
pub mod delete;
pub mod edit;
pub mod list;
pub mod new;
pub mod prompt;
pub mod show;
pub mod sync;
pub mod watch;
