pub mod commands;
pub mod progress;
pub mod ui;
pub mod util;

pub use progress::ConsoleObserver;
pub use util::{AiOverrides, CommandContext};
