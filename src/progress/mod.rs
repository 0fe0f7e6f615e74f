//! Progress reporting for discovery, build and emission

mod console;
mod handler;
mod logging;

pub use console::{render_line, BufferedHandler, ConsoleHandler, FanoutHandler};
pub use handler::{NoOpHandler, Operation, ProgressEvent, ProgressHandler};
pub use logging::LoggingHandler;
