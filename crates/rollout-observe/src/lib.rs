mod logger;
pub use logger::*;

mod sink;
pub use sink::{LineSink, MemorySink, TracingSink};
