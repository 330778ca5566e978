pub mod json_lines;
pub mod null;

pub use json_lines::JsonLinesRunLog;
pub use null::NullRunLog;
