pub mod history;
pub mod input;
pub mod model;

pub use history::{DrawHistory, StrokeCommit};
pub use input::{DrawInputState, StrokeRecorder};
pub use model::{DrawColor, PathData, Point, Stroke, StrokeStyle};
