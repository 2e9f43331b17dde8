//! Timestamped video review feedback: comments, replies, per-second
//! freehand strokes and pinned comments, merged into one feed ordered by
//! video time.

pub mod anchor;
pub mod comment;
pub mod draw;
pub mod feed;
pub mod ids;
pub mod logging;
pub mod overlay;
pub mod playback;
pub mod seek;
pub mod session;
pub mod settings;
pub mod store;
pub mod time;

pub use anchor::Anchor;
pub use comment::{Comment, CommentKind, Reply};
pub use draw::{DrawColor, PathData, Point, Stroke};
pub use playback::{ManualClock, PlaybackSource};
pub use session::{InputMode, ReviewSession, Submitted};
pub use settings::ReviewSettings;
pub use store::{AnnotationStore, BucketMap, FileStore, KvStore, MemoryStore};
