//! Compiled command output, the timeline the rendering layer consumes.

pub mod sequence;
pub mod timeline;
pub mod types;

pub use sequence::{CommandSequence, LineIndex};
pub use timeline::Timeline;
pub use types::{Command, CommandKind, MarkerKind};
