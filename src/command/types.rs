//! Command data model. The unit of output consumed by the rendering layer.
//!
//! A [`Command`] is a single animation, camera, audio or marker instruction at
//! a point in symbolic scene time (seconds), bound to zero or more elements.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dsl::ast::{AnimationAction, AudioCue, CameraAction, OptionKey};
use crate::eval::{ElementRef, Value};

/// Playback markers that carry no animation of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Written by `pause`; playback stops here until the user steps on.
    Pause,
    /// Synthesized where a parallel block's longest branch finishes.
    ParallelEnd,
}

/// What a command does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum CommandKind {
    Animation(AnimationAction),
    Camera(CameraAction),
    Audio(AudioCue),
    Marker(MarkerKind),
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandKind::Animation(a) => write!(f, "{a}"),
            CommandKind::Camera(a) => write!(f, "camera {a}"),
            CommandKind::Audio(c) => write!(f, "play {c}"),
            CommandKind::Marker(MarkerKind::Pause) => f.write_str("pause"),
            CommandKind::Marker(MarkerKind::ParallelEnd) => f.write_str("parallel end"),
        }
    }
}

/// A single instruction on the compiled timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    /// When this command starts, in seconds from the start of the scene.
    pub time_offset: f64,
    pub kind: CommandKind,
    pub targets: Vec<ElementRef>,
    /// Options as written, with their values evaluated.
    pub options: BTreeMap<OptionKey, Value>,
    /// Resolved length in seconds (the `duration` option or the default).
    pub duration: f64,
    /// 1-based line of the statement that produced this command; `None` for
    /// commands synthesized by control flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_line: Option<usize>,
}

impl Command {
    pub fn end_time(&self) -> f64 {
        self.time_offset + self.duration
    }

    /// A zero-length marker with no targets.
    pub fn marker(time_offset: f64, marker: MarkerKind, source_line: Option<usize>) -> Self {
        Self {
            time_offset,
            kind: CommandKind::Marker(marker),
            targets: Vec::new(),
            options: BTreeMap::new(),
            duration: 0.0,
            source_line,
        }
    }
}
