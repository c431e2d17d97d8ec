//! Compiled output of one scene, plus the line index used for code stepping.

use std::collections::BTreeMap;

use serde::Serialize;

use super::types::Command;
use crate::eval::Element;

/// Everything the rendering layer needs to play one compiled scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandSequence {
    pub scene: String,
    /// Ordered by `time_offset`; ties keep emission order.
    pub commands: Vec<Command>,
    /// Elements declared by the scene, ordered by id, in their final state.
    pub elements: Vec<Element>,
    /// Time at which the last command ends or the cursor stopped, whichever
    /// is later.
    pub total_duration: f64,
    #[serde(skip)]
    pub lines: LineIndex,
}

impl CommandSequence {
    /// Sort `commands` stably by start time and build the line index.
    pub fn new(
        scene: impl Into<String>,
        mut commands: Vec<Command>,
        elements: Vec<Element>,
        cursor_end: f64,
    ) -> Self {
        commands.sort_by(|a, b| a.time_offset.total_cmp(&b.time_offset));
        let total_duration = commands
            .iter()
            .map(Command::end_time)
            .fold(cursor_end, f64::max);
        let lines = LineIndex::build(&commands);
        Self {
            scene: scene.into(),
            commands,
            elements,
            total_duration,
            lines,
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands playing at time `t`.
    pub fn active_at(&self, t: f64) -> Vec<&Command> {
        self.lines
            .active_at(&self.commands, t)
            .into_iter()
            .filter_map(|i| self.commands.get(i))
            .collect()
    }

    /// Commands produced by statements on `line`.
    pub fn commands_for_line(&self, line: usize) -> Vec<&Command> {
        self.lines
            .commands_for_line(line)
            .iter()
            .filter_map(|&i| self.commands.get(i))
            .collect()
    }
}

/// Maps source lines to command indices and answers time/line queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineIndex {
    by_line: BTreeMap<usize, Vec<usize>>,
    /// `(command index, line)` in command order, line-less commands skipped.
    sequence: Vec<(usize, usize)>,
}

impl LineIndex {
    pub fn build(commands: &[Command]) -> Self {
        let mut by_line: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        let mut sequence = Vec::new();
        for (i, cmd) in commands.iter().enumerate() {
            if let Some(line) = cmd.source_line {
                by_line.entry(line).or_default().push(i);
                sequence.push((i, line));
            }
        }
        Self { by_line, sequence }
    }

    /// Source lines in playback order, for current/visited/next decoration.
    pub fn line_sequence(&self) -> Vec<usize> {
        self.sequence.iter().map(|&(_, line)| line).collect()
    }

    pub fn commands_for_line(&self, line: usize) -> &[usize] {
        self.by_line.get(&line).map_or(&[], Vec::as_slice)
    }

    /// Earliest start time of any command from `line` ("jump to line").
    pub fn first_time_for_line(&self, commands: &[Command], line: usize) -> Option<f64> {
        self.commands_for_line(line)
            .iter()
            .filter_map(|&i| commands.get(i))
            .map(|c| c.time_offset)
            .reduce(f64::min)
    }

    /// Indices of commands with `time_offset <= t < time_offset + duration`.
    /// Zero-length commands are active only at their exact start.
    pub fn active_at(&self, commands: &[Command], t: f64) -> Vec<usize> {
        commands
            .iter()
            .enumerate()
            .take_while(|(_, c)| c.time_offset <= t)
            .filter(|(_, c)| t < c.end_time() || (c.duration == 0.0 && c.time_offset == t))
            .map(|(i, _)| i)
            .collect()
    }

    /// Line of the last numbered command starting at or before `t`
    /// ("jump to time" highlighting).
    pub fn line_at(&self, commands: &[Command], t: f64) -> Option<usize> {
        self.sequence
            .iter()
            .take_while(|&&(i, _)| commands.get(i).is_some_and(|c| c.time_offset <= t))
            .last()
            .map(|&(_, line)| line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::types::{CommandKind, MarkerKind};
    use crate::dsl::ast::AnimationAction;

    fn cmd(t: f64, duration: f64, line: Option<usize>) -> Command {
        Command {
            time_offset: t,
            kind: CommandKind::Animation(AnimationAction::Highlight),
            targets: vec![],
            options: BTreeMap::new(),
            duration,
            source_line: line,
        }
    }

    #[test]
    fn new_sorts_stably_by_time() {
        let seq = CommandSequence::new(
            "s",
            vec![cmd(1.0, 0.5, Some(3)), cmd(0.0, 0.5, Some(1)), cmd(1.0, 0.5, Some(4))],
            vec![],
            0.0,
        );
        let lines: Vec<_> = seq.commands.iter().map(|c| c.source_line).collect();
        assert_eq!(lines, vec![Some(1), Some(3), Some(4)]);
        assert_eq!(seq.total_duration, 1.5);
    }

    #[test]
    fn total_duration_includes_trailing_wait() {
        let seq = CommandSequence::new("s", vec![cmd(0.0, 0.5, Some(1))], vec![], 3.0);
        assert_eq!(seq.total_duration, 3.0);
    }

    #[test]
    fn line_sequence_skips_synthesized_commands() {
        let commands = vec![
            cmd(0.0, 1.0, Some(2)),
            Command::marker(1.0, MarkerKind::ParallelEnd, None),
            cmd(1.0, 1.0, Some(5)),
            cmd(2.0, 1.0, Some(2)),
        ];
        let index = LineIndex::build(&commands);
        assert_eq!(index.line_sequence(), vec![2, 5, 2]);
        assert_eq!(index.commands_for_line(2), &[0, 3]);
        assert!(index.commands_for_line(9).is_empty());
        assert_eq!(index.first_time_for_line(&commands, 2), Some(0.0));
        assert_eq!(index.first_time_for_line(&commands, 5), Some(1.0));
    }

    #[test]
    fn time_queries() {
        let commands = vec![cmd(0.0, 1.0, Some(2)), cmd(0.5, 1.0, Some(3)), cmd(2.0, 0.0, Some(4))];
        let index = LineIndex::build(&commands);
        assert_eq!(index.active_at(&commands, 0.75), vec![0, 1]);
        assert_eq!(index.active_at(&commands, 1.2), vec![1]);
        assert_eq!(index.active_at(&commands, 2.0), vec![2]);
        assert_eq!(index.line_at(&commands, 0.6), Some(3));
        assert_eq!(index.line_at(&commands, 5.0), Some(4));

        let late = vec![cmd(1.0, 1.0, Some(7))];
        assert_eq!(LineIndex::build(&late).line_at(&late, 0.5), None);
    }
}
