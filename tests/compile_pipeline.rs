//! End-to-end tests: DSL source → parse → compile → command sequence → line index.

use assert_approx_eq::assert_approx_eq;

use scenescript::dsl::{AnimationAction, Compiler, ExprKind, Program};
use scenescript::{
    CommandKind, CommandSequence, CompilerConfig, DslError, ElementBindings, ElementId,
    EvalErrorKind, MarkerKind, Timeline, Value,
};

const DEMO: &str = r#"scene "demo" { array a = [5,3,8]
  highlight a[0] duration 500ms
  swap a[0] a[1]
}"#;

const SORT: &str = r#"scene "sort" {
  array a = [3, 1, 2]
  for i in 0..a.length {
    for j in 0..a.length - i - 1 {
      compare a[j] a[j + 1]
      if a[j] > a[j + 1] {
        swap a[j] a[j + 1]
      }
    }
  }
}"#;

/// Helper: compile one scene with empty bindings and default config.
fn compile(src: &str, scene: &str) -> Result<CommandSequence, DslError> {
    Compiler::compile(src, scene, &ElementBindings::new(), &CompilerConfig::default())
}

fn eval_error_kind(result: Result<CommandSequence, DslError>) -> EvalErrorKind {
    match result {
        Err(DslError::Eval(e)) => e.kind,
        other => panic!("expected an evaluation error, got {other:?}"),
    }
}

#[test]
fn demo_scene_compiles_to_two_commands() {
    let seq = compile(DEMO, "demo").unwrap();
    assert_eq!(seq.scene, "demo");
    assert_eq!(seq.len(), 2);

    let highlight = &seq.commands[0];
    assert_eq!(highlight.kind, CommandKind::Animation(AnimationAction::Highlight));
    assert_approx_eq!(highlight.time_offset, 0.0);
    assert_approx_eq!(highlight.duration, 0.5);
    assert_eq!(highlight.source_line, Some(2));
    let targets: Vec<String> = highlight.targets.iter().map(ToString::to_string).collect();
    assert_eq!(targets, vec!["a[0]"]);

    let swap = &seq.commands[1];
    assert_eq!(swap.kind, CommandKind::Animation(AnimationAction::Swap));
    assert_approx_eq!(swap.time_offset, 0.5);
    assert_eq!(swap.source_line, Some(3));
    let targets: Vec<String> = swap.targets.iter().map(ToString::to_string).collect();
    assert_eq!(targets, vec!["a[0]", "a[1]"]);

    assert_eq!(seq.elements.len(), 1);
    assert_eq!(seq.elements[0].value, Value::Array(vec![
        Value::Number(3.0),
        Value::Number(5.0),
        Value::Number(8.0),
    ]));
}

#[test]
fn compilation_is_idempotent() {
    let bindings: ElementBindings = [("a".to_string(), ElementId(3))].into_iter().collect();
    let config = CompilerConfig::default();
    let first = Compiler::compile(SORT, "sort", &bindings, &config).unwrap();
    let second = Compiler::compile(SORT, "sort", &bindings, &config).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn expression_precedence_and_associativity() {
    assert_eq!(Compiler::eval_expr("2 + 3 * 4").unwrap(), Value::Number(14.0));
    assert_eq!(Compiler::eval_expr("(2 + 3) * 4").unwrap(), Value::Number(20.0));
    assert_eq!(Compiler::eval_expr("10 - 3 - 2").unwrap(), Value::Number(5.0));
}

#[test]
fn hundred_term_chain_evaluates() {
    let src = format!("1{}", " + 1".repeat(99));
    assert_eq!(Compiler::eval_expr(&src).unwrap(), Value::Number(100.0));
    assert!(Compiler::parse_expr(&format!("1{}", " + 1".repeat(200_000))).is_err());
}

#[test]
fn duration_literals_are_seconds() {
    let half = Compiler::parse_expr("500ms").unwrap();
    assert!(matches!(half.kind, ExprKind::Duration(d) if d == 0.5));
    let two = Compiler::parse_expr("2s").unwrap();
    assert!(matches!(two.kind, ExprKind::Duration(d) if d == 2.0));
}

#[test]
fn for_loop_runs_once_per_index() {
    let src = "scene s {\n  array a = [0, 0, 0]\n  for i in 0..3 { set a[i] value i }\n}";
    let seq = compile(src, "s").unwrap();
    assert_eq!(seq.len(), 3);
    assert_eq!(
        seq.elements[0].value,
        Value::Array(vec![Value::Number(0.0), Value::Number(1.0), Value::Number(2.0)])
    );
}

#[test]
fn parallel_block_advances_by_longest_child() {
    let src = "scene s {\n  parallel { wait 1s; wait 2s }\n}";
    let seq = compile(src, "s").unwrap();
    assert_approx_eq!(seq.total_duration, 2.0);
}

#[test]
fn nested_parallel_blocks() {
    let src = "scene s {
  array a = [1, 2, 3]
  parallel {
    highlight a[0] duration 1s
    parallel {
      highlight a[1] duration 2s
      highlight a[2] duration 3s
    }
  }
  highlight a[0]
}";
    let seq = compile(src, "s").unwrap();
    let markers = seq
        .commands
        .iter()
        .filter(|c| c.kind == CommandKind::Marker(MarkerKind::ParallelEnd))
        .count();
    assert_eq!(markers, 2);

    let last = seq.commands.last().unwrap();
    assert_eq!(last.source_line, Some(10));
    assert_approx_eq!(last.time_offset, 3.0);
    assert_approx_eq!(seq.total_duration, 3.5);
}

#[test]
fn reserved_word_is_not_an_identifier() {
    let err = Compiler::parse("scene s { let scene = 1 }").unwrap_err();
    assert_eq!(err.line, 1);
    assert!(err.message.contains("scene"));
}

#[test]
fn out_of_bounds_index_reports_line() {
    let src = "scene s {\n  array a = [1, 2]\n  for i in 0..3 {\n    highlight a[i]\n  }\n}";
    match compile(src, "s") {
        Err(DslError::Eval(e)) => {
            assert_eq!(e.kind, EvalErrorKind::IndexOutOfRange);
            assert_eq!(e.line, Some(4));
        }
        other => panic!("expected IndexOutOfRange, got {other:?}"),
    }
}

#[test]
fn runaway_loop_hits_iteration_cap() {
    let kind = eval_error_kind(compile("scene s { while true { } }", "s"));
    assert_eq!(kind, EvalErrorKind::IterationLimitExceeded);
}

#[test]
fn unknown_scene() {
    let kind = eval_error_kind(compile(DEMO, "missing"));
    assert_eq!(kind, EvalErrorKind::SceneNotFound);
}

#[test]
fn bubble_sort_line_index() {
    let seq = compile(SORT, "sort").unwrap();
    assert_eq!(
        seq.elements[0].value,
        Value::Array(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)])
    );

    assert_eq!(seq.len(), 5);
    assert_approx_eq!(seq.total_duration, 2.5);
    assert_eq!(seq.lines.line_sequence(), vec![5, 7, 5, 7, 5]);
    assert_eq!(seq.commands_for_line(7).len(), 2);
    assert_eq!(seq.lines.first_time_for_line(&seq.commands, 7), Some(0.5));
    assert_eq!(seq.lines.line_at(&seq.commands, 1.2), Some(5));
    assert_eq!(seq.active_at(1.2).len(), 1);
}

#[test]
fn timeline_drains_compiled_commands() {
    let seq = compile(DEMO, "demo").unwrap();
    let mut timeline = Timeline::new(&seq.commands);
    let first = timeline.drain_range(0.0, 0.5);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].source_line, Some(2));
    assert_eq!(timeline.remaining(), 1);

    timeline.seek(0.0);
    assert_eq!(timeline.drain_range(0.0, 10.0).len(), 2);
}

#[test]
fn comments_are_ignored() {
    let src = "// intro scene\nscene s {\n  /* data */ array a = [1]\n  highlight a[0] // first\n}";
    let seq = compile(src, "s").unwrap();
    assert_eq!(seq.commands[0].source_line, Some(4));
}

#[test]
fn unterminated_literals_rejected() {
    assert!(Compiler::parse("scene s { let x = \"abc }").is_err());
    assert!(Compiler::parse("scene s { /* never closed }").is_err());
}

#[test]
fn bindings_from_yaml_reuse_ids() {
    let bindings: ElementBindings = serde_yaml::from_str("a: 12\n").unwrap();
    let src = "scene s {\n  array a = [1]\n  array b = [2]\n}";
    let seq = Compiler::compile(src, "s", &bindings, &CompilerConfig::default()).unwrap();
    assert_eq!(seq.elements[0].id, ElementId(12));
    assert_eq!(seq.elements[1].id, ElementId(13));
}

#[test]
fn first_scene_with_a_name_wins() {
    let src = "scene s { wait 1s }\nscene s { wait 2s }";
    let program: Program = Compiler::parse(src).unwrap();
    assert_eq!(program.scene_names(), vec!["s", "s"]);
    let seq = compile(src, "s").unwrap();
    assert_approx_eq!(seq.total_duration, 1.0);
}

#[test]
fn outputs_are_thread_safe() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Program>();
    assert_send_sync::<CommandSequence>();
    assert_send_sync::<DslError>();
}
