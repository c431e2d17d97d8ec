use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::Level;

use scenescript::command::CommandSequence;
use scenescript::config::{self, CompilerConfig};
use scenescript::dsl::{Compiler, Program};
use scenescript::eval::{self, ElementBindings};

#[derive(Parser, Debug)]
#[command(name = "scenescript", version, about = "Compile animation scenes into command timelines")]
struct Cli {
    /// Log compiler activity to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a source file and report its scenes or the first syntax error.
    Check {
        file: PathBuf,
    },
    /// List scene names in declaration order.
    Scenes {
        file: PathBuf,
    },
    /// Compile one scene and print the command sequence as JSON.
    Compile(CompileArgs),
    /// Compile one scene and print one row per command.
    Lines {
        file: PathBuf,

        #[arg(long)]
        scene: String,

        /// Compiler config YAML (defaults to ~/.scenescript/config.yaml).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Parser, Debug)]
struct CompileArgs {
    file: PathBuf,

    /// Scene to compile.
    #[arg(long)]
    scene: String,

    /// YAML map of element names to existing ids.
    #[arg(long)]
    bindings: Option<PathBuf>,

    /// Compiler config YAML (defaults to ~/.scenescript/config.yaml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    match cli.cmd {
        Command::Check { file } => cmd_check(&file),
        Command::Scenes { file } => cmd_scenes(&file),
        Command::Compile(args) => cmd_compile(args),
        Command::Lines {
            file,
            scene,
            config,
        } => cmd_lines(&file, &scene, config.as_deref()),
    }
}

fn read_program(path: &Path) -> anyhow::Result<Program> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("read source '{}'", path.display()))?;
    let program =
        Compiler::parse(&source).with_context(|| format!("parse '{}'", path.display()))?;
    Ok(program)
}

fn read_config(path: Option<&Path>) -> anyhow::Result<CompilerConfig> {
    let path = path.map_or_else(config::default_config_path, Path::to_path_buf);
    let config = config::load_config(&path)
        .with_context(|| format!("load config '{}'", path.display()))?;
    Ok(config)
}

fn read_bindings(path: Option<&Path>) -> anyhow::Result<ElementBindings> {
    let Some(path) = path else {
        return Ok(ElementBindings::new());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read bindings '{}'", path.display()))?;
    let bindings = serde_yaml::from_str(&text).with_context(|| "parse bindings YAML")?;
    Ok(bindings)
}

fn compile_scene(
    file: &Path,
    scene: &str,
    bindings: &ElementBindings,
    config: &CompilerConfig,
) -> anyhow::Result<CommandSequence> {
    let program = read_program(file)?;
    let sequence = eval::compile(&program, scene, bindings, config)
        .with_context(|| format!("compile scene '{scene}' of '{}'", file.display()))?;
    Ok(sequence)
}

fn cmd_check(file: &Path) -> anyhow::Result<()> {
    let program = read_program(file)?;
    let names = program.scene_names();
    println!(
        "ok: {} scene{}{}{}",
        names.len(),
        if names.len() == 1 { "" } else { "s" },
        if names.is_empty() { "" } else { ": " },
        names.join(", ")
    );
    Ok(())
}

fn cmd_scenes(file: &Path) -> anyhow::Result<()> {
    for name in read_program(file)?.scene_names() {
        println!("{name}");
    }
    Ok(())
}

fn cmd_compile(args: CompileArgs) -> anyhow::Result<()> {
    let config = read_config(args.config.as_deref())?;
    let bindings = read_bindings(args.bindings.as_deref())?;
    let sequence = compile_scene(&args.file, &args.scene, &bindings, &config)?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&sequence)
    } else {
        serde_json::to_string(&sequence)
    }
    .with_context(|| "serialize command sequence")?;
    println!("{json}");
    Ok(())
}

fn cmd_lines(file: &Path, scene: &str, config: Option<&Path>) -> anyhow::Result<()> {
    let config = read_config(config)?;
    let sequence = compile_scene(file, scene, &ElementBindings::new(), &config)?;

    for cmd in &sequence.commands {
        let line = cmd
            .source_line
            .map_or_else(|| "-".to_string(), |l| l.to_string());
        let targets: Vec<String> = cmd.targets.iter().map(ToString::to_string).collect();
        println!(
            "{:>8.3}  {:>5}  {:<16} {}",
            cmd.time_offset,
            line,
            cmd.kind.to_string(),
            targets.join(", ")
        );
    }
    println!("total {:.3}s", sequence.total_duration);
    Ok(())
}
