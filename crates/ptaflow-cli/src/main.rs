use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ptaflow")]
#[command(about = "ptaflow - level-ordered points-to and alias analysis over textual IR")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pointer analysis from an entry function and print the report.
    Analyze {
        /// `.pir` text, or a module saved as JSON by `dump --save`.
        input: PathBuf,

        #[arg(short, long)]
        entry: Option<String>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON file with analysis settings; flags override its fields.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Do not record stored non-allocation values as pointer targets.
        #[arg(long)]
        no_surrogate: bool,

        /// Report every propagation step.
        #[arg(long)]
        steps: bool,

        #[arg(long)]
        no_color: bool,

        /// Once for labels and def-use edges, twice for every fact update.
        #[arg(short, long, action = ArgAction::Count)]
        verbose: u8,

        #[arg(short, long, conflicts_with = "verbose")]
        quiet: bool,
    },

    Validate {
        input: PathBuf,

        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the parsed module.
    Dump {
        input: PathBuf,

        #[arg(long)]
        callgraph: bool,

        /// Tag every instruction with its id.
        #[arg(long)]
        ids: bool,

        /// Also write the module as JSON.
        #[arg(long)]
        save: Option<PathBuf>,

        #[arg(long)]
        no_color: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for ptaflow_emit::OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => ptaflow_emit::OutputFormat::Text,
            Format::Json => ptaflow_emit::OutputFormat::Json,
        }
    }
}

struct AnalyzeArgs {
    input: PathBuf,
    entry: Option<String>,
    format: Format,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    no_surrogate: bool,
    steps: bool,
    no_color: bool,
    verbose: u8,
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_verbose = matches!(cli.command, Commands::Analyze { verbose, .. } if verbose > 0);
    init_tracing(log_verbose);

    match cli.command {
        Commands::Analyze {
            input,
            entry,
            format,
            output,
            config,
            no_surrogate,
            steps,
            no_color,
            verbose,
            quiet,
        } => cmd_analyze(AnalyzeArgs {
            input,
            entry,
            format,
            output,
            config,
            no_surrogate,
            steps,
            no_color,
            verbose,
            quiet,
        }),
        Commands::Validate { input, verbose } => cmd_validate(input, verbose),
        Commands::Dump {
            input,
            callgraph,
            ids,
            save,
            no_color,
        } => cmd_dump(input, callgraph, ids, save, no_color),
    }
}

/// Logs go to stderr so reports on stdout stay machine-readable. `RUST_LOG` wins over the
/// default level.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_module(input: &Path) -> Result<ptaflow_core::Module> {
    let is_json = input.extension().and_then(|ext| ext.to_str()) == Some("json");
    if is_json {
        ptaflow_core::persist::load_module(input)
            .with_context(|| format!("failed to load module from {}", input.display()))
    } else {
        ptaflow_parser::parse_file(input)
            .with_context(|| format!("failed to parse {}", input.display()))
    }
}

fn cmd_analyze(args: AnalyzeArgs) -> Result<()> {
    use ptaflow_core::analysis::{analyze_with_config, AnalysisConfig};
    use ptaflow_emit::{Emitter, EmitterConfig, ReportEmitter, VerbosityLevel};
    use std::fs;

    if args.no_color {
        colored::control::set_override(false);
    }

    let module = load_module(&args.input)?;

    let mut config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str::<AnalysisConfig>(&json)
                .with_context(|| format!("invalid analysis config {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };
    if let Some(entry) = args.entry {
        config.entry = entry;
    }
    if args.no_surrogate {
        config.stored_value_surrogate = false;
    }
    if args.steps {
        config.record_steps = true;
    }

    let result = analyze_with_config(&module, config)?;

    let verbosity = match (args.quiet, args.verbose) {
        (true, _) => VerbosityLevel::Quiet,
        (false, 0) => VerbosityLevel::Normal,
        (false, 1) => VerbosityLevel::Verbose,
        (false, _) => VerbosityLevel::Debug,
    };
    let emitter_config = EmitterConfig {
        use_colors: !args.no_color && args.output.is_none(),
        format: args.format.into(),
        verbosity,
        ..EmitterConfig::default()
    };
    let report = ReportEmitter::new(&module, emitter_config).emit_to_string(&result)?;

    match args.output {
        Some(path) => {
            fs::write(&path, &report)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => print!("{}", report),
    }

    Ok(())
}

fn cmd_validate(input: PathBuf, verbose: bool) -> Result<()> {
    use colored::*;

    if verbose {
        println!("{}", "Validating ptaflow IR".bright_cyan().bold());
        println!("{}", "=".repeat(50).bright_cyan());
        println!("Input: {}", input.display());
        println!();
    }

    match ptaflow_parser::parse_file(&input) {
        Ok(module) => {
            println!("{}", "VALID".bright_green().bold());
            if verbose {
                let definitions = module.definitions().count();
                println!(
                    "   {} function(s), {} with a body",
                    module.functions.len(),
                    definitions
                );
                for function in module.definitions() {
                    println!(
                        "   @{}: {} instruction(s), {} allocation(s)",
                        function.name,
                        function.instructions.len(),
                        function.allocations().count()
                    );
                }
            }
            Ok(())
        }
        Err(e) => {
            println!("{}", "INVALID".bright_red().bold());
            println!("\n{}", "Parse Error:".bright_red());
            println!("{}", e);
            Err(anyhow::anyhow!("Validation failed"))
        }
    }
}

fn cmd_dump(
    input: PathBuf,
    callgraph: bool,
    ids: bool,
    save: Option<PathBuf>,
    no_color: bool,
) -> Result<()> {
    use colored::*;
    use ptaflow_core::CallGraph;
    use ptaflow_emit::{Emitter, EmitterConfig, IrEmitter, VerbosityLevel};

    if no_color {
        colored::control::set_override(false);
    }

    let module = load_module(&input)?;

    let verbosity = if ids {
        VerbosityLevel::Debug
    } else {
        VerbosityLevel::Normal
    };
    let config = EmitterConfig {
        use_colors: !no_color,
        verbosity,
        ..EmitterConfig::default()
    };
    print!("{}", IrEmitter::new(config).emit_to_string(&module)?);

    if callgraph {
        let graph = CallGraph::build(&module);
        println!();
        println!("{}", "; call graph".dimmed());
        for node in graph.nodes() {
            let callees: Vec<String> = node.callees.iter().map(|c| format!("@{}", c)).collect();
            let suffix = if node.is_external { " (external)" } else { "" };
            if callees.is_empty() {
                println!("@{}{}", node.name, suffix);
            } else {
                println!("@{}{} -> {}", node.name, suffix, callees.join(", "));
            }
        }
    }

    if let Some(path) = save {
        ptaflow_core::persist::save_module(&module, &path)
            .with_context(|| format!("failed to save module to {}", path.display()))?;
        tracing::info!(path = %path.display(), "module saved");
    }

    Ok(())
}
