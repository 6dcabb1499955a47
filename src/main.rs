use clap::{Parser, Subcommand};
use cognate::config::InterpreterConfig;
use cognate::diagnostics::{emit_diagnostics, report_io_error, report_runtime_error};
use cognate::frontend::{Capture, Frontend, OutputSink, StyledText, TextStyle};
use cognate::interpreter::{Outcome, PreludeError, Runner, PRELUDE};
use cognate::runtime::value::render_stack;
use std::cell::Cell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;
use thiserror::Error;

const LOG_ENV: &str = "COGNATE_LOG";

#[derive(Parser)]
#[command(name = "cognate")]
#[command(about = "Run and check Cognate programs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Prelude to load instead of the built-in one.
    #[arg(long, global = true)]
    prelude: Option<PathBuf>,
    #[arg(long = "call-stack-limit", global = true, value_name = "N")]
    call_stack_limit: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program, then print the final stack.
    Run { file: PathBuf },
    /// Parse, lower and resolve a program without running it.
    Check { file: PathBuf },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("invalid file extension, only .cog files are allowed")]
    Extension,
    #[error("could not read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Prelude(#[from] PreludeError),
    #[error("{problems} problem(s) found, program not run")]
    Rejected { problems: usize },
    #[error("program failed")]
    Failed,
}

/// Writes program output straight to stdout, remembering whether the last line
/// was left open so the stack dump starts on a fresh one.
#[derive(Clone, Default)]
struct Stdout {
    open_line: Rc<Cell<bool>>,
}

impl OutputSink for Stdout {
    fn add(&mut self, text: StyledText) {
        if text.text.is_empty() {
            return;
        }
        print!("{}", text.text);
        self.open_line.set(!text.text.ends_with('\n'));
    }

    fn newline(&mut self) {
        println!();
        self.open_line.set(false);
    }

    fn clear(&mut self) {}
}

/// Marks names with backticks, the way the diagnostics quote code.
struct TerminalStyle;

impl TextStyle for TerminalStyle {
    fn marked(&self, text: &str) -> String {
        format!("`{text}`")
    }

    fn light(&self, text: &str) -> String {
        text.to_string()
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Io { path, source }) => {
            report_io_error(&path, &source);
            ExitCode::FAILURE
        }
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn execute(cli: &Cli) -> Result<(), CliError> {
    let file = match &cli.command {
        Commands::Run { file } | Commands::Check { file } => file,
    };
    if file.extension().and_then(|ext| ext.to_str()) != Some("cog") {
        return Err(CliError::Extension);
    }
    let source = read(file)?;

    let mut config = InterpreterConfig::from_env();
    if let Some(limit) = cli.call_stack_limit {
        config = config.with_call_stack_limit(limit);
    }
    let prelude = match &cli.prelude {
        Some(path) => read(path)?,
        None => PRELUDE.to_string(),
    };

    let capture = Capture::new();
    let stdout = Stdout::default();
    let frontend = Frontend {
        output: Box::new(stdout.clone()),
        diagnostics: Box::new(capture.clone()),
        errors: Box::new(capture.clone()),
        style: Box::new(TerminalStyle),
    };
    let mut runner = Runner::with_prelude(config, &prelude, frontend)?;

    match cli.command {
        Commands::Check { .. } => {
            if runner.check(&source) {
                return Ok(());
            }
            emit_diagnostics(file, &source, &capture.diagnostics(), &capture.errors());
            Err(CliError::Rejected {
                problems: capture.errors().len(),
            })
        }
        Commands::Run { .. } => {
            let result = runner.run(&source);
            if stdout.open_line.get() {
                println!();
            }
            if !result.stack.is_empty() {
                println!("{}", render_stack(&result.stack));
            }
            let _ = std::io::stdout().flush();

            match result.outcome {
                Outcome::Completed | Outcome::Stopped => Ok(()),
                Outcome::Rejected => {
                    emit_diagnostics(file, &source, &capture.diagnostics(), &capture.errors());
                    Err(CliError::Rejected {
                        problems: capture.errors().len(),
                    })
                }
                Outcome::Failed => {
                    emit_diagnostics(file, &source, &capture.diagnostics(), &[]);
                    report_runtime_error(file, &result.error);
                    Err(CliError::Failed)
                }
            }
        }
    }
}
