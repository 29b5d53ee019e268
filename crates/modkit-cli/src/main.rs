mod modules;

use clap::{Args, Parser, Subcommand};
use modkit_core::{
    execute, parse_input, read_input, write_result, CoreError, ModuleConfig, ModuleInput,
    ModuleResult, LOG_ENV,
};
use modules::Definition;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const EXIT_FAILURE: u8 = 1;

#[derive(Debug, Parser)]
#[command(
    name = "modkit",
    version,
    about = "Idempotent host configuration modules driven by a JSON argument document"
)]
struct Cli {
    /// Host configuration file (JSON).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose (debug) logging on stderr.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    #[command(subcommand)]
    module: ModuleCommand,
}

#[derive(Debug, Args)]
struct ArgsSource {
    /// JSON file holding the module arguments. Without it the arguments come
    /// from MODKIT_MODULE_ARGS or stdin.
    args_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum ModuleCommand {
    /// Ensure a directory, symlink, or file mode.
    File(ArgsSource),
    /// Ensure a file holds given content or a copy of another file.
    Copy(ArgsSource),
    /// Ensure a file contains a block of text.
    Append(ArgsSource),
    /// Substitute every match of a regular expression in a file.
    Replace(ArgsSource),
    /// Run a command, optionally guarded by creates/removes paths.
    Command(ArgsSource),
    /// Report metadata about a path.
    Stat(ArgsSource),
}

impl ModuleCommand {
    fn args_file(&self) -> Option<&Path> {
        match self {
            Self::File(a)
            | Self::Copy(a)
            | Self::Append(a)
            | Self::Replace(a)
            | Self::Command(a)
            | Self::Stat(a) => a.args_file.as_deref(),
        }
    }

    fn definition(&self) -> Definition {
        match self {
            Self::File(_) => modules::file::definition(),
            Self::Copy(_) => modules::copy::definition(),
            Self::Append(_) => modules::append::definition(),
            Self::Replace(_) => modules::replace::definition(),
            Self::Command(_) => modules::command::definition(),
            Self::Stat(_) => modules::stat::definition(),
        }
    }
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let (config, input) = match prepare(&cli) {
        Ok(prepared) => prepared,
        Err(e) => {
            init_logging(cli.verbose, LOG_ENV);
            return emit(&ModuleResult::failure(e.to_string()));
        }
    };
    init_logging(cli.verbose || input.debug, &config.log_filter_env);

    let definition = cli.module.definition();
    let result = execute(
        &input,
        &definition.schema,
        &definition.constraints,
        definition.options,
        &config,
        definition.body,
    );
    emit(&result)
}

fn prepare(cli: &Cli) -> Result<(ModuleConfig, ModuleInput), CoreError> {
    let config = match &cli.config {
        Some(path) => ModuleConfig::load(path)?,
        None => ModuleConfig::from_env(),
    };
    let input = match cli.module.args_file() {
        Some(path) => parse_input(&std::fs::read_to_string(path)?)?,
        None => read_input(&config)?,
    };
    Ok((config, input))
}

// stdout carries the result envelope, so logs go to stderr.
fn init_logging(verbose: bool, filter_env: &str) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env(filter_env)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn emit(result: &ModuleResult) -> ExitCode {
    if let Err(e) = write_result(result, std::io::stdout().lock()) {
        eprintln!("error: {e}");
        return ExitCode::from(EXIT_FAILURE);
    }
    ExitCode::from(result.exit_code())
}
