//! Binary entry point for the mockc CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Generator mode: every mockc.json under the given directories
//! mockc ./...
//!
//! # Flag mode: one mock described on the command line
//! mockc --name MockcCache --destination mock_gen.go --index mockc.json example.com/cache.Cache
//!
//! # Fail if generated files are out of date
//! mockc --check .
//! ```
//!
//! All results are printed to stdout as JSON; logs go to stderr.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, ValueEnum};

use mockc::cli::{run_flag_mode, FlagConfig};
use mockc::driver::{generate_patterns, GenerateOptions, OutputMode};
use mockc_core::error::{MockcError, OutputErrorCode};
use mockc_core::output::{emit_response, ErrorInfo, ErrorResponse, GenerateResponse, UnitReport};

// ============================================================================
// CLI Structure
// ============================================================================

/// Generate record-and-stub mocks for Go interfaces.
#[derive(Parser, Debug)]
#[command(name = "mockc", version, about = "Generate record-and-stub mocks for Go interfaces")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(flatten)]
    flags: FlagArgs,

    /// Directories or index files to generate from; in flag mode, the
    /// `{module-path}.{InterfaceName}` patterns to implement.
    args: Vec<String>,
}

/// Options for every mode.
#[derive(Args, Debug)]
struct GlobalArgs {
    /// Log level for tracing output.
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Render without writing; include the content in the output.
    #[arg(long, conflicts_with = "check")]
    dry_run: bool,

    /// Fail if any generated file on disk is missing or out of date.
    #[arg(long)]
    check: bool,
}

/// Flag mode: giving `--name` or `--destination` selects it.
#[derive(Args, Debug)]
struct FlagArgs {
    /// Name of the mock.
    #[arg(long)]
    name: Option<String>,

    /// File to write the mock to.
    #[arg(long)]
    destination: Option<String>,

    /// Prefix of the mock's field names (default "_").
    #[arg(long)]
    field_name_prefix: Option<String>,

    /// Suffix of the mock's field names (default "").
    #[arg(long)]
    field_name_suffix: Option<String>,

    /// Also generate a constructor with this name.
    #[arg(long)]
    constructor: Option<String>,

    /// Index file describing the module the mock is generated into.
    #[arg(long)]
    index: Option<PathBuf>,
}

impl FlagArgs {
    fn is_flag_mode(&self) -> bool {
        self.name.is_some() || self.destination.is_some()
    }
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(response) => {
            let code = response.first_error_code();
            if let Err(e) = emit_response(&response, &mut io::stdout()) {
                tracing::error!(error = %e, "cannot write response");
                return ExitCode::from(OutputErrorCode::InternalError.code());
            }
            let _ = io::stdout().flush();
            match code {
                Some(code) => ExitCode::from(code),
                None => ExitCode::SUCCESS,
            }
        }
        Err(err) => {
            let response = ErrorResponse::new(ErrorInfo::from_error(&err));
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();
            ExitCode::from(err.error_code().code())
        }
    }
}

/// Initialize tracing subscriber.
///
/// `RUST_LOG` wins over `--log-level`. Output goes to stderr so stdout stays JSON.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn execute(cli: Cli) -> Result<GenerateResponse, MockcError> {
    let mode = if cli.global.dry_run {
        OutputMode::DryRun
    } else if cli.global.check {
        OutputMode::Check
    } else {
        OutputMode::Write
    };
    let options = GenerateOptions {
        mode,
        ..GenerateOptions::default()
    };

    if cli.flags.is_flag_mode() {
        let FlagArgs {
            name,
            destination,
            field_name_prefix,
            field_name_suffix,
            constructor,
            index,
        } = cli.flags;
        let config = FlagConfig::from_parts(
            name,
            destination,
            field_name_prefix,
            field_name_suffix,
            constructor,
            index,
            cli.args,
        )?;
        let report = run_flag_mode(&config, &options).unwrap_or_else(|err| {
            UnitReport::failure(config.destination.clone(), vec![config.name.clone()], &err)
        });
        return Ok(GenerateResponse::new(vec![report]));
    }

    let patterns: Vec<PathBuf> = cli.args.iter().map(PathBuf::from).collect();
    let reports = generate_patterns(&patterns, &options)?;
    Ok(GenerateResponse::new(reports))
}
