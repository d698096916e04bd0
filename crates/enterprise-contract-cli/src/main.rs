// crates/enterprise-contract-cli/src/main.rs
// ============================================================================
// Module: Enterprise Contract CLI Entry Point
// Description: Command dispatcher for the controller and generation tooling.
// Purpose: Run the PipelineRun controller and produce CRD/schema/doc artifacts.
// Dependencies: clap, enterprise-contract-api, enterprise-contract-controller, tokio
// ============================================================================

//! ## Overview
//! `enterprise-contract run` starts the controller. The remaining commands are
//! offline: they print or write the policy CRD, export the policy JSON schema,
//! regenerate or drift-check the docs examples, and validate configuration or
//! policy documents.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use enterprise_contract_api::GenerationError;
use enterprise_contract_api::PolicyValidator;
use enterprise_contract_api::ValidationError;
use enterprise_contract_api::crd_yaml;
use enterprise_contract_api::example_artifacts;
use enterprise_contract_api::schema::POLICY_SPEC_SCHEMA_FILE;
use enterprise_contract_api::schema_artifacts;
use enterprise_contract_controller::ConfigError;
use enterprise_contract_controller::ControllerConfig;
use enterprise_contract_controller::RuntimeError;
use enterprise_contract_controller::TelemetryError;
use enterprise_contract_controller::config::config_schema;
use enterprise_contract_controller::config::config_toml_example;
use enterprise_contract_controller::init_tracing;
use enterprise_contract_controller::runtime;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default output directory for docs examples.
const DEFAULT_EXAMPLES_DIR: &str = "docs/modules/ROOT/examples";
/// Maximum size of a policy document accepted by `policy validate`.
const MAX_POLICY_FILE_SIZE: u64 = 1024 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "enterprise-contract", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the PipelineRun controller.
    Run(RunCommand),
    /// Print or write the EnterpriseContractPolicy CRD manifest.
    Crd(CrdCommand),
    /// Policy JSON schema utilities.
    Schema {
        /// Selected schema subcommand.
        #[command(subcommand)]
        command: SchemaCommand,
    },
    /// Docs example utilities.
    Examples {
        /// Selected examples subcommand.
        #[command(subcommand)]
        command: ExamplesCommand,
    },
    /// Controller configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Policy document utilities.
    Policy {
        /// Selected policy subcommand.
        #[command(subcommand)]
        command: PolicyCommand,
    },
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Optional config file path (defaults to enterprise-contract.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for `crd`.
#[derive(Args, Debug)]
struct CrdCommand {
    /// Write the manifest here instead of stdout.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

/// Schema subcommands.
#[derive(Subcommand, Debug)]
enum SchemaCommand {
    /// Export the EnterpriseContractPolicySpec JSON schema.
    Export(SchemaExportCommand),
}

/// Arguments for `schema export`.
#[derive(Args, Debug)]
struct SchemaExportCommand {
    /// Output directory.
    #[arg(value_name = "DIR")]
    dir: PathBuf,
    /// Schema file name.
    #[arg(long, value_name = "NAME", default_value = POLICY_SPEC_SCHEMA_FILE)]
    file_name: String,
}

/// Examples subcommands.
#[derive(Subcommand, Debug)]
enum ExamplesCommand {
    /// Write or drift-check the docs examples.
    Generate(ExamplesGenerateCommand),
}

/// Arguments for `examples generate`.
#[derive(Args, Debug)]
struct ExamplesGenerateCommand {
    /// Output directory.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_EXAMPLES_DIR)]
    dir: PathBuf,
    /// Verify existing files instead of writing.
    #[arg(long)]
    check: bool,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate a config file.
    Validate(ConfigValidateCommand),
    /// Print a canonical example config.
    Example,
    /// Print the config JSON schema.
    Schema,
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to enterprise-contract.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Policy subcommands.
#[derive(Subcommand, Debug)]
enum PolicyCommand {
    /// Validate a policy document against the CRD schema.
    Validate(PolicyValidateCommand),
}

/// Arguments for `policy validate`.
#[derive(Args, Debug)]
struct PolicyValidateCommand {
    /// YAML or JSON policy document.
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI failures.
#[derive(Debug, Error)]
enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Logging could not be initialized.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    /// The controller failed to start.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    /// Artifact generation or verification failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),
    /// Policy validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// File or stream I/O failed.
    #[error("io error: {0}")]
    Io(String),
    /// Input could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Run(command) => command_run(command).await,
        Commands::Crd(command) => command_crd(&command),
        Commands::Schema { command } => match command {
            SchemaCommand::Export(command) => command_schema_export(&command),
        },
        Commands::Examples { command } => match command {
            ExamplesCommand::Generate(command) => command_examples_generate(&command),
        },
        Commands::Config { command } => command_config(command),
        Commands::Policy { command } => match command {
            PolicyCommand::Validate(command) => command_policy_validate(&command),
        },
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Loads config, installs logging, and runs the controller until shutdown.
async fn command_run(command: RunCommand) -> CliResult<ExitCode> {
    let config = ControllerConfig::load(command.config.as_deref())?;
    init_tracing(&config.logging)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "enterprise contract controller starting");
    runtime::run(&config).await?;
    Ok(ExitCode::SUCCESS)
}

/// Prints or writes the CRD manifest.
fn command_crd(command: &CrdCommand) -> CliResult<ExitCode> {
    let yaml = crd_yaml()?;
    match &command.output {
        Some(path) => {
            write_file(path, yaml.as_bytes())?;
            write_stdout_line(&format!("CRD written to {}", path.display()))?;
        }
        None => write_stdout_bytes(yaml.as_bytes())?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Writes the policy spec JSON schema into a directory.
fn command_schema_export(command: &SchemaExportCommand) -> CliResult<ExitCode> {
    let set = schema_artifacts(Some(&command.file_name))?;
    for path in set.write_to(&command.dir)? {
        write_stdout_line(&format!("JSON schema written to {}", path.display()))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Writes or verifies the docs examples.
fn command_examples_generate(command: &ExamplesGenerateCommand) -> CliResult<ExitCode> {
    let set = example_artifacts()?;
    if command.check {
        set.verify(&command.dir)?;
        write_stdout_line(&format!("examples up to date in {}", command.dir.display()))?;
    } else {
        for path in set.write_to(&command.dir)? {
            write_stdout_line(&format!("example written to {}", path.display()))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => {
            ControllerConfig::load(command.config.as_deref())?;
            write_stdout_line("config ok")?;
        }
        ConfigCommand::Example => write_stdout_bytes(config_toml_example().as_bytes())?,
        ConfigCommand::Schema => {
            let text = serde_json::to_string_pretty(&config_schema())
                .map_err(|err| CliError::Parse(err.to_string()))?;
            write_stdout_line(&text)?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Validates a policy document against the CRD schema.
fn command_policy_validate(command: &PolicyValidateCommand) -> CliResult<ExitCode> {
    let bytes = read_bytes_with_limit(&command.file, MAX_POLICY_FILE_SIZE)?;
    let document = parse_policy_document(&bytes)?;
    PolicyValidator::new()?.validate_value(&document)?;
    write_stdout_line(&format!("policy valid: {}", command.file.display()))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a YAML or JSON policy document.
fn parse_policy_document(bytes: &[u8]) -> CliResult<Value> {
    serde_yaml::from_slice(bytes).map_err(|err| CliError::Parse(err.to_string()))
}

/// Reads a file, failing when it exceeds `max_bytes`.
fn read_bytes_with_limit(path: &Path, max_bytes: u64) -> CliResult<Vec<u8>> {
    let file = File::open(path).map_err(|err| CliError::Io(format!("{}: {err}", path.display())))?;
    let mut bytes = Vec::new();
    file.take(max_bytes + 1)
        .read_to_end(&mut bytes)
        .map_err(|err| CliError::Io(format!("{}: {err}", path.display())))?;
    if bytes.len() as u64 > max_bytes {
        return Err(CliError::Io(format!("{} exceeds {max_bytes} bytes", path.display())));
    }
    Ok(bytes)
}

/// Writes a file, creating parent directories.
fn write_file(path: &Path, bytes: &[u8]) -> CliResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| CliError::Io(err.to_string()))?;
    }
    fs::write(path, bytes).map_err(|err| CliError::Io(format!("{}: {err}", path.display())))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| CliError::Io(format!("stdout: {err}")))
}

/// Writes raw bytes to stdout.
fn write_stdout_bytes(bytes: &[u8]) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes).map_err(|err| CliError::Io(format!("stdout: {err}")))
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
