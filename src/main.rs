use clap::{Args, Parser, Subcommand};
use serial_cmd_sender::commands::{self, CommandTable};
use serial_cmd_sender::config::{Config, ConfigLoader, LogFormat, LoggingConfig};
use serial_cmd_sender::console::{render_table, resolve_byte, Console, ConsoleSettings};
use serial_cmd_sender::port::list_ports;
use serial_cmd_sender::{
    AppError, AppResult, DisplayFormat, EndChar, SerialSession, SharedSink, StdoutSink,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "serial_cmd_sender",
    version,
    about = "Send named command bytes from a *_commands.h file over a serial port.",
    long_about = "Loads the first *_commands.h file found in the definitions directory, groups its \
                  #define constants under their // header comments, and sends any of them over a \
                  serial port followed by a selectable line terminator. Everything the device \
                  sends back is printed in ASCII, HEX, HEX + ASCII or DEC."
)]
struct Cli {
    /// Configuration file (defaults to the standard lookup).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Definitions file, or directory searched for *_commands.h.
    #[arg(short, long, global = true, value_name = "PATH")]
    definitions: Option<PathBuf>,

    /// Enable debug diagnostics on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the command table.
    List {
        /// Only constants whose name contains this text (case-insensitive).
        #[arg(short, long)]
        filter: Option<String>,

        /// Print the table as JSON.
        #[arg(long)]
        json: bool,
    },
    /// List available serial ports.
    Ports {
        /// Print the ports as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Send one command byte, print the responses, and exit.
    Send {
        /// Constant name, 0xHH, or a decimal byte.
        command: String,

        #[command(flatten)]
        serial: SerialArgs,

        /// How long to keep listening for responses after sending.
        #[arg(long, default_value_t = 1000, value_name = "MS")]
        listen_ms: u64,
    },
    /// Print everything the device sends until Ctrl+C.
    Monitor {
        #[command(flatten)]
        serial: SerialArgs,
    },
    /// Interactive console (the default).
    Console {
        #[command(flatten)]
        serial: SerialArgs,
    },
}

/// Overrides for the `[serial]` configuration section.
#[derive(Args, Debug, Default)]
struct SerialArgs {
    /// Serial port name, e.g. COM3 or /dev/ttyUSB0.
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate.
    #[arg(short, long)]
    baud: Option<u32>,

    /// Line terminator: none, cr, lf, cr+lf, lf+cr, null.
    #[arg(short, long, value_name = "OPTION")]
    end_char: Option<EndChar>,

    /// Display format: ascii, hex, hex+ascii, dec.
    #[arg(short, long, value_name = "MODE")]
    format: Option<DisplayFormat>,
}

impl SerialArgs {
    fn settings(&self, config: &Config) -> ConsoleSettings {
        let mut settings = ConsoleSettings::from(&config.serial);
        if let Some(port) = &self.port {
            settings.port = Some(port.clone());
        }
        if let Some(baud) = self.baud {
            settings.baud_rate = baud;
        }
        if let Some(end_char) = self.end_char {
            settings.end_char = end_char;
        }
        if let Some(format) = self.format {
            settings.display_format = format;
        }
        settings
    }
}

// --- Main Application Entry Point ---
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => ConfigLoader::load_from(path),
        None => ConfigLoader::load(),
    };
    let loader = match loaded {
        Ok(loader) => loader,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&loader.config().logging, cli.verbose);
    if let Some(path) = &loader.config_path {
        debug!(path = %path.display(), "configuration loaded");
    }

    match run(cli, loader.into_config()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fatal error");
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

/// Diagnostics go to stderr so operator output on stdout stays clean.
/// `RUST_LOG` wins over `--verbose`, which wins over `logging.level`.
fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);
    match logging.format {
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

async fn run(cli: Cli, config: Config) -> AppResult<()> {
    let Cli {
        definitions,
        command,
        ..
    } = cli;
    let definitions = definitions.unwrap_or_else(|| config.definitions.dir.clone());
    let command = command.unwrap_or(Command::Console {
        serial: SerialArgs::default(),
    });

    match command {
        Command::List { filter, json } => {
            let table = load_table(&definitions, &config)?;
            list(&table, filter.as_deref().unwrap_or(""), json)
        }
        Command::Ports { json } => ports(json),
        Command::Send {
            command,
            serial,
            listen_ms,
        } => {
            let table = load_table(&definitions, &config)?;
            send_once(
                &table,
                &command,
                serial.settings(&config),
                &config,
                Duration::from_millis(listen_ms),
            )
            .await
        }
        Command::Monitor { serial } => monitor(serial.settings(&config), &config).await,
        Command::Console { serial } => {
            let table = load_table(&definitions, &config)?;
            let settings = serial.settings(&config);
            let session = new_session(&config);
            let sink = operator_sink(&config);
            tokio::task::spawn_blocking(move || {
                let mut console = Console::new(table, session, settings, sink, io::stdout());
                console.run(io::stdin().lock())
            })
            .await
            .map_err(|e| AppError::IoError(io::Error::other(e)))??;
            Ok(())
        }
    }
}

fn load_table(target: &Path, config: &Config) -> AppResult<CommandTable> {
    let (path, table) = commands::load(target, &config.definitions.suffix)?;
    info!(
        path = %path.display(),
        groups = table.len(),
        constants = table.constant_count(),
        "loaded command definitions"
    );
    Ok(table)
}

fn operator_sink(config: &Config) -> SharedSink {
    Arc::new(StdoutSink::new(config.logging.timestamps))
}

fn new_session(config: &Config) -> SerialSession {
    SerialSession::system(operator_sink(config)).with_read_timeout(config.serial.read_timeout())
}

fn list(table: &CommandTable, filter: &str, json: bool) -> AppResult<()> {
    let view = table.filter(filter);
    let mut out = io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&view)?)?;
    } else if view.is_empty() {
        writeln!(out, "No commands match '{filter}'.")?;
    } else {
        render_table(&view, &mut out)?;
    }
    Ok(())
}

fn ports(json: bool) -> AppResult<()> {
    let ports = list_ports()?;
    let mut out = io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&ports)?)?;
        return Ok(());
    }
    if ports.is_empty() {
        writeln!(out, "No serial ports found.")?;
    }
    for port in ports {
        match port.description {
            Some(desc) => writeln!(out, "{} [{}] {}", port.name, port.kind, desc)?,
            None => writeln!(out, "{} [{}]", port.name, port.kind)?,
        }
    }
    Ok(())
}

fn connect(settings: &ConsoleSettings, config: &Config) -> AppResult<SerialSession> {
    let port = settings.port.as_deref().ok_or(AppError::NoPort)?;
    let mut session = new_session(config).with_format(settings.display_format);
    session.connect(port, settings.baud_rate)?;
    Ok(session)
}

async fn send_once(
    table: &CommandTable,
    target: &str,
    settings: ConsoleSettings,
    config: &Config,
    listen: Duration,
) -> AppResult<()> {
    let value = resolve_byte(table, target)?;
    let mut session = connect(&settings, config)?;
    session.send(value, settings.end_char.bytes())?;
    tokio::time::sleep(listen).await;
    session.disconnect();
    Ok(())
}

async fn monitor(settings: ConsoleSettings, config: &Config) -> AppResult<()> {
    let mut session = connect(&settings, config)?;
    info!("monitoring; press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    session.disconnect();
    Ok(())
}
