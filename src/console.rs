//! Interactive console: the line-oriented front end over a [`SerialSession`].
//!
//! Every setting the operator can change lives in [`ConsoleSettings`] and is
//! passed explicitly to the session on each connect/send. Serial failures are
//! reported as log lines and never end the console; only malformed input
//! produces a [`ConsoleError`].

use crate::commands::{CommandTable, Section};
use crate::config::SerialConfig;
use crate::format::DisplayFormat;
use crate::log_sink::SharedSink;
use crate::port::{list_ports, PortError, PortInfo};
use crate::session::{ConnectionError, SendError, SerialSession};
use crate::terminator::EndChar;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::debug;

const HELP: &str = "\
Commands:
  help                      Show this help
  list [query]              Show commands (filtered by name when a query is given)
  ports                     List available serial ports
  connect [port] [baud]     Open the serial port
  disconnect                Close the serial port
  port <name>               Select the serial port
  baud [rate]               Select the baud rate (lists the offered rates without one)
  end <option>              Line terminator: none, cr, lf, cr+lf, lf+cr, null
  format <mode>             Display format: ascii, hex, hex+ascii, dec
  send <NAME|0xHH|decimal>  Send one command byte (a bare NAME works too)
  status                    Show connection state and settings
  quit | exit               Leave the console";

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Unknown command: '{0}'. Type 'help' for a list of commands.")]
    UnknownCommand(String),

    #[error("Invalid argument for '{command}': {message}")]
    InvalidArgument {
        command: &'static str,
        message: String,
    },

    #[error("Unknown constant: '{0}'")]
    UnknownConstant(String),

    #[error("No serial port selected. Use 'port <name>' or 'connect <name>'.")]
    NoPortSelected,

    #[error("Failed to list ports: {0}")]
    Ports(#[from] PortError),

    #[error("Console I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ConsoleError {
    fn invalid(command: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            command,
            message: message.into(),
        }
    }
}

/// What the caller should do after a line was executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Operator-selected settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub port: Option<String>,
    pub baud_rate: u32,
    /// Rates suggested by `baud` and `status`; any positive rate is accepted.
    pub baud_rates: Vec<u32>,
    pub end_char: EndChar,
    pub display_format: DisplayFormat,
    /// Last `list` query; empty shows everything.
    pub filter: String,
}

impl From<&SerialConfig> for ConsoleSettings {
    fn from(config: &SerialConfig) -> Self {
        Self {
            port: config.default_port.clone(),
            baud_rate: config.default_baud,
            baud_rates: config.baud_rates.clone(),
            end_char: config.end_char,
            display_format: config.display_format,
            filter: String::new(),
        }
    }
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self::from(&SerialConfig::default())
    }
}

impl ConsoleSettings {
    fn baud_rates_line(&self) -> String {
        let rates: Vec<String> = self.baud_rates.iter().map(u32::to_string).collect();
        format!("Baud rates: {}", rates.join(", "))
    }
}

type PortLister = Box<dyn Fn() -> Result<Vec<PortInfo>, PortError> + Send>;

pub struct Console<W: Write> {
    table: CommandTable,
    session: SerialSession,
    settings: ConsoleSettings,
    sink: SharedSink,
    out: W,
    port_lister: PortLister,
}

impl<W: Write> Console<W> {
    /// `sink` receives operator log lines (errors included); `out` receives
    /// listings, help and the prompt.
    pub fn new(
        table: CommandTable,
        session: SerialSession,
        settings: ConsoleSettings,
        sink: SharedSink,
        out: W,
    ) -> Self {
        session.set_display_format(settings.display_format);
        Self {
            table,
            session,
            settings,
            sink,
            out,
            port_lister: Box::new(list_ports),
        }
    }

    /// Replace the system port enumeration (used by tests).
    pub fn with_port_lister(
        mut self,
        lister: impl Fn() -> Result<Vec<PortInfo>, PortError> + Send + 'static,
    ) -> Self {
        self.port_lister = Box::new(lister);
        self
    }

    pub fn settings(&self) -> &ConsoleSettings {
        &self.settings
    }

    pub fn session(&self) -> &SerialSession {
        &self.session
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Read lines from `input` until EOF or `quit`. Input errors end the loop;
    /// command errors are printed and the loop continues.
    pub fn run(&mut self, input: impl BufRead) -> Result<(), ConsoleError> {
        writeln!(self.out, "Type 'help' for a list of commands.")?;
        let mut lines = input.lines();
        loop {
            write!(self.out, "> ")?;
            self.out.flush()?;
            let Some(line) = lines.next() else { break };
            match self.execute(&line?) {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => writeln!(self.out, "{e}")?,
            }
        }
        self.session.disconnect();
        Ok(())
    }

    /// Execute one console line.
    pub fn execute(&mut self, line: &str) -> Result<Flow, ConsoleError> {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return Ok(Flow::Continue);
        };
        let args: Vec<&str> = words.collect();
        debug!(command = first, ?args, "console command");

        match first.to_lowercase().as_str() {
            "help" | "?" => writeln!(self.out, "{HELP}")?,
            "list" | "ls" => self.list(&args.join(" "))?,
            "ports" => self.ports()?,
            "connect" | "open" => self.connect(&args)?,
            "disconnect" | "close" => {
                if !self.session.disconnect() {
                    writeln!(self.out, "Not connected.")?;
                }
            }
            "port" => match args.as_slice() {
                [name] => {
                    self.settings.port = Some(name.to_string());
                    writeln!(self.out, "Port: {name}")?;
                }
                _ => return Err(ConsoleError::invalid("port", "expected one port name")),
            },
            "baud" if args.is_empty() => {
                writeln!(self.out, "{}", self.settings.baud_rates_line())?;
                writeln!(self.out, "Baud rate: {}", self.settings.baud_rate)?;
            }
            "baud" => {
                self.settings.baud_rate = parse_baud("baud", &args)?;
                writeln!(self.out, "Baud rate: {}", self.settings.baud_rate)?;
            }
            "end" if args.is_empty() => {
                return Err(ConsoleError::invalid("end", "expected a terminator option"))
            }
            "end" => {
                let end: EndChar = args
                    .join(" ")
                    .parse()
                    .map_err(|e: String| ConsoleError::invalid("end", e))?;
                self.settings.end_char = end;
                writeln!(self.out, "End character: {} (Hex: {})", end, end.hex_label())?;
            }
            "format" => {
                let format: DisplayFormat = args
                    .join(" ")
                    .parse()
                    .map_err(|e: String| ConsoleError::invalid("format", e))?;
                self.settings.display_format = format;
                self.session.set_display_format(format);
                writeln!(self.out, "Display format: {format}")?;
            }
            "send" => match args.as_slice() {
                [target] => self.send(target)?,
                _ => {
                    return Err(ConsoleError::invalid(
                        "send",
                        "expected a command name, 0xHH or a decimal byte",
                    ))
                }
            },
            "status" => self.status()?,
            "quit" | "exit" | "q" => return Ok(Flow::Quit),
            _ if args.is_empty() && self.table.find(first).is_some() => self.send(first)?,
            _ => return Err(ConsoleError::UnknownCommand(first.to_string())),
        }
        Ok(Flow::Continue)
    }

    fn list(&mut self, query: &str) -> Result<(), ConsoleError> {
        self.settings.filter = query.trim().to_string();
        let view = self.table.filter(&self.settings.filter);
        if view.is_empty() {
            if self.settings.filter.is_empty() {
                writeln!(self.out, "No commands defined.")?;
            } else {
                writeln!(self.out, "No commands match '{}'.", self.settings.filter)?;
            }
            return Ok(());
        }
        render_table(&view, &mut self.out)?;
        Ok(())
    }

    fn ports(&mut self) -> Result<(), ConsoleError> {
        let ports = (self.port_lister)()?;
        if ports.is_empty() {
            writeln!(self.out, "No serial ports found.")?;
        }
        for port in ports {
            match &port.description {
                Some(desc) => writeln!(self.out, "  {} [{}] {}", port.name, port.kind, desc)?,
                None => writeln!(self.out, "  {} [{}]", port.name, port.kind)?,
            }
        }
        Ok(())
    }

    fn connect(&mut self, args: &[&str]) -> Result<(), ConsoleError> {
        match args {
            [] => {}
            [port] => self.settings.port = Some(port.to_string()),
            [port, baud] => {
                self.settings.baud_rate = parse_baud("connect", &[baud])?;
                self.settings.port = Some(port.to_string());
            }
            _ => return Err(ConsoleError::invalid("connect", "expected [port] [baud]")),
        }
        let port = self
            .settings
            .port
            .clone()
            .ok_or(ConsoleError::NoPortSelected)?;

        if let Err(e) = self.session.connect(&port, self.settings.baud_rate) {
            match e {
                ConnectionError::AlreadyConnected(_) => writeln!(self.out, "{e}")?,
                ConnectionError::Open(_) => self.sink.append(&format!("Connection error: {e}")),
            }
        }
        Ok(())
    }

    fn send(&mut self, target: &str) -> Result<(), ConsoleError> {
        let value = resolve_byte(&self.table, target)?;
        match self.session.send(value, self.settings.end_char.bytes()) {
            Ok(_) => {}
            Err(SendError::NotConnected) => self.sink.append("Serial port not open."),
            Err(e @ SendError::Transport(_)) => self.sink.append(&format!("Send error: {e}")),
        }
        Ok(())
    }

    fn status(&mut self) -> Result<(), ConsoleError> {
        match self.session.connection_info() {
            Some((port, baud)) => writeln!(self.out, "Status: connected to {port} at {baud} baud")?,
            None => writeln!(self.out, "Status: disconnected")?,
        }
        let s = &self.settings;
        writeln!(self.out, "Port: {}", s.port.as_deref().unwrap_or("(none)"))?;
        writeln!(self.out, "Baud rate: {}", s.baud_rate)?;
        writeln!(self.out, "{}", s.baud_rates_line())?;
        writeln!(self.out, "End character: {} (Hex: {})", s.end_char, s.end_char.hex_label())?;
        writeln!(self.out, "Display format: {}", s.display_format)?;
        writeln!(
            self.out,
            "Definitions: {} groups, {} constants",
            self.table.len(),
            self.table.constant_count()
        )?;
        Ok(())
    }
}

/// Write `table` as one block per group: a `▶ Name` header followed by the
/// commands and their ack responses side by side.
pub fn render_table(table: &CommandTable, out: &mut impl Write) -> io::Result<()> {
    const LEFT_HEADER: &str = "Commands";
    const RIGHT_HEADER: &str = "Ack Responses";

    for group in table {
        writeln!(out, "▶ {}", group.name)?;
        let left: Vec<String> = group
            .section(Section::Commands)
            .iter()
            .map(ToString::to_string)
            .collect();
        let right: Vec<String> = group
            .section(Section::Acks)
            .iter()
            .map(ToString::to_string)
            .collect();
        let width = left
            .iter()
            .map(|s| s.chars().count())
            .max()
            .unwrap_or(0)
            .max(LEFT_HEADER.len());

        if right.is_empty() {
            writeln!(out, "  {LEFT_HEADER}")?;
        } else {
            writeln!(out, "  {LEFT_HEADER:<width$}    {RIGHT_HEADER}")?;
        }
        for row in 0..left.len().max(right.len()) {
            let l = left.get(row).map(String::as_str).unwrap_or("");
            match right.get(row) {
                Some(r) => writeln!(out, "  {l:<width$}    {r}")?,
                None => writeln!(out, "  {l}")?,
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Resolve a `send` target: a constant name, `0xHH` or a decimal byte.
/// Constant names win, so a constant called `0x10` shadows the literal.
pub fn resolve_byte(table: &CommandTable, target: &str) -> Result<u8, ConsoleError> {
    if let Some(found) = table.find(target) {
        return Ok(found.def.byte());
    }
    let not_a_byte = || ConsoleError::invalid("send", format!("'{target}' is not a byte"));
    if let Some(hex) = target
        .strip_prefix("0x")
        .or_else(|| target.strip_prefix("0X"))
    {
        return u8::from_str_radix(hex, 16).map_err(|_| not_a_byte());
    }
    if !target.is_empty() && target.chars().all(|c| c.is_ascii_digit()) {
        return target.parse::<u8>().map_err(|_| not_a_byte());
    }
    Err(ConsoleError::UnknownConstant(target.to_string()))
}

fn parse_baud(command: &'static str, args: &[&str]) -> Result<u32, ConsoleError> {
    match args {
        [value] => match value.parse::<u32>() {
            Ok(rate) if rate > 0 => Ok(rate),
            _ => Err(ConsoleError::invalid(
                command,
                format!("'{value}' is not a valid baud rate"),
            )),
        },
        _ => Err(ConsoleError::invalid(command, "expected one baud rate")),
    }
}
