use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use log::{LevelFilter, debug, info};
use oscwire_core::{
    InputInfo, Limits, MatchResult, Message, OscTime, StreamReport, SystemClock, ToolInfo,
    decode_stream, match_pattern,
};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("OSCWIRE_BUILD_COMMIT"),
    ", ",
    env!("OSCWIRE_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "oscwire")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Encode, decode and match Open Sound Control messages.",
    long_about = None,
    after_help = "Examples:\n  oscwire decode capture.bin -o report.json\n  oscwire encode /synth/freq f:440 s:sine -o msg.bin\n  oscwire match '/synth/*/freq' /synth/1/freq"
)]
struct Cli {
    /// Log level written to stderr (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a raw stream of OSC messages into a JSON report.
    Decode {
        /// Path (or glob matching one file) of the raw OSC bytes
        input: PathBuf,

        /// Output report path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,

        /// Reject malformed input and exit non-zero when decoding halts
        #[arg(long)]
        strict: bool,

        /// Largest string/blob payload to store, in bytes
        #[arg(long)]
        max_payload: Option<usize>,

        /// Largest number of bytes buffered for one segment
        #[arg(long)]
        max_buffer: Option<usize>,
    },
    /// Encode one message and write its wire bytes to a file.
    #[command(
        after_help = "Arguments:\n  i:<int32>  f:<float32>  d:<float64>  s:<text>  b:<hex>\n  t:<seconds>.<fraction>  t:now  T  F"
    )]
    Encode {
        /// OSC address, e.g. /synth/1/freq
        address: String,

        /// Typed arguments, e.g. i:42 f:0.5 s:hello
        #[arg(allow_hyphen_values = true)]
        args: Vec<String>,

        /// Output path for the encoded bytes
        #[arg(short = 'o', long)]
        output: PathBuf,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
    /// Match an address pattern against an address (exit 1 when not a full match).
    Match {
        pattern: String,
        address: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = init_logging(&cli.log_level).and_then(|()| match cli.command {
        Commands::Decode {
            input,
            report,
            stdout,
            pretty,
            compact,
            quiet,
            strict,
            max_payload,
            max_buffer,
        } => {
            let limits = Limits {
                max_payload_bytes: max_payload,
                max_decode_buffer: max_buffer,
                strict,
            };
            cmd_decode(input, report, stdout, pretty, compact, quiet, limits)
        }
        Commands::Encode {
            address,
            args,
            output,
            quiet,
        } => cmd_encode(&address, &args, &output, quiet),
        Commands::Match {
            pattern,
            address,
            pretty,
        } => cmd_match(&pattern, &address, pretty),
    });

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn init_logging(level: &str) -> Result<(), CliError> {
    let filter = LevelFilter::from_str(level).map_err(|_| {
        CliError::new(
            format!("invalid log level '{level}'"),
            Some("use off, error, warn, info, debug or trace".to_string()),
        )
    })?;
    env_logger::Builder::new()
        .filter_level(filter)
        .format_timestamp(None)
        .init();
    Ok(())
}

fn cmd_decode(
    input: PathBuf,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
    quiet: bool,
    limits: Limits,
) -> Result<ExitCode, CliError> {
    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;

    let report_path = if stdout {
        None
    } else {
        let path = report.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?;
        ensure_distinct_output(&path, &input_abs)?;
        Some(path)
    };

    let bytes = fs::read(&resolved_input)
        .with_context(|| format!("Failed to read input file: {}", resolved_input.display()))?;
    info!("decoding {} bytes from {}", bytes.len(), resolved_input.display());

    let mut rep = decode_stream(&bytes, &limits);
    rep.generated_at = now_rfc3339()?;
    rep.tool = Some(ToolInfo {
        name: "oscwire".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    });
    rep.input = Some(InputInfo {
        path: input.display().to_string(),
        bytes: bytes.len() as u64,
    });
    debug!(
        "decoded {} messages, pending: {}",
        rep.messages.len(),
        rep.pending.is_some()
    );
    let json = serialize_json(&rep, pretty, compact)?;

    match report_path {
        None => print!("{}", json),
        Some(path) => {
            create_parent_dir(&path)?;
            fs::write(&path, json)
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            if !quiet {
                eprintln!(
                    "OK: {} messages decoded, report written -> {}",
                    rep.messages.len(),
                    path.display()
                );
            }
        }
    }

    if limits.strict && decoding_halted(&rep) {
        return Err(CliError::new(
            "decoding halted on malformed input",
            Some("inspect the `pending` entry of the report".to_string()),
        ));
    }
    Ok(ExitCode::SUCCESS)
}

fn decoding_halted(rep: &StreamReport) -> bool {
    rep.pending.as_ref().is_some_and(|pending| pending.halted)
}

fn cmd_encode(
    address: &str,
    args: &[String],
    output: &Path,
    quiet: bool,
) -> Result<ExitCode, CliError> {
    if !address.starts_with('/') {
        return Err(CliError::new(
            format!("invalid address '{address}'"),
            Some("OSC addresses start with '/'".to_string()),
        ));
    }

    let mut msg = Message::new(address);
    for arg in args {
        add_cli_arg(&mut msg, arg)?;
    }
    if let Some(err) = msg.aggregate_error() {
        return Err(CliError::new(format!("cannot encode message: {err}"), None));
    }

    let bytes = msg.to_bytes();
    create_parent_dir(output)?;
    fs::write(output, &bytes)
        .with_context(|| format!("Failed to write output: {}", output.display()))?;
    if !quiet {
        eprintln!("OK: {} bytes written -> {}", bytes.len(), output.display());
    }
    Ok(ExitCode::SUCCESS)
}

/// Parse one `tag:value` argument and append it to `msg`.
fn add_cli_arg(msg: &mut Message, arg: &str) -> Result<(), CliError> {
    let invalid = |detail: String| {
        CliError::new(
            format!("invalid argument '{arg}': {detail}"),
            Some("use i:, f:, d:, s:, b:<hex>, t:<seconds>.<fraction>, t:now, T or F".to_string()),
        )
    };

    match arg {
        "T" => {
            msg.add(true);
            return Ok(());
        }
        "F" => {
            msg.add(false);
            return Ok(());
        }
        _ => {}
    }
    let Some((tag, value)) = arg.split_once(':') else {
        return Err(invalid("missing type prefix".to_string()));
    };
    match tag {
        "i" => msg.add(value.parse::<i32>().map_err(|err| invalid(err.to_string()))?),
        "f" => msg.add(value.parse::<f32>().map_err(|err| invalid(err.to_string()))?),
        "d" => msg.add(value.parse::<f64>().map_err(|err| invalid(err.to_string()))?),
        "s" => msg.add(value),
        "b" => msg.add(parse_hex(value).map_err(invalid)?.as_slice()),
        "t" if value == "now" => msg.add_time_now(&SystemClock),
        "t" => msg.add(parse_time(value).map_err(invalid)?),
        other => return Err(invalid(format!("unknown type '{other}'"))),
    };
    Ok(())
}

fn parse_hex(value: &str) -> Result<Vec<u8>, String> {
    if value.len() % 2 != 0 {
        return Err("hex blob needs an even number of digits".to_string());
    }
    (0..value.len())
        .step_by(2)
        .map(|i| {
            value
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| format!("invalid hex digits at offset {i}"))
        })
        .collect()
}

fn parse_time(value: &str) -> Result<OscTime, String> {
    let (seconds, fraction) = value.split_once('.').unwrap_or((value, "0"));
    let seconds = seconds.parse::<u32>().map_err(|err| err.to_string())?;
    let fraction = fraction.parse::<u32>().map_err(|err| err.to_string())?;
    Ok(OscTime::new(seconds, fraction))
}

#[derive(Serialize)]
struct MatchOutput<'a> {
    pattern: &'a str,
    address: &'a str,
    #[serde(flatten)]
    result: MatchResult,
    full: bool,
    route_offset: Option<usize>,
}

fn cmd_match(pattern: &str, address: &str, pretty: bool) -> Result<ExitCode, CliError> {
    let result = match_pattern(pattern, address);
    let out = MatchOutput {
        pattern,
        address,
        result,
        full: result.is_full(),
        route_offset: result.route_offset(address),
    };
    let json = serialize_json(&out, pretty, false)?;
    println!("{}", json);
    if out.full {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

fn serialize_json<T: Serialize>(value: &T, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(value)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(value)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn now_rfc3339() -> Result<String, CliError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("Failed to format report timestamp")
        .map_err(Into::into)
}

fn create_parent_dir(path: &Path) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    Ok(())
}

fn ensure_distinct_output(report_path: &Path, input_abs: &Path) -> Result<(), CliError> {
    let report_dir = match report_path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => fs::canonicalize("."),
        Some(parent) => fs::canonicalize(parent),
        None => return Ok(()),
    };
    // a missing output directory is created later, so it can't hold the input
    let Ok(report_dir) = report_dir else {
        return Ok(());
    };
    let Some(file_name) = report_path.file_name() else {
        return Err(CliError::new(
            format!("invalid report path: {}", report_path.display()),
            Some("pass a file path to -o/--report".to_string()),
        ));
    };
    if report_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!(
                "report path must differ from input: {}",
                report_path.display()
            ),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass a file holding raw OSC message bytes".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass a file holding raw OSC message bytes".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let listed = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let more = if count > 3 { ", ..." } else { "" };
            Err(CliError::new(
                format!("multiple files match pattern '{pattern}' ({count} matches); matches: {listed}{more}"),
                Some("pass a single input file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
