//! Command-line argument parsing.

use std::env;
use std::path::PathBuf;

use chrono::NaiveDate;

/// Default preset when neither `--scenario` nor `--preset` is given.
pub const DEFAULT_PRESET: &str = "campus";

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    /// TOML scenario file.
    pub scenario: Option<PathBuf>,
    /// Built-in preset name.
    pub preset: Option<String>,
    /// CSV catalog replacing the scenario's devices.
    pub catalog: Option<PathBuf>,
    /// CSV forecast replacing the scenario's forecast source.
    pub forecast: Option<PathBuf>,
    /// Target day; tomorrow in the site zone when absent.
    pub date: Option<NaiveDate>,
    /// Schedule table CSV output.
    pub schedule_out: Option<PathBuf>,
    /// Timeline CSV output.
    pub timeline_out: Option<PathBuf>,
    /// `--help` was requested.
    pub help: bool,
    /// Start the REST API after planning.
    #[cfg(feature = "api")]
    pub serve: bool,
    /// API port.
    #[cfg(feature = "api")]
    pub port: u16,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            scenario: None,
            preset: None,
            catalog: None,
            forecast: None,
            date: None,
            schedule_out: None,
            timeline_out: None,
            help: false,
            #[cfg(feature = "api")]
            serve: false,
            #[cfg(feature = "api")]
            port: 3000,
        }
    }
}

/// Parses the process arguments.
///
/// # Errors
///
/// Returns a message describing the first malformed argument.
pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(&args)
}

/// Parses an argument list (without the program name).
///
/// # Errors
///
/// Returns a message describing the first malformed argument.
pub fn parse_args_from(args: &[String]) -> Result<CliOptions, String> {
    let mut opts = CliOptions::default();
    let mut i = 0usize;

    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --scenario (expected a TOML file path)")?;
                set_once(&mut opts.scenario, PathBuf::from(path), "--scenario")?;
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                set_once(&mut opts.preset, name.to_string(), "--preset")?;
            }
            "--catalog" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --catalog (expected a CSV file path)")?;
                set_once(&mut opts.catalog, PathBuf::from(path), "--catalog")?;
            }
            "--forecast" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --forecast (expected a CSV file path)")?;
                set_once(&mut opts.forecast, PathBuf::from(path), "--forecast")?;
            }
            "--date" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --date (expected YYYY-MM-DD)")?;
                let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|e| format!("invalid --date \"{raw}\": {e}"))?;
                set_once(&mut opts.date, date, "--date")?;
            }
            "--schedule-out" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --schedule-out (expected a file path)")?;
                set_once(&mut opts.schedule_out, PathBuf::from(path), "--schedule-out")?;
            }
            "--timeline-out" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --timeline-out (expected a file path)")?;
                set_once(&mut opts.timeline_out, PathBuf::from(path), "--timeline-out")?;
            }
            #[cfg(feature = "api")]
            "--serve" => opts.serve = true,
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --port (expected a u16)")?;
                opts.port = raw
                    .parse::<u16>()
                    .map_err(|_| format!("--port value \"{raw}\" is not a valid u16"))?;
            }
            "--help" | "-h" => opts.help = true,
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.scenario.is_some() && opts.preset.is_some() {
        return Err(
            "arguments `--scenario` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    if opts.scenario.is_none() && opts.preset.is_none() {
        opts.preset = Some(DEFAULT_PRESET.to_string());
    }

    Ok(opts)
}

fn set_once<T>(slot: &mut Option<T>, value: T, flag: &str) -> Result<(), String> {
    if slot.replace(value).is_some() {
        return Err(format!("{flag} provided more than once"));
    }
    Ok(())
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

/// Prints usage to stderr.
pub fn print_usage() {
    eprintln!("solar-shift: solar-aligned day-ahead load scheduler");
    eprintln!();
    eprintln!("Usage: solar-shift [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset (campus, constrained, empty)"
    );
    eprintln!("  --catalog <path>         Read the load catalog from CSV");
    eprintln!("  --forecast <path>        Read forecast points from CSV");
    eprintln!("  --date <YYYY-MM-DD>      Target day (default: tomorrow in the site zone)");
    eprintln!("  --schedule-out <path>    Export the per-slot schedule to CSV");
    eprintln!("  --timeline-out <path>    Export the run timeline to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after planning");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the campus preset is used.");
}
