use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Subcommand};
use hanlink_frame::DeviceProfile;
use hanlink_pipeline::PipelineConfig;

use crate::exit::{config_error, profile_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod drive;
pub mod read;
pub mod sample;
pub mod simulate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read frames from a meter port and print decoded readings.
    Read(ReadArgs),
    /// Run the pipeline against a simulated meter.
    Simulate(SimulateArgs),
    /// Validate and decode one captured frame.
    Decode(DecodeArgs),
    /// Write the built-in sample frame to stdout.
    Sample,
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Read(args) => read::run(args, format),
        Command::Simulate(args) => simulate::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Sample => sample::run(),
        Command::Version(args) => version::run(args),
    }
}

/// Options shared by every command that runs the pipeline.
#[derive(Args, Debug)]
pub struct PipelineArgs {
    /// Device profile (JSON). Default: built-in profile.
    #[arg(long, env = "HANLINK_PROFILE", value_name = "FILE")]
    pub profile: Option<PathBuf>,
    /// Time a partial frame may take to complete (e.g. 2s, 1500ms).
    #[arg(long, env = "HANLINK_ASSEMBLY_TIMEOUT", default_value = "2s")]
    pub assembly_timeout: String,
    /// Silence tolerated before reconnecting (e.g. 11s).
    #[arg(long, env = "HANLINK_WATCHDOG_TIMEOUT", default_value = "11s")]
    pub watchdog_timeout: String,
    /// Exit after printing N readings.
    #[arg(long)]
    pub count: Option<u64>,
}

impl PipelineArgs {
    pub fn config(&self) -> CliResult<PipelineConfig> {
        let config = PipelineConfig::default()
            .with_profile(load_profile(self.profile.as_deref())?)
            .with_assembly_timeout(parse_duration(&self.assembly_timeout)?)
            .with_watchdog_timeout(parse_duration(&self.watchdog_timeout)?);
        config
            .validate()
            .map_err(|err| config_error("invalid configuration", err))?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Source: tcp://host:port, unix:///path/to.sock, serial:///dev/tty?baud=N,
    /// or a device, FIFO or capture file path. A capture is read once.
    #[arg(env = "HANLINK_TARGET")]
    pub target: String,
    #[command(flatten)]
    pub pipeline: PipelineArgs,
    /// Keep retrying a failed open, waiting this long between attempts (e.g. 5s).
    #[arg(long, value_name = "DELAY")]
    pub retry_open: Option<String>,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Time between simulated frames (e.g. 10s, 500ms).
    #[arg(long, env = "HANLINK_SIM_INTERVAL", default_value = "10s")]
    pub interval: String,
    /// Replay this captured frame instead of the built-in sample.
    #[arg(long, value_name = "FILE")]
    pub frame: Option<PathBuf>,
    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// File holding a captured frame. Default: stdin.
    pub file: Option<PathBuf>,
    /// Device profile (JSON). Default: built-in profile.
    #[arg(long, env = "HANLINK_PROFILE", value_name = "FILE")]
    pub profile: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn load_profile(path: Option<&Path>) -> CliResult<DeviceProfile> {
    let Some(path) = path else {
        return Ok(DeviceProfile::default());
    };
    DeviceProfile::from_json_file(path)
        .map_err(|err| profile_error("failed to load profile", err))
}

/// Parse `150ms`, `2s` or bare seconds. Zero is rejected.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("11").unwrap(), Duration::from_secs(11));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
    }

    #[test]
    fn missing_profile_file_fails() {
        let err = load_profile(Some(Path::new("/nonexistent/hanlink-profile.json"))).unwrap_err();
        assert!(err.message.contains("failed to load profile"));
    }

    #[test]
    fn invalid_profile_file_is_usage_error() {
        let path = std::env::temp_dir().join(format!(
            "hanlink-profile-invalid-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{"frame_length": 0}"#).unwrap();

        let err = load_profile(Some(&path)).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert_eq!(err.code, USAGE);
        assert!(err.message.contains("failed to load profile"));
    }

    #[test]
    fn default_pipeline_args_build_default_config() {
        let args = PipelineArgs {
            profile: None,
            assembly_timeout: "2s".into(),
            watchdog_timeout: "11s".into(),
            count: None,
        };
        let config = args.config().unwrap();
        assert_eq!(config.watchdog_timeout, Duration::from_secs(11));
        assert_eq!(config.profile.frame_length, 705);
    }
}
