use hanlink_frame::SAMPLE_FRAME;
use hanlink_source::SimulatedSource;

use crate::cmd::drive::{drive, DriveOptions};
use crate::cmd::{parse_duration, SimulateArgs};
use crate::exit::{io_error, CliResult};
use crate::output::OutputFormat;

pub fn run(args: SimulateArgs, format: OutputFormat) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let config = args.pipeline.config()?;

    let frame = match &args.frame {
        Some(path) => std::fs::read(path)
            .map_err(|err| io_error(&format!("failed to read frame {}", path.display()), err))?,
        None => SAMPLE_FRAME.to_vec(),
    };

    let options = DriveOptions {
        count: args.pipeline.count,
        retry_open: None,
    };
    drive(
        SimulatedSource::with_interval(frame, interval),
        config,
        options,
        format,
    )
}
