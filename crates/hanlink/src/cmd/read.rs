use hanlink_source::{SourceTarget, StreamSource};

use crate::cmd::drive::{drive, DriveOptions};
use crate::cmd::{parse_duration, ReadArgs};
use crate::exit::{source_error, CliResult};
use crate::output::OutputFormat;

pub fn run(args: ReadArgs, format: OutputFormat) -> CliResult<i32> {
    let target: SourceTarget = args
        .target
        .parse()
        .map_err(|err| source_error("invalid target", err))?;
    let config = args.pipeline.config()?;
    let retry_open = args.retry_open.as_deref().map(parse_duration).transpose()?;

    let options = DriveOptions {
        count: args.pipeline.count,
        retry_open,
    };
    drive(StreamSource::new(target), config, options, format)
}
