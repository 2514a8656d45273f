use std::io::Read;

use hanlink_frame::{decode, locate_frame, validate};
use hanlink_pipeline::PipelineEvent;
use tracing::debug;

use crate::cmd::{load_profile, DecodeArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_event, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let profile = load_profile(args.profile.as_deref())?;

    let data = match &args.file {
        Some(path) => std::fs::read(path)
            .map_err(|err| io_error(&format!("failed to read {}", path.display()), err))?,
        None => {
            let mut data = Vec::new();
            std::io::stdin()
                .read_to_end(&mut data)
                .map_err(|err| io_error("failed to read stdin", err))?;
            data
        }
    };

    let start = locate_frame(&data, &profile).ok_or_else(|| {
        CliError::new(
            DATA_INVALID,
            format!(
                "no complete frame found in {} bytes of input (expected identifier '{}' and {} bytes)",
                data.len(),
                profile.identifier,
                profile.frame_length
            ),
        )
    })?;
    debug!(offset = start, "frame located");
    let frame = &data[start..start + profile.frame_length];

    validate(frame, &profile).map_err(|err| frame_error("checksum validation failed", err))?;
    let reading = decode(frame, &profile).map_err(|err| frame_error("decode failed", err))?;

    print_event(&PipelineEvent::Reading(reading), format);
    Ok(SUCCESS)
}
