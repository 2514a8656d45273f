use hanlink_frame::SAMPLE_FRAME;

use crate::exit::{CliResult, SUCCESS};
use crate::output::print_raw;

pub fn run() -> CliResult<i32> {
    print_raw(SAMPLE_FRAME);
    Ok(SUCCESS)
}
