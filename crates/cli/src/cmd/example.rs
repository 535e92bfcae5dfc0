//! Print an example trace

use crate::trace::EXAMPLE_TRACE;
use anyhow::Result;

pub fn run() -> Result<()> {
    print!("{}", EXAMPLE_TRACE);
    Ok(())
}
