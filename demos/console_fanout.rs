//! Console fan-out demo
//!
//! Shows the fan-out writer duplicating lines to stdout and a file, and a
//! runtime reconfiguration back to console-only mode.

use logsink::prelude::*;
use std::io::Write;

fn main() -> Result<()> {
    let manager = OutputManager::new(OutputConfig::file("logs/fanout.log"))?;

    let mut both = manager.multi_writer();
    writeln!(both, "this line reaches stdout and logs/fanout.log")?;
    both.flush()?;

    // Switch to console-only at runtime; the old handle is closed first
    manager.update_config(OutputConfig::console())?;
    assert!(!manager.is_file_mode());

    let mut console = manager.writer();
    writeln!(console, "now console only: {}", manager.config())?;
    console.flush()?;

    manager.close()?;
    Ok(())
}
