//! Grid collocation command-line interface
//!
//! Reads a YAML configuration, evaluates the basis functions (and their
//! derivatives) on the requested points and reports the results.

use color_eyre::eyre::Result;
use gridcol::app::GridApplication;

fn main() -> Result<()> {
    color_eyre::install()?;
    GridApplication::from_cli()?.run()
}
