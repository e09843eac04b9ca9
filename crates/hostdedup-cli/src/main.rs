//! hostdedup - merge host inventories from several scanners into one view.

use anyhow::Result;

fn main() -> Result<()> {
    hostdedup_cli::run()
}
