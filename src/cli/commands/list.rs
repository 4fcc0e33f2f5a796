//! List indicators command.

use anyhow::Result;
use barwise_indicators::Catalog;

use crate::cli::ListArgs;

pub fn run(args: ListArgs) -> Result<()> {
    let catalog = Catalog::new();

    println!("Available Indicators");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for info in catalog.list() {
        println!("  {:<14} {}", info.name, info.description);
        if args.verbose {
            println!("  {:<14} {}", "", info.default_config);
        }
    }

    println!();
    println!("Use `barwise run --indicator <name> --params '<json>'` to evaluate one.");

    Ok(())
}
