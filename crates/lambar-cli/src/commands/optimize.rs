use crate::cli::OptimizeArgs;
use crate::error::Result;
use lambar::workflows;
use tracing::info;

pub fn run(args: OptimizeArgs) -> Result<()> {
    let result = workflows::optimize::run(&args.grid, &args.errors, args.states)?;

    let digits = result.decimal_digits;
    println!("Optimized schedule ({} states):", result.grid.len());
    for row in result.grid.rows() {
        let cells: Vec<String> = row.iter().map(|v| format!("{:.digits$}", v)).collect();
        println!("  {}", cells.join(" "));
    }

    if let Some(prefix) = &args.output {
        let names: Vec<&str> = args.names.iter().map(String::as_str).collect();
        let files = workflows::optimize::write(&result, &names, prefix)?;
        println!(
            "{} keyword files written with prefix: {}",
            files.len(),
            prefix.display()
        );
    } else {
        info!("No output prefix given, skipping keyword files.");
    }
    Ok(())
}
