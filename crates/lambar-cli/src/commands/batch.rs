use crate::cli::BatchArgs;
use crate::error::Result;
use crate::table;
use indicatif::{ProgressBar, ProgressStyle};
use lambar::workflows;
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

pub fn run(args: BatchArgs) -> Result<()> {
    let pb = ProgressBar::new_spinner().with_message(format!(
        "Aggregating {} convergence tables...",
        args.tables.len()
    ));
    pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or(ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));

    let report = workflows::batch::run(&args.tables)?;
    pb.finish_and_clear();

    if report.skipped > 0 {
        warn!("{} file(s) were skipped.", report.skipped);
    }
    print!("{}", table::render_batch(&report));
    println!(
        "\nProcessed {} window(s), skipped {}.",
        report.entries.len(),
        report.skipped
    );
    Ok(())
}
