use crate::cli::AnalyzeArgs;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::table;
use lambar::engine::convergence;
use lambar::engine::error::AnalysisError;
use lambar::workflows;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let config = AnalysisConfig::resolve(&args)?;
    info!(
        "Analyzing {} at {} K, {} bar (seed {}).",
        args.input.display(),
        config.temperature,
        config.pressure,
        config.seed
    );

    let mut rng = StdRng::seed_from_u64(config.seed);
    let report = workflows::analyze::run(
        &args.input,
        &config.read_options(),
        &config.analysis_options(),
        &mut rng,
    )?;

    match &args.output {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            convergence::write_table(&report.rows, file).map_err(AnalysisError::from)?;
            println!("Convergence table written to: {}", path.display());
        }
        None => {
            print!("{}", table::render_convergence(&report.rows));
        }
    }

    let summary = &report.summary;
    println!(
        "\ndF = {:.4} ± {:.4} kcal/mol (equilibrated; raw σ {:.4}, decorrelated σ {:.4})",
        summary.delta_f, summary.sigma_equilibrated, summary.sigma_raw, summary.sigma_decorrelated
    );
    println!(
        "overlap: eigenvalue {:.4}, min cross-ensemble {:.4}",
        summary.overlap_scalar_equilibrated, summary.overlap_min_equilibrated
    );
    Ok(())
}
