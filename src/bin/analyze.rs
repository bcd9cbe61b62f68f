//! Batch entrypoint: corpus in, details file out.
//!
//! Runs outside the serving process; the serving side picks the output
//! up at startup or on `POST /admin/reload`.

use anyhow::{Context, Result};
use tracing::info;

use gaplens::{
    analyzer::{corpus::ReviewCorpus, run_batch},
    config::AnalyzerSettings,
    observability::Telemetry,
};

fn main() -> Result<()> {
    let _telemetry = Telemetry::new().context("failed to initialize telemetry")?;

    let settings = AnalyzerSettings::from_env().context("failed to load analyzer settings")?;
    let corpus = ReviewCorpus::load(settings.corpus_path())?;
    info!(
        corpus = settings.corpus_path(),
        movies = corpus.movies.len(),
        "review corpus loaded"
    );

    let details = run_batch(settings.params(), &corpus);
    details.write(settings.output_path())?;

    info!(
        out = settings.output_path(),
        run_id = %details.run_id,
        "details file published"
    );

    Ok(())
}
