use crate::catalog::{CatalogEntry, Category};
use crate::download::coordinator::Coordinator;
use crate::download::fetcher::AssetFetcher;
use crate::download::outcome::Summary;
use crate::download::task::CategoryBatch;
use crate::error::SetupError;
use crate::utils::files::ensure_layout;
use crate::utils::images::CanonicalFormat;
use crate::utils::progress::batch_bar;
use indicatif::MultiProgress;
use std::future::Future;
use std::path::Path;
use tracing::{info, warn};

/// Prepare the output tree under `root`, then download every catalog entry
/// one category at a time.
///
/// `catalog` is only awaited once the layout exists, so a setup failure
/// returns before the catalog is fetched or any task is submitted.
pub async fn download_all<F, C>(
    root: &Path,
    format: CanonicalFormat,
    catalog: C,
    coordinator: &Coordinator<F>,
    progress: &MultiProgress,
) -> Result<Summary, SetupError>
where
    F: AssetFetcher,
    C: Future<Output = Vec<CatalogEntry>>,
{
    let layout = ensure_layout(root, &Category::ALL)?;

    let entries = catalog.await;
    let batches = CategoryBatch::from_entries(entries, &layout, format);

    let mut total = Summary::default();
    for batch in batches {
        if batch.is_empty() {
            info!(category = %batch.category, "Nothing to download");
            continue;
        }
        let pb = batch_bar(progress, batch.len(), batch.category.dir_name());
        let report = coordinator.run(batch, &pb).await;

        let summary = report.summary();
        if summary.failed > 0 {
            warn!(
                category = %report.category,
                "{} of {} downloads failed",
                summary.failed,
                summary.total()
            );
        }
        total += summary;
    }

    info!(
        "Finished downloading. Check '{}' directory.",
        layout.root().display()
    );
    Ok(total)
}
