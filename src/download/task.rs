use crate::catalog::{CatalogEntry, Category};
use crate::utils::files::DirectoryLayout;
use crate::utils::images::CanonicalFormat;
use std::path::{Path, PathBuf};
use tracing::warn;
use url::Url;

const STAGING_SUFFIX: &str = "part";

/// Derive the on-disk file name for an asset URL.
///
/// Takes the last path segment (query string and fragment never take part)
/// and swaps its extension for the canonical one; a segment without an
/// extension gets it appended. Returns `None` for unparsable URLs and for
/// URLs whose last segment is empty.
pub fn derive_file_name(source_url: &str, format: CanonicalFormat) -> Option<String> {
    let url = Url::parse(source_url).ok()?;
    let segment = url.path_segments()?.next_back()?;
    if segment.is_empty() {
        return None;
    }

    let stem = match segment.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => segment,
    };
    Some(format!("{}.{}", stem, format.extension()))
}

/// One asset to fetch into one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    source_url: String,
    destination_dir: PathBuf,
    derived_file_name: Option<String>,
    format: CanonicalFormat,
}

impl DownloadTask {
    pub fn new(
        source_url: impl Into<String>,
        destination_dir: impl Into<PathBuf>,
        format: CanonicalFormat,
    ) -> Self {
        let source_url = source_url.into();
        let derived_file_name = derive_file_name(&source_url, format);
        Self {
            source_url,
            destination_dir: destination_dir.into(),
            derived_file_name,
            format,
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn destination_dir(&self) -> &Path {
        &self.destination_dir
    }

    pub fn derived_file_name(&self) -> Option<&str> {
        self.derived_file_name.as_deref()
    }

    pub fn format(&self) -> CanonicalFormat {
        self.format
    }

    pub fn final_path(&self) -> Option<PathBuf> {
        self.derived_file_name
            .as_ref()
            .map(|name| self.destination_dir.join(name))
    }

    /// Sibling of the final path used while the transfer is in progress.
    pub fn staging_path(&self) -> Option<PathBuf> {
        self.derived_file_name
            .as_ref()
            .map(|name| self.destination_dir.join(format!("{}.{}", name, STAGING_SUFFIX)))
    }
}

/// All tasks of one category, in catalog order.
#[derive(Debug, Clone)]
pub struct CategoryBatch {
    pub category: Category,
    pub tasks: Vec<DownloadTask>,
}

impl CategoryBatch {
    pub fn new(category: Category, tasks: Vec<DownloadTask>) -> Self {
        Self { category, tasks }
    }

    /// Group catalog entries into one batch per category of `layout`, in
    /// `Category::ALL` order. Entries without a URL become tasks with an
    /// empty source URL so they are reported as failures.
    pub fn from_entries(
        entries: impl IntoIterator<Item = CatalogEntry>,
        layout: &DirectoryLayout,
        format: CanonicalFormat,
    ) -> Vec<CategoryBatch> {
        let mut batches: Vec<CategoryBatch> = Category::ALL
            .iter()
            .filter(|category| layout.category_dir(**category).is_some())
            .map(|category| CategoryBatch::new(*category, Vec::new()))
            .collect();

        for entry in entries {
            let Some(dir) = layout.category_dir(entry.category) else {
                warn!(category = %entry.category, "No directory for category, dropping entry");
                continue;
            };
            if let Some(batch) = batches.iter_mut().find(|b| b.category == entry.category) {
                batch
                    .tasks
                    .push(DownloadTask::new(entry.url.unwrap_or_default(), dir, format));
            }
        }

        batches
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
