use std::fmt;

/// Logical grouping of catalog assets, one output subdirectory each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Base card art
    Cards,
    /// Alternate-art variants of a card
    Variants,
    /// Location art
    Locations,
}

impl Category {
    /// Processing order of a run.
    pub const ALL: [Category; 3] = [Category::Cards, Category::Variants, Category::Locations];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Cards => "cards",
            Category::Variants => "variants",
            Category::Locations => "locations",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// One asset reference produced by a catalog provider.
///
/// `url` is `None` when the upstream item had no usable asset URL; such
/// entries still become tasks so the gap shows up in the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub category: Category,
    pub url: Option<String>,
}

impl CatalogEntry {
    pub fn new(category: Category, url: Option<String>) -> Self {
        Self { category, url }
    }
}

pub mod snap;
