//! Feature-column names for the node feature matrix.
//!
//! Column `i` of the feature matrix holds the `i`-th original indicator of the
//! pivoted dataset. Identifier, administrative, mask and synthetic index
//! columns are not features and are removed before numbering.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::dataset::{COUNTRY_COLUMN, YEAR_COLUMN};

/// Columns that are never features, besides any `mask_`-prefixed column.
pub const NON_FEATURE_COLUMNS: &[&str] = &[
    COUNTRY_COLUMN,
    YEAR_COLUMN,
    "node_id",
    "digital_backwards_index",
];

const MASK_PREFIX: &str = "mask_";

/// Index → feature name, derived lazily from a dataset column list.
#[derive(Debug)]
pub struct FeatureCatalog {
    columns: Vec<String>,
    mapping: OnceLock<BTreeMap<usize, String>>,
}

impl FeatureCatalog {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            mapping: OnceLock::new(),
        }
    }

    pub fn is_feature(column: &str) -> bool {
        !NON_FEATURE_COLUMNS.contains(&column) && !column.starts_with(MASK_PREFIX)
    }

    /// Ordered mapping from feature-matrix column to feature name. Built on
    /// first call and never changed afterwards.
    pub fn feature_mapping(&self) -> &BTreeMap<usize, String> {
        self.mapping.get_or_init(|| {
            let mapping: BTreeMap<usize, String> = self
                .columns
                .iter()
                .filter(|c| Self::is_feature(c))
                .cloned()
                .enumerate()
                .collect();
            tracing::debug!(features = mapping.len(), "feature mapping built");
            mapping
        })
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.feature_mapping().get(&index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.feature_mapping().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(cols: &[&str]) -> FeatureCatalog {
        FeatureCatalog::new(cols.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn drops_admin_and_mask_columns_keeping_order() {
        let cat = catalog(&[
            "Economy",
            "Year",
            "Broadband",
            "mask_Broadband",
            "node_id",
            "Internet users",
            "digital_backwards_index",
            "Mobile subscriptions",
        ]);
        let names: Vec<&str> = cat.feature_mapping().values().map(String::as_str).collect();
        assert_eq!(names, vec!["Broadband", "Internet users", "Mobile subscriptions"]);
        assert_eq!(cat.name(1), Some("Internet users"));
        assert_eq!(cat.name(3), None);
    }

    #[test]
    fn mapping_is_cached() {
        let cat = catalog(&["Economy", "A", "B"]);
        let first = cat.feature_mapping() as *const _;
        let second = cat.feature_mapping() as *const _;
        assert_eq!(first, second);
        assert_eq!(cat.len(), 2);
    }

    #[test]
    fn empty_columns_give_empty_mapping() {
        let cat = catalog(&["Economy", "Year"]);
        assert!(cat.is_empty());
    }
}
