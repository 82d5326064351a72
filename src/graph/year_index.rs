//! Year → node addressing for the flat node table.
//!
//! Two modes:
//!
//! - **Historical** ([`YearOffsetTable`]): nodes are grouped by year in ascending
//!   order, so each year owns one contiguous half-open range of rows.
//! - **Future** ([`YearAttribute`]): every node carries its own year, and a
//!   query scans the attribute to build a mask. No contiguity is assumed.
//!
//! The offset table is rebuilt from a per-row year sequence with
//! [`YearOffsetTable::from_years`]. Node order in the feature matrix must match
//! that grouping, otherwise predictions line up with the wrong countries.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::error::{GraphError, GraphResult};

/// Historical addressing: year → contiguous `[start, end)` node range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearOffsetTable {
    ranges: BTreeMap<i32, Range<usize>>,
}

impl YearOffsetTable {
    /// Build the table from one year per row.
    ///
    /// Rows are grouped by year, distinct years sorted ascending, and each year
    /// gets a block as long as its row count, packed from index 0. Row order in
    /// the input does not matter; only the per-year counts do.
    pub fn from_years(years: impl IntoIterator<Item = i32>) -> Self {
        let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
        for year in years {
            *counts.entry(year).or_insert(0) += 1;
        }

        let mut ranges = BTreeMap::new();
        let mut cursor = 0;
        for (year, count) in counts {
            ranges.insert(year, cursor..cursor + count);
            cursor += count;
        }
        Self { ranges }
    }

    /// Adopt a precomputed `year → (start, end)` table, checking that the ranges
    /// are packed in ascending year order from 0 with no gaps or overlaps.
    pub fn from_ranges(table: &BTreeMap<i32, (usize, usize)>) -> GraphResult<Self> {
        let mut ranges = BTreeMap::new();
        let mut cursor = 0;
        for (&year, &(start, end)) in table {
            if end < start {
                return Err(GraphError::InvertedRange { year, start, end });
            }
            if start != cursor {
                return Err(GraphError::OffsetGap {
                    year,
                    expected: cursor,
                    actual: start,
                });
            }
            ranges.insert(year, start..end);
            cursor = end;
        }
        Ok(Self { ranges })
    }

    /// Node range for `year`.
    pub fn range_for_year(&self, year: i32) -> GraphResult<Range<usize>> {
        self.ranges
            .get(&year)
            .cloned()
            .ok_or(GraphError::YearNotIndexed { year })
    }

    /// Indexed years, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.ranges.keys().copied().collect()
    }

    /// Number of nodes covered by all ranges.
    pub fn covered(&self) -> usize {
        self.ranges.values().last().map(|r| r.end).unwrap_or(0)
    }

    /// Check that the table partitions exactly `node_count` nodes.
    pub fn validate(&self, node_count: usize) -> GraphResult<()> {
        let covered = self.covered();
        if covered != node_count {
            return Err(GraphError::OffsetCoverage {
                covered,
                node_count,
            });
        }
        Ok(())
    }

    /// Export as `year → (start, end)` for artifact storage.
    pub fn to_pairs(&self) -> BTreeMap<i32, (usize, usize)> {
        self.ranges
            .iter()
            .map(|(&year, r)| (year, (r.start, r.end)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, Range<usize>)> + '_ {
        self.ranges.iter().map(|(&year, r)| (year, r.clone()))
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Future addressing: one year value per node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearAttribute {
    years: Vec<i32>,
}

impl YearAttribute {
    pub fn new(years: Vec<i32>) -> Self {
        Self { years }
    }

    /// Ascending indices of the nodes tagged with `year`. Empty if none match.
    pub fn mask_for_year(&self, year: i32) -> Vec<usize> {
        self.years
            .iter()
            .enumerate()
            .filter(|(_, y)| **y == year)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Year of node `idx`.
    pub fn year_of(&self, idx: usize) -> Option<i32> {
        self.years.get(idx).copied()
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years = self.years.clone();
        years.sort_unstable();
        years.dedup();
        years
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

/// Either addressing mode behind one selection call.
#[derive(Debug, Clone, Copy)]
pub enum YearIndex<'a> {
    Historical(&'a YearOffsetTable),
    Future(&'a YearAttribute),
}

impl YearIndex<'_> {
    /// Node indices for `year`, ascending. A year missing from the historical
    /// table selects nothing rather than failing.
    pub fn select(&self, year: i32) -> Vec<usize> {
        match self {
            Self::Historical(table) => match table.range_for_year(year) {
                Ok(range) => range.collect(),
                Err(_) => Vec::new(),
            },
            Self::Future(attribute) => attribute.mask_for_year(year),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_years_packs_ascending() {
        // Row order is by country then year, as in the pivoted dataset.
        let years = [2016, 2014, 2015, 2016, 2014, 2015, 2016];
        let table = YearOffsetTable::from_years(years);
        assert_eq!(table.years(), vec![2014, 2015, 2016]);
        assert_eq!(table.range_for_year(2014).unwrap(), 0..2);
        assert_eq!(table.range_for_year(2015).unwrap(), 2..4);
        assert_eq!(table.range_for_year(2016).unwrap(), 4..7);
        table.validate(7).unwrap();
    }

    #[test]
    fn round_trip_partitions_node_count() {
        let years: Vec<i32> = (0..50).map(|i| 2010 + (i * 7 % 5)).collect();
        let table = YearOffsetTable::from_years(years.iter().copied());

        let mut seen = vec![false; years.len()];
        for (year, range) in table.iter() {
            let expected = years.iter().filter(|y| **y == year).count();
            assert_eq!(range.len(), expected);
            for idx in range {
                assert!(!seen[idx], "node {idx} in two ranges");
                seen[idx] = true;
            }
        }
        assert!(seen.iter().all(|s| *s));
        assert_eq!(table.covered(), years.len());
    }

    #[test]
    fn missing_year_is_not_found() {
        let table = YearOffsetTable::from_years([2020, 2021]);
        assert!(matches!(
            table.range_for_year(1999),
            Err(GraphError::YearNotIndexed { year: 1999 })
        ));
    }

    #[test]
    fn from_ranges_accepts_packed_table() {
        let table = YearOffsetTable::from_years([2020, 2020, 2021]);
        let restored = YearOffsetTable::from_ranges(&table.to_pairs()).unwrap();
        assert_eq!(restored, table);
    }

    #[test]
    fn from_ranges_rejects_gap() {
        let mut pairs = BTreeMap::new();
        pairs.insert(2020, (0, 3));
        pairs.insert(2021, (4, 6));
        assert!(matches!(
            YearOffsetTable::from_ranges(&pairs),
            Err(GraphError::OffsetGap {
                year: 2021,
                expected: 3,
                actual: 4
            })
        ));
    }

    #[test]
    fn from_ranges_rejects_inverted() {
        let mut pairs = BTreeMap::new();
        pairs.insert(2020, (0, 3));
        pairs.insert(2021, (3, 1));
        assert!(matches!(
            YearOffsetTable::from_ranges(&pairs),
            Err(GraphError::InvertedRange { year: 2021, .. })
        ));
    }

    #[test]
    fn validate_detects_short_table() {
        let table = YearOffsetTable::from_years([2020, 2021]);
        assert!(matches!(
            table.validate(3),
            Err(GraphError::OffsetCoverage {
                covered: 2,
                node_count: 3
            })
        ));
    }

    #[test]
    fn mask_scans_interleaved_years() {
        let attr = YearAttribute::new(vec![2026, 2025, 2026, 2027, 2025]);
        assert_eq!(attr.mask_for_year(2025), vec![1, 4]);
        assert_eq!(attr.mask_for_year(2026), vec![0, 2]);
        assert!(attr.mask_for_year(2030).is_empty());
        assert_eq!(attr.years(), vec![2025, 2026, 2027]);
    }

    #[test]
    fn select_maps_missing_historical_year_to_empty() {
        let table = YearOffsetTable::from_years([2020, 2020]);
        let index = YearIndex::Historical(&table);
        assert_eq!(index.select(2020), vec![0, 1]);
        assert!(index.select(2019).is_empty());
    }
}
