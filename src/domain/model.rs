use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::api::SearchResult;

/// Set of 1-based result positions chosen by the user.
///
/// Stored as sorted, non-overlapping ranges so `1-4000000000` does not
/// materialize billions of integers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ranges: Vec<RangeInclusive<usize>>,
}

impl Selection {
    pub fn from_ranges(ranges: impl IntoIterator<Item = RangeInclusive<usize>>) -> Self {
        let mut ranges: Vec<_> = ranges.into_iter().filter(|r| !r.is_empty()).collect();
        ranges.sort_by_key(|r| *r.start());

        let mut merged: Vec<RangeInclusive<usize>> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if *range.start() <= last.end().saturating_add(1) => {
                    if range.end() > last.end() {
                        *last = *last.start()..=*range.end();
                    }
                }
                _ => merged.push(range),
            }
        }

        Self { ranges: merged }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.ranges.iter().any(|r| r.contains(&index))
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Ascending, duplicate-free indices.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranges.iter().flat_map(|r| r.clone())
    }

    /// Results whose 1-based position is selected. Positions past the end are ignored.
    pub fn pick(&self, results: &[SearchResult]) -> Vec<DownloadTask> {
        results
            .iter()
            .enumerate()
            .map(|(i, result)| (i + 1, result))
            .filter(|(position, _)| self.contains(*position))
            .map(|(position, result)| DownloadTask {
                position,
                result: result.clone(),
            })
            .collect()
    }
}

pub type NameFn = Arc<dyn Fn(&SearchResult) -> String + Send + Sync>;

/// How a file or folder name is computed from a result.
#[derive(Clone)]
pub enum Naming {
    /// Fall back to what the server provides.
    Disabled,
    Custom(NameFn),
}

impl Naming {
    pub fn custom(f: impl Fn(&SearchResult) -> String + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    pub fn apply(&self, result: &SearchResult) -> Option<String> {
        match self {
            Self::Disabled => None,
            Self::Custom(f) => Some(f(result)),
        }
    }
}

impl fmt::Debug for Naming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("Disabled"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// One selected result waiting to be streamed to disk.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub position: usize,
    pub result: SearchResult,
}
