//! Fetch specifications - filter + sort + pagination descriptors for queries.
//!
//! A [`FetchSpecification`] describes *what* to fetch without touching the
//! backend: an optional filter predicate, an optional sort rule, and
//! offset/limit pagination. The client evaluates it against a collection
//! scan. Offsets are `usize`, so negative offsets cannot be expressed;
//! a limit of `0` means unbounded.
//!
//! ## Example
//!
//! ```ignore
//! use stored_rust::{FetchSpecification, SortDirection};
//!
//! let spec = FetchSpecification::<Todo>::new()
//!     .filter(|todo| !todo.done)
//!     .sort_by_key(|todo| todo.title.clone(), SortDirection::Ascending)
//!     .offset(10)
//!     .limit(5);
//! ```

mod page;

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

pub use page::page_bounds;

/// Filter predicate applied to decoded models.
pub type FilterFn<M> = Arc<dyn Fn(&M) -> bool + Send + Sync>;

/// Comparator applied to decoded models, before direction is applied.
pub type CompareFn<M> = Arc<dyn Fn(&M, &M) -> Ordering + Send + Sync>;

/// Ordering direction for a sort rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// A sort rule: a comparator plus the direction to apply it in.
pub struct SortRule<M> {
    compare: CompareFn<M>,
    pub direction: SortDirection,
}

impl<M> SortRule<M> {
    /// Build a rule from an explicit comparator.
    pub fn by<F>(compare: F, direction: SortDirection) -> Self
    where
        F: Fn(&M, &M) -> Ordering + Send + Sync + 'static,
    {
        SortRule {
            compare: Arc::new(compare),
            direction,
        }
    }

    /// Build a rule that sorts by an extracted key (a "field").
    pub fn by_key<K, F>(key: F, direction: SortDirection) -> Self
    where
        K: Ord,
        F: Fn(&M) -> K + Send + Sync + 'static,
    {
        SortRule {
            compare: Arc::new(move |a, b| key(a).cmp(&key(b))),
            direction,
        }
    }

    /// Compare two models under this rule, direction applied.
    pub fn ordering(&self, a: &M, b: &M) -> Ordering {
        let ord = (self.compare)(a, b);
        match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

impl<M> Clone for SortRule<M> {
    fn clone(&self) -> Self {
        SortRule {
            compare: Arc::clone(&self.compare),
            direction: self.direction,
        }
    }
}

/// Query descriptor: optional filter, optional sort, offset/limit pagination.
pub struct FetchSpecification<M> {
    pub(crate) filter: Option<FilterFn<M>>,
    pub(crate) sort: Option<SortRule<M>>,
    pub(crate) offset: usize,
    pub(crate) limit: usize,
}

impl<M> FetchSpecification<M> {
    /// A specification matching every record: no filter, no sort, unbounded.
    pub fn new() -> Self {
        FetchSpecification {
            filter: None,
            sort: None,
            offset: 0,
            limit: 0,
        }
    }

    /// Keep only models for which `predicate` returns true.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&M) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(predicate));
        self
    }

    /// Sort results with an explicit rule.
    pub fn sort(mut self, rule: SortRule<M>) -> Self {
        self.sort = Some(rule);
        self
    }

    /// Sort results with a comparator and direction.
    pub fn sort_by<F>(self, compare: F, direction: SortDirection) -> Self
    where
        F: Fn(&M, &M) -> Ordering + Send + Sync + 'static,
    {
        self.sort(SortRule::by(compare, direction))
    }

    /// Sort results by an extracted key and direction.
    pub fn sort_by_key<K, F>(self, key: F, direction: SortDirection) -> Self
    where
        K: Ord,
        F: Fn(&M) -> K + Send + Sync + 'static,
    {
        self.sort(SortRule::by_key(key, direction))
    }

    /// Skip the first `offset` results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Return at most `limit` results. `0` means unbounded.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl<M> Default for FetchSpecification<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Clone for FetchSpecification<M> {
    fn clone(&self) -> Self {
        FetchSpecification {
            filter: self.filter.clone(),
            sort: self.sort.clone(),
            offset: self.offset,
            limit: self.limit,
        }
    }
}

impl<M> fmt::Debug for FetchSpecification<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchSpecification")
            .field("filter", &self.filter.is_some())
            .field("sort", &self.sort.is_some())
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .finish()
    }
}
