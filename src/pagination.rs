//! One page of an ordered, filtered result, plus navigation metadata.

use crate::error::StoreError;
use async_trait::async_trait;
use serde::Serialize;

/// A counted, orderable source. `count` and `slice` run against the same filtered query.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;

    async fn count(&self) -> Result<i64, StoreError>;

    async fn slice(&self, offset: i64, limit: i64) -> Result<Vec<Self::Item>, StoreError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaginatedList<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub page_index: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
}

impl<T> PaginatedList<T> {
    /// Count first, then fetch only the requested slice. Absent or non-positive pages mean page 1.
    /// Pages past the end are not clamped; they come back empty.
    pub async fn create<S>(source: &S, page: Option<i64>, page_size: i64) -> Result<Self, StoreError>
    where
        S: PageSource<Item = T> + ?Sized,
    {
        let page_size = page_size.max(1);
        let page_index = page.filter(|p| *p > 0).unwrap_or(1);
        let total_count = source.count().await?;
        let offset = (page_index - 1).saturating_mul(page_size);
        let items = if offset < total_count {
            source.slice(offset, page_size).await?
        } else {
            Vec::new()
        };
        Ok(PaginatedList {
            items,
            page_index,
            page_size,
            total_count,
            total_pages: total_pages(total_count, page_size),
        })
    }

    pub fn has_previous_page(&self) -> bool {
        self.page_index > 1
    }

    pub fn has_next_page(&self) -> bool {
        self.page_index < self.total_pages
    }
}

fn total_pages(count: i64, page_size: i64) -> i64 {
    if count <= 0 {
        0
    } else {
        (count + page_size - 1) / page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct VecSource {
        items: Vec<u32>,
        slices: AtomicUsize,
    }

    impl VecSource {
        fn new(n: u32) -> Self {
            VecSource {
                items: (1..=n).collect(),
                slices: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PageSource for VecSource {
        type Item = u32;

        async fn count(&self) -> Result<i64, StoreError> {
            Ok(self.items.len() as i64)
        }

        async fn slice(&self, offset: i64, limit: i64) -> Result<Vec<u32>, StoreError> {
            self.slices.fetch_add(1, Ordering::SeqCst);
            Ok(self.items.iter().skip(offset as usize).take(limit as usize).copied().collect())
        }
    }

    #[tokio::test]
    async fn page_counts_follow_ceiling_division() {
        for size in 1..=5i64 {
            for n in 0..=17u32 {
                let source = VecSource::new(n);
                let expected_pages = (n as i64 + size - 1) / size;
                let first = PaginatedList::create(&source, Some(1), size).await.unwrap();
                assert_eq!(first.total_pages, expected_pages, "n={} size={}", n, size);
                assert_eq!(first.total_count, n as i64);
                if expected_pages > 0 {
                    let last = PaginatedList::create(&source, Some(expected_pages), size).await.unwrap();
                    let expected_last = n as i64 - size * (expected_pages - 1);
                    assert_eq!(last.items.len() as i64, expected_last, "n={} size={}", n, size);
                    assert!(!last.has_next_page());
                }
            }
        }
    }

    #[tokio::test]
    async fn empty_source_has_no_pages() {
        let source = VecSource::new(0);
        let page = PaginatedList::create(&source, None, 3).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_previous_page());
        assert!(!page.has_next_page());
        assert_eq!(source.slices.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_positive_page_means_first() {
        let source = VecSource::new(7);
        for page in [None, Some(0), Some(-4)] {
            let p = PaginatedList::create(&source, page, 3).await.unwrap();
            assert_eq!(p.page_index, 1);
            assert_eq!(p.items, vec![1, 2, 3]);
            assert!(!p.has_previous_page());
            assert!(p.has_next_page());
        }
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty_not_clamped() {
        let source = VecSource::new(7);
        let p = PaginatedList::create(&source, Some(9), 3).await.unwrap();
        assert_eq!(p.page_index, 9);
        assert!(p.items.is_empty());
        assert_eq!(p.total_pages, 3);
        assert!(p.has_previous_page());
        assert!(!p.has_next_page());
    }

    #[tokio::test]
    async fn middle_page_navigates_both_ways() {
        let source = VecSource::new(7);
        let p = PaginatedList::create(&source, Some(2), 3).await.unwrap();
        assert_eq!(p.items, vec![4, 5, 6]);
        assert!(p.has_previous_page());
        assert!(p.has_next_page());
    }
}
