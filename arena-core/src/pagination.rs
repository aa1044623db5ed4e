//! Pagination controls for paged listings

/// Where a listing currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    page_size: u32,
    count: u64,
}

/// One entry of the page selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    /// A page number
    Page {
        /// 1-based page number
        number: u32,
        /// Whether this is the page being shown
        current: bool,
    },
    /// Elided pages
    Gap,
}

/// The controls to render below a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageControls {
    /// Target of the "previous" button
    pub previous: Option<u32>,
    /// Target of the "next" button
    pub next: Option<u32>,
    /// The page selector
    pub links: Vec<PageLink>,
}

impl Pagination {
    /// `page` is 1-based; zero values are bumped to one.
    pub fn new(page: u32, page_size: u32, count: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
            count,
        }
    }

    /// The page being shown
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Number of pages needed for all items
    pub fn total_pages(&self) -> u32 {
        let pages = self.count.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// The controls to render, `None` when everything fits on one page.
    pub fn controls(&self) -> Option<PageControls> {
        let total = self.total_pages();
        if total <= 1 {
            return None;
        }

        let current = self.page.min(total);
        let mut numbers = vec![
            1,
            current.saturating_sub(1).max(1),
            current,
            current.saturating_add(1).min(total),
            total,
        ];
        numbers.sort_unstable();
        numbers.dedup();

        let mut links = Vec::with_capacity(numbers.len() * 2);
        let mut last_shown: u32 = 0;
        for number in numbers {
            if number > last_shown.saturating_add(1) {
                links.push(PageLink::Gap);
            }
            links.push(PageLink::Page {
                number,
                current: number == current,
            });
            last_shown = number;
        }

        Some(PageControls {
            previous: (current > 1).then(|| current - 1),
            next: (current < total).then(|| current + 1),
            links,
        })
    }
}
