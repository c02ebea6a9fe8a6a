use std::num::IntErrorKind;

/// Page arithmetic over a known number of rows.
///
/// A missing or non-integer page number falls back to the first page, and a
/// number outside `1..=num_pages` falls back to the last page. An empty list
/// still has a single, empty first page.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: usize,
    count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub num_pages: usize,
    pub per_page: usize,
    pub count: usize,
}

impl Paginator {
    pub fn new(count: usize, per_page: usize) -> Self {
        Self {
            per_page: per_page.max(1),
            count,
        }
    }

    pub fn num_pages(&self) -> usize {
        self.count.div_ceil(self.per_page).max(1)
    }

    /// Resolve the raw `page` query value to a page that exists.
    pub fn page(&self, raw: Option<&str>) -> Page {
        let num_pages = self.num_pages();
        let number = match raw.map(|r| r.trim().parse::<i64>()) {
            None => 1,
            // still an integer, just too large to hold
            Some(Err(e)) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => num_pages,
            Some(Err(_)) => 1,
            Some(Ok(n)) if n < 1 || n as usize > num_pages => num_pages,
            Some(Ok(n)) => n as usize,
        };

        Page {
            number,
            num_pages,
            per_page: self.per_page,
            count: self.count,
        }
    }
}

impl Page {
    /// Row offset of the first item on this page.
    pub fn offset(&self) -> usize {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> usize {
        self.per_page
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous_page_number(&self) -> usize {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next_page_number(&self) -> usize {
        (self.number + 1).min(self.num_pages)
    }

    /// Number of items actually on this page.
    pub fn len(&self) -> usize {
        self.count.saturating_sub(self.offset()).min(self.per_page)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
