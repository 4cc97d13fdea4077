use monotext_types::PageInfo;

/// Splits `count` ordered items into fixed-size pages numbered from 1.
///
/// Page lookups are lenient: a missing or unparsable number gives the first
/// page and a number past the end gives the last one. An empty listing still
/// has one (empty) page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    count: u64,
    per_page: u32,
}

impl Paginator {
    pub fn new(count: u64, per_page: u32) -> Self {
        Self {
            count,
            per_page: per_page.max(1),
        }
    }

    pub fn num_pages(&self) -> u32 {
        let pages = self.count.div_ceil(u64::from(self.per_page)).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Resolve a raw `?page=` value to a valid page number
    pub fn page_number(&self, raw: Option<&str>) -> u32 {
        let requested = raw
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|n| *n >= 1)
            .unwrap_or(1);
        let last = self.num_pages();
        u32::try_from(requested).map_or(last, |n| n.min(last))
    }

    pub fn page(&self, number: u32) -> Page {
        let number = number.clamp(1, self.num_pages());
        Page {
            number,
            num_pages: self.num_pages(),
            count: self.count,
            per_page: self.per_page,
        }
    }

    /// Shorthand for `page(page_number(raw))`
    pub fn get_page(&self, raw: Option<&str>) -> Page {
        self.page(self.page_number(raw))
    }
}

/// One resolved page; gives the SQL window and the metadata sent to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub num_pages: u32,
    pub count: u64,
    per_page: u32,
}

impl Page {
    pub fn offset(&self) -> u64 {
        u64::from(self.number - 1) * u64::from(self.per_page)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn info(&self) -> PageInfo {
        PageInfo {
            number: self.number,
            num_pages: self.num_pages,
            count: self.count,
            has_next: self.has_next(),
            has_previous: self.has_previous(),
        }
    }
}
