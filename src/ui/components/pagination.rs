/// Page position within a paginated result set. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
  page: u32,
  page_size: u32,
  total_count: Option<u64>,
}

impl Pagination {
  pub fn new(page_size: u32) -> Self {
    Self {
      page: 1,
      page_size: page_size.max(1),
      total_count: None,
    }
  }

  pub fn page(&self) -> u32 {
    self.page
  }

  pub fn page_size(&self) -> u32 {
    self.page_size
  }

  /// Record the server's total once a page has loaded
  pub fn set_total(&mut self, count: u64) {
    self.total_count = Some(count);
  }

  /// `ceil(count / page_size)`, or `None` until a page has loaded
  pub fn total_pages(&self) -> Option<u32> {
    self
      .total_count
      .map(|count| u32::try_from(count.div_ceil(u64::from(self.page_size))).unwrap_or(u32::MAX))
  }

  pub fn has_next(&self) -> bool {
    self.total_pages().is_some_and(|total| self.page < total)
  }

  pub fn has_previous(&self) -> bool {
    self.page > 1
  }

  /// Returns `true` if the page changed
  pub fn next(&mut self) -> bool {
    if self.has_next() {
      self.page += 1;
      true
    } else {
      false
    }
  }

  pub fn previous(&mut self) -> bool {
    if self.has_previous() {
      self.page -= 1;
      true
    } else {
      false
    }
  }

  /// Back to page 1. The total is kept until the next page loads.
  pub fn reset(&mut self) {
    self.page = 1;
  }

  /// "Page 2 of 3", or just "Page 2" before the total is known
  pub fn label(&self) -> String {
    match self.total_pages() {
      Some(total) => format!("Page {} of {}", self.page, total.max(1)),
      None => format!("Page {}", self.page),
    }
  }
}
