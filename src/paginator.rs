//! Pagination state for in-memory tables.
//!
//! This component computes page windows over a materialized collection and the
//! "gap" window of page links shown around the current page. It never performs
//! I/O; the rows it slices come from a [`Table`](crate::table::Model) or from a
//! fetcher's buffer.

use crate::error::PageError;
use crate::key::{self, KeyMap as KeyMapTrait};
use bubbletea_rs::{KeyMsg, Msg};

/// Upper bound for the number of page links shown at once.
pub const MAX_GAP: usize = 5;

/// How the pagination control is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Type {
    /// Page links around the current page (e.g., "‹ 1 [2] 3 ›").
    #[default]
    Links,
    /// Arabic numerals (e.g., "2/5").
    Arabic,
    /// Dots (e.g., "○ • ○ ○ ○").
    Dots,
}

/// Key bindings for moving between pages.
///
/// # Examples
///
/// ```rust
/// use wz_table::paginator::PaginatorKeyMap;
/// use wz_table::key::KeyMap;
///
/// let keymap = PaginatorKeyMap::default();
/// assert_eq!(keymap.short_help().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct PaginatorKeyMap {
    /// Previous page. Default keys: PageUp, Left Arrow, 'h'
    pub prev_page: key::Binding,
    /// Next page. Default keys: PageDown, Right Arrow, 'l'
    pub next_page: key::Binding,
}

impl Default for PaginatorKeyMap {
    fn default() -> Self {
        Self {
            prev_page: key::new_binding(vec![
                key::with_keys_str(&["pgup", "left", "h"]),
                key::with_help("←/h", "prev page"),
            ]),
            next_page: key::new_binding(vec![
                key::with_keys_str(&["pgdown", "right", "l"]),
                key::with_help("→/l", "next page"),
            ]),
        }
    }
}

impl KeyMapTrait for PaginatorKeyMap {
    fn short_help(&self) -> Vec<&key::Binding> {
        vec![&self.prev_page, &self.next_page]
    }

    fn full_help(&self) -> Vec<Vec<&key::Binding>> {
        vec![vec![&self.prev_page, &self.next_page]]
    }
}

/// Returns the items of page `page` when pages hold `per_page` items.
///
/// The window `[page * per_page, (page + 1) * per_page)` is clipped to the
/// collection, so a page past the end yields an empty slice.
///
/// # Errors
///
/// [`PageError::ZeroPageSize`] when `per_page` is zero.
///
/// # Examples
///
/// ```rust
/// use wz_table::paginator::compute_page;
///
/// let items: Vec<u32> = (0..12).collect();
/// assert_eq!(compute_page(&items, 1, 10).unwrap(), &[10, 11]);
/// assert!(compute_page(&items, 2, 10).unwrap().is_empty());
/// ```
pub fn compute_page<T>(items: &[T], page: usize, per_page: usize) -> Result<&[T], PageError> {
    if per_page == 0 {
        return Err(PageError::ZeroPageSize);
    }
    let start = page.saturating_mul(per_page).min(items.len());
    let end = start.saturating_add(per_page).min(items.len());
    Ok(&items[start..end])
}

/// Number of pages needed for `total_items` items.
pub fn page_count(total_items: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    total_items.div_ceil(per_page)
}

/// Number of page links to show: the page count, capped at [`MAX_GAP`].
pub fn compute_gap(total_items: usize, per_page: usize) -> usize {
    page_count(total_items, per_page).min(MAX_GAP)
}

/// Page-link window `[start, end)` for a control with `size` pages.
///
/// When the window runs past the last page it is shifted back so that it
/// still shows `gap` links ending at the last page.
///
/// # Examples
///
/// ```rust
/// use wz_table::paginator::range;
///
/// assert_eq!(range(10, 2, 7, 5), vec![2, 3, 4, 5, 6]);
/// assert_eq!(range(10, 8, 13, 5), vec![5, 6, 7, 8, 9]);
/// assert_eq!(range(3, 0, 5, 3), vec![0, 1, 2]);
/// ```
pub fn range(size: usize, start: usize, end: usize, gap: usize) -> Vec<usize> {
    let (start, end) = if size < end {
        (size.saturating_sub(gap), size)
    } else {
        (start, end)
    };
    (start..end).collect()
}

/// Pagination state over an in-memory collection.
///
/// # Examples
///
/// ```rust
/// use wz_table::paginator::Model;
///
/// let mut paginator = Model::new().with_per_page(10).with_total_items(42);
/// assert_eq!(paginator.total_pages, 5);
/// assert_eq!(paginator.gap, 5);
///
/// paginator.next_page(3).unwrap();
/// assert_eq!(paginator.page, 3);
///
/// // Out of range requests leave the page alone.
/// assert!(paginator.next_page(9).is_err());
/// assert_eq!(paginator.page, 3);
/// ```
#[derive(Debug, Clone)]
pub struct Model {
    /// How the control is rendered.
    pub paginator_type: Type,
    /// The current page, zero-based.
    pub page: usize,
    /// Items per page, always at least 1.
    pub per_page: usize,
    /// Number of pages, zero when there are no items.
    pub total_pages: usize,
    /// Number of items being paginated.
    pub total_items: usize,
    /// Number of page links shown around the current page.
    pub gap: usize,

    /// Marker for the active page in Dots mode.
    pub active_dot: String,
    /// Marker for inactive pages in Dots mode.
    pub inactive_dot: String,
    /// Format string for Arabic mode.
    pub arabic_format: String,

    /// Key bindings.
    pub keymap: PaginatorKeyMap,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            paginator_type: Type::default(),
            page: 0,
            per_page: 10,
            total_pages: 0,
            total_items: 0,
            gap: 0,
            active_dot: "•".to_string(),
            inactive_dot: "○".to_string(),
            arabic_format: "%d/%d".to_string(),
            keymap: PaginatorKeyMap::default(),
        }
    }
}

impl Model {
    /// Creates a paginator with ten items per page and no items.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of items per page (builder pattern). Zero is clamped to 1.
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.set_per_page(per_page);
        self
    }

    /// Sets the number of items (builder pattern).
    pub fn with_total_items(mut self, items: usize) -> Self {
        self.set_total_items(items);
        self
    }

    /// Sets the render style (builder pattern).
    pub fn with_type(mut self, paginator_type: Type) -> Self {
        self.paginator_type = paginator_type;
        self
    }

    /// Sets the number of items per page. Zero is clamped to 1.
    ///
    /// The page count and gap are recomputed for the current item count.
    pub fn set_per_page(&mut self, per_page: usize) {
        self.per_page = per_page.max(1);
        self.recompute(true);
    }

    /// Sets the number of items being paginated.
    ///
    /// The gap is only recomputed when the page count changes, so the link
    /// window stays stable while items are added or removed within a page.
    /// The current page is clamped to the last page.
    pub fn set_total_items(&mut self, items: usize) {
        self.total_items = items;
        self.recompute(false);
    }

    fn recompute(&mut self, force_gap: bool) {
        let pages = page_count(self.total_items, self.per_page);
        if force_gap || pages != self.total_pages {
            self.gap = compute_gap(self.total_items, self.per_page);
        }
        self.total_pages = pages;
        if self.page >= self.total_pages {
            self.page = self.total_pages.saturating_sub(1);
        }
    }

    /// Moves to `requested` when it is a valid page.
    ///
    /// # Errors
    ///
    /// [`PageError::OutOfRange`] when `requested >= total_pages`. The current
    /// page is left unchanged; callers usually surface this as a notification.
    pub fn next_page(&mut self, requested: usize) -> Result<(), PageError> {
        if requested >= self.total_pages {
            return Err(PageError::OutOfRange {
                requested,
                page_count: self.total_pages,
            });
        }
        self.page = requested;
        Ok(())
    }

    /// Moves one page forward, staying on the last page.
    pub fn step_forward(&mut self) {
        if !self.on_last_page() {
            self.page += 1;
        }
    }

    /// Moves one page back, floored at the first page.
    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1);
    }

    /// Moves to the first page.
    pub fn reset(&mut self) {
        self.page = 0;
    }

    /// Returns true on the first page.
    pub fn on_first_page(&self) -> bool {
        self.page == 0
    }

    /// Returns true on the last page (or when there are no pages).
    pub fn on_last_page(&self) -> bool {
        self.page + 1 >= self.total_pages
    }

    /// Slice bounds of the current page within a collection of `length` items.
    ///
    /// ```rust
    /// use wz_table::paginator::Model;
    ///
    /// let mut paginator = Model::new().with_per_page(10).with_total_items(25);
    /// paginator.page = 2;
    /// assert_eq!(paginator.get_slice_bounds(25), (20, 25));
    /// ```
    pub fn get_slice_bounds(&self, length: usize) -> (usize, usize) {
        let start = self.page.saturating_mul(self.per_page).min(length);
        let end = start.saturating_add(self.per_page).min(length);
        (start, end)
    }

    /// Number of items on the current page.
    pub fn items_on_page(&self, length: usize) -> usize {
        let (start, end) = self.get_slice_bounds(length);
        end - start
    }

    /// The current page of `items`.
    pub fn page_items<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let (start, end) = self.get_slice_bounds(items.len());
        &items[start..end]
    }

    /// Page numbers (zero-based) to render as links.
    pub fn page_links(&self) -> Vec<usize> {
        range(self.total_pages, self.page, self.page + self.gap, self.gap)
    }

    /// Handles key messages for the prev/next bindings.
    pub fn update(&mut self, msg: &Msg) {
        if let Some(key_msg) = msg.downcast_ref::<KeyMsg>() {
            if self.keymap.next_page.matches(key_msg) {
                self.step_forward();
            } else if self.keymap.prev_page.matches(key_msg) {
                self.prev_page();
            }
        }
    }

    /// Renders the control according to [`Type`].
    ///
    /// ```rust
    /// use wz_table::paginator::{Model, Type};
    ///
    /// let mut paginator = Model::new().with_per_page(10).with_total_items(30);
    /// paginator.page = 1;
    /// assert_eq!(paginator.view(), "‹ 1 [2] 3 ›");
    ///
    /// paginator.paginator_type = Type::Arabic;
    /// assert_eq!(paginator.view(), "2/3");
    ///
    /// paginator.paginator_type = Type::Dots;
    /// assert_eq!(paginator.view(), "○ • ○");
    /// ```
    pub fn view(&self) -> String {
        if self.total_pages == 0 {
            return String::new();
        }
        match self.paginator_type {
            Type::Links => self.links_view(),
            Type::Arabic => self.arabic_view(),
            Type::Dots => self.dots_view(),
        }
    }

    fn links_view(&self) -> String {
        let mut parts = vec!["‹".to_string()];
        for n in self.page_links() {
            if n == self.page {
                parts.push(format!("[{}]", n + 1));
            } else {
                parts.push((n + 1).to_string());
            }
        }
        parts.push("›".to_string());
        parts.join(" ")
    }

    fn arabic_view(&self) -> String {
        self.arabic_format
            .replacen("%d", &(self.page + 1).to_string(), 1)
            .replacen("%d", &self.total_pages.to_string(), 1)
    }

    fn dots_view(&self) -> String {
        (0..self.total_pages)
            .map(|i| {
                if i == self.page {
                    self.active_dot.as_str()
                } else {
                    self.inactive_dot.as_str()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
