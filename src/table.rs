use crate::error::PageError;
use crate::key::{self, KeyMap as KeyMapTrait};
use crate::paginator;
use bubbletea_rs::{KeyMsg, Msg};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use lipgloss_extras::prelude::*;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

pub const ELLIPSIS: &str = "…";
pub const LOADING: &str = "Loading...";
pub const NO_RESULTS: &str = "No results";

#[derive(Debug, Clone)]
pub struct Column {
    pub title: String,
    pub width: Option<usize>,
}

impl Column {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            width: None,
        }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub cells: Vec<String>,
}

impl Row {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    fn haystack(&self) -> String {
        self.cells.join(" ")
    }
}

impl<S: Into<String>> FromIterator<S> for Row {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// Case-insensitive substring over all cells.
    #[default]
    Substring,
    /// Skim-style fuzzy match over all cells.
    Fuzzy,
}

#[derive(Debug, Clone)]
pub struct TableStyles {
    pub header: Style,
    pub cell: Style,
    pub selected: Style,
    pub placeholder: Style,
    pub empty: Style,
    pub footer: Style,
}

impl Default for TableStyles {
    fn default() -> Self {
        let subdued = AdaptiveColor {
            Light: "#9B9B9B",
            Dark: "#5C5C5C",
        };
        Self {
            header: Style::new()
                .foreground(AdaptiveColor {
                    Light: "#1a1a1a",
                    Dark: "#dddddd",
                })
                .bold(true),
            cell: Style::new(),
            selected: Style::new().foreground(AdaptiveColor {
                Light: "#EE6FF8",
                Dark: "#EE6FF8",
            }),
            placeholder: Style::new().foreground(subdued.clone()).italic(true),
            empty: Style::new().foreground(subdued.clone()),
            footer: Style::new().foreground(subdued),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TableKeyMap {
    pub row_up: key::Binding,
    pub row_down: key::Binding,
}

impl Default for TableKeyMap {
    fn default() -> Self {
        Self {
            row_up: key::new_binding(vec![
                key::with_keys_str(&["up", "k"]),
                key::with_help("↑/k", "up"),
            ]),
            row_down: key::new_binding(vec![
                key::with_keys_str(&["down", "j"]),
                key::with_help("↓/j", "down"),
            ]),
        }
    }
}

impl KeyMapTrait for TableKeyMap {
    fn short_help(&self) -> Vec<&key::Binding> {
        vec![&self.row_up, &self.row_down]
    }

    fn full_help(&self) -> Vec<Vec<&key::Binding>> {
        vec![vec![&self.row_up, &self.row_down]]
    }
}

/// In-memory table over rows that may still be loading, with search and paging.
///
/// `None` rows are placeholders for records not fetched yet. They count toward
/// the page total but never match a search term.
#[derive(Debug, Clone)]
pub struct Model {
    columns: Vec<Column>,
    source: Vec<Option<Row>>,
    visible: Vec<usize>,
    search_term: String,
    search_mode: SearchMode,
    selected: usize,
    pub paginator: paginator::Model,
    pub styles: TableStyles,
    pub keymap: TableKeyMap,
}

impl Model {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            source: Vec::new(),
            visible: Vec::new(),
            search_term: String::new(),
            search_mode: SearchMode::default(),
            selected: 0,
            paginator: paginator::Model::new(),
            styles: TableStyles::default(),
            keymap: TableKeyMap::default(),
        }
    }

    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.set_rows(rows);
        self
    }

    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.paginator.set_per_page(per_page);
        self
    }

    pub fn with_search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Replaces the rows. The search term stays applied and the current page
    /// is kept when it still exists.
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.set_slots(rows.into_iter().map(Some).collect());
    }

    /// Like [`set_rows`](Self::set_rows), for buffers holding placeholders.
    pub fn set_slots(&mut self, slots: Vec<Option<Row>>) {
        self.source = slots;
        self.refilter();
        self.paginator.set_total_items(self.visible.len());
        self.clamp_selection();
    }

    pub fn add_row(&mut self, row: Row) {
        self.source.push(Some(row));
        self.refilter();
        self.paginator.set_total_items(self.visible.len());
    }

    /// Number of rows before search, placeholders included.
    pub fn source_len(&self) -> usize {
        self.source.len()
    }

    /// Number of rows matching the search.
    pub fn total_items(&self) -> usize {
        self.visible.len()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Filters rows by `term` and goes back to the first page. Totals are
    /// recomputed from the matching rows only.
    pub fn search(&mut self, term: &str) {
        self.search_term = term.trim().to_string();
        self.refilter();
        self.paginator.reset();
        self.paginator.set_total_items(self.visible.len());
        self.selected = 0;
    }

    fn refilter(&mut self) {
        if self.search_term.is_empty() {
            self.visible = (0..self.source.len()).collect();
            return;
        }
        let term = self.search_term.as_str();
        self.visible = match self.search_mode {
            SearchMode::Substring => {
                let needle = term.to_lowercase();
                self.matching(|row| row.haystack().to_lowercase().contains(&needle))
            }
            SearchMode::Fuzzy => {
                let matcher = SkimMatcherV2::default();
                self.matching(|row| matcher.fuzzy_match(&row.haystack(), term).is_some())
            }
        };
    }

    fn matching(&self, is_match: impl Fn(&Row) -> bool) -> Vec<usize> {
        self.source
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().filter(|row| is_match(row)).map(|_| i))
            .collect()
    }

    /// Rows of the current page; `None` for rows still loading.
    pub fn paged_rows(&self) -> Vec<Option<&Row>> {
        self.paginator
            .page_items(&self.visible)
            .iter()
            .map(|&i| self.source[i].as_ref())
            .collect()
    }

    /// Index into the source rows of the first row on the current page.
    pub fn page_offset(&self) -> Option<usize> {
        self.paginator.page_items(&self.visible).first().copied()
    }

    pub fn selected_row(&self) -> Option<&Row> {
        self.paged_rows().get(self.selected).copied().flatten()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn select_next(&mut self) {
        let on_page = self.paginator.items_on_page(self.visible.len());
        if on_page > 0 {
            self.selected = (self.selected + 1) % on_page;
        }
    }

    pub fn select_prev(&mut self) {
        let on_page = self.paginator.items_on_page(self.visible.len());
        if on_page > 0 {
            self.selected = if self.selected == 0 {
                on_page - 1
            } else {
                self.selected - 1
            };
        }
    }

    fn clamp_selection(&mut self) {
        let on_page = self.paginator.items_on_page(self.visible.len());
        self.selected = self.selected.min(on_page.saturating_sub(1));
    }

    pub fn next_page(&mut self, requested: usize) -> Result<(), PageError> {
        self.paginator.next_page(requested)?;
        self.selected = 0;
        Ok(())
    }

    pub fn prev_page(&mut self) {
        self.paginator.prev_page();
        self.selected = 0;
    }

    pub fn update(&mut self, msg: &Msg) {
        if let Some(key_msg) = msg.downcast_ref::<KeyMsg>() {
            if self.keymap.row_down.matches(key_msg) {
                self.select_next();
                return;
            }
            if self.keymap.row_up.matches(key_msg) {
                self.select_prev();
                return;
            }
        }
        let page = self.paginator.page;
        self.paginator.update(msg);
        if self.paginator.page != page {
            self.selected = 0;
        }
    }

    fn column_widths(&self, rows: &[Option<&Row>]) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                column.width.unwrap_or_else(|| {
                    rows.iter()
                        .flatten()
                        .filter_map(|row| row.cells.get(i))
                        .map(|cell| display_width(cell))
                        .fold(display_width(&column.title), usize::max)
                })
            })
            .collect()
    }

    fn render_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
        cells
            .zip(widths)
            .map(|(cell, &width)| pad(&truncate(cell, width), width))
            .collect::<Vec<_>>()
            .join(" │ ")
    }

    pub fn view(&self) -> String {
        let rows = self.paged_rows();
        let widths = self.column_widths(&rows);
        let mut lines = Vec::with_capacity(rows.len() + 3);

        let header = Self::render_line(self.columns.iter().map(|c| c.title.as_str()), &widths);
        lines.push(format!("  {}", self.styles.header.clone().render(&header)));

        if rows.is_empty() {
            lines.push(format!("  {}", self.styles.empty.clone().render(NO_RESULTS)));
        }

        for (i, row) in rows.iter().enumerate() {
            let line = match row {
                Some(row) => {
                    let mut cells: Vec<&str> = row.cells.iter().map(String::as_str).collect();
                    cells.resize(self.columns.len(), "");
                    Self::render_line(cells.into_iter(), &widths)
                }
                None => self.styles.placeholder.clone().render(LOADING),
            };
            if i == self.selected && row.is_some() {
                lines.push(format!("> {}", self.styles.selected.clone().render(&line)));
            } else {
                lines.push(format!("  {}", self.styles.cell.clone().render(&line)));
            }
        }

        if self.paginator.total_pages > 1 {
            let footer = self.paginator.view();
            lines.push(format!("  {}", self.styles.footer.clone().render(&footer)));
        }
        lines.join("\n")
    }
}

fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(strip_ansi_escapes::strip_str(s).as_str())
}

fn truncate(s: &str, width: usize) -> String {
    let plain = strip_ansi_escapes::strip_str(s);
    if UnicodeWidthStr::width(plain.as_str()) <= width {
        return plain;
    }
    let mut out = String::new();
    let mut used = 0;
    for g in plain.graphemes(true) {
        let w = UnicodeWidthStr::width(g);
        if used + w + 1 > width {
            break;
        }
        out.push_str(g);
        used += w;
    }
    if width > 0 {
        out.push_str(ELLIPSIS);
    }
    out
}

fn pad(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    format!("{s}{}", " ".repeat(width.saturating_sub(w)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn strip(s: &str) -> String {
        strip_ansi_escapes::strip_str(s)
    }

    fn agents(n: usize) -> Vec<Row> {
        (1..=n)
            .map(|i| {
                let status = if i % 3 == 0 { "Disconnected" } else { "Active" };
                [format!("{i:03}"), format!("web-{i:02}"), status.to_string()]
                    .into_iter()
                    .collect()
            })
            .collect()
    }

    fn table(n: usize) -> Model {
        Model::new(vec![
            Column::new("ID"),
            Column::new("Name"),
            Column::new("Status"),
        ])
        .with_rows(agents(n))
    }

    #[test]
    fn test_search_resets_page_and_recomputes_total() {
        let mut t = table(25);
        t.next_page(2).unwrap();
        assert_eq!(t.paginator.page, 2);

        t.search("disconnected");
        assert_eq!(t.paginator.page, 0);
        assert_eq!(t.total_items(), 8);
        assert_eq!(t.paginator.total_pages, 1);
        assert!(t
            .paged_rows()
            .iter()
            .flatten()
            .all(|row| row.cells[2] == "Disconnected"));

        t.search("");
        assert_eq!(t.total_items(), 25);
        assert_eq!(t.paginator.total_pages, 3);
    }

    #[test]
    fn test_fuzzy_search() {
        let mut t = table(12).with_search_mode(SearchMode::Fuzzy);
        t.search("w11");
        assert_eq!(t.total_items(), 1);
        assert_eq!(t.paged_rows()[0].unwrap().cells[0], "011");
    }

    #[test]
    fn test_placeholders_count_but_never_match() {
        let mut t = table(0);
        let mut slots: Vec<Option<Row>> = agents(10).into_iter().map(Some).collect();
        slots.extend([None, None]);
        t.set_slots(slots);
        assert_eq!(t.total_items(), 12);
        assert_eq!(t.paginator.total_pages, 2);

        t.next_page(1).unwrap();
        assert_eq!(t.paged_rows(), vec![None, None]);
        assert!(strip(&t.view()).contains(LOADING));

        t.search("web");
        assert_eq!(t.total_items(), 10);
    }

    #[test]
    fn test_set_rows_keeps_valid_page() {
        let mut t = table(30);
        t.next_page(2).unwrap();
        t.set_rows(agents(35));
        assert_eq!(t.paginator.page, 2);
        t.set_rows(agents(5));
        assert_eq!(t.paginator.page, 0);
    }

    #[test]
    fn test_out_of_range_page_is_reported() {
        let mut t = table(12);
        assert!(t.next_page(2).is_err());
        assert_eq!(t.paginator.page, 0);
    }

    #[test]
    fn test_selection_wraps_within_page() {
        let mut t = table(12);
        t.next_page(1).unwrap();
        t.select_next();
        assert_eq!(t.selected_row().unwrap().cells[0], "012");
        t.select_next();
        assert_eq!(t.selected_row().unwrap().cells[0], "011");
        t.select_prev();
        assert_eq!(t.selected_index(), 1);
    }

    #[test]
    fn test_keys_move_selection_and_pages() {
        let mut t = table(15);
        let down = Box::new(KeyMsg {
            key: KeyCode::Char('j'),
            modifiers: KeyModifiers::NONE,
        }) as Msg;
        t.update(&down);
        assert_eq!(t.selected_index(), 1);

        let next = Box::new(KeyMsg {
            key: KeyCode::Right,
            modifiers: KeyModifiers::NONE,
        }) as Msg;
        t.update(&next);
        assert_eq!(t.paginator.page, 1);
        assert_eq!(t.selected_index(), 0);
    }

    #[test]
    fn test_view_layout() {
        let t = table(12);
        let view = strip(&t.view());
        let lines: Vec<&str> = view.lines().collect();
        assert_eq!(lines[0], "  ID  │ Name   │ Status      ");
        assert!(lines[1].starts_with("> 001 │ web-01 │ Active"));
        assert_eq!(lines.last().copied(), Some("  ‹ [1] 2 ›"));
    }

    #[test]
    fn test_empty_search_shows_no_results() {
        let mut t = table(5);
        t.search("nothing-matches");
        assert!(strip(&t.view()).contains(NO_RESULTS));
    }

    #[test]
    fn test_truncate_wide_cells() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
        assert_eq!(truncate("日本語テキスト", 5), "日本…");
        assert_eq!(pad("ab", 4), "ab  ");
    }
}
