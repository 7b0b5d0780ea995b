//! User-controlled display state: visible columns, sort, scroll position and
//! the per-draw layout derived from the terminal size.

use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Pid,
    Name,
    Path,
    User,
    Cpu,
    Memory,
}

impl Column {
    pub fn label(self) -> &'static str {
        match self {
            Column::Pid => "PID",
            Column::Name => "NAME",
            Column::Path => "PATH",
            Column::User => "USER",
            Column::Cpu => "CPU",
            Column::Memory => "MEMORY",
        }
    }

    pub fn is_percentage(self) -> bool {
        matches!(self, Column::Cpu | Column::Memory)
    }

    pub fn from_str_config(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pid" => Some(Column::Pid),
            "name" => Some(Column::Name),
            "path" => Some(Column::Path),
            "user" => Some(Column::User),
            "cpu" => Some(Column::Cpu),
            "memory" | "mem" => Some(Column::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: Column,
    pub ascending: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec {
            column: Column::Cpu,
            ascending: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermSize {
    pub rows: u16,
    pub columns: u16,
}

impl TermSize {
    pub const FALLBACK: TermSize = TermSize {
        rows: 24,
        columns: 80,
    };
}

impl Default for TermSize {
    fn default() -> Self {
        Self::FALLBACK
    }
}

/// Geometry of one draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub footer_lines: usize,
    pub page_size: usize,
    pub cell_width: usize,
}

impl Layout {
    pub const HEADER_LINES: usize = 1;

    pub fn compute(size: TermSize, column_count: usize, hint: &str) -> Self {
        let cols = usize::from(size.columns).max(1);
        let footer_lines = hint.width().div_ceil(cols) + 1;
        let page_size = usize::from(size.rows).saturating_sub(Self::HEADER_LINES + footer_lines);
        let cell_width = match column_count {
            0 => 0,
            n => usize::from(size.columns) / n,
        };
        Layout {
            footer_lines,
            page_size,
            cell_width,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub scroll_index: usize,
    pub page_size: usize,
    pub cell_width: usize,
    pub columns: Vec<Column>,
    pub sort: SortSpec,
}

impl ViewState {
    pub fn new(columns: Vec<Column>, sort: SortSpec) -> Self {
        ViewState {
            scroll_index: 0,
            page_size: 0,
            cell_width: 0,
            columns,
            sort,
        }
    }

    pub fn apply_layout(&mut self, layout: &Layout) {
        self.page_size = layout.page_size;
        self.cell_width = layout.cell_width;
    }

    pub fn scroll_up(&mut self) -> bool {
        if self.scroll_index > 0 {
            self.scroll_index -= 1;
            true
        } else {
            false
        }
    }

    pub fn scroll_down(&mut self, total: usize) -> bool {
        if self.scroll_index + self.page_size < total {
            self.scroll_index += 1;
            true
        } else {
            false
        }
    }

    /// Same as `page_size` consecutive `scroll_down`s.
    pub fn page_down(&mut self, total: usize) -> bool {
        let last_page = total.saturating_sub(self.page_size);
        let target = (self.scroll_index + self.page_size).min(last_page);
        if target > self.scroll_index {
            self.scroll_index = target;
            true
        } else {
            false
        }
    }

    /// Keep the view from running past the last full page after the row
    /// count shrinks.
    pub fn clamp(&mut self, total: usize) {
        let last_page = total.saturating_sub(self.page_size);
        self.scroll_index = self.scroll_index.min(last_page);
    }

    /// Sort by the visible column at `index`. Re-selecting the active column
    /// flips direction; a new column starts ascending. Returns whether the
    /// sort changed.
    pub fn select_column(&mut self, index: usize) -> bool {
        let Some(&column) = self.columns.get(index) else {
            return false;
        };
        if column == self.sort.column {
            self.sort.ascending = !self.sort.ascending;
        } else {
            self.sort = SortSpec {
                column,
                ascending: true,
            };
        }
        true
    }

    /// Resolve a click at character offset `offset` on the header row.
    pub fn click_header(&mut self, offset: usize) -> bool {
        if self.cell_width == 0 {
            return false;
        }
        self.select_column(offset / self.cell_width)
    }
}
