//! Full-screen renderer. `draw` is a pure function of its inputs; the
//! caller owns writing the result to the terminal.

pub mod statusbar;
pub mod table;
pub mod theme;

use crossterm::Command;
use crossterm::cursor::MoveTo;
use crossterm::terminal::{Clear, ClearType};

use crate::system::process::ProcessSnapshot;
use crate::system::snapshot::SystemSnapshot;
use crate::view::{TermSize, ViewState};
use theme::Theme;

const NEWLINE: &str = "\r\n";

/// Everything one draw needs. `view.page_size` and `view.cell_width` must
/// already reflect `size`.
pub struct Frame<'a> {
    pub rows: &'a [ProcessSnapshot],
    pub view: &'a ViewState,
    pub system: &'a SystemSnapshot,
    pub size: TermSize,
    pub hint: &'a str,
}

fn ansi(out: &mut String, command: impl Command) {
    // writing into a String cannot fail
    let _ = command.write_ansi(out);
}

pub fn draw(frame: &Frame, theme: &Theme) -> String {
    let view = frame.view;
    let total = frame.rows.len();
    let start = view.scroll_index.min(total);
    let end = (start + view.page_size).min(total);

    let mut out = String::new();
    ansi(&mut out, MoveTo(0, 0));
    ansi(&mut out, Clear(ClearType::All));

    out.push_str(&theme.table);
    out.push_str(&theme.header);
    out.push_str(&table::header_cells(
        &view.columns,
        &view.sort,
        view.cell_width,
    ));
    out.push_str(&theme.reset);
    out.push_str(NEWLINE);

    for row in &frame.rows[start..end] {
        out.push_str(&theme.table);
        out.push_str(&table::row_cells(row, &view.columns, view.cell_width));
        out.push_str(&theme.reset);
        out.push_str(NEWLINE);
    }

    out.push_str(&theme.footer);
    out.push_str(&statusbar::status_line(
        &statusbar::summary(frame.system),
        &statusbar::showing(start, end, total),
        usize::from(frame.size.columns),
    ));
    out.push_str(&theme.reset);
    out.push_str(NEWLINE);
    out.push_str(frame.hint);

    out
}
