use crate::format::fit_cell;
use crate::system::process::ProcessSnapshot;
use crate::view::{Column, SortSpec};

const MISSING: &str = "?";

pub fn header_label(column: Column, sort: &SortSpec) -> String {
    let mut label = column.label().to_string();
    if column.is_percentage() {
        label.push_str(" %");
    }
    if column == sort.column {
        label.push_str(if sort.ascending { " ^" } else { " v" });
    }
    label
}

pub fn header_cells(columns: &[Column], sort: &SortSpec, cell_width: usize) -> String {
    columns
        .iter()
        .map(|&c| fit_cell(&header_label(c, sort), cell_width))
        .collect()
}

pub fn cell_text(row: &ProcessSnapshot, column: Column) -> String {
    match column {
        Column::Pid => row.pid.to_string(),
        Column::Name => row.name.as_deref().unwrap_or(MISSING).to_string(),
        Column::Path => row.path.as_deref().unwrap_or(MISSING).to_string(),
        Column::User => row.user.clone(),
        Column::Cpu => percent(row.cpu_percent),
        Column::Memory => percent(row.mem_percent),
    }
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format!("{v:.3}"))
}

pub fn row_cells(row: &ProcessSnapshot, columns: &[Column], cell_width: usize) -> String {
    columns
        .iter()
        .map(|&c| fit_cell(&cell_text(row, c), cell_width))
        .collect()
}
