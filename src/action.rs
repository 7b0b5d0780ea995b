/// Semantic events decoded from terminal input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ScrollUp,
    ScrollDown,
    PageDown,
    /// Sort by the visible column at this index.
    SortColumn(usize),
    /// Left click on the header row at this zero-based character offset.
    HeaderClick(usize),
    Quit,
}
