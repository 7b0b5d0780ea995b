use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Longest prefix of `s` that fits in `max_width` display columns.
pub fn truncate_unicode(s: &str, max_width: usize) -> &str {
    if s.width() <= max_width {
        return s;
    }
    let mut width = 0;
    for (idx, ch) in s.char_indices() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width {
            return &s[..idx];
        }
        width += ch_width;
    }
    s
}

/// Left-justify `s` in a cell `width` columns wide. Text wider than
/// `width - 1` is cut so at least one column of separation remains.
pub fn fit_cell(s: &str, width: usize) -> String {
    let text = truncate_unicode(s, width.saturating_sub(1));
    pad_right(text, width)
}

pub fn pad_right(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.width());
    let mut out = String::with_capacity(s.len() + fill);
    out.push_str(s);
    out.extend(std::iter::repeat_n(' ', fill));
    out
}

/// Center `s` in `width` columns, truncating when it does not fit.
pub fn center(s: &str, width: usize) -> String {
    let text = truncate_unicode(s, width);
    let free = width - text.width();
    let left = free / 2;
    let mut out = " ".repeat(left);
    out.push_str(text);
    out.extend(std::iter::repeat_n(' ', free - left));
    out
}

pub fn format_gb(bytes: u64) -> String {
    const GB: f64 = 1024.0 * 1024.0 * 1024.0;
    format!("{:.1}", bytes as f64 / GB)
}
