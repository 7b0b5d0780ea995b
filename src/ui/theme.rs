use crossterm::Command;
use crossterm::style::{Attribute, SetAttribute};

use crate::config::{ColorsConfig, unescape_ansi};

/// ANSI prefixes for each screen region. Colors are plain string
/// substitution; there is no palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub table: String,
    pub header: String,
    pub footer: String,
    pub reset: String,
}

impl Theme {
    pub fn from_config(colors: &ColorsConfig) -> Self {
        let mut reset = String::new();
        // writing into a String cannot fail
        let _ = SetAttribute(Attribute::Reset).write_ansi(&mut reset);
        Theme {
            table: unescape_ansi(&colors.table),
            header: unescape_ansi(&colors.header),
            footer: unescape_ansi(&colors.footer),
            reset,
        }
    }

    /// No escape sequences at all.
    pub fn plain() -> Self {
        Theme {
            table: String::new(),
            header: String::new(),
            footer: String::new(),
            reset: String::new(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_config(&ColorsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_theme_uses_stock_colors() {
        let theme = Theme::default();
        assert_eq!(theme.table, "\x1b[40m\x1b[37m");
        assert_eq!(theme.header, "\x1b[47m\x1b[30m");
        assert_eq!(theme.footer, "\x1b[41m\x1b[37m");
        assert_eq!(theme.reset, "\x1b[0m");
    }

    #[test]
    fn config_strings_are_unescaped() {
        let colors = ColorsConfig {
            table: r"\033[44m".to_string(),
            header: r#""\033[1m" + "\033[33m""#.to_string(),
            footer: String::new(),
        };
        let theme = Theme::from_config(&colors);
        assert_eq!(theme.table, "\x1b[44m");
        assert_eq!(theme.header, "\x1b[1m\x1b[33m");
        assert_eq!(theme.footer, "");
    }
}
