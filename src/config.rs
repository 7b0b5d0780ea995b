use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::view::{Column, SortSpec};

pub const DEFAULT_HINT: &str =
    "Use j/k to scroll, Enter to scroll entire row, 'q' or Ctrl+C to quit";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub table: TableConfig,
    pub colors: ColorsConfig,
    pub footer: FooterConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub refresh_rate_ms: u64,
    pub auto_refresh: bool,
    pub mouse: bool,
    pub cpu_sample_ms: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            refresh_rate_ms: 2000,
            auto_refresh: true,
            mouse: true,
            cpu_sample_ms: 100,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub columns: Vec<String>,
    pub sort_column: String,
    pub sort_ascending: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            columns: ["pid", "name", "user", "cpu", "memory"]
                .map(String::from)
                .to_vec(),
            sort_column: "cpu".to_string(),
            sort_ascending: false,
        }
    }
}

/// Raw ANSI strings; escapes such as `\033` are resolved by [`unescape_ansi`].
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    pub table: String,
    pub header: String,
    pub footer: String,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        ColorsConfig {
            table: "\x1b[40m\x1b[37m".to_string(),
            header: "\x1b[47m\x1b[30m".to_string(),
            footer: "\x1b[41m\x1b[37m".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FooterConfig {
    pub keybindings: String,
}

impl Default for FooterConfig {
    fn default() -> Self {
        FooterConfig {
            keybindings: DEFAULT_HINT.to_string(),
        }
    }
}

impl Config {
    /// Visible columns in configured order. Unknown names are skipped; an
    /// empty result falls back to the defaults.
    pub fn columns(&self) -> Vec<Column> {
        let columns: Vec<Column> = self
            .table
            .columns
            .iter()
            .filter_map(|name| {
                let column = Column::from_str_config(name);
                if column.is_none() {
                    warn!(column = %name, "ignoring unknown column");
                }
                column
            })
            .collect();
        if columns.is_empty() {
            warn!("no usable columns configured, using defaults");
            return Config::default().columns();
        }
        columns
    }

    pub fn sort_spec(&self) -> SortSpec {
        let column = Column::from_str_config(&self.table.sort_column).unwrap_or_else(|| {
            warn!(column = %self.table.sort_column, "unknown sort column, sorting by cpu");
            Column::Cpu
        });
        SortSpec {
            column,
            ascending: self.table.sort_ascending,
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("procdash").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Config::default(),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cannot read config, using defaults");
            return Config::default();
        }
    };
    match toml::from_str(&contents) {
        Ok(config) => config,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "invalid config, using defaults");
            Config::default()
        }
    }
}

const ESC: char = '\x1b';

/// Turn a user-written color string into raw ANSI.
///
/// Strips `"` and `+`, resolves `\033`, `033`, `\x1b`, `\e` and `\u001b` to
/// ESC, removes whitespace that follows an SGR sequence, and trims.
pub fn unescape_ansi(raw: &str) -> String {
    let mut s: String = raw.chars().filter(|c| !matches!(c, '"' | '+')).collect();
    for escape in ["\\033", "\\x1b", "\\x1B", "\\u001b", "\\u001B", "\\e", "033"] {
        s = s.replace(escape, "\x1b");
    }
    drop_space_after_sgr(&s).trim().to_string()
}

fn drop_space_after_sgr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if c != ESC || chars.peek() != Some(&'[') {
            continue;
        }
        out.push('[');
        chars.next();
        while let Some(&p) = chars.peek() {
            if !(p.is_ascii_digit() || p == ';') {
                break;
            }
            out.push(p);
            chars.next();
        }
        if chars.peek() == Some(&'m') {
            out.push('m');
            chars.next();
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.general.refresh_rate_ms, 2000);
        assert!(config.general.auto_refresh);
        assert_eq!(config.general.cpu_sample_ms, 100);
        assert_eq!(
            config.columns(),
            vec![
                Column::Pid,
                Column::Name,
                Column::User,
                Column::Cpu,
                Column::Memory
            ]
        );
        assert_eq!(config.sort_spec(), SortSpec::default());
        assert_eq!(config.footer.keybindings, DEFAULT_HINT);
    }

    #[test]
    fn parse_partial_toml() {
        let toml_str = r#"
[general]
refresh_rate_ms = 500
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.refresh_rate_ms, 500);
        assert!(config.general.mouse);
        assert_eq!(config.table.sort_column, "cpu");
    }

    #[test]
    fn parse_full_toml() {
        let toml_str = r#"
[general]
refresh_rate_ms = 1000
auto_refresh = false
mouse = false
cpu_sample_ms = 250

[table]
columns = ["pid", "path", "Memory", "bogus", "cpu"]
sort_column = "memory"
sort_ascending = true

[colors]
header = "\\033[44m"

[footer]
keybindings = "q quits"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.refresh_rate_ms, 1000);
        assert!(!config.general.auto_refresh);
        assert!(!config.general.mouse);
        assert_eq!(config.general.cpu_sample_ms, 250);
        assert_eq!(
            config.columns(),
            vec![Column::Pid, Column::Path, Column::Memory, Column::Cpu]
        );
        assert_eq!(
            config.sort_spec(),
            SortSpec {
                column: Column::Memory,
                ascending: true
            }
        );
        assert_eq!(unescape_ansi(&config.colors.header), "\x1b[44m");
        assert_eq!(config.footer.keybindings, "q quits");
    }

    #[test]
    fn empty_column_list_falls_back_to_defaults() {
        let config: Config = toml::from_str("[table]\ncolumns = []\n").unwrap();
        assert_eq!(config.columns().len(), 5);
    }

    #[test]
    fn missing_file_returns_default() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.toml"));
        assert_eq!(config.general.refresh_rate_ms, 2000);
    }

    #[test]
    fn invalid_toml_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is not valid toml {{{{").unwrap();
        let config = load_config_from_path(&path);
        assert_eq!(config.general.refresh_rate_ms, 2000);
    }

    #[test]
    fn unescape_handles_the_common_spellings() {
        assert_eq!(unescape_ansi(r"\033[40m"), "\x1b[40m");
        assert_eq!(unescape_ansi("033[40m"), "\x1b[40m");
        assert_eq!(unescape_ansi(r"\x1b[1m"), "\x1b[1m");
        assert_eq!(unescape_ansi(r"\e[1m"), "\x1b[1m");
        assert_eq!(unescape_ansi(r"\u001b[1m"), "\x1b[1m");
    }

    #[test]
    fn unescape_strips_quotes_plus_and_inner_whitespace() {
        assert_eq!(
            unescape_ansi(r#" "\033[40m" + "\033[37m" "#),
            "\x1b[40m\x1b[37m"
        );
    }

    #[test]
    fn unescape_is_idempotent_on_raw_escapes() {
        let raw = ColorsConfig::default().table;
        assert_eq!(unescape_ansi(&raw), raw);
    }
}
