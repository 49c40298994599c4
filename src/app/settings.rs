//! Connection settings: parse/write `user-admin.conf`.
//!
//! The file uses the same `key = value` format as the theme and keybinding
//! files. Command-line flags are layered on top with [`Settings::apply_overrides`].

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Backend and paging settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Base URL of the admin API, e.g. `https://example.com/api`.
    pub endpoint: Option<String>,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    /// Users requested per page.
    pub page_size: usize,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Where log output goes; the terminal belongs to the UI.
    pub log_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            page_size: crate::model::DEFAULT_PAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_file: "user-admin.log".to_string(),
        }
    }
}

/// Values given on the command line; `None` keeps the file value.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub token: Option<String>,
    pub page_size: Option<usize>,
    pub log_file: Option<String>,
}

impl Settings {
    /// Load settings from `path`, or write the defaults there if it doesn't exist.
    pub fn load_or_init(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        let cfg = Self::default();
        if let Err(e) = cfg.write_file(path) {
            tracing::warn!(error = %e, "could not write default settings to {path}");
        }
        cfg
    }

    /// Parse a settings file. Unknown keys and unparsable numbers are skipped.
    ///
    /// Returns `None` if the file can't be read.
    pub fn from_file(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        let mut cfg = Self::default();
        for raw in contents.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, '=');
            let lhs = parts.next().map(|s| s.trim()).unwrap_or("");
            let rhs = parts.next().map(|s| s.trim()).unwrap_or("");
            if lhs.is_empty() || rhs.is_empty() {
                continue;
            }
            match lhs {
                "endpoint" => cfg.endpoint = Some(rhs.to_string()),
                "token" => cfg.token = Some(rhs.to_string()),
                "page_size" => {
                    if let Ok(n) = rhs.parse::<usize>()
                        && n > 0
                    {
                        cfg.page_size = n;
                    }
                }
                "timeout_secs" => {
                    if let Ok(n) = rhs.parse::<u64>()
                        && n > 0
                    {
                        cfg.timeout_secs = n;
                    }
                }
                "log_file" => cfg.log_file = rhs.to_string(),
                _ => {}
            }
        }
        cfg
    }

    /// Write the settings in `key = value` form. Unset values are written commented out.
    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# user-admin settings\n");
        buf.push_str("# endpoint: base URL of the admin API\n");
        buf.push_str("#   (GET /roles, GET /users, POST|DELETE /users/{uid}/roles/{rid})\n");
        match &self.endpoint {
            Some(e) => {
                let _ = writeln!(&mut buf, "endpoint = {e}");
            }
            None => buf.push_str("# endpoint = https://example.com/api\n"),
        }
        match &self.token {
            Some(t) => {
                let _ = writeln!(&mut buf, "token = {t}");
            }
            None => buf.push_str("# token = \n"),
        }
        let _ = writeln!(&mut buf, "page_size = {}", self.page_size);
        let _ = writeln!(&mut buf, "timeout_secs = {}", self.timeout_secs);
        let _ = writeln!(&mut buf, "log_file = {}", self.log_file);
        std::fs::write(path, buf)
    }

    pub fn apply_overrides(&mut self, o: Overrides) {
        if let Some(e) = o.endpoint {
            self.endpoint = Some(e);
        }
        if let Some(t) = o.token {
            self.token = Some(t);
        }
        if let Some(n) = o.page_size.filter(|n| *n > 0) {
            self.page_size = n;
        }
        if let Some(l) = o.log_file {
            self.log_file = l;
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}
