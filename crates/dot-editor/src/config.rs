//! Editor configuration.

// ─── Config ───────────────────────────────────────────────────────────────

/// Controls the layout of statements inserted by `DotGraph`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Prefix for every inserted statement. Default: **four spaces**.
    pub indent: String,

    /// Start an inserted statement on its own line when the closing brace
    /// shares a line with other content. Default: **true**.
    pub fresh_line_inserts: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
            fresh_line_inserts: true,
        }
    }
}
