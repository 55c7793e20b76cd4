use std::fmt;

use facet::Facet;

/// Where in the debuggee a snapshot was captured. Carries no identity; two
/// snapshots taken at the same line get equal labels.
#[derive(Facet, Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLabel {
    pub filename: String,
    /// 1-based source line.
    pub line: u32,
    pub column: u32,
    pub function_name: String,
}

impl HistoryLabel {
    pub fn new(
        filename: impl Into<String>,
        line: u32,
        column: u32,
        function_name: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            line,
            column,
            function_name: function_name.into(),
        }
    }
}

impl fmt::Display for HistoryLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}:{}:{})",
            self.function_name, self.filename, self.line, self.column
        )
    }
}
