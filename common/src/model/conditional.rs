use serde::{Deserialize, Serialize};

/// The sentinel pair used by the `shouldBeGenerated` spreadsheet column.
///
/// Rows marked `YES` are picked up by the generation pipeline; once a row has
/// been generated successfully it is written back as `NO` so the next run
/// skips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conditional {
    #[serde(rename = "YES")]
    Yes,
    #[serde(rename = "NO")]
    No,
}

impl Conditional {
    /// The exact cell value written back to the sheet.
    pub fn as_str(&self) -> &'static str {
        match self {
            Conditional::Yes => "YES",
            Conditional::No => "NO",
        }
    }

    /// Whether a raw cell value means this sentinel. Cells are compared
    /// trimmed and case-insensitively, so `" yes "` counts as affirmative.
    pub fn matches(&self, cell: &str) -> bool {
        cell.trim().eq_ignore_ascii_case(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_is_trimmed_and_case_insensitive() {
        assert!(Conditional::Yes.matches("YES"));
        assert!(Conditional::Yes.matches(" yes "));
        assert!(Conditional::Yes.matches("Yes"));
        assert!(!Conditional::Yes.matches("NO"));
        assert!(!Conditional::Yes.matches(""));
        assert!(Conditional::No.matches("no"));
    }
}
