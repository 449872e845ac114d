use client_report_types::Color;
use serde::Deserialize;

/// Colours shared by both report pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Theme {
    pub header_background: Color,
    pub alternate_row_background: Color,
    pub totals_background: Color,
    pub base_row_background: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            header_background: Color::rgb(41, 128, 185),
            alternate_row_background: Color::rgb(236, 240, 241),
            totals_background: Color::rgb(44, 62, 80),
            base_row_background: Color::WHITE,
        }
    }
}

impl Theme {
    /// Background of data row `index` (0-based). Even rows are shaded.
    pub fn row_color(&self, index: usize) -> Color {
        if index % 2 == 0 {
            self.alternate_row_background
        } else {
            self.base_row_background
        }
    }
}
