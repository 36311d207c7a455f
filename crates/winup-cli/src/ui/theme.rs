//! UI Theme - colors, icons and column widths in one place.

use crossterm::style::Color;
use winup_schema::OperationStatus;

#[derive(Debug, Clone, Default)]
pub struct Theme {
    pub colors: ColorScheme,
    pub icons: Icons,
    pub layout: Layout,
}

impl Theme {
    /// Icon for a batch item status.
    pub fn status_icon(&self, status: OperationStatus) -> &'static str {
        match status {
            OperationStatus::Pending => self.icons.pending,
            OperationStatus::InProgress => self.icons.active,
            OperationStatus::Success => self.icons.success,
            OperationStatus::Failed => self.icons.error,
            OperationStatus::Skipped => self.icons.skipped,
        }
    }

    /// Color for a batch item status.
    pub fn status_color(&self, status: OperationStatus) -> Color {
        match status {
            OperationStatus::Pending | OperationStatus::Skipped => self.colors.secondary,
            OperationStatus::InProgress => self.colors.active,
            OperationStatus::Success => self.colors.success,
            OperationStatus::Failed => self.colors.error,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ColorScheme {
    /// KB identifiers and item labels
    pub label: Color,
    /// Dates, targets and other secondary info
    pub secondary: Color,
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    /// In-progress items
    pub active: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            label: Color::Cyan,
            secondary: Color::DarkGrey,
            header: Color::DarkGrey,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            active: Color::Yellow,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Icons {
    /// Pending/queued state (○)
    pub pending: &'static str,
    /// Active/in-progress state (●)
    pub active: &'static str,
    /// Success/completed state (✓)
    pub success: &'static str,
    /// Error/failed state (✗)
    pub error: &'static str,
    /// Skipped state (–)
    pub skipped: &'static str,
    /// Warning state (⚠)
    pub warning: &'static str,
    /// Info/Tip state (ℹ)
    pub info: &'static str,
    /// Latest security update marker (★)
    pub latest: &'static str,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            pending: "○",
            active: "●",
            success: "✓",
            error: "✗",
            skipped: "–",
            warning: "⚠",
            info: "ℹ",
            latest: "★",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Layout {
    /// Width of the item label column in batch output
    pub label_width: usize,
    /// Longest title shown in `winup list` before truncation
    pub title_width: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            label_width: 28,
            title_width: 60,
        }
    }
}

/// Truncate `text` to `width` characters, marking the cut with `…`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
