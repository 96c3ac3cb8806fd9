//! Two-column text layout on a fixed character grid
//!
//! Receipt rows are built from two text blocks sharing one printed line.
//! Each side gets a percentage of the grid, is hard-wrapped at its width
//! and padded so every emitted line has the same printed width.
//!
//! Widths are measured in printed columns for the printer's capability
//! profile: one per character, except double-width glyphs in GBK mode.

use crate::encoding::CapabilityProfile;

/// How the right column is padded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RightAlign {
    /// Left-justified (padded on the right)
    #[default]
    Plain,
    /// Right-justified (padded on the left), used for money columns
    Money,
}

/// A single two-column row request
#[derive(Debug, Clone)]
pub struct ColumnSpec<'a> {
    pub left_text: &'a str,
    pub right_text: &'a str,
    pub left_percent: usize,
    pub right_percent: usize,
    pub inter_column_space: usize,
    pub width_reduction: usize,
    pub right_align: RightAlign,
}

impl<'a> ColumnSpec<'a> {
    /// Plain row with no gap and no width reduction
    pub fn new(left_text: &'a str, right_text: &'a str, left_percent: usize, right_percent: usize) -> Self {
        Self {
            left_text,
            right_text,
            left_percent,
            right_percent,
            inter_column_space: 0,
            width_reduction: 0,
            right_align: RightAlign::Plain,
        }
    }

    pub fn space(mut self, inter_column_space: usize) -> Self {
        self.inter_column_space = inter_column_space;
        self
    }

    pub fn reduce(mut self, width_reduction: usize) -> Self {
        self.width_reduction = width_reduction;
        self
    }

    pub fn money(mut self) -> Self {
        self.right_align = RightAlign::Money;
        self
    }
}

/// Formats text into fixed-width two-column lines
#[derive(Debug, Clone, Copy)]
pub struct TextColumnFormatter {
    chars_per_line: usize,
    profile: CapabilityProfile,
}

impl TextColumnFormatter {
    /// Create a formatter for a grid of `chars_per_line` characters
    ///
    /// Common widths:
    /// - 58mm paper: 32 characters
    /// - 80mm paper: 42 or 48 characters
    pub fn new(chars_per_line: usize) -> Self {
        Self::with_profile(chars_per_line, CapabilityProfile::Default)
    }

    /// Create a formatter measuring text as printed under `profile`
    pub fn with_profile(chars_per_line: usize, profile: CapabilityProfile) -> Self {
        Self {
            chars_per_line,
            profile,
        }
    }

    pub fn chars_per_line(&self) -> usize {
        self.chars_per_line
    }

    /// Resolve the (left, right) column widths for a spec
    ///
    /// Widths are floored, so the two columns may under-fill the line.
    pub fn column_widths(&self, spec: &ColumnSpec<'_>) -> (usize, usize) {
        let grid = self.chars_per_line.saturating_sub(spec.width_reduction);
        (grid * spec.left_percent / 100, grid * spec.right_percent / 100)
    }

    /// Lay out two blocks side by side, right column left-justified
    pub fn columnify(
        &self,
        left: &str,
        right: &str,
        left_percent: usize,
        right_percent: usize,
        inter_column_space: usize,
        width_reduction: usize,
    ) -> String {
        self.columnify_spec(
            &ColumnSpec::new(left, right, left_percent, right_percent)
                .space(inter_column_space)
                .reduce(width_reduction),
        )
    }

    /// Same as [`columnify`](Self::columnify) with the right column right-justified
    pub fn columnify_money(
        &self,
        left: &str,
        right: &str,
        left_percent: usize,
        right_percent: usize,
        inter_column_space: usize,
        width_reduction: usize,
    ) -> String {
        self.columnify_spec(
            &ColumnSpec::new(left, right, left_percent, right_percent)
                .space(inter_column_space)
                .reduce(width_reduction)
                .money(),
        )
    }

    pub fn columnify_spec(&self, spec: &ColumnSpec<'_>) -> String {
        let (left_width, right_width) = self.column_widths(spec);

        let width_of = |c: char| self.profile.char_width(c);
        let left_lines = wrap_with(spec.left_text, left_width, width_of);
        let right_lines = wrap_with(spec.right_text, right_width, width_of);
        let rows = left_lines.len().max(right_lines.len());
        let gap = " ".repeat(spec.inter_column_space);

        let mut out = String::with_capacity(rows * (left_width + right_width + gap.len() + 1));
        for i in 0..rows {
            let left = left_lines.get(i).map(String::as_str).unwrap_or("");
            let right = right_lines.get(i).map(String::as_str).unwrap_or("");

            out.push_str(&self.pad(left, left_width, false));
            out.push_str(&gap);
            out.push_str(&self.pad(right, right_width, spec.right_align == RightAlign::Money));
            out.push('\n');
        }
        out
    }

    /// A separator of `chars_per_line - 1` dashes, newline-terminated
    pub fn draw_line(&self) -> String {
        let mut line = "-".repeat(self.chars_per_line.saturating_sub(1));
        line.push('\n');
        line
    }

    /// Pad a string to `width` printed columns
    fn pad(&self, s: &str, width: usize, align_right: bool) -> String {
        let len = self.profile.text_width(s);
        if len >= width {
            return s.to_string();
        }
        let spaces = " ".repeat(width - len);
        if align_right {
            format!("{}{}", spaces, s)
        } else {
            format!("{}{}", s, spaces)
        }
    }
}

/// Split `text` into sub-lines of at most `width` characters
///
/// Breaks at exactly `width` characters regardless of word boundaries.
/// Embedded newlines start a new sub-line. Always yields at least one
/// entry, and a zero width yields a single empty sub-line.
pub fn hard_wrap(text: &str, width: usize) -> Vec<String> {
    wrap_with(text, width, |_| 1)
}

/// [`hard_wrap`] with a per-character column width
///
/// A glyph wider than `width` still gets a sub-line of its own.
fn wrap_with(text: &str, width: usize, char_width: impl Fn(char) -> usize) -> Vec<String> {
    if width == 0 {
        return vec![String::new()];
    }

    let mut lines = Vec::new();
    for segment in text.split('\n') {
        let mut line = String::new();
        let mut used = 0;
        for c in segment.chars() {
            let w = char_width(c);
            if used > 0 && used + w > width {
                lines.push(std::mem::take(&mut line));
                used = 0;
            }
            line.push(c);
            used += w;
        }
        lines.push(line);
    }
    lines
}
