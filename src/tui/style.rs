//! Color constants and auto-scaling helpers for the dashboard.

use ratatui::style::Color;

/// Measured consumption line color.
pub const ACTUAL_COLOR: Color = Color::Cyan;
/// Predicted consumption line color.
pub const PREDICTED_COLOR: Color = Color::DarkGray;
/// Header bar foreground.
pub const HEADER_FG: Color = Color::White;
/// Header bar background.
pub const HEADER_BG: Color = Color::DarkGray;
/// Footer help text color.
pub const FOOTER_FG: Color = Color::DarkGray;
/// Optimization toggle when active.
pub const ACTIVE: Color = Color::Green;
/// Optimization toggle when paused.
pub const PAUSED: Color = Color::Yellow;
/// Error notices and form messages.
pub const ERROR: Color = Color::Red;
/// Focused form field.
pub const FOCUS: Color = Color::Cyan;

/// Color for a change relative to a reference: lower usage is good.
pub fn delta_color(pct: f64) -> Color {
    if pct <= 0.0 { ACTIVE } else { PAUSED }
}

/// Computes Y-axis bounds from chart data points with 10% padding.
///
/// The lower bound never drops below zero since consumption is non-negative.
pub fn auto_bounds_y(actual: &[(f64, f64)], predicted: &[(f64, f64)]) -> [f64; 2] {
    let all = actual.iter().chain(predicted.iter()).map(|&(_, y)| y);
    let min = all.clone().fold(f64::INFINITY, f64::min);
    let max = all.fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    let range = (max - min).max(0.1);
    let pad = range * 0.1;
    [(min - pad).max(0.0), max + pad]
}
