//! Base constants and utility functions for the chart module.

/// RGBA color used by the draw plan, independent of any GUI toolkit.
pub type Rgba = [u8; 4];

// Chart colors
pub const BACKGROUND_COLOR: Rgba = [34, 34, 34, 255];
pub const GRID_COLOR: Rgba = [51, 51, 51, 255];
pub const AXIS_TEXT_COLOR: Rgba = [162, 221, 132, 255];
pub const LABEL_TEXT_COLOR: Rgba = [0, 0, 0, 255];
pub const EMPTY_TEXT_COLOR: Rgba = [100, 100, 100, 255];

// Price movement colors
pub const UP_COLOR: Rgba = [162, 221, 132, 255];
pub const DOWN_COLOR: Rgba = [255, 77, 77, 255];

// Cursor and drawing colors
pub const CURSOR_COLOR: Rgba = [162, 221, 132, 255];
pub const ANNOTATION_COLOR: Rgba = [162, 221, 132, 255];
pub const SELECTED_COLOR: Rgba = [255, 255, 255, 255];

// Overlay colors
pub const EMA_FAST_COLOR: Rgba = [0, 191, 255, 255];
pub const EMA_SLOW_COLOR: Rgba = [255, 179, 71, 255];
pub const SMA_COLOR: Rgba = [255, 100, 255, 255];

// Window limits, in bars
pub const MIN_VISIBLE: usize = 100;
pub const MAX_VISIBLE: usize = 500;
pub const DEFAULT_VISIBLE: usize = 150;

// Interaction speeds
pub const ZOOM_SPEED: i64 = 20;
pub const SCROLL_SPEED: f64 = 0.5;
pub const HIT_TOLERANCE: f32 = 8.0;

// Line widths
pub const PEN_WIDTH: f32 = 1.0;
pub const OVERLAY_WIDTH: f32 = 1.5;
pub const ANNOTATION_WIDTH: f32 = 1.6;
pub const HANDLE_RADIUS: f32 = 4.0;

/// Candle body width as a share of the bar slot
pub const BAR_BODY_RATIO: f32 = 0.6;

// Layout constants
pub const MARGIN_LEFT: f32 = 10.0;
pub const MARGIN_RIGHT: f32 = 60.0;
pub const MARGIN_TOP: f32 = 25.0;
pub const MARGIN_BOTTOM: f32 = 25.0;
pub const PRICE_LABEL_WIDTH: f32 = 50.0;
pub const PRICE_LABEL_HEIGHT: f32 = 16.0;
pub const TIME_LABEL_WIDTH: f32 = 90.0;
pub const TIME_LABEL_HEIGHT: f32 = 18.0;
pub const FONT_SIZE: f32 = 9.0;
pub const PRICE_TICKS: usize = 5;
pub const TIME_LABELS: usize = 6;

/// Format price with appropriate precision
pub fn format_price(price: f64, decimals: usize) -> String {
    format!("{:.prec$}", price, prec = decimals)
}

/// Calculate nice axis tick values
pub fn calculate_axis_ticks(min_val: f64, max_val: f64, max_ticks: usize) -> Vec<f64> {
    if min_val >= max_val || max_ticks == 0 {
        return vec![min_val];
    }

    let range = max_val - min_val;
    let rough_step = range / max_ticks as f64;

    let magnitude = 10.0_f64.powf(rough_step.log10().floor());
    let residual = rough_step / magnitude;

    let nice_step = if residual <= 1.5 {
        magnitude
    } else if residual <= 3.0 {
        2.0 * magnitude
    } else if residual <= 7.0 {
        5.0 * magnitude
    } else {
        10.0 * magnitude
    };

    let mut ticks = Vec::new();
    let mut value = (min_val / nice_step).ceil() * nice_step;

    while value <= max_val {
        ticks.push(value);
        value += nice_step;
    }

    ticks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(150.0, 2), "150.00");
        assert_eq!(format_price(1.23456, 4), "1.2346");
    }

    #[test]
    fn test_calculate_axis_ticks() {
        let ticks = calculate_axis_ticks(0.0, 100.0, 5);
        assert_eq!(ticks, vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);

        let ticks = calculate_axis_ticks(148.3, 156.9, 5);
        assert!(!ticks.is_empty());
        for tick in &ticks {
            assert!(*tick >= 148.3 && *tick <= 156.9);
        }
    }

    #[test]
    fn test_calculate_axis_ticks_degenerate() {
        assert_eq!(calculate_axis_ticks(5.0, 5.0, 5), vec![5.0]);
    }
}
