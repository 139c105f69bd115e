// ABOUTME: Layout rules for the deck-slides application
// ABOUTME: Canvas geometry, unit conversion and per-slide layout selection

use crate::errors::{DeckError, Result};
use crate::extract::SlideRecord;
use std::fmt;
use std::str::FromStr;

/// English Metric Units per inch, the DrawingML coordinate unit.
pub const EMU_PER_INCH: f64 = 914_400.0;

/// Widescreen 16:9 canvas.
pub const SLIDE_WIDTH_IN: f64 = 13.333;
pub const SLIDE_HEIGHT_IN: f64 = 7.5;

/// Convert inches to EMU, truncating like PowerPoint's own length helpers.
pub fn inches(value: f64) -> i64 {
    (value * EMU_PER_INCH) as i64
}

/// Convert points to the hundredths of a point DrawingML uses for font sizes and spacing.
pub fn centipoints(points: u32) -> u32 {
    points * 100
}

pub fn slide_width() -> i64 {
    inches(SLIDE_WIDTH_IN)
}

pub fn slide_height() -> i64 {
    inches(SLIDE_HEIGHT_IN)
}

/// Position and size of a shape, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Rect {
    /// Build a rect from inch measurements.
    pub fn from_inches(x: f64, y: f64, cx: f64, cy: f64) -> Self {
        Self {
            x: inches(x),
            y: inches(y),
            cx: inches(cx),
            cy: inches(cy),
        }
    }
}

/// The four mutually exclusive slide treatments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlideLayout {
    Title,
    Closing,
    Code,
    Content,
}

impl fmt::Display for SlideLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlideLayout::Title => "title",
            SlideLayout::Closing => "closing",
            SlideLayout::Code => "code",
            SlideLayout::Content => "content",
        };
        f.write_str(name)
    }
}

/// Picks out the slide that receives a special layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideSelector {
    /// The record whose slide number equals this value
    Number(u32),
    /// The first record in document order
    First,
    /// The last record in document order
    Last,
    /// Never matches
    Disabled,
}

impl SlideSelector {
    /// Whether the record at `position` (0-based, document order) out of `total` is selected.
    pub fn matches(&self, record: &SlideRecord, position: usize, total: usize) -> bool {
        match *self {
            SlideSelector::Number(n) => record.number == n,
            SlideSelector::First => position == 0,
            SlideSelector::Last => total > 0 && position + 1 == total,
            SlideSelector::Disabled => false,
        }
    }
}

impl FromStr for SlideSelector {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(SlideSelector::First),
            "last" => Ok(SlideSelector::Last),
            "none" | "off" => Ok(SlideSelector::Disabled),
            other => other.parse::<u32>().map(SlideSelector::Number).map_err(|_| {
                DeckError::ConfigError(format!(
                    "Invalid slide selector '{}': expected 'first', 'last', 'none' or a slide number",
                    s
                ))
            }),
        }
    }
}

impl fmt::Display for SlideSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlideSelector::Number(n) => write!(f, "{}", n),
            SlideSelector::First => f.write_str("first"),
            SlideSelector::Last => f.write_str("last"),
            SlideSelector::Disabled => f.write_str("none"),
        }
    }
}

/// Selectors for the two special layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutRules {
    pub title_slide: SlideSelector,
    pub closing_slide: SlideSelector,
}

impl Default for LayoutRules {
    fn default() -> Self {
        Self {
            title_slide: SlideSelector::Number(1),
            closing_slide: SlideSelector::Number(14),
        }
    }
}

impl LayoutRules {
    /// Choose the layout for a record. Title wins over closing, closing over code.
    pub fn select(&self, record: &SlideRecord, position: usize, total: usize) -> SlideLayout {
        if self.title_slide.matches(record, position, total) {
            SlideLayout::Title
        } else if self.closing_slide.matches(record, position, total) {
            SlideLayout::Closing
        } else if record.has_code() {
            SlideLayout::Code
        } else {
            SlideLayout::Content
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(number: u32) -> SlideRecord {
        SlideRecord::new(number, "")
    }

    #[test]
    fn test_canvas_is_widescreen() {
        assert_eq!(slide_width(), 12_191_695);
        assert_eq!(slide_height(), 6_858_000);
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!("first".parse::<SlideSelector>().unwrap(), SlideSelector::First);
        assert_eq!(" LAST ".parse::<SlideSelector>().unwrap(), SlideSelector::Last);
        assert_eq!("14".parse::<SlideSelector>().unwrap(), SlideSelector::Number(14));
        assert_eq!("none".parse::<SlideSelector>().unwrap(), SlideSelector::Disabled);
        assert!("fourteen".parse::<SlideSelector>().is_err());
    }

    #[test]
    fn test_position_selectors() {
        let r = record(7);
        assert!(SlideSelector::First.matches(&r, 0, 3));
        assert!(!SlideSelector::First.matches(&r, 1, 3));
        assert!(SlideSelector::Last.matches(&r, 2, 3));
        assert!(!SlideSelector::Last.matches(&r, 1, 3));
        assert!(!SlideSelector::Disabled.matches(&r, 0, 1));
    }

    #[test]
    fn test_closing_by_position() {
        let rules = LayoutRules {
            title_slide: SlideSelector::First,
            closing_slide: SlideSelector::Last,
        };
        assert_eq!(rules.select(&record(14), 1, 3), SlideLayout::Content);
        assert_eq!(rules.select(&record(9), 2, 3), SlideLayout::Closing);
        assert_eq!(rules.select(&record(9), 0, 3), SlideLayout::Title);
    }
}
