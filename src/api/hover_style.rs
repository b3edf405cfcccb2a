use std::collections::HashMap;

use crate::render::{Color, ElementStyle};

const HIGHLIGHT_STYLE: ElementStyle = ElementStyle {
    fill: Color::rgb(0.96, 0.62, 0.04),
    stroke: Color::rgb(0.72, 0.40, 0.0),
};

/// Saved fill/stroke of every element currently drawn highlighted.
///
/// The record is created when hover starts on an element and released when
/// it ends, so restoring never depends on anything but this map.
#[derive(Debug, Clone)]
pub struct HoverHighlighter {
    highlight: ElementStyle,
    saved: HashMap<String, ElementStyle>,
}

impl Default for HoverHighlighter {
    fn default() -> Self {
        Self::new(HIGHLIGHT_STYLE)
    }
}

impl HoverHighlighter {
    #[must_use]
    pub fn new(highlight: ElementStyle) -> Self {
        Self {
            highlight,
            saved: HashMap::new(),
        }
    }

    /// Records `original` for `key` and returns the style to draw with.
    ///
    /// Applying twice keeps the first saved style.
    pub fn apply(&mut self, key: &str, original: ElementStyle) -> ElementStyle {
        self.saved.entry(key.to_owned()).or_insert(original);
        self.highlight
    }

    /// Releases the record for `key`, returning the style to restore.
    pub fn restore(&mut self, key: &str) -> Option<ElementStyle> {
        self.saved.remove(key)
    }

    /// Releases every record.
    pub fn release_all(&mut self) -> Vec<(String, ElementStyle)> {
        self.saved.drain().collect()
    }

    /// Style for `key`: highlighted while a record exists, `base` otherwise.
    #[must_use]
    pub fn style_for(&self, key: &str, base: ElementStyle) -> ElementStyle {
        if self.saved.contains_key(key) {
            self.highlight
        } else {
            base
        }
    }

    #[must_use]
    pub fn is_highlighted(&self, key: &str) -> bool {
        self.saved.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.saved.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::HoverHighlighter;
    use crate::render::{Color, ElementStyle};

    #[test]
    fn restore_returns_the_first_saved_style_and_releases_it() {
        let original = ElementStyle {
            fill: Color::rgb(0.1, 0.2, 0.3),
            stroke: Color::rgb(0.0, 0.0, 0.0),
        };
        let mut highlighter = HoverHighlighter::default();
        let highlighted = highlighter.apply("cpu0", original);
        let _ = highlighter.apply("cpu0", highlighted);

        assert!(highlighter.is_highlighted("cpu0"));
        assert_eq!(highlighter.restore("cpu0"), Some(original));
        assert!(highlighter.is_empty());
        assert_eq!(highlighter.restore("cpu0"), None);
    }
}
