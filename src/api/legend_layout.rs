use serde::{Deserialize, Serialize};

use crate::core::Viewport;
use crate::render::{
    Color, ElementStyle, RectPrimitive, RenderFrame, RenderLayer, TextExtent, TextHAlign,
    TextPrimitive,
};

const SWATCH_GAP_PX: f64 = 4.0;
const ENTRY_SPACING_PX: f64 = 12.0;
const ROW_PADDING_PX: f64 = 4.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub series: String,
    pub label: String,
    pub style: ElementStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedLegendEntry {
    pub entry: LegendEntry,
    /// Offset from the left of the legend box.
    pub x: f64,
    pub width: f64,
}

/// Legend entries wrapped into rows that fit the available width.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LegendLayout {
    pub rows: Vec<Vec<PlacedLegendEntry>>,
    pub row_height: f64,
    pub font_size_px: f64,
}

impl LegendLayout {
    /// Wraps `entries` greedily; an entry wider than the whole row still
    /// gets a row of its own.
    pub fn wrap<M>(
        entries: Vec<LegendEntry>,
        available_width: f64,
        font_size_px: f64,
        measure: M,
    ) -> Self
    where
        M: Fn(&str, f64) -> TextExtent,
    {
        let swatch = font_size_px;
        let mut rows: Vec<Vec<PlacedLegendEntry>> = Vec::new();
        let mut row: Vec<PlacedLegendEntry> = Vec::new();
        let mut cursor = 0.0;
        let mut text_height: f64 = 0.0;

        for entry in entries {
            let extent = measure(&entry.label, font_size_px);
            text_height = text_height.max(extent.height);
            let width = swatch + SWATCH_GAP_PX + extent.width;
            if !row.is_empty() && cursor + width > available_width {
                rows.push(std::mem::take(&mut row));
                cursor = 0.0;
            }
            row.push(PlacedLegendEntry {
                entry,
                x: cursor,
                width,
            });
            cursor += width + ENTRY_SPACING_PX;
        }
        if !row.is_empty() {
            rows.push(row);
        }

        Self {
            rows,
            row_height: text_height.max(swatch) + ROW_PADDING_PX,
            font_size_px,
        }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.rows.len() as f64 * self.row_height
    }

    /// Legend frame with its top-left corner at `(left, top)`.
    #[must_use]
    pub fn build_frame(&self, viewport: Viewport, left: f64, top: f64) -> RenderFrame {
        let mut frame = RenderFrame::new(viewport, RenderLayer::Legend);
        let swatch = self.font_size_px;
        for (row_index, row) in self.rows.iter().enumerate() {
            let y = top + row_index as f64 * self.row_height;
            for placed in row {
                let x = left + placed.x;
                frame.rects.push(
                    RectPrimitive::new(x, y, swatch, swatch, placed.entry.style)
                        .with_key(placed.entry.series.clone()),
                );
                if placed.entry.label.is_empty() {
                    continue;
                }
                frame.texts.push(TextPrimitive::new(
                    placed.entry.label.clone(),
                    x + swatch + SWATCH_GAP_PX,
                    y + swatch,
                    self.font_size_px,
                    Color::rgb(0.2, 0.2, 0.2),
                    TextHAlign::Left,
                ));
            }
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::{LegendEntry, LegendLayout};
    use crate::render::{ElementStyle, TextExtent};

    fn entry(label: &str) -> LegendEntry {
        LegendEntry {
            series: label.to_owned(),
            label: label.to_owned(),
            style: ElementStyle::default(),
        }
    }

    fn fixed_width(text: &str, size: f64) -> TextExtent {
        TextExtent {
            width: text.len() as f64 * 10.0,
            height: size,
        }
    }

    #[test]
    fn entries_wrap_when_the_row_is_full() {
        // Each entry is 10 (swatch) + 4 + 40 = 54 px wide plus 12 px spacing.
        let entries = vec![entry("aaaa"), entry("bbbb"), entry("cccc")];
        let wide = LegendLayout::wrap(entries.clone(), 200.0, 10.0, fixed_width);
        assert_eq!(wide.row_count(), 1);

        let narrow = LegendLayout::wrap(entries, 120.0, 10.0, fixed_width);
        assert_eq!(narrow.row_count(), 2);
        assert_eq!(narrow.rows[1][0].x, 0.0);
        assert!((narrow.height() - 2.0 * 14.0).abs() < 1e-9);
    }

    #[test]
    fn oversized_entry_gets_its_own_row() {
        let layout =
            LegendLayout::wrap(vec![entry("a-very-long-series-name")], 50.0, 10.0, fixed_width);
        assert_eq!(layout.row_count(), 1);
    }
}
