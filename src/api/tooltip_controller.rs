use ordered_float::OrderedFloat;

use crate::core::{Buffer, TraceTree};
use crate::decimation::{DecimatedValues, SeriesValues};
use crate::interaction::{SeriesTooltip, TooltipSection, merge_tooltips};
use crate::render::Renderer;

use super::{Chart, SeriesKind, engine_core::SeriesState};

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.3}")
    }
}

fn format_share(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

impl<R: Renderer> Chart<R> {
    /// Tooltip sections for every series at domain position `x` on the
    /// primary x axis, merged by tooltip group.
    #[must_use]
    pub fn tooltip_at(&self, x: f64) -> Vec<TooltipSection> {
        if !x.is_finite() {
            return Vec::new();
        }
        let Some(primary) = self.core.primary_x.as_deref() else {
            return Vec::new();
        };
        merge_tooltips(
            self.core
                .series
                .iter()
                .filter(|state| state.config.x_axis == primary)
                .filter_map(|state| series_tooltip_at(state, x)),
        )
    }

    /// Tooltip sections for the category `key` of a banded x axis.
    #[must_use]
    pub fn tooltip_for_category(&self, key: &str) -> Vec<TooltipSection> {
        let Some(axis) = self.core.primary_axis() else {
            return Vec::new();
        };
        let Some(index) = axis.scale().as_band().and_then(|band| band.index_of(key)) else {
            return Vec::new();
        };
        let category = index as f64;
        merge_tooltips(self.core.series.iter().filter_map(|state| {
            if state.config.x_axis != axis.id() {
                return None;
            }
            let Some(DecimatedValues::Points(points)) = &state.decimated else {
                return None;
            };
            let point = points.iter().find(|point| point.x == category)?;
            Some(
                SeriesTooltip::new(state.config.tooltip_group())
                    .with_entry(state.config.display_label(), format_value(point.y)),
            )
        }))
    }
}

fn series_tooltip_at(state: &SeriesState, x: f64) -> Option<SeriesTooltip> {
    let label = state.config.display_label();
    let tooltip = SeriesTooltip::new(state.config.tooltip_group());

    if state.config.kind == SeriesKind::Flame {
        return flame_tooltip(state, x).map(|(path, self_time)| {
            tooltip
                .with_entry(label, path)
                .with_entry(format!("{label} self time"), format_value(self_time))
        });
    }

    match state.decimated.as_ref()? {
        DecimatedValues::Points(points) => {
            let nearest = points
                .iter()
                .min_by_key(|point| OrderedFloat((point.x - x).abs()))?;
            Some(tooltip.with_entry(label, format_value(nearest.y)))
        }
        DecimatedValues::Envelope(points) => {
            let nearest = points
                .iter()
                .min_by_key(|point| OrderedFloat((point.x - x).abs()))?;
            Some(
                tooltip
                    .with_entry(label, format_value(nearest.y))
                    .with_entry(format!("{label} min"), format_value(nearest.min))
                    .with_entry(format!("{label} max"), format_value(nearest.max)),
            )
        }
        DecimatedValues::Rects(rects) => {
            let rect = rects
                .iter()
                .filter(|rect| rect.x <= x && x < rect.end())
                .max_by_key(|rect| rect.depth)?;
            Some(
                tooltip
                    .with_entry(label, rect.name.clone())
                    .with_entry(format!("{label} duration"), format_value(rect.dx)),
            )
        }
        DecimatedValues::Stacked { states, columns } => {
            let column = columns
                .iter()
                .find(|column| column.x <= x && x < column.x + column.dx)?;
            Some(
                states
                    .iter()
                    .zip(&column.values)
                    .filter(|(_, share)| **share > 0.0)
                    .fold(tooltip, |tooltip, (name, share)| {
                        tooltip.with_entry(name.clone(), format_share(*share))
                    }),
            )
        }
    }
}

/// Call path (`root > ... > leaf`) and self time of the deepest frame at `x`.
fn flame_tooltip(state: &SeriesState, x: f64) -> Option<(String, f64)> {
    let SeriesValues::Intervals(buffer) = &state.values else {
        return None;
    };
    let tree = TraceTree::from_sorted(&buffer.data()).ok()?;
    let mut deepest = None;
    let mut depth = 0;
    while let Some(index) = tree.find_at(x, depth) {
        deepest = Some(index);
        depth += 1;
    }
    let leaf = deepest?;
    let path = tree
        .ancestor_path(leaf)
        .into_iter()
        .filter_map(|index| tree.node(index))
        .map(|node| node.interval.name.as_str())
        .collect::<Vec<_>>()
        .join(" > ");
    Some((path, tree.self_time(leaf)?))
}
