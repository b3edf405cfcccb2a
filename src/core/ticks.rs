//! Tick generation, label formatting and overlap suppression.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

pub const AXIS_TARGET_SPACING_PX: f64 = 80.0;
pub const AXIS_MIN_TICKS: usize = 2;
pub const AXIS_MAX_TICKS: usize = 12;

/// Formatting applied to continuous tick labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickFormat {
    /// Decimal digits derived from the tick step.
    #[default]
    Numeric,
    /// Values are seconds since the Unix epoch.
    Time,
}

pub fn tick_target_count(
    axis_span_px: f64,
    target_spacing_px: f64,
    min_ticks: usize,
    max_ticks: usize,
) -> usize {
    if !axis_span_px.is_finite() || axis_span_px <= 0.0 {
        return min_ticks;
    }
    if !target_spacing_px.is_finite() || target_spacing_px <= 0.0 {
        return min_ticks;
    }

    let raw = (axis_span_px / target_spacing_px).floor() as usize + 1;
    raw.clamp(min_ticks, max_ticks)
}

/// Nice 1-2-5 ticks covering `[start, end]` with roughly `count` entries.
pub fn linear_ticks(start: f64, end: f64, count: usize) -> Vec<f64> {
    if count == 0 || !start.is_finite() || !end.is_finite() {
        return Vec::new();
    }
    if start == end {
        return vec![start];
    }

    let (min, max) = (start.min(end), start.max(end));
    let step = tick_step(min, max, count);
    if !step.is_finite() || step <= 0.0 {
        return Vec::new();
    }

    let first = (min / step).ceil() as i64;
    let last = (max / step).floor() as i64;
    let mut ticks: Vec<f64> = (first..=last).map(|index| index as f64 * step).collect();
    if start > end {
        ticks.reverse();
    }
    ticks
}

/// Step of the nice tick ladder for `[min, max]`.
pub fn tick_step(min: f64, max: f64, count: usize) -> f64 {
    let raw = (max - min) / count.max(1) as f64;
    if !raw.is_finite() || raw <= 0.0 {
        return 0.0;
    }
    let power = 10_f64.powf(raw.log10().floor());
    let error = raw / power;
    let factor = if error >= 50_f64.sqrt() {
        10.0
    } else if error >= 10_f64.sqrt() {
        5.0
    } else if error >= 2_f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * power
}

/// 1-2-5 decade ladder for log axes, sampled down to `tick_count`.
pub fn log_ticks(start: f64, end: f64, tick_count: usize) -> Vec<f64> {
    if start <= 0.0 || end <= 0.0 || tick_count == 0 {
        return Vec::new();
    }

    let ascending = start <= end;
    let min = start.min(end);
    let max = start.max(end);
    let min_exp = min.log10().floor() as i32;
    let max_exp = max.log10().ceil() as i32;

    let mut ticks = Vec::new();
    for exp in min_exp..=max_exp {
        let decade = 10_f64.powi(exp);
        for multiplier in [1.0, 2.0, 5.0] {
            let candidate = decade * multiplier;
            if candidate >= min && candidate <= max {
                ticks.push(candidate);
            }
        }
    }

    ticks.sort_by(|lhs, rhs| lhs.total_cmp(rhs));
    ticks.dedup_by(|lhs, rhs| approx_equal(*lhs, *rhs));

    let mut sampled = evenly_sample_ticks(ticks, tick_count);
    if !ascending {
        sampled.reverse();
    }
    sampled
}

fn evenly_sample_ticks(ticks: Vec<f64>, target: usize) -> Vec<f64> {
    if ticks.len() <= target || target == 0 {
        return ticks;
    }
    if target == 1 {
        return vec![ticks[0]];
    }

    let last_index = ticks.len() - 1;
    let mut sampled: Vec<f64> = Vec::with_capacity(target);
    for step in 0..target {
        let ratio = (step as f64) / ((target - 1) as f64);
        let index = (ratio * (last_index as f64)).round() as usize;
        let value = ticks[index.min(last_index)];
        if sampled
            .last()
            .is_some_and(|prev| approx_equal(*prev, value))
        {
            continue;
        }
        sampled.push(value);
    }
    sampled
}

fn approx_equal(lhs: f64, rhs: f64) -> bool {
    let scale = lhs.abs().max(rhs.abs()).max(1.0);
    (lhs - rhs).abs() <= scale * 1e-12
}

/// Formats a continuous tick label; `step` is the spacing between ticks.
#[must_use]
pub fn format_tick(value: f64, format: TickFormat, step: f64) -> String {
    match format {
        TickFormat::Numeric => {
            let digits = if step.is_finite() && step > 0.0 && step < 1.0 {
                (-step.log10().floor()) as usize
            } else {
                0
            };
            format!("{value:.digits$}")
        }
        TickFormat::Time => {
            let seconds = value.floor() as i64;
            let nanos = ((value - value.floor()) * 1e9) as u32;
            let Some(time) = DateTime::from_timestamp(seconds, nanos) else {
                return format!("{value}");
            };
            let pattern = if step >= 86_400.0 {
                "%Y-%m-%d"
            } else if step >= 1.0 {
                "%H:%M:%S"
            } else {
                "%H:%M:%S%.3f"
            };
            time.format(pattern).to_string()
        }
    }
}

/// Extent of one rendered label along the axis direction, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelSpan {
    pub start: f64,
    pub end: f64,
}

impl LabelSpan {
    #[must_use]
    pub fn centered(center: f64, extent: f64) -> Self {
        let half = extent.max(0.0) / 2.0;
        Self {
            start: center - half,
            end: center + half,
        }
    }

    #[must_use]
    pub fn overlaps(self, other: Self, gap: f64) -> bool {
        self.start < other.end + gap && other.start < self.end + gap
    }
}

/// Greedy overlap walk: keeps a label only when it clears the last kept one.
///
/// `spans` must already be in walk order. Returns the indices that were
/// dropped; an empty result means every label fits.
pub fn suppressed_label_indices(spans: &[LabelSpan], gap: f64) -> Vec<usize> {
    let mut suppressed = Vec::new();
    let mut last_kept: Option<LabelSpan> = None;
    for (index, span) in spans.iter().copied().enumerate() {
        match last_kept {
            Some(kept) if kept.overlaps(span, gap) => suppressed.push(index),
            _ => last_kept = Some(span),
        }
    }
    suppressed
}
