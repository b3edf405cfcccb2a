use std::collections::HashSet;

use crate::core::Domain;
use crate::error::{ChartError, ChartResult};

use super::{ChartDescription, LayoutOptions, SeriesKind};

fn config_error(message: String) -> ChartError {
    ChartError::InvalidConfiguration(message)
}

pub(super) fn validate_layout(layout: &LayoutOptions) -> ChartResult<()> {
    if !layout.viewport.is_valid() {
        return Err(ChartError::InvalidViewport {
            width: layout.viewport.width,
            height: layout.viewport.height,
        });
    }
    let margin = layout.margin;
    for (side, value) in [
        ("top", margin.top),
        ("right", margin.right),
        ("bottom", margin.bottom),
        ("left", margin.left),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(ChartError::InvalidData(format!(
                "margin `{side}` must be finite and >= 0"
            )));
        }
    }
    Ok(())
}

/// Checks everything `Chart::finalize` relies on.
pub(super) fn validate_description(description: &ChartDescription) -> ChartResult<()> {
    if description.axes.is_empty() && description.series.is_empty() {
        return Err(ChartError::EmptyChart);
    }

    let mut axis_ids = HashSet::new();
    for axis in &description.axes {
        if !axis_ids.insert(axis.id.as_str()) {
            return Err(config_error(format!("duplicate axis id `{}`", axis.id)));
        }
        if axis.levels == 0 {
            return Err(config_error(format!("axis `{}` needs at least one level", axis.id)));
        }
        if axis.levels > 1 && !axis.kind.is_banded() {
            return Err(config_error(format!(
                "axis `{}` is {:?}; only banded axes can nest levels",
                axis.id, axis.kind
            )));
        }
        match (&axis.domain, axis.kind.is_banded()) {
            (Some(Domain::Continuous { .. }), true) | (Some(Domain::Categories(_)), false) => {
                return Err(config_error(format!(
                    "axis `{}` domain does not fit a {:?} scale",
                    axis.id, axis.kind
                )));
            }
            _ => {}
        }
        if axis.dynamic && axis.kind.is_banded() {
            return Err(config_error(format!(
                "banded axis `{}` cannot be auto-ranged",
                axis.id
            )));
        }
    }

    let mut series_ids = HashSet::new();
    for series in &description.series {
        if !series_ids.insert(series.id.as_str()) {
            return Err(config_error(format!("duplicate series id `{}`", series.id)));
        }
        let x_axis = description.axis(&series.x_axis).ok_or_else(|| {
            config_error(format!(
                "series `{}` references unknown x axis `{}`",
                series.id, series.x_axis
            ))
        })?;
        let y_axis = description.axis(&series.y_axis).ok_or_else(|| {
            config_error(format!(
                "series `{}` references unknown y axis `{}`",
                series.id, series.y_axis
            ))
        })?;
        if x_axis.alignment.is_vertical() || !y_axis.alignment.is_vertical() {
            return Err(config_error(format!(
                "series `{}` needs a horizontal x axis and a vertical y axis",
                series.id
            )));
        }

        match series.effective_decimator() {
            Some(key) if x_axis.kind.is_banded() => {
                return Err(config_error(format!(
                    "series `{}` binds banded axis `{}` to the continuous-only {key:?} decimator",
                    series.id, x_axis.id
                )));
            }
            Some(key) if key.consumes_intervals() != series.kind.consumes_intervals() => {
                return Err(config_error(format!(
                    "series `{}` of kind {:?} cannot use the {key:?} decimator",
                    series.id, series.kind
                )));
            }
            None if series.kind == SeriesKind::Bar && !x_axis.kind.is_banded() => {
                return Err(config_error(format!(
                    "bar series `{}` needs a banded x axis",
                    series.id
                )));
            }
            _ => {}
        }

        if series.ring_capacity == Some(0) {
            return Err(config_error(format!(
                "series `{}` ring capacity must be > 0",
                series.id
            )));
        }
    }

    for legend in &description.legends {
        if !legend.font_size_px.is_finite() || legend.font_size_px <= 0.0 {
            return Err(config_error(format!(
                "legend `{}` font size must be finite and > 0",
                legend.id
            )));
        }
        if let Some(unknown) = legend
            .series
            .iter()
            .find(|id| !series_ids.contains(id.as_str()))
        {
            return Err(config_error(format!(
                "legend `{}` lists unknown series `{unknown}`",
                legend.id
            )));
        }
    }

    Ok(())
}
