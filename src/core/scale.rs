//! Domain-to-pixel scales: linear, log and band.
//!
//! Continuous scales map and invert analytically. Band scales keep their
//! keys in first-seen order and lay bands out with inner and outer padding.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::ticks::{linear_ticks, log_ticks};

/// Smallest domain value a log scale accepts.
pub const LOG_DOMAIN_EPSILON: f64 = 1e-9;
pub const DEFAULT_LINEAR_DOMAIN: (f64, f64) = (0.0, 1.0);
pub const DEFAULT_LOG_DOMAIN: (f64, f64) = (1.0, 2.0);
pub const BAND_PADDING: f64 = 0.1;
pub const BAND_ALIGN: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleKind {
    #[default]
    Linear,
    Log,
    Band,
}

impl ScaleKind {
    #[must_use]
    pub fn is_banded(self) -> bool {
        matches!(self, Self::Band)
    }
}

/// Domain handed to `Axis::set_domain`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Continuous { start: f64, end: f64 },
    Categories(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuousKind {
    Linear,
    Log,
}

/// Continuous domain -> range mapping (linear or logarithmic).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContinuousScale {
    kind: ContinuousKind,
    domain: (f64, f64),
    range: (f64, f64),
    #[serde(default)]
    clamp: bool,
}

impl ContinuousScale {
    #[must_use]
    pub fn linear(domain: (f64, f64), range: (f64, f64)) -> Self {
        let mut scale = Self {
            kind: ContinuousKind::Linear,
            domain: DEFAULT_LINEAR_DOMAIN,
            range,
            clamp: false,
        };
        scale.set_domain(domain.0, domain.1);
        scale
    }

    #[must_use]
    pub fn log(domain: (f64, f64), range: (f64, f64)) -> Self {
        let mut scale = Self {
            kind: ContinuousKind::Log,
            domain: DEFAULT_LOG_DOMAIN,
            range,
            clamp: false,
        };
        scale.set_domain(domain.0, domain.1);
        scale
    }

    #[must_use]
    pub fn kind(&self) -> ContinuousKind {
        self.kind
    }

    #[must_use]
    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    #[must_use]
    pub fn is_clamped(&self) -> bool {
        self.clamp
    }

    /// Pixel length covered by the range.
    #[must_use]
    pub fn range_extent(&self) -> f64 {
        (self.range.1 - self.range.0).abs()
    }

    /// Sets the domain, substituting a safe default for degenerate input.
    ///
    /// Returns `false` when the requested domain was replaced.
    pub fn set_domain(&mut self, start: f64, end: f64) -> bool {
        let (domain, accepted) = sanitize_domain(self.kind, start, end);
        self.domain = domain;
        accepted
    }

    pub fn set_range(&mut self, start: f64, end: f64) {
        self.range = (start, end);
    }

    pub fn set_clamp(&mut self, clamp: bool) {
        self.clamp = clamp;
    }

    #[must_use]
    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.transformed_domain();
        let span = d1 - d0;
        if span == 0.0 {
            return self.range.0;
        }
        let mut t = (self.transform(value) - d0) / span;
        if self.clamp {
            t = t.clamp(0.0, 1.0);
        }
        self.range.0 + t * (self.range.1 - self.range.0)
    }

    #[must_use]
    pub fn invert(&self, pixel: f64) -> f64 {
        let span = self.range.1 - self.range.0;
        if span == 0.0 {
            return self.domain.0;
        }
        let mut t = (pixel - self.range.0) / span;
        if self.clamp {
            t = t.clamp(0.0, 1.0);
        }
        let (d0, d1) = self.transformed_domain();
        self.untransform(d0 + t * (d1 - d0))
    }

    #[must_use]
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        match self.kind {
            ContinuousKind::Linear => linear_ticks(self.domain.0, self.domain.1, count),
            ContinuousKind::Log => log_ticks(self.domain.0, self.domain.1, count),
        }
    }

    fn transformed_domain(&self) -> (f64, f64) {
        (self.transform(self.domain.0), self.transform(self.domain.1))
    }

    fn transform(&self, value: f64) -> f64 {
        match self.kind {
            ContinuousKind::Linear => value,
            ContinuousKind::Log => value.max(LOG_DOMAIN_EPSILON).ln(),
        }
    }

    fn untransform(&self, value: f64) -> f64 {
        match self.kind {
            ContinuousKind::Linear => value,
            ContinuousKind::Log => value.exp(),
        }
    }
}

fn sanitize_domain(kind: ContinuousKind, start: f64, end: f64) -> ((f64, f64), bool) {
    let fallback = match kind {
        ContinuousKind::Linear => DEFAULT_LINEAR_DOMAIN,
        ContinuousKind::Log => DEFAULT_LOG_DOMAIN,
    };

    if !start.is_finite() || !end.is_finite() || start > end {
        warn!(start, end, ?kind, "degenerate scale domain, using default");
        return (fallback, false);
    }

    match kind {
        ContinuousKind::Linear => {
            if start == end {
                warn!(value = start, "zero-width linear domain, widening by 1");
                return ((start - 0.5, end + 0.5), false);
            }
            ((start, end), true)
        }
        ContinuousKind::Log => {
            if end <= LOG_DOMAIN_EPSILON {
                warn!(start, end, "log domain has no positive values, using default");
                return (fallback, false);
            }
            let floored = start.max(LOG_DOMAIN_EPSILON);
            if floored == end {
                warn!(value = end, "zero-width log domain, widening by one octave");
                return ((floored / 2.0, end * 2.0), false);
            }
            ((floored, end), floored == start)
        }
    }
}

/// Ordinal scale dividing a pixel range into equal bands, one per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandScale {
    domain: IndexSet<String>,
    range: (f64, f64),
    padding_inner: f64,
    padding_outer: f64,
    align: f64,
}

impl Default for BandScale {
    fn default() -> Self {
        Self {
            domain: IndexSet::new(),
            range: (0.0, 1.0),
            padding_inner: BAND_PADDING,
            padding_outer: BAND_PADDING,
            align: BAND_ALIGN,
        }
    }
}

impl BandScale {
    #[must_use]
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut scale = Self::default();
        scale.set_domain(keys);
        scale
    }

    /// Replaces the domain, keeping the first occurrence of each key.
    pub fn set_domain<I, S>(&mut self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domain = keys.into_iter().map(Into::into).collect();
    }

    /// Merges new keys after the existing ones. Returns how many were added.
    pub fn append_domain<I, S>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.domain.len();
        self.domain.extend(keys.into_iter().map(Into::into));
        self.domain.len() - before
    }

    pub fn set_range(&mut self, start: f64, end: f64) {
        self.range = (start, end);
    }

    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.domain.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domain.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.domain.iter().map(String::as_str)
    }

    #[must_use]
    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.domain.get_index(index).map(String::as_str)
    }

    #[must_use]
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.domain.get_index_of(key)
    }

    /// Distance between the starts of two adjacent bands.
    #[must_use]
    pub fn step(&self) -> f64 {
        let n = self.domain.len() as f64;
        let span = (self.range.1 - self.range.0).abs();
        span / (n - self.padding_inner + 2.0 * self.padding_outer).max(1.0)
    }

    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        self.step() * (1.0 - self.padding_inner)
    }

    /// Pixel offset of the first band start.
    #[must_use]
    pub fn offset(&self) -> f64 {
        let n = self.domain.len() as f64;
        let start = self.range.0.min(self.range.1);
        let span = (self.range.1 - self.range.0).abs();
        start + (span - self.step() * (n - self.padding_inner)) * self.align
    }

    /// Band start for the key at `index`, honoring a reversed range.
    #[must_use]
    pub fn map_index(&self, index: usize) -> Option<f64> {
        let n = self.domain.len();
        if index >= n {
            return None;
        }
        let slot = if self.range.1 < self.range.0 {
            n - 1 - index
        } else {
            index
        };
        Some(self.offset() + self.step() * slot as f64)
    }

    #[must_use]
    pub fn map(&self, key: &str) -> Option<f64> {
        self.index_of(key).and_then(|index| self.map_index(index))
    }
}

/// Scale bound to one axis level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    Continuous(ContinuousScale),
    Band(BandScale),
}

impl Scale {
    #[must_use]
    pub fn new(kind: ScaleKind) -> Self {
        match kind {
            ScaleKind::Linear => Self::Continuous(ContinuousScale::linear(
                DEFAULT_LINEAR_DOMAIN,
                (0.0, 1.0),
            )),
            ScaleKind::Log => {
                Self::Continuous(ContinuousScale::log(DEFAULT_LOG_DOMAIN, (0.0, 1.0)))
            }
            ScaleKind::Band => Self::Band(BandScale::default()),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ScaleKind {
        match self {
            Self::Continuous(scale) => match scale.kind() {
                ContinuousKind::Linear => ScaleKind::Linear,
                ContinuousKind::Log => ScaleKind::Log,
            },
            Self::Band(_) => ScaleKind::Band,
        }
    }

    #[must_use]
    pub fn is_banded(&self) -> bool {
        matches!(self, Self::Band(_))
    }

    #[must_use]
    pub fn as_continuous(&self) -> Option<&ContinuousScale> {
        match self {
            Self::Continuous(scale) => Some(scale),
            Self::Band(_) => None,
        }
    }

    #[must_use]
    pub fn as_band(&self) -> Option<&BandScale> {
        match self {
            Self::Band(scale) => Some(scale),
            Self::Continuous(_) => None,
        }
    }

    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        match self {
            Self::Continuous(scale) => scale.range(),
            Self::Band(scale) => scale.range(),
        }
    }

    /// Maps a numeric value; band scales treat it as a key index.
    #[must_use]
    pub fn map_numeric(&self, value: f64) -> Option<f64> {
        match self {
            Self::Continuous(scale) => Some(scale.map(value)),
            Self::Band(scale) => {
                if value < 0.0 || !value.is_finite() {
                    return None;
                }
                scale
                    .map_index(value as usize)
                    .map(|start| start + scale.bandwidth() / 2.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BandScale, ContinuousScale, DEFAULT_LINEAR_DOMAIN, DEFAULT_LOG_DOMAIN};

    #[test]
    fn inverted_linear_domain_falls_back_to_default() {
        let scale = ContinuousScale::linear((5.0, 1.0), (0.0, 100.0));
        assert_eq!(scale.domain(), DEFAULT_LINEAR_DOMAIN);
    }

    #[test]
    fn log_domain_is_floored_to_epsilon() {
        let scale = ContinuousScale::log((0.0, 100.0), (0.0, 100.0));
        assert_eq!(scale.domain(), (1e-9, 100.0));
        assert!(scale.map(0.0).is_finite());
    }

    #[test]
    fn log_domain_without_positive_values_uses_default() {
        let scale = ContinuousScale::log((-5.0, 0.0), (0.0, 100.0));
        assert_eq!(scale.domain(), DEFAULT_LOG_DOMAIN);
    }

    #[test]
    fn band_append_keeps_first_seen_order() {
        let mut scale = BandScale::new(["b", "a"]);
        let added = scale.append_domain(["a", "c", "b", "d"]);
        assert_eq!(added, 2);
        assert_eq!(scale.keys().collect::<Vec<_>>(), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn band_layout_follows_padding_and_alignment() {
        let mut scale = BandScale::new(["a", "b"]);
        scale.set_range(0.0, 210.0);
        // 210 / (2 - 0.1 + 0.2)
        assert!((scale.step() - 100.0).abs() < 1e-9);
        assert!((scale.bandwidth() - 90.0).abs() < 1e-9);
        assert!((scale.map("a").expect("a") - 10.0).abs() < 1e-9);
        assert!((scale.map("b").expect("b") - 110.0).abs() < 1e-9);
    }
}
