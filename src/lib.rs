//! linked-charts: linked interactive charts with pixel-bounded decimation.
//!
//! Charts are built from a declarative [`ChartDescription`], decimate their
//! series down to the visible pixel width (optionally on worker threads)
//! and exchange zoom, brush, cursor and hover events with the other charts
//! of their groups. Drawing goes through the [`render::Renderer`] trait.

pub mod api;
pub mod core;
pub mod decimation;
pub mod error;
pub mod interaction;
pub mod render;
pub mod telemetry;
pub mod worker;

pub use api::{Chart, ChartDescription, LayoutOptions, LayoutUpdate};
pub use error::{ChartError, ChartResult};
