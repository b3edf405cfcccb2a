use approx::assert_relative_eq;
use linked_charts::core::{
    Axis, AxisAlignment, AxisValue, Domain, MAX_DISCRETE_WIDTH, ScaleKind, Viewport,
};
use linked_charts::render::{NullRenderer, RenderLayer};
use proptest::prelude::*;

fn continuous_axis(
    alignment: AxisAlignment,
    kind: ScaleKind,
    start: f64,
    end: f64,
    pixels: f64,
) -> Axis {
    let mut axis = Axis::new("x", alignment, kind);
    axis.set_domain(Domain::Continuous { start, end }, 0)
        .expect("continuous domain");
    axis.commit_range(pixels);
    axis
}

fn band_axis(keys: usize, pixels: f64) -> Axis {
    let mut axis = Axis::new("cat", AxisAlignment::Bottom, ScaleKind::Band);
    axis.append_domain((0..keys).map(|index| format!("k{index}")), 0)
        .expect("band keys");
    axis.commit_range(pixels);
    axis
}

proptest! {
    #[test]
    fn committed_linear_axis_maps_domain_ends_to_range_ends(
        start in -1_000_000.0f64..1_000_000.0,
        span in 0.001f64..1_000_000.0,
        pixels in 1.0f64..4096.0,
        vertical in any::<bool>(),
    ) {
        let alignment = if vertical { AxisAlignment::Left } else { AxisAlignment::Bottom };
        let axis = continuous_axis(alignment, ScaleKind::Linear, start, start + span, pixels);

        let p0 = axis.map_value(start).expect("continuous");
        let p1 = axis.map_value(start + span).expect("continuous");
        let (expected0, expected1) = if vertical { (pixels, 0.0) } else { (0.0, pixels) };
        prop_assert!((p0 - expected0).abs() <= 1e-6 * pixels.max(1.0));
        prop_assert!((p1 - expected1).abs() <= 1e-6 * pixels.max(1.0));
    }

    #[test]
    fn band_axis_never_grows_past_requested_pixels(
        keys in 1usize..200,
        pixels in 1.0f64..4096.0,
    ) {
        let axis = band_axis(keys, pixels);
        let expected = (keys as f64 * MAX_DISCRETE_WIDTH).min(pixels);
        prop_assert!(axis.range_pixels() <= pixels + 1e-9);
        prop_assert!((axis.range_pixels() - expected).abs() <= 1e-9);
    }
}

#[test]
fn log_axis_floors_zero_minimum_instead_of_failing() {
    let axis = continuous_axis(AxisAlignment::Bottom, ScaleKind::Log, 0.0, 1000.0, 300.0);
    let (start, end) = axis.continuous_domain().expect("continuous");
    assert!(start > 0.0);
    assert_relative_eq!(end, 1000.0);
    assert!(axis.map_value(1000.0).expect("mapped").is_finite());
}

#[test]
fn degenerate_domain_falls_back_to_default_range() {
    let axis = continuous_axis(AxisAlignment::Bottom, ScaleKind::Linear, 10.0, -10.0, 100.0);
    assert_eq!(axis.continuous_domain(), Some((0.0, 1.0)));

    let log = continuous_axis(AxisAlignment::Bottom, ScaleKind::Log, 5.0, 1.0, 100.0);
    assert_eq!(log.continuous_domain(), Some((1.0, 2.0)));
}

#[test]
fn appending_categories_keeps_first_seen_order() {
    let mut axis = Axis::new("cat", AxisAlignment::Bottom, ScaleKind::Band);
    axis.append_domain(["b", "a"], 0).expect("append");
    let added = axis.append_domain(["a", "c", "b", "d"], 0).expect("append");
    assert_eq!(added, 2);

    let band = axis.scale().as_band().expect("band");
    assert_eq!(band.keys().collect::<Vec<_>>(), vec!["b", "a", "c", "d"]);
}

#[test]
fn banded_inversion_snaps_to_nearest_band_but_hover_needs_containment() {
    let axis = band_axis(4, 200.0);
    let band = axis.scale().as_band().expect("band");
    let first = band.map("k0").expect("k0");

    let nearest = axis.map_coordinate_to_value(-500.0).expect("clamped");
    assert_eq!(nearest.as_key(), Some("k0"));
    assert_eq!(axis.current_band(-500.0), None);
    assert_eq!(axis.current_band(10_000.0), None);

    let inside = axis
        .current_band(first + band.bandwidth() / 2.0)
        .and_then(|value| value.as_key().map(str::to_owned));
    assert_eq!(inside.as_deref(), Some("k0"));
}

#[test]
fn nested_band_axis_resolves_inner_category() {
    let mut axis = Axis::nested_bands("lanes", AxisAlignment::Bottom, 2).expect("nested axis");
    axis.set_domain(Domain::Categories(vec!["host-a".into(), "host-b".into()]), 0)
        .expect("outer");
    axis.set_domain(Domain::Categories(vec!["cpu".into(), "mem".into()]), 1)
        .expect("inner");
    axis.commit_range(200.0);

    assert_relative_eq!(axis.range_pixels(), 200.0);
    let center = axis.map_category(&["host-b", "mem"]).expect("mapped");
    let value = axis.current_band(center).expect("hovered");
    assert_eq!(
        value,
        AxisValue::Category(vec!["host-b".to_owned(), "mem".to_owned()])
    );
}

#[test]
fn axis_render_is_skipped_when_pixels_and_domain_are_unchanged() {
    let mut axis = continuous_axis(AxisAlignment::Bottom, ScaleKind::Linear, 0.0, 100.0, 400.0);
    let mut renderer = NullRenderer::default();
    let viewport = Viewport::new(500, 300);

    let first = axis.render(&mut renderer, viewport).expect("first render");
    let second = axis.render(&mut renderer, viewport).expect("second render");
    assert!(first.drawn);
    assert!(!second.drawn);
    assert_eq!(axis.draw_count(), 1);
    let frames_after_two_calls = renderer.frames_for(RenderLayer::Axis);

    axis.set_domain(Domain::Continuous { start: 0.0, end: 50.0 }, 0)
        .expect("domain");
    assert!(axis.render(&mut renderer, viewport).expect("third").drawn);
    assert_eq!(axis.draw_count(), 2);
    assert!(renderer.frames_for(RenderLayer::Axis) > frames_after_two_calls);
}

#[test]
fn crowded_band_labels_are_suppressed_in_a_second_pass() {
    let mut axis = Axis::new("cat", AxisAlignment::Bottom, ScaleKind::Band);
    axis.append_domain(
        (0..40).map(|index| format!("a-rather-long-category-name-{index}")),
        0,
    )
    .expect("keys");
    axis.commit_range(400.0);

    let mut renderer = NullRenderer::default();
    let outcome = axis
        .render(&mut renderer, Viewport::new(500, 300))
        .expect("render");
    assert_eq!(outcome.passes, 2);
    assert!(!outcome.suppressed.is_empty());
    assert!(outcome.suppressed.len() < 40);
    assert!(!outcome.suppressed.contains(&0));
}
