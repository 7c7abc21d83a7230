use globeview_common::Extent;

/// Pointer position in normalized device coordinates, both axes in [-1, 1].
/// `y` grows downward, as in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
}

/// Map a window-space position to [-1, 1] on both axes.
///
/// Returns `None` for non-finite coordinates, positions outside the
/// viewport, and empty viewports.
pub fn normalize(x: f64, y: f64, viewport: Extent) -> Option<PointerSample> {
    if viewport.is_empty() || !x.is_finite() || !y.is_finite() {
        return None;
    }
    let w = viewport.width as f64;
    let h = viewport.height as f64;
    if !(0.0..=w).contains(&x) || !(0.0..=h).contains(&y) {
        return None;
    }
    Some(PointerSample {
        x: x / w * 2.0 - 1.0,
        y: y / h * 2.0 - 1.0,
    })
}
