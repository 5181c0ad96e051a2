//! Document-space hit testing and shape helpers.

use floorplan_core::{Marker, MarkerKind, Point};

/// Hit-test slack, already converted to document units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTolerance {
    /// Slack around strokes and box edges
    pub stroke: f64,
    /// Radius of pin-like markers
    pub pin: f64,
    /// Radius around a resize handle
    pub handle: f64,
}

impl HitTolerance {
    /// Converts pixel tolerances to document units at `scale`.
    pub fn from_pixels(stroke_px: f64, pin_px: f64, handle_px: f64, scale: f64) -> Self {
        Self {
            stroke: stroke_px / scale,
            pin: pin_px / scale,
            handle: handle_px / scale,
        }
    }
}

/// Shortest distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return p.distance_to(&a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(&Point::new(a.x + t * dx, a.y + t * dy))
}

/// Even-odd point-in-polygon test.
pub fn point_in_polygon(p: Point, vertices: &[Point]) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (vi, vj) = (vertices[i], vertices[j]);
        if (vi.y > p.y) != (vj.y > p.y)
            && p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn distance_to_path(p: Point, points: &[Point], closed: bool) -> f64 {
    let mut best = match points.first() {
        Some(first) => p.distance_to(first),
        None => return f64::INFINITY,
    };
    for pair in points.windows(2) {
        best = best.min(distance_to_segment(p, pair[0], pair[1]));
    }
    if closed && points.len() > 2 {
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            best = best.min(distance_to_segment(p, *last, *first));
        }
    }
    best
}

/// Normalised `(x, y, width, height)` of a box-like marker.
fn box_rect(marker: &Marker) -> Option<(f64, f64, f64, f64)> {
    let (w, h) = (marker.width?, marker.height?);
    Some((
        marker.x.min(marker.x + w),
        marker.y.min(marker.y + h),
        w.abs(),
        h.abs(),
    ))
}

/// True when `p` falls on `marker`.
pub fn hit_test(marker: &Marker, p: Point, tol: &HitTolerance) -> bool {
    match marker.kind {
        MarkerKind::Rectangle => match box_rect(marker) {
            Some((x, y, w, h)) => {
                p.x >= x - tol.stroke
                    && p.x <= x + w + tol.stroke
                    && p.y >= y - tol.stroke
                    && p.y <= y + h + tol.stroke
            }
            None => p.distance_to(&marker.anchor()) <= tol.pin,
        },
        MarkerKind::Ellipse => match box_rect(marker) {
            Some((x, y, w, h)) => {
                let rx = w / 2.0 + tol.stroke;
                let ry = h / 2.0 + tol.stroke;
                let nx = (p.x - (x + w / 2.0)) / rx;
                let ny = (p.y - (y + h / 2.0)) / ry;
                nx * nx + ny * ny <= 1.0
            }
            None => p.distance_to(&marker.anchor()) <= tol.pin,
        },
        MarkerKind::Line => match marker.end() {
            Some(end) => distance_to_segment(p, marker.anchor(), end) <= tol.stroke,
            None => p.distance_to(&marker.anchor()) <= tol.stroke,
        },
        MarkerKind::Polyline => distance_to_path(p, &marker.points, false) <= tol.stroke,
        MarkerKind::Polygon => {
            point_in_polygon(p, &marker.points)
                || distance_to_path(p, &marker.points, true) <= tol.stroke
        }
        MarkerKind::AccessPoint
        | MarkerKind::Camera
        | MarkerKind::Elevator
        | MarkerKind::Intercom
        | MarkerKind::Note
        | MarkerKind::Text => p.distance_to(&marker.anchor()) <= tol.pin,
    }
}

/// Position of the resize handle: the far corner of a box, the end of a line.
pub fn resize_handle(marker: &Marker) -> Option<Point> {
    match marker.kind {
        MarkerKind::Rectangle | MarkerKind::Ellipse => {
            let (w, h) = (marker.width?, marker.height?);
            Some(Point::new(marker.x + w, marker.y + h))
        }
        MarkerKind::Line => marker.end(),
        _ => None,
    }
}

/// Moves the resize handle to `to`, recomputing the derived size fields.
pub fn apply_resize(marker: &mut Marker, to: Point) {
    match marker.kind {
        MarkerKind::Rectangle | MarkerKind::Ellipse => {
            marker.width = Some(to.x - marker.x);
            marker.height = Some(to.y - marker.y);
            marker.set_end(to);
        }
        MarkerKind::Line => set_line_end(marker, to),
        _ => {}
    }
}

/// Sets a line's end point and its `|end - anchor|` extents.
pub fn set_line_end(marker: &mut Marker, end: Point) {
    marker.set_end(end);
    marker.width = Some((end.x - marker.x).abs());
    marker.height = Some((end.y - marker.y).abs());
}

/// Rewrites a box so its anchor is the top-left corner with positive size.
pub fn normalize_box(marker: &mut Marker) {
    if let Some((x, y, w, h)) = box_rect(marker) {
        marker.x = x;
        marker.y = y;
        marker.width = Some(w);
        marker.height = Some(h);
        marker.set_end(Point::new(x + w, y + h));
    }
}

/// Larger extent of a drag-sized shape, in document units.
pub fn drag_extent(marker: &Marker) -> f64 {
    marker
        .width
        .unwrap_or(0.0)
        .abs()
        .max(marker.height.unwrap_or(0.0).abs())
}

/// Total length of an open path.
pub fn path_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}
