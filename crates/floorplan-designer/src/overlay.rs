//! Marker overlay rendering and page flattening using tiny-skia.
//!
//! Markers are drawn in viewport space: document coordinates times the
//! render scale. Markers on hidden layers are skipped entirely.

use std::io::Cursor;

use floorplan_core::constants::PIN_RADIUS_PX;
use floorplan_core::{Marker, MarkerKind, Point, RenderError};
use floorplan_settings::StyleSettings;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tiny_skia::{Color, FillRule, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::document::{Document, RenderToken};
use crate::layers::{LayerSet, ResolvedStyle};

/// Parses `#rrggbb` or `#rgb`.
pub fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some((channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        3 => {
            let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
            Some((expand(0)?, expand(1)?, expand(2)?))
        }
        _ => None,
    }
}

fn color(value: &str, alpha: f32) -> Color {
    let (r, g, b) = parse_hex_color(value).unwrap_or((0, 0, 0));
    let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::from_rgba8(r, g, b, a)
}

fn paint(c: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(c);
    paint.anti_alias = true;
    paint
}

/// Draws marker overlays onto a transparent surface.
pub struct OverlayRenderer<'a> {
    layers: &'a LayerSet,
    defaults: &'a StyleSettings,
    scale: f32,
}

impl<'a> OverlayRenderer<'a> {
    pub fn new(layers: &'a LayerSet, defaults: &'a StyleSettings, scale: f64) -> Self {
        Self {
            layers,
            defaults,
            scale: scale as f32,
        }
    }

    /// Renders the visible markers of `page` onto a `width` x `height` image.
    pub fn render<'m>(
        &self,
        width: u32,
        height: u32,
        page: u32,
        markers: impl IntoIterator<Item = &'m Marker>,
    ) -> Result<RgbaImage, RenderError> {
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| RenderError::Other {
            message: format!("cannot allocate {}x{} overlay", width, height),
        })?;

        let mut drawn = 0;
        for marker in markers {
            if marker.page != page || !self.layers.is_marker_visible(marker) {
                continue;
            }
            self.draw_marker(&mut pixmap, marker);
            drawn += 1;
        }
        tracing::debug!("overlay for page {}: {} marker(s)", page, drawn);

        Ok(RgbaImage::from_fn(width, height, |x, y| {
            let px = pixmap.pixels()[(y * width + x) as usize].demultiply();
            Rgba([px.red(), px.green(), px.blue(), px.alpha()])
        }))
    }

    fn point(&self, p: Point) -> (f32, f32) {
        (p.x as f32 * self.scale, p.y as f32 * self.scale)
    }

    fn draw_marker(&self, pixmap: &mut Pixmap, marker: &Marker) {
        let style = self.layers.resolve_style(marker, self.defaults);
        let stroke = Stroke {
            width: (style.stroke_width * self.scale).max(1.0),
            ..Default::default()
        };

        match marker.kind {
            MarkerKind::Rectangle => {
                let (x, y) = self.point(marker.anchor());
                let w = marker.width.unwrap_or(0.0) as f32 * self.scale;
                let h = marker.height.unwrap_or(0.0) as f32 * self.scale;
                let rect = Rect::from_ltrb(x.min(x + w), y.min(y + h), x.max(x + w), y.max(y + h));
                if let Some(rect) = rect {
                    let path = PathBuilder::from_rect(rect);
                    self.fill_and_stroke(pixmap, &path, &style, &stroke, Transform::identity());
                }
            }
            MarkerKind::Ellipse => {
                let (x, y) = self.point(marker.anchor());
                let w = marker.width.unwrap_or(0.0) as f32 * self.scale;
                let h = marker.height.unwrap_or(0.0) as f32 * self.scale;
                if w.abs() < 1.0 || h.abs() < 1.0 {
                    return;
                }
                let (rx, ry) = (w.abs() / 2.0, h.abs() / 2.0);
                if let Some(path) = ellipse_path(x + w / 2.0, y + h / 2.0, rx, ry) {
                    self.fill_and_stroke(pixmap, &path, &style, &stroke, Transform::identity());
                }
            }
            MarkerKind::Line => {
                let Some(end) = marker.end() else {
                    return;
                };
                if let Some(path) = self.path(&[marker.anchor(), end], false) {
                    pixmap.stroke_path(
                        &path,
                        &paint(color(&style.stroke_color, 1.0)),
                        &stroke,
                        Transform::identity(),
                        None,
                    );
                }
            }
            MarkerKind::Polyline => {
                if let Some(path) = self.path(&marker.points, false) {
                    pixmap.stroke_path(
                        &path,
                        &paint(color(&style.stroke_color, 1.0)),
                        &stroke,
                        Transform::identity(),
                        None,
                    );
                }
            }
            MarkerKind::Polygon => {
                if let Some(path) = self.path(&marker.points, true) {
                    self.fill_and_stroke(pixmap, &path, &style, &stroke, Transform::identity());
                }
            }
            MarkerKind::AccessPoint
            | MarkerKind::Camera
            | MarkerKind::Elevator
            | MarkerKind::Intercom => {
                let (x, y) = self.point(marker.anchor());
                if let Some(path) = PathBuilder::from_circle(x, y, PIN_RADIUS_PX as f32) {
                    pixmap.fill_path(
                        &path,
                        &paint(color(&style.stroke_color, 1.0)),
                        FillRule::Winding,
                        Transform::identity(),
                        None,
                    );
                    let ring = Stroke {
                        width: 2.0,
                        ..Default::default()
                    };
                    pixmap.stroke_path(
                        &path,
                        &paint(Color::WHITE),
                        &ring,
                        Transform::identity(),
                        None,
                    );
                }
            }
            MarkerKind::Note | MarkerKind::Text => {
                let (x, y) = self.point(marker.anchor());
                let half = PIN_RADIUS_PX as f32 * 0.75;
                if let Some(rect) = Rect::from_ltrb(x - half, y - half, x + half, y + half) {
                    let path = PathBuilder::from_rect(rect);
                    self.fill_and_stroke(pixmap, &path, &style, &stroke, Transform::identity());
                }
            }
        }
    }

    fn path(&self, points: &[Point], closed: bool) -> Option<Path> {
        let (first, rest) = points.split_first()?;
        if rest.is_empty() {
            return None;
        }
        let mut pb = PathBuilder::new();
        let (x, y) = self.point(*first);
        pb.move_to(x, y);
        for p in rest {
            let (x, y) = self.point(*p);
            pb.line_to(x, y);
        }
        if closed {
            pb.close();
        }
        pb.finish()
    }

    fn fill_and_stroke(
        &self,
        pixmap: &mut Pixmap,
        path: &Path,
        style: &ResolvedStyle,
        stroke: &Stroke,
        transform: Transform,
    ) {
        pixmap.fill_path(
            path,
            &paint(color(&style.fill_color, style.opacity)),
            FillRule::Winding,
            transform,
            None,
        );
        pixmap.stroke_path(
            path,
            &paint(color(&style.stroke_color, 1.0)),
            stroke,
            transform,
            None,
        );
    }
}

fn ellipse_path(cx: f32, cy: f32, rx: f32, ry: f32) -> Option<Path> {
    const SEGMENTS: usize = 64;
    let mut pb = PathBuilder::new();
    pb.move_to(cx + rx, cy);
    for i in 1..SEGMENTS {
        let t = i as f32 / SEGMENTS as f32 * std::f32::consts::TAU;
        pb.line_to(cx + rx * t.cos(), cy + ry * t.sin());
    }
    pb.close();
    pb.finish()
}

/// Renders `page` at `scale` and composites the visible markers on top.
pub fn flatten_page(
    document: &Document,
    page: u32,
    scale: f64,
    markers: &[Marker],
    layers: &LayerSet,
    defaults: &StyleSettings,
) -> Result<RgbaImage, RenderError> {
    let mut rendered = document.render_page(page, scale, &RenderToken::detached())?;
    let (width, height) = rendered.image.dimensions();
    let overlay = OverlayRenderer::new(layers, defaults, scale).render(width, height, page, markers)?;
    image::imageops::overlay(&mut rendered.image, &overlay, 0, 0);
    Ok(rendered.image)
}

/// Encodes an image as PNG.
pub fn encode_png(image: RgbaImage) -> Result<Vec<u8>, RenderError> {
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| RenderError::Other {
            message: format!("cannot encode PNG: {}", e),
        })?;
    Ok(buffer.into_inner())
}
