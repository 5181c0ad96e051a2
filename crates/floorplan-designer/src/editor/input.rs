//! Pointer, wheel and keyboard handling.
//!
//! All coordinates passed in are screen coordinates; they are converted to
//! document space through the viewport before touching any marker.

use floorplan_core::{MarkerId, MarkerKind, Point};

use super::{EditorResponse, FloorplanEditor, Interaction, Key, Modifiers, PointerButton, Tool};
use crate::equipment::EquipmentRequest;
use crate::geometry::{self, apply_resize, drag_extent, normalize_box, set_line_end};

impl FloorplanEditor {
    pub fn pointer_down(&mut self, screen_x: f64, screen_y: f64, button: PointerButton) -> EditorResponse {
        let p = self.viewport.screen_to_document(screen_x, screen_y);

        if button == PointerButton::Middle || self.tool == Tool::Pan {
            self.cancel_gesture();
            self.interaction = Interaction::Panning {
                last: (screen_x, screen_y),
            };
            return EditorResponse::None;
        }

        // A press while drawing adds a vertex instead of starting over.
        if let Interaction::MultiPointDrawing { marker, pressed } = &mut self.interaction {
            let spacing = self.viewport.pixels_to_document(self.interaction_settings.vertex_spacing_px);
            push_vertex(&mut marker.points, p, spacing);
            *pressed = true;
            return EditorResponse::Redraw;
        }
        if !self.interaction.is_idle() {
            self.cancel_gesture();
        }

        match self.tool {
            Tool::Select => self.press_select(p, button),
            Tool::Delete => match self.marker_at(p) {
                Some(key) => {
                    let _ = self.delete_marker(key);
                    EditorResponse::Redraw
                }
                None => EditorResponse::None,
            },
            Tool::Measure => {
                self.measurement = None;
                self.interaction = Interaction::Measuring { start: p, end: p };
                EditorResponse::Redraw
            }
            Tool::Calibrate => {
                self.pending_calibration = None;
                self.interaction = Interaction::Calibrating { start: p, end: p };
                EditorResponse::Redraw
            }
            Tool::Rectangle | Tool::Ellipse | Tool::Line => {
                let Some(kind) = self.tool.marker_kind() else {
                    return EditorResponse::None;
                };
                let mut marker = self.new_marker(kind, p);
                if kind == MarkerKind::Line {
                    set_line_end(&mut marker, p);
                } else {
                    apply_resize(&mut marker, p);
                }
                self.interaction = Interaction::Placing { marker };
                EditorResponse::Redraw
            }
            Tool::Polyline | Tool::Polygon => {
                let Some(kind) = self.tool.marker_kind() else {
                    return EditorResponse::None;
                };
                let mut marker = self.new_marker(kind, p);
                marker.points.push(p);
                self.interaction = Interaction::MultiPointDrawing {
                    marker,
                    pressed: true,
                };
                EditorResponse::Redraw
            }
            Tool::Text | Tool::Note => {
                let kind = if self.tool == Tool::Note {
                    MarkerKind::Note
                } else {
                    MarkerKind::Text
                };
                let mut marker = self.new_marker(kind, p);
                marker.text_content = Some(if kind == MarkerKind::Note {
                    self.style.note_text.clone()
                } else {
                    self.style.label_text.clone()
                });
                let key = self.persist_create(marker);
                self.selection = Some(key);
                EditorResponse::Redraw
            }
            Tool::AccessPoint | Tool::Camera | Tool::Elevator | Tool::Intercom => {
                let Some(kind) = self.tool.marker_kind() else {
                    return EditorResponse::None;
                };
                let request = EquipmentRequest {
                    kind,
                    project_id: self.project_id,
                    position: p,
                    existing_equipment_id: None,
                    marker: None,
                };
                tracing::debug!("requesting {} configuration at ({:.1}, {:.1})", kind, p.x, p.y);
                self.pending_equipment = Some((self.page, request.clone()));
                EditorResponse::RequestEquipment(request)
            }
            Tool::Pan => EditorResponse::None,
        }
    }

    fn press_select(&mut self, p: Point, button: PointerButton) -> EditorResponse {
        if button == PointerButton::Primary {
            if let Some(key) = self.handle_at(p) {
                if let Some(original) = self.store.get(&key).cloned() {
                    self.store.hold(key);
                    self.interaction = Interaction::Resizing {
                        key,
                        original,
                        moved: false,
                    };
                    return EditorResponse::Redraw;
                }
            }
        }

        let Some(key) = self.marker_at(p) else {
            let had_selection = self.selection.take().is_some();
            return if had_selection {
                EditorResponse::Redraw
            } else {
                EditorResponse::None
            };
        };
        let was_selected = self.selection == Some(key);

        if button != PointerButton::Primary {
            self.selection = if was_selected { None } else { Some(key) };
            return EditorResponse::Redraw;
        }

        let Some(original) = self.store.get(&key).cloned() else {
            return EditorResponse::None;
        };
        self.selection = Some(key);
        self.store.hold(key);
        self.interaction = Interaction::Dragging {
            key,
            grab_offset: (p.x - original.x, p.y - original.y),
            original,
            was_selected,
            moved: false,
        };
        EditorResponse::Redraw
    }

    /// The selected marker, if `p` is on its resize handle.
    fn handle_at(&self, p: Point) -> Option<MarkerId> {
        let marker = self.selected_marker()?;
        if marker.page != self.page || !self.layers.is_marker_visible(marker) {
            return None;
        }
        let handle = geometry::resize_handle(marker)?;
        (p.distance_to(&handle) <= self.tolerance().handle).then_some(marker.key)
    }

    pub fn pointer_move(&mut self, screen_x: f64, screen_y: f64) -> EditorResponse {
        let p = self.viewport.screen_to_document(screen_x, screen_y);
        let spacing = self
            .viewport
            .pixels_to_document(self.interaction_settings.vertex_spacing_px);

        match &mut self.interaction {
            Interaction::Idle => EditorResponse::None,
            Interaction::Panning { last } => {
                let (dx, dy) = (screen_x - last.0, screen_y - last.1);
                *last = (screen_x, screen_y);
                self.viewport.pan(dx, dy);
                EditorResponse::Redraw
            }
            Interaction::Placing { marker } => {
                if marker.kind == MarkerKind::Line {
                    set_line_end(marker, p);
                } else {
                    apply_resize(marker, p);
                }
                EditorResponse::Redraw
            }
            Interaction::MultiPointDrawing { marker, pressed } => {
                if *pressed && push_vertex(&mut marker.points, p, spacing) {
                    EditorResponse::Redraw
                } else {
                    EditorResponse::None
                }
            }
            Interaction::Dragging {
                key,
                grab_offset,
                moved,
                ..
            } => {
                let anchor = Point::new(p.x - grab_offset.0, p.y - grab_offset.1);
                match self.store.get_mut(key) {
                    Some(marker) if marker.anchor() != anchor => {
                        marker.move_anchor_to(anchor);
                        *moved = true;
                        EditorResponse::Redraw
                    }
                    _ => EditorResponse::None,
                }
            }
            Interaction::Resizing { key, moved, .. } => match self.store.get_mut(key) {
                Some(marker) => {
                    apply_resize(marker, p);
                    *moved = true;
                    EditorResponse::Redraw
                }
                None => EditorResponse::None,
            },
            Interaction::Measuring { end, .. } | Interaction::Calibrating { end, .. } => {
                *end = p;
                EditorResponse::Redraw
            }
        }
    }

    pub fn pointer_up(&mut self, screen_x: f64, screen_y: f64, _button: PointerButton) -> EditorResponse {
        let p = self.viewport.screen_to_document(screen_x, screen_y);

        if let Interaction::MultiPointDrawing { pressed, .. } = &mut self.interaction {
            *pressed = false;
            return EditorResponse::None;
        }

        let interaction = std::mem::take(&mut self.interaction);
        self.store.release();
        let min_size = self
            .viewport
            .pixels_to_document(self.interaction_settings.min_shape_px);

        match interaction {
            Interaction::Idle => EditorResponse::None,
            Interaction::Panning { .. } => EditorResponse::None,
            Interaction::Placing { mut marker } => {
                if marker.kind == MarkerKind::Line {
                    set_line_end(&mut marker, p);
                } else {
                    apply_resize(&mut marker, p);
                }
                if drag_extent(&marker) <= min_size {
                    tracing::debug!("discarding {} below {:.2} units", marker.kind, min_size);
                    return EditorResponse::Redraw;
                }
                if marker.kind.is_box() {
                    normalize_box(&mut marker);
                }
                let key = self.persist_create(marker);
                self.selection = Some(key);
                EditorResponse::Redraw
            }
            Interaction::Dragging {
                key,
                was_selected,
                moved,
                ..
            } => {
                if moved {
                    self.persist_update(key);
                } else if was_selected {
                    self.selection = None;
                }
                EditorResponse::Redraw
            }
            Interaction::Resizing { key, moved, .. } => {
                if moved {
                    if let Some(marker) = self.store.get_mut(&key) {
                        if marker.kind.is_box() {
                            normalize_box(marker);
                        }
                    }
                    self.persist_update(key);
                }
                EditorResponse::Redraw
            }
            Interaction::Measuring { start, .. } => {
                self.measurement = Some(self.calibrations.measure(self.page, start, p));
                EditorResponse::Redraw
            }
            Interaction::Calibrating { start, .. } => {
                let document_length = start.distance_to(&p);
                if document_length <= min_size {
                    tracing::debug!("discarding degenerate calibration line");
                    return EditorResponse::Redraw;
                }
                self.pending_calibration = Some((self.page, start, p));
                EditorResponse::CalibrationRequested {
                    page: self.page,
                    start,
                    end: p,
                    document_length,
                }
            }
            Interaction::MultiPointDrawing { .. } => EditorResponse::None,
        }
    }

    /// Finishes a polyline or polygon. Fewer than two vertices are dropped.
    pub fn double_click(&mut self, _screen_x: f64, _screen_y: f64) -> EditorResponse {
        if !matches!(self.interaction, Interaction::MultiPointDrawing { .. }) {
            return EditorResponse::None;
        }
        let Interaction::MultiPointDrawing { mut marker, .. } = std::mem::take(&mut self.interaction)
        else {
            return EditorResponse::None;
        };
        if marker.points.len() < 2 {
            tracing::debug!("discarding {} with {} vertex", marker.kind, marker.points.len());
            return EditorResponse::Redraw;
        }
        if let Some(first) = marker.points.first().copied() {
            marker.x = first.x;
            marker.y = first.y;
        }
        let key = self.persist_create(marker);
        self.selection = Some(key);
        EditorResponse::Redraw
    }

    /// Zooms toward the pointer. Negative `delta_y` zooms in.
    pub fn wheel(&mut self, delta_y: f64, screen_x: f64, screen_y: f64) -> EditorResponse {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return EditorResponse::None;
        }
        let factor = if delta_y < 0.0 {
            self.wheel_zoom_step
        } else {
            1.0 / self.wheel_zoom_step
        };
        if self.zoom_at(factor, screen_x, screen_y) {
            EditorResponse::Redraw
        } else {
            EditorResponse::None
        }
    }

    pub fn key_down(&mut self, key: Key, modifiers: Modifiers) -> EditorResponse {
        match key {
            Key::Escape => {
                let cancelled = self.cancel_gesture();
                let pending = self.pending_calibration.take().is_some()
                    | self.pending_equipment.take().is_some();
                if cancelled || pending {
                    EditorResponse::Redraw
                } else {
                    EditorResponse::None
                }
            }
            Key::Delete | Key::Backspace => {
                if self.selection.is_none() {
                    return EditorResponse::None;
                }
                self.cancel_gesture();
                if self.delete_selected() {
                    EditorResponse::Redraw
                } else {
                    EditorResponse::None
                }
            }
            Key::Character(c) if modifiers.command() => match c.to_ascii_lowercase() {
                'd' => {
                    self.cancel_gesture();
                    match self.duplicate_selected() {
                        Some(_) => EditorResponse::Redraw,
                        None => EditorResponse::None,
                    }
                }
                '0' => {
                    self.reset_viewport();
                    EditorResponse::Redraw
                }
                _ => EditorResponse::None,
            },
            Key::Character(_) => EditorResponse::None,
        }
    }
}

/// Appends `p` unless it is within `spacing` of the last vertex.
fn push_vertex(points: &mut Vec<Point>, p: Point, spacing: f64) -> bool {
    match points.last() {
        Some(last) if last.distance_to(&p) <= spacing => false,
        _ => {
            points.push(p);
            true
        }
    }
}
