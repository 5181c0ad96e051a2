use std::io::Cursor;
use std::sync::Arc;

use floorplan_core::{AppEvent, EventBus, EventCategory, Marker, NotificationLevel};
use floorplan_designer::{FloorplanEditor, PointerButton};
use floorplan_gateway::InMemoryBackend;
use floorplan_settings::Config;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

pub struct Harness {
    pub editor: FloorplanEditor,
    pub backend: Arc<InMemoryBackend>,
    pub bus: Arc<EventBus>,
}

pub fn harness() -> Harness {
    let backend = Arc::new(InMemoryBackend::new());
    let bus = Arc::new(EventBus::with_history(512));
    let editor = FloorplanEditor::new(&Config::default(), backend.clone(), bus.clone());
    Harness {
        editor,
        backend,
        bus,
    }
}

impl Harness {
    pub fn click(&mut self, x: f64, y: f64) {
        self.editor.pointer_down(x, y, PointerButton::Primary);
        self.editor.pointer_up(x, y, PointerButton::Primary);
    }

    /// Press at `from`, move in `steps` equal increments to `to`, release.
    pub fn drag(&mut self, from: (f64, f64), to: (f64, f64), steps: usize) {
        self.editor.pointer_down(from.0, from.1, PointerButton::Primary);
        for i in 1..=steps {
            let t = i as f64 / steps as f64;
            self.editor
                .pointer_move(from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t);
        }
        self.editor.pointer_up(to.0, to.1, PointerButton::Primary);
    }

    pub fn only_marker(&self) -> Marker {
        let markers = self.editor.visible_markers();
        assert_eq!(markers.len(), 1, "expected exactly one marker");
        markers[0].clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.bus
            .history_of(EventCategory::Notification)
            .into_iter()
            .filter_map(|event| match event {
                AppEvent::Notification(n) if n.level == NotificationLevel::Error => {
                    Some(n.message)
                }
                _ => None,
            })
            .collect()
    }
}

pub fn white_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}
