//! Paged floorplan documents.
//!
//! A document is either a single raster image (one page) or a ZIP archive
//! of raster images (one page per entry, ordered by entry name). Page pixel
//! dimensions at scale 1.0 define document units.
//!
//! Pages are kept encoded and decoded on render, so one corrupt page does
//! not prevent the others from being viewed.

use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use floorplan_core::RenderError;
use image::imageops::FilterType;
use image::{ImageFormat, ImageReader, RgbaImage};
use zip::ZipArchive;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Cancellation handle for one render request.
///
/// A token is cancelled as soon as a newer request bumps the shared
/// generation counter.
#[derive(Debug, Clone)]
pub struct RenderToken {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl RenderToken {
    pub(crate) fn new(generation: u64, latest: Arc<AtomicU64>) -> Self {
        Self { generation, latest }
    }

    /// A token that is never cancelled, for one-off renders.
    pub fn detached() -> Self {
        Self::new(0, Arc::new(AtomicU64::new(0)))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.latest.load(Ordering::Acquire) != self.generation
    }

    fn check(&self) -> Result<(), RenderError> {
        if self.is_cancelled() {
            Err(RenderError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A rasterised page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub page: u32,
    pub scale: f64,
    pub image: RgbaImage,
}

#[derive(Debug)]
struct Page {
    name: String,
    data: Vec<u8>,
    width: u32,
    height: u32,
}

/// A loaded paged document.
#[derive(Debug)]
pub struct Document {
    pages: Vec<Page>,
}

fn is_page_entry(name: &str) -> bool {
    let lower = name.to_lowercase();
    if lower.contains("__macosx") || lower.contains("/.") || lower.starts_with('.') {
        return false;
    }
    ImageFormat::from_path(&lower).is_ok()
}

fn dimensions(data: &[u8], name: &str) -> Result<(u32, u32), RenderError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| RenderError::Decode {
            reason: format!("{}: {}", name, e),
        })?
        .into_dimensions()
        .map_err(|e| RenderError::Decode {
            reason: format!("{}: {}", name, e),
        })
}

impl Document {
    /// Loads a document from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RenderError> {
        if bytes.is_empty() {
            return Err(RenderError::EmptyDocument);
        }
        let document = if bytes.starts_with(ZIP_MAGIC) {
            Self::from_archive(bytes)?
        } else {
            let (width, height) = dimensions(bytes, "document")?;
            Self {
                pages: vec![Page {
                    name: "page".to_string(),
                    data: bytes.to_vec(),
                    width,
                    height,
                }],
            }
        };
        tracing::info!("Loaded document with {} page(s)", document.pages.len());
        Ok(document)
    }

    fn from_archive(bytes: &[u8]) -> Result<Self, RenderError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| RenderError::Decode {
            reason: format!("Failed to read ZIP archive: {}", e),
        })?;

        let mut pages = Vec::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(|e| RenderError::Decode {
                reason: format!("Failed to read ZIP entry {}: {}", i, e),
            })?;
            let name = entry.name().to_string();
            if entry.is_dir() || !is_page_entry(&name) {
                tracing::trace!("Skipping archive entry {}", name);
                continue;
            }

            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data).map_err(|e| RenderError::Decode {
                reason: format!("Failed to read '{}': {}", name, e),
            })?;
            let (width, height) = dimensions(&data, &name)?;
            pages.push(Page {
                name,
                data,
                width,
                height,
            });
        }

        if pages.is_empty() {
            return Err(RenderError::EmptyDocument);
        }
        pages.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self { pages })
    }

    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page(&self, page: u32) -> Result<&Page, RenderError> {
        self.pages
            .get(page as usize)
            .ok_or(RenderError::PageOutOfRange {
                page,
                page_count: self.page_count(),
            })
    }

    /// Page size in document units.
    pub fn page_size(&self, page: u32) -> Result<(u32, u32), RenderError> {
        self.page(page).map(|p| (p.width, p.height))
    }

    /// Entry name of a page (`"page"` for single-image documents).
    pub fn page_name(&self, page: u32) -> Result<&str, RenderError> {
        self.page(page).map(|p| p.name.as_str())
    }

    /// Rasterises `page` at `scale`, giving up as soon as `token` is cancelled.
    pub fn render_page(
        &self,
        page: u32,
        scale: f64,
        token: &RenderToken,
    ) -> Result<RenderedPage, RenderError> {
        if !(scale > 0.0 && scale.is_finite()) {
            return Err(RenderError::InvalidScale { scale });
        }
        let source = self.page(page)?;
        token.check()?;

        let decoded = image::load_from_memory(&source.data)
            .map_err(|e| RenderError::Decode {
                reason: format!("{}: {}", source.name, e),
            })?
            .to_rgba8();
        token.check()?;

        let width = ((source.width as f64) * scale).round().max(1.0) as u32;
        let height = ((source.height as f64) * scale).round().max(1.0) as u32;
        let image = if (width, height) == decoded.dimensions() {
            decoded
        } else {
            image::imageops::resize(&decoded, width, height, FilterType::Triangle)
        };
        token.check()?;

        Ok(RenderedPage { page, scale, image })
    }
}
