use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageOutputFormat};
use std::path::PathBuf;
use tracing::{debug, warn};

const MAX_WIDTH: u32 = 640;
const MAX_HEIGHT: u32 = 480;
const JPEG_QUALITY: u8 = 80;

/// Produces encoded JPEG frames for the sampler.
/// Returning `None` skips the tick; a missing frame is not an observation.
/// Capture may block on file i/o and decoding; the sampler runs it on the
/// blocking pool.
pub trait FrameSource: Send + 'static {
    fn capture(&mut self) -> Option<Vec<u8>>;
}

/// Constant black frame. Useful where no camera or image is available.
pub struct BlankFrameSource {
    frame: Option<Vec<u8>>,
}

impl BlankFrameSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frame: encode_jpeg(&DynamicImage::new_rgb8(width, height)),
        }
    }
}

impl Default for BlankFrameSource {
    fn default() -> Self {
        Self::new(224, 224)
    }
}

impl FrameSource for BlankFrameSource {
    fn capture(&mut self) -> Option<Vec<u8>> {
        self.frame.clone()
    }
}

/// Re-reads an image file on every tick, so the file can be swapped
/// while the session runs.
pub struct StillImageSource {
    path: PathBuf,
}

impl StillImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FrameSource for StillImageSource {
    fn capture(&mut self) -> Option<Vec<u8>> {
        match image::open(&self.path) {
            Ok(img) => encode_jpeg(&fit_frame(img)),
            Err(e) => {
                warn!(path = %self.path.display(), "frame unavailable: {}", e);
                None
            }
        }
    }
}

/// Downscales to the capture resolution, keeping aspect ratio.
pub fn fit_frame(img: DynamicImage) -> DynamicImage {
    if img.width() > MAX_WIDTH || img.height() > MAX_HEIGHT {
        img.resize(MAX_WIDTH, MAX_HEIGHT, FilterType::Triangle)
    } else {
        img
    }
}

pub fn encode_jpeg(img: &DynamicImage) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    match img.write_to(&mut buf, ImageOutputFormat::Jpeg(JPEG_QUALITY)) {
        Ok(()) => {
            debug!(bytes = buf.len(), "frame encoded");
            Some(buf)
        }
        Err(e) => {
            warn!("frame encoding failed: {}", e);
            None
        }
    }
}
