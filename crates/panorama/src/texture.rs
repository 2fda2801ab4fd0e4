use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use tracing::{debug, info};

use crate::error::AssetError;

/// Where the panorama image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    File(PathBuf),
    Url(String),
}

impl AssetSource {
    /// Interprets `raw` as a URL when it carries an http(s) scheme, otherwise
    /// as a path relative to `base_dir`.
    pub fn resolve(raw: &str, base_dir: &Path) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return AssetSource::Url(trimmed.to_string());
        }
        let path = Path::new(trimmed);
        if path.is_absolute() {
            AssetSource::File(path.to_path_buf())
        } else {
            AssetSource::File(base_dir.join(path))
        }
    }
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetSource::File(path) => write!(f, "{}", path.display()),
            AssetSource::Url(url) => f.write_str(url),
        }
    }
}

/// Decoded RGBA8 image, rows top to bottom.
#[derive(Clone, PartialEq, Eq)]
pub struct PanoramaImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl fmt::Debug for PanoramaImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanoramaImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl PanoramaImage {
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, AssetError> {
        if width == 0 || height == 0 {
            return Err(AssetError::EmptyImage { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(AssetError::Decode(format!(
                "expected {expected} bytes of RGBA8 data for {width}x{height}, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, AssetError> {
        let image =
            image::load_from_memory(bytes).map_err(|err| AssetError::Decode(err.to_string()))?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba8(width, height, rgba.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_power_of_two(&self) -> bool {
        self.width.is_power_of_two() && self.height.is_power_of_two()
    }
}

/// Result of polling an in-flight texture load.
#[derive(Debug)]
pub enum TexturePoll {
    Pending,
    Ready(PanoramaImage),
    Failed(AssetError),
}

type LoadResult = Result<PanoramaImage, AssetError>;

/// Receiving end of an asynchronous texture load.
///
/// Dropping it abandons the load: the worker's send fails silently and
/// nothing reaches the renderer.
#[derive(Debug)]
pub struct PendingTexture {
    receiver: Receiver<LoadResult>,
}

impl PendingTexture {
    pub fn channel() -> (Sender<LoadResult>, PendingTexture) {
        let (sender, receiver) = bounded(1);
        (sender, PendingTexture { receiver })
    }

    pub fn ready(image: PanoramaImage) -> Self {
        Self::resolved(Ok(image))
    }

    pub fn failed(error: AssetError) -> Self {
        Self::resolved(Err(error))
    }

    fn resolved(result: LoadResult) -> Self {
        let (sender, pending) = Self::channel();
        let _ = sender.send(result);
        pending
    }

    pub fn poll(&self) -> TexturePoll {
        match self.receiver.try_recv() {
            Ok(Ok(image)) => TexturePoll::Ready(image),
            Ok(Err(err)) => TexturePoll::Failed(err),
            Err(TryRecvError::Empty) => TexturePoll::Pending,
            Err(TryRecvError::Disconnected) => TexturePoll::Failed(AssetError::Abandoned),
        }
    }
}

/// Starts texture loads for a renderer mount.
pub trait TextureLoader {
    fn load(&self) -> PendingTexture;
}

/// Loads and decodes the panorama on a background thread.
#[derive(Debug, Clone)]
pub struct ThreadedTextureLoader {
    source: AssetSource,
}

impl ThreadedTextureLoader {
    pub fn new(source: AssetSource) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &AssetSource {
        &self.source
    }
}

impl TextureLoader for ThreadedTextureLoader {
    fn load(&self) -> PendingTexture {
        let (sender, pending) = PendingTexture::channel();
        let source = self.source.clone();
        let spawned = thread::Builder::new()
            .name("vistaboot-texture".into())
            .spawn(move || {
                let result = read_source(&source).and_then(|bytes| PanoramaImage::decode(&bytes));
                match &result {
                    Ok(image) => info!(
                        source = %source,
                        width = image.width(),
                        height = image.height(),
                        power_of_two = image.is_power_of_two(),
                        "decoded panorama texture"
                    ),
                    Err(err) => debug!(source = %source, error = %err, "panorama texture load failed"),
                }
                let _ = sender.send(result);
            });
        match spawned {
            Ok(_) => pending,
            Err(err) => PendingTexture::failed(AssetError::Spawn(err.to_string())),
        }
    }
}

/// Loader that resolves immediately with a fixed outcome.
#[derive(Debug, Clone)]
pub struct StaticTextureLoader {
    image: Option<PanoramaImage>,
}

impl StaticTextureLoader {
    pub fn with_image(image: PanoramaImage) -> Self {
        Self { image: Some(image) }
    }

    /// Every load fails with [`AssetError::Missing`].
    pub fn missing() -> Self {
        Self { image: None }
    }
}

impl TextureLoader for StaticTextureLoader {
    fn load(&self) -> PendingTexture {
        match &self.image {
            Some(image) => PendingTexture::ready(image.clone()),
            None => PendingTexture::failed(AssetError::Missing),
        }
    }
}

fn read_source(source: &AssetSource) -> Result<Vec<u8>, AssetError> {
    match source {
        AssetSource::File(path) => fs::read(path).map_err(|source| AssetError::Read {
            path: path.clone(),
            source,
        }),
        AssetSource::Url(url) => fetch_url(url),
    }
}

fn fetch_url(url: &str) -> Result<Vec<u8>, AssetError> {
    let fetch_error = |err: reqwest::Error| AssetError::Fetch {
        url: url.to_string(),
        message: err.to_string(),
    };
    let client = reqwest::blocking::Client::builder()
        .build()
        .map_err(fetch_error)?;
    let response = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .map_err(fetch_error)?;
    let bytes = response.bytes().map_err(fetch_error)?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    use super::*;

    fn encoded_png(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    fn wait_for(pending: &PendingTexture) -> TexturePoll {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match pending.poll() {
                TexturePoll::Pending if Instant::now() < deadline => {
                    thread::sleep(Duration::from_millis(5))
                }
                other => return other,
            }
        }
    }

    #[test]
    fn resolves_urls_and_relative_paths() {
        let base = Path::new("/srv/data");
        assert_eq!(
            AssetSource::resolve("https://cdn.example.com/p.png", base),
            AssetSource::Url("https://cdn.example.com/p.png".into())
        );
        assert_eq!(
            AssetSource::resolve("media/panorama.png", base),
            AssetSource::File(PathBuf::from("/srv/data/media/panorama.png"))
        );
        assert_eq!(
            AssetSource::resolve("/abs/p.png", base),
            AssetSource::File(PathBuf::from("/abs/p.png"))
        );
    }

    #[test]
    fn decodes_non_power_of_two_png() {
        let image = PanoramaImage::decode(&encoded_png(6, 3)).expect("decode");
        assert_eq!((image.width(), image.height()), (6, 3));
        assert!(!image.is_power_of_two());
        assert_eq!(&image.pixels()[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn rejects_garbage_bytes() {
        let err = PanoramaImage::decode(b"not an image").unwrap_err();
        assert!(matches!(err, AssetError::Decode(_)));
    }

    #[test]
    fn rejects_mismatched_pixel_buffer() {
        let err = PanoramaImage::from_rgba8(2, 2, vec![0; 3]).unwrap_err();
        assert!(matches!(err, AssetError::Decode(_)));
        let err = PanoramaImage::from_rgba8(0, 2, Vec::new()).unwrap_err();
        assert!(matches!(err, AssetError::EmptyImage { .. }));
    }

    #[test]
    fn threaded_loader_reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("panorama.png");
        fs::write(&path, encoded_png(5, 3)).expect("write png");

        let loader = ThreadedTextureLoader::new(AssetSource::File(path));
        match wait_for(&loader.load()) {
            TexturePoll::Ready(image) => assert_eq!(image.width(), 5),
            other => panic!("expected decoded image, got {other:?}"),
        }
    }

    #[test]
    fn threaded_loader_reports_missing_file() {
        let loader = ThreadedTextureLoader::new(AssetSource::File(PathBuf::from(
            "/definitely/missing/panorama.png",
        )));
        assert!(matches!(
            wait_for(&loader.load()),
            TexturePoll::Failed(AssetError::Read { .. })
        ));
    }

    #[test]
    fn dropped_sender_reads_as_abandoned() {
        let (sender, pending) = PendingTexture::channel();
        drop(sender);
        assert!(matches!(
            pending.poll(),
            TexturePoll::Failed(AssetError::Abandoned)
        ));
    }
}
