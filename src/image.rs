//! Image loading, an external collaborator. The core only needs an image's
//! URL and pixel size; it never looks at pixel data.

use futures::future::{FutureExt, LocalBoxFuture};
use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

mod transform;

pub use transform::{ImageKitTransformer, ImageTransformer, background_removed_url};

use crate::error::LoadError;

/// An image that finished loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl LoadedImage {
    fn checked(url: &str, width: u32, height: u32) -> Result<Self, LoadError> {
        if width == 0 || height == 0 {
            return Err(LoadError::Empty { url: url.to_owned() });
        }
        Ok(Self {
            url: url.to_owned(),
            width,
            height,
        })
    }
}

pub trait ImageLoader {
    fn load<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<LoadedImage, LoadError>>;
}

/// Loads images from the local file system. Accepts plain paths and
/// `file://` URLs; relative paths resolve against `root` when set.
#[derive(Debug, Clone, Default)]
pub struct FsImageLoader {
    root: Option<PathBuf>,
}

impl FsImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let path = Path::new(url.strip_prefix("file://").unwrap_or(url));
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ImageLoader for FsImageLoader {
    fn load<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<LoadedImage, LoadError>> {
        async move {
            let path = self.resolve(url);
            if !path.exists() {
                return Err(LoadError::NotFound(url.to_owned()));
            }
            let (width, height) = image::image_dimensions(&path).map_err(|e| match e {
                image::ImageError::IoError(source) => LoadError::Io {
                    url: url.to_owned(),
                    source,
                },
                source => LoadError::Decode {
                    url: url.to_owned(),
                    source,
                },
            })?;
            info!("Loaded {} ({}x{})", url, width, height);
            LoadedImage::checked(url, width, height)
        }
        .boxed_local()
    }
}

/// Serves sizes from a fixed table. Unknown URLs fail with `NotFound`.
#[derive(Debug, Default)]
pub struct MemoryImageLoader {
    images: Mutex<HashMap<String, (u32, u32)>>,
}

impl MemoryImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, width: u32, height: u32) {
        self.images.lock().insert(url.into(), (width, height));
    }

    pub fn with_image(self, url: impl Into<String>, width: u32, height: u32) -> Self {
        self.insert(url, width, height);
        self
    }

    pub fn remove(&self, url: &str) {
        self.images.lock().remove(url);
    }
}

impl ImageLoader for MemoryImageLoader {
    fn load<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<LoadedImage, LoadError>> {
        async move {
            let size = self.images.lock().get(url).copied();
            let (width, height) = size.ok_or_else(|| LoadError::NotFound(url.to_owned()))?;
            debug!("Serving {} from memory", url);
            LoadedImage::checked(url, width, height)
        }
        .boxed_local()
    }
}
