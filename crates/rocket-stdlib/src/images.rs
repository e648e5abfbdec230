//! Image: Decoded images owned by a pool
//!
//! Loaded images belong to the session's image pool, not to the Lua
//! collector. A script frees one with `img:unload()` or all of them with
//! `Image.unloadAll()`; whatever is left is released when the session closes.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::imageops::FilterType;
use image::RgbaImage;
use mlua::{Lua, Value};
use rocket_bridge::{
    box_auto, record, status, unwrap_auto, ClassBuilder, Finalizer, NativeType, Ownership,
    ResourcePool, TypeTag,
};

/// Largest width or height a resample may produce.
pub const MAX_DIMENSION: u32 = 16_384;

/// Recoverable image failures, surfaced to scripts as `nil, message`.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The file could not be read or decoded
    #[error("Failed to load image")]
    Load(#[source] image::ImageError),

    /// Requested or resulting dimensions are empty
    #[error("Invalid image size")]
    InvalidSize,

    /// The file could not be encoded or written
    #[error("Failed to save image: {0}")]
    Save(#[source] image::ImageError),
}

/// A decoded RGBA image.
#[derive(Debug)]
pub struct LoadedImage {
    pixels: RgbaImage,
    source: PathBuf,
}

impl NativeType for LoadedImage {
    const TAG: &'static str = "Image";
}

impl LoadedImage {
    /// Decode the file at `path`.
    pub fn open(path: &Path) -> Result<Self, ImageError> {
        let pixels = image::open(path).map_err(ImageError::Load)?.into_rgba8();
        Ok(LoadedImage {
            pixels,
            source: path.to_path_buf(),
        })
    }

    /// Resample to exactly `width` x `height`.
    ///
    /// Either side must be between 1 and [`MAX_DIMENSION`].
    pub fn resized(self, width: u32, height: u32) -> Result<Self, ImageError> {
        let valid = 1..=MAX_DIMENSION;
        if !valid.contains(&width) || !valid.contains(&height) {
            return Err(ImageError::InvalidSize);
        }
        let pixels =
            image::imageops::resize(&self.pixels, width, height, FilterType::Triangle);
        Ok(LoadedImage { pixels, ..self })
    }

    /// Resample by a uniform factor, truncating the new dimensions.
    pub fn scaled(self, scale: f64) -> Result<Self, ImageError> {
        let (width, height) = self.size();
        let width = (f64::from(width) * scale).floor();
        let height = (f64::from(height) * scale).floor();
        let valid = 1.0..=f64::from(MAX_DIMENSION);
        if !valid.contains(&width) || !valid.contains(&height) {
            return Err(ImageError::InvalidSize);
        }
        self.resized(width as u32, height as u32)
    }

    /// Width and height in pixels
    pub fn size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// RGBA components at (`x`, `y`), if inside the image
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let (width, height) = self.size();
        (x < width && y < height).then(|| self.pixels.get_pixel(x, y).0)
    }

    /// Encode to `path`; the format follows the extension.
    pub fn save(&self, path: &Path) -> Result<(), ImageError> {
        self.pixels.save(path).map_err(ImageError::Save)
    }

    /// File this image was decoded from
    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// The session's loaded images.
#[derive(Debug, Clone)]
pub struct ImageLibrary {
    pool: Rc<RefCell<ResourcePool<LoadedImage>>>,
}

impl ImageLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        let teardown = Finalizer::new(|image: Box<LoadedImage>| {
            tracing::trace!(source = %image.source.display(), "unloaded image");
        });
        ImageLibrary {
            pool: Rc::new(RefCell::new(ResourcePool::new("Image", teardown))),
        }
    }

    /// Number of images still loaded
    pub fn loaded(&self) -> usize {
        self.pool.borrow().len()
    }

    /// Unload every image, returning how many were freed
    pub fn unload_all(&self) -> usize {
        self.pool.borrow_mut().release_all()
    }

    fn push(
        &self,
        lua: &Lua,
        result: Result<LoadedImage, ImageError>,
    ) -> mlua::Result<(Value, Option<String>)> {
        match result {
            Ok(image) => {
                tracing::debug!(
                    source = %image.source.display(),
                    size = ?image.size(),
                    "loaded image"
                );
                let native = self.pool.borrow_mut().track(image);
                Ok((box_auto(lua, Some(&native), Ownership::Pool)?, None))
            }
            Err(err) => {
                tracing::debug!(error = ?err, "image load failed");
                Ok((Value::Nil, Some(err.to_string())))
            }
        }
    }
}

impl Default for ImageLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Register the `Image` class over `library`.
pub fn install(lua: &Lua, library: &ImageLibrary) -> mlua::Result<TypeTag> {
    let load = library.clone();
    let load_resized = library.clone();
    let load_scaled = library.clone();
    let unload_all = library.clone();
    let loaded = library.clone();
    let unload = library.clone();

    ClassBuilder::new(LoadedImage::TAG)
        .function(lua, "load", move |lua, path: String| {
            load.push(lua, LoadedImage::open(Path::new(&path)))
        })?
        .function(
            lua,
            "loadAndResize",
            move |lua, (path, width, height): (String, i64, i64)| {
                let result = match (u32::try_from(width), u32::try_from(height)) {
                    (Ok(width), Ok(height)) => LoadedImage::open(Path::new(&path))
                        .and_then(|image| image.resized(width, height)),
                    _ => Err(ImageError::InvalidSize),
                };
                load_resized.push(lua, result)
            },
        )?
        .function(lua, "loadAndScale", move |lua, (path, scale): (String, f64)| {
            let result = LoadedImage::open(Path::new(&path)).and_then(|image| image.scaled(scale));
            load_scaled.push(lua, result)
        })?
        .function(lua, "unloadAll", move |_, ()| Ok(unload_all.unload_all()))?
        .function(lua, "loaded", move |_, ()| Ok(loaded.loaded()))?
        .method(lua, "getSize", |lua, this: Value| {
            let image = unwrap_auto::<LoadedImage>(lua, &this)?;
            let (width, height) = image.with(|image| image.size())?;
            record(lua, &[("width", f64::from(width)), ("height", f64::from(height))])
        })?
        .method(lua, "pixel", |lua, (this, x, y): (Value, u32, u32)| {
            let image = unwrap_auto::<LoadedImage>(lua, &this)?;
            let Some([r, g, b, a]) = image.with(|image| image.pixel(x, y))? else {
                let (width, height) = image.with(|image| image.size())?;
                return Err(mlua::Error::runtime(format!(
                    "pixel ({}, {}) is outside the {}x{} image",
                    x, y, width, height
                )));
            };
            record(
                lua,
                &[
                    ("r", f64::from(r)),
                    ("g", f64::from(g)),
                    ("b", f64::from(b)),
                    ("a", f64::from(a)),
                ],
            )
        })?
        .method(lua, "save", |lua, (this, path): (Value, String)| {
            let image = unwrap_auto::<LoadedImage>(lua, &this)?;
            Ok(status(image.with(|image| image.save(Path::new(&path)))?))
        })?
        .method(lua, "unload", move |lua, this: Value| {
            let image = unwrap_auto::<LoadedImage>(lua, &this)?;
            unload.pool.borrow_mut().release(&image);
            Ok(())
        })?
        .register(lua)
}
