use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage, ImageFormat, ImageReader, RgbImage, RgbaImage};
use librawdo::{ImageDescriptor, PixelMode};
use std::path::Path;

/// Raw pixel bytes of a decoded image
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub descriptor: ImageDescriptor,
    /// Row-major pixels, `descriptor.mode.channels()` bytes each
    pub data: Vec<u8>,
}

/// Read an image, sniffing the format from its content
pub fn read_image_file(path: &Path) -> Result<DecodedImage> {
    let image = ImageReader::open(path)
        .context("Failed to open image file")?
        .with_guessed_format()
        .context("Failed to read image file")?
        .decode()
        .context("Unsupported image format")?;
    Ok(split(image))
}

/// Read an image from bytes
pub fn read_image_from_bytes(bytes: &[u8]) -> Result<DecodedImage> {
    let image = image::load_from_memory(bytes).context("Unsupported image format")?;
    Ok(split(image))
}

/// Greyscale, RGB and RGBA buffers are kept as they are; anything else
/// becomes RGBA when it has alpha and RGB otherwise.
fn split(image: DynamicImage) -> DecodedImage {
    let (width, height) = (image.width(), image.height());
    let (mode, data) = match image {
        DynamicImage::ImageLuma8(buf) => (PixelMode::Greyscale, buf.into_raw()),
        DynamicImage::ImageRgb8(buf) => (PixelMode::Rgb, buf.into_raw()),
        DynamicImage::ImageRgba8(buf) => (PixelMode::Rgba, buf.into_raw()),
        other if other.color().has_alpha() => (PixelMode::Rgba, other.into_rgba8().into_raw()),
        other => (PixelMode::Rgb, other.into_rgb8().into_raw()),
    };

    DecodedImage {
        descriptor: ImageDescriptor::new(width, height, mode),
        data,
    }
}

/// Write raw pixels; the format comes from the file extension
pub fn write_image_file(
    path: &Path,
    data: &[u8],
    width: u32,
    height: u32,
    mode: PixelMode,
) -> Result<ImageDescriptor> {
    let format = ImageFormat::from_path(path).context("Unsupported image output format")?;
    let image = assemble(data.to_vec(), width, height, mode)?;
    image
        .save_with_format(path, format)
        .with_context(|| format!("Failed to encode {} image as {:?}", mode, format))?;
    Ok(ImageDescriptor::new(width, height, mode))
}

fn assemble(data: Vec<u8>, width: u32, height: u32, mode: PixelMode) -> Result<DynamicImage> {
    let image = match mode {
        PixelMode::Greyscale => GrayImage::from_raw(width, height, data).map(DynamicImage::from),
        PixelMode::Rgb => RgbImage::from_raw(width, height, data).map(DynamicImage::from),
        PixelMode::Rgba => RgbaImage::from_raw(width, height, data).map(DynamicImage::from),
    };
    image.with_context(|| format!("Pixel data does not fill a {}x{} {} image", width, height, mode))
}

/// RGBA pixels to RGB, dropping alpha
pub fn drop_alpha(rgba: &[u8]) -> Vec<u8> {
    rgba.chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect()
}
