//! Image files decoded into pixel buffers ready for `glTexImage2D`.

use std::path::Path;

use image::{ColorType, DynamicImage, ImageError};
use log::info;

use crate::error::{AppError, Result};

/// Channel layout of a decoded [`PixelBuffer`], 8 bits per channel.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PixelLayout {
    Grey,
    GreyAlpha,
    Rgba,
}

impl PixelLayout {
    pub fn channels(self) -> usize {
        match self {
            Self::Grey => 1,
            Self::GreyAlpha => 2,
            Self::Rgba => 4,
        }
    }

    /// Matching GLES 2 pixel format.
    pub fn gl_format(self) -> u32 {
        match self {
            Self::Grey => glow::LUMINANCE,
            Self::GreyAlpha => glow::LUMINANCE_ALPHA,
            Self::Rgba => glow::RGBA,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub fn load(path: &Path) -> Result<Self> {
        let image = image::open(path).map_err(|e| match e {
            ImageError::IoError(source) => AppError::FileNotFound {
                path: path.to_path_buf(),
                source,
            },
            other => AppError::MalformedFile {
                path: path.to_path_buf(),
                line: None,
                reason: other.to_string(),
            },
        })?;

        let pixels = Self::from_image(image);
        info!(
            "Loaded {}x{} {:?} image from {}",
            pixels.width,
            pixels.height,
            pixels.layout,
            path.display()
        );
        Ok(pixels)
    }

    /// Greyscale images keep their layout; everything else is expanded to RGBA.
    pub fn from_image(image: DynamicImage) -> Self {
        let (layout, width, height, data) = match image.color() {
            ColorType::L8 => {
                let buffer = image.into_luma8();
                let (w, h) = buffer.dimensions();
                (PixelLayout::Grey, w, h, buffer.into_raw())
            }
            ColorType::La8 => {
                let buffer = image.into_luma_alpha8();
                let (w, h) = buffer.dimensions();
                (PixelLayout::GreyAlpha, w, h, buffer.into_raw())
            }
            _ => {
                let buffer = image.into_rgba8();
                let (w, h) = buffer.dimensions();
                (PixelLayout::Rgba, w, h, buffer.into_raw())
            }
        };

        Self {
            width,
            height,
            layout,
            data,
        }
    }

    /// Bytes per row, tightly packed.
    pub fn row_len(&self) -> usize {
        self.width as usize * self.layout.channels()
    }

    /// Largest `GL_UNPACK_ALIGNMENT` that divides every row.
    pub fn unpack_alignment(&self) -> i32 {
        match self.row_len() {
            len if len % 8 == 0 => 8,
            len if len % 4 == 0 => 4,
            len if len % 2 == 0 => 2,
            _ => 1,
        }
    }
}
