//! Conversion of arbitrary poster art into 1-bit PNGs for the e-ink panel.
//!
//! Every output has exactly the canvas dimensions and only two pixel
//! values, 0 (black) and 255 (white). The source is shrunk to fit (never
//! enlarged), centered on white, reduced to luma and then to two levels
//! with Floyd–Steinberg error diffusion.

use anyhow::{Context, Result};
use image::imageops::{self, BiLevel, FilterType};
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const POSTER_WIDTH: u32 = 200;
pub const POSTER_HEIGHT: u32 = 300;

const BATCH_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "tiff", "bmp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    pub width: u32,
    pub height: u32,
    pub dither: bool,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            width: POSTER_WIDTH,
            height: POSTER_HEIGHT,
            dither: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub converted: usize,
    pub total: usize,
}

impl Normalizer {
    pub fn without_dither(self) -> Self {
        Self {
            dither: false,
            ..self
        }
    }

    pub fn normalize(&self, source: &DynamicImage) -> GrayImage {
        let fitted = if source.width() > self.width || source.height() > self.height {
            source.resize(self.width, self.height, FilterType::Lanczos3)
        } else {
            source.clone()
        };

        let mut canvas = RgbaImage::from_pixel(self.width, self.height, Rgba([255, 255, 255, 255]));
        let x = (self.width - fitted.width()) / 2;
        let y = (self.height - fitted.height()) / 2;
        imageops::overlay(&mut canvas, &fitted.to_rgba8(), i64::from(x), i64::from(y));

        let mut gray = DynamicImage::ImageRgba8(canvas).to_luma8();
        if self.dither {
            imageops::dither(&mut gray, &BiLevel);
        } else {
            for px in gray.pixels_mut() {
                *px = if px.0[0] >= 128 { Luma([255]) } else { Luma([0]) };
            }
        }
        gray
    }

    pub fn normalize_bytes(&self, data: &[u8]) -> Result<GrayImage> {
        let img = image::load_from_memory(data).context("Failed to decode image data")?;
        Ok(self.normalize(&img))
    }

    /// Reads `input`, writes the 1-bit PNG to `output` (parent dirs created).
    pub fn convert_file(&self, input: &Path, output: &Path) -> Result<()> {
        // Downloads carry no extension; decoding sniffs the format from the bytes.
        let data = fs::read(input).with_context(|| format!("Failed to open {}", input.display()))?;
        let bw = self
            .normalize_bytes(&data)
            .with_context(|| format!("Failed to decode {}", input.display()))?;
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        write_one_bit_png(&bw, output)
            .with_context(|| format!("Failed to write {}", output.display()))
    }

    /// Converts every image file in `dir` to `<stem>_1bit.png` under `output_dir`.
    pub fn convert_dir(&self, dir: &Path, output_dir: Option<&Path>) -> Result<BatchReport> {
        let output_dir = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dir.join("converted"));
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let mut inputs: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("Failed to list {}", dir.display()))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && has_image_extension(p))
            .collect();
        inputs.sort();

        let mut report = BatchReport::default();
        for input in inputs {
            report.total += 1;
            let output = output_dir.join(one_bit_name(&input));
            match self.convert_file(&input, &output) {
                Ok(()) => {
                    info!("Converted {} → {}", input.display(), output.display());
                    report.converted += 1;
                }
                Err(e) => warn!("Failed to convert {}: {:#}", input.display(), e),
            }
        }
        Ok(report)
    }
}

/// Default single-file output name: `poster.jpg` → `poster_1bit.png`.
pub fn one_bit_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    format!("{stem}_1bit.png")
}

/// Encodes a bilevel image as a 1-bit grayscale PNG (MSB first, 1 = white).
pub fn write_one_bit_png(img: &GrayImage, output: &Path) -> Result<()> {
    let file = File::create(output)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), img.width(), img.height());
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::One);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&pack_rows(img))?;
    writer.finish()?;
    Ok(())
}

fn pack_rows(img: &GrayImage) -> Vec<u8> {
    let stride = (img.width() as usize).div_ceil(8);
    let mut packed = vec![0u8; stride * img.height() as usize];
    for (x, y, px) in img.enumerate_pixels() {
        if px.0[0] >= 128 {
            packed[y as usize * stride + x as usize / 8] |= 0x80 >> (x % 8);
        }
    }
    packed
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| BATCH_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
