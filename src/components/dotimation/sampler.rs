//! Turning text and images into particle seeds.
//!
//! A shape is drawn onto an offscreen RGBA raster at device resolution, the
//! raster is scanned on a fixed stride, and every pixel whose alpha clears the
//! threshold becomes a [`Sample`]. Samples are shuffled so any prefix of the
//! result is spread evenly over the shape.
//!
//! Images are scaled and placed in software. Text needs a font engine, which
//! is supplied by a [`TextRasterizer`] (the browser canvas in production).

use image::imageops::{self, FilterType};
use image::RgbaImage;
use rand::Rng;
use rand::seq::SliceRandom;

use super::color::Rgb;
use super::error::DotimationError;
use super::font;
use super::options::{DEFAULT_TEXT_COLOR, DotimationOptions, capped_device_pixel_ratio};
use super::types::{ImageSpec, Sample, TextSpec};

/// Line height as a multiple of the font size.
const LINE_HEIGHT: f64 = 1.2;

/// Draws laid-out text into a device-pixel raster.
pub trait TextRasterizer {
	/// Fills every line of `layout` into `raster`, which is transparent and
	/// sized `round(width * dpr) × round(height * dpr)`.
	fn fill_text(
		&mut self,
		raster: &mut RgbaImage,
		layout: &TextLayout,
	) -> Result<(), DotimationError>;
}

/// One line of text, centered on `(x, y)` in logical pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLine {
	pub text: String,
	pub x: f64,
	pub y: f64,
}

/// Where and how each line of a text shape is drawn.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLayout {
	pub font_size: f64,
	/// CSS font shorthand, e.g. `"48px sans-serif"`.
	pub font: String,
	/// CSS fill color.
	pub fill_style: String,
	pub line_height: f64,
	pub lines: Vec<TextLine>,
	/// Logical-to-device scale of the raster being drawn into.
	pub dpr: f64,
}

impl TextLayout {
	/// Lays out `spec` centered in a `width`×`height` logical canvas.
	pub fn new(width: f64, height: f64, dpr: f64, spec: &TextSpec, default_family: &str) -> Self {
		let font_size = font::font_size(spec.font_size_mode, width, &spec.content);
		let family = spec.font_family.as_deref().unwrap_or(default_family);
		let line_height = font_size * LINE_HEIGHT;

		let texts: Vec<&str> = spec.content.split('\n').collect();
		let block_height = texts.len() as f64 * line_height;
		let top = (height - block_height) / 2.0 + line_height / 2.0;
		let lines = texts
			.into_iter()
			.enumerate()
			.map(|(i, text)| TextLine {
				text: text.to_string(),
				x: width / 2.0,
				y: top + i as f64 * line_height,
			})
			.collect();

		Self {
			font_size,
			font: format!("{font_size}px {family}"),
			fill_style: spec
				.color
				.clone()
				.unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_css()),
			line_height,
			lines,
			dpr,
		}
	}
}

/// Logical rectangle an image is drawn into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

/// Scales an `image_w`×`image_h` image to honor the shape's size caps and the
/// canvas bounds, then centers it. `None` for zero-sized images.
pub fn image_placement(
	width: f64,
	height: f64,
	image_w: u32,
	image_h: u32,
	spec: &ImageSpec,
) -> Option<Placement> {
	if image_w == 0 || image_h == 0 {
		return None;
	}
	let (iw, ih) = (image_w as f64, image_h as f64);

	let cap = |max: Option<f64>, size: f64| match max {
		Some(m) if m > 0.0 => m / size,
		_ => f64::INFINITY,
	};
	let user_scale = cap(spec.max_width, iw).min(cap(spec.max_height, ih));
	let fit_scale = (width / iw).min(height / ih);
	let scale = user_scale.min(fit_scale);

	let (sw, sh) = (iw * scale, ih * scale);
	Some(Placement {
		x: (width - sw) / 2.0,
		y: (height - sh) / 2.0,
		width: sw,
		height: sh,
	})
}

/// Transparent raster for a `width`×`height` logical canvas at `dpr`, or
/// `None` when the canvas has no area.
pub fn offscreen_raster(width: f64, height: f64, dpr: f64) -> Option<RgbaImage> {
	let (w, h) = ((width * dpr).round(), (height * dpr).round());
	if !(w.is_finite() && h.is_finite()) || w < 1.0 || h < 1.0 {
		return None;
	}
	Some(RgbaImage::new(w as u32, h as u32))
}

/// Decodes PNG or JPEG bytes into an RGBA raster.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, DotimationError> {
	Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// A shape ready to be rasterized: text, or an image that is already decoded.
#[derive(Clone, Copy, Debug)]
pub enum Shape<'a> {
	Text(&'a TextSpec),
	Image(&'a ImageSpec, &'a RgbaImage),
}

/// Samples shapes for one logical canvas size and set of options.
#[derive(Clone, Debug)]
pub struct Sampler {
	pub width: f64,
	pub height: f64,
	pub dpr: f64,
	pub point_spacing: f64,
	pub alpha_threshold: u8,
	pub default_font_family: String,
	pub color_override: Option<Rgb>,
}

impl Sampler {
	pub fn new(width: f64, height: f64, dpr: f64, options: &DotimationOptions) -> Self {
		Self {
			width,
			height,
			dpr: capped_device_pixel_ratio(dpr),
			point_spacing: options.point_spacing,
			alpha_threshold: options.alpha_threshold,
			default_font_family: options.default_font_family.clone(),
			color_override: options.override_color(),
		}
	}

	/// Rasterizes `shape` and returns its samples in shuffled order.
	///
	/// A canvas without area yields no samples rather than an error.
	pub fn sample<T, R>(
		&self,
		shape: Shape<'_>,
		rasterizer: &mut T,
		rng: &mut R,
	) -> Result<Vec<Sample>, DotimationError>
	where
		T: TextRasterizer + ?Sized,
		R: Rng + ?Sized,
	{
		match shape {
			Shape::Text(spec) => self.sample_text(spec, rasterizer, rng),
			Shape::Image(spec, image) => Ok(self.sample_image(spec, image, rng)),
		}
	}

	pub fn sample_text<T, R>(
		&self,
		spec: &TextSpec,
		rasterizer: &mut T,
		rng: &mut R,
	) -> Result<Vec<Sample>, DotimationError>
	where
		T: TextRasterizer + ?Sized,
		R: Rng + ?Sized,
	{
		let Some(mut raster) = offscreen_raster(self.width, self.height, self.dpr) else {
			return Ok(Vec::new());
		};
		let layout = TextLayout::new(
			self.width,
			self.height,
			self.dpr,
			spec,
			&self.default_font_family,
		);
		rasterizer.fill_text(&mut raster, &layout)?;
		Ok(self.scan(&raster, rng))
	}

	pub fn sample_image<R: Rng + ?Sized>(
		&self,
		spec: &ImageSpec,
		image: &RgbaImage,
		rng: &mut R,
	) -> Vec<Sample> {
		let Some(mut raster) = offscreen_raster(self.width, self.height, self.dpr) else {
			return Vec::new();
		};
		let (iw, ih) = image.dimensions();
		let Some(place) = image_placement(self.width, self.height, iw, ih, spec) else {
			return Vec::new();
		};

		let (dw, dh) = ((place.width * self.dpr).round(), (place.height * self.dpr).round());
		if dw >= 1.0 && dh >= 1.0 {
			let mut scaled = imageops::resize(image, dw as u32, dh as u32, FilterType::Nearest);
			if spec.invert {
				imageops::invert(&mut scaled);
			}
			let (dx, dy) = ((place.x * self.dpr).round(), (place.y * self.dpr).round());
			imageops::replace(&mut raster, &scaled, dx as i64, dy as i64);
		}

		self.scan(&raster, rng)
	}

	/// Thresholded samples of `raster`, shuffled.
	pub fn scan<R: Rng + ?Sized>(&self, raster: &RgbaImage, rng: &mut R) -> Vec<Sample> {
		let mut samples = self.scan_ordered(raster);
		samples.shuffle(rng);
		samples
	}

	/// Thresholded samples of `raster` in row-major scan order.
	pub fn scan_ordered(&self, raster: &RgbaImage) -> Vec<Sample> {
		let stride = ((self.point_spacing * self.dpr).round() as usize).max(1);
		let (w, h) = raster.dimensions();
		let mut samples = Vec::new();

		for y in (0..h).step_by(stride) {
			for x in (0..w).step_by(stride) {
				let [r, g, b, a] = raster.get_pixel(x, y).0;
				if a <= self.alpha_threshold {
					continue;
				}
				let color = self.color_override.unwrap_or(Rgb::new(r, g, b));
				samples.push(Sample {
					x: x as f64 / self.dpr,
					y: y as f64 / self.dpr,
					r: color.r,
					g: color.g,
					b: color.b,
				});
			}
		}
		samples
	}
}

/// Stand-in font engine for tests: each glyph is a solid box.
#[cfg(test)]
pub(crate) mod testing {
	use image::Rgba;

	use super::*;

	/// Fills a box per glyph, 0.6 em wide and 0.7 em tall, centered on each line.
	pub struct BlockRasterizer;

	impl TextRasterizer for BlockRasterizer {
		fn fill_text(
			&mut self,
			raster: &mut RgbaImage,
			layout: &TextLayout,
		) -> Result<(), DotimationError> {
			let fill = Rgb::parse_css(&layout.fill_style).unwrap_or(DEFAULT_TEXT_COLOR);
			let (w, h) = raster.dimensions();
			for line in &layout.lines {
				let glyphs = line.text.chars().count() as f64;
				let half_w = glyphs * 0.6 * layout.font_size / 2.0;
				let half_h = 0.35 * layout.font_size;
				let x0 = ((line.x - half_w) * layout.dpr).max(0.0) as u32;
				let x1 = (((line.x + half_w) * layout.dpr).max(0.0) as u32).min(w);
				let y0 = ((line.y - half_h) * layout.dpr).max(0.0) as u32;
				let y1 = (((line.y + half_h) * layout.dpr).max(0.0) as u32).min(h);
				for y in y0..y1 {
					for x in x0..x1 {
						raster.put_pixel(x, y, Rgba([fill.r, fill.g, fill.b, 255]));
					}
				}
			}
			Ok(())
		}
	}
}
