//! Software compositing of particles into an RGBA pixel buffer.
//!
//! Every frame the buffer is cleared to transparent, each particle is blended
//! into the single device pixel under it (active pool first, then fading),
//! and the finished buffer is handed to a [`Surface`] in one blit.

use image::{Rgba, RgbaImage};

use super::particles::{Particle, ParticleSet};

/// Something a finished frame can be shown on.
pub trait Surface {
	/// Backing store size in device pixels.
	fn device_size(&self) -> (u32, u32);

	/// Shows `frame`, whose dimensions equal [`Surface::device_size`].
	fn present(&mut self, frame: &RgbaImage);
}

/// Source-over blend of one straight-alpha color onto `dst`.
///
/// `src` channels are in `0..=255` (out-of-range values are clamped) and
/// `alpha` in `[0, 1]`.
pub fn blend_over(dst: &mut Rgba<u8>, src: [f64; 3], alpha: f64) {
	let sa = alpha.clamp(0.0, 1.0);
	let da = dst[3] as f64 / 255.0;
	let out_a = sa + da * (1.0 - sa);

	let mut out = [0.0; 3];
	if out_a > 0.0 {
		for (c, out_c) in out.iter_mut().enumerate() {
			let s = src[c].clamp(0.0, 255.0) / 255.0;
			let d = dst[c] as f64 / 255.0;
			*out_c = (s * sa + d * da * (1.0 - sa)) / out_a;
		}
	}

	*dst = Rgba([
		(out[0] * 255.0).round() as u8,
		(out[1] * 255.0).round() as u8,
		(out[2] * 255.0).round() as u8,
		(out_a * 255.0).round() as u8,
	]);
}

/// Owns the frame buffer and draws particle pools into it.
pub struct Compositor {
	frame: RgbaImage,
	dpr: f64,
}

impl Compositor {
	/// A compositor for a `width`×`height` device-pixel surface whose
	/// logical coordinates are scaled by `dpr`.
	pub fn new(width: u32, height: u32, dpr: f64) -> Self {
		Self {
			frame: RgbaImage::new(width, height),
			dpr,
		}
	}

	/// Reallocates the buffer, but only when the dimensions change.
	pub fn resize(&mut self, width: u32, height: u32) {
		if self.frame.dimensions() != (width, height) {
			self.frame = RgbaImage::new(width, height);
		}
	}

	/// Clears the buffer and composites every particle into it.
	pub fn render(&mut self, set: &ParticleSet) -> &RgbaImage {
		self.frame.fill(0);
		for p in set.iter() {
			self.draw_point(p);
		}
		&self.frame
	}

	/// Renders `set` and blits the result to `surface`.
	pub fn present<S: Surface>(&mut self, set: &ParticleSet, surface: &mut S) {
		let (w, h) = surface.device_size();
		self.resize(w, h);
		self.render(set);
		surface.present(&self.frame);
	}

	fn draw_point(&mut self, p: &Particle) {
		let alpha = p.opacity.clamp(0.0, 1.0);
		if alpha.is_nan() || alpha <= 0.0 {
			return;
		}

		let (w, h) = self.frame.dimensions();
		let (x, y) = ((p.x * self.dpr).round(), (p.y * self.dpr).round());
		let in_bounds = (0.0..w as f64).contains(&x) && (0.0..h as f64).contains(&y);
		if !in_bounds {
			return;
		}

		let dst = self.frame.get_pixel_mut(x as u32, y as u32);
		blend_over(dst, [p.r, p.g, p.b], alpha);
	}
}
