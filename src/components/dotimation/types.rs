//! Shape descriptions accepted from the host and the samples produced from them.

use serde::Deserialize;

/// What the particles should form.
///
/// Deserialized from the host's JSON as `{"type": "text", ...}` or
/// `{"type": "image", ...}`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeSpec {
	/// Rasterized text, optionally spanning several `\n`-separated lines.
	Text(TextSpec),
	/// A decoded image, scaled to fit and centered.
	Image(ImageSpec),
}

impl ShapeSpec {
	/// Shorthand for a text shape with automatic font sizing.
	pub fn text(content: impl Into<String>) -> Self {
		Self::Text(TextSpec {
			content: content.into(),
			..TextSpec::default()
		})
	}

	/// Shorthand for an image shape with no size caps.
	pub fn image(source: impl Into<String>) -> Self {
		Self::Image(ImageSpec {
			source: source.into(),
			..ImageSpec::default()
		})
	}
}

/// Text shape parameters.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSpec {
	/// Text to render. Lines are split on `\n`.
	#[serde(alias = "data")]
	pub content: String,
	/// CSS font family. Falls back to the session's default family.
	pub font_family: Option<String>,
	/// Explicit pixel size or one of the automatic policies.
	#[serde(default, alias = "fontSize")]
	pub font_size_mode: FontSizeMode,
	/// CSS fill color (e.g. `"#ff8800"` or `"rgb(255, 136, 0)"`).
	#[serde(alias = "textColor")]
	pub color: Option<String>,
}

/// Image shape parameters.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
	/// Image URI handed to the image loader.
	#[serde(alias = "data")]
	pub source: String,
	/// Optional cap on the drawn width in logical pixels.
	pub max_width: Option<f64>,
	/// Optional cap on the drawn height in logical pixels.
	pub max_height: Option<f64>,
	/// Invert the RGB channels before sampling.
	#[serde(default)]
	pub invert: bool,
}

/// How the font size of a text shape is chosen.
///
/// On the wire this is either a number or one of the strings `"AUTO"` and
/// `"AUTO_MONO"`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FontSizeMode {
	/// Fixed size in logical pixels.
	Fixed(f64),
	/// Size estimated from the content.
	Auto(AutoFontSize),
}

impl Default for FontSizeMode {
	fn default() -> Self {
		Self::Auto(AutoFontSize::Proportional)
	}
}

/// Automatic font-size estimators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum AutoFontSize {
	/// Per-glyph width classes, for proportional fonts.
	#[serde(rename = "AUTO")]
	Proportional,
	/// Fixed per-glyph advance, for monospace fonts.
	#[serde(rename = "AUTO_MONO")]
	Monospace,
}

/// One particle seed: a logical position and the raster color found there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
	pub x: f64,
	pub y: f64,
	pub r: u8,
	pub g: u8,
	pub b: u8,
}
