//! RGB colors and CSS color parsing for text fills and color overrides.

/// 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
	pub r: u8,
	pub g: u8,
	pub b: u8,
}

impl Rgb {
	pub const fn new(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b }
	}

	/// Parses a CSS color string.
	///
	/// Supports `#rgb`, `#rrggbb` and `rgb()`/`rgba()` functional notation.
	/// Alpha is ignored. Returns `None` for anything else (named colors,
	/// gradients), leaving the caller to pick a fallback.
	pub fn parse_css(color_str: &str) -> Option<Self> {
		let s = color_str.trim();
		if let Some(hex) = s.strip_prefix('#') {
			if !hex.is_ascii() {
				return None;
			}
			return match hex.len() {
				3 => {
					let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok();
					let (r, g, b) = (digit(0)?, digit(1)?, digit(2)?);
					Some(Self::new(r * 17, g * 17, b * 17))
				}
				6 => {
					let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
					Some(Self::new(byte(0)?, byte(2)?, byte(4)?))
				}
				_ => None,
			};
		}

		let inner = s
			.strip_prefix("rgba(")
			.or_else(|| s.strip_prefix("rgb("))?
			.strip_suffix(')')?;
		let mut nums = inner.split(',').map(|n| n.trim().parse::<f64>().ok());
		let channel =
			|v: Option<Option<f64>>| v.flatten().map(|c| c.round().clamp(0.0, 255.0) as u8);
		let r = channel(nums.next())?;
		let g = channel(nums.next())?;
		let b = channel(nums.next())?;
		Some(Self::new(r, g, b))
	}

	/// Formats as `#rrggbb` for canvas fill styles.
	pub fn to_css(self) -> String {
		format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
	}
}
