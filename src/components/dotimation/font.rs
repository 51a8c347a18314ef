//! Content-aware font sizing for text shapes.
//!
//! Rasterized text has to fit the canvas width without measuring glyphs, so
//! each character is charged an estimated advance in em units and the font
//! size is solved from `font_size * em_total ≈ width`.

use super::types::{AutoFontSize, FontSizeMode};

/// Smallest font size ever returned, in logical pixels.
pub const MIN_FONT_SIZE: f64 = 10.0;
/// Largest font size ever returned, in logical pixels.
pub const MAX_FONT_SIZE: f64 = 300.0;

/// Advance of one monospace glyph in em.
const MONO_CHAR_WIDTH: f64 = 0.65;

/// Estimated glyph advances, in em.
mod em {
	pub const LIGHT: f64 = 0.54; // a-z
	pub const HEAVY: f64 = 0.78; // M, W
	pub const UPPER_NUM: f64 = 0.66; // A-Z, 0-9
	pub const SPACE: f64 = 0.3;
	pub const PUNCT: f64 = 0.38;
	pub const CJK: f64 = 1.0;
	pub const EMOJI: f64 = 1.1;
	pub const AVG: f64 = 0.6;
}

/// Resolves the font size for `text` drawn into a canvas `width` logical
/// pixels wide.
pub fn font_size(mode: FontSizeMode, width: f64, text: &str) -> f64 {
	match mode {
		FontSizeMode::Fixed(px) => px,
		FontSizeMode::Auto(AutoFontSize::Proportional) => auto_font_size(width, text),
		FontSizeMode::Auto(AutoFontSize::Monospace) => monospace_font_size(width, text),
	}
}

/// Largest size at which every line of `text` fits, using per-glyph classes.
///
/// Empty lines do not constrain the size; whitespace-only lines do. Always within
/// `[MIN_FONT_SIZE, MAX_FONT_SIZE]`.
pub fn auto_font_size(width: f64, text: &str) -> f64 {
	text.split('\n')
		.filter(|line| !line.is_empty())
		.map(|line| line_font_size(width, line))
		.reduce(f64::min)
		.unwrap_or(MIN_FONT_SIZE)
}

/// Font size for a monospace font, from the longest line's glyph count.
///
/// Very short strings blend toward a square-root/log curve of the width so a
/// single character does not fill the whole canvas.
pub fn monospace_font_size(width: f64, text: &str) -> f64 {
	if text.is_empty() || !width.is_finite() || width <= 0.0 {
		return MIN_FONT_SIZE;
	}

	let glyphs = text
		.split('\n')
		.map(|line| line.chars().count())
		.max()
		.unwrap_or(0);
	if glyphs == 0 {
		return MIN_FONT_SIZE;
	}

	let direct = width / (glyphs as f64 * MONO_CHAR_WIDTH);
	let soft = (width * 8.0).sqrt() + (width * 2.0).ln_1p();
	let blend = (glyphs as f64 / 5.0).min(1.0);

	clamp_font_size(direct * blend + soft * (1.0 - blend))
}

fn line_font_size(width: f64, line: &str) -> f64 {
	if line.is_empty() || !width.is_finite() || width <= 0.0 {
		return MIN_FONT_SIZE;
	}

	let (em_total, count) = line
		.chars()
		.fold((0.0, 0usize), |(em, n), ch| (em + glyph_em(ch), n + 1));
	if count == 0 || em_total == 0.0 {
		return MIN_FONT_SIZE;
	}

	// Short strings are padded so one or two glyphs don't balloon.
	let padding = (6usize.saturating_sub(count)).max(1) as f64 * 0.15;
	clamp_font_size(width / (em_total * (1.0 + padding)))
}

fn clamp_font_size(px: f64) -> f64 {
	if px.is_finite() {
		px.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
	} else {
		MIN_FONT_SIZE
	}
}

fn glyph_em(ch: char) -> f64 {
	if ch.is_ascii() {
		match ch {
			' ' => em::SPACE,
			'.' | ',' | ';' | ':' | '!' | '?' | '\'' | '"' | '`' | '-' | '_' | '/' | '\\' => {
				em::PUNCT
			}
			'M' | 'W' => em::HEAVY,
			'A'..='Z' | '0'..='9' => em::UPPER_NUM,
			'a'..='z' => em::LIGHT,
			_ => em::AVG,
		}
	} else if is_emoji(ch as u32) {
		em::EMOJI
	} else if is_cjk(ch as u32) {
		em::CJK
	} else {
		em::AVG
	}
}

fn is_emoji(cp: u32) -> bool {
	matches!(
		cp,
		0x1F300..=0x1F9FF // pictographs, emoticons, transport, supplemental
			| 0x1FA00..=0x1FAFF // extended pictographs
			| 0x2600..=0x26FF // misc symbols
			| 0x2700..=0x27BF // dingbats
			| 0x1F000..=0x1F02F // mahjong, domino
			| 0x1F0A0..=0x1F0FF // playing cards
			| 0xFE00..=0xFE0F // variation selectors
	)
}

fn is_cjk(cp: u32) -> bool {
	matches!(
		cp,
		0x4E00..=0x9FFF // unified ideographs
			| 0x3400..=0x4DBF // extension A
			| 0x20000..=0x2A6DF // extension B
			| 0x3040..=0x309F // hiragana
			| 0x30A0..=0x30FF // katakana
			| 0xAC00..=0xD7AF // hangul syllables
			| 0x1100..=0x11FF // hangul jamo
	)
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;

	use super::*;

	#[test]
	fn degenerate_input_returns_minimum() {
		assert_eq!(auto_font_size(500.0, ""), MIN_FONT_SIZE);
		assert_eq!(auto_font_size(0.0, "Hello"), MIN_FONT_SIZE);
		assert_eq!(auto_font_size(-20.0, "Hello"), MIN_FONT_SIZE);
		assert_eq!(auto_font_size(f64::NAN, "Hello"), MIN_FONT_SIZE);
		assert_eq!(auto_font_size(f64::INFINITY, "Hello"), MIN_FONT_SIZE);
		assert_eq!(monospace_font_size(0.0, "Hello"), MIN_FONT_SIZE);
		assert_eq!(monospace_font_size(500.0, ""), MIN_FONT_SIZE);
		assert_eq!(monospace_font_size(500.0, "\n\n"), MIN_FONT_SIZE);
	}

	#[test]
	fn wide_glyphs_get_smaller_sizes() {
		let light = auto_font_size(400.0, "iiiiiiii");
		let heavy = auto_font_size(400.0, "MMMMMMMM");
		let cjk = auto_font_size(400.0, "漢字漢字漢字漢字");
		assert!(heavy < light);
		assert!(cjk < heavy);
	}

	#[test]
	fn short_strings_are_padded() {
		// "Hi": em = 0.66 + 0.54 = 1.2, padding = 4 * 0.15 = 0.6
		let size = auto_font_size(192.0, "Hi");
		assert!((size - 192.0 / (1.2 * 1.6)).abs() < 1e-9);
	}

	#[test]
	fn longest_line_sets_the_size() {
		let block = auto_font_size(600.0, "Hello\nA much longer second line");
		let long_line = auto_font_size(600.0, "A much longer second line");
		assert_eq!(block, long_line);
	}

	#[test]
	fn blank_lines_do_not_force_minimum() {
		assert_eq!(
			auto_font_size(600.0, "Hello\n\nWorld"),
			auto_font_size(600.0, "Hello\nWorld")
		);
	}

	#[test]
	fn whitespace_lines_are_sized_by_space_width() {
		let spaces = " ".repeat(40);
		let with_spaces = auto_font_size(600.0, &format!("Hi\n{spaces}"));
		assert!((with_spaces - 600.0 / (40.0 * em::SPACE * 1.15)).abs() < 1e-9);
		assert!(with_spaces < auto_font_size(600.0, "Hi"));
	}

	#[test]
	fn fixed_mode_is_passed_through() {
		assert_eq!(font_size(FontSizeMode::Fixed(37.5), 100.0, "anything"), 37.5);
	}

	#[test]
	fn monospace_uses_longest_line_count() {
		// 10 glyphs, blend = 1 so the direct estimate is used.
		let size = monospace_font_size(650.0, "abc\n0123456789");
		assert!((size - 100.0).abs() < 1e-9);
	}

	proptest! {
		#[test]
		fn auto_size_is_bounded_and_monotone_in_width(
			text in "[a-zA-Z0-9 .!MW漢😀\n]{0,24}",
			width in 0.0f64..4000.0,
			extra in 0.0f64..4000.0,
		) {
			for size_of in [auto_font_size, monospace_font_size] {
				let narrow = size_of(width, &text);
				let wide = size_of(width + extra, &text);
				prop_assert!((MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&narrow));
				prop_assert!((MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&wide));
				prop_assert!(wide >= narrow);
			}
		}
	}
}
