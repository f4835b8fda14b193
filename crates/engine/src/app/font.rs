//! 3x5 bitmap font covering printable ASCII.

pub(crate) const GLYPH_WIDTH: u32 = 3;
pub(crate) const GLYPH_HEIGHT: u32 = 5;

/// Horizontal advance in glyph cells, including one cell of spacing.
const ADVANCE_CELLS: f32 = (GLYPH_WIDTH + 1) as f32;
/// Vertical advance in glyph cells, including two cells of leading.
const LINE_CELLS: f32 = (GLYPH_HEIGHT + 2) as f32;

// Five 3-bit rows packed top row first; high bit is the left column.
const GLYPHS: [u16; 95] = [
    0x0000, 0x2482, 0x5a00, 0x5f7d, 0x7ddf, 0x52a5, 0x2aab, 0x2400,
    0x1491, 0x4494, 0x0aa8, 0x05d0, 0x0014, 0x01c0, 0x0002, 0x12a4,
    0x7b6f, 0x2c97, 0x73e7, 0x73cf, 0x5bc9, 0x79cf, 0x79ef, 0x7292,
    0x7bef, 0x7bcf, 0x0410, 0x0414, 0x1511, 0x0e38, 0x4454, 0x72c2,
    0x7be7, 0x2bed, 0x6bae, 0x7927, 0x6b6e, 0x79a7, 0x79a4, 0x796f,
    0x5bed, 0x7497, 0x726f, 0x5bad, 0x4927, 0x5fed, 0x5ffd, 0x7b6f,
    0x6ba4, 0x7b79, 0x6bad, 0x79cf, 0x7492, 0x5b6f, 0x5b6a, 0x5bfd,
    0x5aad, 0x5a92, 0x72a7, 0x6926, 0x4889, 0x324b, 0x2a00, 0x0007,
    0x4400, 0x0e7f, 0x49ae, 0x0f27, 0x13ef, 0x0fa7, 0x39a4, 0x0f79,
    0x49ad, 0x2092, 0x106a, 0x4bad, 0x4927, 0x0ded, 0x0d6d, 0x0f6f,
    0x0d74, 0x0f79, 0x0d64, 0x0f8f, 0x2e93, 0x0b6f, 0x0b6a, 0x0b7a,
    0x0a95, 0x0b79, 0x0e57, 0x3593, 0x2492, 0x64d6, 0x0780,
];

/// Unknown characters draw as `?`.
pub(crate) fn glyph_bits(ch: char) -> u16 {
    let code = ch as u32;
    if (32..=126).contains(&code) {
        GLYPHS[(code - 32) as usize]
    } else {
        GLYPHS[('?' as u32 - 32) as usize]
    }
}

pub(crate) fn glyph_cell_lit(bits: u16, row: u32, col: u32) -> bool {
    if row >= GLYPH_HEIGHT || col >= GLYPH_WIDTH {
        return false;
    }
    let shift = (GLYPH_HEIGHT - 1 - row) * GLYPH_WIDTH + (GLYPH_WIDTH - 1 - col);
    bits & (1 << shift) != 0
}

pub(crate) fn advance_px(cell_size: f32) -> f32 {
    ADVANCE_CELLS * cell_size
}

pub(crate) fn line_advance_px(cell_size: f32) -> f32 {
    LINE_CELLS * cell_size
}

/// Greedy word wrap; words longer than the wrap width get a line of their own.
pub(crate) fn wrap_lines(content: &str, cell_size: f32, wrap_width: Option<f32>) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in content.split('\n') {
        let Some(wrap_width) = wrap_width.filter(|width| *width > 0.0) else {
            lines.push(paragraph.to_string());
            continue;
        };
        let max_chars = ((wrap_width + cell_size) / advance_px(cell_size))
            .floor()
            .max(1.0) as usize;
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        lines.push(current);
    }
    lines
}

/// Unscaled size of laid-out text in pixels.
pub(crate) fn measure_lines(lines: &[String], cell_size: f32) -> (f32, f32) {
    let longest = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    if longest == 0 && lines.len() <= 1 {
        return (0.0, GLYPH_HEIGHT as f32 * cell_size);
    }
    let width = (longest as f32 * advance_px(cell_size) - cell_size).max(0.0);
    let height = lines.len().max(1) as f32 * line_advance_px(cell_size) - 2.0 * cell_size;
    (width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_printable_ascii_char_except_space_has_pixels() {
        for code in 33u8..=126u8 {
            assert_ne!(glyph_bits(char::from(code)), 0, "blank glyph for {code}");
        }
        assert_eq!(glyph_bits(' '), 0);
    }

    #[test]
    fn non_ascii_falls_back_to_question_mark() {
        assert_eq!(glyph_bits('\u{e9}'), glyph_bits('?'));
    }

    #[test]
    fn cell_lookup_reads_rows_top_down() {
        let bits = glyph_bits('T');
        assert!(glyph_cell_lit(bits, 0, 0));
        assert!(glyph_cell_lit(bits, 0, 2));
        assert!(!glyph_cell_lit(bits, 4, 0));
        assert!(glyph_cell_lit(bits, 4, 1));
        assert!(!glyph_cell_lit(bits, 5, 1));
    }

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        let lines = wrap_lines("aaa bbb ccc", 1.0, Some(31.0));
        assert_eq!(lines, vec!["aaa bbb".to_string(), "ccc".to_string()]);
        assert_eq!(wrap_lines("no wrap here", 1.0, None).len(), 1);
    }

    #[test]
    fn measure_counts_longest_line_and_line_count() {
        let lines = vec!["ab".to_string(), "abcd".to_string()];
        let (width, height) = measure_lines(&lines, 2.0);
        assert_eq!(width, 4.0 * 8.0 - 2.0);
        assert_eq!(height, 2.0 * 14.0 - 4.0);
    }
}
