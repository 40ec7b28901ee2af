//! # Text Measurement
//!
//! Line wrapping and height measurement for parts.
//!
//! The reflow engine and the renderer both need to know how tall a piece of
//! text is at a given width *before* anything is drawn, and they must agree
//! exactly. Measurement here is deterministic: a built-in advance-width
//! table (Helvetica metrics, 1/1000 em units) plus greedy UAX#14 line
//! breaking. No font files, no canvas round-trips.

use crate::style::ResolvedPartStyle;
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// Advance widths for ASCII 0x20..=0x7E, regular weight, in 1/1000 em.
#[rustfmt::skip]
const WIDTHS_REGULAR: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278,
    584, 584, 584, 556, 1015, 667, 667, 722, 722, 667, 611, 778, 722, 278,
    500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556,
    278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500,
    278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Advance widths for ASCII 0x20..=0x7E, bold (weight ≥ 600), in 1/1000 em.
#[rustfmt::skip]
const WIDTHS_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333,
    584, 584, 584, 611, 975, 722, 722, 722, 722, 667, 611, 778, 722, 278,
    556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556,
    333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556,
    333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Fallback advance for characters outside the table (roughly an average
/// glyph).
const DEFAULT_ADVANCE: u16 = 556;

/// One wrapped line.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub width: f64,
}

/// Result of measuring a part's text at a content width.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredText {
    pub lines: Vec<Line>,
    /// Total height in px: `lines.len() * line_height_px`. Never zero —
    /// empty text still occupies one line so a cleared field doesn't
    /// collapse the layout.
    pub height: f64,
    pub widest_line: f64,
}

/// Deterministic text measurer shared by reflow and rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextMeasurer;

impl TextMeasurer {
    pub fn new() -> Self {
        Self
    }

    /// Advance width of one character in px.
    pub fn char_width(&self, ch: char, style: &ResolvedPartStyle) -> f64 {
        let table = if style.font_weight >= 600 {
            &WIDTHS_BOLD
        } else {
            &WIDTHS_REGULAR
        };
        let units = match ch as u32 {
            0x20..=0x7E => table[(ch as usize) - 0x20],
            _ => DEFAULT_ADVANCE,
        };
        (units as f64 / 1000.0) * style.font_size + style.letter_spacing
    }

    /// Width of a string on a single line, in px.
    pub fn measure_width(&self, text: &str, style: &ResolvedPartStyle) -> f64 {
        text.chars().map(|ch| self.char_width(ch, style)).sum()
    }

    /// Break text into lines that fit within `max_width`, greedy with UAX#14
    /// break opportunities. A word wider than the line is hard-broken rather
    /// than overflowing.
    pub fn wrap(&self, text: &str, max_width: f64, style: &ResolvedPartStyle) -> Vec<Line> {
        if text.is_empty() {
            return vec![Line {
                text: String::new(),
                width: 0.0,
            }];
        }
        // Degenerate width: fall back to a single unwrapped line instead of
        // producing one line per character.
        if max_width <= 0.0 {
            return vec![Line {
                text: text.to_string(),
                width: self.measure_width(text, style),
            }];
        }

        let chars: Vec<char> = text.chars().collect();
        let char_widths: Vec<f64> = chars.iter().map(|&ch| self.char_width(ch, style)).collect();
        let break_opps = compute_break_opportunities(text);

        let mut lines = Vec::new();
        let mut line_start = 0usize;
        let mut line_width = 0.0f64;
        let mut last_break_point: Option<usize> = None;

        let mut i = 0;
        while i < chars.len() {
            let ch = chars[i];

            // A break *before* char[i] means the previous line may end at
            // char[i-1].
            if i > 0 {
                match break_opps[i] {
                    Some(BreakOpportunity::Mandatory) => {
                        let end = if matches!(chars[i - 1], '\n' | '\r' | '\u{2028}' | '\u{2029}') {
                            i - 1
                        } else {
                            i
                        };
                        lines.push(make_line(&chars[line_start..end], &char_widths[line_start..end]));
                        line_start = i;
                        line_width = 0.0;
                        last_break_point = None;
                    }
                    Some(BreakOpportunity::Allowed) => {
                        last_break_point = Some(i - 1);
                    }
                    None => {}
                }
            }

            // Mandatory-break control chars never land on a line.
            if matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}') {
                i += 1;
                continue;
            }

            let char_width = char_widths[i];
            if line_width + char_width > max_width && line_start < i {
                // Overflow: break at the last opportunity, or hard-break here.
                let break_at = match last_break_point {
                    Some(bp) if bp >= line_start => bp + 1,
                    _ => i,
                };
                lines.push(make_line(
                    &chars[line_start..break_at],
                    &char_widths[line_start..break_at],
                ));
                line_start = break_at;
                // Re-run the overflow check for the current char against the
                // carried-over remainder; a remainder that still can't take
                // it gets hard-broken instead of flushing overwide.
                line_width = char_widths[line_start..i].iter().sum();
                last_break_point = None;
                continue;
            }

            line_width += char_width;
            i += 1;
        }

        if line_start < chars.len() || lines.is_empty() {
            lines.push(make_line(&chars[line_start..], &char_widths[line_start..]));
        }
        lines
    }

    /// Measure a part's text at a content width. Empty text still measures
    /// one line tall; a degenerate width degrades to the single-line
    /// estimate instead of aborting the reflow pass.
    pub fn measure(&self, text: &str, max_width: f64, style: &ResolvedPartStyle) -> MeasuredText {
        let lines = self.wrap(text, max_width, style);
        let line_count = lines.len().max(1);
        let widest_line = lines.iter().map(|l| l.width).fold(0.0f64, f64::max);
        MeasuredText {
            height: line_count as f64 * style.line_height_px(),
            widest_line,
            lines,
        }
    }
}

fn make_line(chars: &[char], widths: &[f64]) -> Line {
    // Trailing whitespace hangs outside the measure, matching what a canvas
    // text node reports.
    let mut end = chars.len();
    while end > 0 && chars[end - 1].is_whitespace() {
        end -= 1;
    }
    Line {
        text: chars[..end].iter().collect(),
        width: widths[..end].iter().sum(),
    }
}

/// Compute UAX#14 break opportunities indexed by char position. Entry `i` is
/// the opportunity *before* char `i`; index 0 is always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    let byte_to_char: Vec<usize> = {
        let mut map = vec![0usize; text.len() + 1];
        let mut char_idx = 0;
        for (byte_idx, _) in text.char_indices() {
            map[byte_idx] = char_idx;
            char_idx += 1;
        }
        map[text.len()] = char_idx;
        map
    };

    // linebreaks() yields (byte_offset, opportunity) where the offset is the
    // start of the next segment. An offset of text.len() means "break at
    // end", which we ignore.
    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}
