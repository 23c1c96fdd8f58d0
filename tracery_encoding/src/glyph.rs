// Copyright 2024 the Tracery Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Procedural glyphs drawn as a few strokes each.
//!
//! Every glyph is drawn in a unit cell with the baseline at `y = 0`, the
//! x-height at `0.6` and ascenders at `1.0`; descenders reach down to `-0.35`.
//! Text layout scales the cell horizontally to the glyph advance.

use std::ops::Range;

use crate::fit::Fit;
use crate::{Coordinate, GroupBuilder, TransformPatch};

/// Number of glyph advances a tab moves the cursor.
const TAB_ADVANCES: f64 = 4.0;

/// Layout parameters for [`GroupBuilder::text`], in local units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TextOptions {
    /// Scale applied to the whole run.
    pub size: f64,
    /// Width of one glyph cell.
    pub advance: f64,
    /// Gap between consecutive glyph cells.
    pub spacing: f64,
    /// Distance between baselines.
    pub line_height: f64,
    /// Fit applied to the whole run once it is laid out.
    pub fit: Option<Fit>,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            size: 1.0,
            advance: 0.5,
            spacing: 0.1,
            line_height: 1.4,
            fit: None,
        }
    }
}

type DrawGlyph = fn(&mut GroupBuilder);

/// The drawing routine of a character, if it has one.
///
/// Uppercase letters share the lowercase glyphs.
pub fn glyph(c: char) -> Option<DrawGlyph> {
    let draw: DrawGlyph = match c.to_ascii_lowercase() {
        'a' => |b| {
            b.new_curve([
                (0.85, 0.45),
                (0.5, 0.65),
                (0.1, 0.4),
                (0.15, 0.05),
                (0.55, 0.0),
                (0.85, 0.25),
            ]);
            b.new_curve([(0.85, 0.6), (0.85, 0.0)]);
        },
        'b' => |b| {
            b.new_curve([(0.1, 1.0), (0.1, 0.0)]);
            b.new_curve([(0.1, 0.45), (0.5, 0.65), (0.9, 0.3), (0.5, 0.0), (0.1, 0.1)]);
        },
        'c' => |b| {
            b.new_curve([(0.9, 0.5), (0.5, 0.65), (0.1, 0.3), (0.5, 0.0), (0.9, 0.1)]);
        },
        'd' => |b| {
            b.new_curve([(0.9, 1.0), (0.9, 0.0)]);
            b.new_curve([(0.9, 0.45), (0.5, 0.65), (0.1, 0.3), (0.5, 0.0), (0.9, 0.1)]);
        },
        'e' => |b| {
            b.new_curve([
                (0.1, 0.33),
                (0.9, 0.33),
                (0.7, 0.65),
                (0.1, 0.45),
                (0.3, 0.0),
                (0.9, 0.1),
            ]);
        },
        'f' => |b| {
            let stem = b.new_curve([(0.35, 0.0), (0.35, 0.8), (0.6, 1.0), (0.85, 0.9)]);
            let cross = b.intersect(stem, 0.45);
            b.new_curve([(0.1, cross.y), (0.7, cross.y)]);
        },
        'g' => |b| {
            b.new_curve([(0.9, 0.5), (0.5, 0.65), (0.1, 0.4), (0.5, 0.15), (0.9, 0.35)]);
            b.new_curve([(0.9, 0.6), (0.9, -0.1), (0.5, -0.35), (0.1, -0.15)]);
        },
        'h' => |b| {
            b.new_curve([(0.1, 1.0), (0.1, 0.0)]);
            b.new_curve([(0.1, 0.4), (0.5, 0.65), (0.9, 0.4), (0.9, 0.0)]);
        },
        'i' => |b| {
            b.new_curve([(0.5, 0.0), (0.5, 0.6)]);
            dot(b, 0.5, 0.8);
        },
        'j' => |b| {
            b.new_curve([(0.6, 0.6), (0.6, -0.1), (0.4, -0.35), (0.1, -0.2)]);
            dot(b, 0.6, 0.8);
        },
        'k' => |b| {
            b.new_curve([(0.1, 1.0), (0.1, 0.0)]);
            b.new_curve([p(0.85, 0.6), sharp(0.1, 0.25), p(0.9, 0.0)]);
        },
        'l' => |b| {
            b.new_curve([(0.4, 1.0), (0.4, 0.1), (0.6, 0.0), (0.8, 0.05)]);
        },
        'm' => |b| {
            b.new_curve([(0.1, 0.6), (0.1, 0.0)]);
            b.new_curve([(0.1, 0.45), (0.3, 0.65), (0.5, 0.45), (0.5, 0.0)]);
            b.new_curve([(0.5, 0.45), (0.7, 0.65), (0.9, 0.45), (0.9, 0.0)]);
        },
        'n' => |b| {
            b.new_curve([(0.1, 0.6), (0.1, 0.0)]);
            b.new_curve([(0.1, 0.4), (0.5, 0.65), (0.9, 0.4), (0.9, 0.0)]);
        },
        'o' => |b| {
            b.new_curve([
                (0.5, 0.62),
                (0.1, 0.55),
                (0.1, 0.07),
                (0.5, 0.0),
                (0.9, 0.07),
                (0.9, 0.55),
                (0.5, 0.62),
            ]);
        },
        'p' => |b| {
            b.new_curve([(0.1, 0.6), (0.1, -0.35)]);
            b.new_curve([(0.1, 0.45), (0.5, 0.65), (0.9, 0.3), (0.5, 0.0), (0.1, 0.1)]);
        },
        'q' => |b| {
            b.new_curve([(0.9, 0.6), (0.9, -0.35)]);
            b.new_curve([(0.9, 0.45), (0.5, 0.65), (0.1, 0.3), (0.5, 0.0), (0.9, 0.1)]);
        },
        'r' => |b| {
            b.new_curve([(0.15, 0.6), (0.15, 0.0)]);
            b.new_curve([(0.15, 0.35), (0.45, 0.65), (0.85, 0.55)]);
        },
        's' => |b| {
            b.new_curve([
                (0.85, 0.55),
                (0.5, 0.65),
                (0.15, 0.5),
                (0.5, 0.33),
                (0.85, 0.15),
                (0.5, 0.0),
                (0.1, 0.08),
            ]);
        },
        't' => |b| {
            let stem = b.new_curve([(0.4, 0.9), (0.4, 0.1), (0.6, 0.0), (0.85, 0.05)]);
            let cross = b.intersect(stem, 0.3);
            b.new_curve([(0.1, cross.y), (0.8, cross.y)]);
        },
        'u' => |b| {
            b.new_curve([(0.1, 0.6), (0.1, 0.15), (0.5, 0.0), (0.9, 0.2)]);
            b.new_curve([(0.9, 0.6), (0.9, 0.0)]);
        },
        'v' => |b| {
            b.new_curve([p(0.1, 0.6), sharp(0.5, 0.0), p(0.9, 0.6)]);
        },
        'w' => |b| {
            b.new_curve([
                p(0.0, 0.6),
                sharp(0.25, 0.0),
                sharp(0.5, 0.45),
                sharp(0.75, 0.0),
                p(1.0, 0.6),
            ]);
        },
        'x' => |b| {
            b.new_curve([(0.1, 0.6), (0.9, 0.0)]);
            b.new_curve([(0.9, 0.6), (0.1, 0.0)]);
        },
        'y' => |b| {
            let long = b.new_curve([(0.9, 0.6), (0.2, -0.35)]);
            let joint = b.intersect(long, 0.5);
            b.new_curve([(0.1, 0.6), (joint.x, joint.y)]);
        },
        'z' => |b| {
            b.new_curve([p(0.1, 0.6), sharp(0.9, 0.6), sharp(0.1, 0.0), p(0.9, 0.0)]);
        },
        '0' => |b| {
            b.new_curve([
                (0.5, 1.0),
                (0.1, 0.9),
                (0.1, 0.1),
                (0.5, 0.0),
                (0.9, 0.1),
                (0.9, 0.9),
                (0.5, 1.0),
            ]);
            b.new_curve([(0.3, 0.25), (0.7, 0.75)]);
        },
        '1' => |b| {
            b.new_curve([p(0.2, 0.75), sharp(0.55, 1.0), p(0.55, 0.0)]);
            b.new_curve([(0.2, 0.0), (0.9, 0.0)]);
        },
        '2' => |b| {
            b.new_curve([
                p(0.1, 0.75),
                p(0.5, 1.0),
                p(0.9, 0.75),
                p(0.5, 0.35),
                sharp(0.1, 0.0),
                p(0.9, 0.0),
            ]);
        },
        '3' => |b| {
            b.new_curve([(0.1, 0.9), (0.6, 1.0), (0.8, 0.7), (0.4, 0.55)]);
            b.new_curve([(0.4, 0.55), (0.95, 0.35), (0.6, 0.0), (0.1, 0.1)]);
        },
        '4' => |b| {
            b.new_curve([p(0.7, 0.0), sharp(0.7, 1.0), sharp(0.05, 0.3), p(0.95, 0.3)]);
        },
        '5' => |b| {
            b.new_curve([
                p(0.85, 1.0),
                sharp(0.2, 1.0),
                sharp(0.15, 0.55),
                p(0.6, 0.6),
                p(0.9, 0.3),
                p(0.5, 0.0),
                p(0.1, 0.1),
            ]);
        },
        '6' => |b| {
            b.new_curve([
                (0.8, 0.95),
                (0.3, 0.8),
                (0.1, 0.3),
                (0.5, 0.0),
                (0.9, 0.3),
                (0.5, 0.55),
                (0.12, 0.35),
            ]);
        },
        '7' => |b| {
            b.new_curve([p(0.1, 1.0), sharp(0.9, 1.0), p(0.35, 0.0)]);
        },
        '8' => |b| {
            b.new_curve([
                (0.5, 0.55),
                (0.1, 0.78),
                (0.5, 1.0),
                (0.9, 0.78),
                (0.5, 0.55),
                (0.05, 0.28),
                (0.5, 0.0),
                (0.95, 0.28),
                (0.5, 0.55),
            ]);
        },
        '9' => |b| {
            b.new_curve([
                (0.88, 0.65),
                (0.5, 0.45),
                (0.1, 0.7),
                (0.5, 1.0),
                (0.9, 0.7),
                (0.7, 0.2),
                (0.2, 0.05),
            ]);
        },
        '.' => |b| dot(b, 0.5, 0.0),
        ',' => |b| {
            b.new_curve([(0.55, 0.08), (0.5, -0.05), (0.35, -0.2)]);
        },
        '!' => |b| {
            b.new_curve([(0.5, 1.0), (0.5, 0.3)]);
            dot(b, 0.5, 0.0);
        },
        '?' => |b| {
            b.new_curve([(0.15, 0.8), (0.5, 1.0), (0.85, 0.8), (0.5, 0.5), (0.5, 0.3)]);
            dot(b, 0.5, 0.0);
        },
        '-' => |b| {
            b.new_curve([(0.2, 0.35), (0.8, 0.35)]);
        },
        '\'' => |b| {
            b.new_curve([(0.5, 1.0), (0.45, 0.75)]);
        },
        ':' => |b| {
            dot(b, 0.5, 0.5);
            dot(b, 0.5, 0.0);
        },
        '+' => |b| {
            b.new_curve([(0.1, 0.35), (0.9, 0.35)]);
            b.new_curve([(0.5, 0.7), (0.5, 0.0)]);
        },
        '=' => |b| {
            b.new_curve([(0.15, 0.45), (0.85, 0.45)]);
            b.new_curve([(0.15, 0.2), (0.85, 0.2)]);
        },
        '/' => |b| {
            b.new_curve([(0.1, -0.1), (0.9, 1.0)]);
        },
        _ => return None,
    };
    Some(draw)
}

fn p(x: f64, y: f64) -> Coordinate {
    Coordinate::from((x, y))
}

/// A point that turns the stroke into a hard corner.
fn sharp(x: f64, y: f64) -> Coordinate {
    Coordinate::from(((x, y), TransformPatch::new().strength(1.0)))
}

fn dot(b: &mut GroupBuilder, x: f64, y: f64) {
    b.new_curve([(x, y), (x, y + 0.06)]);
}

impl GroupBuilder {
    /// Lays out `text` with the procedural glyphs and returns the range of
    /// curves it produced.
    ///
    /// The run starts at the origin of the current transform and ends with
    /// the transform restored. Spaces and tabs advance the cursor, a newline
    /// returns to the start of the line and moves down by the line height.
    /// Characters without a glyph are dropped.
    pub fn text(&mut self, text: &str, options: &TextOptions) -> Range<usize> {
        let start = self.len();
        let step = options.advance + options.spacing;
        let depth = self.stack_depth();

        // Run origin, then the start of the current line.
        self.push();
        self.transform(&TransformPatch::new().scale(options.size).push());
        for c in text.chars() {
            match c {
                '\n' => {
                    self.transform(
                        &TransformPatch::new()
                            .reset(crate::ResetMode::Pop)
                            .translate(0.0, -options.line_height)
                            .push(),
                    );
                }
                ' ' => {
                    self.transform(&TransformPatch::new().translate(step, 0.0));
                }
                '\t' => {
                    self.transform(&TransformPatch::new().translate(step * TAB_ADVANCES, 0.0));
                }
                c => {
                    let Some(draw) = glyph(c) else {
                        log::trace!("dropping character {c:?} without a glyph");
                        continue;
                    };
                    self.push();
                    self.transform(&TransformPatch::new().scale_xy(options.advance, 1.0));
                    draw(self);
                    self.pop();
                    self.transform(&TransformPatch::new().translate(step, 0.0));
                }
            }
        }
        self.pop();
        self.pop();
        debug_assert_eq!(self.stack_depth(), depth);

        let run = start..self.len();
        if let Some(fit) = &options.fit {
            self.fit(fit, run.clone());
        }
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Transform;
    use peniko::kurbo::Rect;

    #[test]
    fn glyph_table_coverage() {
        for c in ('a'..='z').chain('0'..='9').chain(".,!?-':+=/".chars()) {
            let draw = glyph(c).unwrap_or_else(|| panic!("missing glyph {c:?}"));
            let mut b = GroupBuilder::new(0);
            draw(&mut b);
            assert!((1..=3).contains(&b.len()), "glyph {c:?} has {} curves", b.len());
            let bounds = b.bounds(0..b.len()).unwrap();
            assert!(bounds.x0 >= 0.0 && bounds.x1 <= 1.0, "glyph {c:?} leaves its cell");
        }
        assert!(glyph('A').is_some());
        assert!(glyph('#').is_none());
    }

    #[test]
    fn two_glyphs_do_not_overlap() {
        let options = TextOptions {
            advance: 0.5,
            spacing: 0.0,
            ..TextOptions::default()
        };
        let mut b = GroupBuilder::new(0);
        let run = b.text("ab", &options);
        // 'a' draws two curves.
        let a_end = run.start + 2;
        let a_bounds = b.bounds(run.start..a_end).unwrap();
        let b_bounds = b.bounds(a_end..run.end).unwrap();
        assert!(b_bounds.x0 >= a_bounds.x1);
        assert!(b_bounds.x0 - a_bounds.x0 >= a_bounds.width());
        assert_eq!(b.current_transform(), Transform::IDENTITY);

        // The cell is scaled to the advance and identical glyphs sit one advance apart.
        let run = b.text("aa", &options);
        let first = b.bounds(run.start..run.start + 2).unwrap();
        let second = b.bounds(run.start + 2..run.end).unwrap();
        assert!((first.x0 - 0.1 * 0.5).abs() < 1e-9);
        assert!((first.x1 - 0.85 * 0.5).abs() < 1e-9);
        assert!((second.x0 - first.x0 - 0.5).abs() < 1e-9);

        let spaced = TextOptions {
            spacing: 0.1,
            ..options
        };
        let run = b.text("aa", &spaced);
        let first = b.bounds(run.start..run.start + 2).unwrap();
        let second = b.bounds(run.start + 2..run.end).unwrap();
        assert!((second.x0 - first.x0 - 0.6).abs() < 1e-9);
    }

    #[test]
    fn whitespace_and_unknown_characters_emit_nothing() {
        let mut b = GroupBuilder::new(0);
        let run = b.text(" \t#\n", &TextOptions::default());
        assert!(run.is_empty());
        assert_eq!(b.stack_depth(), 0);
    }

    #[test]
    fn newline_returns_to_line_start() {
        let options = TextOptions::default();
        let mut b = GroupBuilder::new(0);
        let run = b.text("l\nl", &options);
        let first = b.bounds(run.start..run.start + 1).unwrap();
        let second = b.bounds(run.start + 1..run.end).unwrap();
        assert!((first.x0 - second.x0).abs() < 1e-9);
        assert!((first.y0 - second.y0 - options.line_height).abs() < 1e-9);
    }

    #[test]
    fn run_is_fitted_as_a_whole() {
        let target = Rect::new(0.0, 0.0, 100.0, 20.0);
        let options = TextOptions {
            fit: Some(Fit::new(target).stretch()),
            ..TextOptions::default()
        };
        let mut b = GroupBuilder::new(0);
        let run = b.text("hi", &options);
        let bounds = b.bounds(run).unwrap();
        assert!((bounds.x0 - target.x0).abs() < 1e-9);
        assert!((bounds.x1 - target.x1).abs() < 1e-9);
        assert!((bounds.y1 - target.y1).abs() < 1e-9);
    }
}
