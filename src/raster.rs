use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use unicode_normalization::UnicodeNormalization as _;

use crate::error::ResumeError;
use crate::layout::{Block, ControlKind, LayoutTree};

const PAGE_WIDTH: f32 = 800.0;
const PAGE_PADDING: f32 = 20.0;
const LINE_HEIGHT: f32 = 1.5;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const ACCENT: Rgba<u8> = Rgba([0x0B, 0x3D, 0x91, 255]);
const BODY: Rgba<u8> = Rgba([0x22, 0x22, 0x22, 255]);
const MUTED: Rgba<u8> = Rgba([0x55, 0x55, 0x55, 255]);
const TAG_BACKGROUND: Rgba<u8> = Rgba([0xE1, 0xEC, 0xF4, 255]);
const TAG_TEXT: Rgba<u8> = Rgba([0x03, 0x66, 0xD6, 255]);
const SECONDARY_BUTTON: Rgba<u8> = Rgba([0x6C, 0x75, 0x7D, 255]);
const BUTTON_TEXT: Rgba<u8> = Rgba([255, 255, 255, 255]);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub bold: bool,
    pub color: Rgba<u8>,
}

/// Measures and draws text onto a raster.
pub trait GlyphPainter: Send + Sync {
    /// Width in pixels of a single line of text.
    fn text_width(&self, text: &str, style: &TextStyle) -> f32;
    /// Draws a single line of text with its top-left corner at `(x, y)`.
    fn draw_text(&self, canvas: &mut RgbaImage, text: &str, x: i32, y: i32, style: &TextStyle);
}

/// Draws text with TrueType fonts loaded through `ab_glyph`.
pub struct FontPainter {
    regular: FontVec,
    bold: Option<FontVec>,
}

impl FontPainter {
    pub fn from_paths(regular: &Path, bold: Option<&Path>) -> Result<Self, ResumeError> {
        let regular = load_font(regular)?;
        let bold = bold.map(load_font).transpose()?;

        Ok(FontPainter { regular, bold })
    }

    fn font(&self, bold: bool) -> &FontVec {
        match (&self.bold, bold) {
            (Some(bold), true) => bold,
            _ => &self.regular,
        }
    }
}

fn load_font(font_path: &Path) -> Result<FontVec, ResumeError> {
    let font_bytes = std::fs::read(font_path).map_err(|error| {
        ResumeError::configuration(format!("Unable to read the font {:?}", font_path), &error)
    })?;
    FontVec::try_from_vec(font_bytes).map_err(|error| {
        ResumeError::configuration(format!("Unable to parse the font {:?}", font_path), &error)
    })
}

impl GlyphPainter for FontPainter {
    fn text_width(&self, text: &str, style: &TextStyle) -> f32 {
        let (width, _) = text_size(PxScale::from(style.size), self.font(style.bold), text);
        width as f32
    }

    fn draw_text(&self, canvas: &mut RgbaImage, text: &str, x: i32, y: i32, style: &TextStyle) {
        draw_text_mut(
            canvas,
            style.color,
            x,
            y,
            PxScale::from(style.size),
            self.font(style.bold),
            text,
        );
    }
}

/// Draws every visible character as a solid block, for when no font is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockPainter;

impl BlockPainter {
    fn advance(style: &TextStyle) -> f32 {
        let advance = style.size * 0.55;
        if style.bold {
            advance * 1.1
        } else {
            advance
        }
    }
}

impl GlyphPainter for BlockPainter {
    fn text_width(&self, text: &str, style: &TextStyle) -> f32 {
        text.chars().count() as f32 * BlockPainter::advance(style)
    }

    fn draw_text(&self, canvas: &mut RgbaImage, text: &str, x: i32, y: i32, style: &TextStyle) {
        let advance = BlockPainter::advance(style);
        let glyph_width = (advance * 0.8).max(1.0) as u32;
        let glyph_height = (style.size * 0.6).max(1.0) as u32;
        let top = y + (style.size * 0.25) as i32;
        for (index, character) in text.chars().enumerate() {
            if character.is_whitespace() {
                continue;
            }
            let left = x + (index as f32 * advance) as i32;
            draw_filled_rect_mut(
                canvas,
                Rect::at(left, top).of_size(glyph_width, glyph_height),
                style.color,
            );
        }
    }
}

/// A single drawing instruction in device pixels.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Fill {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgba<u8>,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        style: TextStyle,
    },
}

/// The positioned content of a layout tree at a given scale.
#[derive(Debug, Clone)]
pub struct Plan {
    pub width: f32,
    pub height: f32,
    commands: Vec<Command>,
}

/// Lays a tree out top to bottom, following a caret that only moves down.
struct Planner<'a> {
    painter: &'a dyn GlyphPainter,
    scale: f32,
    caret_y: f32,
    commands: Vec<Command>,
}

impl<'a> Planner<'a> {
    fn px(&self, logical: f32) -> f32 {
        logical * self.scale
    }

    fn style(&self, size: f32, bold: bool, color: Rgba<u8>) -> TextStyle {
        TextStyle {
            size: self.px(size),
            bold,
            color,
        }
    }

    fn content_left(&self) -> f32 {
        self.px(PAGE_PADDING)
    }

    fn content_width(&self) -> f32 {
        self.px(PAGE_WIDTH - 2.0 * PAGE_PADDING)
    }

    fn advance(&mut self, logical: f32) {
        self.caret_y += self.px(logical);
    }

    /// Emits wrapped text starting at `left`, preserving hard line breaks.
    fn text(&mut self, text: &str, left: f32, style: TextStyle) {
        let line_height = style.size * LINE_HEIGHT;
        let maximum_width = self.content_left() + self.content_width() - left;
        for line in wrap(self.painter, text, &style, maximum_width) {
            if !line.is_empty() {
                self.commands.push(Command::Text {
                    x: left,
                    y: self.caret_y + (line_height - style.size) / 2.0,
                    text: line,
                    style,
                });
            }
            self.caret_y += line_height;
        }
    }

    fn rule(&mut self, thickness: f32, color: Rgba<u8>) {
        let (x, width, height) = (self.content_left(), self.content_width(), self.px(thickness));
        self.commands.push(Command::Fill {
            x,
            y: self.caret_y,
            width,
            height,
            color,
        });
        self.caret_y += height;
    }

    fn bullets(&mut self, items: &[String]) {
        for item in items {
            let style = self.style(15.0, false, BODY);
            let dot = self.px(5.0);
            let dot_left = self.content_left() + self.px(6.0);
            self.commands.push(Command::Fill {
                x: dot_left,
                y: self.caret_y + (style.size * LINE_HEIGHT - dot) / 2.0,
                width: dot,
                height: dot,
                color: BODY,
            });
            let left = self.content_left() + self.px(20.0);
            self.text(item, left, style);
            self.advance(6.0);
        }
    }

    fn tags(&mut self, tags: &[String]) {
        if tags.is_empty() {
            return;
        }
        let style = self.style(14.0, false, TAG_TEXT);
        let (padding_x, padding_y) = (self.px(12.0), self.px(6.0));
        let (gap_x, gap_y) = (self.px(8.0), self.px(4.0));
        let chip_height = style.size * LINE_HEIGHT + 2.0 * padding_y;
        let right = self.content_left() + self.content_width();

        let mut x = self.content_left();
        self.caret_y += gap_y;
        for tag in tags {
            let tag: String = tag.nfc().collect();
            let chip_width = self.painter.text_width(&tag, &style) + 2.0 * padding_x;
            if x > self.content_left() && x + chip_width > right {
                x = self.content_left();
                self.caret_y += chip_height + 2.0 * gap_y;
            }
            self.commands.push(Command::Fill {
                x,
                y: self.caret_y,
                width: chip_width,
                height: chip_height,
                color: TAG_BACKGROUND,
            });
            self.commands.push(Command::Text {
                x: x + padding_x,
                y: self.caret_y + padding_y + (style.size * LINE_HEIGHT - style.size) / 2.0,
                text: tag,
                style,
            });
            x += chip_width + gap_x;
        }
        self.caret_y += chip_height + gap_y;
    }

    fn block(&mut self, block: &Block) {
        let left = self.content_left();
        match block {
            Block::Title(name) => {
                self.text(name, left, self.style(32.0, true, ACCENT));
                self.advance(4.0);
            }
            Block::Contact { email, phone } => {
                let contact = format!("{} | {}", email, phone);
                self.text(&contact, left, self.style(16.0, false, MUTED));
                self.advance(20.0);
            }
            Block::Paragraph(paragraph) => {
                self.text(paragraph, left, self.style(16.0, false, BODY));
                self.advance(16.0);
            }
            Block::Tags(tags) => self.tags(tags),
            Block::Entry {
                title,
                details,
                bullets,
            } => {
                self.text(title, left, self.style(18.0, true, ACCENT));
                self.advance(4.0);
                self.text(details, left, self.style(14.0, false, MUTED));
                self.advance(8.0);
                self.bullets(bullets);
                self.advance(20.0);
            }
            Block::List(items) => self.bullets(items),
        }
    }

    fn controls(&mut self, layout: &LayoutTree) {
        let visible: Vec<ControlKind> = layout
            .controls
            .iter()
            .filter(|control| control.visible)
            .map(|control| control.kind)
            .collect();
        if visible.is_empty() {
            return;
        }

        self.advance(30.0);
        let style = self.style(16.0, false, BUTTON_TEXT);
        let (padding_x, padding_y) = (self.px(18.0), self.px(10.0));
        let button_height = style.size * LINE_HEIGHT + 2.0 * padding_y;
        let mut x = self.content_left();
        for kind in visible {
            let label = kind.label();
            let button_width = self.painter.text_width(label, &style) + 2.0 * padding_x;
            self.commands.push(Command::Fill {
                x,
                y: self.caret_y,
                width: button_width,
                height: button_height,
                color: if kind.is_primary() {
                    ACCENT
                } else {
                    SECONDARY_BUTTON
                },
            });
            self.commands.push(Command::Text {
                x: x + padding_x,
                y: self.caret_y + padding_y + (style.size * LINE_HEIGHT - style.size) / 2.0,
                text: label.to_string(),
                style,
            });
            x += button_width + self.px(8.0);
        }
        self.caret_y += button_height;
    }
}

/// Splits text into lines no wider than `maximum_width`, keeping hard line breaks.
/// A word wider than the line is kept whole on a line of its own.
fn wrap(
    painter: &dyn GlyphPainter,
    text: &str,
    style: &TextStyle,
    maximum_width: f32,
) -> Vec<String> {
    let text: String = text.nfc().collect();
    let mut lines = Vec::new();
    for hard_line in text.split('\n') {
        let mut current = String::new();
        for word in hard_line.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if !current.is_empty() && painter.text_width(&candidate, style) > maximum_width {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }

    lines
}

/// Positions every element of the layout at the given scale.
pub fn plan(layout: &LayoutTree, painter: &dyn GlyphPainter, scale: f32) -> Plan {
    let mut planner = Planner {
        painter,
        scale,
        caret_y: 0.0,
        commands: Vec::new(),
    };

    planner.advance(PAGE_PADDING);
    for section in &layout.sections {
        if let Some(title) = section.kind.title() {
            planner.text(title, planner.content_left(), planner.style(22.0, true, ACCENT));
            planner.advance(6.0);
            planner.rule(2.0, ACCENT);
            planner.advance(12.0);
        }
        for block in &section.blocks {
            planner.block(block);
        }
        planner.advance(24.0);
    }
    planner.controls(layout);
    planner.advance(PAGE_PADDING);

    Plan {
        width: PAGE_WIDTH * scale,
        height: planner.caret_y,
        commands: planner.commands,
    }
}

/// Draws the plan onto a white raster of the plan's size (rounded up to whole pixels).
pub fn rasterize(plan: &Plan, painter: &dyn GlyphPainter) -> RgbaImage {
    let width = plan.width.ceil().max(0.0) as u32;
    let height = plan.height.ceil().max(0.0) as u32;
    let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);

    for command in &plan.commands {
        match command {
            Command::Fill {
                x,
                y,
                width,
                height,
                color,
            } => {
                let (width, height) = (width.round() as u32, height.round() as u32);
                if width > 0 && height > 0 {
                    draw_filled_rect_mut(
                        &mut canvas,
                        Rect::at(x.round() as i32, y.round() as i32).of_size(width, height),
                        *color,
                    );
                }
            }
            Command::Text { x, y, text, style } => {
                painter.draw_text(&mut canvas, text, x.round() as i32, y.round() as i32, style);
            }
        }
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{render, ControlKind};
    use crate::resume::Resume;

    fn resume() -> Resume {
        Resume {
            name: "Jane Doe".into(),
            email: "jane@x.com".into(),
            phone: "555-0100".into(),
            summary: "First line.\nSecond line.".into(),
            skills: vec!["Go".into(), "Rust".into()],
            experience: vec![],
            education: "BS CS".into(),
            achievements: vec!["Award".into()],
        }
    }

    #[test]
    fn wrapping_keeps_hard_line_breaks() {
        let style = TextStyle {
            size: 10.0,
            bold: false,
            color: BODY,
        };
        let lines = wrap(&BlockPainter, "one two\n\nthree", &style, 1000.0);

        assert_eq!(lines, vec!["one two", "", "three"]);
    }

    #[test]
    fn wrapping_breaks_long_lines_between_words() {
        let style = TextStyle {
            size: 10.0,
            bold: false,
            color: BODY,
        };
        // Each character is 5.5 pixels wide, so "aaaa bbbb" (9 characters) does not fit in 40.
        let lines = wrap(&BlockPainter, "aaaa bbbb cccccccccc", &style, 40.0);

        assert_eq!(lines, vec!["aaaa", "bbbb", "cccccccccc"]);
    }

    #[test]
    fn doubling_the_scale_doubles_the_page() {
        let layout = render(&resume());
        let single = plan(&layout, &BlockPainter, 1.0);
        let double = plan(&layout, &BlockPainter, 2.0);

        assert_eq!(single.width, PAGE_WIDTH);
        assert_eq!(double.width, 2.0 * PAGE_WIDTH);
        assert!((double.height - 2.0 * single.height).abs() < 1.0);
    }

    #[test]
    fn hidden_controls_are_not_laid_out() {
        let mut layout = render(&resume());
        let with_controls = plan(&layout, &BlockPainter, 1.0);
        for control in layout.controls.iter_mut() {
            control.visible = false;
        }
        let without_controls = plan(&layout, &BlockPainter, 1.0);

        assert!(without_controls.height < with_controls.height);
        assert!(!without_controls.commands.iter().any(|command| matches!(
            command,
            Command::Text { text, .. } if text == ControlKind::GenerateAnother.label()
        )));
    }

    #[test]
    fn rasterized_page_has_the_planned_size_and_ink() {
        let layout = render(&resume());
        let plan = plan(&layout, &BlockPainter, 2.0);
        let canvas = rasterize(&plan, &BlockPainter);

        assert_eq!(canvas.width(), 1600);
        assert_eq!(canvas.height(), plan.height.ceil() as u32);
        assert!(canvas.pixels().any(|pixel| *pixel == ACCENT));
        assert!(canvas.pixels().any(|pixel| *pixel == TAG_BACKGROUND));
    }
}
