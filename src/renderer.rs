//! # Scene Rendering
//!
//! Rasterises a [`Scene`] with `embedded-graphics` primitives onto any RGB
//! draw target, and dumps a rendered [`Framebuffer`] as ASCII art for
//! development on a desktop without the LED matrix attached.
//!
//! Slots are drawn back to front in scene order. Text uses the 6x10 mono
//! font, whose 6 pixel advance matches the scroll span per character.

use crate::scene::{CircleShape, Element, RectShape, Scene, TextLabel};
use core::convert::Infallible;
use embedded_graphics::{
    mono_font::{ascii::FONT_6X10, MonoTextStyle},
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Circle, PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};

/// Convert a `0xRRGGBB` value to an `embedded-graphics` color
pub fn rgb(value: u32) -> Rgb888 {
    Rgb888::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
}

/// Draw the whole scene, starting from a cleared background.
pub fn draw_scene<D>(scene: &Scene, target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    target.clear(rgb(scene.background()))?;
    for (_, element) in scene.slots() {
        match element {
            Element::Text(label) => draw_text(label, target)?,
            Element::Rect(rect) => draw_rect(rect, target)?,
            Element::Circle(circle) => draw_circle(circle, target)?,
        }
    }
    Ok(())
}

/// Fill the target with one color.
pub fn draw_blank<D>(background: u32, target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb888>,
{
    target.clear(rgb(background))
}

fn draw_text<D: DrawTarget<Color = Rgb888>>(label: &TextLabel, target: &mut D) -> Result<(), D::Error> {
    if label.text.is_empty() {
        return Ok(());
    }
    let style = MonoTextStyle::new(&FONT_6X10, rgb(label.color));
    Text::with_baseline(&label.text, Point::new(label.x, label.y), style, Baseline::Middle)
        .draw(target)?;
    Ok(())
}

fn draw_rect<D: DrawTarget<Color = Rgb888>>(rect: &RectShape, target: &mut D) -> Result<(), D::Error> {
    Rectangle::new(Point::new(rect.x, rect.y), Size::new(rect.width, rect.height))
        .into_styled(PrimitiveStyle::with_fill(rgb(rect.fill)))
        .draw(target)
}

fn draw_circle<D: DrawTarget<Color = Rgb888>>(
    circle: &CircleShape,
    target: &mut D,
) -> Result<(), D::Error> {
    Circle::with_center(Point::new(circle.cx, circle.cy), circle.radius * 2 + 1)
        .into_styled(PrimitiveStyle::with_fill(rgb(circle.fill)))
        .draw(target)
}

/// In-memory RGB frame the size of the matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgb888>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgb888::BLACK; (width as usize).saturating_mul(height as usize)],
        }
    }

    /// Color at `(x, y)`, or `None` outside the frame
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb888> {
        self.index(Point::new(x, y)).map(|i| self.pixels[i])
    }

    /// Rows of pixels, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Rgb888]> + '_ {
        self.pixels.chunks(self.width.max(1) as usize)
    }

    fn index(&self, point: Point) -> Option<usize> {
        let (x, y) = (point.x, point.y);
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for Framebuffer {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(i) = self.index(point) {
                self.pixels[i] = color;
            }
        }
        Ok(())
    }
}

/// Render a frame as ASCII art, one character per pixel.
///
/// Brightness is the strongest channel: dark pixels are blank, dim ones
/// `.`, mid-range `+` and bright `#`.
pub fn draw_ascii(frame: &Framebuffer) -> String {
    let mut out = String::with_capacity(((frame.width + 1) * frame.height) as usize);
    for row in frame.rows() {
        out.extend(row.iter().map(|px| shade(*px)));
        out.push('\n');
    }
    out
}

fn shade(color: Rgb888) -> char {
    match color.r().max(color.g()).max(color.b()) {
        0 => ' ',
        1..=99 => '.',
        100..=199 => '+',
        _ => '#',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::scene::IndicatorVisual;
    use crate::ArrivalSet;

    fn rendered(scene: &Scene) -> Framebuffer {
        let mut frame = Framebuffer::new(64, 32);
        draw_scene(scene, &mut frame).unwrap();
        frame
    }

    fn live_scene(alert: bool) -> (Config, Scene) {
        let config = Config::default();
        let mut scene = Scene::new(&config);
        let set = ArrivalSet::new(vec![2, 9, 14], "Q", "Coney Island", alert).unwrap();
        scene.apply(Some(&set), true, &config.schedule);
        (config, scene)
    }

    #[test]
    fn test_rgb_conversion() {
        assert_eq!(rgb(0xFCB80A), Rgb888::new(0xFC, 0xB8, 0x0A));
        assert_eq!(rgb(0x000000), Rgb888::BLACK);
    }

    #[test]
    fn test_badge_and_indicators() {
        let (config, mut scene) = live_scene(true);
        let frame = rendered(&scene);
        let d = &config.display;

        // Badge disc edge away from the route symbol
        assert_eq!(frame.pixel(12, 22), Some(rgb(d.route_badge)));
        assert_eq!(frame.pixel(5, 8), Some(rgb(d.alert)));
        assert_eq!(frame.pixel(3, 24), Some(rgb(d.live)));

        scene.set_live_visual(IndicatorVisual::Off);
        let frame = rendered(&scene);
        assert_eq!(frame.pixel(3, 24), Some(rgb(d.background)));
    }

    #[test]
    fn test_no_alert_dot_without_alert() {
        let (config, scene) = live_scene(false);
        let frame = rendered(&scene);
        assert_ne!(frame.pixel(5, 8), Some(rgb(config.display.alert)));
    }

    #[test]
    fn test_scrolled_text_is_clipped_to_column() {
        let (config, mut scene) = live_scene(false);
        scene.set_scroll_offset(-30);
        let frame = rendered(&scene);
        let background = rgb(config.display.background);
        let text = rgb(config.display.text);

        for y in 5..16 {
            assert_eq!(frame.pixel(0, y), Some(background));
            assert_eq!(frame.pixel(1, y), Some(background));
            for x in 61..64 {
                assert_eq!(frame.pixel(x, y), Some(background));
            }
        }
        let visible = (5..16)
            .flat_map(|y| (25..61).map(move |x| (x, y)))
            .any(|(x, y)| frame.pixel(x, y) == Some(text));
        assert!(visible, "scrolled label should remain visible in the text column");
    }

    #[test]
    fn test_blank_clears_everything() {
        let (_, scene) = live_scene(true);
        let mut frame = rendered(&scene);
        draw_blank(0x000000, &mut frame).unwrap();
        assert!(frame.rows().all(|row| row.iter().all(|px| *px == Rgb888::BLACK)));
    }

    #[test]
    fn test_ascii_dump_shape() {
        let (_, scene) = live_scene(false);
        let ascii = draw_ascii(&rendered(&scene));
        let lines: Vec<_> = ascii.lines().collect();
        assert_eq!(lines.len(), 32);
        assert!(lines.iter().all(|line| line.chars().count() == 64));
        // Bright badge, dimmer text
        assert!(ascii.contains('#'));
        assert!(ascii.contains('+'));
    }
}
