//! Final 1920×1080 composite: background, legibility gradient, overlay text.
//!
//! The background and gradient are drawn straight onto the pixmap. The text
//! layer is described as SVG and rasterized by resvg on top, which gives us
//! font fallback, outlined strokes and blurred drop shadows in one pass.

use crate::error::{AppError, Result};
use crate::fonts::{self, display_family_list};
use crate::geometry::{cover_fit, layout_text, LineLayout, PresenterTransform, Surface};
use crate::image_processing::ImageProcessor;
use crate::model::{LayoutParams, ThumbnailResult};
use image::RgbaImage;
use resvg::tiny_skia::{
    Color, FilterQuality, GradientStop, LinearGradient, Paint, Pixmap, PixmapPaint, Point, Rect,
    SpreadMode, Transform,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};
use usvg::fontdb;

/// Where the legibility gradient reaches full transparency, in export pixels.
const GRADIENT_END_X: f32 = 1500.0;
/// (offset, alpha) stops of the black gradient.
const GRADIENT_STOPS: [(f32, u8); 4] = [(0.0, 230), (0.35, 153), (0.7, 26), (1.0, 0)];

const STROKE_WIDTH: f32 = 25.0;
const STROKE_OFFSET: f32 = 8.0;
const SHADOW_BLUR: f32 = 40.0;

/// Renders results at export resolution. Cheap to clone.
#[derive(Clone)]
pub struct Compositor {
    fontdb: Arc<fontdb::Database>,
}

impl Compositor {
    pub fn new(font_dir: Option<&Path>) -> Self {
        Self::with_fontdb(fonts::build_fontdb(font_dir))
    }

    pub fn with_fontdb(fontdb: Arc<fontdb::Database>) -> Self {
        Self { fontdb }
    }

    pub fn font_count(&self) -> usize {
        self.fontdb.len()
    }

    /// Decodes the result's background and composites it.
    pub fn composite(&self, result: &ThumbnailResult) -> Result<RgbaImage> {
        let background = result.image.decode()?;
        self.composite_decoded(&result.overlay_text, &result.params, &background)
    }

    /// Composites and encodes as PNG.
    pub fn render_png(&self, result: &ThumbnailResult) -> Result<Vec<u8>> {
        let pixels = self.composite(result)?;
        ImageProcessor::encode_png(&pixels)
    }

    #[instrument(skip_all, fields(lines = tracing::field::Empty))]
    pub fn composite_decoded(
        &self,
        overlay_text: &str,
        params: &LayoutParams,
        background: &RgbaImage,
    ) -> Result<RgbaImage> {
        let surface = Surface::EXPORT;
        let mut pixmap = Pixmap::new(surface.width as u32, surface.height as u32)
            .ok_or_else(|| AppError::image("failed to allocate export surface"))?;
        pixmap.fill(Color::BLACK);

        self.draw_background(&mut pixmap, params, background)?;
        draw_gradient(&mut pixmap, surface)?;

        let lines = layout_text(overlay_text, params, surface);
        tracing::Span::current().record("lines", lines.len());
        if !lines.is_empty() {
            self.draw_text(&mut pixmap, &lines)?;
        }

        ImageProcessor::from_pixmap(&pixmap)
    }

    fn draw_background(
        &self,
        pixmap: &mut Pixmap,
        params: &LayoutParams,
        background: &RgbaImage,
    ) -> Result<()> {
        let source = ImageProcessor::to_pixmap(background)?;
        let fit = cover_fit(source.width(), source.height(), Surface::EXPORT);
        let transform = PresenterTransform::new(params, Surface::EXPORT)
            .to_transform()
            .pre_concat(fit);

        let paint = PixmapPaint {
            quality: FilterQuality::Bicubic,
            ..PixmapPaint::default()
        };
        pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
        Ok(())
    }

    fn draw_text(&self, pixmap: &mut Pixmap, lines: &[LineLayout]) -> Result<()> {
        let svg = text_layer_svg(lines, Surface::EXPORT);
        let options = usvg::Options {
            fontdb: self.fontdb.clone(),
            font_resolver: fonts::display_font_resolver(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(&svg, &options)
            .map_err(|e| AppError::image(format!("failed to build text layer: {e}")))?;

        debug!(lines = lines.len(), "drawing overlay text");
        resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());
        Ok(())
    }
}

fn draw_gradient(pixmap: &mut Pixmap, surface: Surface) -> Result<()> {
    let stops = GRADIENT_STOPS
        .iter()
        .map(|&(pos, alpha)| GradientStop::new(pos, Color::from_rgba8(0, 0, 0, alpha)))
        .collect();
    let shader = LinearGradient::new(
        Point::from_xy(0.0, 0.0),
        Point::from_xy(GRADIENT_END_X * surface.scale(), 0.0),
        stops,
        SpreadMode::Pad,
        Transform::identity(),
    )
    .ok_or_else(|| AppError::image("invalid gradient"))?;

    let paint = Paint {
        shader,
        ..Paint::default()
    };
    let rect = Rect::from_xywh(0.0, 0.0, surface.width, surface.height)
        .ok_or_else(|| AppError::image("invalid surface size"))?;
    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
    Ok(())
}

/// SVG for the text layer: per line a shadowed black outline, then the fill.
pub fn text_layer_svg(lines: &[LineLayout], surface: Surface) -> String {
    let s = surface.scale();
    let (w, h) = (surface.width, surface.height);

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );
    svg.push_str(&format!(
        r##"<defs><filter id="shadow" x="-50%" y="-100%" width="200%" height="300%"><feDropShadow dx="0" dy="0" stdDeviation="{}" flood-color="#000000" flood-opacity="0.9"/></filter></defs>"##,
        SHADOW_BLUR * s / 2.0
    ));
    svg.push_str(&format!(
        r#"<g font-family="{}" font-style="italic" font-weight="700" font-stretch="condensed">"#,
        display_family_list()
    ));

    for line in lines {
        let text = escape_xml(&line.text);
        let size = line.font_size;
        svg.push_str(&format!(
            r#"<g transform="translate({} {}) rotate({})">"#,
            line.x, line.y, line.rotation_deg
        ));
        svg.push_str(&format!(
            r##"<text x="{off}" y="{off}" font-size="{size}" dominant-baseline="central" xml:space="preserve" fill="none" stroke="#000000" stroke-width="{sw}" stroke-linejoin="round" filter="url(#shadow)">{text}</text>"##,
            off = STROKE_OFFSET * s,
            sw = STROKE_WIDTH * s,
        ));
        svg.push_str(&format!(
            r#"<text x="0" y="0" font-size="{size}" dominant-baseline="central" xml:space="preserve" fill="{}">{text}</text>"#,
            line.fill.hex()
        ));
        svg.push_str("</g>");
    }

    svg.push_str("</g></svg>");
    svg
}

/// Escapes markup and drops characters XML 1.0 does not allow at all.
fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 => {}
            '\u{FFFE}' | '\u{FFFF}' => {}
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{EXPORT_HEIGHT, EXPORT_WIDTH};
    use image::Rgba;

    /// 192×108 background: left quarter red, rest blue. Cover-fit scales it
    /// ×10, so the color boundary sits at export x = 480.
    fn background() -> RgbaImage {
        RgbaImage::from_fn(192, 108, |x, _| {
            if x < 48 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        })
    }

    fn compositor() -> Compositor {
        Compositor::with_fontdb(Arc::new(fontdb::Database::new()))
    }

    fn render(params: LayoutParams, text: &str) -> RgbaImage {
        compositor()
            .composite_decoded(text, &params, &background())
            .unwrap()
    }

    fn px(img: &RgbaImage, x: u32, y: u32) -> [u8; 4] {
        img.get_pixel(x, y).0
    }

    #[test]
    fn output_is_full_export_size_and_opaque() {
        let img = render(LayoutParams::default(), "");
        assert_eq!(img.dimensions(), (EXPORT_WIDTH, EXPORT_HEIGHT));
        assert_eq!(px(&img, 0, 0)[3], 255);
        assert_eq!(px(&img, 1919, 1079)[3], 255);
    }

    #[test]
    fn gradient_darkens_left_edge_only() {
        let img = render(LayoutParams::default(), "");
        let right = px(&img, 1800, 540);
        assert!(right[2] > 240 && right[0] < 10, "{right:?}");

        let left = px(&img, 2, 540);
        assert!(left[0] < 40 && left[0] > 10, "{left:?}");
    }

    #[test]
    fn pan_moves_background_by_percent_of_width() {
        let centered = render(LayoutParams::default(), "");
        assert!(px(&centered, 1260, 540)[2] > 200);

        let panned = render(
            LayoutParams {
                presenter_x: 100.0,
                ..Default::default()
            },
            "",
        );
        let p = px(&panned, 1260, 540);
        assert!(p[0] > 200 && p[2] < 30, "{p:?}");

        // Uncovered area stays cleared to black.
        let gap = px(&panned, 500, 540);
        assert!(gap[0] < 5 && gap[1] < 5 && gap[2] < 5, "{gap:?}");
    }

    #[test]
    fn zoom_scales_about_the_center() {
        let flat = px(&render(LayoutParams::default(), ""), 300, 540);
        assert!(flat[0] > flat[2] + 30, "{flat:?}");

        let zoomed = render(
            LayoutParams {
                presenter_zoom: 2.0,
                ..Default::default()
            },
            "",
        );
        let z = px(&zoomed, 300, 540);
        assert!(z[2] > z[0] + 30, "{z:?}");
    }

    #[test]
    fn blank_overlay_draws_nothing_extra() {
        let plain = render(LayoutParams::default(), "");
        let blank = render(LayoutParams::default(), "  \n\t\n");
        assert_eq!(plain, blank);
    }

    #[test]
    fn text_changes_pixels_when_fonts_are_available() {
        let compositor = Compositor::new(None);
        if compositor.font_count() == 0 {
            return;
        }
        let params = LayoutParams::default();
        let plain = compositor.composite_decoded("", &params, &background()).unwrap();
        let titled = compositor
            .composite_decoded("BIG\nNEWS", &params, &background())
            .unwrap();
        assert_ne!(plain, titled);
    }

    #[test]
    fn text_layer_escapes_and_colors_lines() {
        let lines = layout_text("R&D <NOW>\nTOO", &LayoutParams::default(), Surface::EXPORT);
        let svg = text_layer_svg(&lines, Surface::EXPORT);
        assert!(svg.contains("R&amp;D &lt;NOW&gt;"));
        assert!(svg.contains(r##"fill="#FFFFFF">R&amp;D"##));
        assert!(svg.contains(r##"fill="#FFE200">TOO"##));
        assert!(svg.contains("rotate(-5)"));
        assert!(svg.contains("rotate(-3)"));
        assert_eq!(svg.matches("filter=\"url(#shadow)\"").count(), 2);
    }

    #[test]
    fn text_layer_parses_without_fonts() {
        let lines = layout_text("HELLO", &LayoutParams::default(), Surface::EXPORT);
        let mut pixmap = Pixmap::new(EXPORT_WIDTH, EXPORT_HEIGHT).unwrap();
        compositor().draw_text(&mut pixmap, &lines).unwrap();
    }

    #[test]
    fn forbidden_characters_are_dropped_from_the_text_layer() {
        assert_eq!(escape_xml("A\u{1}B\u{1F}C\u{FFFF}\tD"), "ABC\tD");

        let lines = layout_text("A\u{1}B\u{8}\nGO\u{FFFE}", &LayoutParams::default(), Surface::EXPORT);
        let svg = text_layer_svg(&lines, Surface::EXPORT);
        assert!(svg.contains(">AB<"));
        assert!(svg.contains(">GO<"));
        let mut pixmap = Pixmap::new(EXPORT_WIDTH, EXPORT_HEIGHT).unwrap();
        compositor().draw_text(&mut pixmap, &lines).unwrap();
    }
}
