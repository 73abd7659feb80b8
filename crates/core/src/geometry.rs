//! Layout math shared by the live preview and the 1920×1080 export.
//!
//! All positions are derived from [`LayoutParams`] and a [`Surface`]. The
//! preview is just a smaller surface: evaluating the same functions on a
//! surface of width `w` gives the export layout scaled by `w / 1920`. Nothing
//! in here knows which of the two it is drawing for.

use crate::model::LayoutParams;
use resvg::tiny_skia::Transform;

pub const EXPORT_WIDTH: u32 = 1920;
pub const EXPORT_HEIGHT: u32 = 1080;

/// Horizontal offset added per line, in export pixels.
pub const LINE_STAGGER: f32 = 15.0;
/// Line pitch as a fraction of the font size.
pub const LINE_SPACING: f32 = 0.9;
/// Extra tilt alternating between lines, in degrees.
pub const LINE_TILT: f32 = 1.0;

/// Fill of odd lines.
pub const ACCENT_LINE_RGB: [u8; 3] = [0xFF, 0xE2, 0x00];

/// Drawing area the layout is evaluated for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub width: f32,
    pub height: f32,
}

impl Surface {
    pub const EXPORT: Surface = Surface {
        width: EXPORT_WIDTH as f32,
        height: EXPORT_HEIGHT as f32,
    };

    /// A 16:9 preview rendered `rendered_width` pixels wide.
    pub fn preview(rendered_width: f32) -> Self {
        Self {
            width: rendered_width,
            height: rendered_width * EXPORT_HEIGHT as f32 / EXPORT_WIDTH as f32,
        }
    }

    /// Ratio between this surface and the export surface.
    pub fn scale(&self) -> f32 {
        self.width / EXPORT_WIDTH as f32
    }

    fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }
}

/// Pan and zoom of the background around the surface center.
///
/// Expressed the way CSS applies `scale(z) translate(a%, b%)`: the
/// translation lives in the unscaled frame, as a percentage of the surface,
/// and is divided by the zoom so the visible shift stays
/// `(param - 50) / 100 * dimension` whatever the zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresenterTransform {
    pub zoom: f32,
    /// Pre-scale translation in percent of the surface width.
    pub translate_x_pct: f32,
    /// Pre-scale translation in percent of the surface height.
    pub translate_y_pct: f32,
    surface: Surface,
}

impl PresenterTransform {
    pub fn new(params: &LayoutParams, surface: Surface) -> Self {
        let p = params.clamped();
        Self {
            zoom: p.presenter_zoom,
            translate_x_pct: (p.presenter_x - 50.0) / p.presenter_zoom,
            translate_y_pct: (p.presenter_y - 50.0) / p.presenter_zoom,
            surface,
        }
    }

    /// Translation applied before the zoom, in surface pixels.
    pub fn pre_scale_offset(&self) -> (f32, f32) {
        (
            self.translate_x_pct / 100.0 * self.surface.width,
            self.translate_y_pct / 100.0 * self.surface.height,
        )
    }

    /// Visible shift of the background, in surface pixels.
    pub fn offset(&self) -> (f32, f32) {
        let (x, y) = self.pre_scale_offset();
        (x * self.zoom, y * self.zoom)
    }

    /// Where a point of the unzoomed background ends up on the surface.
    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        let (cx, cy) = self.surface.center();
        let (tx, ty) = self.pre_scale_offset();
        (
            cx + self.zoom * (x - cx + tx),
            cy + self.zoom * (y - cy + ty),
        )
    }

    /// CSS `transform` for the preview `<img>`, with `transform-origin: center`.
    pub fn css(&self) -> String {
        format!(
            "scale({}) translate({}%, {}%)",
            self.zoom, self.translate_x_pct, self.translate_y_pct
        )
    }

    /// Raster transform: translate to center, zoom, translate back plus offset.
    pub fn to_transform(&self) -> Transform {
        let (cx, cy) = self.surface.center();
        let (tx, ty) = self.pre_scale_offset();
        Transform::from_translate(cx, cy)
            .pre_scale(self.zoom, self.zoom)
            .pre_translate(-cx + tx, -cy + ty)
    }
}

/// Scale and offset placing an image of the given size over the whole
/// surface without distortion, cropping the overflow ("object-cover").
pub fn cover_fit(image_width: u32, image_height: u32, surface: Surface) -> Transform {
    let iw = image_width.max(1) as f32;
    let ih = image_height.max(1) as f32;
    let s = (surface.width / iw).max(surface.height / ih);
    Transform::from_row(
        s,
        0.0,
        0.0,
        s,
        (surface.width - iw * s) / 2.0,
        (surface.height - ih * s) / 2.0,
    )
}

/// Fill color class of a text line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFill {
    Primary,
    Accent,
}

impl LineFill {
    pub fn for_index(index: usize) -> Self {
        if index % 2 == 0 {
            LineFill::Primary
        } else {
            LineFill::Accent
        }
    }

    pub fn rgb(self) -> [u8; 3] {
        match self {
            LineFill::Primary => [0xFF, 0xFF, 0xFF],
            LineFill::Accent => ACCENT_LINE_RGB,
        }
    }

    pub fn hex(self) -> String {
        let [r, g, b] = self.rgb();
        format!("#{r:02X}{g:02X}{b:02X}")
    }
}

/// Placement of one overlay line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    pub text: String,
    pub index: usize,
    /// Origin of the line (left edge, vertical middle), stagger included.
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub rotation_deg: f32,
    pub stagger: f32,
    pub fill: LineFill,
}

impl LineLayout {
    /// Same line on a surface `factor` times as wide.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            text: self.text.clone(),
            x: self.x * factor,
            y: self.y * factor,
            font_size: self.font_size * factor,
            stagger: self.stagger * factor,
            ..*self
        }
    }
}

/// Non-blank lines of the overlay text, in order.
pub fn overlay_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .filter(|l| !l.trim().is_empty())
        .collect()
}

/// Lays out the overlay text as a block centered on the `textY` anchor.
pub fn layout_text(text: &str, params: &LayoutParams, surface: Surface) -> Vec<LineLayout> {
    let p = params.clamped();
    let scale = surface.scale();
    let lines = overlay_lines(text);

    let font_size = p.text_size * scale;
    let spacing = font_size * LINE_SPACING;
    let anchor_x = p.text_x / 100.0 * surface.width;
    let anchor_y = p.text_y / 100.0 * surface.height;
    let middle = (lines.len() as f32 - 1.0) / 2.0;

    lines
        .into_iter()
        .enumerate()
        .map(|(index, line)| {
            let stagger = index as f32 * LINE_STAGGER * scale;
            let tilt = if index % 2 == 0 { -LINE_TILT } else { LINE_TILT };
            LineLayout {
                text: line.to_string(),
                index,
                x: anchor_x + stagger,
                y: anchor_y + (index as f32 - middle) * spacing,
                font_size,
                rotation_deg: p.text_rotation + tilt,
                stagger,
                fill: LineFill::for_index(index),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use resvg::tiny_skia::Point;

    const EPS: f32 = 1e-3;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS * a.abs().max(b.abs()).max(1.0)
    }

    fn params(zoom: f32, x: f32, y: f32) -> LayoutParams {
        LayoutParams {
            presenter_zoom: zoom,
            presenter_x: x,
            presenter_y: y,
            ..Default::default()
        }
    }

    #[test]
    fn zoomed_pan_translates_by_percent_over_zoom_before_scaling() {
        let t = PresenterTransform::new(&params(1.5, 80.0, 50.0), Surface::EXPORT);
        let (pre_x, pre_y) = t.pre_scale_offset();
        assert!(close(pre_x, (80.0 - 50.0) / 100.0 * 1920.0 / 1.5));
        assert!(close(pre_y, 0.0));

        let (dx, dy) = t.offset();
        assert!(close(dx, 576.0));
        assert!(close(dy, 0.0));
        assert_eq!(t.css(), "scale(1.5) translate(20%, 0%)");
    }

    #[test]
    fn raster_transform_matches_map_point() {
        let t = PresenterTransform::new(&params(1.37, 12.0, 91.0), Surface::EXPORT);
        let affine = t.to_transform();
        for (x, y) in [(0.0, 0.0), (960.0, 540.0), (1920.0, 1080.0), (300.0, 800.0)] {
            let mut p = Point::from_xy(x, y);
            affine.map_point(&mut p);
            let (ex, ey) = t.map_point(x, y);
            assert!(close(p.x, ex), "x {} vs {}", p.x, ex);
            assert!(close(p.y, ey), "y {} vs {}", p.y, ey);
        }
    }

    #[test]
    fn centered_params_are_identity() {
        let t = PresenterTransform::new(&LayoutParams::default(), Surface::EXPORT);
        assert_eq!(t.map_point(123.0, 456.0), (123.0, 456.0));
        assert!(t.to_transform().is_identity());
    }

    #[test]
    fn preview_and_export_place_presenter_identically() {
        let preview = Surface::preview(480.0);
        let factor = preview.scale();
        for zoom in [1.0, 1.25, 2.0] {
            for x in [0.0, 33.0, 100.0] {
                for y in [0.0, 50.0, 77.0] {
                    let p = params(zoom, x, y);
                    let export = PresenterTransform::new(&p, Surface::EXPORT);
                    let small = PresenterTransform::new(&p, preview);
                    assert_eq!(export.css(), small.css());
                    for (px, py) in [(0.0, 0.0), (1920.0, 1080.0), (700.0, 200.0)] {
                        let (ex, ey) = export.map_point(px, py);
                        let (sx, sy) = small.map_point(px * factor, py * factor);
                        assert!(close(sx, ex * factor));
                        assert!(close(sy, ey * factor));
                    }
                }
            }
        }
    }

    #[test]
    fn preview_and_export_place_text_identically() {
        let preview = Surface::preview(640.0);
        let factor = preview.scale();
        let p = LayoutParams {
            text_size: 333.0,
            text_y: 20.0,
            text_x: 40.0,
            text_rotation: 12.0,
            ..Default::default()
        };
        let text = "ONE\nTWO\n\nTHREE";
        let export = layout_text(text, &p, Surface::EXPORT);
        let small = layout_text(text, &p, preview);
        assert_eq!(export.len(), 3);
        for (e, s) in export.iter().zip(&small) {
            let expected = e.scaled(factor);
            assert!(close(s.x, expected.x));
            assert!(close(s.y, expected.y));
            assert!(close(s.font_size, expected.font_size));
            assert!(close(s.stagger, expected.stagger));
            assert_eq!(s.rotation_deg, expected.rotation_deg);
            assert_eq!(s.fill, expected.fill);
        }
    }

    #[test]
    fn blank_lines_are_dropped_and_colors_alternate() {
        let lines = layout_text("A\n\nB", &LayoutParams::default(), Surface::EXPORT);
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["A", "B"]);
        assert_eq!(lines[0].fill.hex(), "#FFFFFF");
        assert_eq!(lines[1].fill.hex(), "#FFE200");
        assert!(close(lines[1].x - lines[0].x, 15.0));
        assert_eq!(lines[0].rotation_deg, -5.0);
        assert_eq!(lines[1].rotation_deg, -3.0);
    }

    #[test]
    fn block_is_centered_on_the_anchor() {
        let p = LayoutParams::default();
        let lines = layout_text("A\nB\nC", &p, Surface::EXPORT);
        assert!(close(lines[1].y, 540.0));
        assert!(close(lines[0].y, 540.0 - 240.0 * 0.9));
        assert!(close(lines[2].y, 540.0 + 240.0 * 0.9));
        assert!(close(lines[0].x, 192.0));

        let single = layout_text("ONLY", &p, Surface::EXPORT);
        assert!(close(single[0].y, 540.0));
    }

    #[test]
    fn whitespace_only_text_yields_no_lines() {
        assert!(layout_text(" \n\t\n\r\n", &LayoutParams::default(), Surface::EXPORT).is_empty());
        assert!(layout_text("", &LayoutParams::default(), Surface::EXPORT).is_empty());
    }

    #[test]
    fn cover_fit_fills_surface_for_other_aspect_ratios() {
        let t = cover_fit(1000, 1000, Surface::EXPORT);
        assert!(close(t.sx, 1.92));
        assert!(close(t.tx, 0.0));
        assert!(close(t.ty, (1080.0 - 1920.0) / 2.0));

        let same = cover_fit(1920, 1080, Surface::EXPORT);
        assert!(same.is_identity());
    }
}
