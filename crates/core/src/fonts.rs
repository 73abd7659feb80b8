//! Font discovery for the overlay text.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use usvg::fontdb;

/// Families tried in order for the overlay lines.
pub const DISPLAY_FAMILIES: [&str; 4] = ["Bebas Neue", "Oswald", "Impact", "Anton"];

/// System fonts plus every font file found in `extra_dir`.
pub fn build_fontdb(extra_dir: Option<&Path>) -> Arc<fontdb::Database> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    if let Some(dir) = extra_dir {
        load_fonts_from_dir(&mut db, dir);
    }

    let faces = db.len();
    if faces == 0 {
        warn!("no fonts found; overlay text will not be drawn");
    } else {
        debug!(faces, "font database ready");
    }
    Arc::new(db)
}

fn load_fonts_from_dir(db: &mut fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        warn!(dir = %dir.display(), "font directory is not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            warn!(path = %path.display(), error = %e, "skipping unreadable font");
        }
    }
}

/// Resolver that never gives up: when no listed family matches it falls back
/// to generic families and finally to any face, so text is always drawn.
pub fn display_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, db| {
            let mut families = Vec::<fontdb::Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => fontdb::Family::Name(s),
                });
            }
            families.push(fontdb::Family::SansSerif);

            let stretch = match font.stretch() {
                usvg::FontStretch::UltraCondensed => fontdb::Stretch::UltraCondensed,
                usvg::FontStretch::ExtraCondensed => fontdb::Stretch::ExtraCondensed,
                usvg::FontStretch::Condensed => fontdb::Stretch::Condensed,
                usvg::FontStretch::SemiCondensed => fontdb::Stretch::SemiCondensed,
                usvg::FontStretch::Normal => fontdb::Stretch::Normal,
                usvg::FontStretch::SemiExpanded => fontdb::Stretch::SemiExpanded,
                usvg::FontStretch::Expanded => fontdb::Stretch::Expanded,
                usvg::FontStretch::ExtraExpanded => fontdb::Stretch::ExtraExpanded,
                usvg::FontStretch::UltraExpanded => fontdb::Stretch::UltraExpanded,
            };

            let style = match font.style() {
                usvg::FontStyle::Normal => fontdb::Style::Normal,
                usvg::FontStyle::Italic => fontdb::Style::Italic,
                usvg::FontStyle::Oblique => fontdb::Style::Oblique,
            };

            let query = fontdb::Query {
                families: &families,
                weight: fontdb::Weight(font.weight()),
                stretch,
                style,
            };

            if let Some(id) = db.query(&query) {
                return Some(id);
            }
            db.faces().next().map(|f| f.id)
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

/// CSS/SVG `font-family` value for the overlay lines.
pub fn display_family_list() -> String {
    let mut list: Vec<String> = DISPLAY_FAMILIES.iter().map(|f| format!("'{f}'")).collect();
    list.push("sans-serif".to_string());
    list.join(", ")
}
