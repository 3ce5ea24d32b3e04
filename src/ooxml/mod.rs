#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// In-memory zip package with lazily parsed parts and relationships.
pub mod package;
/// Minimal read-only XML element tree.
pub mod xml;

pub use package::{Package, Relationship, rel};
pub use xml::XmlNode;

/// Twentieths of a point (twips) to points.
pub fn twips_to_pt(twips: f64) -> f64 {
    twips / 20.0
}

/// Half-points (`w:sz`) to points.
pub fn half_pt_to_pt(half_points: f64) -> f64 {
    half_points / 2.0
}

/// Eighths of a point (border `w:sz`) to points.
pub fn eighth_pt_to_pt(eighths: f64) -> f64 {
    eighths / 8.0
}

/// English Metric Units to points.
pub fn emu_to_pt(emu: f64) -> f64 {
    emu / 12_700.0
}

/// English Metric Units to centimetres.
pub fn emu_to_cm(emu: f64) -> f64 {
    emu / 360_000.0
}

/// Whether an on/off toggle element (`<w:b/>`, `<b val="0"/>`) is switched on.
/// A missing element is off; a present element is on unless its value says
/// otherwise.
pub fn is_on(node: Option<&XmlNode>) -> bool {
    match node {
        None => false,
        Some(n) => !matches!(
            n.val().map(str::to_ascii_lowercase).as_deref(),
            Some("0" | "false" | "off" | "none")
        ),
    }
}

/// Formats a measurement without trailing zero noise (`12`, `10.5`).
pub fn fmt_num(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded}")
    }
}
