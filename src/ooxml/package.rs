#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    collections::HashMap,
    io::{Cursor, Read},
    path::Path,
    sync::OnceLock,
};

use tracing::debug;
use zip::ZipArchive;

use super::xml::XmlNode;
use crate::error::{Extracted, ScoringError};

/// Name of the content-types part every OOXML package carries.
pub const CONTENT_TYPES: &str = "[Content_Types].xml";

/// Relationship type suffixes (the part after the last `/`).
pub mod rel {
    /// main document / workbook part
    pub const OFFICE_DOCUMENT: &str = "officeDocument";
    /// header part
    pub const HEADER: &str = "header";
    /// footer part
    pub const FOOTER: &str = "footer";
    /// embedded image
    pub const IMAGE: &str = "image";
    /// hyperlink target
    pub const HYPERLINK: &str = "hyperlink";
    /// worksheet part
    pub const WORKSHEET: &str = "worksheet";
    /// drawing part
    pub const DRAWING: &str = "drawing";
    /// chart part
    pub const CHART: &str = "chart";
    /// pivot table part
    pub const PIVOT_TABLE: &str = "pivotTable";
    /// pivot cache definition part
    pub const PIVOT_CACHE: &str = "pivotCacheDefinition";
    /// attached template
    pub const ATTACHED_TEMPLATE: &str = "attachedTemplate";
}

/// One entry of a `.rels` part.
#[derive(Debug, Clone)]
pub struct Relationship {
    /// `Id` attribute, e.g. `rId3`
    pub id:       String,
    /// full relationship type URI
    pub rel_type: String,
    /// resolved part name, or the raw target for external relationships
    pub target:   String,
    /// whether `TargetMode="External"`
    pub external: bool,
}

impl Relationship {
    /// Whether the relationship type URI ends with the given suffix.
    pub fn is(&self, suffix: &str) -> bool {
        self.rel_type.rsplit('/').next() == Some(suffix)
    }
}

/// Cached parse result of a part; errors are kept as text.
type ParsedPart = OnceLock<Result<XmlNode, String>>;

/// An opened OOXML package held entirely in memory.
///
/// Parts are parsed on first access and cached, so a package can be shared
/// read-only between rules without re-parsing.
pub struct Package {
    /// raw part bytes keyed by part name (no leading `/`)
    entries: HashMap<String, Vec<u8>>,
    /// lower-cased part name to stored part name
    folded:  HashMap<String, String>,
    /// lazily parsed XML trees
    parsed:  HashMap<String, ParsedPart>,
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("parts", &self.entries.len())
            .finish()
    }
}

impl Package {
    /// Reads and unpacks a package from disk, refusing files larger than
    /// `max_bytes` (compressed or uncompressed).
    pub fn open(path: &Path, max_bytes: u64) -> Result<Self, ScoringError> {
        let meta = std::fs::metadata(path).map_err(|e| {
            ScoringError::DocumentUnavailable(format!("{}: {e}", path.display()))
        })?;
        if meta.len() > max_bytes {
            return Err(ScoringError::DocumentUnavailable(format!(
                "{} is {} bytes, above the {max_bytes} byte limit",
                path.display(),
                meta.len()
            )));
        }
        let bytes = std::fs::read(path).map_err(|e| {
            ScoringError::DocumentUnavailable(format!("{}: {e}", path.display()))
        })?;
        Self::from_bytes(&bytes, max_bytes)
    }

    /// Unpacks a package from bytes.
    pub fn from_bytes(bytes: &[u8], max_bytes: u64) -> Result<Self, ScoringError> {
        let unavailable = |e: &dyn std::fmt::Display| {
            ScoringError::DocumentUnavailable(format!("not a readable zip package: {e}"))
        };
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| unavailable(&e))?;

        let mut entries = HashMap::new();
        let mut total: u64 = 0;
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).map_err(|e| unavailable(&e))?;
            if file.is_dir() {
                continue;
            }
            total = total.saturating_add(file.size());
            if total > max_bytes {
                return Err(ScoringError::DocumentUnavailable(format!(
                    "package expands past the {max_bytes} byte limit"
                )));
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut buf = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut buf).map_err(|e| unavailable(&e))?;
            entries.insert(name, buf);
        }

        debug!("unpacked {} parts", entries.len());
        let folded = entries
            .keys()
            .map(|k| (k.to_lowercase(), k.clone()))
            .collect();
        let parsed = entries
            .keys()
            .map(|k| (k.clone(), OnceLock::new()))
            .collect();
        Ok(Self {
            entries,
            folded,
            parsed,
        })
    }

    /// Stored name of a part, matching case-insensitively.
    fn stored_name<'a>(&'a self, name: &str) -> Option<&'a str> {
        let name = name.trim_start_matches('/');
        if let Some((k, _)) = self.entries.get_key_value(name) {
            return Some(k.as_str());
        }
        self.folded.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Whether the package has a part with this name.
    pub fn has(&self, name: &str) -> bool {
        self.stored_name(name).is_some()
    }

    /// Raw bytes of a part.
    pub fn bytes(&self, name: &str) -> Option<&[u8]> {
        self.stored_name(name)
            .and_then(|n| self.entries.get(n))
            .map(Vec::as_slice)
    }

    /// All part names.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Parsed XML of an optional part. An absent part is `Ok(None)`; a part
    /// that exists but does not parse is an extraction fault.
    pub fn xml(&self, name: &str) -> Extracted<&XmlNode> {
        let Some(stored) = self.stored_name(name) else {
            return Ok(None);
        };
        let (Some(bytes), Some(slot)) = (self.entries.get(stored), self.parsed.get(stored)) else {
            return Ok(None);
        };
        match slot.get_or_init(|| XmlNode::parse(bytes).map_err(|e| format!("{e:#}"))) {
            Ok(node) => Ok(Some(node)),
            Err(e) => Err(ScoringError::fault(format!("part {stored} is malformed: {e}"))),
        }
    }

    /// Parsed XML of a part the document cannot do without.
    pub fn required_xml(&self, name: &str) -> Result<&XmlNode, ScoringError> {
        match self.xml(name) {
            Ok(Some(node)) => Ok(node),
            Ok(None) => Err(ScoringError::DocumentUnavailable(format!("missing part {name}"))),
            Err(e) => Err(ScoringError::DocumentUnavailable(e.to_string())),
        }
    }

    /// Relationships declared by `part` (or by the package when `part` is
    /// empty), with internal targets resolved to part names.
    pub fn relationships(&self, part: &str) -> Result<Vec<Relationship>, ScoringError> {
        let rels_name = rels_part_for(part);
        let Some(root) = self.xml(&rels_name)? else {
            return Ok(Vec::new());
        };
        Ok(root
            .children_named("Relationship")
            .filter_map(|r| {
                let id = r.attr("Id")?.to_string();
                let rel_type = r.attr("Type").unwrap_or_default().to_string();
                let raw = r.attr("Target")?;
                let external = r.attr("TargetMode") == Some("External");
                let target = if external {
                    raw.to_string()
                } else {
                    resolve_target(part, raw)
                };
                Some(Relationship {
                    id,
                    rel_type,
                    target,
                    external,
                })
            })
            .collect())
    }

    /// Target part of the relationship `id` declared by `part`.
    pub fn related_by_id(&self, part: &str, id: &str) -> Result<Option<String>, ScoringError> {
        Ok(self
            .relationships(part)?
            .into_iter()
            .find(|r| r.id == id)
            .map(|r| r.target))
    }

    /// Targets of every relationship of the given type declared by `part`.
    pub fn related(&self, part: &str, suffix: &str) -> Result<Vec<String>, ScoringError> {
        Ok(self
            .relationships(part)?
            .into_iter()
            .filter(|r| r.is(suffix) && !r.external)
            .map(|r| r.target)
            .collect())
    }

    /// Locates the main part through the package relationships, falling back
    /// to the conventional name.
    pub fn main_part(&self, fallback: &str) -> Result<String, ScoringError> {
        if !self.has(CONTENT_TYPES) {
            return Err(ScoringError::DocumentUnavailable(format!(
                "missing {CONTENT_TYPES}, not an OOXML package"
            )));
        }
        let declared = self
            .related("", rel::OFFICE_DOCUMENT)
            .map_err(|e| ScoringError::DocumentUnavailable(e.to_string()))?
            .into_iter()
            .find(|t| self.has(t));
        Ok(declared.unwrap_or_else(|| fallback.to_string()))
    }
}

/// Name of the relationships part belonging to `part`.
fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None if part.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolves a relationship target relative to the directory of its source
/// part, normalising `.` and `..` segments.
pub fn resolve_target(source: &str, target: &str) -> String {
    if let Some(abs) = target.strip_prefix('/') {
        return abs.to_string();
    }
    let mut segments: Vec<&str> = match source.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for seg in target.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_targets() {
        assert_eq!(resolve_target("word/document.xml", "media/image1.png"), "word/media/image1.png");
        assert_eq!(
            resolve_target("xl/drawings/drawing1.xml", "../charts/chart1.xml"),
            "xl/charts/chart1.xml"
        );
        assert_eq!(resolve_target("", "word/document.xml"), "word/document.xml");
        assert_eq!(resolve_target("xl/workbook.xml", "/xl/worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
    }

    #[test]
    fn rels_part_names() {
        assert_eq!(rels_part_for(""), "_rels/.rels");
        assert_eq!(rels_part_for("word/document.xml"), "word/_rels/document.xml.rels");
    }
}
