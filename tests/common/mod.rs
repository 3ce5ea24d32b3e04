#![allow(dead_code)]

use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use docgrade::{DocumentKind, OperationPoint};
use uuid::Uuid;
use zip::{ZipWriter, write::SimpleFileOptions};

const SML: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const WML: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CHART_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";
const DRAWING_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const XDR_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";
const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const WPS_NS: &str = "http://schemas.microsoft.com/office/word/2010/wordprocessingShape";

/// A fresh, empty directory under the system temp dir.
pub fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("docgrade-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

/// Writes `parts` as a zip package at `path`.
pub fn write_package(path: &Path, parts: &[(String, String)]) {
    let file = File::create(path).expect("create package");
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (name, body) in parts {
        zip.start_file(name.as_str(), options).expect("start part");
        zip.write_all(body.as_bytes()).expect("write part");
    }
    zip.finish().expect("finish package");
}

/// A `_rels/*.rels` part from (id, type suffix, target) triples.
fn rels(entries: &[(&str, &str, &str)]) -> String {
    let body: String = entries
        .iter()
        .map(|(id, kind, target)| {
            format!(r#"<Relationship Id="{id}" Type="{REL}/{kind}" Target="{target}"/>"#)
        })
        .collect();
    format!(r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="{PKG_REL}">{body}</Relationships>"#)
}

fn content_types() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/></Types>"#
        .to_string()
}

/// Builder for small spreadsheet fixtures.
#[derive(Default)]
pub struct Xlsx {
    sheets:        Vec<(String, String)>,
    styles:        Option<String>,
    defined_names: String,
    charts:        Vec<(usize, String)>,
    pivots:        Vec<(usize, String, String)>,
}

impl Xlsx {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a worksheet whose `<worksheet>` body is `body`.
    pub fn sheet(mut self, name: &str, body: &str) -> Self {
        self.sheets.push((name.to_string(), body.to_string()));
        self
    }

    /// Sets the `<styleSheet>` body.
    pub fn styles(mut self, body: &str) -> Self {
        self.styles = Some(body.to_string());
        self
    }

    /// Sets the `<definedNames>` body.
    pub fn defined_names(mut self, body: &str) -> Self {
        self.defined_names = body.to_string();
        self
    }

    /// Embeds a chart whose `<c:chart>` body is `body` on sheet `sheet`
    /// (0-based).
    pub fn chart(mut self, sheet: usize, body: &str) -> Self {
        self.charts.push((sheet, body.to_string()));
        self
    }

    /// Attaches a pivot table to sheet `sheet` (0-based): `table` is the
    /// `<pivotTableDefinition>` body, `fields` the cache field names.
    pub fn pivot(mut self, sheet: usize, table: &str, fields: &[&str]) -> Self {
        let fields: String = fields
            .iter()
            .map(|f| format!(r#"<cacheField name="{f}" numFmtId="0"/>"#))
            .collect();
        self.pivots.push((sheet, table.to_string(), fields));
        self
    }

    pub fn parts(&self) -> Vec<(String, String)> {
        let mut parts = vec![
            ("[Content_Types].xml".to_string(), content_types()),
            ("_rels/.rels".to_string(), rels(&[("rId1", "officeDocument", "xl/workbook.xml")])),
        ];

        let mut wb_rels: Vec<(String, String, String)> = Vec::new();
        let mut sheet_list = String::new();
        for (i, (name, _)) in self.sheets.iter().enumerate() {
            let id = format!("rId{}", i + 1);
            sheet_list.push_str(&format!(r#"<sheet name="{name}" sheetId="{}" r:id="{id}"/>"#, i + 1));
            wb_rels.push((id, "worksheet".into(), format!("worksheets/sheet{}.xml", i + 1)));
        }
        if self.styles.is_some() {
            wb_rels.push(("rIdStyles".into(), "styles".into(), "styles.xml".into()));
        }
        let names = if self.defined_names.is_empty() {
            String::new()
        } else {
            format!("<definedNames>{}</definedNames>", self.defined_names)
        };
        parts.push((
            "xl/workbook.xml".into(),
            format!(r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="{SML}" xmlns:r="{REL}"><sheets>{sheet_list}</sheets>{names}</workbook>"#),
        ));
        let triples: Vec<(&str, &str, &str)> = wb_rels
            .iter()
            .map(|(a, b, c)| (a.as_str(), b.as_str(), c.as_str()))
            .collect();
        parts.push(("xl/_rels/workbook.xml.rels".into(), rels(&triples)));
        if let Some(styles) = &self.styles {
            parts.push((
                "xl/styles.xml".into(),
                format!(r#"<?xml version="1.0" encoding="UTF-8"?><styleSheet xmlns="{SML}">{styles}</styleSheet>"#),
            ));
        }

        for (i, (_, body)) in self.sheets.iter().enumerate() {
            let charts: Vec<(usize, &String)> = self
                .charts
                .iter()
                .enumerate()
                .filter(|(_, (s, _))| *s == i)
                .map(|(n, (_, c))| (n + 1, c))
                .collect();
            let drawing_ref = if charts.is_empty() { "" } else { r#"<drawing r:id="rIdDrawing"/>"# };
            parts.push((
                format!("xl/worksheets/sheet{}.xml", i + 1),
                format!(r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="{SML}" xmlns:r="{REL}">{body}{drawing_ref}</worksheet>"#),
            ));

            let mut sheet_rels: Vec<(String, &str, String)> = Vec::new();
            for (n, (_, table, fields)) in self.pivots.iter().enumerate().filter(|(_, (s, _, _))| *s == i) {
                let n = n + 1;
                sheet_rels.push((format!("rIdPivot{n}"), "pivotTable", format!("../pivotTables/pivotTable{n}.xml")));
                parts.push((
                    format!("xl/pivotTables/pivotTable{n}.xml"),
                    format!(r#"<?xml version="1.0" encoding="UTF-8"?><pivotTableDefinition xmlns="{SML}" name="PivotTable{n}" cacheId="{n}">{table}</pivotTableDefinition>"#),
                ));
                parts.push((
                    format!("xl/pivotTables/_rels/pivotTable{n}.xml.rels"),
                    rels(&[("rId1", "pivotCacheDefinition", &format!("../pivotCache/pivotCacheDefinition{n}.xml"))]),
                ));
                parts.push((
                    format!("xl/pivotCache/pivotCacheDefinition{n}.xml"),
                    format!(r#"<?xml version="1.0" encoding="UTF-8"?><pivotCacheDefinition xmlns="{SML}"><cacheFields>{fields}</cacheFields></pivotCacheDefinition>"#),
                ));
            }
            if !charts.is_empty() {
                sheet_rels.push(("rIdDrawing".into(), "drawing", format!("../drawings/drawing{}.xml", i + 1)));
            }
            if !sheet_rels.is_empty() {
                let triples: Vec<(&str, &str, &str)> = sheet_rels
                    .iter()
                    .map(|(id, kind, target)| (id.as_str(), *kind, target.as_str()))
                    .collect();
                parts.push((format!("xl/worksheets/_rels/sheet{}.xml.rels", i + 1), rels(&triples)));
            }
            if charts.is_empty() {
                continue;
            }
            let mut anchors = String::new();
            let mut drawing_rels = Vec::new();
            for (n, body) in charts {
                anchors.push_str(&format!(
                    r#"<xdr:twoCellAnchor><xdr:graphicFrame><a:graphic><a:graphicData><c:chart r:id="rIdChart{n}"/></a:graphicData></a:graphic></xdr:graphicFrame></xdr:twoCellAnchor>"#
                ));
                drawing_rels.push((format!("rIdChart{n}"), format!("../charts/chart{n}.xml")));
                parts.push((
                    format!("xl/charts/chart{n}.xml"),
                    format!(r#"<?xml version="1.0" encoding="UTF-8"?><c:chartSpace xmlns:c="{CHART_NS}" xmlns:a="{DRAWING_NS}" xmlns:r="{REL}"><c:chart>{body}</c:chart></c:chartSpace>"#),
                ));
            }
            parts.push((
                format!("xl/drawings/drawing{}.xml", i + 1),
                format!(r#"<?xml version="1.0" encoding="UTF-8"?><xdr:wsDr xmlns:xdr="{XDR_NS}" xmlns:a="{DRAWING_NS}" xmlns:c="{CHART_NS}" xmlns:r="{REL}">{anchors}</xdr:wsDr>"#),
            ));
            let triples: Vec<(&str, &str, &str)> = drawing_rels
                .iter()
                .map(|(id, target)| (id.as_str(), "chart", target.as_str()))
                .collect();
            parts.push((format!("xl/drawings/_rels/drawing{}.xml.rels", i + 1), rels(&triples)));
        }
        parts
    }

    /// Writes the workbook into a fresh temp dir and returns its path.
    pub fn write(&self) -> PathBuf {
        let path = temp_dir().join("answer.xlsx");
        write_package(&path, &self.parts());
        path
    }
}

/// A `<sheetData>` body from (cell, inline string) pairs, one row per
/// distinct row number.
pub fn sheet_data(cells: &[(&str, &str)]) -> String {
    let mut rows: std::collections::BTreeMap<u32, String> = Default::default();
    for (at, value) in cells {
        let row: u32 = at
            .trim_start_matches(|c: char| c.is_ascii_alphabetic())
            .parse()
            .expect("cell reference");
        let cell = match value.parse::<f64>() {
            Ok(_) => format!(r#"<c r="{at}"><v>{value}</v></c>"#),
            Err(_) => format!(r#"<c r="{at}" t="inlineStr"><is><t>{value}</t></is></c>"#),
        };
        rows.entry(row).or_default().push_str(&cell);
    }
    let body: String = rows
        .into_iter()
        .map(|(r, cells)| format!(r#"<row r="{r}">{cells}</row>"#))
        .collect();
    format!("<sheetData>{body}</sheetData>")
}

/// Namespace declarations carried by every word-processing part root.
fn wml_namespaces() -> String {
    format!(
        r#"xmlns:w="{WML}" xmlns:r="{REL}" xmlns:wp="{WP_NS}" xmlns:a="{DRAWING_NS}" xmlns:pic="{PIC_NS}" xmlns:wps="{WPS_NS}" xmlns:v="urn:schemas-microsoft-com:vml""#
    )
}

/// Builder for small word-processing fixtures.
#[derive(Default)]
pub struct Docx {
    body:       String,
    background: String,
    styles:     Option<String>,
    numbering:  Option<String>,
    settings:   Option<String>,
    footnotes:  Option<String>,
    comments:   Option<String>,
    headers:    Vec<String>,
    footers:    Vec<String>,
    links:      Vec<(String, String)>,
}

impl Docx {
    /// A document whose `<w:body>` is `body`.
    pub fn new(body: &str) -> Self {
        Self {
            body: body.to_string(),
            ..Self::default()
        }
    }

    /// Sets the `<w:background>` element placed before the body.
    pub fn background(mut self, element: &str) -> Self {
        self.background = element.to_string();
        self
    }

    /// Sets the `<w:styles>` body.
    pub fn styles(mut self, body: &str) -> Self {
        self.styles = Some(body.to_string());
        self
    }

    /// Sets the `<w:numbering>` body.
    pub fn numbering(mut self, body: &str) -> Self {
        self.numbering = Some(body.to_string());
        self
    }

    /// Sets the `<w:settings>` body.
    pub fn settings(mut self, body: &str) -> Self {
        self.settings = Some(body.to_string());
        self
    }

    /// Sets the `<w:footnotes>` body.
    pub fn footnotes(mut self, body: &str) -> Self {
        self.footnotes = Some(body.to_string());
        self
    }

    /// Sets the `<w:comments>` body.
    pub fn comments(mut self, body: &str) -> Self {
        self.comments = Some(body.to_string());
        self
    }

    /// Adds a header part whose `<w:hdr>` body is `body`.
    pub fn header(mut self, body: &str) -> Self {
        self.headers.push(body.to_string());
        self
    }

    /// Adds a footer part whose `<w:ftr>` body is `body`.
    pub fn footer(mut self, body: &str) -> Self {
        self.footers.push(body.to_string());
        self
    }

    /// Declares an external hyperlink relationship `id` pointing at `url`.
    pub fn hyperlink(mut self, id: &str, url: &str) -> Self {
        self.links.push((id.to_string(), url.to_string()));
        self
    }

    pub fn parts(&self) -> Vec<(String, String)> {
        let ns = wml_namespaces();
        let mut doc_rels: Vec<(String, &str, String)> = Vec::new();
        let mut parts = vec![
            ("[Content_Types].xml".to_string(), content_types()),
            ("_rels/.rels".to_string(), rels(&[("rId1", "officeDocument", "word/document.xml")])),
            (
                "word/document.xml".to_string(),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><w:document {ns}>{}<w:body>{}</w:body></w:document>"#,
                    self.background, self.body
                ),
            ),
        ];
        let singles = [
            ("styles", "styles", &self.styles),
            ("numbering", "numbering", &self.numbering),
            ("settings", "settings", &self.settings),
            ("footnotes", "footnotes", &self.footnotes),
            ("comments", "comments", &self.comments),
        ];
        for (kind, root, body) in singles {
            if let Some(body) = body {
                doc_rels.push((format!("rId{kind}"), kind, format!("{kind}.xml")));
                parts.push((
                    format!("word/{kind}.xml"),
                    format!(r#"<?xml version="1.0" encoding="UTF-8"?><w:{root} {ns}>{body}</w:{root}>"#),
                ));
            }
        }
        for (kind, root, bodies) in [("header", "hdr", &self.headers), ("footer", "ftr", &self.footers)] {
            for (n, body) in bodies.iter().enumerate() {
                let n = n + 1;
                doc_rels.push((format!("rId{kind}{n}"), kind, format!("{kind}{n}.xml")));
                parts.push((
                    format!("word/{kind}{n}.xml"),
                    format!(r#"<?xml version="1.0" encoding="UTF-8"?><w:{root} {ns}>{body}</w:{root}>"#),
                ));
            }
        }
        let mut entries: String = doc_rels
            .iter()
            .map(|(id, kind, target)| {
                format!(r#"<Relationship Id="{id}" Type="{REL}/{kind}" Target="{target}"/>"#)
            })
            .collect();
        for (id, url) in &self.links {
            entries.push_str(&format!(
                r#"<Relationship Id="{id}" Type="{REL}/hyperlink" Target="{url}" TargetMode="External"/>"#
            ));
        }
        parts.push((
            "word/_rels/document.xml.rels".to_string(),
            format!(r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="{PKG_REL}">{entries}</Relationships>"#),
        ));
        parts
    }

    /// Writes the document into a fresh temp dir and returns its path.
    pub fn write(&self) -> PathBuf {
        let path = temp_dir().join("answer.docx");
        write_package(&path, &self.parts());
        path
    }
}

/// Writes a minimal `.docx` whose `<w:body>` is `body`, with an optional
/// styles part body.
pub fn docx(body: &str, styles: Option<&str>) -> PathBuf {
    let doc = Docx::new(body);
    match styles {
        Some(styles) => doc.styles(styles).write(),
        None => doc.write(),
    }
}

/// A body paragraph with one run.
pub fn paragraph(text: &str, ppr: &str, rpr: &str) -> String {
    format!(r#"<w:p><w:pPr>{ppr}</w:pPr><w:r><w:rPr>{rpr}</w:rPr><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#)
}

/// An operation point worth `score` for an explicit tag.
pub fn point(kind: DocumentKind, id: &str, tag: &str, score: f64, params: &[(&str, &str)]) -> OperationPoint {
    let mut point = OperationPoint::builder()
        .id(id)
        .name(tag)
        .kind(kind)
        .score(score)
        .build();
    for (k, v) in params {
        point = point.with_param(*k, *v);
    }
    point
}

/// Writes bytes that are not a zip package under `name`.
pub fn corrupt_file(name: &str) -> PathBuf {
    let path = temp_dir().join(name);
    std::fs::write(&path, b"this is not a zip archive").expect("write corrupt file");
    path
}
