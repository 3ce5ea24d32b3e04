#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use itertools::Itertools;

use crate::{
    error::ScoringError,
    grade::{
        Check, Params,
        compare::{squash_whitespace, text_contains, text_equals},
        vocab::{self, Vocab},
    },
    ooxml::{XmlNode, is_on, rel},
    word::{WordDocument, all_text},
};

/// Editing restrictions (`w:documentProtection/@w:edit`).
const PROTECTION_TYPES: Vocab = &[
    ("readOnly", &["只读", "read only"]),
    ("comments", &["批注"]),
    ("trackedChanges", &["修订", "tracked changes"]),
    ("forms", &["填写窗体", "窗体"]),
];

/// Field codes of every complex and simple field under `root`, with
/// whitespace squashed.
fn field_codes(root: &XmlNode) -> Vec<String> {
    let mut codes: Vec<String> = root
        .find_all("fldSimple")
        .filter_map(|f| f.attr("instr"))
        .map(|i| i.trim().to_string())
        .collect();
    let mut current = String::new();
    let mut open = false;
    for node in root.descendants() {
        if node.is("fldChar") {
            match node.attr("fldCharType") {
                Some("begin") => {
                    open = true;
                    current.clear();
                }
                Some("separate" | "end") if open => {
                    open = false;
                    codes.push(current.trim().to_string());
                }
                _ => {}
            }
        } else if open && node.is("instrText") {
            current.push_str(node.text());
        }
    }
    codes
        .into_iter()
        .map(|c| c.split_whitespace().join(" "))
        .filter(|c| !c.is_empty())
        .collect()
}

/// Field codes starting with one of `names` (case-insensitive).
fn fields_named(doc: &WordDocument, names: &[&str]) -> Vec<String> {
    field_codes(doc.body())
        .into_iter()
        .filter(|code| {
            let head = code.split(' ').next().unwrap_or_default().to_uppercase();
            names.contains(&head.as_str())
        })
        .collect()
}

/// A hyperlink exists; with `Url` or `LinkText`, one matches them.
pub fn insert_hyperlink(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let url = params.first_of(&["Url", "Address", "HyperlinkAddress"]);
    let label = params.first_of(&["LinkText", "DisplayText", "TextToDisplay"]);

    let rels = doc.main_relationships()?;
    let mut links: Vec<(String, String)> = doc
        .body()
        .find_all("hyperlink")
        .map(|h| {
            let target = h
                .attr("id")
                .and_then(|id| rels.iter().find(|r| r.id == id && r.is(rel::HYPERLINK)))
                .map(|r| r.target.clone())
                .or_else(|| h.attr("anchor").map(|a| format!("#{a}")))
                .unwrap_or_default();
            (target, all_text(h))
        })
        .collect();
    for code in fields_named(doc, &["HYPERLINK"]) {
        let target = code
            .split('"')
            .nth(1)
            .unwrap_or_default()
            .to_string();
        links.push((target, String::new()));
    }

    if url.is_none() && label.is_none() {
        return Ok(Check::presence(!links.is_empty(), "hyperlink"));
    }
    let expected = [url, label].into_iter().flatten().join(" ");
    let observed = links.into_iter().map(|(target, text)| {
        let ok = url.is_none_or(|u| {
            !target.is_empty()
                && (text_contains(Some(&target), Some(u)) || text_contains(Some(u), Some(&target)))
        }) && label.is_none_or(|l| text_contains(Some(&squash_whitespace(&text)), Some(l)));
        (format!("{target} {}", squash_whitespace(&text)).trim().to_string(), ok)
    });
    Ok(Check::any_judged("hyperlink", expected, observed))
}

/// A user bookmark exists, named `BookmarkName` when given.
pub fn insert_bookmark(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let names = doc
        .body()
        .find_all("bookmarkStart")
        .filter_map(|b| b.attr("name"))
        .filter(|n| !n.starts_with('_'))
        .map(str::to_string);
    match params.try_get("BookmarkName") {
        Some(expected) => Ok(Check::any("bookmark", expected, names, |n| {
            text_equals(Some(n), Some(expected))
        })),
        None => Ok(Check::presence(names.count() > 0, "bookmark")),
    }
}

/// A cross-reference field (REF, PAGEREF or NOTEREF) exists, pointing at
/// `BookmarkName` when given.
pub fn insert_cross_reference(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let codes = fields_named(doc, &["REF", "PAGEREF", "NOTEREF"]);
    match params.first_of(&["BookmarkName", "ReferenceTarget"]) {
        Some(target) => Ok(Check::any("cross-reference", target, codes, |c| {
            c.split(' ').nth(1).is_some_and(|t| text_equals(Some(t), Some(target)))
        })),
        None => Ok(Check::presence(!codes.is_empty(), "cross-reference")),
    }
}

/// A table of contents exists: a TOC field or a table-of-contents content
/// control.
pub fn insert_table_of_contents(doc: &WordDocument, _params: Params<'_>) -> Result<Check, ScoringError> {
    let field = !fields_named(doc, &["TOC"]).is_empty();
    let gallery = doc
        .body()
        .find_all("docPartGallery")
        .filter_map(XmlNode::val)
        .any(|g| g.contains("Table of Contents"));
    Ok(Check::presence(field || gallery, "table of contents"))
}

/// Note references of one kind in the body, with the text of each note.
fn notes(
    doc: &WordDocument,
    reference: &str,
    part: Option<&XmlNode>,
    element: &str,
) -> Vec<String> {
    doc.body()
        .find_all(reference)
        .filter_map(|r| r.attr("id"))
        .filter(|id| id.parse::<i64>().is_ok_and(|n| n > 0))
        .map(|id| {
            part.and_then(|p| {
                p.children_named(element)
                    .find(|n| n.attr("id") == Some(id))
            })
            .map(all_text)
            .unwrap_or_default()
        })
        .collect()
}

/// Checks notes against the optional `NoteText` parameter.
fn check_notes(params: &Params<'_>, subject: &str, texts: Vec<String>) -> Check {
    match params.first_of(&["NoteText", "FootnoteText", "EndnoteText"]) {
        Some(expected) => {
            let want = squash_whitespace(expected);
            Check::any(
                subject,
                expected,
                texts.into_iter().map(|t| squash_whitespace(&t)),
                |t| text_contains(Some(t), Some(&want)),
            )
        }
        None => Check::presence(!texts.is_empty(), subject),
    }
}

/// A footnote is referenced from the body.
pub fn insert_footnote(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let part = doc.footnotes()?;
    let texts = notes(doc, "footnoteReference", part, "footnote");
    Ok(check_notes(&params, "footnote", texts))
}

/// An endnote is referenced from the body.
pub fn insert_endnote(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let part = doc.endnotes()?;
    let texts = notes(doc, "endnoteReference", part, "endnote");
    Ok(check_notes(&params, "endnote", texts))
}

/// A comment exists, containing `CommentText` when given.
pub fn insert_comment(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let texts: Vec<String> = doc
        .comments()?
        .map(|c| c.children_named("comment").map(all_text).collect())
        .unwrap_or_default();
    let referenced = doc.body().find("commentReference").is_some();
    match params.try_get("CommentText") {
        Some(expected) => {
            let want = squash_whitespace(expected);
            Ok(Check::any(
                "comment",
                expected,
                texts.into_iter().map(|t| squash_whitespace(&t)),
                |t| text_contains(Some(t), Some(&want)),
            ))
        }
        None => Ok(Check::presence(referenced || !texts.is_empty(), "comment")),
    }
}

/// Revision tracking is on, or the body carries tracked revisions.
pub fn enable_track_changes(doc: &WordDocument, _params: Params<'_>) -> Result<Check, ScoringError> {
    let setting = doc
        .settings()?
        .is_some_and(|s| is_on(s.child("trackRevisions")));
    let revisions = ["ins", "del", "moveFrom", "moveTo", "rPrChange", "pPrChange"]
        .iter()
        .any(|name| doc.body().find(name).is_some());
    Ok(Check::presence(setting || revisions, "tracked changes"))
}

/// Editing restrictions are enforced, of `ProtectionType` when given.
pub fn set_document_protection(doc: &WordDocument, params: Params<'_>) -> Result<Check, ScoringError> {
    let expected = params.try_get("ProtectionType");
    let protection = doc
        .settings()?
        .and_then(|s| s.child("documentProtection"))
        .filter(|p| matches!(p.attr("enforcement"), Some("1" | "true" | "on")));
    let Some(protection) = protection else {
        return Ok(Check::absent("document protection", expected.unwrap_or("enforced")));
    };
    let edit = protection.attr("edit").unwrap_or("none");
    let passed = expected.is_none_or(|want| vocab::same(PROTECTION_TYPES, edit, want));
    Ok(Check::compare(
        passed,
        "document protection",
        expected.unwrap_or("enforced"),
        edit,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complex_fields_are_joined() {
        let xml = br#"<w:body xmlns:w="w"><w:p>
<w:r><w:fldChar w:fldCharType="begin"/></w:r><w:r><w:instrText> PAGEREF </w:instrText></w:r>
<w:r><w:instrText>_Ref1  \h </w:instrText></w:r><w:r><w:fldChar w:fldCharType="separate"/></w:r>
<w:r><w:t>3</w:t></w:r><w:r><w:fldChar w:fldCharType="end"/></w:r>
<w:fldSimple w:instr=" TOC \o &quot;1-3&quot; "/></w:p></w:body>"#;
        let body = XmlNode::parse(xml).expect("parse");
        assert_eq!(field_codes(&body), vec![r#"TOC \o "1-3""#.to_string(), r"PAGEREF _Ref1 \h".to_string()]);
    }
}
