//! Document codec: split a note file into YAML frontmatter plus body, and
//! write it back with a canonical key order.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::KbError;

/// Frontmatter metadata.
///
/// Known fields are typed and declared in the canonical serialization
/// order; unrecognized keys land in `extra` and are written back after the
/// known ones (BTreeMap iteration keeps them lexicographic). `None` fields
/// are omitted entirely on write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl NoteMeta {
    /// True when the named field is absent, null, or an empty string.
    /// Unknown names are looked up in the extra bag.
    pub fn field_is_blank(&self, name: &str) -> bool {
        fn blank(v: &Option<String>) -> bool {
            v.as_deref().map_or(true, str::is_empty)
        }
        match name {
            "id" => blank(&self.id),
            "kind" => blank(&self.kind),
            "domain" => blank(&self.domain),
            "scope" => blank(&self.scope),
            "created_by" => blank(&self.created_by),
            "created_os" => blank(&self.created_os),
            "title" => blank(&self.title),
            "summary" => blank(&self.summary),
            "tags" => self.tags.is_none(),
            "related" => self.related.is_none(),
            "created" => blank(&self.created),
            "updated" => blank(&self.updated),
            other => match self.extra.get(other) {
                None | Some(serde_yaml::Value::Null) => true,
                Some(serde_yaml::Value::String(s)) => s.is_empty(),
                Some(_) => false,
            },
        }
    }

    fn without_null_extras(&self) -> NoteMeta {
        let mut pruned = self.clone();
        pruned
            .extra
            .retain(|_, v| !matches!(v, serde_yaml::Value::Null));
        pruned
    }
}

/// A parsed document: metadata plus free-text body.
#[derive(Debug, Clone, PartialEq)]
pub struct Doc {
    pub meta: NoteMeta,
    pub body: String,
}

/// Split a document into frontmatter and body.
///
/// Line 1 must be exactly `---` (a leading UTF-8 BOM is tolerated); the
/// next line that is exactly `---` closes the block. The body is everything
/// after the closing delimiter with leading blank lines stripped.
pub fn split_frontmatter(text: &str) -> Result<Doc, KbError> {
    let lines: Vec<&str> = text.lines().collect();
    let opened = lines
        .first()
        .map(|l| l.trim_start_matches('\u{feff}').trim() == "---")
        .unwrap_or(false);
    if !opened {
        return Err(KbError::Format(
            "missing YAML frontmatter (expected leading ---)".to_string(),
        ));
    }

    let end_idx = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, l)| l.trim() == "---")
        .map(|(i, _)| i)
        .ok_or_else(|| {
            KbError::Format("frontmatter not closed (missing terminating ---)".to_string())
        })?;

    let fm_text = lines[1..end_idx].join("\n");
    let body = lines[end_idx + 1..]
        .join("\n")
        .trim_start_matches('\n')
        .to_string();

    let meta = if fm_text.trim().is_empty() {
        NoteMeta::default()
    } else {
        serde_yaml::from_str::<NoteMeta>(&fm_text)
            .map_err(|e| KbError::Format(format!("frontmatter must be a YAML mapping: {e}")))?
    };

    Ok(Doc { meta, body })
}

/// Serialize metadata and body back to document text.
///
/// Output is `---\n<yaml>---\n\n<body>\n` with the body trailing-whitespace
/// trimmed. Null-valued extra keys are dropped before emission.
pub fn dump_frontmatter(meta: &NoteMeta, body: &str) -> Result<String, KbError> {
    let yaml = serde_yaml::to_string(&meta.without_null_extras())
        .map_err(|e| KbError::Format(format!("serialize frontmatter: {e}")))?;
    Ok(format!("---\n{}---\n\n{}\n", yaml, body.trim_end()))
}

pub fn read_doc(path: &Path) -> Result<Doc, KbError> {
    let text = fs::read_to_string(path)
        .map_err(|e| KbError::io(format!("read {}", path.display()), e))?;
    split_frontmatter(&text)
}

pub fn write_doc(path: &Path, doc: &Doc) -> Result<(), KbError> {
    let text = dump_frontmatter(&doc.meta, &doc.body)?;
    fs::write(path, text).map_err(|e| KbError::io(format!("write {}", path.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_and_dump_roundtrip_minimal() {
        let text = "---\n\
                    id: 01J0Z3N3Y7F4K2M9Q3T5A6B7C8\n\
                    kind: note\n\
                    domain: dev\n\
                    summary: test\n\
                    created: 2026-02-10T23:15+09:00\n\
                    updated: 2026-02-10T23:15+09:00\n\
                    ---\n\n\
                    hello\n";
        let doc = split_frontmatter(text).expect("split");
        assert_eq!(doc.meta.id.as_deref(), Some("01J0Z3N3Y7F4K2M9Q3T5A6B7C8"));
        assert!(doc.body.contains("hello"));

        let out = dump_frontmatter(&doc.meta, &doc.body).expect("dump");
        let doc2 = split_frontmatter(&out).expect("re-split");
        assert_eq!(doc2.meta, doc.meta);
        assert_eq!(doc2.body, doc.body);
    }

    #[test]
    fn dump_orders_known_keys_before_extras() {
        let mut meta = NoteMeta {
            id: Some("01J0Z3N3Y7F4K2M9Q3T5A6B7C8".to_string()),
            kind: Some("note".to_string()),
            updated: Some("2026-02-10T23:15+09:00".to_string()),
            ..NoteMeta::default()
        };
        meta.extra.insert(
            "zzz_custom".to_string(),
            serde_yaml::Value::String("x".to_string()),
        );
        meta.extra.insert(
            "aaa_custom".to_string(),
            serde_yaml::Value::String("y".to_string()),
        );

        let out = dump_frontmatter(&meta, "body").expect("dump");
        let id_pos = out.find("id:").expect("id");
        let kind_pos = out.find("kind:").expect("kind");
        let updated_pos = out.find("updated:").expect("updated");
        let aaa_pos = out.find("aaa_custom:").expect("aaa");
        let zzz_pos = out.find("zzz_custom:").expect("zzz");
        assert!(id_pos < kind_pos && kind_pos < updated_pos);
        assert!(updated_pos < aaa_pos && aaa_pos < zzz_pos);
    }

    #[test]
    fn unknown_keys_survive_roundtrip() {
        let text = "---\nid: 01J0Z3N3Y7F4K2M9Q3T5A6B7C8\ncustom_field: keep-me\n---\n\nbody\n";
        let doc = split_frontmatter(text).expect("split");
        assert_eq!(
            doc.meta.extra.get("custom_field"),
            Some(&serde_yaml::Value::String("keep-me".to_string()))
        );
        let out = dump_frontmatter(&doc.meta, &doc.body).expect("dump");
        assert!(out.contains("custom_field: keep-me"));
    }

    #[test]
    fn null_valued_keys_are_omitted() {
        let text = "---\nid: 01J0Z3N3Y7F4K2M9Q3T5A6B7C8\ntitle: null\nobsolete: null\n---\n\nbody\n";
        let doc = split_frontmatter(text).expect("split");
        assert_eq!(doc.meta.title, None);
        let out = dump_frontmatter(&doc.meta, &doc.body).expect("dump");
        assert!(!out.contains("title"));
        assert!(!out.contains("obsolete"));
    }

    #[test]
    fn missing_leading_delimiter_is_an_error() {
        let err = split_frontmatter("# Title\nBody").expect_err("no frontmatter");
        assert!(err.to_string().contains("leading ---"), "{err}");
    }

    #[test]
    fn unclosed_frontmatter_is_an_error() {
        let err = split_frontmatter("---\nid: x\nbody without close").expect_err("unclosed");
        assert!(err.to_string().contains("not closed"), "{err}");
    }

    #[test]
    fn sequence_frontmatter_is_an_error() {
        let err = split_frontmatter("---\n- a\n- b\n---\n\nbody\n").expect_err("sequence");
        assert!(err.to_string().contains("mapping"), "{err}");
    }

    #[test]
    fn empty_frontmatter_yields_default_meta() {
        let doc = split_frontmatter("---\n---\n\nbody\n").expect("empty block");
        assert_eq!(doc.meta, NoteMeta::default());
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn leading_blank_lines_are_stripped_from_body() {
        let doc = split_frontmatter("---\nkind: note\n---\n\n\n\nbody text\n").expect("split");
        assert_eq!(doc.body, "body text");
    }

    #[test]
    fn bom_before_leading_delimiter_is_tolerated() {
        let doc = split_frontmatter("\u{feff}---\nkind: note\n---\n\nbody\n").expect("bom");
        assert_eq!(doc.meta.kind.as_deref(), Some("note"));
    }

    #[test]
    fn japanese_content_roundtrips() {
        let meta = NoteMeta {
            id: Some("01J0Z3N3Y7F4K2M9Q3T5A6B7C8".to_string()),
            title: Some("スキル作成手順".to_string()),
            ..NoteMeta::default()
        };
        let out = dump_frontmatter(&meta, "## 本文\n\n内容").expect("dump");
        let doc = split_frontmatter(&out).expect("split");
        assert_eq!(doc.meta.title.as_deref(), Some("スキル作成手順"));
        assert_eq!(doc.body, "## 本文\n\n内容");
    }

    #[test]
    fn field_is_blank_covers_known_and_extra_fields() {
        let mut meta = NoteMeta {
            summary: Some(String::new()),
            tags: Some(vec![]),
            ..NoteMeta::default()
        };
        meta.extra.insert(
            "present".to_string(),
            serde_yaml::Value::String("x".to_string()),
        );
        meta.extra
            .insert("nulled".to_string(), serde_yaml::Value::Null);
        assert!(meta.field_is_blank("id"));
        assert!(meta.field_is_blank("summary"));
        assert!(!meta.field_is_blank("tags"));
        assert!(!meta.field_is_blank("present"));
        assert!(meta.field_is_blank("nulled"));
        assert!(meta.field_is_blank("never_seen"));
    }
}
