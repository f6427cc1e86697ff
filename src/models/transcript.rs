use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize, Debug)]
struct MessageObj {
    usage: Option<Value>,
}

/// Raw shape of one transcript line; only the fields the resolver reads
#[derive(Deserialize, Debug)]
struct TranscriptLine {
    r#type: Option<String>,
    uuid: Option<String>,
    #[serde(rename = "parentUuid")]
    parent_uuid: Option<String>,
    #[serde(rename = "leafUuid")]
    leaf_uuid: Option<String>,
    message: Option<MessageObj>,
    /// Some vendors put usage at the top level instead of under `message`
    usage: Option<Value>,
}

/// One parsed transcript line
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEntry {
    Assistant {
        uuid: Option<String>,
        usage: Option<Value>,
    },
    User {
        uuid: Option<String>,
        parent_uuid: Option<String>,
    },
    /// Delegates to an earlier message by its uuid
    Summary { leaf_uuid: Option<String> },
    Other { uuid: Option<String> },
}

impl TranscriptEntry {
    /// Parse a single JSONL line. Blank or malformed lines yield `None`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let t = line.trim();
        if t.is_empty() {
            return None;
        }
        let raw: TranscriptLine = serde_json::from_str(t).ok()?;
        let entry = match raw.r#type.as_deref() {
            Some("assistant") => TranscriptEntry::Assistant {
                uuid: raw.uuid,
                usage: raw
                    .message
                    .and_then(|m| m.usage)
                    .or(raw.usage)
                    .filter(Value::is_object),
            },
            Some("user") => TranscriptEntry::User {
                uuid: raw.uuid,
                parent_uuid: raw.parent_uuid,
            },
            Some("summary") => TranscriptEntry::Summary {
                leaf_uuid: raw.leaf_uuid,
            },
            _ => TranscriptEntry::Other { uuid: raw.uuid },
        };
        Some(entry)
    }

    pub fn uuid(&self) -> Option<&str> {
        match self {
            TranscriptEntry::Assistant { uuid, .. }
            | TranscriptEntry::User { uuid, .. }
            | TranscriptEntry::Other { uuid } => uuid.as_deref(),
            TranscriptEntry::Summary { .. } => None,
        }
    }

    /// Usage object of an assistant entry, if it carries one
    pub fn usage(&self) -> Option<&Value> {
        match self {
            TranscriptEntry::Assistant { usage, .. } => usage.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_variants() {
        let a = TranscriptEntry::parse_line(
            r#"{"uuid":"a1","type":"assistant","message":{"usage":{"output_tokens":3}}}"#,
        )
        .unwrap();
        assert_eq!(a.uuid(), Some("a1"));
        assert_eq!(a.usage().unwrap()["output_tokens"], 3);

        let u = TranscriptEntry::parse_line(r#"{"uuid":"u1","type":"user","parentUuid":"a1"}"#)
            .unwrap();
        assert_eq!(
            u,
            TranscriptEntry::User {
                uuid: Some("u1".into()),
                parent_uuid: Some("a1".into())
            }
        );

        let s = TranscriptEntry::parse_line(r#"{"type":"summary","leafUuid":"u9"}"#).unwrap();
        assert_eq!(
            s,
            TranscriptEntry::Summary {
                leaf_uuid: Some("u9".into())
            }
        );

        let o = TranscriptEntry::parse_line(r#"{"type":"system","uuid":"x"}"#).unwrap();
        assert_eq!(o.uuid(), Some("x"));
    }

    #[test]
    fn assistant_without_usage_has_none() {
        let a = TranscriptEntry::parse_line(r#"{"type":"assistant","message":{"content":[]}}"#)
            .unwrap();
        assert!(a.usage().is_none());
        let top = TranscriptEntry::parse_line(r#"{"type":"assistant","usage":{"total_tokens":9}}"#)
            .unwrap();
        assert_eq!(top.usage().unwrap()["total_tokens"], 9);
    }

    #[test]
    fn malformed_lines_are_none() {
        assert!(TranscriptEntry::parse_line("").is_none());
        assert!(TranscriptEntry::parse_line("{not json").is_none());
        assert!(TranscriptEntry::parse_line("[1,2,3]").is_none());
    }
}
