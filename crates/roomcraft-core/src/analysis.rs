//! Structured results returned by the generation service, with tolerant parsing.
//!
//! The service answers analysis requests with free text that is supposed to be
//! JSON. Parsing never fails: every parser strips markdown fences, tries the
//! expected shape, and falls back to a typed default.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A room as reported by floorplan analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDescriptor {
    pub name: String,
    #[serde(default = "unknown")]
    pub dimensions: String,
    #[serde(default)]
    pub details: String,
    #[serde(default = "default_constraints", alias = "structural_constraints")]
    pub structural_constraints: String,
}

impl Default for RoomDescriptor {
    fn default() -> Self {
        Self {
            name: "Main Room".to_string(),
            dimensions: "Unknown".to_string(),
            details: "Standard layout".to_string(),
            structural_constraints: default_constraints(),
        }
    }
}

fn unknown() -> String {
    "Unknown".to_string()
}

fn default_constraints() -> String {
    "Keep existing walls, doors and windows as drawn".to_string()
}

/// An interactive marker over an image, positioned in percent of its size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub label: String,
    pub x: f64,
    pub y: f64,
}

impl Hotspot {
    pub fn new(label: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            label: label.into(),
            x,
            y,
        }
    }
}

/// Advisory design critique of a rendered room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignAudit {
    /// 0-100
    #[serde(deserialize_with = "lenient_score")]
    pub score: f64,
    pub summary: String,
    pub strengths: Vec<String>,
    pub suggestions: Vec<String>,
}

impl Default for DesignAudit {
    fn default() -> Self {
        Self {
            score: 0.0,
            summary: "Design audit unavailable".to_string(),
            strengths: Vec::new(),
            suggestions: Vec::new(),
        }
    }
}

/// Accepts a number or a numeric string such as `"87"` or `"87.5%"`.
fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or_default(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().unwrap_or_default(),
        _ => 0.0,
    })
}

/// A mismatch between the floorplan and a render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceIssue {
    pub element: String,
    pub expected: String,
    pub observed: String,
}

/// Advisory check of a render against the floorplan geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceReport {
    pub compliant: bool,
    pub summary: String,
    pub issues: Vec<ComplianceIssue>,
}

impl Default for ComplianceReport {
    fn default() -> Self {
        Self {
            compliant: false,
            summary: "Compliance check unavailable".to_string(),
            issues: Vec::new(),
        }
    }
}

/// Removes markdown code fences the service likes to wrap JSON in.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

fn parse_json<T: DeserializeOwned>(kind: &str, text: &str) -> Option<T> {
    match serde_json::from_str(strip_code_fences(text)) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("[Analysis] Unparsable {} response, using default: {}", kind, e);
            None
        }
    }
}

/// Parses the floorplan analysis. Falls back to a single default room.
pub fn parse_room_descriptors(text: &str) -> Vec<RoomDescriptor> {
    let rooms: Vec<RoomDescriptor> = parse_json("room list", text).unwrap_or_default();
    let rooms: Vec<RoomDescriptor> = rooms
        .into_iter()
        .filter(|r| !r.name.trim().is_empty())
        .map(|mut r| {
            if r.structural_constraints.trim().is_empty() {
                r.structural_constraints = default_constraints();
            }
            r
        })
        .collect();
    if rooms.is_empty() {
        vec![RoomDescriptor::default()]
    } else {
        rooms
    }
}

/// Parses a hotspot list. Falls back to an empty list.
///
/// Accepts either a bare array or `{"hotspots": [...]}`; coordinates are
/// clamped to 0-100 and unlabeled entries are dropped.
pub fn parse_hotspots(text: &str) -> Vec<Hotspot> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Shape {
        List(Vec<Hotspot>),
        Wrapped { hotspots: Vec<Hotspot> },
    }

    let hotspots = match parse_json::<Shape>("hotspot", text) {
        Some(Shape::List(list)) | Some(Shape::Wrapped { hotspots: list }) => list,
        None => Vec::new(),
    };

    hotspots
        .into_iter()
        .filter(|h| !h.label.trim().is_empty() && h.x.is_finite() && h.y.is_finite())
        .map(|h| Hotspot {
            x: h.x.clamp(0.0, 100.0),
            y: h.y.clamp(0.0, 100.0),
            ..h
        })
        .collect()
}

/// Parses a design audit. Falls back to `DesignAudit::default()`.
pub fn parse_design_audit(text: &str) -> DesignAudit {
    let mut audit: DesignAudit = parse_json("design audit", text).unwrap_or_default();
    audit.score = if audit.score.is_finite() {
        audit.score.clamp(0.0, 100.0)
    } else {
        0.0
    };
    audit
}

/// Parses a compliance report. Falls back to `ComplianceReport::default()`.
pub fn parse_compliance_report(text: &str) -> ComplianceReport {
    parse_json("compliance report", text).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_list_with_fences() {
        let text = "```json\n[{\"name\":\"Kitchen\",\"dimensions\":\"12' x 12'\",\"details\":\"Island\",\"structuralConstraints\":\"Window on east wall\"}]\n```";
        let rooms = parse_room_descriptors(text);
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].name, "Kitchen");
        assert_eq!(rooms[0].structural_constraints, "Window on east wall");
    }

    #[test]
    fn test_room_list_fallback() {
        assert_eq!(
            parse_room_descriptors("I could not read this plan"),
            vec![RoomDescriptor::default()]
        );
        assert_eq!(parse_room_descriptors("[]"), vec![RoomDescriptor::default()]);
    }

    #[test]
    fn test_room_missing_dimensions_defaults() {
        let rooms = parse_room_descriptors(r#"[{"name":"Den"}]"#);
        assert_eq!(rooms[0].dimensions, "Unknown");
        assert!(rooms[0].details.is_empty());
    }

    #[test]
    fn test_hotspots_both_shapes_and_clamping() {
        let bare = parse_hotspots(r#"[{"label":"Sofa","x":40,"y":120}]"#);
        assert_eq!(bare, vec![Hotspot::new("Sofa", 40.0, 100.0)]);

        let wrapped = parse_hotspots(r#"{"hotspots":[{"label":"Lamp","x":-5,"y":10},{"label":" ","x":1,"y":1}]}"#);
        assert_eq!(wrapped, vec![Hotspot::new("Lamp", 0.0, 10.0)]);
    }

    #[test]
    fn test_hotspots_garbage_is_empty() {
        assert!(parse_hotspots("no idea").is_empty());
    }

    #[test]
    fn test_audit_and_report_defaults() {
        assert_eq!(parse_design_audit("{oops"), DesignAudit::default());
        assert_eq!(parse_compliance_report(""), ComplianceReport::default());

        let audit = parse_design_audit(r#"{"score": 250, "summary": "Strong"}"#);
        assert_eq!(audit.score, 100.0);
        assert_eq!(audit.summary, "Strong");
        assert!(audit.suggestions.is_empty());
    }

    #[test]
    fn test_audit_score_is_lenient() {
        let audit = parse_design_audit(
            r#"{"score": 87.5, "summary": "Balanced", "suggestions": ["Add a rug"]}"#,
        );
        assert_eq!(audit.score, 87.5);
        assert_eq!(audit.summary, "Balanced");
        assert_eq!(audit.suggestions, vec!["Add a rug"]);

        assert_eq!(parse_design_audit(r#"{"score": 1000}"#).score, 100.0);
        assert_eq!(parse_design_audit(r#"{"score": -3}"#).score, 0.0);
        assert_eq!(parse_design_audit(r#"{"score": "92%"}"#).score, 92.0);

        let unscored = parse_design_audit(r#"{"score": null, "summary": "No score"}"#);
        assert_eq!(unscored.score, 0.0);
        assert_eq!(unscored.summary, "No score");
    }
}
