//! Structured assessment returned by the LLM and the JSON schema that
//! constrains it.

use crate::error::{AssessorError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Scored dimensions besides the overall score, in report order
pub const DIMENSIONS: &[&str] = &[
    "code_quality",
    "documentation",
    "testing",
    "security",
    "maintainability",
    "architecture",
    "performance",
    "community",
    "activity",
    "dependency_health",
    "production_readiness",
];

/// Whether the project appears to work as intended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkingStatus {
    Working,
    #[serde(rename = "Partially Working")]
    PartiallyWorking,
    #[serde(rename = "Not Working")]
    NotWorking,
    Unknown,
}

impl WorkingStatus {
    /// Labels accepted by the schema
    pub const LABELS: &'static [&'static str] = &["Working", "Partially Working", "Not Working", "Unknown"];
}

impl fmt::Display for WorkingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Working => "Working",
            Self::PartiallyWorking => "Partially Working",
            Self::NotWorking => "Not Working",
            Self::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// Urgency of a roadmap item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoadmapPriority {
    High,
    Medium,
    Low,
}

impl RoadmapPriority {
    pub const LABELS: &'static [&'static str] = &["High", "Medium", "Low"];
}

/// Area a roadmap item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoadmapCategory {
    Security,
    Performance,
    Testing,
    Documentation,
    Architecture,
    Features,
    DevOps,
    #[serde(rename = "Code Quality")]
    CodeQuality,
}

impl RoadmapCategory {
    pub const LABELS: &'static [&'static str] = &[
        "Security",
        "Performance",
        "Testing",
        "Documentation",
        "Architecture",
        "Features",
        "DevOps",
        "Code Quality",
    ];
}

/// One suggested next step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapItem {
    pub title: String,
    pub description: String,
    pub priority: RoadmapPriority,
    pub category: RoadmapCategory,
}

/// Multi-dimensional quality assessment of a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub overall_score: u8,
    pub overall_explanation: String,

    pub code_quality_score: u8,
    pub code_quality_explanation: String,
    pub documentation_score: u8,
    pub documentation_explanation: String,
    pub testing_score: u8,
    pub testing_explanation: String,
    pub security_score: u8,
    pub security_explanation: String,
    pub maintainability_score: u8,
    pub maintainability_explanation: String,
    pub architecture_score: u8,
    pub architecture_explanation: String,
    pub performance_score: u8,
    pub performance_explanation: String,
    pub community_score: u8,
    pub community_explanation: String,
    pub activity_score: u8,
    pub activity_explanation: String,
    pub dependency_health_score: u8,
    pub dependency_health_explanation: String,
    pub production_readiness_score: u8,
    pub production_readiness_explanation: String,

    pub summary: String,
    pub purpose: String,
    pub target_audience: String,
    pub tech_stack: Vec<String>,

    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub security_concerns: Vec<String>,
    pub improvement_suggestions: Vec<String>,
    pub best_practices: Vec<String>,

    pub working_status: WorkingStatus,
    pub working_status_explanation: String,

    pub roadmap: Vec<RoadmapItem>,
}

/// A scored dimension with its explanation, borrowed from an [`Assessment`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionScore<'a> {
    pub name: &'static str,
    pub score: u8,
    pub explanation: &'a str,
}

impl Assessment {
    /// Parses the model's answer, rejecting anything outside the schema
    pub fn from_json(content: &str) -> Result<Self> {
        let trimmed = strip_code_fence(content);
        let assessment: Self = serde_json::from_str(trimmed)
            .map_err(|e| AssessorError::Llm(format!("Assessment did not match the schema: {}", e)))?;
        assessment.validate()?;
        Ok(assessment)
    }

    /// Checks the constraints serde cannot express
    pub fn validate(&self) -> Result<()> {
        let mut scores = vec![("overall", self.overall_score)];
        scores.extend(self.dimensions().iter().map(|d| (d.name, d.score)));
        if let Some((name, score)) = scores.into_iter().find(|(_, score)| *score > 100) {
            return Err(AssessorError::Llm(format!("{} score {} is outside 0-100", name, score)));
        }
        Ok(())
    }

    /// The scored dimensions in report order
    pub fn dimensions(&self) -> Vec<DimensionScore<'_>> {
        let pairs: [(u8, &str); 11] = [
            (self.code_quality_score, &self.code_quality_explanation),
            (self.documentation_score, &self.documentation_explanation),
            (self.testing_score, &self.testing_explanation),
            (self.security_score, &self.security_explanation),
            (self.maintainability_score, &self.maintainability_explanation),
            (self.architecture_score, &self.architecture_explanation),
            (self.performance_score, &self.performance_explanation),
            (self.community_score, &self.community_explanation),
            (self.activity_score, &self.activity_explanation),
            (self.dependency_health_score, &self.dependency_health_explanation),
            (self.production_readiness_score, &self.production_readiness_explanation),
        ];
        DIMENSIONS
            .iter()
            .zip(pairs)
            .map(|(&name, (score, explanation))| DimensionScore { name, score, explanation })
            .collect()
    }
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

fn string_array(description: &str) -> Value {
    json!({ "type": "array", "items": { "type": "string" }, "description": description })
}

/// JSON schema for [`Assessment`], in the strict form structured outputs require
pub fn response_schema() -> Value {
    let mut properties = Map::new();
    let mut required: Vec<String> = Vec::new();
    let mut add = |name: String, schema: Value| {
        required.push(name.clone());
        properties.insert(name, schema);
    };

    add(
        "overall_score".into(),
        json!({ "type": "integer", "description": "Overall quality from 0 to 100" }),
    );
    add("overall_explanation".into(), json!({ "type": "string" }));
    for dimension in DIMENSIONS {
        add(
            format!("{}_score", dimension),
            json!({ "type": "integer", "description": format!("{} from 0 to 100", dimension.replace('_', " ")) }),
        );
        add(format!("{}_explanation", dimension), json!({ "type": "string" }));
    }

    add("summary".into(), json!({ "type": "string" }));
    add("purpose".into(), json!({ "type": "string" }));
    add("target_audience".into(), json!({ "type": "string" }));
    add("tech_stack".into(), string_array("Languages, frameworks and major libraries"));
    add("strengths".into(), string_array("Concrete strong points"));
    add("weaknesses".into(), string_array("Concrete weak points"));
    add("security_concerns".into(), string_array("Security issues observed in the code"));
    add("improvement_suggestions".into(), string_array("Actionable improvements"));
    add("best_practices".into(), string_array("Good practices the project follows"));
    add(
        "working_status".into(),
        json!({ "type": "string", "enum": WorkingStatus::LABELS }),
    );
    add("working_status_explanation".into(), json!({ "type": "string" }));
    add(
        "roadmap".into(),
        json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "title": { "type": "string" },
                    "description": { "type": "string" },
                    "priority": { "type": "string", "enum": RoadmapPriority::LABELS },
                    "category": { "type": "string", "enum": RoadmapCategory::LABELS }
                },
                "required": ["title", "description", "priority", "category"],
                "additionalProperties": false
            }
        }),
    );

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}
