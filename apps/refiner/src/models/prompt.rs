use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl PriorityLevel {
    /// Display rank: 0 is the most urgent.
    pub fn rank(self) -> u8 {
        match self {
            PriorityLevel::Critical => 0,
            PriorityLevel::High => 1,
            PriorityLevel::Medium => 2,
            PriorityLevel::Low => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PriorityLevel::Critical => "critical",
            PriorityLevel::High => "high",
            PriorityLevel::Medium => "medium",
            PriorityLevel::Low => "low",
        }
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    Image,
    Pdf,
    Docx,
    Mixed,
}

impl InputType {
    pub fn as_str(self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Image => "image",
            InputType::Pdf => "pdf",
            InputType::Docx => "docx",
            InputType::Mixed => "mixed",
        }
    }

    /// Maps a lowercase file extension (without the dot) to the decoder that handles it.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "txt" | "md" => Some(InputType::Text),
            "png" | "jpg" | "jpeg" | "bmp" | "gif" | "tif" | "tiff" => Some(InputType::Image),
            "pdf" => Some(InputType::Pdf),
            "docx" => Some(InputType::Docx),
            _ => None,
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(InputType::Text),
            "image" => Ok(InputType::Image),
            "pdf" => Ok(InputType::Pdf),
            "docx" => Ok(InputType::Docx),
            "mixed" => Ok(InputType::Mixed),
            other => Err(AppError::Extraction(format!("unknown input type '{other}'"))),
        }
    }
}

/// Coarse project category. `Other` is the fallback when no keyword table matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    SoftwareDevelopment,
    ProductDesign,
    DataAnalysis,
    ContentCreation,
    Automation,
    Other,
}

impl Domain {
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::SoftwareDevelopment => "software_development",
            Domain::ProductDesign => "product_design",
            Domain::DataAnalysis => "data_analysis",
            Domain::ContentCreation => "content_creation",
            Domain::Automation => "automation",
            Domain::Other => "other",
        }
    }

    /// Tolerant parse used for model-produced labels; anything unknown is `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "software_development" => Domain::SoftwareDevelopment,
            "product_design" => Domain::ProductDesign,
            "data_analysis" => Domain::DataAnalysis,
            "content_creation" => Domain::ContentCreation,
            "automation" => Domain::Automation,
            _ => Domain::Other,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub description: String,
    pub priority: PriorityLevel,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalConstraint {
    pub constraint_type: String,
    pub description: String,
    pub is_mandatory: bool,
}

/// The structured record produced once per refinement run.
///
/// Field names are the persisted JSON keys; do not rename without a format bump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinedPrompt {
    pub prompt_id: String,
    pub timestamp: DateTime<Utc>,
    pub input_types: Vec<InputType>,
    pub core_intent: String,
    pub detailed_description: String,
    pub domain: Domain,
    pub functional_requirements: Vec<Requirement>,
    pub technical_constraints: Vec<TechnicalConstraint>,
    pub expected_outputs: Vec<String>,
    pub deliverable_format: Option<String>,
    pub background_context: Option<String>,
    pub success_criteria: Vec<String>,
    pub confidence_score: f64,
    pub ambiguities: Vec<String>,
    pub assumptions_made: Vec<String>,
}

impl RefinedPrompt {
    /// `PROMPT_` followed by eight upper-case hex digits of a fresh v4 UUID.
    pub fn generate_id() -> String {
        let hex = Uuid::new_v4().simple().to_string().to_uppercase();
        format!("PROMPT_{}", &hex[..8])
    }

    /// Requirements ordered CRITICAL first; equal priorities keep extraction order.
    pub fn requirements_by_priority(&self) -> Vec<&Requirement> {
        let mut sorted: Vec<&Requirement> = self.functional_requirements.iter().collect();
        sorted.sort_by_key(|r| r.priority.rank());
        sorted
    }
}
