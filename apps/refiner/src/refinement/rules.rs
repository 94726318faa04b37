//! Rule tables: the immutable keyword configuration behind validation and extraction.
//!
//! Built once at startup (`RuleSet::default()` or `RuleSet::load`), wrapped in an `Arc`
//! and passed by reference. Nothing mutates a `RuleSet` after validation.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::{Domain, InputType, PriorityLevel};

// ────────────────────────────────────────────────────────────────────────────
// Rule shapes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainRule {
    pub domain: Domain,
    pub keywords: Vec<String>,
}

/// One requirement category. A category yields at most one `Requirement` per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementRule {
    pub category: String,
    pub priority: PriorityLevel,
    pub triggers: Vec<String>,
    pub description: String,
    /// Derive the description from the words around the first trigger hit.
    #[serde(default)]
    pub derive_from_context: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintRule {
    pub constraint_type: String,
    /// Prefix of the generated description, e.g. "Target platforms".
    pub label: String,
    pub triggers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatRule {
    pub phrase: String,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverableDefaults {
    pub domain: Domain,
    pub outputs: Vec<String>,
}

/// Confidence score increments. Fixed constants; changing them changes every score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub base: f64,
    pub action_keyword: f64,
    pub per_requirement: f64,
    pub requirement_cap: f64,
    pub constraint_present: f64,
    pub detailed_content: f64,
    pub detailed_word_threshold: usize,
    /// Content shorter than `short_multiplier` × the type's minimum word count is penalized.
    pub short_multiplier: usize,
    pub short_content_penalty: f64,
    pub other_domain_penalty: f64,
    pub no_requirements_penalty: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            base: 0.5,
            action_keyword: 0.1,
            per_requirement: 0.1,
            requirement_cap: 0.3,
            constraint_present: 0.1,
            detailed_content: 0.1,
            detailed_word_threshold: 50,
            short_multiplier: 2,
            short_content_penalty: 0.1,
            other_domain_penalty: 0.1,
            no_requirements_penalty: 0.2,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// RuleSet
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub min_words: usize,
    pub min_words_image: usize,
    pub detail_max_chars: usize,
    pub intent_fallback_words: usize,

    pub action_keywords: Vec<String>,
    pub greeting_phrases: Vec<String>,
    pub greeting_fillers: Vec<String>,
    pub spam_phrases: Vec<String>,
    pub placeholder_patterns: Vec<String>,

    /// Declaration order is the classification tie-break.
    pub domains: Vec<DomainRule>,
    pub requirements: Vec<RequirementRule>,
    pub context_stop_words: Vec<String>,
    pub constraints: Vec<ConstraintRule>,
    pub mandatory_markers: Vec<String>,
    pub optional_markers: Vec<String>,

    pub formats: Vec<FormatRule>,
    pub deliverables: Vec<DeliverableDefaults>,
    pub documentation_triggers: Vec<String>,
    pub background_markers: Vec<String>,

    pub scoring: ScoringWeights,
}

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            min_words: 5,
            min_words_image: 3,
            detail_max_chars: 500,
            intent_fallback_words: 15,

            action_keywords: words(&[
                "build", "create", "develop", "design", "implement", "analyze", "automate",
                "make", "generate", "calculate", "write", "produce",
            ]),
            greeting_phrases: words(&[
                "hi", "hello", "hey", "hiya", "howdy", "yo", "greetings", "good morning",
                "good afternoon", "good evening", "how are you", "how are you doing",
                "hows it going", "whats up", "sup", "thanks", "thank you", "thanks a lot",
                "thank you very much", "thx", "ty", "cheers", "bye", "goodbye",
            ]),
            greeting_fillers: words(&[
                "there", "again", "all", "everyone", "team", "so", "much", "very", "and",
                "guys", "folks", "friend", "buddy", "mate", "oh", "well", "just", "wanted",
                "to", "say", "today",
            ]),
            spam_phrases: words(&[
                "buy now", "click here", "limited offer", "act now", "free money",
            ]),
            placeholder_patterns: words(&["lorem ipsum", "asdf", "qwerty", "placeholder text"]),

            domains: vec![
                DomainRule {
                    domain: Domain::SoftwareDevelopment,
                    keywords: words(&[
                        "app", "software", "code", "program", "system", "api", "backend",
                        "frontend", "database",
                    ]),
                },
                DomainRule {
                    domain: Domain::ProductDesign,
                    keywords: words(&[
                        "design", "ui", "ux", "interface", "mockup", "wireframe", "prototype",
                    ]),
                },
                DomainRule {
                    domain: Domain::DataAnalysis,
                    keywords: words(&[
                        "analyze", "data", "statistics", "report", "dashboard", "metrics",
                    ]),
                },
                DomainRule {
                    domain: Domain::ContentCreation,
                    keywords: words(&["content", "article", "blog", "copy", "write", "writing"]),
                },
                DomainRule {
                    domain: Domain::Automation,
                    keywords: words(&["automate", "script", "workflow", "process", "pipeline"]),
                },
            ],
            requirements: vec![
                RequirementRule {
                    category: "authentication".to_string(),
                    priority: PriorityLevel::Critical,
                    triggers: words(&[
                        "login", "logins", "log in", "auth", "authentication", "authenticate",
                        "authenticated", "sign in", "sign up", "signup", "user account",
                        "user accounts",
                    ]),
                    description: "User authentication and account management".to_string(),
                    derive_from_context: false,
                },
                RequirementRule {
                    category: "core_functionality".to_string(),
                    priority: PriorityLevel::Critical,
                    triggers: words(&[
                        "create", "creates", "creating", "creation", "manage", "manages",
                        "managing", "management", "track", "tracks", "tracking", "organize",
                        "organizing", "schedule", "schedules", "scheduling", "edit", "edits",
                        "editing", "delete", "deletes", "deleting", "deletion", "assign",
                        "assigns", "assigning", "assignment",
                    ]),
                    description: "Core create, manage and track operations".to_string(),
                    derive_from_context: true,
                },
                RequirementRule {
                    category: "payment".to_string(),
                    priority: PriorityLevel::High,
                    triggers: words(&[
                        "payment", "payments", "checkout", "billing", "subscription",
                        "subscriptions", "stripe",
                    ]),
                    description: "Payment processing and billing".to_string(),
                    derive_from_context: false,
                },
                RequirementRule {
                    category: "data_storage".to_string(),
                    priority: PriorityLevel::High,
                    triggers: words(&[
                        "database", "databases", "store", "stores", "stored", "storing",
                        "save", "saved", "saving", "persist", "persisted", "storage",
                    ]),
                    description: "Persistent data storage".to_string(),
                    derive_from_context: false,
                },
                RequirementRule {
                    category: "ui_ux".to_string(),
                    priority: PriorityLevel::Medium,
                    triggers: words(&[
                        "interface", "interfaces", "dashboard", "dashboards", "mobile",
                        "responsive",
                    ]),
                    description: "User interface and experience design".to_string(),
                    derive_from_context: false,
                },
                RequirementRule {
                    category: "integration".to_string(),
                    priority: PriorityLevel::Medium,
                    triggers: words(&[
                        "api", "apis", "webhook", "webhooks", "third-party", "integrate",
                        "integrates", "integration", "integrations",
                    ]),
                    description: "Integration with external services and APIs".to_string(),
                    derive_from_context: false,
                },
                RequirementRule {
                    category: "notifications".to_string(),
                    priority: PriorityLevel::Low,
                    triggers: words(&[
                        "notify", "notification", "notifications", "reminder", "reminders",
                        "alert", "alerts", "email", "emails",
                    ]),
                    description: "User notifications and reminders".to_string(),
                    derive_from_context: false,
                },
            ],
            context_stop_words: words(&[
                "a", "an", "the", "and", "or", "of", "to", "for", "with", "their", "your",
                "our", "my", "all", "new", "any", "each", "in", "on", "by", "from", "can",
                "will", "be", "is", "are", "that", "which",
            ]),
            constraints: vec![
                ConstraintRule {
                    constraint_type: "platform".to_string(),
                    label: "Target platforms".to_string(),
                    triggers: words(&[
                        "mobile", "desktop", "web", "browser", "ios", "android",
                        "cross-platform", "tablet",
                    ]),
                },
                ConstraintRule {
                    constraint_type: "technology".to_string(),
                    label: "Required technologies".to_string(),
                    triggers: words(&[
                        "rust", "python", "javascript", "typescript", "react", "node", "java",
                        "django", "flask", "postgres", "mysql", "mongodb", "jwt", "graphql",
                        "rest api",
                    ]),
                },
                ConstraintRule {
                    constraint_type: "deployment".to_string(),
                    label: "Deployment targets".to_string(),
                    triggers: words(&[
                        "aws", "lambda", "azure", "gcp", "docker", "kubernetes", "cloud",
                        "on-premise", "heroku",
                    ]),
                },
                ConstraintRule {
                    constraint_type: "performance".to_string(),
                    label: "Performance expectations".to_string(),
                    triggers: words(&[
                        "performance", "latency", "fast", "scalable", "scalability",
                        "real-time", "concurrent",
                    ]),
                },
                ConstraintRule {
                    constraint_type: "security".to_string(),
                    label: "Security and compliance".to_string(),
                    triggers: words(&[
                        "secure", "security", "encryption", "encrypted", "gdpr", "hipaa",
                        "compliance", "compliant",
                    ]),
                },
                ConstraintRule {
                    constraint_type: "timeline".to_string(),
                    label: "Timeline and budget".to_string(),
                    triggers: words(&[
                        "deadline", "timeline", "within", "weeks", "months", "budget",
                    ]),
                },
            ],
            mandatory_markers: words(&[
                "must", "required", "require", "requires", "mandatory", "need to", "needs to",
                "has to", "have to",
            ]),
            optional_markers: words(&[
                "should", "prefer", "preferred", "preferably", "ideally", "nice to have",
                "optional",
            ]),

            formats: vec![
                FormatRule {
                    phrase: "web app".to_string(),
                    format: "web_application".to_string(),
                },
                FormatRule {
                    phrase: "mobile app".to_string(),
                    format: "mobile_application".to_string(),
                },
                FormatRule {
                    phrase: "api".to_string(),
                    format: "api_service".to_string(),
                },
                FormatRule {
                    phrase: "command line".to_string(),
                    format: "cli_tool".to_string(),
                },
                FormatRule {
                    phrase: "cli".to_string(),
                    format: "cli_tool".to_string(),
                },
            ],
            deliverables: vec![
                DeliverableDefaults {
                    domain: Domain::SoftwareDevelopment,
                    outputs: words(&["Working application", "Source code"]),
                },
                DeliverableDefaults {
                    domain: Domain::ProductDesign,
                    outputs: words(&["Design assets", "Interactive prototype"]),
                },
                DeliverableDefaults {
                    domain: Domain::DataAnalysis,
                    outputs: words(&["Analysis report", "Documentation"]),
                },
                DeliverableDefaults {
                    domain: Domain::ContentCreation,
                    outputs: words(&["Written content", "Documentation"]),
                },
                DeliverableDefaults {
                    domain: Domain::Automation,
                    outputs: words(&["Automation scripts", "Source code", "Documentation"]),
                },
            ],
            documentation_triggers: words(&["documentation", "docs", "readme", "user guide"]),
            background_markers: words(&[
                "context:", "background", "currently", "target audience", "targeting",
                "existing",
            ]),

            scoring: ScoringWeights::default(),
        }
    }
}

impl RuleSet {
    /// Loads a rule table from YAML or JSON. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule table {}", path.display()))?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let rules: RuleSet = match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&raw)
                .with_context(|| format!("Invalid YAML rule table {}", path.display()))?,
            "json" => serde_json::from_str(&raw)
                .with_context(|| format!("Invalid JSON rule table {}", path.display()))?,
            other => bail!("Unsupported rule table format: '.{other}'"),
        };

        rules.validate().map_err(anyhow::Error::msg)?;
        Ok(rules)
    }

    /// Minimum word count for an input type. OCR output is sparser, so images get less.
    pub fn min_words_for(&self, input_type: InputType) -> usize {
        match input_type {
            InputType::Image => self.min_words_image,
            _ => self.min_words,
        }
    }

    pub fn default_outputs(&self, domain: Domain) -> &[String] {
        self.deliverables
            .iter()
            .find(|d| d.domain == domain)
            .map(|d| d.outputs.as_slice())
            .unwrap_or(&[])
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.min_words == 0 || self.min_words_image == 0 {
            return Err("minimum word counts must be greater than 0".to_string());
        }
        if self.detail_max_chars < 20 {
            return Err("detail_max_chars must be at least 20".to_string());
        }
        if self.intent_fallback_words == 0 {
            return Err("intent_fallback_words must be greater than 0".to_string());
        }
        if self.domains.is_empty() {
            return Err("at least one domain rule is required".to_string());
        }
        if self.domains.iter().any(|d| d.domain == Domain::Other) {
            return Err("'other' is the fallback domain and cannot have keywords".to_string());
        }
        for rule in &self.domains {
            if rule.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(format!("domain '{}' has no keywords", rule.domain));
            }
        }
        for rule in &self.requirements {
            if rule.triggers.is_empty() {
                return Err(format!("requirement '{}' has no triggers", rule.category));
            }
        }
        for rule in &self.constraints {
            if rule.triggers.is_empty() {
                return Err(format!("constraint '{}' has no triggers", rule.constraint_type));
            }
        }
        let weights = [
            self.scoring.base,
            self.scoring.action_keyword,
            self.scoring.per_requirement,
            self.scoring.requirement_cap,
            self.scoring.constraint_present,
            self.scoring.detailed_content,
            self.scoring.short_content_penalty,
            self.scoring.other_domain_penalty,
            self.scoring.no_requirements_penalty,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("scoring weights must be finite and non-negative".to_string());
        }
        Ok(())
    }
}
