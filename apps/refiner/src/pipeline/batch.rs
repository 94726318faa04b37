//! Config-driven batch runs. One project per item, processed sequentially;
//! a failing item is recorded and never stops its siblings.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{RefinementPipeline, RunOutcome};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
    pub inputs: Vec<String>,
}

impl ProjectSpec {
    /// `name` wins over `output_name` as the output basename.
    pub fn output_basename(&self) -> Option<&str> {
        self.name.as_deref().or(self.output_name.as_deref())
    }
}

/// Either `{projects: [...]}` or a single project at the top level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchConfig {
    Multi { projects: Vec<ProjectSpec> },
    Single(ProjectSpec),
}

impl BatchConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch config {}", path.display()))?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let config: BatchConfig = match ext.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&raw).with_context(|| {
                format!("{}: config must contain 'inputs' or 'projects'", path.display())
            })?,
            "json" => serde_json::from_str(&raw).with_context(|| {
                format!("{}: config must contain 'inputs' or 'projects'", path.display())
            })?,
            other => bail!("Unsupported config format: '.{other}'"),
        };
        Ok(config)
    }

    pub fn into_projects(self) -> Vec<ProjectSpec> {
        match self {
            BatchConfig::Multi { projects } => projects,
            BatchConfig::Single(project) => vec![project],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchItem {
    pub project: String,
    pub outcome: RunOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub results: Vec<BatchItem>,
    pub total: usize,
    pub succeeded: usize,
    pub rejected: usize,
    pub failed: usize,
}

impl BatchReport {
    fn from_items(results: Vec<BatchItem>) -> Self {
        let mut report = BatchReport {
            total: results.len(),
            succeeded: 0,
            rejected: 0,
            failed: 0,
            results: Vec::new(),
        };
        for item in &results {
            match item.outcome {
                RunOutcome::Success { .. } => report.succeeded += 1,
                RunOutcome::Rejected { .. } => report.rejected += 1,
                RunOutcome::Failed { .. } => report.failed += 1,
            }
        }
        report.results = results;
        report
    }
}

/// Runs every project in `config_path`. Relative file inputs resolve against
/// the config's directory first, then the working directory.
pub async fn run_batch(pipeline: &RefinementPipeline, config_path: &Path) -> Result<BatchReport> {
    let projects = BatchConfig::load(config_path)?.into_projects();
    let base = config_path.parent().map(Path::to_path_buf).unwrap_or_default();

    info!(
        config = %config_path.display(),
        projects = projects.len(),
        "Starting batch run"
    );

    let mut items = Vec::with_capacity(projects.len());
    for (i, project) in projects.iter().enumerate() {
        let label = project
            .output_basename()
            .map(str::to_string)
            .unwrap_or_else(|| format!("project_{}", i + 1));
        info!(project = %label, position = i + 1, total = projects.len(), "Processing project");

        let inputs: Vec<String> = project
            .inputs
            .iter()
            .map(|input| resolve_input(&base, input))
            .collect();

        let outcome = pipeline
            .process_and_refine(&inputs, project.output_basename())
            .await;
        items.push(BatchItem {
            project: label,
            outcome,
        });
    }

    let report = BatchReport::from_items(items);
    info!(
        total = report.total,
        succeeded = report.succeeded,
        rejected = report.rejected,
        failed = report.failed,
        "Batch run finished"
    );
    Ok(report)
}

fn resolve_input(base: &Path, input: &str) -> String {
    let candidate = base.join(input.trim());
    if !Path::new(input.trim()).is_absolute() && candidate.is_file() {
        candidate.display().to_string()
    } else {
        input.to_string()
    }
}

pub fn sample_config() -> BatchConfig {
    BatchConfig::Multi {
        projects: vec![
            ProjectSpec {
                name: Some("my_first_project".to_string()),
                output_name: None,
                inputs: vec![
                    "path/to/requirements.pdf".to_string(),
                    "path/to/design_sketch.png".to_string(),
                    "Additional context: This is for a mobile app targeting young adults"
                        .to_string(),
                ],
            },
            ProjectSpec {
                name: Some("my_second_project".to_string()),
                output_name: None,
                inputs: vec![concat!(
                    "Build a RESTful API for managing user accounts.\n",
                    "Must include: registration, login, profile updates.\n",
                    "Should use JWT authentication.\n",
                    "Target deployment: AWS Lambda\n"
                )
                .to_string()],
            },
        ],
    }
}

pub fn write_sample_config(path: &Path) -> Result<PathBuf> {
    let yaml = serde_yaml::to_string(&sample_config()).context("Failed to encode sample config")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write sample config {}", path.display()))?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::ingest::InputProcessor;
    use crate::pipeline::output::OutputWriter;
    use crate::refinement::engine::RuleBasedRefiner;
    use crate::refinement::rules::RuleSet;

    fn pipeline(out: &Path) -> RefinementPipeline {
        let rules = Arc::new(RuleSet::default());
        RefinementPipeline::new(
            InputProcessor::new("tesseract", Duration::from_secs(5)),
            Arc::new(RuleBasedRefiner::new(rules.clone())),
            rules,
            OutputWriter::new(out),
        )
    }

    #[test]
    fn test_single_project_yaml() {
        let config: BatchConfig =
            serde_yaml::from_str("output_name: crm\ninputs:\n  - Build a CRM\n").unwrap();
        let projects = config.into_projects();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].output_basename(), Some("crm"));
    }

    #[test]
    fn test_name_wins_over_output_name() {
        let project = ProjectSpec {
            name: Some("a".to_string()),
            output_name: Some("b".to_string()),
            inputs: vec![],
        };
        assert_eq!(project.output_basename(), Some("a"));
    }

    #[test]
    fn test_config_without_inputs_or_projects_is_error() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"title": "nothing here"}}"#).unwrap();
        let err = BatchConfig::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("'inputs' or 'projects'"));
    }

    #[test]
    fn test_sample_config_round_trips_through_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input_config.yaml");
        write_sample_config(&path).unwrap();

        let loaded = BatchConfig::load(&path).unwrap();
        assert_eq!(loaded, sample_config());
    }

    #[tokio::test]
    async fn test_failing_item_does_not_stop_siblings() {
        let out = tempfile::tempdir().unwrap();
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(
            file,
            r#"projects:
  - name: broken
    inputs: ["missing/requirements.pdf"]
  - name: greeting
    inputs: ["hello"]
  - name: booking
    inputs: ["Build a booking web app for yoga studios with login and payments."]
"#
        )
        .unwrap();

        let report = run_batch(&pipeline(out.path()), file.path()).await.unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.results[2].project, "booking");
        assert!(out.path().join("booking.json").exists());
    }

    #[tokio::test]
    async fn test_relative_inputs_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("brief.txt"),
            "Create a volunteer scheduling system for a food bank.",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("batch.yaml"),
            "name: food_bank\ninputs:\n  - brief.txt\n",
        )
        .unwrap();

        let out = dir.path().join("out");
        let report = run_batch(&pipeline(&out), &dir.path().join("batch.yaml"))
            .await
            .unwrap();
        assert_eq!(report.succeeded, 1);
        let prompt = report.results[0].outcome.prompt().unwrap();
        assert!(prompt.core_intent.contains("food bank"));
    }
}
