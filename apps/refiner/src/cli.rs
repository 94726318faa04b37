//! CLI command definitions using clap.
//!
//! - serve: run the HTTP API (default when no subcommand is given)
//! - refine: refine files and/or literal text into a prompt document
//! - batch: run every project in a YAML/JSON config
//! - validate: run the relevance gate only
//! - sample-config: write an example batch config

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Turns loosely written task descriptions into structured prompt documents
#[derive(Parser, Debug)]
#[command(name = "refiner")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory refined prompts are written to
    #[arg(short, long, global = true, env = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// YAML or JSON rule table replacing the built-in keyword tables
    #[arg(long, global = true, env = "RULES_PATH")]
    pub rules: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Refine one or more inputs (file paths or literal text) into one prompt
    Refine {
        /// Files (.txt, .md, .pdf, .docx, images) or quoted text
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output basename (defaults to the prompt id)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Process every project in a batch config
    Batch {
        /// Path to a .yaml, .yml or .json config
        config: PathBuf,
    },

    /// Check whether text is worth refining, without refining it
    Validate {
        text: String,

        /// text, image, pdf or docx
        #[arg(short = 't', long, default_value = "text")]
        input_type: String,
    },

    /// Write an example batch config
    SampleConfig {
        #[arg(default_value = "input_config.yaml")]
        path: PathBuf,
    },
}

impl Cli {
    pub fn command_or_default(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve { port: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["refiner"]).unwrap();
        assert_eq!(cli.command_or_default(), Commands::Serve { port: None });
    }

    #[test]
    fn test_refine_with_name_and_global_output_dir() {
        let cli = Cli::try_parse_from([
            "refiner",
            "refine",
            "brief.pdf",
            "Must run on iOS",
            "--name",
            "mobile_app",
            "--output-dir",
            "/tmp/out",
        ])
        .unwrap();
        assert_eq!(cli.output_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(
            cli.command_or_default(),
            Commands::Refine {
                inputs: vec!["brief.pdf".to_string(), "Must run on iOS".to_string()],
                name: Some("mobile_app".to_string()),
            }
        );
    }

    #[test]
    fn test_refine_requires_inputs() {
        assert!(Cli::try_parse_from(["refiner", "refine"]).is_err());
    }

    #[test]
    fn test_sample_config_default_path() {
        let cli = Cli::try_parse_from(["refiner", "sample-config"]).unwrap();
        assert_eq!(
            cli.command_or_default(),
            Commands::SampleConfig {
                path: PathBuf::from("input_config.yaml")
            }
        );
    }
}
