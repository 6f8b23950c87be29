//! Command-line interface for the server binary.

use clap::Parser;
use std::path::PathBuf;

use huddle_core::Settings;

/// Huddle - multi-agent meeting server
#[derive(Parser, Debug)]
#[command(name = "huddle-server")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Host to bind to (overrides HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Scenario to start per meeting: travel, customer_service, assistant
    #[arg(short, long)]
    pub scenario: Option<String>,

    /// Knowledge chunk file for the assistant scenario
    #[arg(short, long)]
    pub knowledge_file: Option<PathBuf>,

    /// Use scripted pipelines instead of Gemini; no credentials needed
    #[arg(long)]
    pub offline: bool,
}

impl Cli {
    /// Log level for the given verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::INFO,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }

    /// Applies command-line overrides on top of environment settings.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(host) = &self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(scenario) = &self.scenario {
            settings.scenario = scenario.clone();
        }
        if let Some(path) = &self.knowledge_file {
            settings.knowledge_file = Some(path.clone());
        }
    }
}
