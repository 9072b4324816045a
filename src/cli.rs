use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use crate::config::Config;
use crate::core::{
    ArchetypeProfile, AssessmentSession, CompletionAnalyzer, CompletionReport, DerivedProfile,
    ResponseState, TraitClassifier,
};

#[derive(Parser)]
#[command(name = "soulmates")]
#[command(about = "StoryQuest completion checks and trait-vector classification")]
#[command(version)]
pub struct Args {
    /// Configuration directory (defaults to <config dir>/soulmates)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect the scenario catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommands,
    },
    /// Report which scenarios of a response file are still unanswered
    Analyze {
        /// JSON file with "responses" and optional "answered"
        file: PathBuf,
        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Pre-submission check of a response file (value-based)
    Validate {
        file: PathBuf,
    },
    /// Backfill missing responses with the neutral value and print the result
    Autofill {
        file: PathBuf,
    },
    /// Derive archetype, attachment style and love languages from a trait vector
    Classify {
        /// JSON file holding an array of trait values
        file: Option<PathBuf>,
        /// Comma-separated trait values instead of a file
        #[arg(long, value_delimiter = ',')]
        values: Option<Vec<f64>>,
        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Submit a response file as a session and classify the result.
    /// Gaps are backfilled when submitting from the last scenario with few enough missing.
    Submit {
        file: PathBuf,
        /// Scenario the respondent is on (defaults to the last one)
        #[arg(long)]
        current_index: Option<usize>,
        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// List the archetypes with their reference descriptions
    Archetypes,
}

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// Validate a catalog file (or the configured one) against the trait layout
    Check {
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// List chapters with their scenario indices
    Chapters,
}

/// Response file accepted by analyze / validate / autofill
#[derive(Debug, Deserialize)]
pub struct ResponseFile {
    pub responses: Vec<Option<f64>>,
    #[serde(default)]
    pub answered: Option<BTreeSet<usize>>,
    #[serde(default)]
    pub confidence_scores: Vec<f64>,
}

impl ResponseFile {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Session state for these responses.
    ///
    /// Without an explicit answered set every present value counts as answered.
    pub fn into_state(self) -> ResponseState {
        let mut state = ResponseState::new(self.responses.len());
        if !self.confidence_scores.is_empty() {
            state.confidence_scores = self.confidence_scores;
        }
        state.answered = match self.answered {
            Some(answered) => answered,
            None => self
                .responses
                .iter()
                .enumerate()
                .filter(|(_, r)| r.is_some())
                .map(|(i, _)| i)
                .collect(),
        };
        state.responses = self.responses;
        state
    }
}

pub fn run(args: Args) -> Result<()> {
    let config = Config::new(args.data_dir)?;

    match args.command {
        Commands::Catalog { command } => match command {
            CatalogCommands::Check { path } => handle_catalog_check(&config, path),
            CatalogCommands::Chapters => handle_chapters(&config),
        },
        Commands::Analyze { file, format } => handle_analyze(&config, &file, &format),
        Commands::Validate { file } => handle_validate(&config, &file),
        Commands::Autofill { file } => handle_autofill(&config, &file),
        Commands::Classify {
            file,
            values,
            format,
        } => handle_classify(&config, file, values, &format),
        Commands::Submit {
            file,
            current_index,
            format,
        } => handle_submit(&config, &file, current_index, &format),
        Commands::Archetypes => handle_archetypes(),
    }
}

fn handle_catalog_check(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let mut config = config.clone();
    if path.is_some() {
        config.catalog_path = path;
    }
    let engine = config.engine()?;

    println!("✅ Catalog OK: {} scenarios, {} chapters",
             engine.catalog.len(), engine.catalog.chapters().len());
    println!("   Scoring table v{}", engine.classifier.table().version);
    Ok(())
}

fn handle_chapters(config: &Config) -> Result<()> {
    let catalog = config.load_catalog()?;

    for chapter in catalog.chapters() {
        let indices: Vec<String> = catalog
            .scenarios_for_chapter(chapter)
            .iter()
            .map(|s| s.index.to_string())
            .collect();
        println!("📖 {} ({})", chapter, indices.join(", "));
    }
    Ok(())
}

fn print_report(report: &CompletionReport) {
    let status = if report.can_complete { "✅ Complete" } else { "⚠️  Incomplete" };
    println!("{}: {}/{} answered", status, report.answered_count, report.total_scenarios);

    if !report.array_size_correct {
        println!("   Array size does not match the catalog");
    }
    for gap in &report.unanswered_by_chapter {
        let indices: Vec<String> = gap.indices.iter().map(|i| i.to_string()).collect();
        println!("   {}: {}", gap.chapter, indices.join(", "));
    }
    for issue in &report.issues {
        println!("❌ {}", issue);
    }
    for recommendation in &report.recommendations {
        println!("💡 {}", recommendation);
    }
}

fn handle_analyze(config: &Config, file: &Path, format: &str) -> Result<()> {
    let catalog = config.load_catalog()?;
    let input = ResponseFile::load(file)?;
    let report =
        CompletionAnalyzer::new(&catalog).analyze(&input.responses, input.answered.as_ref());

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print_report(&report),
    }
    Ok(())
}

fn handle_validate(config: &Config, file: &Path) -> Result<()> {
    let catalog = config.load_catalog()?;
    let input = ResponseFile::load(file)?;
    let validation = CompletionAnalyzer::new(&catalog).validate(&input.responses);

    if validation.valid {
        println!("✅ Responses are complete");
        return Ok(());
    }
    for error in &validation.errors {
        println!("❌ {}", error);
    }
    bail!("{} validation error(s)", validation.errors.len())
}

fn handle_autofill(config: &Config, file: &Path) -> Result<()> {
    let catalog = config.load_catalog()?;
    let input = ResponseFile::load(file)?;
    let filled =
        CompletionAnalyzer::new(&catalog).auto_fill(&input.responses, &input.confidence_scores);

    eprintln!("🔧 Filled {} scenario(s)", filled.filled_count);
    println!("{}", serde_json::to_string_pretty(&filled)?);
    Ok(())
}

fn print_profile(profile: &DerivedProfile) {
    let reference = profile.archetype_profile();
    println!("🧭 Archetype: {}", profile.archetype);
    println!("   {}", reference.description);
    println!("🤝 Attachment: {}", profile.attachment_style);
    println!("💞 Love languages: {}", profile.love_language_labels().join(", "));
}

fn handle_classify(
    config: &Config,
    file: Option<PathBuf>,
    values: Option<Vec<f64>>,
    format: &str,
) -> Result<()> {
    let traits: Vec<f64> = match (file, values) {
        (_, Some(values)) => values,
        (Some(file), None) => {
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("{} is not a JSON array of numbers", file.display()))?
        }
        (None, None) => bail!("Provide a trait file or --values"),
    };

    let classifier = TraitClassifier::new(config.load_scoring_table()?, Default::default())?;
    if traits.len() != classifier.layout().dimension() {
        eprintln!("⚠️  {} values given, expected {}; showing fallback labels",
                  traits.len(), classifier.layout().dimension());
    }
    let profile = classifier.classify(&traits);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&profile)?),
        _ => print_profile(&profile),
    }
    Ok(())
}

fn handle_submit(
    config: &Config,
    file: &Path,
    current_index: Option<usize>,
    format: &str,
) -> Result<()> {
    let engine = config.engine()?;
    let state = ResponseFile::load(file)?.into_state();

    let mut session = AssessmentSession::resume(&engine.catalog, state, config.auto_fill_margin);
    let current = current_index.unwrap_or_else(|| engine.catalog.last_index());
    let before = session.answered_count();
    let traits = session
        .submit(current, engine.classifier.layout())
        .context("Submission rejected")?;
    let filled = session.answered_count() - before;
    if filled > 0 {
        eprintln!("🔧 Auto-filled {} scenario(s) with the neutral value", filled);
    }

    let profile = engine.classifier.classify(traits.as_slice());
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&profile)?),
        _ => print_profile(&profile),
    }
    Ok(())
}

fn handle_archetypes() -> Result<()> {
    for profile in ArchetypeProfile::all() {
        let matches: Vec<&str> = profile.ideal_matches.iter().map(|a| a.label()).collect();
        println!("✨ {} ({})", profile.name, profile.attachment_style);
        println!("   {}", profile.description);
        println!("   Ideal matches: {}", matches.join(", "));
    }
    Ok(())
}
