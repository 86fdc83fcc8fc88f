//! absim - Persona-driven A/B testing simulator
//!
//! This is the main entry point for the absim binary. A run describes
//! two marketing image variants, evaluates them through a panel of
//! consumer personas, and reports the winner with confidence, deltas,
//! and recommendations.

mod cli;
mod config;
mod describer;
mod error;
mod logging;
mod orchestrator;
mod persona;
mod recommend;
mod report;
mod stats;
mod types;
mod version;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Commands, ConfigSubcommand, PersonaSubcommand};
use crate::config::SimConfig;
use crate::describer::{MockDescriber, OpenAiDescriber, SharedDescriber};
use crate::error::{Error, Result};
use crate::orchestrator::{Orchestrator, RunOutcome};
use crate::persona::{AffinityScorer, PersonaEvaluator, PersonaProfile};
use crate::stats::ComparisonPolicy;
use crate::types::ImageRef;

fn main() {
    if let Err(e) = run() {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments first (before logging, so we know verbosity)
    let cli = Cli::parse();

    // For commands that don't need full logging, use simple setup
    match &cli.command {
        Commands::Version => {
            version::print_version();
            return Ok(());
        }
        Commands::Config { subcommand } => {
            logging::init_simple(tracing::Level::WARN)?;
            return handle_config_command(subcommand.clone());
        }
        Commands::Persona { subcommand } => {
            logging::init_simple(tracing::Level::WARN)?;
            return handle_persona_command(subcommand.clone());
        }
        Commands::Run { .. } => {}
    }

    let Commands::Run {
        image_a,
        image_b,
        personas,
        config: config_path,
        output,
        detailed,
        no_save,
    } = cli.command
    else {
        unreachable!();
    };

    let mut config = SimConfig::load(config_path.as_deref())?;
    if let Some(dir) = output {
        config.storage.output_dir = dir;
    }

    // The guards must be kept alive for the lifetime of the program
    let _log_guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;

    let build = version::build_info();
    info!(
        version = %build.full_version(),
        target = %build.target,
        profile = %build.profile,
        "Starting absim"
    );

    let image_a = ImageRef::parse(&image_a)?;
    let image_b = ImageRef::parse(&image_b)?;
    let panel = resolve_personas(personas.as_deref())?;

    run_test(config, image_a, image_b, panel, detailed, no_save)
}

/// Resolve the persona panel from the CLI argument
fn resolve_personas(selection: Option<&str>) -> Result<Vec<PersonaProfile>> {
    match selection {
        None => Ok(persona::all_builtin()),
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|name| {
                persona::by_name(name).ok_or_else(|| Error::UnknownPersona {
                    name: name.to_string(),
                })
            })
            .collect(),
    }
}

/// Build the configured describer backend
fn build_describer(config: &SimConfig) -> Result<SharedDescriber> {
    match config.vision.backend.to_lowercase().as_str() {
        "mock" => Ok(Arc::new(MockDescriber::new())),
        _ => Ok(Arc::new(OpenAiDescriber::new(config.vision.clone())?)),
    }
}

/// Execute the A/B test run and print the summary
fn run_test(
    config: SimConfig,
    image_a: ImageRef,
    image_b: ImageRef,
    panel: Vec<PersonaProfile>,
    detailed: bool,
    no_save: bool,
) -> Result<()> {
    let describer = build_describer(&config)?;
    info!(backend = describer.name(), "Vision backend selected");
    let evaluator = Arc::new(PersonaEvaluator::new(Arc::new(AffinityScorer::new())));
    let policy = ComparisonPolicy {
        significance_threshold_pct: config.evaluation.significance_threshold_pct,
        min_sample_count: config.evaluation.min_sample_count,
        ..Default::default()
    };
    let orchestrator = Orchestrator::new(
        describer,
        evaluator,
        policy,
        config.evaluation.delta_threshold,
        config.evaluation.max_concurrent_evaluations,
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("absim")
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))?;

    let run_timeout = Duration::from_secs(config.evaluation.run_timeout_secs);
    let outcome = runtime.block_on(async {
        match tokio::time::timeout(run_timeout, orchestrator.run(&image_a, &image_b, &panel)).await
        {
            Ok(result) => result,
            Err(_) => Err(Error::pipeline_aborted(format!(
                "run timed out after {}s",
                run_timeout.as_secs()
            ))),
        }
    })?;

    print_summary(&outcome, detailed);

    if !no_save {
        let path = report::save_result(&outcome.result, &config.storage.output_dir)?;
        println!("\nReport saved: {}", path.display());
    }

    Ok(())
}

/// Print the run summary to stdout
fn print_summary(outcome: &RunOutcome, detailed: bool) {
    let result = &outcome.result;

    println!("\nA/B Test Results");
    println!("================");
    println!("Winner:       {}", result.winner);
    println!(
        "Confidence:   {:.1}% {}",
        result.confidence_score.abs(),
        if result.statistically_significant {
            "(statistically significant)"
        } else {
            "(not significant)"
        }
    );

    println!("\nVariant averages:");
    println!(
        "  A: {:>6.1}  ({} personas)",
        result.variants.a.average_score, result.variants.a.sample_count
    );
    println!(
        "  B: {:>6.1}  ({} personas)",
        result.variants.b.average_score, result.variants.b.sample_count
    );

    println!("\nPersona scores (A / B):");
    for (persona, score_a) in &result.variants.a.persona_scores {
        match result.variants.b.persona_scores.get(persona) {
            Some(score_b) => println!("  {:<10} {:>6.1} / {:.1}", persona, score_a, score_b),
            None => println!("  {:<10} {:>6.1} / -", persona, score_a),
        }
    }
    for (persona, score_b) in &result.variants.b.persona_scores {
        if !result.variants.a.persona_scores.contains_key(persona) {
            println!("  {:<10}      - / {:.1}", persona, score_b);
        }
    }

    if !result.recommendations.is_empty() {
        println!("\nRecommendations:");
        for (i, rec) in result.recommendations.iter().enumerate() {
            println!("  {}. {}", i + 1, rec);
        }
    }

    if !result.failures.is_empty() {
        println!("\nFailures:");
        for failure in &result.failures {
            match failure.variant {
                Some(variant) => println!(
                    "  {} (variant {}): {}",
                    failure.persona, variant, failure.reason
                ),
                None => println!("  {} (both variants): {}", failure.persona, failure.reason),
            }
        }
    }

    if detailed {
        println!("\nVerdict details:");
        for verdict in &outcome.verdicts {
            println!(
                "  [{}] {:<10} {:>6.1}  {}",
                verdict.variant, verdict.persona, verdict.score, verdict.rationale
            );
        }
    }
}

/// Handle configuration subcommands
fn handle_config_command(subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show { config } => {
            let cfg = SimConfig::load(config.as_deref())?;
            let toml_str = toml::to_string_pretty(&cfg)?;
            println!("{}", toml_str);
            Ok(())
        }
        ConfigSubcommand::Init { path, force } => config::init_config(path.as_deref(), force),
        ConfigSubcommand::Validate { config } => {
            let cfg = SimConfig::load(config.as_deref())?;
            cfg.validate()?;
            println!("Configuration is valid.");
            Ok(())
        }
    }
}

/// Handle persona subcommands
fn handle_persona_command(subcommand: PersonaSubcommand) -> Result<()> {
    match subcommand {
        PersonaSubcommand::List => {
            println!("Built-in personas:\n");
            for p in persona::all_builtin() {
                println!(
                    "  {:<8} {:<13} ${}/month, max ${} per purchase",
                    p.name,
                    format!("({})", p.bias),
                    p.monthly_budget,
                    p.max_single_purchase
                );
                println!("           {}", p.archetype);
            }
            Ok(())
        }
        PersonaSubcommand::Show { name } => {
            let p = persona::by_name(&name).ok_or(Error::UnknownPersona { name })?;
            println!("Persona: {}", p.name);
            println!("  Archetype:       {}", p.archetype);
            println!("  Bias:            {}", p.bias);
            println!("  Monthly budget:  ${}", p.monthly_budget);
            println!("  Max purchase:    ${}", p.max_single_purchase);
            println!("  Decision factors:");
            for fw in &p.factors {
                println!("    {:<16} {:.2}", fw.factor.slug(), fw.weight);
            }
            Ok(())
        }
    }
}
