use anyhow::{bail, Context};
use clap::Parser;
use foundermatch_core::utils::logger::init_logging;
use foundermatch_core::{load_env, load_env_from_path, MatchReport, MatcherConfig, StrategyKind};
use foundermatch_plugin_matching::MatchContext;
use foundermatch_provider_local::{completion_service, embedding_service};
use std::io::{IsTerminal, Read};

#[derive(Parser, Debug)]
#[command(
    name = "run-matcher",
    about = "Find investors for a startup idea",
    long_about = "Find investors for a startup idea.\n\nThe catalog, index and model backends are configured with FOUNDERMATCH_* environment variables (a .env file, or the file named by FOUNDERMATCH_ENV_FILE, is honored)."
)]
struct Cli {
    /// Matching pipeline: `tags` (LLM tag filter) or `embedding` (semantic search)
    #[arg(long, env = "FOUNDERMATCH_STRATEGY", default_value = "tags")]
    strategy: StrategyKind,

    /// Number of investors to return (defaults to FOUNDERMATCH_TOP_K, then 5)
    #[arg(long)]
    k: Option<usize>,

    /// Print the match report as JSON
    #[arg(long)]
    json: bool,

    #[arg(long, env = "FOUNDERMATCH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Startup idea; read from stdin when omitted
    idea: Vec<String>,
}

fn read_idea(words: &[String]) -> anyhow::Result<String> {
    let idea = if words.is_empty() {
        let stdin = std::io::stdin();
        if stdin.is_terminal() {
            eprintln!("Describe your startup idea, then press Ctrl-D:");
        }
        let mut buf = String::new();
        stdin
            .lock()
            .read_to_string(&mut buf)
            .context("failed to read idea from stdin")?;
        buf
    } else {
        words.join(" ")
    };

    let idea = idea.trim().to_string();
    if idea.is_empty() {
        bail!("Please enter a description of your startup idea.");
    }
    Ok(idea)
}

fn render(report: &MatchReport) {
    if let Some(tags) = &report.tags {
        println!("Extracted tags");
        println!("  Domain: {}", tags.domain.join(", "));
        println!("  Stage:  {}", tags.stage);
        println!("  Region: {}", tags.region);
        println!();
    }

    if report.result.is_empty() {
        println!("No matching investors found. Try adjusting your description.");
        return;
    }

    println!("Top {} investor matches ({})", report.result.len(), report.strategy);
    for (rank, entry) in report.result.iter().enumerate() {
        let investor = &entry.investor;
        let field = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());

        println!();
        println!("{}. {}", rank + 1, investor.name);
        println!("   Type: {}", investor.investor_type);
        println!("   Focus: {}", field(&investor.investment_thesis));
        println!("   Stage: {}", field(&investor.stage_of_investment));
        println!("   Location: {}", field(&investor.countries_of_investment));
        println!("   Check Size: {}", investor.cheque_range());
        if let Some(distance) = entry.distance {
            println!("   Distance: {:.4}", distance);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match std::env::var("FOUNDERMATCH_ENV_FILE") {
        Ok(path) => load_env_from_path(path)?,
        Err(_) => load_env()?,
    }
    let cli = Cli::parse();
    std::env::set_var("FOUNDERMATCH_LOG_LEVEL", &cli.log_level);
    init_logging();

    let mut config = MatcherConfig::from_env().context("invalid configuration")?;
    if let Some(k) = cli.k {
        config.top_k = k;
    }
    config.validate()?;

    // Everything is loaded and cross-checked before the idea is read
    let completion = completion_service(&config.completion)?;
    let embedding = embedding_service(&config.embedding)?;
    let context = MatchContext::load(&config, completion, embedding)
        .context("failed to load investor data")?;
    let strategy = context.strategy(cli.strategy)?;

    let idea = read_idea(&cli.idea)?;
    tracing::debug!("Matching idea ({} chars) with {}", idea.len(), strategy.kind());

    let report = strategy.find_matches(&idea).await?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render(&report);
    }
    Ok(())
}
