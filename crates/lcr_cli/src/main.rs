use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lcr_ai::analysis::{analyze_contract, answer_question, PipelineOptions};
use lcr_ai::chunking::split_documents;
use lcr_ai::corpus::{load_corpus, CorpusPaths};
use lcr_ai::embeddings::upstage_embed::UpstageEmbedder;
use lcr_ai::groundedness::upstage_check::UpstageGroundednessCheck;
use lcr_ai::index::CollectionStore;
use lcr_ai::landlord::extract_landlord_name;
use lcr_ai::llm::upstage_chat::UpstageChatModel;
use lcr_ai::retrieve::Retriever;
use lcr_ai::upstage::UpstageClient;
use lcr_core::config::AnalyzerConfig;
use lcr_core::defaulters::screen_landlord;
use lcr_core::error::AppError;
use lcr_core::report::{render_report, ReportInput};
use lcr_core::rules::{analyze_contract_rules, LandlordScreening};

mod extract;

#[derive(Debug, Parser)]
#[command(name = "leasereview", about = "Lease contract risk analysis")]
struct Cli {
    /// Configuration file (TOML). Defaults apply when absent.
    #[arg(long, default_value = "leasereview.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the knowledge-base collection (skipped if it already exists).
    BuildKb,
    /// Analyze a lease contract file and print the markdown report.
    Analyze {
        /// Contract file; plain text of the contract (see extract seam).
        file: PathBuf,
    },
    /// Ask a consultation question against the knowledge base.
    Ask { question: String },
    /// Probe the configured API endpoint.
    Health,
}

fn now_rfc3339_utc() -> Result<String, AppError> {
    OffsetDateTime::now_utc().format(&Rfc3339).map_err(|e| {
        AppError::new("TIME_FORMAT_FAILED", "Failed to format current time")
            .with_details(e.to_string())
    })
}

fn load_config(path: &Path) -> Result<AnalyzerConfig, AppError> {
    let mut cfg = if path.exists() {
        let raw = fs::read_to_string(path).map_err(|e| {
            AppError::new("CONFIG_INVALID", "Failed to read configuration file")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        toml::from_str(&raw).map_err(|e| {
            AppError::new("CONFIG_INVALID", "Failed to parse configuration file")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?
    } else {
        info!(path = %path.display(), "config file absent; using defaults");
        AnalyzerConfig::default()
    };

    // Environment fallback for the credential, resolved once here; the
    // pipeline itself never reads the environment.
    if cfg.api.api_key.is_none() {
        if let Ok(key) = std::env::var("UPSTAGE_API_KEY") {
            if !key.trim().is_empty() {
                cfg.api.api_key = Some(key);
            }
        }
    }

    cfg.validate()?;
    Ok(cfg)
}

struct Services {
    embedder: UpstageEmbedder,
    chat: UpstageChatModel,
    checker: UpstageGroundednessCheck,
}

fn build_services(cfg: &AnalyzerConfig) -> Result<Services, AppError> {
    let client = UpstageClient::new(&cfg.api.base_url, cfg.api.api_key.as_deref())?;
    Ok(Services {
        embedder: UpstageEmbedder::new(client.clone(), cfg.models.embedding_model.clone()),
        chat: UpstageChatModel::new(
            client.clone(),
            cfg.models.chat_model.clone(),
            cfg.models.reasoning_effort.clone(),
        ),
        checker: UpstageGroundednessCheck::new(client, cfg.models.groundedness_model.clone()),
    })
}

fn pipeline_options(cfg: &AnalyzerConfig) -> PipelineOptions {
    PipelineOptions {
        top_k: cfg.retrieval.top_k,
        split_threshold_tokens: cfg.limits.split_threshold_tokens,
    }
}

fn corpus_paths(cfg: &AnalyzerConfig) -> CorpusPaths {
    CorpusPaths {
        qa_json: cfg.paths.qa_json.clone(),
        statute_json: cfg.paths.statute_json.clone(),
        clauses_csv: cfg.paths.clauses_csv.clone(),
    }
}

fn build_kb(cfg: &AnalyzerConfig) -> Result<(), AppError> {
    let services = build_services(cfg)?;
    let store = CollectionStore::open(cfg.paths.collection_dir.clone());

    if store.status()?.ready {
        println!(
            "Collection already exists at {}; nothing to do.",
            cfg.paths.collection_dir.display()
        );
        return Ok(());
    }

    let docs = load_corpus(&corpus_paths(cfg));
    let chunks = split_documents(&docs, cfg.chunking.chunk_size, cfg.chunking.chunk_overlap)?;
    let status = store.build(&chunks, &services.embedder, &now_rfc3339_utc()?)?;
    println!(
        "Built collection at {} ({} chunks, {} dims).",
        cfg.paths.collection_dir.display(),
        status.chunk_count,
        status.dims.unwrap_or(0)
    );
    Ok(())
}

fn analyze(cfg: &AnalyzerConfig, file: &Path) -> Result<(), AppError> {
    let (text, status) = extract::extract_text(file);
    if text.trim().is_empty() {
        return Err(AppError::new("AI_INPUT_EMPTY", "No contract text extracted")
            .with_details(format!("file={}; status={status}", file.display())));
    }

    let services = build_services(cfg)?;
    // A missing collection is a degraded-but-working state, not an error.
    let retriever = CollectionStore::load(cfg.paths.collection_dir.clone())?
        .map(|store| Retriever::new(store, &services.embedder));
    if retriever.is_none() {
        warn!(
            path = %cfg.paths.collection_dir.display(),
            "collection not built; analysis will run without grounding"
        );
    }

    let mut rules = analyze_contract_rules(&text);
    let screening = match extract_landlord_name(&services.chat, &text) {
        Some(name) => screen_landlord(&cfg.paths.defaulter_csv, &name),
        None => LandlordScreening::NameNotFound,
    };
    rules.record_landlord_screening(&screening);

    let outcome = analyze_contract(
        retriever.as_ref(),
        &services.chat,
        &services.checker,
        &pipeline_options(cfg),
        &text,
    )?;
    if let Some(verdict) = outcome.groundedness.as_ref() {
        info!(label = verdict.label.as_str(), "analysis groundedness verdict");
    } else {
        warn!("analysis produced no groundedness verdict");
    }

    let report = render_report(&ReportInput {
        source_label: &file.display().to_string(),
        rules: &rules,
        ai_markdown: &outcome.markdown,
        mode: outcome.mode,
        groundedness: outcome.groundedness.as_ref(),
        generated_at: &now_rfc3339_utc()?,
    });
    println!("{report}");
    Ok(())
}

fn ask(cfg: &AnalyzerConfig, question: &str) -> Result<(), AppError> {
    let services = build_services(cfg)?;
    let retriever = CollectionStore::load(cfg.paths.collection_dir.clone())?
        .map(|store| Retriever::new(store, &services.embedder));

    let outcome = answer_question(
        retriever.as_ref(),
        &services.chat,
        &services.checker,
        &pipeline_options(cfg),
        question,
    )?;
    if let Some(verdict) = outcome.groundedness.as_ref() {
        info!(label = verdict.label.as_str(), "consultation groundedness verdict");
    }
    println!("{}", outcome.markdown);
    Ok(())
}

fn health(cfg: &AnalyzerConfig) -> Result<(), AppError> {
    let client = UpstageClient::new(&cfg.api.base_url, cfg.api.api_key.as_deref())?;
    client.health_check()?;
    println!("API endpoint reachable: {}", client.base_url());

    let store = CollectionStore::open(cfg.paths.collection_dir.clone());
    let st = store.status()?;
    if st.ready {
        println!(
            "Collection ready: {} chunks ({}).",
            st.chunk_count,
            st.model_family.as_deref().unwrap_or("unknown model")
        );
    } else {
        println!("Collection not built; run `leasereview build-kb`.");
    }
    Ok(())
}

fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match &cli.command {
        Command::BuildKb => build_kb(&cfg),
        Command::Analyze { file } => analyze(&cfg, file),
        Command::Ask { question } => ask(&cfg, question),
        Command::Health => health(&cfg),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            if let Some(details) = e.details.as_deref() {
                eprintln!("  {details}");
            }
            ExitCode::FAILURE
        }
    }
}
