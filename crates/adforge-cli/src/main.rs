use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::{bail, Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{Parser, Subcommand};
use serde_json::Value;
use uuid::Uuid;

use adforge_contracts::analysis::{AudienceStage, ContentPiece, ProductAnalysis};
use adforge_contracts::chat::{parse_intent, CHAT_HELP_COMMANDS, TAB_NAMES};
use adforge_contracts::events::{EventPayload, EventWriter};
use adforge_contracts::models::ModelSelector;
use adforge_contracts::runs::{write_summary, SessionSummary};
use adforge_contracts::session::{PieceKey, SearchToken, SessionState};
use adforge_engine::{
    AnalysisError, GeminiOracle, ResearchEngine, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL,
};

#[derive(Debug, Parser)]
#[command(name = "adforge", version, about = "Market research and ad content engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// One-shot analysis for a product name.
    Analyze(AnalyzeArgs),
    /// Interactive session: type a product name to analyze, /help for commands.
    Chat(ChatArgs),
}

#[derive(Debug, Parser)]
struct AnalyzeArgs {
    /// Product name to research.
    #[arg(long)]
    product: String,
    /// Directory for session artifacts (events.jsonl, analysis.json, summary.json).
    #[arg(long)]
    out: PathBuf,
    #[arg(long, default_value = DEFAULT_TEXT_MODEL)]
    text_model: String,
    #[arg(long, default_value = DEFAULT_IMAGE_MODEL)]
    image_model: String,
    /// Generate an ad visual for every content piece after the analysis.
    #[arg(long)]
    with_images: bool,
    /// Use the deterministic offline oracle (ignores the model flags).
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Parser)]
struct ChatArgs {
    /// Directory for session artifacts.
    #[arg(long)]
    out: PathBuf,
    #[arg(long, default_value = DEFAULT_TEXT_MODEL)]
    text_model: String,
    #[arg(long, default_value = DEFAULT_IMAGE_MODEL)]
    image_model: String,
    /// Use the deterministic offline oracle (ignores the model flags).
    #[arg(long)]
    dry_run: bool,
}

struct EnrichmentOutcome {
    token: SearchToken,
    stage: AudienceStage,
    piece_id: String,
    result: Result<String, adforge_engine::ImageError>,
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Analyze(args) => run_analyze(args),
        Command::Chat(args) => run_chat(args),
    };
    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn make_engine(dry_run: bool, text_model: &str, image_model: &str) -> Result<Arc<ResearchEngine>> {
    if dry_run {
        return Ok(Arc::new(ResearchEngine::dry_run()));
    }
    let selector = ModelSelector::new(None);
    let text = selector
        .select(Some(text_model), "text")
        .map_err(anyhow::Error::msg)?;
    let image = selector
        .select(Some(image_model), "image")
        .map_err(anyhow::Error::msg)?;
    for selection in [&text, &image] {
        if let Some(reason) = &selection.fallback_reason {
            eprintln!("note: {reason} Using '{}'.", selection.model.name);
        }
    }
    Ok(Arc::new(ResearchEngine::new(
        Box::new(GeminiOracle::new(GeminiOracle::api_key_from_env())),
        text.model.name,
        image.model.name,
    )))
}

fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    let session_id = format!("session-{}", Uuid::new_v4());
    let events = EventWriter::new(args.out.join("events.jsonl"), &session_id);
    let engine = make_engine(args.dry_run, &args.text_model, &args.image_model)?;
    let started_at = now_utc_iso();

    let mut session = SessionState::new();
    let Some(token) = session.begin_search(&args.product) else {
        bail!("product name must not be empty");
    };
    let warnings_count =
        run_search(&engine, &mut session, token, &events).context("analysis failed")?;

    if args.with_images {
        enrich_all_pieces(&engine, &mut session, token, &events);
    }

    let analysis = session
        .analysis()
        .expect("analysis present after successful search");
    render_decision_summary(analysis);
    write_session_artifacts(&args.out, &session, &session_id, &started_at, warnings_count)?;
    println!("\nSession artifacts written to {}", args.out.display());
    Ok(())
}

/// Runs the single analysis attempt for the current search and installs the
/// result. Returns the number of contract warnings on success.
fn run_search(
    engine: &ResearchEngine,
    session: &mut SessionState,
    token: SearchToken,
    events: &EventWriter,
) -> Result<u64> {
    let product_name = session.product_name().unwrap_or_default().to_string();
    let mut payload = EventPayload::new();
    payload.insert(
        "product_name".to_string(),
        Value::String(product_name.clone()),
    );
    payload.insert(
        "text_model".to_string(),
        Value::String(engine.text_model().to_string()),
    );
    payload.insert(
        "oracle".to_string(),
        Value::String(engine.oracle_name().to_string()),
    );
    events.emit("analysis_started", payload)?;

    match engine.analyze(&product_name) {
        Ok(outcome) => {
            for warning in &outcome.warnings {
                eprintln!("contract warning: {warning}");
                let mut payload = EventPayload::new();
                payload.insert("warning".to_string(), Value::String(warning.clone()));
                events.emit("contract_warning", payload)?;
            }
            let warnings_count = outcome.warnings.len() as u64;
            let mut payload = EventPayload::new();
            payload.insert(
                "verdict".to_string(),
                Value::String(outcome.analysis.final_decision.verdict.to_string()),
            );
            payload.insert(
                "total_pieces".to_string(),
                Value::Number((outcome.analysis.ad_copies.total_pieces() as u64).into()),
            );
            events.emit("analysis_completed", payload)?;
            session.complete_search(token, outcome.analysis);
            Ok(warnings_count)
        }
        Err(err) => {
            let kind = match &err {
                AnalysisError::EmptyProductName => "input",
                AnalysisError::Oracle(_) => "oracle",
                AnalysisError::MalformedResponse { .. } => "malformed_response",
            };
            let mut payload = EventPayload::new();
            payload.insert("kind".to_string(), Value::String(kind.to_string()));
            payload.insert("error".to_string(), Value::String(err.to_string()));
            events.emit("analysis_failed", payload)?;
            session.fail_search(token, &err.to_string());
            Err(err.into())
        }
    }
}

/// Fans one enrichment worker out per content piece, then drains the channel
/// and applies merges sequentially on this thread.
fn enrich_all_pieces(
    engine: &Arc<ResearchEngine>,
    session: &mut SessionState,
    token: SearchToken,
    events: &EventWriter,
) {
    let Some(analysis) = session.analysis() else {
        return;
    };
    let product_name = session.product_name().unwrap_or_default().to_string();
    let mut jobs = Vec::new();
    for stage in AudienceStage::ALL {
        for piece in analysis.ad_copies.stage(stage) {
            jobs.push((stage, piece.id.clone(), piece.title.clone()));
        }
    }

    let (tx, rx) = mpsc::channel();
    for (stage, piece_id, title) in jobs {
        spawn_enrichment(
            engine,
            session,
            events,
            &tx,
            token,
            stage,
            &piece_id,
            &image_subject(&title, &product_name),
        );
    }
    drop(tx);

    for outcome in rx {
        apply_enrichment(session, events, outcome);
    }
}

/// The subject sent to the image oracle for one piece.
fn image_subject(piece_title: &str, product_name: &str) -> String {
    format!("{piece_title} for {product_name}")
}

#[allow(clippy::too_many_arguments)]
fn spawn_enrichment(
    engine: &Arc<ResearchEngine>,
    session: &mut SessionState,
    events: &EventWriter,
    tx: &mpsc::Sender<EnrichmentOutcome>,
    token: SearchToken,
    stage: AudienceStage,
    piece_id: &str,
    subject: &str,
) {
    session.mark_generating(token, PieceKey::new(stage, piece_id));
    let mut payload = EventPayload::new();
    payload.insert("stage".to_string(), Value::String(stage.to_string()));
    payload.insert("piece_id".to_string(), Value::String(piece_id.to_string()));
    let _ = events.emit("image_requested", payload);

    let engine = Arc::clone(engine);
    let tx = tx.clone();
    let piece_id_owned = piece_id.to_string();
    let subject_owned = subject.to_string();
    let spawn = thread::Builder::new()
        .name(format!("enrich-{stage}-{piece_id}"))
        .spawn(move || {
            let result = engine.generate_image(&subject_owned);
            let _ = tx.send(EnrichmentOutcome {
                token,
                stage,
                piece_id: piece_id_owned,
                result,
            });
        });
    if let Err(err) = spawn {
        eprintln!("could not start image generation for {stage}/{piece_id}: {err}");
        session.enrichment_failed(token, stage, piece_id);
    }
}

/// Applies one enrichment result to the session. A failure is reported and
/// leaves the piece imageless; a stale token is discarded outright.
fn apply_enrichment(
    session: &mut SessionState,
    events: &EventWriter,
    outcome: EnrichmentOutcome,
) -> bool {
    let mut payload = EventPayload::new();
    payload.insert(
        "stage".to_string(),
        Value::String(outcome.stage.to_string()),
    );
    payload.insert(
        "piece_id".to_string(),
        Value::String(outcome.piece_id.clone()),
    );
    match outcome.result {
        Ok(uri) => {
            let applied =
                session.apply_image(outcome.token, outcome.stage, &outcome.piece_id, &uri);
            let event_type = if applied {
                "image_generated"
            } else {
                "image_discarded_stale"
            };
            let _ = events.emit(event_type, payload);
            applied
        }
        Err(err) => {
            session.enrichment_failed(outcome.token, outcome.stage, &outcome.piece_id);
            eprintln!(
                "image generation for {}/{} failed: {err}",
                outcome.stage, outcome.piece_id
            );
            payload.insert("error".to_string(), Value::String(err.to_string()));
            let _ = events.emit("image_failed", payload);
            false
        }
    }
}

fn run_chat(args: ChatArgs) -> Result<()> {
    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    let session_id = format!("session-{}", Uuid::new_v4());
    let events = EventWriter::new(args.out.join("events.jsonl"), &session_id);
    let started_at = now_utc_iso();

    let mut text_model = args.text_model.clone();
    let mut image_model = args.image_model.clone();
    let mut engine = make_engine(args.dry_run, &text_model, &image_model)?;
    let mut session = SessionState::new();
    let mut warnings_count: u64 = 0;
    let (tx, rx) = mpsc::channel::<EnrichmentOutcome>();

    println!("adforge chat — type a product name to analyze, /help for commands.");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        for outcome in rx.try_iter().collect::<Vec<_>>() {
            apply_enrichment(&mut session, &events, outcome);
        }

        print!("adforge> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let intent = parse_intent(&line);

        match intent.action.as_str() {
            "noop" => {}
            "quit" => break,
            "help" => {
                for command in CHAT_HELP_COMMANDS {
                    println!("  {command}");
                }
            }
            "list_tabs" => {
                for tab in TAB_NAMES {
                    println!("  {tab}");
                }
            }
            "analyze" => {
                let product = intent.prompt.as_deref().unwrap_or_default();
                let Some(token) = session.begin_search(product) else {
                    continue;
                };
                println!("Analyzing '{}'...", session.product_name().unwrap_or_default());
                match run_search(&engine, &mut session, token, &events) {
                    Ok(count) => {
                        warnings_count += count;
                        if let Some(analysis) = session.analysis() {
                            render_decision_summary(analysis);
                            println!("\nUse /tabs to list views, /show <tab> to open one.");
                        }
                    }
                    Err(err) => println!("{err:#}"),
                }
            }
            "show_tab" => {
                let tab = intent.command_args["tab"].as_str().unwrap_or_default();
                render_tab(&session, tab);
            }
            "unknown_tab" => {
                println!(
                    "Unknown tab '{}'. Valid tabs: {}",
                    intent.command_args["tab"].as_str().unwrap_or_default(),
                    TAB_NAMES.join(", ")
                );
            }
            "show_summary" => match session.analysis() {
                Some(analysis) => render_decision_summary(analysis),
                None => println!("No analysis yet."),
            },
            "generate_image" => {
                handle_image_intent(&engine, &mut session, &events, &tx, &intent);
            }
            "set_text_model" | "set_image_model" => {
                let model = intent.command_args["model"]
                    .as_str()
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                if model.is_empty() {
                    println!("Usage: /{} <model>", if intent.action == "set_text_model" {
                        "text_model"
                    } else {
                        "image_model"
                    });
                    continue;
                }
                if intent.action == "set_text_model" {
                    text_model = model;
                } else {
                    image_model = model;
                }
                match make_engine(args.dry_run, &text_model, &image_model) {
                    Ok(next) => {
                        engine = next;
                        println!(
                            "Models: text={} image={}",
                            engine.text_model(),
                            engine.image_model()
                        );
                    }
                    Err(err) => println!("{err:#}"),
                }
            }
            "unknown" => {
                println!(
                    "Unknown command '/{}'. /help lists commands.",
                    intent.command_args["command"].as_str().unwrap_or_default()
                );
            }
            other => {
                println!("Unhandled intent '{other}'.");
            }
        }
    }

    if session.pending_count() > 0 {
        println!(
            "Waiting for {} pending image generation(s)...",
            session.pending_count()
        );
    }
    drop(tx);
    for outcome in rx {
        apply_enrichment(&mut session, &events, outcome);
    }

    write_session_artifacts(&args.out, &session, &session_id, &started_at, warnings_count)?;
    println!("Session artifacts written to {}", args.out.display());
    Ok(())
}

fn handle_image_intent(
    engine: &Arc<ResearchEngine>,
    session: &mut SessionState,
    events: &EventWriter,
    tx: &mpsc::Sender<EnrichmentOutcome>,
    intent: &adforge_contracts::chat::Intent,
) {
    let stage_arg = intent.command_args["stage"].as_str().unwrap_or_default();
    let piece_id = intent.command_args["piece_id"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    if stage_arg.is_empty() || piece_id.is_empty() {
        println!("Usage: /image <stage> <piece-id>");
        return;
    }
    let stage = match stage_arg.parse::<AudienceStage>() {
        Ok(stage) => stage,
        Err(err) => {
            println!("{err}");
            return;
        }
    };
    let Some(token) = session.current_token() else {
        println!("Run an analysis first.");
        return;
    };
    let Some(analysis) = session.analysis() else {
        println!("Run an analysis first.");
        return;
    };
    let Some(piece) = analysis
        .ad_copies
        .stage(stage)
        .iter()
        .find(|piece| piece.id == piece_id)
    else {
        println!("No piece '{piece_id}' in stage '{stage}'.");
        return;
    };
    let key = PieceKey::new(stage, piece_id.clone());
    if session.is_generating(&key) {
        println!("Already generating an image for {stage}/{piece_id}.");
        return;
    }
    let product_name = session.product_name().unwrap_or_default().to_string();
    let subject = image_subject(&piece.title, &product_name);
    spawn_enrichment(engine, session, events, tx, token, stage, &piece_id, &subject);
    println!("Generating image for {stage}/{piece_id} in the background.");
}

fn write_session_artifacts(
    out: &Path,
    session: &SessionState,
    session_id: &str,
    started_at: &str,
    warnings_count: u64,
) -> Result<()> {
    if let Some(analysis) = session.analysis() {
        let path = out.join("analysis.json");
        fs::write(&path, serde_json::to_string_pretty(analysis)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    let (verdict, budget, total_pieces, images_generated) = match session.analysis() {
        Some(analysis) => (
            Some(analysis.final_decision.verdict.to_string()),
            Some(analysis.final_decision.starting_budget_bdt),
            analysis.ad_copies.total_pieces() as u64,
            count_generated_images(analysis),
        ),
        None => (None, None, 0, 0),
    };
    let summary = SessionSummary {
        session_id: session_id.to_string(),
        product_name: session.product_name().unwrap_or_default().to_string(),
        started_at: started_at.to_string(),
        finished_at: now_utc_iso(),
        verdict,
        starting_budget_bdt: budget,
        total_pieces,
        images_generated,
    };
    let mut extra = serde_json::Map::new();
    extra.insert(
        "contract_warnings".to_string(),
        Value::Number(warnings_count.into()),
    );
    write_summary(&out.join("summary.json"), &summary, Some(&extra))
}

fn count_generated_images(analysis: &ProductAnalysis) -> u64 {
    AudienceStage::ALL
        .iter()
        .flat_map(|stage| analysis.ad_copies.stage(*stage).iter())
        .filter(|piece| piece.generated_image_url.is_some())
        .count() as u64
}

fn render_tab(session: &SessionState, tab: &str) {
    let Some(analysis) = session.analysis() else {
        println!("No analysis yet.");
        return;
    };
    match tab {
        "decision-summary" => render_decision_summary(analysis),
        "market-and-customers" => render_market_and_customers(analysis),
        other => match other.parse::<AudienceStage>() {
            Ok(stage) => render_stage(session, analysis, stage),
            Err(_) => println!("Unknown tab '{other}'."),
        },
    }
}

fn render_decision_summary(analysis: &ProductAnalysis) {
    let decision = &analysis.final_decision;
    println!("\n== Decision Summary ==");
    println!("Verdict: {}", decision.verdict);
    println!("Starting budget (BDT): {}", decision.starting_budget_bdt);
    println!("Reasoning: {}", decision.decision_reasoning);
    if !decision.optimization_requirements.is_empty() {
        println!("Requirements:");
        for requirement in &decision.optimization_requirements {
            println!("  - {requirement}");
        }
    }
    if !decision.major_risks.is_empty() {
        println!("Risks:");
        for risk in &decision.major_risks {
            println!("  - {risk}");
        }
    }
}

fn render_market_and_customers(analysis: &ProductAnalysis) {
    let fit = &analysis.product_market_fit;
    println!("\n== Market Fit ==");
    println!("Core problem: {}", fit.core_problem);
    println!(
        "Urgency: {} | Demand: {} | Price sensitivity: {}",
        fit.urgency_level, fit.demand_type, fit.price_sensitivity
    );
    println!("Seasonality: {}", fit.seasonality);
    println!("Cultural relevance: {}", fit.cultural_relevance);
    println!("Market fit score: {}", fit.market_fit_score);

    let competition = &analysis.competition_analysis;
    println!("\n== Competition ==");
    println!(
        "Active sellers: {} | Daily sales/seller: {} | Entry: {}",
        competition.estimated_active_sellers,
        competition.avg_daily_sales_per_seller,
        competition.entry_difficulty
    );
    println!("Price range (BDT): {}", competition.price_range_bdt);
    println!(
        "Ad saturation — fb/ig: {} google: {} marketplaces: {}",
        competition.ad_saturation.facebook_instagram,
        competition.ad_saturation.google_ads,
        competition.ad_saturation.marketplaces
    );

    println!("\n== Customer Avatars ==");
    for avatar in &analysis.customer_avatars {
        println!(
            "- {} ({}, {}, {})",
            avatar.avatar_name, avatar.age_range, avatar.gender, avatar.location
        );
        println!("  wants: {}", avatar.desired_transformation);
        for pain in &avatar.pain_points {
            println!("  pain: {pain}");
        }
    }

    let funnel = &analysis.retargeting_funnel_logic;
    println!("\n== Funnel ==");
    println!("Cold → warm: {}", funnel.cold_to_warm);
    println!("Warm → hot: {}", funnel.warm_to_hot);
    println!("Retention: {}", funnel.retention_strategy);
    println!(
        "Sequence days: {}",
        funnel.recommended_sequence_days.join(", ")
    );
}

fn render_stage(session: &SessionState, analysis: &ProductAnalysis, stage: AudienceStage) {
    let pieces = analysis.ad_copies.stage(stage);
    println!("\n== {} ==", stage.label());
    if pieces.is_empty() {
        println!("No content pieces.");
        return;
    }
    for piece in pieces {
        render_piece(session, stage, piece);
    }
}

fn render_piece(session: &SessionState, stage: AudienceStage, piece: &ContentPiece) {
    println!("\n[{}] {}", piece.id, piece.title);
    println!("Psychology: {}", piece.connection_psychology);
    println!("Format: {}", piece.recommended_format);
    println!("Hooks:");
    for hook in &piece.hooks {
        println!("  - {hook}");
    }
    println!("Ideas:");
    for idea in &piece.ideas {
        println!("  - {idea}");
    }
    for (index, variation) in piece.variations.iter().enumerate() {
        println!("Variation {}:", index + 1);
        println!("  Headline: {}", variation.headline);
        println!("  Hook: {}", variation.hook);
        println!("  Body: {}", variation.body);
        println!("  CTA: {}", variation.cta);
    }
    let key = PieceKey::new(stage, piece.id.clone());
    if session.is_generating(&key) {
        println!("Image: generating...");
    } else {
        match &piece.generated_image_url {
            Some(uri) => println!("Image: embedded data URI ({} chars)", uri.len()),
            None => println!("Image: none (/image {} {})", stage, piece.id),
        }
    }
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use super::image_subject;

    #[test]
    fn image_subject_combines_title_and_product() {
        assert_eq!(
            image_subject("Morning ritual", "Organic Honey"),
            "Morning ritual for Organic Honey"
        );
    }
}
