use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::StreamExt;
use scanwise_tui::app::{run_tui, App, ScanHooks};
use scanwise_tui::component::{decode_document, UiComponent};
use scanwise_tui::config::Config;
use scanwise_tui::engine::GenerativeEngine;
use scanwise_tui::logging;
use scanwise_tui::schema::UserProfile;
use scanwise_tui::session::{ScanController, StreamEvent, StreamMessage};
use scanwise_tui::stream::{ReplaySource, ScanInput, ScanRequest, SnapshotSource};
use scanwise_tui::ui::leaf::RenderContext;
use scanwise_tui::ui::partial::{partial_view, PartialContext};
use scanwise_tui::ui::tree::render_tree;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "heic"];
const CHECK_WIDTH: u16 = 80;

#[derive(Parser, Debug)]
#[command(
    name = "scanwise",
    about = "Stream an AI food-label analysis into a live terminal view",
    version
)]
struct Args {
    /// Label text, a product name, or a path to a label photo
    input: Option<String>,

    /// Dietary profile: diabetic, vegan or paleo
    #[arg(short, long)]
    profile: Option<UserProfile>,

    /// Stream this analysis JSON document instead of a demo
    #[arg(long, value_name = "FILE")]
    analysis: Option<PathBuf>,

    /// Render a component tree JSON file directly (no stream)
    #[arg(long, value_name = "FILE", conflicts_with = "analysis")]
    tree: Option<PathBuf>,

    /// Drop the stream after N chunks
    #[arg(long, value_name = "N")]
    fail_after: Option<usize>,

    /// Print the generated tree and exit (no TUI)
    #[arg(short, long)]
    check: bool,

    /// Also log to stderr
    #[arg(long)]
    log_stderr: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load();
    if let Some(profile) = args.profile {
        config.profile = profile;
    }

    let _guard = logging::init_tracing(&config.log_dir(), args.log_stderr)?;
    tracing::info!(profile = %config.profile, check = args.check, "scanwise starting");

    if let Some(path) = &args.tree {
        let tree = load_tree(path)?;
        if args.check {
            return print_tree(&tree);
        }
        let app = App::new(config.profile, ScanHooks::default())
            .with_motion(config.motion())
            .with_static_tree(tree);
        let source: Arc<dyn SnapshotSource> =
            Arc::new(ReplaySource::new(config.stream_chunk_chars, config.stream_delay()));
        return run_tui(app, source).await;
    }

    let input = scan_input(args.input.as_deref());
    let delay = if args.check {
        Duration::ZERO
    } else {
        config.stream_delay()
    };
    let mut replay = ReplaySource::new(config.stream_chunk_chars, delay);
    if let Some(path) = &args.analysis {
        let document = fs::read_to_string(path)
            .with_context(|| format!("Failed to read analysis {}", path.display()))?;
        replay = replay.with_document(document);
    }
    if let Some(chunks) = args.fail_after {
        replay = replay.with_failure_after(chunks);
    }
    let source: Arc<dyn SnapshotSource> = Arc::new(replay);
    let engine = GenerativeEngine::new(config.engine_policy());

    if args.check {
        let request = ScanRequest::new(input, config.profile);
        return run_check(source, request, engine).await;
    }

    let app = App::new(config.profile, ScanHooks::default())
        .with_engine(engine)
        .with_motion(config.motion())
        .with_input(input);
    run_tui(app, source).await
}

/// An existing image file is scanned as a photo, anything else as text.
fn scan_input(arg: Option<&str>) -> ScanInput {
    let Some(arg) = arg else {
        return ScanInput::Text(String::new());
    };
    let path = Path::new(arg);
    let is_image = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
    if is_image && path.is_file() {
        ScanInput::Image(path.to_path_buf())
    } else {
        ScanInput::Text(arg.to_string())
    }
}

fn load_tree(path: &Path) -> Result<Vec<UiComponent>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read tree {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    Ok(decode_document(&value))
}

fn print_tree(tree: &[UiComponent]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(tree)?);
    println!();
    let ctx = RenderContext::new(CHECK_WIDTH, Duration::ZERO);
    println!("{}", render_tree(tree, &ctx).plain_text());
    Ok(())
}

/// Drain one scan without a terminal and print what it produced.
async fn run_check(
    source: Arc<dyn SnapshotSource>,
    request: ScanRequest,
    engine: GenerativeEngine,
) -> Result<()> {
    let mut controller = ScanController::new(engine);
    let scan = controller.start_scan(&request, Instant::now());

    let mut snapshots = source.submit(request);
    let mut seq = 0u64;
    while let Some(item) = snapshots.next().await {
        let event = match item {
            Ok(value) => {
                seq += 1;
                StreamEvent::Snapshot { seq, value }
            }
            Err(err) => StreamEvent::Failed(err),
        };
        controller.apply(StreamMessage { scan, event });
    }
    controller.apply(StreamMessage {
        scan,
        event: StreamEvent::Completed,
    });

    let session = controller.session().context("scan session vanished")?;
    if let Some(err) = session.error() {
        bail!("scan failed: {}", err);
    }
    match session.tree() {
        Some(tree) => print_tree(tree),
        None => {
            eprintln!("Analysis ended incomplete; showing the partial result.");
            let ctx = PartialContext::new(session.profile(), CHECK_WIDTH).finished();
            println!("{}", partial_view(session.snapshot(), &ctx).plain_text());
            Ok(())
        }
    }
}
