use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use portfolio_backdrop::config::Configuration;
use portfolio_backdrop::layers::LayerWindow;
use portfolio_backdrop::pool::ImagePool;
use portfolio_backdrop::tasks::rotator::{self, Rotator};
use portfolio_backdrop::viewport::{FixedViewport, Viewport};
use portfolio_backdrop::{build_selector, load_pool};

#[derive(Debug, Parser)]
#[command(
    name = "backdrop",
    version,
    about = "Rotating photo background engine"
)]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG")]
    config: PathBuf,
    /// Print the window after each of N rotations without waiting on timers
    #[arg(long = "dry-run", value_name = "ROTATIONS")]
    dry_run: Option<usize>,
    /// Print the loaded image pool and exit
    #[arg(long = "list-pool")]
    list_pool: bool,
    /// Override the configured viewport, e.g. 1920x1080
    #[arg(long, value_name = "WxH", value_parser = parse_viewport)]
    viewport: Option<Viewport>,
    /// Deterministic RNG seed for image selection
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Stop after this long (e.g. "30s") instead of waiting for Ctrl-C
    #[arg(long = "run-for", value_name = "DURATION", value_parser = humantime::parse_duration)]
    run_for: Option<Duration>,
}

fn parse_viewport(raw: &str) -> Result<Viewport> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("expected WIDTHxHEIGHT, got {raw:?}"))?;
    let width: f64 = w.trim().parse().context("invalid viewport width")?;
    let height: f64 = h.trim().parse().context("invalid viewport height")?;
    if width <= 0.0 || height <= 0.0 {
        bail!("viewport dimensions must be positive");
    }
    Ok(Viewport::new(width, height))
}

#[tokio::main]
async fn main() -> Result<()> {
    // init tracing (RUST_LOG controls level, default = info); stdout is reserved for frames
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();

    let Args {
        config,
        dry_run,
        list_pool,
        viewport,
        seed,
        run_for,
    } = Args::parse();

    let mut cfg = Configuration::from_yaml_file(&config)
        .with_context(|| format!("failed to load configuration from {}", config.display()))?;
    if let Some(viewport) = viewport {
        cfg.viewport = viewport;
    }
    if seed.is_some() {
        cfg.rotation.seed = seed;
    }
    let cfg = cfg.validated().context("invalid configuration values")?;
    tracing::debug!("Loaded configuration from {}:\n{:#?}", config.display(), cfg);

    let pool = {
        let cfg = cfg.clone();
        tokio::task::spawn_blocking(move || load_pool(&cfg))
            .await
            .context("pool loader panicked")??
    };
    tracing::info!(images = pool.len(), "image pool ready");

    if list_pool {
        print_pool(&pool)?;
        return Ok(());
    }

    let selector = build_selector(&cfg, Arc::new(FixedViewport(cfg.viewport)));

    if let Some(rotations) = dry_run {
        let plan = rotator::simulate(selector, &pool, rotations);
        print_plan(&plan)?;
        return Ok(());
    }

    let rotator = Rotator::new(pool, cfg.rotation.clone(), selector);
    let mut frames = rotator.subscribe();
    emit_frame(&frames.borrow_and_update())?;
    rotator.start()?;

    let deadline = async {
        match run_for {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                if let Err(err) = res {
                    tracing::warn!("ctrl-c handler failed: {err}");
                }
                tracing::info!("ctrl-c received; shutting down");
                break;
            }
            _ = &mut deadline => {
                tracing::info!("run-for elapsed; shutting down");
                break;
            }
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                emit_frame(&frames.borrow_and_update())?;
            }
        }
    }

    rotator.stop().await;
    Ok(())
}

fn emit_frame(frame: &portfolio_backdrop::events::Frame) -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer(&mut out, frame)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn print_pool(pool: &ImagePool) -> Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "# image pool: {} images", pool.len())?;
    for image in pool.list_images() {
        writeln!(
            out,
            "  {:>6.3}  {}  {}",
            image.aspect_ratio, image.colors.light_vibrant, image.src
        )?;
    }
    Ok(())
}

fn print_plan(plan: &[LayerWindow]) -> Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "# rotation dry run\n# rotations: {}\n", plan.len())?;
    if plan.is_empty() {
        writeln!(out, "(no rotations)")?;
    }
    for (idx, window) in plan.iter().enumerate() {
        writeln!(
            out,
            "  {:>4}: {}  accent {}",
            idx + 1,
            window,
            window.accent()
        )?;
    }
    Ok(())
}
