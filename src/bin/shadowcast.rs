use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use shadowcast::{
    CommitOutcome, DecodeTicket, FrameRGBA, InputSlot, RasterImage, ShadowParams, ShadowPipeline,
    ShadowResult,
};

#[derive(Parser, Debug)]
#[command(name = "shadowcast", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Place a subject on a background with a synthesized shadow and write PNGs.
    Render(RenderArgs),
    /// Print the effective parameters as JSON.
    Params(ParamsArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Subject cutout (PNG with alpha, JPEG, ...).
    #[arg(long)]
    subject: PathBuf,

    /// Background image.
    #[arg(long)]
    background: PathBuf,

    /// Depth map of the subject (brighter = nearer unless inverted).
    #[arg(long)]
    depth: Option<PathBuf>,

    /// Composite output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Shadow-only output PNG path.
    #[arg(long)]
    shadow_out: Option<PathBuf>,

    /// Mask output PNG path.
    #[arg(long)]
    mask_out: Option<PathBuf>,

    /// Processed depth (grayscale) output PNG path.
    #[arg(long)]
    depth_out: Option<PathBuf>,

    /// Processed depth clipped by the mask output PNG path.
    #[arg(long)]
    masked_depth_out: Option<PathBuf>,

    #[command(flatten)]
    params: ParamsArgs,
}

#[derive(Parser, Debug)]
struct ParamsArgs {
    /// Parameter JSON; flags below override its fields.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Light angle in degrees.
    #[arg(long)]
    angle: Option<f64>,

    /// Light elevation in degrees (1..=89).
    #[arg(long)]
    elevation: Option<f64>,

    /// How much depth lengthens the cast (0..=2).
    #[arg(long)]
    depth_strength: Option<f64>,

    /// Number of depth bands.
    #[arg(long)]
    layers: Option<u32>,

    /// Ignore the depth map and cast the whole silhouette.
    #[arg(long)]
    no_depth: bool,

    /// Invert the depth map.
    #[arg(long)]
    invert_depth: bool,

    /// Depth gamma (0.4..=2.5).
    #[arg(long)]
    depth_gamma: Option<f32>,

    /// Depth map scale relative to the subject.
    #[arg(long)]
    depth_scale: Option<f32>,

    /// Depth map horizontal offset in pixels.
    #[arg(long, allow_hyphen_values = true)]
    depth_offset_x: Option<i32>,

    /// Depth map vertical offset in pixels.
    #[arg(long, allow_hyphen_values = true)]
    depth_offset_y: Option<i32>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Params(args) => cmd_params(args),
    }
}

fn build_params(args: &ParamsArgs) -> anyhow::Result<ShadowParams> {
    let mut p = match &args.params {
        Some(path) => ShadowParams::from_path(path)
            .with_context(|| format!("load params '{}'", path.display()))?,
        None => ShadowParams::default(),
    };
    if let Some(v) = args.angle {
        p.light.angle_deg = v;
    }
    if let Some(v) = args.elevation {
        p.light.elevation_deg = v;
    }
    if let Some(v) = args.depth_strength {
        p.depth_strength = v;
    }
    if let Some(v) = args.layers {
        p.layer_count = v;
    }
    if args.no_depth {
        p.use_depth = false;
    }
    if args.invert_depth {
        p.calibration.invert = true;
    }
    if let Some(v) = args.depth_gamma {
        p.calibration.gamma = v;
    }
    if let Some(v) = args.depth_scale {
        p.calibration.scale = v;
    }
    if let Some(v) = args.depth_offset_x {
        p.calibration.offset_x = v;
    }
    if let Some(v) = args.depth_offset_y {
        p.calibration.offset_y = v;
    }
    p.validate()?;
    Ok(p)
}

fn cmd_params(args: ParamsArgs) -> anyhow::Result<()> {
    let p = build_params(&args)?;
    println!("{}", p.clamped().to_json_string()?);
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let params = build_params(&args.params)?;
    let mut pipeline = ShadowPipeline::new(params);

    let subject_ticket = pipeline.begin_decode(InputSlot::Subject);
    let background_ticket = pipeline.begin_decode(InputSlot::Background);
    let depth_ticket = args
        .depth
        .as_ref()
        .map(|_| pipeline.begin_decode(InputSlot::DepthSource));

    let (subject, (background, depth)) = rayon::join(
        || decode(&subject_ticket, &args.subject),
        || {
            rayon::join(
                || decode(&background_ticket, &args.background),
                || {
                    args.depth
                        .as_ref()
                        .zip(depth_ticket.as_ref())
                        .map(|(path, ticket)| decode(ticket, path))
                },
            )
        },
    );

    commit(&mut pipeline, subject_ticket, subject, &args.subject)?;
    commit(&mut pipeline, background_ticket, background, &args.background)?;
    if let (Some(ticket), Some(decoded), Some(path)) = (depth_ticket, depth, args.depth.as_ref()) {
        commit(&mut pipeline, ticket, decoded, path)?;
    }

    let report = pipeline.refresh()?;
    tracing::info!(rebuilt = ?report.rebuilt, "pipeline refreshed");
    for failure in &report.failed {
        eprintln!("warning: {:?} stage failed: {}", failure.stage, failure.message);
    }

    let placement = pipeline
        .placement()
        .context("subject or background has a zero dimension")?;
    eprintln!(
        "placement x={} y={} w={} h={}",
        placement.x, placement.y, placement.w, placement.h
    );

    let composite = pipeline.composite().context("no composite was produced")?;
    write_frame(&args.out, composite)?;

    if let Some(path) = &args.shadow_out {
        let shadow = pipeline.shadow().context("no shadow was produced")?;
        write_frame(path, shadow.frame())?;
    }
    if let Some(path) = &args.mask_out {
        let mask = pipeline.mask().context("no mask was produced")?;
        write_raster(path, mask.image())?;
    }
    if let Some(path) = &args.depth_out {
        let depth = pipeline
            .depth_visualization()
            .context("--depth-out needs --depth")?;
        write_raster(path, &depth)?;
    }
    if let Some(path) = &args.masked_depth_out {
        let depth = pipeline
            .masked_depth_visualization()
            .context("--masked-depth-out needs --depth")?;
        write_raster(path, &depth)?;
    }
    Ok(())
}

fn decode(ticket: &DecodeTicket, path: &Path) -> ShadowResult<RasterImage> {
    if ticket.is_cancelled() {
        return Err(shadowcast::ShadowError::decode("decode cancelled"));
    }
    shadowcast::decode_image_path(path)
}

fn commit(
    pipeline: &mut ShadowPipeline,
    ticket: DecodeTicket,
    decoded: ShadowResult<RasterImage>,
    path: &Path,
) -> anyhow::Result<()> {
    let outcome = pipeline
        .commit_decoded(ticket, decoded)
        .with_context(|| format!("decode '{}'", path.display()))?;
    if outcome == CommitOutcome::Superseded {
        anyhow::bail!("decode of '{}' was superseded", path.display());
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn write_frame(path: &Path, frame: &FrameRGBA) -> anyhow::Result<()> {
    let img = frame.to_rgba_image()?;
    ensure_parent(path)?;
    img.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn write_raster(path: &Path, raster: &RasterImage) -> anyhow::Result<()> {
    ensure_parent(path)?;
    raster
        .as_image()
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", path.display()))?;
    eprintln!("wrote {}", path.display());
    Ok(())
}
