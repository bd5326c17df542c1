mod sinks;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use image::{DynamicImage, ImageFormat};
use pixelmorph::frame_renderer::{render_final, render_frames, render_random_walk};
use pixelmorph::{
    AnimationPlan, FrameDelay, LumaReport, MorphConfig, Photo, PixelMorphProcessor,
    RankingAlgorithm, RenderThreading,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::sinks::{ensure_parent_dir, to_rgba_image, GifSink, PngDirectorySink};

/// Command line arguments structure.
#[derive(Parser, Debug)]
#[command(author, version, about = "Morph one image into another by moving its pixels.")]
struct Cli {
    /// Log debug details (ranking, planning, per-chunk progress).
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the linear morph as an animated GIF.
    Gif(GifArgs),
    /// Write only the final rearranged image (PNG, or JPEG by extension).
    Image(ImageArgs),
    /// Write every frame of the linear morph as a numbered PNG.
    Frames(FramesArgs),
    /// Render a random-step morph as an animated GIF.
    Random(RandomArgs),
    /// Check that the correspondence conserves total luma.
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Source image, whose pixels are moved
    source: PathBuf,

    /// Target image, whose arrangement the pixels take on
    target: PathBuf,

    /// Ranking algorithm: default or featured.
    /// - default: rank both images by luma, then green, then red.
    /// - featured: rank the target by luma, then local neighbourhood luma.
    #[arg(long, default_value = "default")]
    algorithm: String,

    /// Optionally write the serialized animation plan to this file
    #[arg(long)]
    output_plan: Option<PathBuf>,
}

impl InputArgs {
    /// Run configuration for commands without delay or threading options.
    fn morph_config(&self) -> anyhow::Result<MorphConfig> {
        Ok(MorphConfig {
            algorithm: parse_algorithm(self)?,
            ..MorphConfig::default()
        })
    }
}

#[derive(Args, Debug)]
struct ThreadingArgs {
    /// Render frames one at a time on the calling thread
    #[arg(long)]
    sequential: bool,

    /// Worker threads for parallel rendering (defaults to one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Frames rendered per parallel batch
    #[arg(long, default_value_t = 32)]
    chunk_size: usize,
}

impl ThreadingArgs {
    fn to_threading(&self) -> RenderThreading {
        RenderThreading {
            parallel: !self.sequential,
            chunk_size: self.chunk_size,
            threads: self.threads,
        }
    }
}

#[derive(Args, Debug)]
struct GifOutputArgs {
    /// Output GIF filename
    output: PathBuf,

    /// Delay between frames in hundredths of a second (default 1)
    #[arg(allow_negative_numbers = true)]
    delay: Option<String>,

    /// GIF palette quantization speed, 1 (best) to 30 (fastest)
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(i32).range(1..=30))]
    quantize_speed: i32,
}

#[derive(Args, Debug)]
struct GifArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    gif: GifOutputArgs,

    #[command(flatten)]
    threading: ThreadingArgs,
}

#[derive(Args, Debug)]
struct ImageArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output image filename
    output: PathBuf,
}

#[derive(Args, Debug)]
struct FramesArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Directory receiving frame_00000.png, frame_00001.png, ...
    output_dir: PathBuf,

    #[command(flatten)]
    threading: ThreadingArgs,
}

#[derive(Args, Debug)]
struct RandomArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    gif: GifOutputArgs,

    /// Seed for the random steps; omit for a different animation every run
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Also encode the final image here and report the luma change caused by the codec
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.cmd {
        Command::Gif(args) => cmd_gif(args),
        Command::Image(args) => cmd_image(args),
        Command::Frames(args) => cmd_frames(args),
        Command::Random(args) => cmd_random(args),
        Command::Analyze(args) => cmd_analyze(args),
    }?;

    println!("Done.");
    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

impl GifArgs {
    fn morph_config(&self) -> anyhow::Result<MorphConfig> {
        Ok(MorphConfig {
            delay: FrameDelay::parse_or_default(self.gif.delay.as_deref()),
            threading: self.threading.to_threading(),
            ..self.input.morph_config()?
        })
    }
}

impl FramesArgs {
    fn morph_config(&self) -> anyhow::Result<MorphConfig> {
        Ok(MorphConfig {
            threading: self.threading.to_threading(),
            ..self.input.morph_config()?
        })
    }
}

impl RandomArgs {
    fn morph_config(&self) -> anyhow::Result<MorphConfig> {
        Ok(MorphConfig {
            delay: FrameDelay::parse_or_default(self.gif.delay.as_deref()),
            ..self.input.morph_config()?
        })
    }
}

fn cmd_gif(args: GifArgs) -> anyhow::Result<()> {
    let config = args.morph_config()?;
    let plan = load_and_plan(&args.input, &config)?;

    let mut sink = GifSink::new(&args.gif.output, args.gif.quantize_speed);
    render_frames(&plan, &config.threading, config.delay, &mut sink)
        .with_context(|| format!("rendering GIF '{}'", args.gif.output.display()))?;
    Ok(())
}

fn cmd_image(args: ImageArgs) -> anyhow::Result<()> {
    let config = args.input.morph_config()?;
    let plan = load_and_plan(&args.input, &config)?;
    tracing::info!("generating the final rearranged image");
    save_photo(&render_final(&plan), &args.output)
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    let config = args.morph_config()?;
    let plan = load_and_plan(&args.input, &config)?;
    let mut sink = PngDirectorySink::new(&args.output_dir);
    render_frames(&plan, &config.threading, config.delay, &mut sink)
        .with_context(|| format!("writing frames to '{}'", args.output_dir.display()))?;
    Ok(())
}

fn cmd_random(args: RandomArgs) -> anyhow::Result<()> {
    let config = args.morph_config()?;
    let plan = load_and_plan(&args.input, &config)?;

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut sink = GifSink::new(&args.gif.output, args.gif.quantize_speed);
    render_random_walk(&plan, rng, config.delay, &mut sink)
        .with_context(|| format!("rendering random-step GIF '{}'", args.gif.output.display()))?;
    Ok(())
}

fn cmd_analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let config = args.input.morph_config()?;
    let processor = load_processor(&args.input, &config)?;
    let (plan, report) = processor.analyze()?;
    write_plan_if_requested(&args.input, &plan)?;

    println!("pixels:           {}", plan.pixels.len());
    println!("frames:           {}", plan.frame_count);
    println!("in-memory luma:   {report}");

    if let Some(output) = &args.output {
        let final_photo = render_final(&plan);
        save_photo(&final_photo, output)?;
        let decoded = read_photo(output)?;
        let codec_report = LumaReport::new(processor.source().total_luma(), decoded.total_luma());
        println!("after encoding:   {codec_report}");
        if !codec_report.is_conserved() && report.is_conserved() {
            println!(
                "the difference after encoding comes from the image codec, not the correspondence"
            );
        }
    }

    if !report.is_conserved() {
        anyhow::bail!("luma was not conserved by the correspondence: {report}");
    }
    Ok(())
}

fn parse_algorithm(input: &InputArgs) -> anyhow::Result<RankingAlgorithm> {
    Ok(input.algorithm.parse::<RankingAlgorithm>()?)
}

fn load_processor(input: &InputArgs, config: &MorphConfig) -> anyhow::Result<PixelMorphProcessor> {
    let source = read_photo(&input.source)?;
    let target = read_photo(&input.target)?;
    PixelMorphProcessor::new(source, target, config.algorithm).with_context(|| {
        format!(
            "source '{}' and target '{}' must have the same dimensions",
            input.source.display(),
            input.target.display()
        )
    })
}

fn load_and_plan(input: &InputArgs, config: &MorphConfig) -> anyhow::Result<AnimationPlan> {
    let processor = load_processor(input, config)?;
    let plan = processor.plan()?;
    if plan.is_empty() {
        tracing::warn!("images have zero area, the plan has no frames");
    }
    write_plan_if_requested(input, &plan)?;
    Ok(plan)
}

fn write_plan_if_requested(input: &InputArgs, plan: &AnimationPlan) -> anyhow::Result<()> {
    if let Some(path) = &input.output_plan {
        ensure_parent_dir(path)?;
        std::fs::write(path, plan.serialize())
            .with_context(|| format!("could not write plan file '{}'", path.display()))?;
        tracing::info!("animation plan written to {}", path.display());
    }
    Ok(())
}

pub fn save_photo(photo: &Photo, path: &Path) -> anyhow::Result<()> {
    tracing::info!("writing image {}", path.display());
    ensure_parent_dir(path)?;
    let image = to_rgba_image(photo)?;
    let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Png);
    let result = match format {
        // JPEG has no alpha channel.
        ImageFormat::Jpeg => DynamicImage::ImageRgba8(image)
            .to_rgb8()
            .save_with_format(path, format),
        _ => image.save_with_format(path, format),
    };
    result.with_context(|| format!("could not write image '{}'", path.display()))
}

pub fn read_photo(path: &Path) -> anyhow::Result<Photo> {
    tracing::info!("reading image file: {}", path.display());
    let img = image::open(path)
        .with_context(|| format!("could not load image '{}'", path.display()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(Photo::from_rgba(width as usize, height as usize, rgba.into_raw())?)
}
