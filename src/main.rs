//! tinyrender command line driver
//!
//! Renders scene files and converts between TGA and PNG.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tinyrender::scene::{load_image, load_scene, save_image, SceneError};
use tinyrender::tga::{self, Compression, EncodeOptions, PixelFormat};

#[derive(Parser)]
#[command(name = "tinyrender", version = tinyrender::VERSION, about = "Software rasterizer and TGA tool")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a RON scene file
    Render {
        scene: PathBuf,
        /// Override the scene's TGA output path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert between TGA and PNG (format chosen by extension)
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// Keep alpha when writing TGA
        #[arg(long)]
        alpha: bool,
        /// Run-length compress TGA output
        #[arg(long)]
        rle: bool,
    },
    /// Print the header of a TGA file
    Info { input: PathBuf },
}

fn render(scene_path: PathBuf, output: Option<PathBuf>) -> Result<(), SceneError> {
    let mut scene = load_scene(&scene_path)?;
    if let Some(output) = output {
        scene.output = output;
    }
    tracing::info!(
        scene = %scene_path.display(),
        width = scene.width,
        height = scene.height,
        "rendering"
    );

    let (framebuffer, stats) = scene.render()?;
    tracing::info!(
        drawn = stats.faces_drawn,
        culled = stats.faces_culled,
        pixels = stats.pixels_written,
        "render complete"
    );
    scene.save_outputs(&framebuffer)
}

fn convert(input: PathBuf, output: PathBuf, alpha: bool, rle: bool) -> Result<(), SceneError> {
    let img = load_image(&input)?;
    let options = EncodeOptions {
        format: if alpha { PixelFormat::Rgba32 } else { PixelFormat::Rgb24 },
        compression: if rle { Compression::Rle } else { Compression::Raw },
    };
    save_image(&img, &output, options)?;
    tracing::info!(from = %input.display(), to = %output.display(), "converted");
    Ok(())
}

fn info(input: PathBuf) -> Result<(), SceneError> {
    let data = std::fs::read(&input)?;
    let info = tga::read_header(&data)?;
    println!("{}", input.display());
    println!("  size:        {}x{}", info.width, info.height);
    println!("  type:        {:?}{}", info.kind, if info.rle { " (RLE)" } else { "" });
    println!("  bits/pixel:  {}", info.raw.bpp);
    if info.raw.palette_type != 0 {
        println!(
            "  palette:     {} entries from {}, {} bit",
            info.raw.palette_length, info.raw.palette_first, info.raw.palette_bpp
        );
    }
    println!("  alpha:       {} ({:?})", info.has_alpha, info.color_model);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let result = match args.command {
        Command::Render { scene, output } => render(scene, output),
        Command::Convert { input, output, alpha, rle } => convert(input, output, alpha, rle),
        Command::Info { input } => info(input),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
