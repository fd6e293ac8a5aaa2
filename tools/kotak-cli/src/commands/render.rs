//! `kotak render`: paint one card and write it as PNG.

use std::path::PathBuf;

use kotak_common::config::AppConfig;
use kotak_render::{Compositor, RenderOutcome};

use super::load_glyphs;
use super::request::RequestArgs;

pub async fn run(
    args: RequestArgs,
    out: Option<PathBuf>,
    block_glyphs: bool,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let request = args.build(&config.canvas)?;
    let glyphs = load_glyphs(config, block_glyphs)?;
    tracing::info!(glyphs = glyphs.name(), mode = ?request.mode, "Rendering card");

    let compositor = Compositor::new(glyphs);
    compositor.set_quality_callback(|advice| {
        if let Some(advice) = advice {
            println!("Note: {advice}");
        }
    });

    let frame = match compositor.render(request).await? {
        RenderOutcome::Rendered(frame) => frame,
        RenderOutcome::Superseded { generation, latest } => {
            anyhow::bail!("Render {generation} was superseded by {latest}")
        }
    };

    let path = match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, compositor.export_png()?)?;
            path
        }
        None => compositor.save_png(&config.output_dir)?,
    };

    println!("Rendered {}x{}", frame.image.width(), frame.image.height());
    if let Some(layout) = &frame.layout {
        println!("  Font size: {}", layout.fit.font_size);
        println!("  Lines:     {}", layout.fit.lines.len());
        if layout.fit.overflow {
            println!("  Warning: text overflows at the minimum size");
        }
    }
    println!("  Saved:     {}", path.display());
    Ok(())
}
