//! `kotak fonts`: show the picker catalog against the installed faces.

use kotak_common::config::AppConfig;
use kotak_model::font::FONT_CATALOG;
use kotak_render::FontBook;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    let book = FontBook::from_config(&config.fonts)?;

    println!("{:<10} {:<16} INSTALLED", "LABEL", "FAMILY");
    for choice in FONT_CATALOG.iter() {
        let installed = if book.has_family(choice.family) { "yes" } else { "no" };
        println!("{:<10} {:<16} {installed}", choice.label, choice.family);
    }

    println!();
    println!("Fallback family: {}", config.fonts.fallback_family);
    if book.is_empty() {
        println!("No font files found in:");
        for dir in &config.fonts.dirs {
            println!("  {}", dir.display());
        }
    } else {
        println!("Loaded families: {}", book.families().join(", "));
    }
    Ok(())
}
