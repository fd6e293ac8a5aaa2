//! `kotak layout`: print the fitted layout without painting.

use kotak_common::config::AppConfig;
use kotak_layout::measure::MetricTableMeasurer;
use kotak_layout::place::layout_request;

use super::load_glyphs;
use super::request::RequestArgs;

pub fn run(args: RequestArgs, metrics_only: bool, config: &AppConfig) -> anyhow::Result<()> {
    let request = args.build(&config.canvas)?;

    let layout = if metrics_only {
        layout_request(&request, &MetricTableMeasurer::new())?
    } else {
        let glyphs = load_glyphs(config, false)?;
        layout_request(&request, &glyphs)?
    };

    println!("{}", serde_json::to_string_pretty(&layout)?);
    Ok(())
}
