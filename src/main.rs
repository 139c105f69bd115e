// ABOUTME: Main entry point for the deck-slides program.
// ABOUTME: Provides CLI interface and executes commands from the library.

use anyhow::Context;
use clap::Parser;
use deck::{DeckConfig, SlideSelector};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a PPTX file whose masters, layouts and theme style the deck
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Path to output PPTX file (default: presentation-YYMMDD-HHMMSS.pptx)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to the markdown slide content file
    #[arg(short, long)]
    markdown: Option<PathBuf>,

    /// Slide that gets the title layout: first, last, none or a slide number
    #[arg(long)]
    title_slide: Option<SlideSelector>,

    /// Slide that gets the closing layout: first, last, none or a slide number
    #[arg(long)]
    closing_slide: Option<SlideSelector>,

    /// Print the extracted slides and exit without writing a presentation
    #[arg(long)]
    list: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = DeckConfig::from_env();

    if let Err(e) = run(&cli, &config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, config: &DeckConfig) -> anyhow::Result<()> {
    let markdown_path = cli.markdown.as_ref().unwrap_or(&config.markdown_path);
    if !markdown_path.is_file() {
        anyhow::bail!("Markdown file not found: {}", markdown_path.display());
    }

    println!("Parsing slide content from: {}", markdown_path.display());
    let records = deck::parse_markdown_file(markdown_path)
        .with_context(|| format!("Failed to parse {}", markdown_path.display()))?;
    println!("Found {} slides", records.len());
    for record in &records {
        println!("  Slide {}: {}", record.number, record.title);
    }

    if cli.list {
        return Ok(());
    }

    let template_path = cli.template.as_ref().or(config.template_path.as_ref());
    match template_path {
        Some(path) if path.exists() => println!("Using template: {}", path.display()),
        Some(path) => println!(
            "Template not found: {}. Using default styling.",
            path.display()
        ),
        None => {}
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| deck::utils::timestamped_output_path(chrono::Local::now()));

    let render_config = config.get_render_config(cli.title_slide, cli.closing_slide);
    let pptx_config =
        config.get_pptx_config(records.first().map(|r| deck::inline::plain_text(&r.title)));
    let report = deck::generate_pptx(
        &records,
        template_path.map(PathBuf::as_path),
        &output,
        &render_config,
        &pptx_config,
    )?;

    println!("Presentation saved to: {}", report.output.display());
    Ok(())
}
