use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use codeblock_highlight::cli::{CliArgs, InputSource, OutputFormat, RunConfig, RunMode};
use codeblock_highlight::engine::HighlightEngine;
use codeblock_highlight::render::{render_ansi, render_json};
use codeblock_highlight::resources::{self, BuiltinLoader};
use codeblock_highlight::syntax::LANGUAGES;
use codeblock_highlight::theme::{list_available_themes, ThemeSource};

fn main() -> Result<()> {
    let args = CliArgs::parse();
    codeblock_highlight::tracing::init();

    let run = args.into_config().map_err(anyhow::Error::msg)?;
    match &run.mode {
        RunMode::ListThemes => {
            list_themes();
            Ok(())
        }
        RunMode::ListLanguages => {
            list_languages();
            Ok(())
        }
        RunMode::Highlight(input) => highlight(input, &run),
    }
}

fn list_themes() {
    for info in list_available_themes() {
        let source = match info.source {
            ThemeSource::User => "user",
            ThemeSource::Builtin => "builtin",
        };
        println!("{:<16} {:<20} {}", info.id, info.name, source);
    }
}

fn list_languages() {
    for info in LANGUAGES {
        println!(
            "{:<12} {:<12} {}",
            info.id,
            info.display_name,
            info.aliases.join(", ")
        );
    }
}

fn highlight(input: &InputSource, run: &RunConfig) -> Result<()> {
    let config = run.highlight_config().map_err(anyhow::Error::msg)?;
    let doc = Arc::new(input.read_document().context("Failed to read input")?);
    tracing::info!(
        "Highlighting {} code block(s) with theme {}",
        doc.code_region_count(),
        config.default_theme
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("resource-loader")
        .enable_all()
        .build()
        .context("Failed to start loader runtime")?;

    let cache = resources::init(Arc::new(BuiltinLoader));
    let mut engine = HighlightEngine::new(cache, runtime.handle().clone(), &config);
    engine.init(doc);
    if !engine.wait_for_completion(run.timeout) {
        tracing::warn!(
            "Resources still loading after {:?}, rendering with fallbacks",
            run.timeout
        );
    }

    let decorations = engine.current_decorations();
    match run.format {
        OutputFormat::Ansi => print!("{}", render_ansi(engine.document(), &decorations)),
        OutputFormat::Json => println!("{}", render_json(&decorations)?),
    }

    engine.shutdown();
    Ok(())
}
