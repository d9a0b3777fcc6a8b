// src/cli/extract.rs — Locate and extract a manual from the command line

use crate::catalog::Catalog;
use crate::extract::Pipeline;
use crate::infra::config::Config;

pub fn run_locate(config: &Config, query: &str) -> anyhow::Result<()> {
    let catalog = Catalog::load(
        &config.catalog.products_db_path(),
        config.catalog.manuals_root_path(),
    )?;

    match catalog.locate_manual(query)? {
        Some((record, path)) => {
            println!("{} ({})", record.name, record.model_number);
            println!("{}", path.display());
        }
        None => println!("No manual found for '{query}'."),
    }
    Ok(())
}

pub async fn run_extract(
    config: &Config,
    query: &str,
    max_seconds: Option<u64>,
    max_chars: Option<usize>,
) -> anyhow::Result<()> {
    let catalog = Catalog::load(
        &config.catalog.products_db_path(),
        config.catalog.manuals_root_path(),
    )?;

    let Some((record, path)) = catalog.locate_manual(query)? else {
        println!("No manual found for '{query}'.");
        return Ok(());
    };

    let mut extraction_cfg = config.extraction.clone();
    if let Some(secs) = max_seconds {
        extraction_cfg.max_seconds = secs;
    }
    if let Some(chars) = max_chars {
        extraction_cfg.max_chars = chars;
    }

    let pipeline = Pipeline::new(extraction_cfg);
    let document = pipeline.extract_path_timed(&path).await?;

    eprintln!(
        "{} ({}): {}/{} pages, {} chars{}",
        record.name,
        record.model_number,
        document.pages_processed(),
        document.total_pages,
        document.char_count(),
        if document.is_truncated() {
            ", truncated"
        } else {
            ""
        },
    );
    println!("{}", document.render());
    Ok(())
}
