use std::num::NonZeroUsize;
use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::Table;

use ehr_cli::config::PipelineConfig;
use ehr_cli::types::{LookupResult, MapResult};
use ehr_vocab::{CodingStandard, DomainVocabulary, load_vocabulary, resolve_vocab_dir};

use crate::cli::{LookupArgs, MapArgs};
use crate::summary::apply_table_style;

pub fn run_standards() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Standard", "Description", "Hierarchy"]);
    apply_table_style(&mut table);
    for standard in CodingStandard::ALL {
        table.add_row(vec![
            standard.name().to_string(),
            standard.description().to_string(),
            standard.hierarchy().describe(),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_lookup(args: &LookupArgs) -> Result<LookupResult> {
    let standard: CodingStandard = args
        .standard
        .parse()
        .with_context(|| format!("parse standard {:?}", args.standard))?;
    let vocab_dir = resolve_vocab_dir(args.vocab_dir.as_deref(), Path::new("."));
    let map = load_vocabulary(&vocab_dir, standard)
        .with_context(|| format!("load {standard} from {}", vocab_dir.display()))?;

    let mut vocabulary = DomainVocabulary::new(map);
    if let Some(level) = args.level {
        let depth = NonZeroUsize::new(level).context("--level must be at least 1")?;
        vocabulary = vocabulary.with_depth(depth)?;
    }

    let resolved_code = match vocabulary.depth() {
        Some(depth) => vocabulary.map().truncate(&args.code, depth),
        None => standard.canonical_code(&args.code).into_owned(),
    };
    let term = vocabulary.lookup(&args.code).ok().map(str::to_string);
    let lineage = vocabulary
        .map()
        .lineage(&resolved_code)
        .into_iter()
        .map(str::to_string)
        .collect();
    Ok(LookupResult {
        standard,
        code: args.code.clone(),
        resolved_code,
        term,
        lineage,
    })
}

pub fn run_map(args: &MapArgs) -> Result<MapResult> {
    let config = PipelineConfig::load(args.config.as_deref(), args.config_layer())?;
    ehr_cli::run::run_map(&config, !args.no_progress)
}
