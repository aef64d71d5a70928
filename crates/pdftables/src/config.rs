use std::path::Path;

use crate::prelude::*;
use log::debug;
use pdftables_core::ExtractorConfig;

/// Build the extraction settings for this invocation.
///
/// Defaults, then the `--config` file, then command line flags (or their
/// environment variables). The merged result is validated once at the end.
pub fn load(global: &crate::Global) -> Result<ExtractorConfig> {
    let mut config = match &global.config {
        Some(path) => read_file(path)?,
        None => ExtractorConfig::default(),
    };

    apply_overrides(&mut config, global);
    config.validate().map_err(|e| eyre!(e))?;

    debug!("Extractor configuration: {config:?}");
    Ok(config)
}

fn read_file(path: &Path) -> Result<ExtractorConfig> {
    let source = std::fs::read_to_string(path)
        .with_context(|| f!("Failed to read config file {}", path.display()))?;
    ExtractorConfig::from_toml(&source)
        .with_context(|| f!("Invalid config file {}", path.display()))
}

fn apply_overrides(config: &mut ExtractorConfig, global: &crate::Global) {
    if let Some(tolerance) = global.line_tolerance {
        config.line_tolerance = tolerance;
    }
    if let Some(tolerance) = global.column_tolerance {
        config.column_tolerance = tolerance;
    }
    if let Some(rows) = global.min_rows {
        config.min_aligned_rows = rows;
    }
}
