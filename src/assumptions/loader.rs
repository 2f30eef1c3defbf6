//! File-based model configuration loading
//!
//! JSON for the full [`ModelConfig`], CSV (`term,coefficient`) for a refitted
//! PD scorecard.

use super::{ModelConfig, PdModel};
use crate::error::Result;
use log::info;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Load PD model coefficients from CSV
/// Returns HashMap<term_name, coefficient>
pub fn load_pd_coefficients(path: &Path) -> Result<HashMap<String, f64>> {
    let file = File::open(path)?;
    read_pd_coefficients(file)
}

pub fn read_pd_coefficients<R: std::io::Read>(reader: R) -> Result<HashMap<String, f64>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut coefficients = HashMap::new();

    for result in reader.deserialize() {
        let (term, coef): (String, f64) = result?;
        coefficients.insert(term.trim().to_string(), coef);
    }

    Ok(coefficients)
}

/// Load a JSON model configuration; absent fields keep their defaults
pub fn load_model_config(path: &Path) -> Result<ModelConfig> {
    let file = File::open(path)?;
    let config: ModelConfig = serde_json::from_reader(BufReader::new(file))?;
    config.validate()?;
    info!("loaded model configuration from {}", path.display());
    Ok(config)
}

/// Replace the PD scorecard of `config` with coefficients from a CSV file
pub fn with_pd_coefficients(mut config: ModelConfig, path: &Path) -> Result<ModelConfig> {
    let terms = load_pd_coefficients(path)?;
    config.pd_model = PdModel::from_terms(&terms)?;
    config.validate()?;
    info!("loaded {} PD coefficients from {}", terms.len(), path.display());
    Ok(config)
}
