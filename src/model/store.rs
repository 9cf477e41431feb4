//! On-disk model artifacts, one per domain tag
//!
//! Layout under the store root:
//! - `<domain>_model.mpk`   network weights (burn named MessagePack)
//! - `<domain>_config.json` winning hyperparameters and validation score

use burn::tensor::backend::Backend;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::mlp::{OutcomeNet, OutcomeNetConfig};
use crate::training::grid::HyperparameterConfig;
use crate::{PredictorError, Result};

/// Audit record stored next to the weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub domain: String,
    pub config: HyperparameterConfig,
    pub validation_accuracy: f32,
    pub trained_at: DateTime<Utc>,
}

/// Directory of persisted models
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        ModelStore {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Weights path without the `.mpk` extension the recorder appends
    fn model_stem(&self, domain: &str) -> PathBuf {
        self.root.join(format!("{}_model", domain))
    }

    fn manifest_path(&self, domain: &str) -> PathBuf {
        self.root.join(format!("{}_config.json", domain))
    }

    /// True when both files for the domain exist
    pub fn exists(&self, domain: &str) -> bool {
        validate_domain(domain).is_ok()
            && self.model_stem(domain).with_extension("mpk").exists()
            && self.manifest_path(domain).exists()
    }

    /// Persist a trained model, replacing any previous artifact for the domain
    pub fn save<B: Backend>(&self, model: &OutcomeNet<B>, manifest: &ArtifactManifest) -> Result<()> {
        validate_domain(&manifest.domain)?;
        std::fs::create_dir_all(&self.root)?;

        let json = serde_json::to_string_pretty(manifest)
            .map_err(|e| PredictorError::Model(format!("Failed to serialize manifest: {}", e)))?;

        // Stage both files, then rename over the live pair
        let stem = self.model_stem(&manifest.domain);
        let staged_stem = self.root.join(format!("{}_model-staging", manifest.domain));
        let staged_weights = staged_stem.with_extension("mpk");
        let staged_manifest = self.root.join(format!("{}_config.json.staging", manifest.domain));

        model.save(&staged_stem.to_string_lossy())?;
        if let Err(e) = std::fs::write(&staged_manifest, json) {
            let _ = std::fs::remove_file(&staged_weights);
            return Err(e.into());
        }
        std::fs::rename(&staged_weights, stem.with_extension("mpk"))?;
        std::fs::rename(&staged_manifest, self.manifest_path(&manifest.domain))?;

        log::info!(
            "Saved '{}' model to {}.mpk ({})",
            manifest.domain,
            stem.display(),
            manifest.config
        );
        Ok(())
    }

    /// Read only the manifest of a persisted model
    pub fn manifest(&self, domain: &str) -> Result<ArtifactManifest> {
        validate_domain(domain)?;
        let path = self.manifest_path(domain);
        if !path.exists() {
            return Err(PredictorError::NotFound(domain.to_string()));
        }
        let json = std::fs::read_to_string(&path)?;
        serde_json::from_str(&json)
            .map_err(|e| PredictorError::Model(format!("Corrupt manifest {}: {}", path.display(), e)))
    }

    /// Load weights and manifest for a domain
    pub fn load<B: Backend>(
        &self,
        device: &B::Device,
        domain: &str,
    ) -> Result<(OutcomeNet<B>, ArtifactManifest)> {
        if !self.exists(domain) {
            validate_domain(domain)?;
            return Err(PredictorError::NotFound(domain.to_string()));
        }

        let manifest = self.manifest(domain)?;
        let net_config = OutcomeNetConfig::from_hyperparams(&manifest.config);
        let model = OutcomeNet::load(
            device,
            &self.model_stem(domain).to_string_lossy(),
            &net_config,
        )?;

        log::info!("Loaded '{}' model ({})", domain, manifest.config);
        Ok((model, manifest))
    }
}

/// Domain tags become file names: non-empty, `[A-Za-z0-9_-]` only
pub fn validate_domain(domain: &str) -> Result<()> {
    let valid = !domain.is_empty()
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(PredictorError::Config(format!(
            "invalid domain tag '{}': use letters, digits, '_' or '-'",
            domain
        )))
    }
}
