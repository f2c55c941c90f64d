use crate::{
    backup::BackupPolicy,
    client_extractor::ClientFilter,
    field_map::FieldMapper,
    types::DomainKind,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputNames {
    pub clients:    String,
    pub apartments: String,
    pub loans:      String,
    pub shares:     String,
    pub bonds:      String,
}

impl OutputNames {
    pub fn for_kind(&self, kind: DomainKind) -> &str {
        match kind {
            DomainKind::Client    => &self.clients,
            DomainKind::Apartment => &self.apartments,
            DomainKind::Loan      => &self.loans,
            DomainKind::Share     => &self.shares,
            DomainKind::Bond      => &self.bonds,
        }
    }
}

impl Default for OutputNames {
    fn default() -> Self {
        Self {
            clients:    DomainKind::Client.default_output().into(),
            apartments: DomainKind::Apartment.default_output().into(),
            loans:      DomainKind::Loan.default_output().into(),
            shares:     DomainKind::Share.default_output().into(),
            bonds:      DomainKind::Bond.default_output().into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ContactsConfig {
    /// Canonical client array that gets its blanks filled.
    pub target: PathBuf,
    /// Secondary client array with the same ids.
    pub source: PathBuf,
}

impl Default for ContactsConfig {
    fn default() -> Self {
        Self {
            target: PathBuf::from("split_investment_data_normalized/clients_normalized.json"),
            source: PathBuf::from("clients_extracted_updated.json"),
        }
    }
}

/// Every path is relative to `work_dir` unless absolute. Any field left
/// out of the config file takes its default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    pub work_dir:       PathBuf,
    /// The master investment export read by `extract`.
    pub master_export:  PathBuf,
    /// Split files normalized in place and validated.
    pub split_dir:      PathBuf,
    /// Destination of `normalize-copy`.
    pub normalized_dir: PathBuf,
    pub split_files:    Vec<String>,
    pub outputs:        OutputNames,
    pub client_filter:  ClientFilter,
    pub backup_policy:  BackupPolicy,
    /// Extra source-key → canonical-key entries applied on top of the
    /// built-in table.
    pub mapping_overrides: BTreeMap<String, String>,
    pub contacts:       ContactsConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir:          PathBuf::from("."),
            master_export:     PathBuf::from("tableConvert.com_n0b2g7.json"),
            split_dir:         PathBuf::from("split_investment_data"),
            normalized_dir:    PathBuf::from("split_investment_data_normalized"),
            split_files:       ["clients.json", "apartments.json", "loans.json", "shares.json"]
                .into_iter()
                .map(String::from)
                .collect(),
            outputs:           OutputNames::default(),
            client_filter:     ClientFilter::default(),
            backup_policy:     BackupPolicy::default(),
            mapping_overrides: BTreeMap::new(),
            contacts:          ContactsConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file.
    /// In tests, use PipelineConfig::default_test().
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {e}", path.display()))?;
        log::info!("config: loaded {}", path.display());
        Ok(config)
    }

    /// Defaults rooted at `work_dir`, for tests working in a temp dir.
    pub fn default_test(work_dir: &Path) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            ..Self::default()
        }
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.work_dir.join(path)
        }
    }

    pub fn master_export_path(&self) -> PathBuf {
        self.resolve(&self.master_export)
    }

    pub fn split_dir_path(&self) -> PathBuf {
        self.resolve(&self.split_dir)
    }

    pub fn normalized_dir_path(&self) -> PathBuf {
        self.resolve(&self.normalized_dir)
    }

    pub fn output_path(&self, kind: DomainKind) -> PathBuf {
        self.resolve(Path::new(self.outputs.for_kind(kind)))
    }

    /// The mapper for `kind` with the configured overrides on top.
    pub fn mapper_for(&self, kind: DomainKind) -> FieldMapper {
        FieldMapper::for_kind(kind).with_overrides(&self.mapping_overrides)
    }

    /// The shared mapper with the configured overrides, for whole-file
    /// normalization.
    pub fn standard_mapper(&self) -> FieldMapper {
        FieldMapper::standard().with_overrides(&self.mapping_overrides)
    }
}
