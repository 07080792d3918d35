use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use dips_assemble::{DipLogic, ExtendedDipLogic, SingleEntityLogic};
use dips_types::EntityCodec;
use serde::{Deserialize, Serialize};

use crate::error::{ArchiveError, ArchiveResult};

/// Named extraction policies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// The seed with its ancestry, metadata, files and related events.
    #[default]
    Extended,
    /// The seed alone.
    Single,
}

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extended => "extended",
            Self::Single => "single",
        }
    }

    /// Build the policy. `codec` decodes stored blobs for policies that read them.
    pub fn logic(&self, codec: Arc<dyn EntityCodec>) -> Box<dyn DipLogic> {
        match self {
            Self::Extended => Box::new(ExtendedDipLogic::new(codec)),
            Self::Single => Box::new(SingleEntityLogic),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "extended" | "full" => Ok(Self::Extended),
            "single" => Ok(Self::Single),
            _ => Err(ArchiveError::UnknownPolicy(s.to_string())),
        }
    }
}

/// Configuration for a filesystem-backed archive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Directory holding `entities/` and `metadata/`.
    pub root: PathBuf,
    /// Open the metadata store read-only. Ingest then skips link merging.
    pub read_only: bool,
    /// Policy used when none is requested explicitly.
    pub default_policy: PolicyKind,
    /// zstd level for exported packages; `None` exports uncompressed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compress_exports: Option<i32>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".dips"),
            read_only: false,
            default_policy: PolicyKind::Extended,
            compress_exports: None,
        }
    }
}

impl ArchiveConfig {
    /// Config rooted at `root`, other fields defaulted.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn from_toml_str(text: &str) -> ArchiveResult<Self> {
        toml::from_str(text).map_err(|e| ArchiveError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> ArchiveResult<String> {
        toml::to_string_pretty(self).map_err(|e| ArchiveError::Config(e.to_string()))
    }

    /// Load a TOML config file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> ArchiveResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ArchiveError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn entities_dir(&self) -> PathBuf {
        self.root.join("entities")
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.root.join("metadata")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ArchiveConfig::default();
        assert_eq!(c.root, PathBuf::from(".dips"));
        assert!(!c.read_only);
        assert_eq!(c.default_policy, PolicyKind::Extended);
        assert!(c.compress_exports.is_none());
        assert_eq!(c.entities_dir(), PathBuf::from(".dips/entities"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c = ArchiveConfig::from_toml_str("root = \"/srv/archive\"\ndefault_policy = \"single\"\n")
            .unwrap();
        assert_eq!(c.root, PathBuf::from("/srv/archive"));
        assert_eq!(c.default_policy, PolicyKind::Single);
        assert!(!c.read_only);
    }

    #[test]
    fn toml_roundtrip() {
        let c = ArchiveConfig {
            compress_exports: Some(7),
            read_only: true,
            ..ArchiveConfig::at("/tmp/a")
        };
        let back = ArchiveConfig::from_toml_str(&c.to_toml_string().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = ArchiveConfig::from_toml_str("default_policy = \"everything\"").unwrap_err();
        assert!(matches!(err, ArchiveError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dips.toml");
        std::fs::write(&path, "read_only = true\ncompress_exports = 3\n").unwrap();
        let c = ArchiveConfig::load(&path).unwrap();
        assert!(c.read_only);
        assert_eq!(c.compress_exports, Some(3));

        let missing = ArchiveConfig::load(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ArchiveError::Config(_)));
    }

    #[test]
    fn policy_names() {
        assert_eq!("Single".parse::<PolicyKind>().unwrap(), PolicyKind::Single);
        assert_eq!("full".parse::<PolicyKind>().unwrap(), PolicyKind::Extended);
        assert!("other".parse::<PolicyKind>().is_err());
        assert_eq!(PolicyKind::Single.logic(Arc::new(dips_types::JsonCodec)).name(), "single");
    }
}
