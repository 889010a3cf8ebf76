use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use hafalan_core::curriculum::{Chapter, Curriculum};
use hafalan_core::identity::{ExternalIdAllocator, IdAllocator, SequenceAllocator, UuidAllocator};
use hafalan_core::{OverwritePolicy, StoreBackend};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HafalanConfig {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub ledger: LedgerSection,
    #[serde(default)]
    pub identity: IdentitySection,
    #[serde(default)]
    pub curriculum: CurriculumSection,
    #[serde(default)]
    pub ui: UiSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub backend: StoreBackend,
    pub path: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LedgerSection {
    #[serde(default)]
    pub overwrite: OverwritePolicy,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IdentitySection {
    #[serde(default)]
    pub strategy: IdentityStrategy,
    /// First id handed out by the sequence strategy
    pub first: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CurriculumSection {
    pub path: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UiSection {
    pub timezone: Option<String>,
    pub recorder: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStrategy {
    #[default]
    Sequence,
    External,
    Uuid,
}

impl IdentityStrategy {
    pub fn allocator(self, first: Option<u64>) -> Box<dyn IdAllocator> {
        match self {
            IdentityStrategy::Sequence => Box::new(match first {
                Some(first) => SequenceAllocator { first },
                None => SequenceAllocator::default(),
            }),
            IdentityStrategy::External => Box::new(ExternalIdAllocator),
            IdentityStrategy::Uuid => Box::new(UuidAllocator),
        }
    }
}

impl fmt::Display for IdentityStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IdentityStrategy::Sequence => "sequence",
            IdentityStrategy::External => "external",
            IdentityStrategy::Uuid => "uuid",
        })
    }
}

impl FromStr for IdentityStrategy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sequence" | "seq" => Ok(IdentityStrategy::Sequence),
            "external" | "nis" => Ok(IdentityStrategy::External),
            "uuid" => Ok(IdentityStrategy::Uuid),
            other => Err(anyhow::anyhow!(
                "Unknown identity strategy: {} (use sequence, external or uuid)",
                other
            )),
        }
    }
}

/// Parse an overwrite policy name as written in the config file.
pub fn parse_overwrite(value: &str) -> anyhow::Result<OverwritePolicy> {
    match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "last_write_wins" | "overwrite" => Ok(OverwritePolicy::LastWriteWins),
        "keep_passed" => Ok(OverwritePolicy::KeepPassed),
        other => Err(anyhow::anyhow!(
            "Unknown overwrite policy: {} (use last_write_wins or keep_passed)",
            other
        )),
    }
}

/// Curriculum file layout: a list of `[[chapter]]` tables.
#[derive(Debug, Serialize, Deserialize)]
struct CurriculumFile {
    #[serde(rename = "chapter")]
    chapters: Vec<Chapter>,
}

pub fn read_curriculum(path: &Path) -> anyhow::Result<Curriculum> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read curriculum {}: {}", path.display(), e))?;
    let file: CurriculumFile = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse curriculum {}: {}", path.display(), e))?;
    Ok(Curriculum::new(file.chapters)?)
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_store_path(backend: StoreBackend) -> anyhow::Result<PathBuf> {
    Ok(backend.default_path(&xdg_data_dir()?))
}

pub fn read_config(path: &Path) -> anyhow::Result<HafalanConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &HafalanConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("hafalan"));
        }
    }
    Ok(home_dir()?.join(".config").join("hafalan"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("hafalan"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("hafalan"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: HafalanConfig = toml::from_str("").unwrap();
        assert_eq!(config.store.backend, StoreBackend::Csv);
        assert_eq!(config.ledger.overwrite, OverwritePolicy::LastWriteWins);
        assert_eq!(config.identity.strategy, IdentityStrategy::Sequence);
        assert!(config.curriculum.path.is_none());
    }

    #[test]
    fn test_config_sections_parse() {
        let config: HafalanConfig = toml::from_str(
            r#"
[store]
backend = "sqlite"
path = "/srv/hafalan.sqlite3"

[ledger]
overwrite = "keep_passed"

[identity]
strategy = "external"

[ui]
timezone = "Asia/Jakarta"
recorder = "Ustadz Hasan"
"#,
        )
        .unwrap();
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.ledger.overwrite, OverwritePolicy::KeepPassed);
        assert_eq!(config.identity.strategy, IdentityStrategy::External);
        assert_eq!(config.ui.timezone.as_deref(), Some("Asia/Jakarta"));
    }

    #[test]
    fn test_config_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hafalan").join("config.toml");
        let mut config = HafalanConfig::default();
        config.store.path = Some("/tmp/store".to_string());
        config.identity.strategy = IdentityStrategy::Uuid;
        write_config(&path, &config).unwrap();

        let loaded = read_config(&path).unwrap();
        assert_eq!(loaded.store.path.as_deref(), Some("/tmp/store"));
        assert_eq!(loaded.identity.strategy, IdentityStrategy::Uuid);
    }

    #[test]
    fn test_curriculum_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curriculum.toml");
        std::fs::write(
            &path,
            r#"
[[chapter]]
number = 1
name = "Al-Fatihah"
verses = 7

[[chapter]]
number = 114
name = "An-Nas"
verses = 6
"#,
        )
        .unwrap();
        let curriculum = read_curriculum(&path).unwrap();
        assert_eq!(curriculum.len(), 2);
        assert_eq!(curriculum.total_verses(), 13);
    }

    #[test]
    fn test_curriculum_file_rejects_zero_verses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curriculum.toml");
        std::fs::write(&path, "[[chapter]]\nnumber = 1\nname = \"X\"\nverses = 0\n").unwrap();
        assert!(read_curriculum(&path).is_err());
    }

    #[test]
    fn test_policy_and_strategy_names() {
        assert_eq!(
            parse_overwrite("keep-passed").unwrap(),
            OverwritePolicy::KeepPassed
        );
        assert!(parse_overwrite("sometimes").is_err());
        assert_eq!(
            "NIS".parse::<IdentityStrategy>().unwrap(),
            IdentityStrategy::External
        );
        assert_eq!(IdentityStrategy::Sequence.allocator(None).name(), "sequence");
    }
}
