//! Application context for the Hafalan CLI.
//!
//! Combines CLI arguments with the lazily-loaded config file and curriculum.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use once_cell::unsync::OnceCell;

use hafalan_core::identity::IdAllocator;
use hafalan_core::roster::LoadReport;
use hafalan_core::store::open_store;
use hafalan_core::{Curriculum, OverwritePolicy, Roster, StoreBackend, StudentStore};

use crate::cli::{Cli, OutputArgs};
use crate::config::{
    default_store_path, parse_overwrite, read_curriculum, HafalanConfig, IdentityStrategy,
};
use crate::errors::CliError;
use crate::ui::format::parse_timezone;
use crate::ui::{OutputFormat, UiContext};

use super::resolver::{load_config, missing_store_message};

/// An opened store and the roster loaded from it.
pub struct Session {
    pub store: Box<dyn StudentStore>,
    pub roster: Roster,
    pub report: LoadReport,
}

impl Session {
    /// Write the roster back to the store it came from.
    pub fn save(&self) -> anyhow::Result<()> {
        self.roster.save(self.store.as_ref())?;
        Ok(())
    }
}

/// CLI arguments plus configuration, loaded on first use.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<Option<HafalanConfig>>,
    curriculum: OnceCell<Curriculum>,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
            curriculum: OnceCell::new(),
        }
    }

    pub fn cli(&self) -> &Cli {
        self.cli
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// The config file, or `None` when there is none yet.
    pub fn config(&self) -> anyhow::Result<Option<&HafalanConfig>> {
        Ok(self.config.get_or_try_init(load_config)?.as_ref())
    }

    /// Backend from `--backend`, then the config file.
    pub fn backend(&self) -> anyhow::Result<StoreBackend> {
        if let Some(value) = self.cli.backend.as_deref() {
            return Ok(value.parse()?);
        }
        Ok(self.config()?.map(|c| c.store.backend).unwrap_or_default())
    }

    /// Store location from `--store`, then the config file, then the XDG
    /// data directory.
    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = self.cli.store.as_deref() {
            return Ok(PathBuf::from(path));
        }
        if let Some(path) = self.config()?.and_then(|c| c.store.path.as_deref()) {
            return Ok(PathBuf::from(path));
        }
        default_store_path(self.backend()?)
    }

    pub fn open_store(&self) -> anyhow::Result<Box<dyn StudentStore>> {
        let backend = self.backend()?;
        let path = self.store_path()?;
        Ok(open_store(backend, &path)?)
    }

    pub fn curriculum(&self) -> anyhow::Result<&Curriculum> {
        self.curriculum.get_or_try_init(|| {
            match self.config()?.and_then(|c| c.curriculum.path.as_deref()) {
                Some(path) => read_curriculum(Path::new(path)),
                None => Ok(Curriculum::juz_amma()),
            }
        })
    }

    /// Overwrite policy, with an optional per-command override.
    pub fn overwrite_policy(&self, flag: Option<&str>) -> anyhow::Result<OverwritePolicy> {
        if let Some(value) = flag {
            return parse_overwrite(value);
        }
        Ok(self.config()?.map(|c| c.ledger.overwrite).unwrap_or_default())
    }

    pub fn allocator(&self) -> anyhow::Result<Box<dyn IdAllocator>> {
        Ok(match self.config()? {
            Some(config) => config.identity.strategy.allocator(config.identity.first),
            None => IdentityStrategy::default().allocator(None),
        })
    }

    pub fn timezone(&self) -> anyhow::Result<Option<Tz>> {
        self.config()?
            .and_then(|c| c.ui.timezone.as_deref())
            .map(parse_timezone)
            .transpose()
    }

    pub fn default_recorder(&self) -> anyhow::Result<Option<String>> {
        Ok(self.config()?.and_then(|c| c.ui.recorder.clone()))
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// UI context for a command's output flags. CSV is only accepted by
    /// commands that call [`AppContext::ui_with_format`] directly.
    pub fn ui(&self, output: &OutputArgs) -> anyhow::Result<UiContext> {
        let format = parse_format(output.format.as_deref())?;
        if format == Some(OutputFormat::Csv) {
            return Err(
                CliError::invalid_input("--format csv is only available for `hafalan report`")
                    .into(),
            );
        }
        self.ui_with_format(output.json, format)
    }

    pub fn ui_with_format(
        &self,
        json: bool,
        format: Option<OutputFormat>,
    ) -> anyhow::Result<UiContext> {
        Ok(
            UiContext::from_env(json, format, self.cli.no_color, self.cli.ascii)
                .with_timezone(self.timezone()?),
        )
    }

    /// Open the store and load the roster. The store must already exist.
    pub fn open_session(&self) -> anyhow::Result<Session> {
        let store = self.open_store()?;
        if !store.exists() {
            return Err(CliError::not_found(
                missing_store_message(&store.describe()),
                "Run `hafalan init` first, or pass --store.",
            )
            .into());
        }
        let (roster, report) = Roster::load(store.as_ref(), self.curriculum()?.clone())?;
        if !report.is_clean() {
            tracing::warn!(
                recovered = report.recovered.len(),
                stale_totals = report.stale_totals.len(),
                duplicate_rows = report.duplicate_rows.len(),
                dropped_log_rows = report.dropped_log_rows,
                "store needed recovery; run `hafalan check --repair` to persist it"
            );
        }
        Ok(Session {
            store,
            roster,
            report,
        })
    }
}

pub fn parse_format(value: Option<&str>) -> anyhow::Result<Option<OutputFormat>> {
    value.map(str::parse).transpose()
}
