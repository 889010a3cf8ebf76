use std::path::{Path, PathBuf};

use hafalan_core::store::open_store;
use hafalan_core::{Curriculum, Roster, StoreBackend};

use crate::app::{resolve_config_path, AppContext};
use crate::cli::InitArgs;
use crate::config::{
    default_store_path, parse_overwrite, read_curriculum, write_config, HafalanConfig,
};
use crate::errors::CliError;
use crate::ui::format::parse_timezone;
use crate::ui::{print, receipt};

pub fn handle_init(ctx: &AppContext, args: &InitArgs) -> anyhow::Result<()> {
    let config_path = resolve_config_path()?;
    if config_path.exists() && !args.force {
        return Err(CliError::invalid_input(format!(
            "Config already exists at {}",
            config_path.display()
        ))
        .with_hint("Pass --force to replace it.")
        .into());
    }

    let backend: StoreBackend = match args
        .with_backend
        .as_deref()
        .or(ctx.cli().backend.as_deref())
    {
        Some(value) => value.parse()?,
        None => StoreBackend::default(),
    };
    let store_path = match args.path.as_deref().or(ctx.cli().store.as_deref()) {
        Some(path) => PathBuf::from(path),
        None => default_store_path(backend)?,
    };

    let mut config = HafalanConfig::default();
    config.store.backend = backend;
    config.store.path = Some(store_path.to_string_lossy().to_string());
    if let Some(value) = args.overwrite.as_deref() {
        config.ledger.overwrite = parse_overwrite(value)?;
    }
    if let Some(value) = args.identity.as_deref() {
        config.identity.strategy = value.parse()?;
    }
    if let Some(value) = args.timezone.as_deref() {
        parse_timezone(value)?;
        config.ui.timezone = Some(value.trim().to_string());
    }
    config.ui.recorder = args.recorder.clone();

    let curriculum = match args.curriculum.as_deref() {
        Some(path) => {
            let curriculum = read_curriculum(Path::new(path))?;
            config.curriculum.path = Some(path.to_string());
            curriculum
        }
        None => Curriculum::juz_amma(),
    };

    let store = open_store(backend, &store_path)?;
    let created = !store.exists();
    if created {
        Roster::new(curriculum.clone()).save(store.as_ref())?;
    }
    write_config(&config_path, &config)?;
    tracing::info!(
        config = %config_path.display(),
        store = %store.describe(),
        created,
        "initialized"
    );

    if !ctx.quiet() {
        let ui = ctx.ui_with_format(false, None)?;
        let title = if created {
            "Store created"
        } else {
            "Config written; existing store kept"
        };
        print(
            &ui,
            &receipt(
                &ui,
                title,
                &[
                    ("Config", config_path.display().to_string()),
                    ("Store", store.describe()),
                    ("Chapters", curriculum.len().to_string()),
                    ("Verses", curriculum.total_verses().to_string()),
                    ("Identity", config.identity.strategy.to_string()),
                ],
            ),
        );
    }
    Ok(())
}
