use hafalan_core::VERSION;

use crate::app::{resolve_config_path, AppContext};
use crate::ui::{header, hint, kv, print};

/// Bare `hafalan`: where things live and how much is in the store.
pub fn handle_summary(ctx: &AppContext) -> anyhow::Result<()> {
    let ui = ctx.ui_with_format(false, None)?;
    print(&ui, &header(&ui, "summary", Some(&format!("v{}", VERSION))));

    let config_path = resolve_config_path()?;
    let store = ctx.open_store()?;
    print(&ui, &kv(&ui, "Config", &config_path.display().to_string()));
    print(&ui, &kv(&ui, "Store", &store.describe()));
    if !store.exists() {
        print(&ui, &hint(&ui, "No store yet. Run `hafalan init`."));
        return Ok(());
    }

    let session = ctx.open_session()?;
    let roster = &session.roster;
    print(&ui, &kv(&ui, "Students", &roster.len().to_string()));
    print(&ui, &kv(&ui, "Classes", &roster.classes().join(", ")));
    print(&ui, &kv(&ui, "Recitations", &roster.log().len().to_string()));
    print(
        &ui,
        &kv(&ui, "Curriculum", &format!(
            "{} chapters, {} verses",
            roster.curriculum().len(),
            roster.curriculum().total_verses()
        )),
    );
    print(&ui, &hint(&ui, "Run `hafalan --help` for commands."));
    Ok(())
}
