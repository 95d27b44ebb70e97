//! The `quiz settings` command.

use anyhow::Result;
use quiz_core::model::AppSettingsDraft;
use services::AppServices;

pub async fn execute(
    services: &AppServices,
    theme: Option<String>,
    sidebar_collapsed: Option<bool>,
    autosave_interval: Option<u32>,
) -> Result<()> {
    let app_settings = services.app_settings();
    let mut settings = app_settings.load().await?;

    if theme.is_some() || sidebar_collapsed.is_some() || autosave_interval.is_some() {
        let draft = AppSettingsDraft {
            theme: Some(theme.unwrap_or_else(|| settings.theme().as_str().to_string())),
            sidebar_collapsed: Some(sidebar_collapsed.unwrap_or(settings.sidebar_collapsed())),
            autosave_interval_secs: Some(
                autosave_interval.unwrap_or(settings.autosave_interval_secs()),
            ),
        };
        settings = app_settings.save(draft).await?;
    }

    println!("theme:              {}", settings.theme().as_str());
    println!("sidebar collapsed:  {}", settings.sidebar_collapsed());
    println!("autosave interval:  {}s", settings.autosave_interval_secs());
    Ok(())
}
