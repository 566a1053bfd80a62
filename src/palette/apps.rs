//! Installed applications.

use serde_json::Value;

use super::PickOutcome;
use crate::core::{Item, PalResult};
use crate::platform::Platform;

pub(super) fn list(platform: &dyn Platform) -> PalResult<Vec<Value>> {
    Ok(platform.list_apps()?.into_iter().map(Item::into_value).collect())
}

pub(super) fn pick(platform: &dyn Platform, name: &str) -> PalResult<PickOutcome> {
    match platform.list_apps()?.into_iter().find(|app| app.name() == name) {
        Some(app) => {
            platform.run_app(&app)?;
            Ok(PickOutcome::Done)
        }
        None => Ok(PickOutcome::NotFound),
    }
}
