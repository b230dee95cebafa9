//! Handlers for `pdp config *` subcommands.

use crate::config::settings::{SettingInfo, SettingKey};
use crate::error::Error;
use crate::fs::FileSystem;
use crate::output::Output;
use crate::project::Project;

pub fn set_setting<F: FileSystem + Clone>(
    project: &Project<F>,
    key: &str,
    value: &str,
    output: &Output,
) -> Result<(), Error> {
    project.ensure_exists()?;
    let key = key.parse::<SettingKey>()?;
    let stored = project.config_manager().set_setting(key, value)?;
    output.success(format!("Set {key} = {stored}"));
    Ok(())
}

pub fn get_setting<F: FileSystem + Clone>(
    project: &Project<F>,
    key: &str,
    json: bool,
    output: &Output,
) -> Result<(), Error> {
    let key = key.parse::<SettingKey>()?;
    let value = project.config_manager().get_setting(key)?;
    if json {
        let info = SettingInfo::new(key, &value);
        output.data(serde_json::to_string_pretty(&info)?);
    } else {
        output.data(value);
    }
    Ok(())
}

pub fn print_settings_list(
    settings: Vec<SettingInfo>,
    json: bool,
    output: &Output,
) -> Result<(), Error> {
    if json {
        output.data(serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }
    output.info("Available configuration settings:");
    output.data("");
    for setting in settings {
        output.data(format!("  {} = {}", setting.key, setting.value));
        output.data(format!(
            "    Type: {}  Default: {}",
            setting.type_name, setting.default
        ));
        output.data(format!("    {}", setting.description));
        output.data("");
    }
    Ok(())
}
