mod entries;
mod estimate;
mod helpers;
mod presets;
mod settings;
mod summary;

pub(crate) use entries::{cmd_add, cmd_add_estimated, cmd_delete, cmd_entries};
pub(crate) use estimate::cmd_estimate;
pub(crate) use presets::{cmd_preset_add, cmd_preset_delete, cmd_preset_list};
pub(crate) use settings::{cmd_settings_set, cmd_settings_show};
pub(crate) use summary::cmd_summary;
