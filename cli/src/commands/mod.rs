mod helpers;
mod log;
mod meal;
mod profile;
mod search;
mod summary;
mod weight;

pub(crate) use log::{AddArgs, cmd_add, cmd_barcode, cmd_log};
pub(crate) use meal::{cmd_delete, cmd_update};
pub(crate) use profile::{OnboardArgs, cmd_onboard, cmd_profile_show};
pub(crate) use search::cmd_search;
pub(crate) use summary::{cmd_day, cmd_history};
pub(crate) use weight::{cmd_weight_history, cmd_weight_set, cmd_weight_show};
