//! Command handlers, one module per resource group.

pub mod config_cmd;
pub mod license;
pub mod quota;
pub mod serve;
pub mod util;
