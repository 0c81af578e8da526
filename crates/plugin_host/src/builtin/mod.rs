//! Built-in plugins

mod basic_auth;
mod version;

use std::sync::Arc;

use httpscan_common::{HttpProbe, Plugin};

pub use basic_auth::{
    BasicAuthDefaultsPlugin, DEFAULT_PASSWORD_KEY, DEFAULT_USERNAME_KEY, PASSWORD_KEY,
    USERNAME_KEY,
};
pub use version::{HeaderVersionPlugin, VERSION_KEY};

/// The fixed plugin table.
pub fn builtin_plugins(probe: Arc<dyn HttpProbe>) -> Vec<Arc<dyn Plugin>> {
    vec![
        Arc::new(HeaderVersionPlugin::slash_version()),
        Arc::new(HeaderVersionPlugin::nginx_version()),
        Arc::new(BasicAuthDefaultsPlugin::new(probe)),
    ]
}
