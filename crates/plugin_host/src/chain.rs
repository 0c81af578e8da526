//! Plugin chain - runs an identity's plugins in declared order

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{instrument, trace, warn};

use httpscan_common::{HttpResponse, Identity, Target};

use crate::registry::PluginRegistry;

pub struct PluginChain {
    registry: Arc<PluginRegistry>,
}

impl PluginChain {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self { registry }
    }

    /// Feed `identity` through each of its plugins.
    ///
    /// An unknown plugin, a plugin error or a plugin panic is logged and
    /// skipped; the next plugin sees the identity as it was before the
    /// failed step.
    #[instrument(skip_all, fields(target = %target, identity = %identity.name))]
    pub async fn run(&self, target: &Target, identity: Identity, response: &HttpResponse) -> Identity {
        if identity.plugins.is_empty() {
            return identity;
        }

        let plugins = identity.plugins.clone();
        let mut identity = identity;
        for name in &plugins {
            let Some(plugin) = self.registry.get(name) else {
                warn!(
                    "Unable to load plugin \"{}\" for \"{}\" definition: not registered",
                    name, identity.name
                );
                continue;
            };

            let outcome = AssertUnwindSafe(plugin.run(target, identity.clone(), response))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(next)) => {
                    trace!("plugin {} done", name);
                    identity = next;
                }
                Ok(Err(e)) => warn!(
                    "Plugin \"{}\" failed for \"{}\" definition: {:#}",
                    name, identity.name, e
                ),
                Err(panic) => warn!(
                    "Plugin \"{}\" panicked for \"{}\" definition: {}",
                    name,
                    identity.name,
                    panic_message(&*panic)
                ),
            }
        }
        identity
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}
