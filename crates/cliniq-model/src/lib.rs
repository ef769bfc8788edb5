mod types;
mod provider;
mod mock;

pub use types::*;
pub use provider::{Responder, ResponderFactory, ResponseStream};
pub use mock::{MockResponderFactory, ScriptedResponderFactory};

use std::sync::Arc;

use anyhow::bail;
use cliniq_config::ResponderConfig;

/// Construct a shared [`ResponderFactory`] from configuration.
///
/// Provider selection:
/// - `"mock"` → [`MockResponderFactory`] (echo-back, streamed word by word)
///
/// The backend receives the model parameters from `cfg` and
/// `system_instruction`.  Remote backends are implemented by the embedding
/// application and handed to the core directly; asking for one here is an
/// initialisation failure.
pub fn from_config(
    cfg: &ResponderConfig,
    system_instruction: &str,
) -> anyhow::Result<Arc<dyn ResponderFactory>> {
    let settings = GenerationSettings::from_config(cfg, system_instruction);
    match cfg.provider.as_str() {
        "mock" => Ok(Arc::new(MockResponderFactory::new(settings))),
        other => bail!("unknown responder provider: {other}"),
    }
}
