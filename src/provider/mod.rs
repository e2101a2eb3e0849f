mod traits;
mod registry;
mod scripted;
mod simulated;

pub use traits::*;
pub use registry::ProviderRegistry;
pub use scripted::{tokenize, Script, ScriptedProvider};
pub use simulated::SimulatedProvider;
