//! Command implementations for the vigil CLI

pub mod check;
pub mod run;

use vigil_pipeline::ComponentRegistry;

/// Registry with every built-in stage
pub fn registry() -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    vigil_sources::register(&mut registry);
    vigil_exporter::register(&mut registry);
    registry
}
