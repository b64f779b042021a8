//! Check command - validate and dry-resolve a pipeline

use anyhow::{Context, Result};
use vigil_config::Config;
use vigil_pipeline::PipelineBuilder;

use super::registry;

pub fn run(config: &Config) -> Result<()> {
    let registry = registry();
    let plan = PipelineBuilder::new(&registry)
        .with_default_capacity(config.global.channel_capacity)
        .validate(&config.pipeline)
        .context("pipeline check failed")?;

    println!(
        "configuration OK: {} stage(s), {} channel(s)",
        plan.stages.len(),
        plan.channels.len()
    );
    for stage in &plan.stages {
        println!("  stage    {stage}");
    }
    for (name, type_name) in &plan.channels {
        println!("  channel  {name} ({type_name})");
    }
    Ok(())
}
