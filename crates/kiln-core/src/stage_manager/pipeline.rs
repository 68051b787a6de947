use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::host::Filesystem;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::manifest::PluginDescriptor;
use crate::stage_manager::error::StageSystemError;
use crate::stage_manager::{BootContext, BootStage, CategoryLoader, DirectoryCategoryLoader, StageResult};

/// Executes a plugin's `load_order`, one stage handler per tag
#[derive(Default)]
pub struct BootPipeline {
    /// Loaders for the game-object category stages
    loaders: HashMap<BootStage, Arc<dyn CategoryLoader>>,
}

impl fmt::Debug for BootPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stages: Vec<&BootStage> = self.loaders.keys().collect();
        stages.sort();
        f.debug_struct("BootPipeline")
            .field("loaders", &stages)
            .finish()
    }
}

impl BootPipeline {
    /// Pipeline without category loaders: category stages pass through
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline loading every category from `<plugin>/<stage>/`
    pub fn with_directory_loaders(filesystem: Arc<dyn Filesystem>) -> Self {
        let loader: Arc<dyn CategoryLoader> = Arc::new(DirectoryCategoryLoader::new(filesystem));
        let mut pipeline = Self::new();
        for stage in BootStage::ALL.iter().filter(|s| s.is_category()) {
            pipeline.loaders.insert(*stage, loader.clone());
        }
        pipeline
    }

    /// Register the loader for a category stage, replacing any previous one.
    /// Loaders registered for `shared`, `server` or `client` are never consulted.
    pub fn with_loader(mut self, stage: BootStage, loader: Arc<dyn CategoryLoader>) -> Self {
        self.register_loader(stage, loader);
        self
    }

    pub fn register_loader(&mut self, stage: BootStage, loader: Arc<dyn CategoryLoader>) {
        self.loaders.insert(stage, loader);
    }

    /// Check if a loader is registered for a stage
    pub fn has_loader(&self, stage: BootStage) -> bool {
        self.loaders.contains_key(&stage)
    }

    /// Run every tag of `descriptor.load_order` in declared order.
    ///
    /// Stops at the first unknown tag (a configuration error) or failing
    /// stage; stages after it do not run.
    pub fn run(
        &self,
        descriptor: &PluginDescriptor,
        context: &mut BootContext,
    ) -> Result<Vec<(BootStage, StageResult)>, PluginSystemError> {
        let mut results = Vec::with_capacity(descriptor.load_order.len());
        for tag in &descriptor.load_order {
            let stage: BootStage = tag.parse().map_err(|source| PluginSystemError::Configuration {
                plugin: descriptor.identifier.clone(),
                source,
            })?;

            log::debug!(target: "kiln::stages", "Executing stage '{}' for {}", stage, descriptor.identifier);
            let result = self
                .execute_stage(stage, descriptor, context)
                .map_err(|source| {
                    log::error!(target: "kiln::stages", "Stage '{}' failed for {}: {}", stage, descriptor.identifier, source);
                    PluginSystemError::Stage {
                        plugin: descriptor.identifier.clone(),
                        source,
                    }
                })?;
            if let StageResult::Skipped(reason) = &result {
                log::debug!(target: "kiln::stages", "Stage '{}' skipped for {}: {}", stage, descriptor.identifier, reason);
            }
            results.push((stage, result));
        }
        Ok(results)
    }

    /// Dispatch a single stage to its handler
    pub fn execute_stage(
        &self,
        stage: BootStage,
        descriptor: &PluginDescriptor,
        context: &mut BootContext,
    ) -> Result<StageResult, StageSystemError> {
        match stage {
            BootStage::Shared => include_entrypoint(stage, descriptor, &descriptor.shared, context),
            BootStage::Server => {
                if !context.is_server() {
                    return Ok(StageResult::Skipped("not running in the server realm".to_string()));
                }
                include_entrypoint(stage, descriptor, &descriptor.server, context)
            }
            BootStage::Client => {
                if !context.is_client() {
                    return Ok(StageResult::Skipped("not running in the client realm".to_string()));
                }
                include_entrypoint(stage, descriptor, &descriptor.client, context)
            }
            category => {
                if !descriptor.flags.loads(category) {
                    return Ok(StageResult::Skipped(format!("auto-load of {} disabled", category)));
                }
                let Some(loader) = self.loaders.get(&category) else {
                    return Ok(StageResult::Skipped(format!("no loader registered for {}", category)));
                };
                loader
                    .load(category, descriptor, context)
                    .map_err(|source| StageSystemError::StageExecutionFailed {
                        stage_id: category.id().to_string(),
                        source,
                    })?;
                Ok(StageResult::Success)
            }
        }
    }
}

fn include_entrypoint(
    stage: BootStage,
    descriptor: &PluginDescriptor,
    entrypoint: &str,
    context: &mut BootContext,
) -> Result<StageResult, StageSystemError> {
    if entrypoint.is_empty() {
        return Ok(StageResult::Skipped(format!("no {} entrypoint declared", stage)));
    }
    let path = descriptor.root.join(entrypoint);
    context
        .host()
        .include(&path)
        .map_err(|e| StageSystemError::StageExecutionFailed {
            stage_id: stage.id().to_string(),
            source: Box::new(e),
        })?;
    Ok(StageResult::Success)
}
