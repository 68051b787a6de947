use std::fmt::{self, Debug};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::config::RuntimeConfig;
use crate::host::{CodeHost, FileDistributor, Filesystem};
use crate::kernel::component::KernelComponent;
use crate::kernel::error::Result;
use crate::plugin_system::dependency::{DependencyConstraint, DependencyError};
use crate::plugin_system::distribution;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::loader::{Discovery, PluginLoader};
use crate::plugin_system::manifest::{DescriptorDefaults, PluginDescriptor};
use crate::plugin_system::registry::{LoadedPlugin, PluginRegistry};
use crate::stage_manager::{BootContext, BootPipeline, StageResult};

/// Outcome of [`PluginManager::load_all`]
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Identifiers loaded by this call or before it, in load order
    pub loaded: Vec<String>,
    /// Plugins that failed, with the reason
    pub failed: Vec<(String, PluginSystemError)>,
}

impl LoadReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Plugin system component interface
#[async_trait]
pub trait PluginManager: KernelComponent {
    /// Rediscover plugins below the configured root, replacing the available set
    async fn locate_all(&self) -> std::result::Result<Discovery, PluginSystemError>;

    /// Check if a plugin was discovered
    async fn is_available(&self, identifier: &str) -> bool;

    /// Descriptor of a discovered plugin
    async fn find_info(&self, identifier: &str) -> Option<Arc<PluginDescriptor>>;

    /// Check if a plugin is loaded
    async fn is_loaded(&self, identifier: &str) -> bool;

    /// A loaded plugin
    async fn find(&self, identifier: &str) -> Option<Arc<LoadedPlugin>>;

    /// Load a discovered plugin and its dependencies
    async fn load(&self, identifier: &str) -> std::result::Result<Arc<LoadedPlugin>, PluginSystemError>;

    /// Load a descriptor that need not come from discovery
    async fn load_descriptor(
        &self,
        descriptor: Arc<PluginDescriptor>,
    ) -> std::result::Result<Arc<LoadedPlugin>, PluginSystemError>;

    /// Load every available plugin, continuing past failures
    async fn load_all(&self) -> LoadReport;

    /// Loaded plugins in load order
    async fn loaded_plugins(&self) -> Vec<Arc<LoadedPlugin>>;

    /// Available descriptors sorted by identifier
    async fn descriptors(&self) -> Vec<Arc<PluginDescriptor>>;

    /// Plugins declaring a dependency on `identifier`
    async fn dependents_of(&self, identifier: &str) -> Vec<String>;
}

/// State guarded by the manager lock
#[derive(Debug)]
struct ManagerState {
    registry: PluginRegistry,
    context: BootContext,
}

/// Default implementation of plugin manager.
///
/// Every operation takes one lock over the registry and the boot context,
/// so loads run one at a time.
#[derive(Clone)]
pub struct DefaultPluginManager {
    name: &'static str,
    plugin_root: PathBuf,
    defaults: DescriptorDefaults,
    filesystem: Arc<dyn Filesystem>,
    distributor: Arc<dyn FileDistributor>,
    loader: PluginLoader,
    pipeline: Arc<BootPipeline>,
    state: Arc<Mutex<ManagerState>>,
}

impl DefaultPluginManager {
    /// Create a manager for `config`.
    ///
    /// Category stages load from `<plugin>/<stage>/` through `filesystem`;
    /// use [`DefaultPluginManager::with_pipeline`] to plug other loaders.
    pub fn new(
        config: &RuntimeConfig,
        filesystem: Arc<dyn Filesystem>,
        host: Arc<dyn CodeHost>,
        distributor: Arc<dyn FileDistributor>,
    ) -> Self {
        let pipeline = BootPipeline::with_directory_loaders(filesystem.clone());
        Self {
            name: "DefaultPluginManager",
            plugin_root: config.plugin_root.clone(),
            defaults: config.defaults.clone(),
            loader: PluginLoader::new(filesystem.clone(), host.clone()),
            filesystem,
            distributor,
            pipeline: Arc::new(pipeline),
            state: Arc::new(Mutex::new(ManagerState {
                registry: PluginRegistry::new(),
                context: BootContext::new(config.realm, host),
            })),
        }
    }

    /// Replace the boot pipeline
    pub fn with_pipeline(mut self, pipeline: BootPipeline) -> Self {
        self.pipeline = Arc::new(pipeline);
        self
    }

    pub fn plugin_root(&self) -> &Path {
        &self.plugin_root
    }

    /// Run `f` with exclusive access to the boot context, e.g. to publish
    /// objects before plugins boot
    pub async fn with_context<R>(&self, f: impl FnOnce(&mut BootContext) -> R) -> R {
        let mut state = self.state.lock().await;
        f(&mut state.context)
    }
}

impl Debug for DefaultPluginManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultPluginManager")
            .field("name", &self.name)
            .field("plugin_root", &self.plugin_root)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl KernelComponent for DefaultPluginManager {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn initialize(&self) -> Result<()> {
        log::info!("Initializing Plugin Manager...");
        self.locate_all().await?;
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        log::info!("Starting Plugin Manager - loading plugins...");
        let report = self.load_all().await;
        for (identifier, error) in &report.failed {
            log::error!("Plugin {} failed to load: {}", identifier, error);
        }
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let state = self.state.lock().await;
        log::info!("Stopping Plugin Manager ({} plugin(s) loaded)", state.registry.loaded_count());
        Ok(())
    }
}

#[async_trait]
impl PluginManager for DefaultPluginManager {
    async fn locate_all(&self) -> std::result::Result<Discovery, PluginSystemError> {
        let mut state = self.state.lock().await;
        let discovery = self.loader.locate_all(&self.plugin_root, &self.defaults)?;
        state.registry.replace_available(discovery.descriptors.clone());
        Ok(discovery)
    }

    async fn is_available(&self, identifier: &str) -> bool {
        self.state.lock().await.registry.is_available(identifier)
    }

    async fn find_info(&self, identifier: &str) -> Option<Arc<PluginDescriptor>> {
        self.state.lock().await.registry.find_info(identifier)
    }

    async fn is_loaded(&self, identifier: &str) -> bool {
        self.state.lock().await.registry.is_loaded(identifier)
    }

    async fn find(&self, identifier: &str) -> Option<Arc<LoadedPlugin>> {
        self.state.lock().await.registry.find(identifier)
    }

    async fn load(&self, identifier: &str) -> std::result::Result<Arc<LoadedPlugin>, PluginSystemError> {
        let mut state = self.state.lock().await;
        if let Some(loaded) = state.registry.find(identifier) {
            log::debug!(target: "kiln::manager", "{} is already loaded", identifier);
            return Ok(loaded);
        }
        let descriptor = state
            .registry
            .find_info(identifier)
            .ok_or_else(|| PluginSystemError::NotAvailable(identifier.to_string()))?;
        self.session(&mut state).load(descriptor)
    }

    async fn load_descriptor(
        &self,
        descriptor: Arc<PluginDescriptor>,
    ) -> std::result::Result<Arc<LoadedPlugin>, PluginSystemError> {
        let mut state = self.state.lock().await;
        self.session(&mut state).load(descriptor)
    }

    async fn load_all(&self) -> LoadReport {
        let mut state = self.state.lock().await;
        let descriptors = state.registry.descriptors();
        let mut report = LoadReport::default();
        for descriptor in descriptors {
            let identifier = descriptor.identifier.clone();
            if let Err(error) = self.session(&mut state).load(descriptor) {
                log::error!(target: "kiln::manager", "Failed to load {}: {}", identifier, error);
                report.failed.push((identifier, error));
            }
        }
        report.loaded = state
            .registry
            .loaded_plugins()
            .iter()
            .map(|plugin| plugin.identifier().to_string())
            .collect();
        log::info!(
            target: "kiln::manager",
            "{} plugin(s) loaded, {} failed",
            report.loaded.len(),
            report.failed.len()
        );
        report
    }

    async fn loaded_plugins(&self) -> Vec<Arc<LoadedPlugin>> {
        self.state.lock().await.registry.loaded_plugins()
    }

    async fn descriptors(&self) -> Vec<Arc<PluginDescriptor>> {
        self.state.lock().await.registry.descriptors()
    }

    async fn dependents_of(&self, identifier: &str) -> Vec<String> {
        self.state.lock().await.registry.dependents_of(identifier)
    }
}

impl DefaultPluginManager {
    fn session<'a>(&'a self, state: &'a mut ManagerState) -> LoadSession<'a> {
        LoadSession {
            registry: &mut state.registry,
            context: &mut state.context,
            pipeline: &self.pipeline,
            filesystem: self.filesystem.as_ref(),
            distributor: self.distributor.as_ref(),
            in_progress: Vec::new(),
        }
    }
}

/// One top-level load and the recursive loads it triggers
struct LoadSession<'a> {
    registry: &'a mut PluginRegistry,
    context: &'a mut BootContext,
    pipeline: &'a BootPipeline,
    filesystem: &'a dyn Filesystem,
    distributor: &'a dyn FileDistributor,
    /// Plugins whose load has started but not finished, outermost first
    in_progress: Vec<String>,
}

impl LoadSession<'_> {
    fn load(&mut self, descriptor: Arc<PluginDescriptor>) -> std::result::Result<Arc<LoadedPlugin>, PluginSystemError> {
        let identifier = descriptor.identifier.clone();
        if let Some(loaded) = self.registry.find(&identifier) {
            log::debug!(target: "kiln::manager", "{} is already loaded", identifier);
            return Ok(loaded);
        }
        if self.in_progress.contains(&identifier) {
            return Err(DependencyError::CyclicDependency(self.cycle_to(&identifier)).into());
        }

        self.check_hard_dependencies(&descriptor)?;

        let started = Instant::now();
        self.in_progress.push(identifier.clone());
        let result = self.load_unchecked(&descriptor);
        self.in_progress.pop();

        let loaded = result?;
        log::info!(
            target: "kiln::manager",
            "Loaded {} v{} in {:?}",
            identifier,
            descriptor.version,
            started.elapsed()
        );
        Ok(loaded)
    }

    /// Path from the first in-progress occurrence of `identifier` back to it
    fn cycle_to(&self, identifier: &str) -> Vec<String> {
        let start = self.in_progress.iter().position(|id| id == identifier).unwrap_or(0);
        let mut cycle = self.in_progress[start..].to_vec();
        cycle.push(identifier.to_string());
        cycle
    }

    /// Descriptor a dependency would bind to. A loaded instance wins over a
    /// rediscovered one, since `load` returns the loaded instance.
    fn resolve_target(&self, constraint: &DependencyConstraint) -> Option<Arc<PluginDescriptor>> {
        self.registry
            .find(&constraint.target)
            .map(|p| p.descriptor.clone())
            .or_else(|| self.registry.find_info(&constraint.target))
    }

    /// Presence, version and cycle checks over every hard dependency,
    /// before anything is loaded
    fn check_hard_dependencies(&self, descriptor: &PluginDescriptor) -> std::result::Result<(), PluginSystemError> {
        for constraint in &descriptor.dependencies {
            let target = self.resolve_target(constraint).ok_or_else(|| DependencyError::MissingPlugin {
                dependent: descriptor.identifier.clone(),
                target: constraint.target.clone(),
            })?;
            if !constraint.is_satisfied_by(&target.version) {
                return Err(DependencyError::IncompatibleVersion {
                    dependent: descriptor.identifier.clone(),
                    target: constraint.target.clone(),
                    constraint: constraint.requirement(),
                    found: target.version.clone(),
                }
                .into());
            }
            if self.in_progress.contains(&constraint.target) {
                let mut cycle = self.cycle_to(&constraint.target);
                cycle.insert(cycle.len() - 1, descriptor.identifier.clone());
                return Err(DependencyError::CyclicDependency(cycle).into());
            }
        }
        if let Some(cycle) = self.registry.find_hard_cycle(descriptor) {
            return Err(DependencyError::CyclicDependency(cycle).into());
        }
        Ok(())
    }

    fn load_unchecked(&mut self, descriptor: &Arc<PluginDescriptor>) -> std::result::Result<Arc<LoadedPlugin>, PluginSystemError> {
        let identifier = &descriptor.identifier;

        for constraint in &descriptor.dependencies {
            let target = self.resolve_target(constraint).ok_or_else(|| DependencyError::MissingPlugin {
                dependent: identifier.clone(),
                target: constraint.target.clone(),
            })?;
            self.load(target).map_err(|source| DependencyError::Unsatisfied {
                dependent: identifier.clone(),
                target: constraint.target.clone(),
                source: Box::new(source),
            })?;
        }

        for constraint in &descriptor.soft_dependencies {
            self.load_soft(identifier, constraint);
        }

        let loaded = self.registry.register_loaded(LoadedPlugin::new(descriptor.clone()));

        if descriptor.flags.distributes() {
            if let Err(e) = distribution::distribute(descriptor, self.filesystem, self.distributor) {
                log::warn!(target: "kiln::manager", "{}", e);
            }
        }

        match self.pipeline.run(descriptor, self.context) {
            Ok(results) => {
                let ran = results.iter().filter(|(_, r)| *r == StageResult::Success).count();
                log::debug!(
                    target: "kiln::manager",
                    "{} ran {} of {} boot stage(s)",
                    identifier,
                    ran,
                    results.len()
                );
                Ok(loaded)
            }
            Err(error) => {
                self.registry.unregister(identifier);
                Err(error)
            }
        }
    }

    fn load_soft(&mut self, dependent: &str, constraint: &DependencyConstraint) {
        let Some(target) = self.resolve_target(constraint) else {
            log::debug!(
                target: "kiln::manager",
                "Optional dependency {} of {} is not available, skipping",
                constraint.target, dependent
            );
            return;
        };
        if !constraint.is_satisfied_by(&target.version) {
            log::warn!(
                target: "kiln::manager",
                "Optional dependency {} of {} found at v{}, which does not satisfy {}, skipping",
                constraint.target,
                dependent,
                target.version,
                constraint.requirement()
            );
            return;
        }
        if self.in_progress.contains(&constraint.target) {
            log::debug!(
                target: "kiln::manager",
                "Optional dependency {} of {} is already being loaded, skipping",
                constraint.target, dependent
            );
            return;
        }
        if let Err(e) = self.load(target) {
            log::warn!(
                target: "kiln::manager",
                "Optional dependency {} of {} failed to load: {}",
                constraint.target, dependent, e
            );
        }
    }
}
