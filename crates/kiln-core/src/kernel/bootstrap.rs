use std::sync::Arc;

use crate::config::RuntimeConfig;
use crate::host::{CodeHost, DeliveryList, FileDistributor, Filesystem, LocalCodeHost, LocalFilesystem};
use crate::kernel::component::KernelComponent;
use crate::kernel::constants;
use crate::kernel::error::{Error, KernelLifecyclePhase, Result};
use crate::plugin_system::manager::{DefaultPluginManager, LoadReport, PluginManager};

/// Main application struct driving the kernel components
pub struct Application {
    config: RuntimeConfig,
    initialized: bool,
    plugin_manager: Arc<DefaultPluginManager>,
    /// Components in initialization order
    components: Vec<Arc<dyn KernelComponent>>,
}

impl Application {
    /// Creates an application backed by the local filesystem
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_hosts(
            config,
            Arc::new(LocalFilesystem),
            Arc::new(LocalCodeHost::new()),
            Arc::new(DeliveryList::new()),
        )
    }

    /// Creates an application with custom host collaborators
    pub fn with_hosts(
        config: RuntimeConfig,
        filesystem: Arc<dyn Filesystem>,
        host: Arc<dyn CodeHost>,
        distributor: Arc<dyn FileDistributor>,
    ) -> Self {
        log::info!("Initializing {} v{}", constants::APP_NAME, constants::APP_VERSION);
        log::info!("Using plugin root: {}", config.plugin_root.display());

        let plugin_manager = Arc::new(DefaultPluginManager::new(&config, filesystem, host, distributor));
        let components: Vec<Arc<dyn KernelComponent>> = vec![plugin_manager.clone()];

        Application {
            config,
            initialized: false,
            plugin_manager,
            components,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Get the plugin manager instance
    pub fn plugin_manager(&self) -> Arc<DefaultPluginManager> {
        self.plugin_manager.clone()
    }

    /// Returns whether the application has been initialized.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Initialize and start every component, then shut down again.
    pub async fn run(&mut self) -> Result<()> {
        self.ensure_not_initialized()?;
        self.initialize().await?;
        self.start().await?;
        log::info!("Application initialized and started successfully.");
        self.shutdown().await
    }

    /// Discover plugins and load all of them, returning what happened to each
    pub async fn boot(&mut self) -> Result<LoadReport> {
        self.ensure_not_initialized()?;
        self.initialize().await?;
        Ok(self.plugin_manager.load_all().await)
    }

    fn ensure_not_initialized(&self) -> Result<()> {
        if self.initialized {
            return Err(Error::KernelLifecycleError {
                phase: KernelLifecyclePhase::RunPreCheck,
                component_name: None,
                message: "Application already initialized".to_string(),
                source: None,
            });
        }
        Ok(())
    }

    /// Initialize all components in order.
    pub async fn initialize(&mut self) -> Result<()> {
        log::info!("Initializing components...");
        for component in &self.components {
            log::info!("Initializing component: {}", component.name());
            component
                .initialize()
                .await
                .map_err(|e| Error::lifecycle(KernelLifecyclePhase::Initialize, component.name(), e))?;
        }
        self.initialized = true;
        log::info!("Component initialization complete.");
        Ok(())
    }

    /// Start all initialized components in order.
    pub async fn start(&mut self) -> Result<()> {
        log::info!("Starting components...");
        for component in &self.components {
            log::info!("Starting component: {}", component.name());
            component
                .start()
                .await
                .map_err(|e| Error::lifecycle(KernelLifecyclePhase::Start, component.name(), e))?;
        }
        log::info!("Component start complete.");
        Ok(())
    }

    /// Stop all components in reverse order of initialization.
    pub async fn shutdown(&mut self) -> Result<()> {
        log::info!("Shutting down components...");
        for component in self.components.iter().rev() {
            log::info!("Stopping component: {}", component.name());
            if let Err(e) = component.stop().await {
                log::error!("Error stopping component {}: {}", component.name(), e);
                return Err(Error::lifecycle(KernelLifecyclePhase::Shutdown, component.name(), e));
            }
        }
        self.initialized = false;
        log::info!("Component shutdown complete.");
        Ok(())
    }
}
