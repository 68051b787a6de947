use std::path::Path;
use std::sync::Arc;

use crate::host::Filesystem;
use crate::plugin_system::manifest::PluginDescriptor;
use crate::stage_manager::{BootContext, BootStage, CategoryLoader};

/// Extensions treated as includable code by [`DirectoryCategoryLoader`]
pub const CODE_EXTENSIONS: &[&str] = &["lua"];

/// Category loader that includes every code file below `<plugin>/<stage>/`.
///
/// `entities` of a plugin at `plugins/crates` are read from
/// `plugins/crates/entities/**`, in sorted path order. A missing category
/// directory loads nothing.
#[derive(Debug, Clone)]
pub struct DirectoryCategoryLoader {
    filesystem: Arc<dyn Filesystem>,
}

impl DirectoryCategoryLoader {
    pub fn new(filesystem: Arc<dyn Filesystem>) -> Self {
        Self { filesystem }
    }
}

impl CategoryLoader for DirectoryCategoryLoader {
    fn load(
        &self,
        stage: BootStage,
        descriptor: &PluginDescriptor,
        context: &mut BootContext,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        let dir = descriptor.root.join(stage.id());
        let is_code = |path: &Path| {
            path.extension()
                .map(|ext| CODE_EXTENSIONS.iter().any(|c| ext.eq_ignore_ascii_case(c)))
                .unwrap_or(false)
        };
        let files = self.filesystem.find_recursive(&dir, &is_code)?;
        log::debug!(
            target: "kiln::stages",
            "Loading {} {} file(s) for {}",
            files.len(), stage, descriptor.identifier
        );
        for file in files {
            context.host().include(&file)?;
        }
        Ok(())
    }
}
