use std::fs;
use std::sync::Arc;

use tempfile::tempdir;

use crate::config::RuntimeConfig;
use crate::host::{DeliveryList, LocalCodeHost, LocalFilesystem};
use crate::kernel::bootstrap::Application;
use crate::kernel::error::{Error, KernelLifecyclePhase};
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::manager::PluginManager;

fn write_plugin(root: &std::path::Path, plugin: &str, deps: &[&str]) {
    let dir = root.join(plugin);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("sh_init.lua"), "-- init").unwrap();
    let metadata = serde_json::json!({
        "GroupID": "grp",
        "PluginID": plugin,
        "Version": "1.0.0",
        "Name": plugin,
        "Shared": "sh_init.lua",
        "LoadOrder": ["shared"],
        "Dependencies": deps,
    });
    fs::write(root.join(format!("{}.json", plugin)), metadata.to_string()).unwrap();
}

#[tokio::test]
async fn test_application_boot_loads_plugins() {
    let dir = tempdir().unwrap();
    write_plugin(dir.path(), "b", &["grp/a"]);
    write_plugin(dir.path(), "a", &[]);
    let host = Arc::new(LocalCodeHost::new());
    let mut app = Application::with_hosts(
        RuntimeConfig::default().with_plugin_root(dir.path()),
        Arc::new(LocalFilesystem),
        host.clone(),
        Arc::new(DeliveryList::new()),
    );

    let report = app.boot().await.unwrap();
    assert!(report.is_success());
    assert_eq!(report.loaded, vec!["grp/a", "grp/b"]);
    assert!(app.is_initialized());
    assert_eq!(
        host.included(),
        vec![dir.path().join("a").join("sh_init.lua"), dir.path().join("b").join("sh_init.lua")]
    );
}

#[tokio::test]
async fn test_application_run_lifecycle() {
    let dir = tempdir().unwrap();
    write_plugin(dir.path(), "a", &[]);
    let mut app = Application::new(RuntimeConfig::default().with_plugin_root(dir.path()));
    assert!(!app.is_initialized());

    app.run().await.unwrap();
    assert!(!app.is_initialized(), "run shuts down again");
    assert!(app.plugin_manager().is_loaded("grp/a").await);
}

#[tokio::test]
async fn test_boot_twice_fails() {
    let dir = tempdir().unwrap();
    let mut app = Application::new(RuntimeConfig::default().with_plugin_root(dir.path()));
    app.boot().await.unwrap();
    assert!(matches!(
        app.boot().await,
        Err(Error::KernelLifecycleError { phase: KernelLifecyclePhase::RunPreCheck, .. })
    ));
}

#[tokio::test]
async fn test_discovery_failure_surfaces_as_initialize_error() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("orphan")).unwrap();
    let mut app = Application::new(RuntimeConfig::default().with_plugin_root(dir.path()));

    match app.boot().await {
        Err(Error::KernelLifecycleError { phase, source: Some(source), .. }) => {
            assert_eq!(phase, KernelLifecyclePhase::Initialize);
            assert!(matches!(*source, Error::PluginSystem(PluginSystemError::Discovery { .. })));
        }
        other => panic!("expected an initialize error, got {:?}", other.map(|r| r.loaded)),
    }
    assert!(!app.is_initialized());
}
