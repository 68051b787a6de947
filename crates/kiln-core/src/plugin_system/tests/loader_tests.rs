#![cfg(test)]

use std::fs;
use std::sync::Arc;

use serde_json::json;
use tempfile::tempdir;

use super::common::{metadata, write_plugin, RecordingHost};
use crate::host::LocalFilesystem;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::loader::PluginLoader;
use crate::plugin_system::manifest::DescriptorDefaults;

fn loader() -> PluginLoader {
    PluginLoader::new(Arc::new(LocalFilesystem), Arc::new(RecordingHost::new()))
}

#[test]
fn test_locate_all_in_sorted_order() {
    let dir = tempdir().unwrap();
    write_plugin(dir.path(), "zeta", metadata("z", "1.0"));
    write_plugin(dir.path(), "alpha", metadata("a", "2.0"));
    fs::write(dir.path().join("README.txt"), "not a plugin").unwrap();

    let discovery = loader().locate_all(dir.path(), &DescriptorDefaults::default()).unwrap();
    let ids: Vec<_> = discovery.descriptors.iter().map(|d| d.identifier.clone()).collect();
    assert_eq!(ids, vec!["grp/a", "grp/z"]);
    assert_eq!(discovery.descriptors[0].folder, "alpha");
    assert_eq!(discovery.descriptors[0].root, dir.path().join("alpha"));
    assert!(discovery.skipped.is_empty());
}

#[test]
fn test_missing_metadata_aborts_discovery() {
    let dir = tempdir().unwrap();
    write_plugin(dir.path(), "alpha", metadata("a", "1.0"));
    fs::create_dir(dir.path().join("orphan")).unwrap();

    match loader().locate_all(dir.path(), &DescriptorDefaults::default()) {
        Err(PluginSystemError::Discovery { path, message, .. }) => {
            assert_eq!(path, dir.path().join("orphan"));
            assert!(message.contains("orphan"));
        }
        other => panic!("expected a discovery error, got {:?}", other),
    }
}

#[test]
fn test_missing_root_is_discovery_error() {
    let dir = tempdir().unwrap();
    let result = loader().locate_all(&dir.path().join("nope"), &DescriptorDefaults::default());
    assert!(matches!(result, Err(PluginSystemError::Discovery { source: Some(_), .. })));
}

#[test]
fn test_invalid_and_duplicate_plugins_are_skipped() {
    let dir = tempdir().unwrap();
    write_plugin(dir.path(), "a1", metadata("a", "1.0"));
    write_plugin(dir.path(), "a2", metadata("a", "1.1"));
    write_plugin(dir.path(), "broken", json!({"GroupID": "grp", "PluginID": "broken", "Version": "1.0"}));
    write_plugin(dir.path(), "good", metadata("good", "1.0"));
    fs::write(dir.path().join("garbled.json"), "{ not json").unwrap();
    fs::create_dir(dir.path().join("garbled")).unwrap();

    let discovery = loader().locate_all(dir.path(), &DescriptorDefaults::default()).unwrap();
    let ids: Vec<_> = discovery.descriptors.iter().map(|d| d.identifier.clone()).collect();
    assert_eq!(ids, vec!["grp/a", "grp/good"]);
    assert_eq!(discovery.descriptors[0].folder, "a1");

    let skipped: Vec<_> = discovery.skipped.iter().map(|(folder, _)| folder.as_str()).collect();
    assert_eq!(skipped, vec!["a2", "broken", "garbled"]);
    assert!(discovery
        .skipped
        .iter()
        .all(|(_, e)| matches!(e, PluginSystemError::Validation { .. })));
}

#[cfg(feature = "toml-config")]
#[test]
fn test_toml_metadata() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("tomlish")).unwrap();
    fs::write(
        dir.path().join("tomlish.toml"),
        "GroupID = \"grp\"\nPluginID = \"t\"\nVersion = \"0.3\"\nName = \"Toml\"\nAutoLoadEntities = true\n",
    )
    .unwrap();

    let discovery = loader().locate_all(dir.path(), &DescriptorDefaults::default()).unwrap();
    assert_eq!(discovery.descriptors.len(), 1);
    assert_eq!(discovery.descriptors[0].identifier, "grp/t");
    assert!(discovery.descriptors[0].flags.load_entities);
}
