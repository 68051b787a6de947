use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::support::TracingHost;
use crate::plugin_system::error::PluginSystemError;
use crate::plugin_system::manifest::{BootFlags, ManifestBuilder, PluginDescriptor};
use crate::plugin_system::version::Version;
use crate::stage_manager::error::StageSystemError;
use crate::stage_manager::{BootContext, BootPipeline, BootStage, CategoryLoader, Realm, StageResult};

/// Category loader recording which stages it was asked to load
#[derive(Debug, Default)]
struct RecordingLoader {
    calls: Mutex<Vec<BootStage>>,
    fail: bool,
}

impl CategoryLoader for RecordingLoader {
    fn load(
        &self,
        stage: BootStage,
        descriptor: &PluginDescriptor,
        context: &mut BootContext,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
        if self.fail {
            return Err(format!("cannot load {} for {}", stage, descriptor.identifier).into());
        }
        self.calls.lock().unwrap().push(stage);
        context.objects.set_object(stage.id(), descriptor.identifier.clone())?;
        Ok(())
    }
}

fn descriptor(order: &[&str], flags: BootFlags) -> PluginDescriptor {
    ManifestBuilder::new("grp", "a", Version::new(1, 0, 0))
        .root("root")
        .shared("sh.lua")
        .server("sv.lua")
        .client("cl.lua")
        .flags(flags)
        .load_order(order)
        .build()
}

fn context(realm: Realm, host: &Arc<TracingHost>) -> BootContext {
    BootContext::new(realm, host.clone())
}

#[test]
fn test_stage_tags_parse_case_insensitively() {
    assert_eq!("Shared".parse::<BootStage>().unwrap(), BootStage::Shared);
    assert_eq!("EFFECTS".parse::<BootStage>().unwrap(), BootStage::Effects);
    assert!(matches!(
        "vehicles".parse::<BootStage>(),
        Err(StageSystemError::UnknownStage { tag }) if tag == "vehicles"
    ));
    for stage in BootStage::ALL {
        assert_eq!(stage.id().parse::<BootStage>().unwrap(), stage);
    }
    assert!(!BootStage::Server.is_category());
    assert!(BootStage::Libraries.is_category());
}

#[test]
fn test_entrypoints_run_in_declared_order() {
    let host = Arc::new(TracingHost::default());
    let mut ctx = context(Realm::both(), &host);
    let pipeline = BootPipeline::new();

    let results = pipeline
        .run(&descriptor(&["client", "server", "shared"], BootFlags::default()), &mut ctx)
        .unwrap();

    assert_eq!(
        host.included(),
        vec![PathBuf::from("root/cl.lua"), PathBuf::from("root/sv.lua"), PathBuf::from("root/sh.lua")]
    );
    assert!(results.iter().all(|(_, r)| *r == StageResult::Success));
}

#[test]
fn test_side_stages_need_realm_and_entrypoint() {
    let host = Arc::new(TracingHost::default());
    let mut ctx = context(Realm::server(), &host);
    let mut plugin = descriptor(&["shared", "server", "client"], BootFlags::default());
    plugin.shared = String::new();

    let results = BootPipeline::new().run(&plugin, &mut ctx).unwrap();
    assert_eq!(host.included(), vec![PathBuf::from("root/sv.lua")]);
    assert!(matches!(results[0].1, StageResult::Skipped(_)));
    assert_eq!(results[1].1, StageResult::Success);
    assert!(matches!(results[2].1, StageResult::Skipped(_)));
}

#[test]
fn test_unknown_tag_stops_pipeline() {
    let host = Arc::new(TracingHost::default());
    let mut ctx = context(Realm::server(), &host);

    let err = BootPipeline::new()
        .run(&descriptor(&["shared", "bogus", "server"], BootFlags::default()), &mut ctx)
        .unwrap_err();
    assert!(matches!(
        err,
        PluginSystemError::Configuration { ref plugin, source: StageSystemError::UnknownStage { ref tag } }
            if plugin == "grp/a" && tag == "bogus"
    ));
    assert_eq!(host.included(), vec![PathBuf::from("root/sh.lua")]);
}

#[test]
fn test_category_stages_need_flag_and_loader() {
    let host = Arc::new(TracingHost::default());
    let mut ctx = context(Realm::server(), &host);
    let loader = Arc::new(RecordingLoader::default());
    let pipeline = BootPipeline::new()
        .with_loader(BootStage::Entities, loader.clone())
        .with_loader(BootStage::Weapons, loader.clone());
    assert!(pipeline.has_loader(BootStage::Entities));
    assert!(!pipeline.has_loader(BootStage::Effects));

    let flags = BootFlags {
        load_entities: true,
        load_effects: true,
        ..BootFlags::default()
    };
    let results = pipeline
        .run(&descriptor(&["weapons", "entities", "effects"], flags), &mut ctx)
        .unwrap();

    assert_eq!(*loader.calls.lock().unwrap(), vec![BootStage::Entities]);
    assert!(matches!(results[0].1, StageResult::Skipped(_)));
    assert_eq!(results[1].1, StageResult::Success);
    // flag set but no loader registered
    assert!(matches!(results[2].1, StageResult::Skipped(_)));
    assert_eq!(ctx.objects.get_object::<String>("entities").map(String::as_str), Some("grp/a"));
}

#[test]
fn test_failing_stage_is_reported() {
    let host = Arc::new(TracingHost::default());
    let mut ctx = context(Realm::server(), &host);
    let pipeline = BootPipeline::new().with_loader(
        BootStage::Classes,
        Arc::new(RecordingLoader { fail: true, ..RecordingLoader::default() }),
    );
    let flags = BootFlags { load_classes: true, ..BootFlags::default() };

    let err = pipeline.run(&descriptor(&["classes", "shared"], flags), &mut ctx).unwrap_err();
    match err {
        PluginSystemError::Stage { plugin, source: StageSystemError::StageExecutionFailed { stage_id, .. } } => {
            assert_eq!(plugin, "grp/a");
            assert_eq!(stage_id, "classes");
        }
        other => panic!("expected a stage failure, got {:?}", other),
    }
    assert!(host.included().is_empty());
}

#[test]
fn test_failing_include_is_reported() {
    let host = Arc::new(TracingHost {
        fail_on: Some(PathBuf::from("root/sh.lua")),
        ..TracingHost::default()
    });
    let mut ctx = context(Realm::server(), &host);
    let result = BootPipeline::new().run(&descriptor(&["shared"], BootFlags::default()), &mut ctx);
    assert!(matches!(result, Err(PluginSystemError::Stage { .. })));
}
