//! Resolution and build orchestration tests

use super::*;
use crate::config::{BuildAction, ContentEntry};
use crate::engine::{BuildSummary, TracingBuildLogger};
use crate::plugin::{Catalog, MemoryModuleLoader, PluginRegistry};
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

fn catalog() -> Catalog {
    PluginRegistry::new(Arc::new(MemoryModuleLoader::new()))
        .discover(&[])
        .unwrap()
}

fn item(catalog: &Catalog, entry: ContentEntry) -> ContentItem {
    let mut item = ContentItem::bind(entry, catalog);
    item.assign_from_extension(catalog);
    item
}

fn settings(root: &str) -> ManifestSettings {
    ManifestSettings {
        root: root.to_string(),
        ..Default::default()
    }
}

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, relative).unwrap();
}

fn project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    touch(temp_dir.path(), "Assets/images/hero.png");
    touch(temp_dir.path(), "Assets/images/tiles.png");
    touch(temp_dir.path(), "Assets/images/notes.txt");
    touch(temp_dir.path(), "Assets/levels/one.xml");
    touch(temp_dir.path(), "Assets/levels/shared/tiles.tsx");
    temp_dir
}

#[test]
fn test_resolve_build_entry() {
    let temp_dir = project();
    let catalog = catalog();
    let items = vec![item(&catalog, ContentEntry::new("tex1", "images/*.png"))];

    let resolved = resolve(&items, &settings("Assets"), temp_dir.path()).unwrap();

    assert!(resolved.copy_files.is_empty());
    assert_eq!(
        resolved.build_files,
        [
            temp_dir.path().join("Assets/images/hero.png"),
            temp_dir.path().join("Assets/images/tiles.png"),
        ]
    );
    let binding = &resolved.bindings[&resolved.build_files[0]];
    assert_eq!(binding.importer, "TextureImporter");
    assert_eq!(binding.processor, "TextureProcessor");
    assert_eq!(items[0].importer().type_name, "TextureImporter");
}

#[test]
fn test_resolve_root_escape_hatch() {
    let temp_dir = project();
    let external = TempDir::new().unwrap();
    touch(external.path(), "boom.wav");
    touch(external.path(), "splash.wav");

    let catalog = catalog();
    let path = format!("${}/*.wav", external.path().display());
    let items = vec![item(
        &catalog,
        ContentEntry::new("sfx", path).with_action(BuildAction::Copy),
    )];

    let resolved = resolve(&items, &settings("./Assets"), temp_dir.path()).unwrap();

    assert!(resolved.build_files.is_empty());
    assert_eq!(
        resolved.copy_files,
        [external.path().join("boom.wav"), external.path().join("splash.wav")]
    );
}

#[test]
fn test_resolve_rejects_escape() {
    let temp_dir = project();
    let catalog = catalog();
    let items = vec![
        item(&catalog, ContentEntry::new("tex1", "images/*.png")),
        item(&catalog, ContentEntry::new("bad", "images/../../secrets/*.png")),
    ];

    let err = resolve(&items, &settings("Assets"), temp_dir.path()).unwrap_err();
    assert_eq!(err.path, "images/../../secrets/*.png");

    let items = vec![item(
        &catalog,
        ContentEntry::new("tex1", "images/*.png").with_dependencies(["../palette.act"]),
    )];
    assert!(resolve(&items, &settings("Assets"), temp_dir.path()).is_err());
}

#[test]
fn test_resolve_skips_failed_expansion() {
    let temp_dir = project();
    let catalog = catalog();
    let items = vec![
        item(&catalog, ContentEntry::new("gone", "missing/*.png")),
        item(&catalog, ContentEntry::new("tex1", "images/*.png")),
    ];

    let resolved = resolve(&items, &settings("Assets"), temp_dir.path()).unwrap();
    assert_eq!(resolved.errors.len(), 1);
    assert_eq!(resolved.build_files.len(), 2);
}

#[test]
fn test_resolve_first_entry_wins_for_duplicates() {
    let temp_dir = project();
    let catalog = catalog();
    let items = vec![
        item(&catalog, ContentEntry::new("hero", "images/hero.png")),
        item(
            &catalog,
            ContentEntry::new("all", "images/*.png").with_processor("PassThroughProcessor"),
        ),
    ];

    let resolved = resolve(&items, &settings("Assets"), temp_dir.path()).unwrap();
    assert_eq!(resolved.build_files.len(), 2);

    let hero = temp_dir.path().join("Assets/images/hero.png");
    assert_eq!(resolved.bindings[&hero].processor, "TextureProcessor");
}

#[test]
fn test_resolve_dependencies() {
    let temp_dir = project();
    let catalog = catalog();
    let items = vec![item(
        &catalog,
        ContentEntry::new("levels", "levels/*.xml")
            .with_recursive(true)
            .with_dependencies(["levels/*.tsx"]),
    )];

    let resolved = resolve(&items, &settings("Assets"), temp_dir.path()).unwrap();
    let level = temp_dir.path().join("Assets/levels/one.xml");
    assert_eq!(resolved.build_files, [level.clone()]);
    assert_eq!(
        resolved.dependencies[&level],
        [temp_dir.path().join("Assets/levels/shared/tiles.tsx")]
    );
}

#[test]
fn test_reorder_round_trip() {
    let catalog = catalog();
    let mut content = ContentList::new();
    let mut items = Vec::new();
    for (category, path) in [("a", "a.png"), ("b", "b.wav"), ("c", "c.fx")] {
        let entry = ContentEntry::new(category, path);
        content.push(entry.clone()).unwrap();
        items.push(item(&catalog, entry));
    }
    let original = content.clone();

    assert_eq!(reorder(&mut content, &mut items, 1, MoveDirection::Down), Some(2));
    let order: Vec<_> = content.categories().collect();
    assert_eq!(order, ["a", "c", "b"]);
    assert_eq!(items[2].category(), "b");

    assert_eq!(reorder(&mut content, &mut items, 2, MoveDirection::Up), Some(1));
    assert_eq!(content, original);
    let order: Vec<_> = items.iter().map(|i| i.category()).collect();
    assert_eq!(order, ["a", "b", "c"]);

    assert_eq!(reorder(&mut content, &mut items, 0, MoveDirection::Up), None);
    assert_eq!(reorder(&mut content, &mut items, 2, MoveDirection::Down), None);
    assert_eq!(content, original);
}

/// Engine that records requests and answers with a fixed outcome
#[derive(Default)]
struct FakeEngine {
    requests: Mutex<Vec<BuildRequest>>,
    fail: bool,
    failed_files: usize,
    delay: Option<Duration>,
}

impl FakeEngine {
    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl BuildEngine for FakeEngine {
    async fn build(&self, request: &BuildRequest, _logger: &dyn BuildLogger) -> Result<BuildSummary> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            anyhow::bail!("compiler crashed");
        }
        Ok(BuildSummary {
            built: request.build_files.len() - self.failed_files,
            copied: request.copy_files.len(),
            skipped: 0,
            failed: self.failed_files,
        })
    }
}

#[tokio::test]
async fn test_build_finishes() {
    let temp_dir = project();
    let catalog = catalog();
    let items = vec![item(&catalog, ContentEntry::new("tex1", "images/*.png"))];
    let orchestrator = BuildOrchestrator::default();
    let engine = FakeEngine::default();

    let report = orchestrator
        .build(
            &items,
            &settings("Assets"),
            temp_dir.path(),
            &engine,
            &TracingBuildLogger,
            true,
        )
        .await
        .unwrap();

    assert_eq!(report.state, BuildState::Finished);
    assert_eq!(report.build_files, 2);
    assert_eq!(report.summary.unwrap().built, 2);
    assert_eq!(orchestrator.state().await, BuildState::Finished);

    let requests = engine.requests.lock().unwrap();
    assert!(requests[0].rebuild);
    assert_eq!(requests[0].root, temp_dir.path().join("Assets"));
    assert_eq!(requests[0].output_dir, temp_dir.path().join("bin"));
    drop(requests);

    // The rebuild flag only lasts one run
    assert!(!orchestrator.is_rebuilding());
    assert!(!orchestrator.is_running());
}

#[tokio::test]
async fn test_engine_error_fails_build() {
    let temp_dir = project();
    let catalog = catalog();
    let items = vec![item(&catalog, ContentEntry::new("tex1", "images/*.png"))];
    let orchestrator = BuildOrchestrator::default();
    let engine = FakeEngine {
        fail: true,
        ..Default::default()
    };

    let report = orchestrator
        .build(&items, &settings("Assets"), temp_dir.path(), &engine, &TracingBuildLogger, true)
        .await
        .unwrap();

    assert_eq!(report.state, BuildState::Failed);
    assert!(report.error.unwrap().contains("compiler crashed"));
    assert!(!orchestrator.is_rebuilding());
}

#[tokio::test]
async fn test_file_failures_fail_build() {
    let temp_dir = project();
    let catalog = catalog();
    let items = vec![item(&catalog, ContentEntry::new("tex1", "images/*.png"))];
    let engine = FakeEngine {
        failed_files: 1,
        ..Default::default()
    };

    let report = BuildOrchestrator::default()
        .build(&items, &settings("Assets"), temp_dir.path(), &engine, &TracingBuildLogger, false)
        .await
        .unwrap();
    assert_eq!(report.state, BuildState::Failed);
    assert_eq!(report.summary.unwrap().failed, 1);
}

#[tokio::test]
async fn test_path_escape_fails_without_engine() {
    let temp_dir = project();
    let catalog = catalog();
    let items = vec![item(&catalog, ContentEntry::new("bad", "../*.png"))];
    let engine = FakeEngine::default();

    let report = BuildOrchestrator::default()
        .build(&items, &settings("Assets"), temp_dir.path(), &engine, &TracingBuildLogger, false)
        .await
        .unwrap();
    assert_eq!(report.state, BuildState::Failed);
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn test_cancel_while_waiting_for_debugger() {
    let temp_dir = project();
    let catalog = catalog();
    let items = vec![item(&catalog, ContentEntry::new("tex1", "images/*.png"))];
    let orchestrator = BuildOrchestrator::new(BuildOptions {
        wait_for_debugger: true,
        debugger_poll: Duration::from_millis(5),
    });
    let engine = FakeEngine::default();
    let handle = orchestrator.handle();

    let canceler = tokio::spawn(async move {
        while handle.state().await != BuildState::WaitingForDebugger {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        handle.cancel();
    });

    let report = orchestrator
        .build(&items, &settings("Assets"), temp_dir.path(), &engine, &TracingBuildLogger, false)
        .await
        .unwrap();
    canceler.await.unwrap();

    assert_eq!(report.state, BuildState::Canceled);
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn test_debugger_attach_continues_build() {
    let temp_dir = project();
    let catalog = catalog();
    let items = vec![item(&catalog, ContentEntry::new("tex1", "images/*.png"))];
    let orchestrator = BuildOrchestrator::new(BuildOptions {
        wait_for_debugger: true,
        debugger_poll: Duration::from_millis(5),
    });
    let engine = FakeEngine::default();
    let handle = orchestrator.handle();

    let attacher = tokio::spawn(async move {
        while handle.state().await != BuildState::WaitingForDebugger {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        handle.attach_debugger();
    });

    let report = orchestrator
        .build(&items, &settings("Assets"), temp_dir.path(), &engine, &TracingBuildLogger, false)
        .await
        .unwrap();
    attacher.await.unwrap();

    assert_eq!(report.state, BuildState::Finished);
    assert_eq!(engine.calls(), 1);
}

#[tokio::test]
async fn test_only_one_build_at_a_time() {
    let temp_dir = project();
    let catalog = catalog();
    let items = vec![item(&catalog, ContentEntry::new("tex1", "images/*.png"))];
    let orchestrator = BuildOrchestrator::default();
    let settings = settings("Assets");
    let slow = FakeEngine {
        delay: Some(Duration::from_millis(50)),
        ..Default::default()
    };
    let fast = FakeEngine::default();

    let first = orchestrator.build(&items, &settings, temp_dir.path(), &slow, &TracingBuildLogger, false);
    let second = async {
        while !orchestrator.is_running() {
            tokio::task::yield_now().await;
        }
        orchestrator
            .build(&items, &settings, temp_dir.path(), &fast, &TracingBuildLogger, false)
            .await
    };

    let (first, second) = tokio::join!(first, second);
    assert_eq!(first.unwrap().state, BuildState::Finished);
    assert!(matches!(second, Err(PipelineError::BuildAlreadyRunning)));
    assert_eq!(fast.calls(), 0);
}

#[test]
fn test_build_request_paths() {
    let request = build_request(
        ResolvedContent::default(),
        &settings("./Assets"),
        Path::new("/project"),
        false,
    );
    assert_eq!(request.root, PathBuf::from("/project/Assets"));
    assert_eq!(request.intermediate_dir, PathBuf::from("/project/obj"));
}
