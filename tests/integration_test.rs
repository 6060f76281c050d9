use anyhow::Result;
use async_trait::async_trait;
use contentpipe::engine::{CompileJob, ContentCompiler, TracingBuildLogger};
use contentpipe::{
    BuildAction, BuildState, ContentEntry, ContentPipeline, LocalBuildEngine, ManifestModuleLoader,
    MoveDirection, PipelineError,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const MANIFEST: &str = r#"
root: Assets
content:
  tex1:
    path: images/*.png
    action: build
  music:
    path: audio/*.ogg
    importer: OggImporter
    processor: SongProcessor
  intro:
    path: cutscenes/intro.fx
    processor: CinematicProcessor
"#;

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, relative).unwrap();
}

fn project(manifest: &str) -> (TempDir, ContentPipeline) {
    let temp_dir = TempDir::new().unwrap();
    touch(temp_dir.path(), "Assets/images/hero.png");
    touch(temp_dir.path(), "Assets/images/tiles.png");
    touch(temp_dir.path(), "Assets/images/readme.txt");
    touch(temp_dir.path(), "Assets/cutscenes/intro.fx");

    let manifest_path = temp_dir.path().join("Content.yaml");
    std::fs::write(&manifest_path, manifest).unwrap();
    let pipeline = ContentPipeline::open(&manifest_path, Arc::new(ManifestModuleLoader)).unwrap();
    (temp_dir, pipeline)
}

/// Writes the source bytes to the output
#[derive(Default)]
struct CopyingCompiler {
    calls: AtomicUsize,
}

#[async_trait]
impl ContentCompiler for CopyingCompiler {
    async fn compile(&self, job: &CompileJob) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::fs::copy(&job.source, &job.output).await?;
        Ok(())
    }
}

#[test]
fn test_texture_entry_resolves_to_build_files() {
    let (temp_dir, pipeline) = project(MANIFEST);

    let resolved = pipeline.resolve().unwrap();
    assert!(resolved.copy_files.is_empty());
    assert_eq!(
        resolved.build_files,
        [
            temp_dir.path().join("Assets/images/hero.png"),
            temp_dir.path().join("Assets/images/tiles.png"),
            temp_dir.path().join("Assets/cutscenes/intro.fx"),
        ]
    );

    let tex1 = pipeline.item("tex1").unwrap();
    let (importer, _) = pipeline.catalog().lookup(".png");
    assert_eq!(tex1.importer().type_name, importer.type_name);
    assert!(tex1.importer().handles(".png"));
    assert_eq!(tex1.processor().type_name, "TextureProcessor");
}

#[test]
fn test_dollar_path_is_not_rooted() {
    let external = TempDir::new().unwrap();
    touch(external.path(), "boom.wav");
    touch(external.path(), "splash.wav");

    let (_temp_dir, mut pipeline) = project(MANIFEST);
    pipeline
        .add_content(
            ContentEntry::new("sfx", format!("${}/*.wav", external.path().display()))
                .with_action(BuildAction::Copy),
        )
        .unwrap();

    let resolved = pipeline.resolve().unwrap();
    assert_eq!(
        resolved.copy_files,
        [external.path().join("boom.wav"), external.path().join("splash.wav")]
    );
    assert!(!resolved
        .build_files
        .iter()
        .any(|f| f.extension().is_some_and(|e| e == "wav")));
}

#[test]
fn test_unknown_processor_binds_none() {
    let (temp_dir, mut pipeline) = project(MANIFEST);

    let intro = pipeline.item("intro").unwrap();
    assert!(intro.processor().is_none());
    assert_eq!(intro.entry().processor, "CinematicProcessor");

    assert!(!pipeline.set_parameter("intro", "Quality", "High").unwrap());
    let saved = std::fs::read_to_string(temp_dir.path().join("Content.yaml")).unwrap();
    assert!(saved.contains("CinematicProcessor"));
    assert!(!saved.contains("Quality"));
}

#[test]
fn test_set_path_twice_matches_once() {
    let (_temp_dir, mut pipeline) = project(MANIFEST);

    pipeline.set_path("tex1", "audio/theme.wav").unwrap();
    let once = pipeline.item("tex1").unwrap().clone();
    pipeline.set_path("tex1", "audio/theme.wav").unwrap();
    let twice = pipeline.item("tex1").unwrap();

    assert_eq!(once.importer(), twice.importer());
    assert_eq!(once.processor(), twice.processor());
    assert_eq!(once.entry().processor_params, twice.entry().processor_params);
    assert_eq!(twice.processor().type_name, "SoundEffectProcessor");
}

#[test]
fn test_escaping_path_is_rejected() {
    let (temp_dir, mut pipeline) = project(MANIFEST);
    let before = pipeline.item("tex1").unwrap().clone();

    for path in ["../images/*.png", "images/../../x.png", "images\\..\\..\\x.png"] {
        assert!(matches!(
            pipeline.set_path("tex1", path),
            Err(PipelineError::PathEscape(_))
        ));
    }

    assert_eq!(pipeline.item("tex1").unwrap().entry(), before.entry());
    let saved = std::fs::read_to_string(temp_dir.path().join("Content.yaml")).unwrap();
    assert!(!saved.contains("../"));
}

#[test]
fn test_reorder_round_trip() {
    let (temp_dir, mut pipeline) = project(MANIFEST);
    let original: Vec<String> = pipeline
        .manifest()
        .content
        .categories()
        .map(String::from)
        .collect();

    assert_eq!(pipeline.reorder(1, MoveDirection::Down).unwrap(), Some(2));
    assert_eq!(pipeline.reorder(2, MoveDirection::Up).unwrap(), Some(1));

    let order: Vec<String> = pipeline
        .manifest()
        .content
        .categories()
        .map(String::from)
        .collect();
    assert_eq!(order, original);
    let items: Vec<&str> = pipeline.items().iter().map(|i| i.category()).collect();
    assert_eq!(items, original);

    let reopened =
        ContentPipeline::open(&temp_dir.path().join("Content.yaml"), Arc::new(ManifestModuleLoader))
            .unwrap();
    let saved: Vec<&str> = reopened.manifest().content.categories().collect();
    assert_eq!(saved, original);
}

#[test]
fn test_catalog_sentinels_survive_reload() {
    let (_temp_dir, mut pipeline) = project(MANIFEST);

    assert_eq!(pipeline.catalog().importers()[0].type_name, "NONE");
    assert_eq!(pipeline.catalog().processors()[0].type_name, "NONE");

    pipeline
        .set_references(vec!["plugins/missing.yaml".to_string()])
        .unwrap();
    assert_eq!(pipeline.registry().failures().len(), 1);
    assert_eq!(pipeline.catalog().importers()[0].type_name, "NONE");
    assert_eq!(pipeline.catalog().processors()[0].type_name, "NONE");
}

#[tokio::test]
async fn test_local_build_is_incremental() {
    let (temp_dir, pipeline) = project(MANIFEST);
    let compiler = Arc::new(CopyingCompiler::default());
    let engine = LocalBuildEngine::new(compiler.clone());

    let report = pipeline.build(&engine, &TracingBuildLogger, false).await.unwrap();
    assert_eq!(report.state, BuildState::Finished);
    assert_eq!(report.build_files, 3);
    assert_eq!(compiler.calls.load(Ordering::SeqCst), 3);
    assert!(temp_dir.path().join("bin/images/hero.xnb").exists());
    assert!(temp_dir.path().join("bin/cutscenes/intro.xnb").exists());

    let report = pipeline.build(&engine, &TracingBuildLogger, false).await.unwrap();
    assert_eq!(report.state, BuildState::Finished);
    assert_eq!(report.summary.unwrap().skipped, 3);
    assert_eq!(compiler.calls.load(Ordering::SeqCst), 3);

    let report = pipeline.build(&engine, &TracingBuildLogger, true).await.unwrap();
    assert_eq!(report.summary.unwrap().built, 3);
    assert_eq!(compiler.calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_clean_removes_outputs() {
    let (temp_dir, pipeline) = project(MANIFEST);
    let engine = LocalBuildEngine::new(Arc::new(CopyingCompiler::default()));
    pipeline.build(&engine, &TracingBuildLogger, false).await.unwrap();

    contentpipe::engine::clean(&temp_dir.path().join("obj"), &temp_dir.path().join("bin"))
        .await
        .unwrap();

    assert!(!temp_dir.path().join("bin").exists());
    assert!(std::fs::read_dir(temp_dir.path().join("obj"))
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(true));
}
