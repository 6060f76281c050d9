use contentpipe::{ContentEntry, ContentPipeline, Manifest, ManifestModuleLoader, PluginRegistry};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const SPINE: &str = r#"
name: Spine.Pipeline
types:
  - type: Spine.SkeletonImporter
    capabilities: [importer]
    importer:
      displayName: Spine Skeleton Importer
      defaultProcessor: Spine.SkeletonProcessor
      fileExtensions: [".skel", ".json"]
  - type: Spine.SkeletonProcessor
    capabilities: [processor]
    processor:
      displayName: Spine Skeleton
      properties:
        - name: Scale
          kind: float
          value: 1.0
        - name: PremultiplyAlpha
          kind: bool
          value: true
"#;

const TILED: &str = r#"
name: Tiled.Pipeline
types:
  - type: Tiled.MapImporter
    capabilities: [importer]
    importer:
      defaultProcessor: Tiled.MapProcessor
      fileExtensions: [".tmx"]
  - type: Tiled.MapProcessor
    capabilities: [processor]
  - type: Tiled.BaseProcessor
    abstract: true
    capabilities: [processor]
"#;

fn write_plugins(root: &Path) {
    let plugins = root.join("plugins");
    std::fs::create_dir_all(&plugins).unwrap();
    std::fs::write(plugins.join("spine.yaml"), SPINE).unwrap();
    std::fs::write(plugins.join("tiled.yaml"), TILED).unwrap();
    std::fs::write(plugins.join("broken.yaml"), "types: [ {type: ").unwrap();
}

#[test]
fn test_corrupt_module_does_not_hide_others() {
    let temp_dir = TempDir::new().unwrap();
    write_plugins(temp_dir.path());

    let mut registry = PluginRegistry::new(Arc::new(ManifestModuleLoader));
    let references = vec![
        "plugins/spine.yaml".to_string(),
        "plugins/broken.yaml".to_string(),
        "plugins/tiled.yaml".to_string(),
    ];
    let err = registry.load(&references, temp_dir.path()).unwrap_err();

    assert_eq!(err.failures.len(), 1);
    assert!(err.failures[0].module.contains("broken.yaml"));
    assert!(registry.is_initialized());

    let catalog = registry.catalog();
    assert!(catalog.importer("Spine.SkeletonImporter").is_some());
    assert!(catalog.importer("Tiled.MapImporter").is_some());
    assert!(catalog.processor("Spine Skeleton").is_some());
    assert!(catalog.processor("Tiled.BaseProcessor").is_none());
    assert_eq!(catalog.importers()[0].type_name, "NONE");
    assert_eq!(catalog.processors()[0].type_name, "NONE");
}

#[test]
fn test_glob_reference_loads_directory() {
    let temp_dir = TempDir::new().unwrap();
    write_plugins(temp_dir.path());

    let mut registry = PluginRegistry::new(Arc::new(ManifestModuleLoader));
    let err = registry
        .load(&["plugins/*.yaml".to_string()], temp_dir.path())
        .unwrap_err();

    assert_eq!(err.failures.len(), 1);
    assert_eq!(
        err.catalog.importers().len(),
        registry.catalog().importers().len()
    );

    let (importer, processor) = registry.lookup(".tmx");
    assert_eq!(importer.type_name, "Tiled.MapImporter");
    assert_eq!(processor.type_name, "Tiled.MapProcessor");
}

#[test]
fn test_lookup_is_deterministic() {
    let temp_dir = TempDir::new().unwrap();
    write_plugins(temp_dir.path());

    let mut registry = PluginRegistry::new(Arc::new(ManifestModuleLoader));
    let _ = registry.load(&["plugins/*.yaml".to_string()], temp_dir.path());

    for extension in [".png", ".skel", ".tmx", ".wav", ".json"] {
        let (first, _) = registry.lookup(extension);
        for _ in 0..3 {
            let (again, _) = registry.lookup(extension);
            assert_eq!(again.type_name, first.type_name);
        }
        assert!(first.handles(extension), "{} -> {}", extension, first.type_name);
    }
}

#[test]
fn test_content_binds_to_referenced_plugins() {
    let temp_dir = TempDir::new().unwrap();
    write_plugins(temp_dir.path());

    let mut manifest = Manifest::default();
    manifest.settings.references = vec!["plugins/spine.yaml".to_string()];
    let mut pipeline =
        ContentPipeline::from_manifest(manifest, temp_dir.path(), Arc::new(ManifestModuleLoader))
            .unwrap();

    let item = pipeline
        .add_content(ContentEntry::new("hero", "spine/hero.skel"))
        .unwrap();
    assert_eq!(item.importer().type_name, "Spine.SkeletonImporter");
    assert_eq!(item.processor().display_name, "Spine Skeleton");
    assert_eq!(item.entry().processor_params["PremultiplyAlpha"], "true");

    assert!(pipeline.set_parameter("hero", "Scale", "0.5").unwrap());
    assert!(pipeline.set_parameter("hero", "Scale", "half").is_err());
    assert_eq!(pipeline.item("hero").unwrap().entry().processor_params["Scale"], "0.5");
}
