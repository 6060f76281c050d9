//! Content item tests

use super::*;
use crate::plugin::{MemoryModuleLoader, PluginRegistry};
use contentpipe_plugin::PropertyValue;

fn catalog() -> Catalog {
    PluginRegistry::new(Arc::new(MemoryModuleLoader::new()))
        .discover(&[])
        .unwrap()
}

fn texture_item(catalog: &Catalog) -> ContentItem {
    let entry = ContentEntry::new("tex1", "images/*.png")
        .with_importer("TextureImporter")
        .with_processor("TextureProcessor");
    ContentItem::bind(entry, catalog)
}

#[test]
fn test_bind_resolves_names() {
    let catalog = catalog();
    let item = texture_item(&catalog);

    assert_eq!(item.importer().type_name, "TextureImporter");
    assert_eq!(item.processor().type_name, "TextureProcessor");
    assert_eq!(
        item.parameters().get("PremultiplyAlpha"),
        Some(&PropertyValue::Bool(true))
    );
}

#[test]
fn test_bind_empty_names_stay_unresolved() {
    let catalog = catalog();
    let item = ContentItem::bind(ContentEntry::new("tex1", "images/*.png"), &catalog);

    assert!(item.importer().is_none());
    assert!(item.processor().is_none());
    assert!(item.parameters().is_empty());
}

#[test]
fn test_unknown_processor_binds_to_none() {
    let catalog = catalog();
    let mut entry = ContentEntry::new("map", "maps/level1.tmx").with_processor("TmxProcessor");
    entry
        .processor_params
        .insert("Compress".to_string(), "true".to_string());
    let mut item = ContentItem::bind(entry, &catalog);

    assert!(item.processor().is_none());
    // Names and parameters of the missing plugin are kept for the manifest
    assert_eq!(item.entry().processor, "TmxProcessor");
    assert_eq!(item.entry().processor_params["Compress"], "true");

    assert!(!item.set_parameter("Compress", "false").unwrap());
    assert_eq!(item.entry().processor_params["Compress"], "true");
}

#[test]
fn test_bind_keeps_known_overrides_only() {
    let catalog = catalog();
    let mut entry = ContentEntry::new("tex1", "a.png")
        .with_importer("TextureImporter")
        .with_processor("TextureProcessor");
    entry
        .processor_params
        .insert("ColorKeyColor".to_string(), "0, 0, 0".to_string());
    entry
        .processor_params
        .insert("RemovedInV2".to_string(), "1".to_string());
    entry
        .processor_params
        .insert("GenerateMipmaps".to_string(), "often".to_string());

    let item = ContentItem::bind(entry, &catalog);
    let params = &item.entry().processor_params;
    assert_eq!(params.len(), 1);
    assert_eq!(params["ColorKeyColor"], "0,0,0,255");
    assert_eq!(
        item.parameters().get("GenerateMipmaps"),
        Some(&PropertyValue::Bool(false))
    );
}

#[test]
fn test_assign_from_extension() {
    let catalog = catalog();
    let mut item = ContentItem::bind(ContentEntry::new("music", "music/theme.ogg"), &catalog);

    assert!(item.assign_from_extension(&catalog));
    assert_eq!(item.entry().importer, "SongImporter");
    assert_eq!(item.entry().processor, "SongProcessor");
    assert_eq!(item.entry().processor_params["Quality"], "Best");

    // Explicit names are never overwritten
    assert!(!item.assign_from_extension(&catalog));
}

#[test]
fn test_set_path_rebinds_on_extension_change() {
    let catalog = catalog();
    let mut item = texture_item(&catalog);
    item.set_parameter("PremultiplyAlpha", "false").unwrap();

    assert!(item.set_path("\\audio\\boom.wav", Some(&catalog)).unwrap());
    assert_eq!(item.path(), "audio/boom.wav");
    assert_eq!(item.importer().type_name, "WavImporter");
    assert_eq!(item.processor().type_name, "SoundEffectProcessor");
    assert_eq!(item.entry().processor_params.len(), 1);
    assert!(!item.parameters().contains("PremultiplyAlpha"));
}

#[test]
fn test_set_path_same_extension_keeps_bindings() {
    let catalog = catalog();
    let mut item = texture_item(&catalog);
    item.set_parameter("PremultiplyAlpha", "false").unwrap();

    assert!(!item.set_path("sprites/*.png", Some(&catalog)).unwrap());
    assert_eq!(item.entry().processor_params["PremultiplyAlpha"], "false");
}

#[test]
fn test_set_path_is_idempotent() {
    let catalog = catalog();
    let mut once = texture_item(&catalog);
    once.set_path("/fonts/arial.spritefont", Some(&catalog)).unwrap();

    let mut twice = texture_item(&catalog);
    twice.set_path("/fonts/arial.spritefont", Some(&catalog)).unwrap();
    twice.set_path("/fonts/arial.spritefont", Some(&catalog)).unwrap();

    assert_eq!(once.entry(), twice.entry());
    assert_eq!(once.importer(), twice.importer());
    assert_eq!(once.processor(), twice.processor());
    assert_eq!(once.parameters(), twice.parameters());
}

#[test]
fn test_set_path_same_path_keeps_chosen_processor() {
    let catalog = catalog();
    let mut item = ContentItem::bind(ContentEntry::new("level", "data/level.foo"), &catalog);
    item.assign_from_extension(&catalog);
    item.set_processor("TextureProcessor", &catalog);
    let before = item.clone();

    assert!(!item.set_path("data/level.foo", Some(&catalog)).unwrap());
    assert_eq!(item.entry(), before.entry());
    assert_eq!(item.processor().type_name, "TextureProcessor");
    assert_eq!(item.parameters(), before.parameters());
}

#[test]
fn test_set_path_same_path_keeps_missing_plugin_names() {
    let catalog = catalog();
    let mut entry = ContentEntry::new("level1", "maps/level1.png")
        .with_importer("TmxImporter")
        .with_processor("TmxProcessor");
    entry
        .processor_params
        .insert("Compress".to_string(), "true".to_string());
    let mut item = ContentItem::bind(entry, &catalog);
    assert!(item.importer().is_none());

    assert!(!item.set_path("maps/level1.png", Some(&catalog)).unwrap());
    assert_eq!(item.entry().importer, "TmxImporter");
    assert_eq!(item.entry().processor, "TmxProcessor");
    assert_eq!(item.entry().processor_params.len(), 1);
    assert_eq!(item.entry().processor_params["Compress"], "true");
}

#[test]
fn test_set_path_binds_unnamed_entry() {
    let catalog = catalog();
    let mut item = ContentItem::bind(ContentEntry::new("tex1", "images/*.png"), &catalog);

    assert!(item.set_path("images/*.png", Some(&catalog)).unwrap());
    assert_eq!(item.importer().type_name, "TextureImporter");
}

#[test]
fn test_set_path_without_registry_only_updates_path() {
    let catalog = catalog();
    let mut item = texture_item(&catalog);

    assert!(!item.set_path("audio/boom.wav", None).unwrap());
    assert_eq!(item.path(), "audio/boom.wav");
    assert_eq!(item.importer().type_name, "TextureImporter");
}

#[test]
fn test_set_path_rejects_escape() {
    let catalog = catalog();
    let mut item = texture_item(&catalog);
    let before = item.entry().clone();

    assert!(item.set_path("../secrets/*.png", Some(&catalog)).is_err());
    assert!(item.set_path("images\\..\\..\\x.wav", Some(&catalog)).is_err());
    assert_eq!(item.entry(), &before);
}

#[test]
fn test_set_parameter_type_checks() {
    let catalog = catalog();
    let mut item = texture_item(&catalog);

    assert!(item.set_parameter("ColorKeyColor", "10,20,30").unwrap());
    assert_eq!(item.entry().processor_params["ColorKeyColor"], "10,20,30,255");

    assert!(item.set_parameter("TextureFormat", "DxtCompressed").unwrap());
    assert!(matches!(
        item.set_parameter("TextureFormat", "Jpeg"),
        Err(PipelineError::Parameter { .. })
    ));
    assert!(matches!(
        item.set_parameter("GenerateMipmaps", "maybe"),
        Err(PipelineError::Parameter { .. })
    ));
    assert_eq!(item.entry().processor_params["TextureFormat"], "DxtCompressed");
    assert!(!item.set_parameter("NoSuchProperty", "1").unwrap());
}

#[test]
fn test_set_importer_uses_default_processor() {
    let catalog = catalog();
    let mut item = texture_item(&catalog);

    item.set_importer("XmlImporter", &catalog);
    assert_eq!(item.processor().type_name, "PassThroughProcessor");
    assert!(item.entry().processor_params.is_empty());

    item.set_importer("MissingImporter", &catalog);
    assert!(item.importer().is_none());
    assert!(item.processor().is_none());
    assert!(item.entry().importer.is_empty());
}

#[test]
fn test_set_processor_by_display_name() {
    let catalog = catalog();
    let mut item = texture_item(&catalog);

    item.set_processor("Model - ContentPipe", &catalog);
    assert_eq!(item.entry().processor, "ModelProcessor");
    assert_eq!(item.entry().processor_params["Scale"], "1");
}

#[test]
fn test_set_dependencies_rejects_escape() {
    let catalog = catalog();
    let mut item = texture_item(&catalog);

    item.set_dependencies(vec!["/shared/palette.act".to_string()])
        .unwrap();
    assert_eq!(item.entry().dependencies, ["shared/palette.act"]);

    assert!(item
        .set_dependencies(vec!["../outside/*.act".to_string()])
        .is_err());
    assert_eq!(item.entry().dependencies, ["shared/palette.act"]);
}
