//! Built-in pipeline library
//!
//! Importers and processors for the standard asset kinds. This module is
//! always discovered before any referenced plugin module, so its importers
//! win extension ties.

use anyhow::Result;
use contentpipe_plugin::{ImporterMetadata, PluginModule, PluginType, ProcessorInstance};
use std::marker::PhantomData;
use std::sync::Arc;

mod processors;

pub use processors::*;

/// Name of the built-in module
pub const LIBRARY_NAME: &str = "ContentPipe.Library";

/// The built-in pipeline library module
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineLibrary;

impl PluginModule for PipelineLibrary {
    fn name(&self) -> &str {
        LIBRARY_NAME
    }

    fn types(&self) -> Vec<Arc<dyn PluginType>> {
        let mut types: Vec<Arc<dyn PluginType>> = IMPORTERS
            .iter()
            .map(|importer| Arc::new(*importer) as Arc<dyn PluginType>)
            .collect();

        types.push(Arc::new(AbstractProcessor("ContentProcessor")));
        types.push(builtin::<TextureProcessor>("TextureProcessor", "Texture - ContentPipe"));
        types.push(builtin::<FontDescriptionProcessor>(
            "FontDescriptionProcessor",
            "Sprite Font Description - ContentPipe",
        ));
        types.push(builtin::<EffectProcessor>("EffectProcessor", "Effect - ContentPipe"));
        types.push(builtin::<SoundEffectProcessor>(
            "SoundEffectProcessor",
            "Sound Effect - ContentPipe",
        ));
        types.push(builtin::<SongProcessor>("SongProcessor", "Song - ContentPipe"));
        types.push(builtin::<ModelProcessor>("ModelProcessor", "Model - ContentPipe"));
        types.push(builtin::<PassThroughProcessor>(
            "PassThroughProcessor",
            "No Processing Required",
        ));
        types
    }
}

/// A built-in importer type
#[derive(Debug, Clone, Copy)]
pub struct BuiltinImporter {
    pub type_name: &'static str,
    pub display_name: &'static str,
    pub default_processor: &'static str,
    pub file_extensions: &'static [&'static str],
    pub output_type: &'static str,
}

/// Importers in discovery order
pub const IMPORTERS: &[BuiltinImporter] = &[
    BuiltinImporter {
        type_name: "TextureImporter",
        display_name: "Texture Importer - ContentPipe",
        default_processor: "TextureProcessor",
        file_extensions: &[
            ".bmp", ".dds", ".gif", ".jpg", ".jpeg", ".png", ".tga", ".tif", ".tiff",
        ],
        output_type: "TextureContent",
    },
    BuiltinImporter {
        type_name: "FontDescriptionImporter",
        display_name: "Sprite Font Importer - ContentPipe",
        default_processor: "FontDescriptionProcessor",
        file_extensions: &[".spritefont"],
        output_type: "FontDescription",
    },
    BuiltinImporter {
        type_name: "EffectImporter",
        display_name: "Effect Importer - ContentPipe",
        default_processor: "EffectProcessor",
        file_extensions: &[".fx"],
        output_type: "EffectContent",
    },
    BuiltinImporter {
        type_name: "WavImporter",
        display_name: "Wav Importer - ContentPipe",
        default_processor: "SoundEffectProcessor",
        file_extensions: &[".wav"],
        output_type: "AudioContent",
    },
    BuiltinImporter {
        type_name: "SongImporter",
        display_name: "Song Importer - ContentPipe",
        default_processor: "SongProcessor",
        file_extensions: &[".mp3", ".ogg", ".wma"],
        output_type: "AudioContent",
    },
    BuiltinImporter {
        type_name: "ModelImporter",
        display_name: "Model Importer - ContentPipe",
        default_processor: "ModelProcessor",
        file_extensions: &[".fbx", ".x", ".obj"],
        output_type: "NodeContent",
    },
    BuiltinImporter {
        type_name: "XmlImporter",
        display_name: "Xml Importer - ContentPipe",
        default_processor: "PassThroughProcessor",
        file_extensions: &[".xml"],
        output_type: "Object",
    },
];

impl PluginType for BuiltinImporter {
    fn type_name(&self) -> &str {
        self.type_name
    }

    fn describes_importer(&self) -> bool {
        true
    }

    fn importer_metadata(&self) -> Option<ImporterMetadata> {
        Some(ImporterMetadata {
            display_name: Some(self.display_name.to_string()),
            default_processor: self.default_processor.to_string(),
            file_extensions: self.file_extensions.iter().map(|e| e.to_string()).collect(),
            output_type: self.output_type.to_string(),
        })
    }
}

/// A built-in processor type read through its `Default` instance
struct BuiltinProcessor<P> {
    type_name: &'static str,
    display_name: &'static str,
    instance: PhantomData<fn() -> P>,
}

fn builtin<P>(type_name: &'static str, display_name: &'static str) -> Arc<dyn PluginType>
where
    P: ProcessorInstance + Default + 'static,
{
    Arc::new(BuiltinProcessor::<P> {
        type_name,
        display_name,
        instance: PhantomData,
    })
}

impl<P> PluginType for BuiltinProcessor<P>
where
    P: ProcessorInstance + Default + 'static,
{
    fn type_name(&self) -> &str {
        self.type_name
    }

    fn describes_processor(&self) -> bool {
        true
    }

    fn processor_display_name(&self) -> Option<String> {
        Some(self.display_name.to_string())
    }

    fn instantiate_processor(&self) -> Result<Box<dyn ProcessorInstance>> {
        Ok(Box::new(P::default()))
    }
}

/// Base of all processors; never bound to content
struct AbstractProcessor(&'static str);

impl PluginType for AbstractProcessor {
    fn type_name(&self) -> &str {
        self.0
    }

    fn is_abstract(&self) -> bool {
        true
    }

    fn describes_processor(&self) -> bool {
        true
    }
}
