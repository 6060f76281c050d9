//! Built-in processor instances

use contentpipe_plugin::{Color, ProcessorInstance, PropertyInfo, PropertyValue};

/// Texture output formats
const TEXTURE_FORMATS: &[&str] = &[
    "Color",
    "DxtCompressed",
    "NoChange",
    "Compressed",
    "Color16Bit",
    "Etc1Compressed",
    "PvrCompressed",
    "AtcCompressed",
];

const QUALITIES: &[&str] = &["Best", "Medium", "Low"];

fn texture_format(value: &str) -> PropertyValue {
    PropertyValue::enumeration(value, TEXTURE_FORMATS.iter().copied())
}

fn quality(value: &str) -> PropertyValue {
    PropertyValue::enumeration(value, QUALITIES.iter().copied())
}

/// Processes images into textures
#[derive(Debug, Clone)]
pub struct TextureProcessor {
    pub color_key_color: Color,
    pub color_key_enabled: bool,
    pub generate_mipmaps: bool,
    pub premultiply_alpha: bool,
    pub resize_to_power_of_two: bool,
    pub make_square: bool,
    pub texture_format: &'static str,
}

impl Default for TextureProcessor {
    fn default() -> Self {
        Self {
            color_key_color: Color::MAGENTA,
            color_key_enabled: true,
            generate_mipmaps: false,
            premultiply_alpha: true,
            resize_to_power_of_two: false,
            make_square: false,
            texture_format: "Color",
        }
    }
}

impl ProcessorInstance for TextureProcessor {
    fn input_type(&self) -> String {
        "TextureContent".to_string()
    }

    fn properties(&self) -> Vec<PropertyInfo> {
        vec![
            PropertyInfo::new("ColorKeyColor", PropertyValue::Color(self.color_key_color))
                .with_display_name("Color Key Color"),
            PropertyInfo::new("ColorKeyEnabled", PropertyValue::Bool(self.color_key_enabled))
                .with_display_name("Color Key Enabled"),
            PropertyInfo::new("GenerateMipmaps", PropertyValue::Bool(self.generate_mipmaps))
                .with_display_name("Generate Mipmaps"),
            PropertyInfo::new("PremultiplyAlpha", PropertyValue::Bool(self.premultiply_alpha))
                .with_display_name("Premultiply Alpha"),
            PropertyInfo::new(
                "ResizeToPowerOfTwo",
                PropertyValue::Bool(self.resize_to_power_of_two),
            )
            .with_display_name("Resize to Power of Two"),
            PropertyInfo::new("MakeSquare", PropertyValue::Bool(self.make_square))
                .with_display_name("Make Square"),
            PropertyInfo::new("TextureFormat", texture_format(self.texture_format))
                .with_display_name("Texture Format"),
        ]
    }
}

/// Builds sprite fonts from font descriptions
#[derive(Debug, Clone)]
pub struct FontDescriptionProcessor {
    pub premultiply_alpha: bool,
    pub texture_format: &'static str,
}

impl Default for FontDescriptionProcessor {
    fn default() -> Self {
        Self {
            premultiply_alpha: true,
            texture_format: "Compressed",
        }
    }
}

impl ProcessorInstance for FontDescriptionProcessor {
    fn input_type(&self) -> String {
        "FontDescription".to_string()
    }

    fn properties(&self) -> Vec<PropertyInfo> {
        vec![
            PropertyInfo::new("PremultiplyAlpha", PropertyValue::Bool(self.premultiply_alpha))
                .with_display_name("Premultiply Alpha"),
            PropertyInfo::new("TextureFormat", texture_format(self.texture_format))
                .with_display_name("Texture Format"),
        ]
    }
}

/// Compiles shader effects
#[derive(Debug, Clone)]
pub struct EffectProcessor {
    pub debug_mode: &'static str,
    pub defines: String,
}

impl Default for EffectProcessor {
    fn default() -> Self {
        Self {
            debug_mode: "Auto",
            defines: String::new(),
        }
    }
}

impl ProcessorInstance for EffectProcessor {
    fn input_type(&self) -> String {
        "EffectContent".to_string()
    }

    fn properties(&self) -> Vec<PropertyInfo> {
        vec![
            PropertyInfo::new(
                "DebugMode",
                PropertyValue::enumeration(self.debug_mode, ["Auto", "Debug", "Optimize"]),
            )
            .with_display_name("Debug Mode"),
            PropertyInfo::new("Defines", PropertyValue::String(self.defines.clone())),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct SoundEffectProcessor {
    pub quality: &'static str,
}

impl Default for SoundEffectProcessor {
    fn default() -> Self {
        Self { quality: "Best" }
    }
}

impl ProcessorInstance for SoundEffectProcessor {
    fn input_type(&self) -> String {
        "AudioContent".to_string()
    }

    fn properties(&self) -> Vec<PropertyInfo> {
        vec![PropertyInfo::new("Quality", quality(self.quality))]
    }
}

#[derive(Debug, Clone)]
pub struct SongProcessor {
    pub quality: &'static str,
}

impl Default for SongProcessor {
    fn default() -> Self {
        Self { quality: "Best" }
    }
}

impl ProcessorInstance for SongProcessor {
    fn input_type(&self) -> String {
        "AudioContent".to_string()
    }

    fn properties(&self) -> Vec<PropertyInfo> {
        vec![PropertyInfo::new("Quality", quality(self.quality))]
    }
}

/// Processes 3D scenes into models
#[derive(Debug, Clone)]
pub struct ModelProcessor {
    pub color_key_color: Color,
    pub color_key_enabled: bool,
    pub default_effect: &'static str,
    pub generate_mipmaps: bool,
    pub generate_tangent_frames: bool,
    pub premultiply_texture_alpha: bool,
    pub premultiply_vertex_colors: bool,
    pub resize_textures_to_power_of_two: bool,
    pub rotation_x: f32,
    pub rotation_y: f32,
    pub rotation_z: f32,
    pub scale: f32,
    pub swap_winding_order: bool,
    pub texture_format: &'static str,
}

impl Default for ModelProcessor {
    fn default() -> Self {
        Self {
            color_key_color: Color::MAGENTA,
            color_key_enabled: true,
            default_effect: "BasicEffect",
            generate_mipmaps: true,
            generate_tangent_frames: false,
            premultiply_texture_alpha: true,
            premultiply_vertex_colors: true,
            resize_textures_to_power_of_two: false,
            rotation_x: 0.0,
            rotation_y: 0.0,
            rotation_z: 0.0,
            scale: 1.0,
            swap_winding_order: false,
            texture_format: "Compressed",
        }
    }
}

impl ProcessorInstance for ModelProcessor {
    fn input_type(&self) -> String {
        "NodeContent".to_string()
    }

    fn properties(&self) -> Vec<PropertyInfo> {
        let effects = [
            "BasicEffect",
            "SkinnedEffect",
            "EnvironmentMapEffect",
            "DualTextureEffect",
            "AlphaTestEffect",
        ];

        vec![
            PropertyInfo::new("ColorKeyColor", PropertyValue::Color(self.color_key_color))
                .with_display_name("Color Key Color"),
            PropertyInfo::new("ColorKeyEnabled", PropertyValue::Bool(self.color_key_enabled))
                .with_display_name("Color Key Enabled"),
            PropertyInfo::new(
                "DefaultEffect",
                PropertyValue::enumeration(self.default_effect, effects),
            )
            .with_display_name("Default Effect"),
            PropertyInfo::new("GenerateMipmaps", PropertyValue::Bool(self.generate_mipmaps))
                .with_display_name("Generate Mipmaps"),
            PropertyInfo::new(
                "GenerateTangentFrames",
                PropertyValue::Bool(self.generate_tangent_frames),
            )
            .with_display_name("Generate Tangent Frames"),
            PropertyInfo::new(
                "PremultiplyTextureAlpha",
                PropertyValue::Bool(self.premultiply_texture_alpha),
            )
            .with_display_name("Premultiply Texture Alpha"),
            PropertyInfo::new(
                "PremultiplyVertexColors",
                PropertyValue::Bool(self.premultiply_vertex_colors),
            )
            .with_display_name("Premultiply Vertex Colors"),
            PropertyInfo::new(
                "ResizeTexturesToPowerOfTwo",
                PropertyValue::Bool(self.resize_textures_to_power_of_two),
            )
            .with_display_name("Resize Textures to Power of Two"),
            PropertyInfo::new("RotationX", PropertyValue::Float(self.rotation_x))
                .with_display_name("X Axis Rotation"),
            PropertyInfo::new("RotationY", PropertyValue::Float(self.rotation_y))
                .with_display_name("Y Axis Rotation"),
            PropertyInfo::new("RotationZ", PropertyValue::Float(self.rotation_z))
                .with_display_name("Z Axis Rotation"),
            PropertyInfo::new("Scale", PropertyValue::Float(self.scale)),
            PropertyInfo::new("SwapWindingOrder", PropertyValue::Bool(self.swap_winding_order))
                .with_display_name("Swap Winding Order"),
            PropertyInfo::new("TextureFormat", texture_format(self.texture_format))
                .with_display_name("Texture Format"),
            // Scene identity is set by the importer, not by users
            PropertyInfo::new("Identity", PropertyValue::String(String::new())).hidden(),
        ]
    }
}

/// Passes imported objects through unchanged
#[derive(Debug, Clone, Default)]
pub struct PassThroughProcessor;

impl ProcessorInstance for PassThroughProcessor {
    fn input_type(&self) -> String {
        "Object".to_string()
    }

    fn properties(&self) -> Vec<PropertyInfo> {
        Vec::new()
    }
}
