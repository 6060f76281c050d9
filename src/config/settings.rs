//! Global build settings

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Global settings at the top of the manifest.
///
/// Field order is the persisted key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManifestSettings {
    /// Directory every content path is relative to
    pub root: String,

    /// Directory for intermediate build state
    pub intermediate_dir: String,

    /// Directory receiving built and copied content
    pub output_dir: String,

    /// Target platform
    pub platform: TargetPlatform,

    /// Target graphics profile
    pub graphics_profile: GraphicsProfile,

    /// Whether built content is compressed
    #[serde(deserialize_with = "bool_or_string")]
    pub compress: bool,

    /// Plugin module references, in load order
    pub references: Vec<String>,
}

impl Default for ManifestSettings {
    fn default() -> Self {
        Self {
            root: String::new(),
            intermediate_dir: "obj".to_string(),
            output_dir: "bin".to_string(),
            platform: TargetPlatform::default(),
            graphics_profile: GraphicsProfile::default(),
            compress: false,
            references: Vec::new(),
        }
    }
}

/// Accept `true`, `false`, `"true"` and `"false"`
pub(crate) fn bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        BoolOrString::String(s) if s.eq_ignore_ascii_case("false") || s.is_empty() => Ok(false),
        BoolOrString::String(s) => Err(serde::de::Error::custom(format!(
            "expected \"true\" or \"false\", found {s:?}"
        ))),
    }
}

/// Platform the content is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TargetPlatform {
    Windows,
    Xbox360,
    #[serde(rename = "iOS")]
    IOS,
    Android,
    #[default]
    DesktopGL,
    MacOSX,
    WindowsStoreApp,
    NativeClient,
    PlayStationMobile,
    WindowsPhone8,
    RaspberryPi,
    PlayStation4,
    PSVita,
    XboxOne,
    Switch,
    Web,
}

impl TargetPlatform {
    pub const ALL: [TargetPlatform; 16] = [
        TargetPlatform::Windows,
        TargetPlatform::Xbox360,
        TargetPlatform::IOS,
        TargetPlatform::Android,
        TargetPlatform::DesktopGL,
        TargetPlatform::MacOSX,
        TargetPlatform::WindowsStoreApp,
        TargetPlatform::NativeClient,
        TargetPlatform::PlayStationMobile,
        TargetPlatform::WindowsPhone8,
        TargetPlatform::RaspberryPi,
        TargetPlatform::PlayStation4,
        TargetPlatform::PSVita,
        TargetPlatform::XboxOne,
        TargetPlatform::Switch,
        TargetPlatform::Web,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetPlatform::Windows => "Windows",
            TargetPlatform::Xbox360 => "Xbox360",
            TargetPlatform::IOS => "iOS",
            TargetPlatform::Android => "Android",
            TargetPlatform::DesktopGL => "DesktopGL",
            TargetPlatform::MacOSX => "MacOSX",
            TargetPlatform::WindowsStoreApp => "WindowsStoreApp",
            TargetPlatform::NativeClient => "NativeClient",
            TargetPlatform::PlayStationMobile => "PlayStationMobile",
            TargetPlatform::WindowsPhone8 => "WindowsPhone8",
            TargetPlatform::RaspberryPi => "RaspberryPi",
            TargetPlatform::PlayStation4 => "PlayStation4",
            TargetPlatform::PSVita => "PSVita",
            TargetPlatform::XboxOne => "XboxOne",
            TargetPlatform::Switch => "Switch",
            TargetPlatform::Web => "Web",
        }
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetPlatform::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown platform: {s}"))
    }
}

/// Graphics feature level the content targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GraphicsProfile {
    Reach,
    #[default]
    HiDef,
}

impl fmt::Display for GraphicsProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsProfile::Reach => f.write_str("Reach"),
            GraphicsProfile::HiDef => f.write_str("HiDef"),
        }
    }
}

impl FromStr for GraphicsProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("reach") {
            Ok(GraphicsProfile::Reach)
        } else if s.eq_ignore_ascii_case("hidef") {
            Ok(GraphicsProfile::HiDef)
        } else {
            Err(format!("unknown graphics profile: {s}"))
        }
    }
}
