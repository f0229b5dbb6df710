use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Common slider metadata so bounds live in one place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl SliderRange {
    pub const fn new(min: f32, max: f32, step: f32) -> Self {
        Self { min, max, step }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

// Run controls
pub const BICLIQUE_SIZE_RANGE: SliderRange =
    SliderRange::new(1.0, 12.0, 1.0);
pub const ITERATION_RANGE: SliderRange =
    SliderRange::new(1.0, 1000.0, 1.0);
pub const STEP_PAUSE_MS_RANGE: SliderRange =
    SliderRange::new(0.0, 1000.0, 10.0);

// Visual ranges
pub const NODE_RADIUS_RANGE: SliderRange =
    SliderRange::new(2.0, 32.0, 0.5);
pub const LABEL_FONT_RANGE: SliderRange =
    SliderRange::new(8.0, 32.0, 1.0);
pub const HIGHLIGHT_WIDTH_RANGE: SliderRange =
    SliderRange::new(1.0, 12.0, 0.5);

// Layout ranges
pub const CIRCULAR_BASE_RADIUS_RANGE: SliderRange =
    SliderRange::new(60.0, 400.0, 5.0);

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("cannot read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Everything the viewer can be configured with. Every field has a
/// default, so a settings file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub sampler: SamplerSettings,
    pub run: RunSettings,
    pub target: NodeVisualSettings,
    pub biclique: NodeVisualSettings,
    pub edges: EdgeSettings,
    pub layout: LayoutSettings,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            sampler: SamplerSettings::default(),
            run: RunSettings::default(),
            target: NodeVisualSettings::target_defaults(),
            biclique: NodeVisualSettings::biclique_defaults(),
            edges: EdgeSettings::default(),
            layout: LayoutSettings::default(),
        }
    }
}

impl ViewerSettings {
    /// Read settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "settings.load.missing");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerSettings {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl SamplerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub step_pause_ms: u64,
    pub default_biclique_size: i64,
    pub default_iterations: u32,
}

impl RunSettings {
    pub fn step_pause(&self) -> Duration {
        Duration::from_millis(self.step_pause_ms)
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            step_pause_ms: 100,
            default_biclique_size: 3,
            default_iterations: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeVisualSettings {
    pub node_radius: f32,
    pub label_gap: f32,
    pub label_font_size: f32,
    pub show_labels: bool,
}

impl Default for NodeVisualSettings {
    fn default() -> Self {
        Self::target_defaults()
    }
}

impl NodeVisualSettings {
    pub fn target_defaults() -> Self {
        Self {
            node_radius: 6.0,
            label_gap: 10.0,
            label_font_size: 14.0,
            show_labels: true,
        }
    }

    pub fn biclique_defaults() -> Self {
        Self {
            node_radius: 8.0,
            label_gap: 8.0,
            label_font_size: 14.0,
            show_labels: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeSettings {
    pub width: f32,
    pub highlight_width: f32,
}

impl Default for EdgeSettings {
    fn default() -> Self {
        Self {
            width: 1.5,
            highlight_width: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub circular_base_radius: f32,
    pub circular_radius_per_node: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            circular_base_radius: 120.0,
            circular_radius_per_node: 6.0,
        }
    }
}
