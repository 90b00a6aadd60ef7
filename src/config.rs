use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::camera::Camera;
use crate::engine::{AnimationConfig, RenderSettings};
use crate::types::{Brush, Color, NamedColor, Style};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub key_bindings: KeyBindings,
    pub camera: Camera,
    pub render: RenderSettings,
    pub display: DisplayConfig,
    pub glyphs: Glyphs,
    pub animation: AnimationConfig,
    pub input: InputConfig,
    pub ground: GroundConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub quit: String,
    pub toggle_culling: String,
    pub toggle_ground: String,
    pub toggle_depth_test: String,
    pub toggle_fill: String,
    pub rotate_left: String,
    pub rotate_right: String,
    pub rotate_up: String,
    pub rotate_down: String,
    pub pan_left: String,
    pub pan_right: String,
    pub pan_up: String,
    pub pan_down: String,
    pub zoom_in: String,
    pub zoom_out: String,
    pub reset_camera: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        KeyBindings {
            quit: "q".into(),
            toggle_culling: "c".into(),
            toggle_ground: "f".into(),
            toggle_depth_test: "z".into(),
            toggle_fill: "w".into(),
            rotate_left: "Left".into(),
            rotate_right: "Right".into(),
            rotate_up: "Up".into(),
            rotate_down: "Down".into(),
            pan_left: "Shift-Left".into(),
            pan_right: "Shift-Right".into(),
            pan_up: "Shift-Up".into(),
            pan_down: "Shift-Down".into(),
            zoom_in: "+".into(),
            zoom_out: "-".into(),
            reset_camera: "r".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub target_fps: u32,
    /// Character cell width divided by height.
    pub cell_aspect: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            target_fps: 30,
            cell_aspect: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Glyphs {
    pub edge: Brush,
    pub fill: Brush,
    pub ground: Brush,
}

impl Default for Glyphs {
    fn default() -> Self {
        Glyphs {
            edge: Brush::new('@', Style::fg(Color::Named(NamedColor::White))),
            fill: Brush::plain(' '),
            ground: Brush::new('.', Style::fg(Color::Named(NamedColor::Blue))),
        }
    }
}

/// How far one unit of input moves the camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Degrees per cell of mouse drag.
    pub drag_rotate: f64,
    /// World units per cell of middle-button drag.
    pub drag_pan: f64,
    /// Zoom change per scroll notch.
    pub scroll_zoom: f64,
    pub key_rotate: f64,
    pub key_pan: f64,
    pub key_zoom: f64,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            drag_rotate: 2.0,
            drag_pan: 0.1,
            scroll_zoom: 0.5,
            key_rotate: 5.0,
            key_pan: 0.25,
            key_zoom: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub y: f64,
    pub half_extent: f64,
}

impl Default for GroundConfig {
    fn default() -> Self {
        GroundConfig {
            y: 0.0,
            half_extent: 10.0,
        }
    }
}

impl ViewerConfig {
    /// Load from `path` if given (errors are fatal), otherwise from the
    /// per-user config file (missing or invalid falls back to defaults).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            return serde_json::from_str(&json)
                .with_context(|| format!("Failed to parse {}", path.display()));
        }

        let config_path = Self::config_path();
        Ok(match std::fs::read_to_string(&config_path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(config) => config,
                Err(e) => {
                    warn!("invalid config {} ({e}), using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        })
    }

    fn config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        let mut path = PathBuf::from(home);
        path.push(".config");
        path.push("ascii3d");
        path.push("config.json");
        path
    }
}

/// Check whether a crossterm `KeyEvent` matches a binding string from config.
pub fn matches_binding(binding: &str, event: &KeyEvent) -> bool {
    if let Some(rest) = binding.strip_prefix("Ctrl-") {
        if !event.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }
        return rest
            .chars()
            .next()
            .is_some_and(|c| event.code == KeyCode::Char(c));
    }

    if event.modifiers.contains(KeyModifiers::CONTROL)
        || event.modifiers.contains(KeyModifiers::ALT)
    {
        return false;
    }

    // Shift is part of named-key bindings ("Shift-Left") but not of
    // characters: "+" usually arrives with Shift held.
    let (shift, name) = match binding.strip_prefix("Shift-") {
        Some(rest) => (true, rest),
        None => (false, binding),
    };
    let named = match name {
        "Right" => Some(KeyCode::Right),
        "Left" => Some(KeyCode::Left),
        "Up" => Some(KeyCode::Up),
        "Down" => Some(KeyCode::Down),
        "Enter" => Some(KeyCode::Enter),
        "Esc" => Some(KeyCode::Esc),
        "Space" => Some(KeyCode::Char(' ')),
        "Tab" => Some(KeyCode::Tab),
        "Home" => Some(KeyCode::Home),
        "End" => Some(KeyCode::End),
        s => s
            .strip_prefix('F')
            .and_then(|n| n.parse::<u8>().ok())
            .map(KeyCode::F),
    };

    match named {
        Some(code) => {
            event.code == code && event.modifiers.contains(KeyModifiers::SHIFT) == shift
        }
        None => name
            .chars()
            .next()
            .is_some_and(|c| event.code == KeyCode::Char(c)),
    }
}
