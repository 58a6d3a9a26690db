//! Palette registry and color parsing
//!
//! Loads palettes from palettes.json (embedded at compile time). The default
//! "deep" palette matches seaborn's, which is where the calm blue/green/red of
//! the convergence chart come from.
//!
//! Color properties accept either a hex string (`#RRGGBB`) or a palette
//! reference (`deep:2`).

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;

const PALETTES_JSON: &str = include_str!("../../palettes.json");

/// Global palette registry, initialized lazily on first access
pub static PALETTE_REGISTRY: LazyLock<PaletteRegistry> = LazyLock::new(|| {
    PaletteRegistry::from_json(PALETTES_JSON).unwrap_or_else(|e| {
        log::error!("Failed to load palettes.json: {}", e);
        PaletteRegistry::default()
    })
});

/// A single palette definition from palettes.json
#[derive(Debug, Clone, Deserialize)]
pub struct PaletteDefinition {
    pub name: String,
    pub colors: Vec<String>,
}

impl PaletteDefinition {
    /// Get a color by index (wraps around)
    pub fn get_color(&self, index: usize) -> [u8; 3] {
        if self.colors.is_empty() {
            return [128, 128, 128]; // Gray fallback
        }
        let idx = index % self.colors.len();
        parse_hex_color(&self.colors[idx]).unwrap_or([128, 128, 128])
    }
}

#[derive(Debug, Deserialize)]
struct PalettesFile {
    palettes: Vec<PaletteDefinition>,
}

/// Registry of all available palettes
#[derive(Debug, Clone, Default)]
pub struct PaletteRegistry {
    /// All palettes by name (lowercase keys for case-insensitive lookup)
    palettes: HashMap<String, PaletteDefinition>,
}

impl PaletteRegistry {
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        let file: PalettesFile = serde_json::from_str(json_str)?;
        let palettes = file
            .palettes
            .into_iter()
            .map(|p| (p.name.to_lowercase(), p))
            .collect();
        Ok(Self { palettes })
    }

    /// Get a palette by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&PaletteDefinition> {
        self.palettes.get(&name.to_lowercase())
    }
}

/// Parse a hex color string to RGB array
///
/// Supports `#RRGGBB`, `#RRGGBBAA` (alpha ignored), with or without `#`.
pub fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let hex = hex.trim().trim_start_matches('#');

    if hex.len() != 6 && hex.len() != 8 {
        log::warn!("Invalid hex color length '{}': {}", hex, hex.len());
        return None;
    }

    let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
    let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
    let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;

    Some([r, g, b])
}

/// Resolve a color property value: `#RRGGBB` or `palette:index`
pub fn resolve_color(value: &str) -> Option<[u8; 3]> {
    let value = value.trim();
    if let Some((palette_name, index)) = value.split_once(':') {
        let index: usize = index.trim().parse().ok()?;
        return PALETTE_REGISTRY
            .get(palette_name.trim())
            .map(|p| p.get_color(index));
    }
    parse_hex_color(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FF0000"), Some([255, 0, 0]));
        assert_eq!(parse_hex_color("#4c72b0"), Some([76, 114, 176]));
        assert_eq!(parse_hex_color("55A868"), Some([85, 168, 104]));
        // Alpha ignored
        assert_eq!(parse_hex_color("#C44E52FF"), Some([196, 78, 82]));

        assert_eq!(parse_hex_color("#FFF"), None);
        assert_eq!(parse_hex_color("GGGGGG"), None);
    }

    #[test]
    fn test_deep_palette_matches_chart_colors() {
        let deep = PALETTE_REGISTRY.get("deep").unwrap();
        assert_eq!(deep.colors.len(), 10);
        assert_eq!(deep.get_color(0), [0x4c, 0x72, 0xb0]); // calm blue
        assert_eq!(deep.get_color(2), [0x55, 0xa8, 0x68]); // calm green
        assert_eq!(deep.get_color(3), [0xc4, 0x4e, 0x52]); // calm red
        assert_eq!(deep.get_color(0), deep.get_color(10));
    }

    #[test]
    fn test_resolve_color() {
        assert_eq!(resolve_color("deep:0"), Some([0x4c, 0x72, 0xb0]));
        assert_eq!(resolve_color("MUTED:1"), Some([0xee, 0x85, 0x4a]));
        assert_eq!(resolve_color("#000000"), Some([0, 0, 0]));
        assert_eq!(resolve_color("nosuch:0"), None);
        assert_eq!(resolve_color("deep:x"), None);
    }
}
