//! Icon colors for blogs

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

const PALETTE: [&str; 12] = [
    "#ef5350", "#ec407a", "#ab47bc", "#7e57c2", "#5c6bc0", "#42a5f5", "#26a69a", "#66bb6a",
    "#9ccc65", "#ffa726", "#ff7043", "#8d6e63",
];

/// Hex color string, e.g. `#26a69a`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IconColor(String);

impl IconColor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for IconColor {
    fn default() -> Self {
        pick_color(None)
    }
}

impl From<&str> for IconColor {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for IconColor {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for IconColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of new icon colors
pub trait ColorPicker: Send + Sync {
    fn pick(&self, excluding: Option<&IconColor>) -> IconColor;
}

impl<F> ColorPicker for F
where
    F: Fn(Option<&IconColor>) -> IconColor + Send + Sync,
{
    fn pick(&self, excluding: Option<&IconColor>) -> IconColor {
        self(excluding)
    }
}

/// Picks uniformly from the built-in palette
#[derive(Debug, Clone, Copy, Default)]
pub struct PaletteColorPicker;

impl ColorPicker for PaletteColorPicker {
    fn pick(&self, excluding: Option<&IconColor>) -> IconColor {
        pick_color(excluding)
    }
}

/// Random palette color other than `excluding`
pub fn pick_color(excluding: Option<&IconColor>) -> IconColor {
    let mut candidates: Vec<&str> = PALETTE
        .iter()
        .copied()
        .filter(|color| excluding.map_or(true, |ex| ex.as_str() != *color))
        .collect();
    if candidates.is_empty() {
        candidates = PALETTE.to_vec();
    }

    let chosen = candidates
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(PALETTE[0]);
    IconColor::from(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_from_palette() {
        for _ in 0..50 {
            let color = pick_color(None);
            assert!(PALETTE.contains(&color.as_str()));
        }
    }

    #[test]
    fn never_returns_excluded_color() {
        let excluded = IconColor::from(PALETTE[3]);
        for _ in 0..200 {
            assert_ne!(pick_color(Some(&excluded)), excluded);
        }
    }

    #[test]
    fn closures_are_pickers() {
        let fixed = |_: Option<&IconColor>| IconColor::from("#000000");
        assert_eq!(fixed.pick(None).as_str(), "#000000");
    }
}
