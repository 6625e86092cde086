//! Built-in track presets
//!
//! Each preset builds a fresh `TrackPath`; the stadium comes straight from
//! the rounded-rectangle factory, the other shapes are smooth closed
//! Catmull-Rom curves over hand-placed control polygons.

use openlap_core::{TrackPath, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackPreset {
    Stadium,
    ChicaneHairpin,
    GpVaried,
}

impl TrackPreset {
    pub const ALL: [TrackPreset; 3] = [
        TrackPreset::Stadium,
        TrackPreset::ChicaneHairpin,
        TrackPreset::GpVaried,
    ];

    /// Display name for HUDs and logs.
    pub fn name(self) -> &'static str {
        match self {
            TrackPreset::Stadium => "Stadium",
            TrackPreset::ChicaneHairpin => "Chicane+Hairpin",
            TrackPreset::GpVaried => "GP Varied (Esses+Carousel)",
        }
    }

    /// The next preset in display order, wrapping around. Handy for a
    /// single-key toggle in a consumer UI.
    pub fn next(self) -> TrackPreset {
        match self {
            TrackPreset::Stadium => TrackPreset::ChicaneHairpin,
            TrackPreset::ChicaneHairpin => TrackPreset::GpVaried,
            TrackPreset::GpVaried => TrackPreset::Stadium,
        }
    }

    /// Build the preset's geometry.
    pub fn build(self) -> TrackPath {
        match self {
            TrackPreset::Stadium => TrackPath::stadium(250.0, 80.0, 14),

            TrackPreset::ChicaneHairpin => {
                // Right vertical -> chicane -> long top -> hairpin -> return
                let ctrl = [
                    Vec2::new(150.0, -60.0),
                    Vec2::new(150.0, 60.0),
                    Vec2::new(40.0, 80.0),
                    Vec2::new(-10.0, 60.0),
                    Vec2::new(-40.0, 30.0),
                    Vec2::new(-120.0, 30.0),
                    Vec2::new(-160.0, 0.0),
                    Vec2::new(-150.0, -60.0),
                    Vec2::new(-120.0, -100.0),
                    Vec2::new(-60.0, -110.0),
                    Vec2::new(40.0, -90.0),
                    Vec2::new(120.0, -80.0),
                ];
                TrackPath::from_closed_catmull_rom(&ctrl, 28)
            }

            TrackPreset::GpVaried => {
                // Bottom straight into flowing esses, then a sweeping
                // carousel back to the start
                let ctrl = [
                    Vec2::new(200.0, -100.0),
                    Vec2::new(220.0, -40.0),
                    Vec2::new(180.0, 20.0),
                    Vec2::new(120.0, 60.0),
                    Vec2::new(60.0, 100.0),
                    Vec2::new(0.0, 60.0),
                    Vec2::new(-60.0, 20.0),
                    Vec2::new(-120.0, 50.0),
                    Vec2::new(-180.0, 40.0),
                    Vec2::new(-220.0, 0.0),
                    Vec2::new(-200.0, -60.0),
                    Vec2::new(-140.0, -120.0),
                    Vec2::new(-60.0, -150.0),
                    Vec2::new(40.0, -140.0),
                    Vec2::new(120.0, -120.0),
                    Vec2::new(180.0, -110.0),
                ];
                TrackPath::from_closed_catmull_rom(&ctrl, 30)
            }
        }
    }
}

impl Default for TrackPreset {
    fn default() -> Self {
        TrackPreset::Stadium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_builds_a_nonempty_loop() {
        for preset in TrackPreset::ALL {
            let path = preset.build();
            assert!(!path.is_empty(), "{} should build", preset.name());
            assert!(path.length() > 100.0, "{} is implausibly short", preset.name());
        }
    }

    #[test]
    fn test_next_cycles_through_all_presets() {
        let mut p = TrackPreset::Stadium;
        let mut seen = Vec::new();
        for _ in 0..TrackPreset::ALL.len() {
            seen.push(p);
            p = p.next();
        }
        assert_eq!(p, TrackPreset::Stadium);
        assert_eq!(seen, TrackPreset::ALL.to_vec());
    }
}
