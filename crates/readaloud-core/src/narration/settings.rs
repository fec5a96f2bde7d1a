use std::ops::RangeInclusive;

use crate::config::NarrationConfig;

/// A narration parameter adjustable while listening
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    Rate,
    Volume,
    Pitch,
}

impl SettingKind {
    /// Accepted range, matching the player's sliders
    pub fn range(self) -> RangeInclusive<f32> {
        match self {
            SettingKind::Rate => 0.5..=2.0,
            SettingKind::Volume => 0.0..=1.0,
            SettingKind::Pitch => 0.5..=2.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SettingKind::Rate => "Speed",
            SettingKind::Volume => "Volume",
            SettingKind::Pitch => "Pitch",
        }
    }
}

/// Speech parameters applied to the next utterance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NarrationSettings {
    pub rate: f32,
    pub volume: f32,
    pub pitch: f32,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            rate: 1.0,
            volume: 1.0,
            pitch: 1.0,
        }
    }
}

impl NarrationSettings {
    /// Keyboard adjustment step
    pub const STEP: f32 = 0.1;

    pub fn from_config(config: &NarrationConfig) -> Self {
        Self::default()
            .with(SettingKind::Rate, config.rate)
            .with(SettingKind::Volume, config.volume)
            .with(SettingKind::Pitch, config.pitch)
    }

    pub fn get(&self, kind: SettingKind) -> f32 {
        match kind {
            SettingKind::Rate => self.rate,
            SettingKind::Volume => self.volume,
            SettingKind::Pitch => self.pitch,
        }
    }

    /// Copy with one value replaced, clamped to its range
    ///
    /// NaN leaves the current value in place.
    pub fn with(mut self, kind: SettingKind, value: f32) -> Self {
        if value.is_nan() {
            return self;
        }
        let range = kind.range();
        let value = value.clamp(*range.start(), *range.end());
        match kind {
            SettingKind::Rate => self.rate = value,
            SettingKind::Volume => self.volume = value,
            SettingKind::Pitch => self.pitch = value,
        }
        self
    }

    /// Copy moved by `steps` increments of `STEP`, rounded to one decimal
    pub fn stepped(self, kind: SettingKind, steps: i32) -> Self {
        let raw = self.get(kind) + steps as f32 * Self::STEP;
        self.with(kind, (raw * 10.0).round() / 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_are_clamped() {
        let settings = NarrationSettings::default()
            .with(SettingKind::Rate, 5.0)
            .with(SettingKind::Volume, -1.0)
            .with(SettingKind::Pitch, 0.1);
        assert_eq!(settings.rate, 2.0);
        assert_eq!(settings.volume, 0.0);
        assert_eq!(settings.pitch, 0.5);
    }

    #[test]
    fn test_nan_is_ignored() {
        let settings = NarrationSettings::default().with(SettingKind::Rate, f32::NAN);
        assert_eq!(settings.rate, 1.0);
    }

    #[test]
    fn test_stepping_rounds_to_one_decimal() {
        let mut settings = NarrationSettings::default();
        for _ in 0..3 {
            settings = settings.stepped(SettingKind::Volume, -1);
        }
        assert_eq!(settings.volume, 0.7);

        settings = settings.stepped(SettingKind::Volume, 10);
        assert_eq!(settings.volume, 1.0);

        settings = settings.stepped(SettingKind::Rate, 2);
        assert_eq!(settings.rate, 1.2);
    }

    #[test]
    fn test_from_config_clamps() {
        let config = NarrationConfig {
            rate: 9.0,
            volume: 0.5,
            ..Default::default()
        };
        let settings = NarrationSettings::from_config(&config);
        assert_eq!(settings.rate, 2.0);
        assert_eq!(settings.volume, 0.5);
        assert_eq!(settings.pitch, 1.0);
    }
}
