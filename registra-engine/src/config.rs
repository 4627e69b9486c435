//! Alignment settings from TOML
//!
//! Reads the `[alignment]` section of a machine configuration file. Every
//! key is optional; missing keys keep their defaults and other sections are
//! ignored.
//!
//! ```toml
//! [alignment]
//! scaling_tolerance = 0.05
//! shearing_tolerance = 0.05
//! board_location_tolerance = 5.0
//! board_location_units = "millimeters"
//! max_optimizer_passes = 32
//! failure_policy = "abort_run"   # or "skip_board"
//! ```

use serde::Deserialize;

use registra_core::config::{AlignmentSettings, FailurePolicy};
use registra_core::geometry::{Length, LengthUnit};
use registra_core::tolerance::Tolerances;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// TOML syntax error or a value of the wrong type
    TomlParse,
    /// A tolerance is negative or not finite
    InvalidTolerance,
}

impl From<toml::de::Error> for ConfigError {
    fn from(_: toml::de::Error) -> Self {
        ConfigError::TomlParse
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::TomlParse => write!(f, "invalid alignment configuration"),
            ConfigError::InvalidTolerance => {
                write!(f, "tolerances must be finite and not negative")
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    alignment: AlignmentSection,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct AlignmentSection {
    scaling_tolerance: f64,
    shearing_tolerance: f64,
    board_location_tolerance: f64,
    board_location_units: LengthUnit,
    max_optimizer_passes: u16,
    failure_policy: FailurePolicy,
}

impl Default for AlignmentSection {
    fn default() -> Self {
        let defaults = AlignmentSettings::default();
        let tolerances = defaults.tolerances;
        Self {
            scaling_tolerance: tolerances.scaling_tolerance,
            shearing_tolerance: tolerances.shearing_tolerance,
            board_location_tolerance: tolerances.board_location_tolerance.value,
            board_location_units: tolerances.board_location_tolerance.units,
            max_optimizer_passes: defaults.max_optimizer_passes,
            failure_policy: defaults.failure_policy,
        }
    }
}

fn valid_tolerance(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Parse alignment settings from a TOML document
pub fn parse_config(input: &str) -> Result<AlignmentSettings, ConfigError> {
    let file: ConfigFile = toml::from_str(input)?;
    let section = file.alignment;

    let tolerances = [
        section.scaling_tolerance,
        section.shearing_tolerance,
        section.board_location_tolerance,
    ];
    if !tolerances.iter().all(|&t| valid_tolerance(t)) {
        warn!("Rejecting alignment tolerances outside [0, inf)");
        return Err(ConfigError::InvalidTolerance);
    }

    let settings = AlignmentSettings {
        tolerances: Tolerances {
            scaling_tolerance: section.scaling_tolerance,
            shearing_tolerance: section.shearing_tolerance,
            board_location_tolerance: Length::new(
                section.board_location_tolerance,
                section.board_location_units,
            ),
        },
        max_optimizer_passes: section.max_optimizer_passes,
        failure_policy: section.failure_policy,
    };
    log_settings(&settings);
    Ok(settings)
}

fn log_settings(settings: &AlignmentSettings) {
    let t = &settings.tolerances;
    debug!("Board scaling tolerance = {}", t.scaling_tolerance);
    debug!("Board shearing tolerance = {}", t.shearing_tolerance);
    debug!(
        "Board location tolerance = {} mm",
        t.board_location_tolerance.to_millimeters()
    );
    debug!(
        "Optimizer passes = {}, failure policy = {:?}",
        settings.max_optimizer_passes,
        settings.failure_policy
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        assert_eq!(parse_config("").unwrap(), AlignmentSettings::default());
    }

    #[test]
    fn test_other_sections_ignored() {
        let toml = r#"
            [machine]
            name = "bench"

            [alignment]
            scaling_tolerance = 0.02
        "#;
        let settings = parse_config(toml).unwrap();
        assert_relative_eq!(settings.tolerances.scaling_tolerance, 0.02);
        assert_relative_eq!(settings.tolerances.shearing_tolerance, 0.05);
    }

    #[test]
    fn test_full_override() {
        let toml = r#"
            [alignment]
            scaling_tolerance = 0.01
            shearing_tolerance = 0.02
            board_location_tolerance = 0.25
            board_location_units = "inches"
            max_optimizer_passes = 4
            failure_policy = "skip_board"
        "#;
        let settings = parse_config(toml).unwrap();
        assert_relative_eq!(settings.tolerances.shearing_tolerance, 0.02);
        assert_relative_eq!(
            settings.tolerances.board_location_tolerance.to_millimeters(),
            6.35,
            epsilon = 1e-12
        );
        assert_eq!(settings.max_optimizer_passes, 4);
        assert_eq!(settings.failure_policy, FailurePolicy::SkipBoard);
        assert_eq!(settings.optimizer().max_passes, 4);
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let toml = "[alignment]\nscaling_tolerance = -0.1\n";
        assert_eq!(parse_config(toml), Err(ConfigError::InvalidTolerance));
    }

    #[test]
    fn test_non_finite_tolerance_rejected() {
        let toml = "[alignment]\nboard_location_tolerance = inf\n";
        assert_eq!(parse_config(toml), Err(ConfigError::InvalidTolerance));
        let toml = "[alignment]\nshearing_tolerance = nan\n";
        assert_eq!(parse_config(toml), Err(ConfigError::InvalidTolerance));
    }

    #[test]
    fn test_bad_values_are_parse_errors() {
        assert_eq!(
            parse_config("[alignment]\nfailure_policy = \"retry\"\n"),
            Err(ConfigError::TomlParse)
        );
        assert_eq!(
            parse_config("[alignment]\nscaling_tolerance = \"tight\"\n"),
            Err(ConfigError::TomlParse)
        );
        assert_eq!(parse_config("[alignment"), Err(ConfigError::TomlParse));
    }

    proptest! {
        #[test]
        fn prop_valid_tolerances_are_kept(
            scaling in 0.0f64..1.0,
            shearing in 0.0f64..1.0,
            location in 0.0f64..50.0,
        ) {
            let toml = std::format!(
                "[alignment]\nscaling_tolerance = {:?}\nshearing_tolerance = {:?}\nboard_location_tolerance = {:?}\n",
                scaling, shearing, location
            );
            let settings = parse_config(&toml).unwrap();
            prop_assert_eq!(settings.tolerances.scaling_tolerance, scaling);
            prop_assert_eq!(settings.tolerances.shearing_tolerance, shearing);
            prop_assert_eq!(settings.tolerances.board_location_tolerance.value, location);
        }

        #[test]
        fn prop_negative_tolerances_are_rejected(value in -100.0f64..-1e-6) {
            let toml = std::format!("[alignment]\nshearing_tolerance = {:?}\n", value);
            prop_assert_eq!(parse_config(&toml), Err(ConfigError::InvalidTolerance));
        }
    }
}
