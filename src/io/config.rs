use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{ConsolidateError, Result};
use crate::model::{CONFIG_VERSION, RunConfig};

/// Serialises a run configuration into its JSON document form.
pub fn encode(config: &RunConfig) -> Result<String> {
    Ok(serde_json::to_string_pretty(config)?)
}

/// Parses a JSON configuration document, rejecting newer versions.
pub fn decode(document: &str) -> Result<RunConfig> {
    let config: RunConfig = serde_json::from_str(document)?;
    if config.version > CONFIG_VERSION {
        return Err(ConsolidateError::UnsupportedVersion {
            found: config.version,
            supported: CONFIG_VERSION,
        });
    }
    Ok(config)
}

pub fn load(path: &Path) -> Result<RunConfig> {
    if !path.exists() {
        return Err(ConsolidateError::MissingInput(path.to_path_buf()));
    }
    let document = fs::read_to_string(path)?;
    let config = decode(&document)?;
    debug!(path = %path.display(), sources = config.sources.len(), "configuration loaded");
    Ok(config)
}

pub fn save(path: &Path, config: &RunConfig) -> Result<()> {
    fs::write(path, encode(config)?)?;
    debug!(path = %path.display(), sources = config.sources.len(), "configuration saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Axis, AxisMode, SourceMapping};

    fn sample() -> RunConfig {
        let mut first = SourceMapping::new("C:\\books\\north.xlsx");
        first.source_sheet = "Trial Balance".into();
        first.account_range = "'Trial Balance'!$A$2:$A$40".into();
        first.value_range = "C2:F40".into();
        first.set_axis(Axis::Entity, AxisMode::Constant, "  North Co ", "");
        first.set_axis(Axis::Department, AxisMode::Range, "", "C1:F1");
        first.set_axis(Axis::Date, AxisMode::Constant, " 2026-01-31", "");

        let mut second = SourceMapping::new("south.xlsx");
        second.source_sheet = "Jan".into();
        second.account_range = "A2:A9".into();
        second.value_range = "D2:D9".into();
        second.set_axis(Axis::Date, AxisMode::Range, "", "B1");

        RunConfig::new("consolidated.xlsx", vec![first, second])
    }

    #[test]
    fn round_trip_preserves_every_field() {
        let config = sample();
        let restored = decode(&encode(&config).unwrap()).unwrap();
        assert_eq!(restored, config);
        assert_eq!(restored.sources[0].entity_constant, "  North Co ");
        assert_eq!(restored.sources[1].source_path, "south.xlsx");
    }

    #[test]
    fn document_uses_camel_case_names() {
        let json: serde_json::Value = serde_json::from_str(&encode(&sample()).unwrap()).unwrap();
        assert_eq!(json["version"], 1);
        assert!(json["createdAtUtc"].is_string());
        assert_eq!(json["outputFileName"], "consolidated.xlsx");
        assert_eq!(json["sources"][0]["departmentMode"], "range");
        assert_eq!(json["sources"][0]["departmentRange"], "C1:F1");
        assert_eq!(json["sources"][1]["entityMode"], "blank");
    }

    #[test]
    fn missing_source_fields_take_defaults() {
        let config = decode(
            r#"{
                "version": 1,
                "createdAtUtc": "2026-01-31T08:00:00Z",
                "outputFileName": "out.xlsx",
                "sources": [{"sourcePath": "a.xlsx", "valueRange": "B2:B3"}]
            }"#,
        )
        .unwrap();

        let source = &config.sources[0];
        assert_eq!(source.value_range, "B2:B3");
        assert_eq!(source.entity_mode, AxisMode::Blank);
        assert_eq!(source.date_mode, AxisMode::Constant);
        assert!(source.account_range.is_empty());
    }

    #[test]
    fn newer_versions_are_rejected() {
        let mut config = sample();
        config.version = CONFIG_VERSION + 1;
        let err = decode(&encode(&config).unwrap()).unwrap_err();
        assert!(matches!(err, ConsolidateError::UnsupportedVersion { found: 2, .. }));
    }

    #[test]
    fn save_and_load_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let config = sample();

        save(&path, &config).unwrap();
        assert_eq!(load(&path).unwrap(), config);

        let err = load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConsolidateError::MissingInput(_)));
    }
}
