use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::DataError;

/// Climate series the visualization blends between scenarios.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Parameter {
    Temperature,
    Co2,
    Ice,
    Balance,
    Precipitation,
}

impl Parameter {
    pub const ALL: [Parameter; 5] = [
        Parameter::Temperature,
        Parameter::Co2,
        Parameter::Ice,
        Parameter::Balance,
        Parameter::Precipitation,
    ];

    /// Series published to the state bus every frame.
    pub const PUBLISHED: [Parameter; 3] = [Parameter::Co2, Parameter::Balance, Parameter::Temperature];

    pub const fn as_str(self) -> &'static str {
        match self {
            Parameter::Temperature => "temperature",
            Parameter::Co2 => "co2",
            Parameter::Ice => "ice",
            Parameter::Balance => "balance",
            Parameter::Precipitation => "precipitation",
        }
    }
}

/// Named per-year series. Extra series (`year`, ...) are carried along.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    series: BTreeMap<String, Vec<f64>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, name: &str, values: Vec<f64>) -> Self {
        self.series.insert(name.to_string(), values);
        self
    }

    pub fn get(&self, parameter: Parameter) -> Option<&[f64]> {
        self.series_by_name(parameter.as_str())
    }

    pub fn get_mut(&mut self, parameter: Parameter) -> Option<&mut Vec<f64>> {
        self.series.get_mut(parameter.as_str())
    }

    pub fn series_by_name(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(Vec::as_slice)
    }

    pub fn value(&self, parameter: Parameter, index: usize) -> Option<f64> {
        self.get(parameter)?.get(index).copied()
    }

    pub fn contains(&self, parameter: Parameter) -> bool {
        self.series.contains_key(parameter.as_str())
    }

    /// Longest series length.
    pub fn len(&self) -> usize {
        self.series.values().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Two immutable baseline projections plus an optional precomputed blend.
/// Source files may use the `rcp2p6` / `rcp8p5` names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioData {
    #[serde(rename = "scenarioA", alias = "rcp2p6")]
    pub scenario_a: Dataset,
    #[serde(rename = "scenarioB", alias = "rcp8p5")]
    pub scenario_b: Dataset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<Dataset>,
}

impl ScenarioData {
    pub fn new(scenario_a: Dataset, scenario_b: Dataset) -> Self {
        Self {
            scenario_a,
            scenario_b,
            active: None,
        }
    }

    pub fn from_json_str(source: &str) -> Result<Self, DataError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Parameters present in scenario A, each checked against scenario B.
    pub fn tracked_parameters(&self) -> Result<Vec<Parameter>, DataError> {
        let mut tracked = Vec::new();
        for parameter in Parameter::ALL {
            let Some(a) = self.scenario_a.get(parameter) else {
                continue;
            };
            let b = self
                .scenario_b
                .get(parameter)
                .ok_or(DataError::MissingParameter {
                    parameter: parameter.as_str(),
                    scenario: 'B',
                })?;
            if a.len() != b.len() {
                return Err(DataError::LengthMismatch {
                    parameter: parameter.as_str(),
                    a: a.len(),
                    b: b.len(),
                });
            }
            tracked.push(parameter);
        }
        if tracked.is_empty() {
            return Err(DataError::NoParameters);
        }
        Ok(tracked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_source_scenario_names() {
        let data = ScenarioData::from_json_str(
            r#"{
                "rcp2p6": {"year": [1850, 1851], "temperature": [13.0, 13.1]},
                "rcp8p5": {"year": [1850, 1851], "temperature": [13.0, 13.4]}
            }"#,
        )
        .unwrap();
        assert_eq!(data.scenario_b.value(Parameter::Temperature, 1), Some(13.4));
        assert_eq!(data.scenario_a.series_by_name("year"), Some(&[1850.0, 1851.0][..]));
        assert!(data.active.is_none());
        assert_eq!(data.tracked_parameters().unwrap(), vec![Parameter::Temperature]);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let data = ScenarioData::new(
            Dataset::new().with_series("co2", vec![1.0, 2.0]),
            Dataset::new().with_series("co2", vec![1.0]),
        );
        assert!(matches!(
            data.tracked_parameters(),
            Err(DataError::LengthMismatch { parameter: "co2", a: 2, b: 1 })
        ));
    }

    #[test]
    fn parameter_missing_from_b_is_rejected() {
        let data = ScenarioData::new(
            Dataset::new().with_series("ice", vec![1.0]),
            Dataset::new(),
        );
        assert!(matches!(
            data.tracked_parameters(),
            Err(DataError::MissingParameter { parameter: "ice", scenario: 'B' })
        ));
    }

    #[test]
    fn no_tracked_parameters_is_an_error() {
        let data = ScenarioData::new(
            Dataset::new().with_series("year", vec![1850.0]),
            Dataset::new().with_series("year", vec![1850.0]),
        );
        assert!(matches!(data.tracked_parameters(), Err(DataError::NoParameters)));
    }

    #[test]
    fn malformed_json_is_a_data_error() {
        assert!(matches!(
            ScenarioData::from_json_str("{\"scenarioA\": 3}"),
            Err(DataError::Json(_))
        ));
    }
}
