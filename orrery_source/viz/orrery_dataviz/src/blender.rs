use log::debug;

use crate::{DataError, Dataset, Parameter, ScenarioData};

/// Owns the two baselines and the derived `active` dataset.
pub struct ScenarioBlender {
    scenario_a: Dataset,
    scenario_b: Dataset,
    active: Dataset,
    tracked: Vec<Parameter>,
    ratio: Option<f64>,
    recomputations: u64,
}

impl ScenarioBlender {
    pub fn new(data: ScenarioData) -> Result<Self, DataError> {
        let tracked = data.tracked_parameters()?;
        let ScenarioData {
            scenario_a,
            scenario_b,
            active,
        } = data;

        // A supplied `active` is only trusted if it has every tracked series.
        let active = active
            .filter(|active| {
                tracked.iter().all(|p| {
                    active.get(*p).map(<[f64]>::len) == scenario_a.get(*p).map(<[f64]>::len)
                })
            })
            .unwrap_or_else(|| scenario_a.clone());

        Ok(Self {
            scenario_a,
            scenario_b,
            active,
            tracked,
            ratio: None,
            recomputations: 0,
        })
    }

    /// `active = B * ratio + A * (1 - ratio)` for every tracked series. An
    /// unchanged ratio is a no-op. Returns whether anything was recomputed.
    pub fn set_active_data(&mut self, ratio: f64) -> bool {
        let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 1.0 };
        if self.ratio == Some(ratio) {
            return false;
        }
        self.ratio = Some(ratio);

        for &parameter in &self.tracked {
            let (Some(a), Some(b), Some(out)) = (
                self.scenario_a.get(parameter),
                self.scenario_b.get(parameter),
                self.active.get_mut(parameter),
            ) else {
                continue;
            };
            out.clear();
            out.extend(a.iter().zip(b).map(|(a, b)| b * ratio + a * (1.0 - ratio)));
        }
        self.recomputations += 1;
        debug!("[dataviz] active data blended at ratio {ratio:.3}");
        true
    }

    #[inline]
    pub fn ratio(&self) -> Option<f64> {
        self.ratio
    }

    #[inline]
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }

    #[inline]
    pub fn active(&self) -> &Dataset {
        &self.active
    }

    #[inline]
    pub fn scenario_a(&self) -> &Dataset {
        &self.scenario_a
    }

    #[inline]
    pub fn scenario_b(&self) -> &Dataset {
        &self.scenario_b
    }

    #[inline]
    pub fn tracked(&self) -> &[Parameter] {
        &self.tracked
    }

    /// Number of samples per series.
    pub fn len(&self) -> usize {
        self.tracked
            .first()
            .and_then(|p| self.scenario_a.get(*p))
            .map_or(0, <[f64]>::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
