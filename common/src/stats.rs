use crate::{log::LogSnapshot, types::TemperatureUnit};

/// Readings beyond these bounds are treated as serial noise.
pub const PLAUSIBLE_HIGH: f64 = 200.0;
pub const PLAUSIBLE_LOW: f64 = -200.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub max: f64,
    pub min: f64,
    pub average: f64,
}

impl Summary {
    pub fn in_unit(self, unit: TemperatureUnit) -> Self {
        Self {
            max: unit.convert(self.max),
            min: unit.convert(self.min),
            average: unit.convert(self.average),
        }
    }
}

pub fn max(snapshot: &LogSnapshot) -> Option<f64> {
    snapshot
        .readings()
        .filter(|value| (PLAUSIBLE_LOW..=PLAUSIBLE_HIGH).contains(value))
        .reduce(f64::max)
}

pub fn min(snapshot: &LogSnapshot) -> Option<f64> {
    snapshot
        .readings()
        .filter(|value| (PLAUSIBLE_LOW..=PLAUSIBLE_HIGH).contains(value))
        .reduce(f64::min)
}

pub fn average(snapshot: &LogSnapshot) -> Option<f64> {
    let (sum, count) = snapshot
        .readings()
        .filter(|value| (PLAUSIBLE_LOW..=PLAUSIBLE_HIGH).contains(value))
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));

    (count > 0).then(|| sum / count as f64)
}

pub fn summary(snapshot: &LogSnapshot) -> Option<Summary> {
    Some(Summary {
        max: max(snapshot)?,
        min: min(snapshot)?,
        average: average(snapshot)?,
    })
}
