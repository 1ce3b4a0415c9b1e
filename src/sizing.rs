//! Biomass capacity envelope from load and renewable duration curves.

use std::fmt;

use ndarray::Axis;

use crate::profiles::Profiles;

/// A duration curve: power sorted from highest to lowest, each paired with
/// the number of steps at which the series is at least that value.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationCurve {
    /// `(steps at or above, power)` pairs.
    pub points: Vec<(usize, f64)>,
}

impl DurationCurve {
    /// Builds the duration curve of `series`.
    pub fn from_series(series: &[f64]) -> Self {
        let mut points: Vec<(usize, f64)> = series
            .iter()
            .map(|&p| (series.iter().filter(|&&q| q >= p).count(), p))
            .collect();
        points.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.total_cmp(&a.1)));
        Self { points }
    }

    /// Peak value, or 0 for an empty series.
    pub fn peak(&self) -> f64 {
        self.points.first().map_or(0.0, |p| p.1)
    }

    /// Base value, or 0 for an empty series.
    pub fn base(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.1)
    }
}

/// Capacity envelope a biomass plant needs to follow total demand.
///
/// Computed once from the scaled profiles and reported; it never changes
/// the plant configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BiomassSizing {
    /// Peak total demand.
    pub max: f64,
    /// Minimum total demand.
    pub min: f64,
    /// Midpoint between `min` and `max`.
    pub mid: f64,
    /// Total demand per step (fixed plus dispatchable reference).
    pub demand: Vec<f64>,
    /// Total renewable generation per step.
    pub renewable: Vec<f64>,
    pub demand_curve: DurationCurve,
    pub renewable_curve: DurationCurve,
}

impl BiomassSizing {
    pub fn from_profiles(profiles: &Profiles) -> Self {
        let demand: Vec<f64> = profiles
            .fixed_load
            .sum_axis(Axis(0))
            .iter()
            .zip(profiles.dispatchable_reference.sum_axis(Axis(0)).iter())
            .map(|(a, b)| a + b)
            .collect();
        let renewable: Vec<f64> = profiles
            .solar
            .sum_axis(Axis(0))
            .iter()
            .zip(profiles.wind.sum_axis(Axis(0)).iter())
            .map(|(a, b)| a + b)
            .collect();

        let demand_curve = DurationCurve::from_series(&demand);
        let renewable_curve = DurationCurve::from_series(&renewable);
        let max = demand_curve.peak();
        let min = demand_curve.base();
        Self {
            max,
            min,
            mid: min + (max - min) / 2.0,
            demand,
            renewable,
            demand_curve,
            renewable_curve,
        }
    }
}

impl fmt::Display for BiomassSizing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Biomass Sizing ---")?;
        writeln!(f, "Peak demand:           {:.4} pu", self.max)?;
        writeln!(f, "Base demand:           {:.4} pu", self.min)?;
        writeln!(f, "Mid capacity:          {:.4} pu", self.mid)?;
        write!(
            f,
            "Renewable peak/base:   {:.4} / {:.4} pu",
            self.renewable_curve.peak(),
            self.renewable_curve.base()
        )
    }
}
