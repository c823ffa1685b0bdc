use serde::Serialize;

/// Grade from which an interpretation is considered good.
pub const GOOD_GRADE: f64 = 0.5;

/// One weighted factor of a grade.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Impact {
    pub name: &'static str,
    pub value: f64,
    pub weight: f64,
}

/// Named impacts combined into a grade by weighted geometric mean.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GradeImpacts {
    pub entries: Vec<Impact>,
}

impl GradeImpacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, value: f64, weight: f64) -> Self {
        self.entries.push(Impact {
            name,
            value: value.clamp(0.0, 1.0),
            weight,
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|i| i.name == name).map(|i| i.value)
    }

    pub fn grade(&self) -> f64 {
        let total: f64 = self.entries.iter().map(|i| i.weight).sum();
        if total <= 0.0 {
            return 0.0;
        }
        let mut product = 1.0;
        for impact in &self.entries {
            if impact.value <= 0.0 {
                return 0.0;
            }
            product *= impact.value.powf(impact.weight);
        }
        product.powf(1.0 / total)
    }
}

/// Impact of a gap against its maximum: 1 for no gap, 0 at the maximum.
#[inline]
pub fn gap_impact(gap: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return 0.0;
    }
    (1.0 - gap / max).clamp(0.0, 1.0)
}
