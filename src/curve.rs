//! Authored response curves
//!
//! A curve is a list of keyframes joined by cubic Hermite segments. Each key
//! carries an incoming and outgoing tangent (slope in value per unit of
//! time). Outside the key range the curve clamps to the first/last value.
//!
//! Curves are validated when built, so a `ResponseCurve` in hand always has
//! at least one key and strictly increasing key times.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A single curve keyframe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    /// Slope arriving at this key
    #[serde(default)]
    pub in_tangent: f32,
    /// Slope leaving this key
    #[serde(default)]
    pub out_tangent: f32,
}

impl Keyframe {
    /// Flat key (zero tangents)
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
        }
    }

    pub fn with_tangents(time: f32, value: f32, in_tangent: f32, out_tangent: f32) -> Self {
        Self {
            time,
            value,
            in_tangent,
            out_tangent,
        }
    }
}

/// Validated keyframe curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct ResponseCurve {
    keys: Vec<Keyframe>,
}

impl ResponseCurve {
    /// Build a curve from authored keys
    pub fn new(keys: Vec<Keyframe>) -> Result<Self, ConfigError> {
        if keys.is_empty() {
            return Err(ConfigError::EmptyCurve("curve"));
        }
        for (index, key) in keys.iter().enumerate() {
            let finite = key.time.is_finite()
                && key.value.is_finite()
                && key.in_tangent.is_finite()
                && key.out_tangent.is_finite();
            if !finite {
                return Err(ConfigError::NonFiniteKey { index });
            }
        }
        if let Some(index) = keys.windows(2).position(|w| w[1].time <= w[0].time) {
            return Err(ConfigError::UnsortedKeys {
                index: index + 1,
                time: keys[index + 1].time,
            });
        }
        Ok(Self { keys })
    }

    /// Piecewise-linear curve through `(time, value)` points
    ///
    /// Tangents are set to the adjoining segment slopes, which makes every
    /// Hermite segment an exact straight line.
    pub fn linear(points: &[(f32, f32)]) -> Result<Self, ConfigError> {
        Self::new(linear_keys(points))
    }

    /// Piecewise-linear curve from built-in tuning tables
    ///
    /// Points must already be sorted and finite.
    pub(crate) fn linear_trusted(points: &[(f32, f32)]) -> Self {
        let keys = linear_keys(points);
        debug_assert!(Self::new(keys.clone()).is_ok(), "built-in curve table is invalid");
        Self { keys }
    }

    /// Curve that returns `value` everywhere
    pub fn constant(value: f32) -> Self {
        Self {
            keys: vec![Keyframe::new(0.0, value)],
        }
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Time of the first key
    pub fn start_time(&self) -> f32 {
        self.keys[0].time
    }

    /// Time of the last key
    pub fn end_time(&self) -> f32 {
        self.keys[self.keys.len() - 1].time
    }

    /// Evaluate the curve at `t`
    pub fn evaluate(&self, t: f32) -> f32 {
        let first = &self.keys[0];
        let last = &self.keys[self.keys.len() - 1];
        if t.is_nan() || t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // First key strictly after t; guaranteed to be in 1..len by the clamps above
        let upper = self.keys.partition_point(|k| k.time <= t);
        let k0 = &self.keys[upper - 1];
        let k1 = &self.keys[upper];
        hermite(k0, k1, t)
    }
}

impl TryFrom<Vec<Keyframe>> for ResponseCurve {
    type Error = ConfigError;

    fn try_from(keys: Vec<Keyframe>) -> Result<Self, Self::Error> {
        Self::new(keys)
    }
}

impl From<ResponseCurve> for Vec<Keyframe> {
    fn from(curve: ResponseCurve) -> Self {
        curve.keys
    }
}

fn linear_keys(points: &[(f32, f32)]) -> Vec<Keyframe> {
    let mut keys: Vec<Keyframe> = points.iter().map(|&(t, v)| Keyframe::new(t, v)).collect();
    for i in 0..keys.len().saturating_sub(1) {
        let dt = keys[i + 1].time - keys[i].time;
        if dt > 0.0 {
            let slope = (keys[i + 1].value - keys[i].value) / dt;
            keys[i].out_tangent = slope;
            keys[i + 1].in_tangent = slope;
        }
    }
    keys
}

fn hermite(k0: &Keyframe, k1: &Keyframe, t: f32) -> f32 {
    let span = k1.time - k0.time;
    let s = (t - k0.time) / span;
    let s2 = s * s;
    let s3 = s2 * s;

    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    h00 * k0.value + h10 * span * k0.out_tangent + h01 * k1.value + h11 * span * k1.in_tangent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_outside_range() {
        let curve = ResponseCurve::linear(&[(1.0, 2.0), (3.0, 6.0)]).unwrap();
        assert_eq!(curve.evaluate(-10.0), 2.0);
        assert_eq!(curve.evaluate(1.0), 2.0);
        assert_eq!(curve.evaluate(3.0), 6.0);
        assert_eq!(curve.evaluate(100.0), 6.0);
    }

    #[test]
    fn test_linear_is_piecewise_linear() {
        let curve = ResponseCurve::linear(&[(0.0, 0.0), (10.0, 5.0), (20.0, 5.0)]).unwrap();
        assert!((curve.evaluate(2.0) - 1.0).abs() < 1e-5);
        assert!((curve.evaluate(7.5) - 3.75).abs() < 1e-5);
        assert!((curve.evaluate(15.0) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_flat_tangents_ease_in_out() {
        let curve = ResponseCurve::new(vec![Keyframe::new(0.0, 0.0), Keyframe::new(1.0, 1.0)]).unwrap();
        // Smoothstep: symmetric around the midpoint, slow at the ends
        assert!((curve.evaluate(0.5) - 0.5).abs() < 1e-6);
        assert!(curve.evaluate(0.1) < 0.1);
        assert!(curve.evaluate(0.9) > 0.9);
    }

    #[test]
    fn test_constant() {
        let curve = ResponseCurve::constant(0.75);
        assert_eq!(curve.evaluate(-1.0), 0.75);
        assert_eq!(curve.evaluate(42.0), 0.75);
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(ResponseCurve::new(Vec::new()), Err(ConfigError::EmptyCurve(_))));
    }

    #[test]
    fn test_rejects_unsorted() {
        let err = ResponseCurve::linear(&[(0.0, 0.0), (2.0, 1.0), (1.0, 2.0)]).unwrap_err();
        assert!(matches!(err, ConfigError::UnsortedKeys { index: 2, .. }));
    }

    #[test]
    fn test_rejects_duplicate_times() {
        let err = ResponseCurve::linear(&[(0.0, 0.0), (0.0, 1.0)]).unwrap_err();
        assert!(matches!(err, ConfigError::UnsortedKeys { index: 1, .. }));
    }

    #[test]
    fn test_rejects_nan() {
        let err = ResponseCurve::new(vec![Keyframe::new(0.0, f32::NAN)]).unwrap_err();
        assert!(matches!(err, ConfigError::NonFiniteKey { index: 0 }));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: ResponseCurve =
            serde_json::from_str(r#"[{"time":0.0,"value":0.0},{"time":1.0,"value":2.0}]"#).unwrap();
        assert_eq!(ok.keys().len(), 2);

        let bad = serde_json::from_str::<ResponseCurve>("[]");
        assert!(bad.is_err());
    }
}
