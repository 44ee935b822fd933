//! Body-mass index and health verdict derivation.
//!
//! Derived values are computed on every read and never stored, so they can
//! not drift from the height/weight they came from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Health verdict bucket for a BMI value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Verdict {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Underweight => "Underweight",
            Verdict::Normal => "Normal",
            Verdict::Overweight => "Overweight",
            Verdict::Obese => "Obese",
        };
        f.write_str(s)
    }
}

/// How BMI values map onto verdict buckets.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VerdictPolicy {
    /// Historical buckets. `[24.9, 25)` matches no range check and is
    /// reported as `Obese`.
    #[default]
    Compatible,
    /// Normal extends up to 25, so every value has exactly one bucket.
    Contiguous,
}

impl VerdictPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictPolicy::Compatible => "compatible",
            VerdictPolicy::Contiguous => "contiguous",
        }
    }

    /// Bucket a (rounded) BMI value.
    pub fn classify(&self, bmi: f64) -> Verdict {
        let normal_upper = match self {
            VerdictPolicy::Compatible => 24.9,
            VerdictPolicy::Contiguous => 25.0,
        };

        if bmi < 18.5 {
            Verdict::Underweight
        } else if bmi < normal_upper {
            Verdict::Normal
        } else if (25.0..29.9).contains(&bmi) {
            Verdict::Overweight
        } else {
            Verdict::Obese
        }
    }
}

impl FromStr for VerdictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compatible" => Ok(VerdictPolicy::Compatible),
            "contiguous" => Ok(VerdictPolicy::Contiguous),
            other => Err(format!(
                "unknown verdict policy '{}', expected 'compatible' or 'contiguous'",
                other
            )),
        }
    }
}

/// Derived fields for one patient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Derived {
    pub bmi: f64,
    pub verdict: Verdict,
}

/// `weight / (height_m)^2`, rounded to 2 decimals (half away from zero).
pub fn bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let height_m = height_cm / 100.0;
    round2(weight_kg / (height_m * height_m))
}

/// Compute BMI and verdict. Inputs must already be validated positive.
pub fn derive(height_cm: f64, weight_kg: f64, policy: VerdictPolicy) -> Derived {
    let bmi = bmi(height_cm, weight_kg);
    Derived {
        bmi,
        verdict: policy.classify(bmi),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_values() {
        assert_eq!(bmi(175.0, 70.0), 22.86);
        assert_eq!(bmi(150.0, 50.0), 22.22);
        assert_eq!(bmi(175.5, 70.2), 22.79);
        assert_eq!(bmi(175.5, 90.0), 29.22);
    }

    #[test]
    fn test_compatible_buckets() {
        let p = VerdictPolicy::Compatible;
        assert_eq!(p.classify(0.0), Verdict::Underweight);
        assert_eq!(p.classify(18.49), Verdict::Underweight);
        assert_eq!(p.classify(18.5), Verdict::Normal);
        assert_eq!(p.classify(24.89), Verdict::Normal);
        assert_eq!(p.classify(25.0), Verdict::Overweight);
        assert_eq!(p.classify(29.89), Verdict::Overweight);
        assert_eq!(p.classify(29.9), Verdict::Obese);
        assert_eq!(p.classify(41.0), Verdict::Obese);
    }

    #[test]
    fn test_compatible_gap_falls_through_to_obese() {
        let p = VerdictPolicy::Compatible;
        assert_eq!(p.classify(24.9), Verdict::Obese);
        assert_eq!(p.classify(24.95), Verdict::Obese);
        assert_eq!(p.classify(24.99), Verdict::Obese);
    }

    #[test]
    fn test_contiguous_closes_gap() {
        let p = VerdictPolicy::Contiguous;
        assert_eq!(p.classify(24.9), Verdict::Normal);
        assert_eq!(p.classify(24.99), Verdict::Normal);
        assert_eq!(p.classify(25.0), Verdict::Overweight);
        assert_eq!(p.classify(29.9), Verdict::Obese);
        assert_eq!(p.classify(18.49), Verdict::Underweight);
    }

    #[test]
    fn test_derive_end_to_end_values() {
        let d = derive(175.5, 70.2, VerdictPolicy::Compatible);
        assert_eq!(d.bmi, 22.79);
        assert_eq!(d.verdict, Verdict::Normal);

        let d = derive(175.5, 90.0, VerdictPolicy::Compatible);
        assert_eq!(d.bmi, 29.22);
        assert_eq!(d.verdict, Verdict::Overweight);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("compatible".parse::<VerdictPolicy>(), Ok(VerdictPolicy::Compatible));
        assert_eq!("Contiguous".parse::<VerdictPolicy>(), Ok(VerdictPolicy::Contiguous));
        assert!("strict".parse::<VerdictPolicy>().is_err());
        assert_eq!(VerdictPolicy::default(), VerdictPolicy::Compatible);
    }

    #[test]
    fn test_verdict_serializes_capitalized() {
        assert_eq!(serde_json::to_string(&Verdict::Overweight).unwrap(), "\"Overweight\"");
        assert_eq!(Verdict::Obese.to_string(), "Obese");
    }

    proptest! {
        #[test]
        fn prop_bmi_matches_formula(height in 30.0f64..260.0, weight in 1.0f64..400.0) {
            let h = height / 100.0;
            let expected = (weight / (h * h) * 100.0).round() / 100.0;
            prop_assert!((bmi(height, weight) - expected).abs() < 1e-9);
        }

        #[test]
        fn prop_verdict_is_function_of_bmi(height in 30.0f64..260.0, weight in 1.0f64..400.0) {
            for policy in [VerdictPolicy::Compatible, VerdictPolicy::Contiguous] {
                let d = derive(height, weight, policy);
                prop_assert_eq!(d.verdict, policy.classify(d.bmi));
            }
        }

        #[test]
        fn prop_policies_only_differ_in_gap(value in 0.0f64..60.0) {
            let value = round2(value);
            let a = VerdictPolicy::Compatible.classify(value);
            let b = VerdictPolicy::Contiguous.classify(value);
            if (24.9..25.0).contains(&value) {
                prop_assert_eq!(a, Verdict::Obese);
                prop_assert_eq!(b, Verdict::Normal);
            } else {
                prop_assert_eq!(a, b);
            }
        }
    }
}
