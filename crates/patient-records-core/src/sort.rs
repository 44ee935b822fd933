//! Ordering of patient records by a numeric attribute.

use std::str::FromStr;

use crate::models::Patient;

/// Fields a listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Height,
    Weight,
    Bmi,
}

impl SortField {
    pub const VALID: [&'static str; 3] = ["weight", "height", "bmi"];

    fn key(&self, patient: &Patient) -> f64 {
        match self {
            SortField::Height => patient.height,
            SortField::Weight => patient.weight,
            SortField::Bmi => patient.bmi(),
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "height" => Ok(SortField::Height),
            "weight" => Ok(SortField::Weight),
            "bmi" => Ok(SortField::Bmi),
            _ => Err(format!(
                "Invalid sort_by parameter '{}', select from {:?}",
                s,
                SortField::VALID
            )),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err("Invalid order parameter. Use 'asc' or 'desc'.".to_string()),
        }
    }
}

/// Stable sort: ties keep their incoming order in either direction.
pub fn sort_patients(patients: &mut [Patient], field: SortField, order: SortOrder) {
    patients.sort_by(|a, b| {
        let ordering = field.key(a).total_cmp(&field.key(b));
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

/// Convenience for callers that already hold owned records.
pub fn sorted(mut patients: Vec<Patient>, field: SortField, order: SortOrder) -> Vec<Patient> {
    sort_patients(&mut patients, field, order);
    patients
}
