//! Patient models.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ValidationError;
use crate::bmi::{self, Verdict, VerdictPolicy};

/// Gender as accepted by the API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Lowercase wire/storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }

    /// Parse the lowercase storage form.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }
}

/// A stored patient record. Derived fields live on [`PatientView`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Caller-supplied unique identifier (e.g. "P001")
    pub id: String,
    /// Full name
    pub name: String,
    /// City of residence
    pub city: String,
    /// Age in years
    pub age: u32,
    pub gender: Gender,
    /// Height in centimeters
    pub height: f64,
    /// Weight in kilograms
    pub weight: f64,
}

impl Patient {
    /// Create a patient with all base fields.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        city: impl Into<String>,
        age: u32,
        gender: Gender,
        height: f64,
        weight: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            city: city.into(),
            age,
            gender,
            height,
            weight,
        }
    }

    /// Check field constraints that the type system does not cover.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::new("id", "must not be empty"));
        }
        validate_positive("height", self.height)?;
        validate_positive("weight", self.weight)?;
        if !self.bmi().is_finite() {
            return Err(ValidationError::new(
                "height",
                "height and weight do not yield a finite BMI",
            ));
        }
        Ok(())
    }

    /// Body-mass index, rounded to 2 decimals.
    pub fn bmi(&self) -> f64 {
        bmi::bmi(self.height, self.weight)
    }

    /// Attach derived fields for presentation.
    pub fn view(&self, policy: VerdictPolicy) -> PatientView {
        let derived = bmi::derive(self.height, self.weight, policy);
        PatientView {
            patient: self.clone(),
            bmi: derived.bmi,
            verdict: derived.verdict,
        }
    }

    /// Content hash of the stored fields, used as an HTTP entity tag.
    pub fn etag(&self) -> String {
        // Field order is fixed by the struct, so the encoding is canonical.
        let encoded = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&encoded))
    }
}

/// Height and weight must be finite and strictly positive.
pub(crate) fn validate_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::new(field, "must be greater than 0"));
    }
    Ok(())
}

/// A patient as presented to callers: base fields plus BMI and verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientView {
    #[serde(flatten)]
    pub patient: Patient,
    pub bmi: f64,
    pub verdict: Verdict,
}
