//! Sparse patient updates and the merge that applies them.

use serde::{Deserialize, Deserializer, Serialize};

use super::patient::validate_positive;
use super::{Gender, Patient, ValidationError};

/// A partial update. Each field is tri-state:
/// `None` = absent, `Some(None)` = explicit null, `Some(Some(v))` = new value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PatientUpdate {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub age: Option<Option<u32>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub gender: Option<Option<Gender>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub height: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub weight: Option<Option<f64>>,
}

/// Marks a key that appeared in the payload, even when its value is null.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl PatientUpdate {
    /// True when no field was supplied.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.city.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.height.is_none()
            && self.weight.is_none()
    }

    /// Check every supplied field on its own. Nulls are rejected because
    /// no patient field is optional.
    pub fn validate(&self) -> Result<(), ValidationError> {
        reject_null("name", &self.name)?;
        reject_null("city", &self.city)?;
        reject_null("age", &self.age)?;
        reject_null("gender", &self.gender)?;
        reject_null("height", &self.height)?;
        reject_null("weight", &self.weight)?;

        if let Some(Some(height)) = self.height {
            validate_positive("height", height)?;
        }
        if let Some(Some(weight)) = self.weight {
            validate_positive("weight", weight)?;
        }
        Ok(())
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(Some(name.into()));
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(Some(city.into()));
        self
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(Some(age));
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(Some(gender));
        self
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(Some(height));
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(Some(weight));
        self
    }
}

fn reject_null<T>(field: &'static str, value: &Option<Option<T>>) -> Result<(), ValidationError> {
    match value {
        Some(None) => Err(ValidationError::new(field, "must not be null")),
        _ => Ok(()),
    }
}

/// Overlay the supplied fields of `update` onto `existing`.
///
/// Absent fields are carried over unchanged and the identifier always comes
/// from `existing`. Callers validate the update first; a stray null is
/// treated as absent here.
pub fn merge(existing: &Patient, update: &PatientUpdate) -> Patient {
    let mut merged = existing.clone();

    if let Some(Some(name)) = &update.name {
        merged.name = name.clone();
    }
    if let Some(Some(city)) = &update.city {
        merged.city = city.clone();
    }
    if let Some(Some(age)) = update.age {
        merged.age = age;
    }
    if let Some(Some(gender)) = update.gender {
        merged.gender = gender;
    }
    if let Some(Some(height)) = update.height {
        merged.height = height;
    }
    if let Some(Some(weight)) = update.weight {
        merged.weight = weight;
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn existing() -> Patient {
        Patient::new("P001", "Rishu Mishra", "Bangalore", 25, Gender::Male, 175.5, 70.2)
    }

    #[test]
    fn test_absent_vs_null() {
        let update: PatientUpdate = serde_json::from_str(r#"{"weight": 90.0}"#).unwrap();
        assert_eq!(update.weight, Some(Some(90.0)));
        assert_eq!(update.name, None);
        assert!(update.validate().is_ok());

        let update: PatientUpdate = serde_json::from_str(r#"{"city": null}"#).unwrap();
        assert_eq!(update.city, Some(None));
        let err = update.validate().unwrap_err();
        assert_eq!(err.field, "city");
    }

    #[test]
    fn test_id_is_not_updatable() {
        let result: Result<PatientUpdate, _> = serde_json::from_str(r#"{"id": "P999"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_gender_update_accepts_each_value() {
        for value in ["male", "female", "other"] {
            let json = format!(r#"{{"gender": "{}"}}"#, value);
            let update: PatientUpdate = serde_json::from_str(&json).unwrap();
            assert!(update.validate().is_ok());
        }
        let bad: Result<PatientUpdate, _> = serde_json::from_str(r#"{"gender": "robot"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_validate_field_ranges() {
        assert_eq!(
            PatientUpdate::default().with_height(0.0).validate().unwrap_err().field,
            "height"
        );
        assert_eq!(
            PatientUpdate::default().with_weight(-1.0).validate().unwrap_err().field,
            "weight"
        );
        assert!(PatientUpdate::default().with_age(0).validate().is_ok());
    }

    #[test]
    fn test_merge_overlays_only_present_fields() {
        let update = PatientUpdate::default().with_weight(90.0);
        let merged = merge(&existing(), &update);

        assert_eq!(merged.weight, 90.0);
        assert_eq!(merged.height, 175.5);
        assert_eq!(merged.name, "Rishu Mishra");
        assert_eq!(merged.id, "P001");
        assert_eq!(merged.bmi(), 29.22);
    }

    #[test]
    fn test_empty_update_is_identity() {
        let update = PatientUpdate::default();
        assert!(update.is_empty());
        assert_eq!(merge(&existing(), &update), existing());
    }

    fn arb_update() -> impl Strategy<Value = PatientUpdate> {
        (
            proptest::option::of("[a-zA-Z ]{1,20}"),
            proptest::option::of("[a-zA-Z]{1,12}"),
            proptest::option::of(0u32..120),
            proptest::option::of(prop_oneof![
                Just(Gender::Male),
                Just(Gender::Female),
                Just(Gender::Other)
            ]),
            proptest::option::of(50.0f64..250.0),
            proptest::option::of(2.0f64..300.0),
        )
            .prop_map(|(name, city, age, gender, height, weight)| PatientUpdate {
                name: name.map(Some),
                city: city.map(Some),
                age: age.map(Some),
                gender: gender.map(Some),
                height: height.map(Some),
                weight: weight.map(Some),
            })
    }

    proptest! {
        #[test]
        fn prop_merge_overlays_present_and_keeps_absent(update in arb_update()) {
            let base = existing();
            let merged = merge(&base, &update);

            prop_assert_eq!(&merged.id, &base.id);
            match &update.name {
                Some(Some(v)) => prop_assert_eq!(&merged.name, v),
                _ => prop_assert_eq!(&merged.name, &base.name),
            }
            match &update.city {
                Some(Some(v)) => prop_assert_eq!(&merged.city, v),
                _ => prop_assert_eq!(&merged.city, &base.city),
            }
            prop_assert_eq!(merged.age, update.age.flatten().unwrap_or(base.age));
            prop_assert_eq!(merged.gender, update.gender.flatten().unwrap_or(base.gender));
            prop_assert_eq!(merged.height, update.height.flatten().unwrap_or(base.height));
            prop_assert_eq!(merged.weight, update.weight.flatten().unwrap_or(base.weight));
        }
    }
}
