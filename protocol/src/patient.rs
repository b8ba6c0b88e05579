use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

/// Sex/gender reference attached to a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Gender {
    pub id: i64,
    pub name: String,
}

/// Detailed patient record as served by `GET /api/v1/patients/{id}`.
///
/// List endpoints return the same shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub ssn: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    pub contacted: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Shallow merge: every field present in `patch` overwrites the held
    /// value, everything else is kept.
    pub fn merge(&mut self, patch: PatientPatch) {
        let PatientPatch {
            id,
            first_name,
            last_name,
            ssn,
            gender,
            contacted,
            created,
            updated,
        } = patch;

        if let Some(id) = id {
            self.id = id;
        }
        if let Some(first_name) = first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = last_name {
            self.last_name = last_name;
        }
        if let Some(ssn) = ssn {
            self.ssn = ssn;
        }
        if let Some(gender) = gender {
            self.gender = gender;
        }
        if let Some(contacted) = contacted {
            self.contacted = contacted;
        }
        if let Some(created) = created {
            self.created = created;
        }
        if let Some(updated) = updated {
            self.updated = updated;
        }
    }
}

/// A patient response in which any field may be missing.
///
/// `PATCH` responses are decoded into this type so that a partial body
/// (for example just `{"contacted": true}`) can be merged into a record the
/// caller already holds. `gender` distinguishes "absent" (`None`) from an
/// explicit `null` (`Some(None)`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PatientPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssn: Option<String>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub gender: Option<Option<Gender>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contacted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl From<Patient> for PatientPatch {
    fn from(patient: Patient) -> Self {
        Self {
            id: Some(patient.id),
            first_name: Some(patient.first_name),
            last_name: Some(patient.last_name),
            ssn: Some(patient.ssn),
            gender: Some(patient.gender),
            contacted: Some(patient.contacted),
            created: Some(patient.created),
            updated: Some(patient.updated),
        }
    }
}

/// Returned when a patch lacks a field a full [`Patient`] requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompletePatch {
    pub missing: &'static str,
}

impl std::fmt::Display for IncompletePatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "patient patch is missing `{}`", self.missing)
    }
}

impl std::error::Error for IncompletePatch {}

impl TryFrom<PatientPatch> for Patient {
    type Error = IncompletePatch;

    fn try_from(patch: PatientPatch) -> Result<Self, Self::Error> {
        fn require<T>(value: Option<T>, missing: &'static str) -> Result<T, IncompletePatch> {
            value.ok_or(IncompletePatch { missing })
        }

        Ok(Patient {
            id: require(patch.id, "id")?,
            first_name: require(patch.first_name, "firstName")?,
            last_name: require(patch.last_name, "lastName")?,
            ssn: patch.ssn.unwrap_or_default(),
            gender: patch.gender.flatten(),
            contacted: require(patch.contacted, "contacted")?,
            created: require(patch.created, "created")?,
            updated: require(patch.updated, "updated")?,
        })
    }
}

/// Body of `PATCH /api/v1/patients/{id}`. Only provided fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePatient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contacted: Option<bool>,
}

impl UpdatePatient {
    /// Update that only flips the contacted flag.
    pub fn contacted(contacted: bool) -> Self {
        Self {
            contacted: Some(contacted),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Patient {
        serde_json::from_value(json!({
            "id": "7f0c",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "ssn": "120-44-9876",
            "gender": { "id": 2, "name": "Female" },
            "contacted": false,
            "created": "2024-03-01T09:00:00Z",
            "updated": "2024-03-02T09:00:00Z"
        }))
        .expect("sample patient")
    }

    #[test]
    fn contacted_only_patch_flips_only_contacted() {
        let mut patient = sample();
        let patch: PatientPatch = serde_json::from_value(json!({ "contacted": true })).unwrap();

        patient.merge(patch);

        let mut expected = sample();
        expected.contacted = true;
        assert_eq!(patient, expected);
    }

    #[test]
    fn explicit_null_gender_clears_it() {
        let mut patient = sample();
        let patch: PatientPatch = serde_json::from_value(json!({ "gender": null })).unwrap();
        assert_eq!(patch.gender, Some(None));

        patient.merge(patch);
        assert_eq!(patient.gender, None);
        assert_eq!(patient.first_name, "Ada");
    }

    #[test]
    fn absent_gender_is_kept() {
        let patch: PatientPatch = serde_json::from_value(json!({ "ssn": "000" })).unwrap();
        assert_eq!(patch.gender, None);

        let mut patient = sample();
        patient.merge(patch);
        assert_eq!(patient.gender.as_ref().map(|g| g.name.as_str()), Some("Female"));
        assert_eq!(patient.ssn, "000");
    }

    #[test]
    fn full_patch_converts_back_into_patient() {
        let patch = PatientPatch::from(sample());
        assert_eq!(Patient::try_from(patch), Ok(sample()));
    }

    #[test]
    fn partial_patch_is_not_a_patient() {
        let patch = PatientPatch {
            contacted: Some(true),
            ..Default::default()
        };
        assert_eq!(
            Patient::try_from(patch),
            Err(IncompletePatch { missing: "id" })
        );
    }

    #[test]
    fn serializes_in_camel_case() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["firstName"], "Ada");
        assert_eq!(value["lastName"], "Lovelace");
        assert!(value.get("first_name").is_none());
    }

    #[test]
    fn update_body_rejects_unknown_fields() {
        let err = serde_json::from_value::<UpdatePatient>(json!({ "contacted": true, "age": 3 }));
        assert!(err.is_err());

        let body = serde_json::to_value(UpdatePatient::contacted(true)).unwrap();
        assert_eq!(body, json!({ "contacted": true }));
    }
}
