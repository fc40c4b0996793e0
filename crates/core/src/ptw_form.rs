//! The worker's PTW assurance checklist and its evidence-file map.
//!
//! A submission must answer every item of all six categories with `true`,
//! `false` or `"n/a"`. Nothing partial, nothing extra.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Answers
// ---------------------------------------------------------------------------

/// Tri-state checklist answer.
///
/// Serialized as JSON `true`, `false` or the string `"n/a"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecklistAnswer {
    Yes,
    No,
    NotApplicable,
}

/// Wire form of [`ChecklistAnswer::NotApplicable`].
pub const NOT_APPLICABLE: &str = "n/a";

impl Serialize for ChecklistAnswer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Yes => serializer.serialize_bool(true),
            Self::No => serializer.serialize_bool(false),
            Self::NotApplicable => serializer.serialize_str(NOT_APPLICABLE),
        }
    }
}

struct AnswerVisitor;

impl Visitor<'_> for AnswerVisitor {
    type Value = ChecklistAnswer;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "true, false or \"{NOT_APPLICABLE}\"")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(if v {
            ChecklistAnswer::Yes
        } else {
            ChecklistAnswer::No
        })
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        if v == NOT_APPLICABLE {
            Ok(ChecklistAnswer::NotApplicable)
        } else {
            Err(E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }
}

impl<'de> Deserialize<'de> for ChecklistAnswer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AnswerVisitor)
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// One fixed checklist category.
#[derive(Debug)]
pub struct ChecklistCategory {
    /// JSON key, also the prefix of evidence-file field names.
    pub key: &'static str,
    pub items: &'static [&'static str],
}

pub const CATEGORIES: [ChecklistCategory; 6] = [
    ChecklistCategory {
        key: "generalDetails",
        items: &[
            "is_valid",
            "scope_defined",
            "signed_by_issuer",
            "documents_attached",
            "location_identified",
            "permit_displayed",
            "weather_suitable",
            "validity_extended",
            "co_activity_risks_controlled",
            "recorded_in_log",
        ],
    },
    ChecklistCategory {
        key: "hazardAssessment",
        items: &[
            "hazards_identified",
            "risk_assessment_complete",
            "control_measures_documented",
            "emergency_procedures_communicated",
            "fire_risk_assessment",
            "confined_space_hazards",
            "working_at_height_risks",
            "electrical_hazards",
            "chemical_exposure_risks",
            "environmental_impact",
        ],
    },
    ChecklistCategory {
        key: "worksitePreparation",
        items: &[
            "isolation_completed",
            "gas_testing_completed",
            "barricades_in_place",
            "lighting_adequate",
            "scaffolding_inspected",
            "access_egress_clear",
            "ventilation_adequate",
            "noise_levels_assessed",
            "hot_work_screens_in_place",
            "tools_inspected",
        ],
    },
    ChecklistCategory {
        key: "ppe",
        items: &[
            "ppe_provided",
            "ppe_inspected",
            "specialized_ppe_available",
            "fall_arrest_in_place",
            "fire_resistant_clothing",
            "eye_protection_used",
            "hearing_protection_used",
            "gloves_appropriate",
            "foot_protection_used",
            "full_body_harness_used",
        ],
    },
    ChecklistCategory {
        key: "workforceCommunication",
        items: &[
            "workers_trained",
            "toolbox_talk_conducted",
            "communication_methods",
            "supervisor_present",
            "workers_familiar_with_ptw",
            "medically_fit",
            "buddy_system_in_place",
            "language_barriers_addressed",
            "emergency_contact_list",
            "shift_handover_completed",
        ],
    },
    ChecklistCategory {
        key: "specialConditions",
        items: &[
            "hot_work_permit_obtained",
            "confined_space_permit_obtained",
            "working_at_height_permit_obtained",
            "electrical_isolation_confirmed",
            "excavation_permit_obtained",
            "radiography_permit_obtained",
            "lifting_plan_approved",
            "weather_monitoring_in_place",
            "fire_watch_appointed",
            "rescue_plan_in_place",
        ],
    },
];

/// Look up a category definition by its JSON key.
pub fn find_category(key: &str) -> Option<&'static ChecklistCategory> {
    CATEGORIES.iter().find(|c| c.key == key)
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Answers for one category, keyed by item.
pub type CategoryAnswers = BTreeMap<String, ChecklistAnswer>;

/// Evidence files: category key -> item -> stored filename.
pub type PtwFiles = BTreeMap<String, BTreeMap<String, String>>;

/// A complete checklist submission as stored in `tasks.ptw_form_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PtwChecklist {
    pub general_details: CategoryAnswers,
    pub hazard_assessment: CategoryAnswers,
    pub worksite_preparation: CategoryAnswers,
    pub ppe: CategoryAnswers,
    pub workforce_communication: CategoryAnswers,
    pub special_conditions: CategoryAnswers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl PtwChecklist {
    /// Parse the `ptw_form_data` text submitted by a worker and validate it.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let checklist: Self = serde_json::from_str(raw)
            .map_err(|e| CoreError::Validation(format!("Malformed ptw_form_data: {e}")))?;
        checklist.validate()?;
        Ok(checklist)
    }

    /// Answers for a category by its JSON key.
    pub fn category(&self, key: &str) -> Option<&CategoryAnswers> {
        match key {
            "generalDetails" => Some(&self.general_details),
            "hazardAssessment" => Some(&self.hazard_assessment),
            "worksitePreparation" => Some(&self.worksite_preparation),
            "ppe" => Some(&self.ppe),
            "workforceCommunication" => Some(&self.workforce_communication),
            "specialConditions" => Some(&self.special_conditions),
            _ => None,
        }
    }

    /// Every category must answer exactly its fixed item set.
    pub fn validate(&self) -> Result<(), CoreError> {
        for category in &CATEGORIES {
            let answers = self.category(category.key).ok_or_else(|| {
                CoreError::Internal(format!("Checklist category '{}' unmapped", category.key))
            })?;

            let expected: BTreeSet<&str> = category.items.iter().copied().collect();
            let given: BTreeSet<&str> = answers.keys().map(String::as_str).collect();

            if let Some(missing) = expected.difference(&given).next() {
                return Err(CoreError::Validation(format!(
                    "Checklist item '{}.{missing}' is not answered",
                    category.key
                )));
            }
            if let Some(unknown) = given.difference(&expected).next() {
                return Err(CoreError::Validation(format!(
                    "Unknown checklist item '{}.{unknown}'",
                    category.key
                )));
            }
        }
        Ok(())
    }

    /// Count of answers across all categories matching `answer`.
    pub fn count(&self, answer: ChecklistAnswer) -> usize {
        CATEGORIES
            .iter()
            .filter_map(|c| self.category(c.key))
            .flat_map(|answers| answers.values())
            .filter(|a| **a == answer)
            .count()
    }
}

// ---------------------------------------------------------------------------
// Evidence files
// ---------------------------------------------------------------------------

/// Suffix of multipart field names carrying checklist evidence.
pub const EVIDENCE_FIELD_SUFFIX: &str = "_file";

/// Split a multipart field name `{category}_{item}_file` into its parts.
///
/// Category keys never contain `_`, so the first underscore separates the
/// category from the (possibly underscored) item.
pub fn parse_evidence_field(field_name: &str) -> Result<(&'static str, String), CoreError> {
    let invalid = || CoreError::Validation(format!("Unexpected upload field '{field_name}'"));

    let stem = field_name
        .strip_suffix(EVIDENCE_FIELD_SUFFIX)
        .ok_or_else(invalid)?;
    let (category_key, item) = stem.split_once('_').ok_or_else(invalid)?;
    let category = find_category(category_key).ok_or_else(invalid)?;
    if !category.items.contains(&item) {
        return Err(invalid());
    }
    Ok((category.key, item.to_string()))
}

/// Record one stored evidence file in the map.
pub fn insert_evidence(files: &mut PtwFiles, category: &str, item: String, filename: String) {
    files
        .entry(category.to_string())
        .or_default()
        .insert(item, filename);
}

#[cfg(test)]
pub(crate) mod tests {
    use assert_matches::assert_matches;
    use serde_json::{json, Value};

    use super::*;

    /// A JSON checklist with every item set to `answer`.
    pub(crate) fn full_checklist_json(answer: Value) -> Value {
        let mut root = serde_json::Map::new();
        for category in &CATEGORIES {
            let items: serde_json::Map<String, Value> = category
                .items
                .iter()
                .map(|item| (item.to_string(), answer.clone()))
                .collect();
            root.insert(category.key.to_string(), Value::Object(items));
        }
        Value::Object(root)
    }

    #[test]
    fn six_categories_of_ten_items() {
        assert_eq!(CATEGORIES.len(), 6);
        for category in &CATEGORIES {
            assert_eq!(category.items.len(), 10, "{}", category.key);
            assert!(!category.key.contains('_'));
        }
    }

    #[test]
    fn all_true_checklist_parses() {
        let raw = full_checklist_json(json!(true)).to_string();
        let checklist = PtwChecklist::parse(&raw).unwrap();
        assert_eq!(checklist.count(ChecklistAnswer::Yes), 60);
        assert_eq!(checklist.remarks, None);
    }

    #[test]
    fn tri_state_values_round_trip_exactly() {
        let mut value = full_checklist_json(json!(false));
        value["ppe"]["gloves_appropriate"] = json!("n/a");
        value["generalDetails"]["is_valid"] = json!(true);
        value["remarks"] = json!("Wind picking up after 3pm");

        let checklist = PtwChecklist::parse(&value.to_string()).unwrap();
        assert_eq!(checklist.ppe["gloves_appropriate"], ChecklistAnswer::NotApplicable);
        assert_eq!(serde_json::to_value(&checklist).unwrap(), value);
    }

    #[test]
    fn missing_item_is_rejected() {
        let mut value = full_checklist_json(json!(true));
        value["hazardAssessment"]
            .as_object_mut()
            .unwrap()
            .remove("electrical_hazards");
        let err = PtwChecklist::parse(&value.to_string()).unwrap_err();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("hazardAssessment.electrical_hazards"));
    }

    #[test]
    fn unknown_item_is_rejected() {
        let mut value = full_checklist_json(json!(true));
        value["ppe"]["cape_worn"] = json!(true);
        assert_matches!(
            PtwChecklist::parse(&value.to_string()),
            Err(CoreError::Validation(msg)) if msg.contains("cape_worn")
        );
    }

    #[test]
    fn unknown_category_and_bad_answers_are_rejected() {
        let mut value = full_checklist_json(json!(true));
        value["bonusSection"] = json!({});
        assert!(PtwChecklist::parse(&value.to_string()).is_err());

        let mut value = full_checklist_json(json!(true));
        value["ppe"]["ppe_provided"] = json!("maybe");
        assert!(PtwChecklist::parse(&value.to_string()).is_err());

        let mut value = full_checklist_json(json!(true));
        value["ppe"]["ppe_provided"] = json!(1);
        assert!(PtwChecklist::parse(&value.to_string()).is_err());
    }

    #[test]
    fn missing_category_is_rejected() {
        let mut value = full_checklist_json(json!(true));
        value.as_object_mut().unwrap().remove("specialConditions");
        assert_matches!(
            PtwChecklist::parse(&value.to_string()),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn evidence_field_names_split_on_first_underscore() {
        let (category, item) = parse_evidence_field("ppe_fall_arrest_in_place_file").unwrap();
        assert_eq!(category, "ppe");
        assert_eq!(item, "fall_arrest_in_place");

        let (category, item) =
            parse_evidence_field("generalDetails_co_activity_risks_controlled_file").unwrap();
        assert_eq!(category, "generalDetails");
        assert_eq!(item, "co_activity_risks_controlled");
    }

    #[test]
    fn bad_evidence_field_names_are_rejected() {
        for name in [
            "ppe_fall_arrest_in_place",
            "ppe_file",
            "armour_plates_file",
            "ppe_cape_worn_file",
            "_file",
        ] {
            assert_matches!(parse_evidence_field(name), Err(CoreError::Validation(_)), "{name}");
        }
    }

    #[test]
    fn evidence_map_groups_by_category() {
        let mut files = PtwFiles::new();
        insert_evidence(&mut files, "ppe", "ppe_provided".into(), "1-2.jpg".into());
        insert_evidence(&mut files, "ppe", "gloves_appropriate".into(), "3-4.png".into());
        insert_evidence(&mut files, "generalDetails", "is_valid".into(), "5-6.pdf".into());

        assert_eq!(files.len(), 2);
        assert_eq!(files["ppe"].len(), 2);
        assert_eq!(
            serde_json::to_value(&files).unwrap(),
            json!({
                "generalDetails": { "is_valid": "5-6.pdf" },
                "ppe": { "gloves_appropriate": "3-4.png", "ppe_provided": "1-2.jpg" }
            })
        );
    }
}
