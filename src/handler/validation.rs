//! Request body decoding and validation
//!
//! Bodies are JSON. Decoding catches missing fields and wrong types; the
//! semantic pass then collects every rule violation so the caller gets the
//! full list in one round trip.

use serde::Deserialize;

use crate::config::ValidationRules;
use crate::error::FieldError;
use crate::model::{Version, Workout, WorkoutEntry, INITIAL_VERSION};

/// Body of an update: the full payload plus the version the client last saw
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRequest {
    pub title: String,
    pub description: String,
    pub duration_minutes: i64,
    pub calories_burned: i64,
    pub entries: Vec<WorkoutEntry>,
    pub version: Version,
}

impl UpdateRequest {
    /// Split into the new payload and the expected version
    pub fn into_parts(self) -> (Workout, Version) {
        let workout = Workout {
            title: self.title,
            description: self.description,
            duration_minutes: self.duration_minutes,
            calories_burned: self.calories_burned,
            entries: self.entries,
        };
        (workout, self.version)
    }
}

/// Decode and validate an update body
pub fn decode_update(
    body: &[u8],
    rules: &ValidationRules,
) -> Result<(Workout, Version), Vec<FieldError>> {
    let request: UpdateRequest = serde_json::from_slice(body).map_err(|e| vec![decode_error(&e)])?;
    let (workout, version) = request.into_parts();

    let mut errors = validate_workout(&workout, rules);
    if version < INITIAL_VERSION {
        errors.insert(
            0,
            FieldError::new("version", format!("must be at least {}", INITIAL_VERSION)),
        );
    }

    if errors.is_empty() {
        Ok((workout, version))
    } else {
        Err(errors)
    }
}

/// Decode and validate a create body (no version)
pub fn decode_create(body: &[u8], rules: &ValidationRules) -> Result<Workout, Vec<FieldError>> {
    let workout: Workout = serde_json::from_slice(body).map_err(|e| vec![decode_error(&e)])?;

    let errors = validate_workout(&workout, rules);
    if errors.is_empty() {
        Ok(workout)
    } else {
        Err(errors)
    }
}

/// Apply the semantic rules to a decoded workout
pub fn validate_workout(workout: &Workout, rules: &ValidationRules) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if !rules.allow_empty_title && workout.title.trim().is_empty() {
        errors.push(FieldError::new("title", "must not be empty"));
    }
    check_len(&mut errors, "title", &workout.title, rules);
    check_len(&mut errors, "description", &workout.description, rules);
    check_non_negative(&mut errors, "duration_minutes", workout.duration_minutes);
    check_non_negative(&mut errors, "calories_burned", workout.calories_burned);

    if workout.entries.len() > rules.max_entries {
        errors.push(FieldError::new(
            "entries",
            format!("at most {} entries allowed", rules.max_entries),
        ));
    }

    for (i, entry) in workout.entries.iter().enumerate() {
        let field = |name: &str| format!("entries[{}].{}", i, name);

        if entry.exercise_name.trim().is_empty() {
            errors.push(FieldError::new(field("exercise_name"), "must not be empty"));
        }
        check_len(&mut errors, &field("exercise_name"), &entry.exercise_name, rules);
        check_len(&mut errors, &field("notes"), &entry.notes, rules);
        check_non_negative(&mut errors, &field("sets"), entry.sets);

        if let Some(reps) = entry.reps {
            check_non_negative(&mut errors, &field("reps"), reps);
        }
        if let Some(duration) = entry.duration_seconds {
            check_non_negative(&mut errors, &field("duration_seconds"), duration);
        }
        if let Some(weight) = entry.weight {
            if !weight.is_finite() || weight < 0.0 {
                errors.push(FieldError::new(field("weight"), "must be a non-negative number"));
            }
        }
    }

    errors
}

// =============================================================================
// Private Helpers
// =============================================================================

fn check_non_negative(errors: &mut Vec<FieldError>, field: &str, value: i64) {
    if value < 0 {
        errors.push(FieldError::new(field, "must not be negative"));
    }
}

fn check_len(errors: &mut Vec<FieldError>, field: &str, value: &str, rules: &ValidationRules) {
    if value.len() > rules.max_text_len {
        errors.push(FieldError::new(
            field,
            format!("longer than {} bytes", rules.max_text_len),
        ));
    }
}

/// Map a serde decode error onto the field it names, if any.
///
/// serde reports missing fields as "missing field `name`"; everything else
/// (bad JSON, wrong types) is attributed to the body as a whole.
fn decode_error(err: &serde_json::Error) -> FieldError {
    let message = err.to_string();

    if let Some(rest) = message.strip_prefix("missing field `") {
        if let Some(end) = rest.find('`') {
            return FieldError::new(&rest[..end], "is required");
        }
    }

    FieldError::new("body", message)
}
