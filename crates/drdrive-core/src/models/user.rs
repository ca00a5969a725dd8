//! User profile and the request bodies derived from it.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Profile record tied to an authenticated session.
///
/// The backend only guarantees `id` and `username`; everything else may be
/// missing, so every other field is optional and skipped when serializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chassis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl User {
    /// "2019 Toyota Corolla". None unless year, make and model are all on file.
    pub fn vehicle_display(&self) -> Option<String> {
        match (self.year, self.make.as_deref(), self.model.as_deref()) {
            (Some(year), Some(make), Some(model)) if !make.is_empty() && !model.is_empty() => {
                Some(format!("{} {} {}", year, make, model))
            }
            _ => None,
        }
    }

    /// Fold an accepted profile update into this record.
    ///
    /// Vehicle fields the update omitted were not sent to the backend, so the
    /// stored values are kept.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        self.username = update.username.clone();
        self.email = Some(update.email.clone());
        self.phone = Some(update.phone.clone());
        if update.year.is_some() {
            self.year = update.year;
        }
        if let Some(ref make) = update.make {
            self.make = Some(make.clone());
        }
        if let Some(ref model) = update.model {
            self.model = Some(model.clone());
        }
        if let Some(ref chassis) = update.chassis {
            self.chassis = Some(chassis.clone());
        }
    }
}

/// Sign-up input as collected by a front-end.
///
/// Vehicle fields are free text; `year` is converted to an integer when the
/// request body is built.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub year: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub chassis: Option<String>,
}

impl Registration {
    pub fn to_request(&self) -> RegisterRequest {
        RegisterRequest {
            username: self.username.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            phone: self.phone.clone(),
            year: parse_year(self.year.as_deref()),
            make: provided(&self.make),
            model: provided(&self.model),
            chassis: provided(&self.chassis),
        }
    }
}

/// Body of `POST /register`. Absent optional fields are omitted, never null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chassis: Option<String>,
}

/// Editable profile fields, prefilled from the current user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub year: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub chassis: Option<String>,
}

impl ProfileForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone().unwrap_or_default(),
            phone: user.phone.clone().unwrap_or_default(),
            year: user.year.map(|y| y.to_string()),
            make: user.make.clone(),
            model: user.model.clone(),
            chassis: user.chassis.clone(),
        }
    }

    pub fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            username: self.username.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            year: parse_year(self.year.as_deref()),
            make: provided(&self.make),
            model: provided(&self.model),
            chassis: provided(&self.chassis),
        }
    }
}

/// Body of `PUT /profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chassis: Option<String>,
}

/// Blank optional text counts as not provided
fn provided(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .filter(|v| !v.trim().is_empty())
        .cloned()
}

fn parse_year(raw: Option<&str>) -> Option<i32> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match raw.parse() {
        Ok(year) => Some(year),
        Err(_) => {
            warn!(year = raw, "Ignoring non-numeric vehicle year");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        serde_json::from_str(r#"{"id": 1, "username": "alice"}"#)
            .expect("Failed to parse minimal user")
    }

    #[test]
    fn test_minimal_user_round_trips_without_nulls() {
        let user = alice();
        assert_eq!(user.email, None);
        assert_eq!(
            serde_json::to_string(&user).unwrap(),
            r#"{"id":1,"username":"alice"}"#
        );
    }

    #[test]
    fn test_full_user_parses_backend_payload() {
        let json = r#"{"id":7,"username":"bob","email":"bob@example.com","phone":"5551234567","chassis":"JT123","year":2019,"make":"Toyota","model":"Corolla","created_at":"2024-05-01T10:00:00Z","updated_at":"2024-05-02T10:00:00Z"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.year, Some(2019));
        assert_eq!(user.vehicle_display().as_deref(), Some("2019 Toyota Corolla"));
    }

    #[test]
    fn test_vehicle_display_empty() {
        assert_eq!(alice().vehicle_display(), None);
    }

    #[test]
    fn test_vehicle_display_needs_year_make_and_model() {
        let mut user = alice();
        user.make = Some("Toyota".into());
        assert_eq!(user.vehicle_display(), None);

        user.model = Some("Corolla".into());
        assert_eq!(user.vehicle_display(), None);

        user.year = Some(2019);
        assert_eq!(user.vehicle_display().as_deref(), Some("2019 Toyota Corolla"));

        user.model = Some(String::new());
        assert_eq!(user.vehicle_display(), None);
    }

    #[test]
    fn test_register_request_omits_absent_optionals() {
        let registration = Registration {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "secret1".into(),
            phone: "5551234567".into(),
            year: Some(String::new()),
            make: Some("Honda".into()),
            model: None,
            chassis: Some("  ".into()),
        };
        let body = serde_json::to_value(registration.to_request()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "secret1",
                "phone": "5551234567",
                "make": "Honda"
            })
        );
    }

    #[test]
    fn test_register_request_sends_year_as_integer() {
        let registration = Registration {
            year: Some(" 2021 ".into()),
            ..Default::default()
        };
        let body = serde_json::to_value(registration.to_request()).unwrap();
        assert_eq!(body["year"], serde_json::json!(2021));
    }

    #[test]
    fn test_parse_year_rejects_garbage() {
        assert_eq!(parse_year(Some("abc")), None);
        assert_eq!(parse_year(None), None);
        assert_eq!(parse_year(Some("1999")), Some(1999));
    }

    #[test]
    fn test_profile_form_prefill_and_apply() {
        let mut user = alice();
        user.make = Some("Ford".into());
        user.year = Some(2010);

        let mut form = ProfileForm::from_user(&user);
        assert_eq!(form.year.as_deref(), Some("2010"));
        form.email = "alice@example.com".into();
        form.phone = "5550000000".into();
        form.make = None;
        form.model = Some("Focus".into());

        let update = form.to_update();
        user.apply(&update);

        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
        assert_eq!(user.make.as_deref(), Some("Ford"));
        assert_eq!(user.model.as_deref(), Some("Focus"));
        assert_eq!(user.year, Some(2010));
    }
}
