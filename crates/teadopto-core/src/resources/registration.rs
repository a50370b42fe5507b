//! Account registration.
//!
//! Registration goes to the public `users/` endpoint without the stored
//! credential, so a stale session never interferes with sign-up and a 401
//! here never logs anyone out.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::api::{
    ApiClient, ApiError, ApiErrorKind, RequestBody, UNREACHABLE_MESSAGE, first_message,
};
use crate::session::{Role, UserProfile};

const USERS_PATH: &str = "users/";

/// Summary shown when local validation fails.
pub const FIX_FORM_MESSAGE: &str = "Please fix the errors in the form.";
/// Summary shown when the backend gives nothing more specific.
pub const GENERIC_REGISTRATION_MESSAGE: &str = "Registration failed. Check your details.";

/// Fields whose backend error becomes the summary, in priority order.
const SUMMARY_FIELDS: [&str; 5] = [
    "username",
    "email",
    "password",
    "shelter_name",
    "shelter_address",
];

/// Every field the backend may report an error for.
const FORM_FIELDS: [&str; 7] = [
    "username",
    "email",
    "password",
    "phone",
    "role",
    "shelter_name",
    "shelter_address",
];

/// Sign-up data.
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: Role,
    pub shelter_name: Option<String>,
    pub shelter_address: Option<String>,
}

impl RegistrationForm {
    /// A client sign-up with no phone.
    pub fn client(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            phone: None,
            role: Role::Client,
            shelter_name: None,
            shelter_address: None,
        }
    }

    /// Checks the form with the rules the backend enforces.
    ///
    /// Returns one message per invalid field; empty when the form is valid.
    pub fn validate(&self) -> BTreeMap<String, String> {
        let mut errors = BTreeMap::new();
        let mut reject = |field: &str, message: &str| {
            errors.insert(field.to_string(), message.to_string());
        };

        let username = self.username.trim();
        if username.is_empty() {
            reject("username", "Username is required.");
        } else if !valid_username(username) {
            reject(
                "username",
                "Use 3-30 letters, digits, spaces, hyphens (-) or underscores (_).",
            );
        }

        let email = self.email.trim();
        if email.is_empty() {
            reject("email", "Email is required.");
        } else if !valid_email(email) {
            reject("email", "Invalid format. Example: jane.doe@example.com");
        }

        if self.password.is_empty() {
            reject("password", "Password is required.");
        } else if self.password.chars().count() < 8 {
            reject("password", "At least 8 characters.");
        } else if !self.password.chars().any(|c| c.is_ascii_alphabetic()) {
            reject("password", "Must contain at least one letter.");
        } else if !self.password.chars().any(|c| c.is_ascii_digit()) {
            reject("password", "Must contain at least one number.");
        }

        if let Some(phone) = non_blank(self.phone.as_deref())
            && !valid_phone(phone)
        {
            reject(
                "phone",
                "10 digits or international format (+ followed by 10-15 digits).",
            );
        }

        match self.role {
            Role::Client => {}
            Role::Shelter => {
                if non_blank(self.shelter_name.as_deref()).is_none() {
                    reject("shelter_name", "Shelter name is required.");
                }
                if non_blank(self.shelter_address.as_deref()).is_none() {
                    reject("shelter_address", "Shelter address is required.");
                }
            }
            Role::Admin => reject("role", "Role must be client or shelter."),
        }

        errors
    }

    fn payload(&self) -> RegistrationPayload<'_> {
        let shelter = self.role == Role::Shelter;
        RegistrationPayload {
            username: self.username.trim(),
            email: self.email.trim(),
            password: &self.password,
            phone: self.phone.as_deref().map_or("", str::trim),
            role: self.role,
            shelter_name: shelter.then(|| self.shelter_name.as_deref().map_or("", str::trim)),
            shelter_address: shelter
                .then(|| self.shelter_address.as_deref().map_or("", str::trim)),
        }
    }
}

#[derive(Debug, Serialize)]
struct RegistrationPayload<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
    phone: &'a str,
    role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    shelter_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shelter_address: Option<&'a str>,
}

/// A rejected registration: per-field messages plus one summary line.
#[derive(Debug, Clone)]
pub struct RegistrationError {
    pub summary: String,
    pub field_errors: BTreeMap<String, String>,
    /// The backend error, when the rejection came from the server
    pub source: Option<ApiError>,
}

impl RegistrationError {
    fn local(field_errors: BTreeMap<String, String>) -> Self {
        Self {
            summary: FIX_FORM_MESSAGE.to_string(),
            field_errors,
            source: None,
        }
    }

    /// Maps a backend failure onto field errors and a summary.
    pub fn from_api(err: ApiError) -> Self {
        let body = err.body.as_ref().and_then(|b| b.as_object());

        let mut field_errors = BTreeMap::new();
        if let Some(body) = body {
            for field in FORM_FIELDS {
                if let Some(message) = body.get(field).and_then(first_message) {
                    field_errors.insert(field.to_string(), message);
                }
            }
        }

        let from_fields = SUMMARY_FIELDS
            .iter()
            .find_map(|field| field_errors.get(*field).cloned());
        let from_body = || {
            if !field_errors.is_empty() {
                return None;
            }
            let body = body?;
            ["non_field_errors", "detail"]
                .iter()
                .find_map(|key| body.get(*key).and_then(first_message))
        };

        let summary = match from_fields.or_else(from_body) {
            Some(message) => message,
            None if matches!(err.kind, ApiErrorKind::Transport | ApiErrorKind::Timeout) => {
                UNREACHABLE_MESSAGE.to_string()
            }
            None => GENERIC_REGISTRATION_MESSAGE.to_string(),
        };

        Self {
            summary,
            field_errors,
            source: Some(err),
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.field_errors.get(name).map(String::as_str)
    }
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary)
    }
}

impl std::error::Error for RegistrationError {}

/// Validates and submits a registration, returning the created profile.
///
/// # Errors
/// Returns a [`RegistrationError`] when local validation fails (no request is
/// sent) or the backend rejects the submission.
pub async fn register(
    client: &ApiClient,
    form: &RegistrationForm,
) -> Result<UserProfile, RegistrationError> {
    let field_errors = form.validate();
    if !field_errors.is_empty() {
        return Err(RegistrationError::local(field_errors));
    }

    let body = RequestBody::json(&form.payload()).map_err(RegistrationError::from_api)?;
    let response = client
        .anonymous()
        .post(USERS_PATH, body)
        .await
        .map_err(RegistrationError::from_api)?;

    let profile = response
        .json::<UserProfile>()
        .map_err(RegistrationError::from_api)?;
    tracing::info!(username = %profile.username, role = %profile.role, "account registered");
    Ok(profile)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn valid_username(username: &str) -> bool {
    let len = username.chars().count();
    (3..=30).contains(&len)
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || c == '_' || c == '-')
}

fn valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c))
        && !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
}

fn valid_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (10..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn shelter_form() -> RegistrationForm {
        RegistrationForm {
            role: Role::Shelter,
            shelter_name: Some("Happy Paws".to_string()),
            shelter_address: Some("12 Main St".to_string()),
            ..RegistrationForm::client("happy paws", "team@happypaws.org", "secret123")
        }
    }

    #[test]
    fn test_valid_forms_pass() {
        assert!(RegistrationForm::client("Juan Perez", "juan.perez@example.com", "abc12345")
            .validate()
            .is_empty());
        assert!(shelter_form().validate().is_empty());
    }

    #[test]
    fn test_username_rules() {
        assert!(valid_username("ana"));
        assert!(valid_username("ana_maria-2"));
        assert!(!valid_username("an"));
        assert!(!valid_username(&"a".repeat(31)));
        assert!(!valid_username("ana!"));
    }

    #[test]
    fn test_email_rules() {
        assert!(valid_email("a.b+c@mail.example.co"));
        assert!(!valid_email("no-at-sign.com"));
        assert!(!valid_email("a@b@c.com"));
        assert!(!valid_email("a@example.c"));
        assert!(!valid_email("a@.com"));
        assert!(!valid_email("a@example.c0m"));
    }

    #[test]
    fn test_password_rules_report_first_problem() {
        let mut form = RegistrationForm::client("ana", "ana@example.com", "short1");
        assert_eq!(
            form.validate().get("password").map(String::as_str),
            Some("At least 8 characters.")
        );
        form.password = "12345678".to_string();
        assert_eq!(
            form.validate().get("password").map(String::as_str),
            Some("Must contain at least one letter.")
        );
        form.password = "abcdefgh".to_string();
        assert_eq!(
            form.validate().get("password").map(String::as_str),
            Some("Must contain at least one number.")
        );
    }

    #[test]
    fn test_phone_rules() {
        assert!(valid_phone("1234567890"));
        assert!(valid_phone("+123456789012345"));
        assert!(!valid_phone("+1234"));
        assert!(!valid_phone("123-456-7890"));

        let mut form = RegistrationForm::client("ana", "ana@example.com", "abc12345");
        form.phone = Some("   ".to_string());
        assert!(form.validate().is_empty());
    }

    #[test]
    fn test_shelter_requires_name_and_address() {
        let form = RegistrationForm {
            shelter_name: Some("  ".to_string()),
            shelter_address: None,
            ..shelter_form()
        };
        let errors = form.validate();
        assert!(errors.contains_key("shelter_name"));
        assert!(errors.contains_key("shelter_address"));
    }

    #[test]
    fn test_admin_role_rejected_locally() {
        let form = RegistrationForm {
            role: Role::Admin,
            ..RegistrationForm::client("ana", "ana@example.com", "abc12345")
        };
        assert!(form.validate().contains_key("role"));
    }

    #[test]
    fn test_payload_trims_and_omits_shelter_fields_for_clients() {
        let mut form = RegistrationForm::client("  ana ", " ana@example.com ", "abc12345");
        form.shelter_name = Some("ignored".to_string());
        let payload = serde_json::to_value(form.payload()).unwrap();
        assert_eq!(
            payload,
            json!({
                "username": "ana",
                "email": "ana@example.com",
                "password": "abc12345",
                "phone": "",
                "role": "client"
            })
        );

        let payload = serde_json::to_value(shelter_form().payload()).unwrap();
        assert_eq!(payload["shelter_name"], "Happy Paws");
        assert_eq!(payload["role"], "shelter");
    }

    #[test]
    fn test_backend_field_errors_keep_first_message() {
        let err = RegistrationError::from_api(ApiError::http_status(
            400,
            json!({
                "email": ["already registered", "second"],
                "phone": ["bad phone"]
            }),
        ));
        assert_eq!(err.field("email"), Some("already registered"));
        assert_eq!(err.field("phone"), Some("bad phone"));
        assert_eq!(err.summary, "already registered");
    }

    #[test]
    fn test_summary_prefers_username() {
        let err = RegistrationError::from_api(ApiError::http_status(
            400,
            json!({"password": ["too weak"], "username": ["taken"]}),
        ));
        assert_eq!(err.summary, "taken");
    }

    #[test]
    fn test_summary_phone_only_is_generic() {
        let err = RegistrationError::from_api(ApiError::http_status(
            400,
            json!({"phone": ["bad phone"]}),
        ));
        assert_eq!(err.summary, GENERIC_REGISTRATION_MESSAGE);
    }

    #[test]
    fn test_summary_non_field_errors_beat_detail() {
        let err = RegistrationError::from_api(ApiError::http_status(
            400,
            json!({"detail": "nope", "non_field_errors": ["duplicate account"]}),
        ));
        assert_eq!(err.summary, "duplicate account");
        assert!(err.field_errors.is_empty());
    }

    #[test]
    fn test_summary_unreachable() {
        let err = RegistrationError::from_api(ApiError::new(ApiErrorKind::Transport, "refused"));
        assert_eq!(err.summary, UNREACHABLE_MESSAGE);
    }
}
