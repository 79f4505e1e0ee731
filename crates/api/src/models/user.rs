//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use homestead_core::{Email, PropertyId, UserId};

use super::{ValidationError, require_text};

/// A registered user.
///
/// The password hash is deliberately absent: it lives only in the repository
/// layer and is never serialized into a response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone_number: String,
    pub profile_pic_url: Option<String>,
    /// Liked property ids, unique, in the order they were liked.
    pub liked_properties: Vec<PropertyId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration request body.
///
/// Implements `Debug` manually so the password never reaches a log line.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
    #[serde(default)]
    pub profile_pic_url: Option<String>,
    pub password: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("phone_number", &self.phone_number)
            .field("email", &self.email)
            .field("profile_pic_url", &self.profile_pic_url)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl NewUser {
    /// Check required fields and return the normalized email.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a required field is blank or the email is
    /// malformed.
    pub fn validate(&self) -> Result<Email, ValidationError> {
        require_text(&self.first_name, "firstName")?;
        require_text(&self.last_name, "lastName")?;
        require_text(&self.phone_number, "phoneNumber")?;
        if self.password.is_empty() {
            return Err(ValidationError::Required("password"));
        }

        Email::normalized(&self.email).map_err(|source| ValidationError::InvalidEmail {
            field: "email",
            source,
        })
    }
}

/// Partial user update as sent by clients.
///
/// Only the fields listed here can be changed; anything else in the body is
/// rejected rather than written through.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub profile_pic_url: Option<String>,
    pub liked_properties: Option<Vec<PropertyId>>,
}

/// A validated user patch, ready for the repository.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<Email>,
    pub phone_number: Option<String>,
    pub profile_pic_url: Option<String>,
    pub liked_properties: Option<Vec<PropertyId>>,
}

impl UserChanges {
    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone_number.is_none()
            && self.profile_pic_url.is_none()
            && self.liked_properties.is_none()
    }
}

impl TryFrom<UserPatch> for UserChanges {
    type Error = ValidationError;

    fn try_from(patch: UserPatch) -> Result<Self, Self::Error> {
        for (value, field) in [
            (&patch.first_name, "firstName"),
            (&patch.last_name, "lastName"),
            (&patch.phone_number, "phoneNumber"),
        ] {
            if let Some(value) = value {
                require_text(value, field)?;
            }
        }

        let email = patch
            .email
            .as_deref()
            .map(Email::normalized)
            .transpose()
            .map_err(|source| ValidationError::InvalidEmail {
                field: "email",
                source,
            })?;

        let liked_properties = patch.liked_properties.map(|ids| {
            let mut unique = Vec::with_capacity(ids.len());
            for id in ids {
                if !unique.contains(&id) {
                    unique.push(id);
                }
            }
            unique
        });

        Ok(Self {
            first_name: patch.first_name,
            last_name: patch.last_name,
            email,
            phone_number: patch.phone_number,
            profile_pic_url: patch.profile_pic_url,
            liked_properties,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone_number: "555-0100".to_string(),
            email: email.to_string(),
            profile_pic_url: None,
            password: "hunter22".to_string(),
        }
    }

    #[test]
    fn test_new_user_normalizes_email() {
        let email = new_user("  Ada@Example.com ").validate().unwrap();
        assert_eq!(email.as_str(), "ada@example.com");
    }

    #[test]
    fn test_new_user_rejects_blank_name() {
        let mut user = new_user("ada@example.com");
        user.first_name = "   ".to_string();
        assert!(matches!(
            user.validate(),
            Err(ValidationError::Required("firstName"))
        ));
    }

    #[test]
    fn test_new_user_rejects_bad_email() {
        assert!(matches!(
            new_user("not-an-email").validate(),
            Err(ValidationError::InvalidEmail { .. })
        ));
    }

    #[test]
    fn test_new_user_debug_redacts_password() {
        let debug = format!("{:?}", new_user("ada@example.com"));
        assert!(!debug.contains("hunter22"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_new_user_deserializes_camel_case() {
        let user: NewUser = serde_json::from_str(
            r#"{"firstName":"A","lastName":"B","phoneNumber":"1","email":"a@b.c","password":"pw"}"#,
        )
        .unwrap();
        assert_eq!(user.first_name, "A");
        assert!(user.profile_pic_url.is_none());
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let result: Result<UserPatch, _> = serde_json::from_str(r#"{"password":"plaintext"}"#);
        assert!(result.is_err());

        let result: Result<UserPatch, _> = serde_json::from_str(r#"{"id":5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_dedups_liked_properties() {
        let patch: UserPatch = serde_json::from_str(r#"{"likedProperties":[3,1,3,2,1]}"#).unwrap();
        let changes = UserChanges::try_from(patch).unwrap();
        assert_eq!(
            changes.liked_properties,
            Some(vec![
                PropertyId::new(3),
                PropertyId::new(1),
                PropertyId::new(2)
            ])
        );
    }

    #[test]
    fn test_patch_normalizes_email() {
        let patch = UserPatch {
            email: Some(" New@Example.com".to_string()),
            ..UserPatch::default()
        };
        let changes = UserChanges::try_from(patch).unwrap();
        assert_eq!(changes.email.unwrap().as_str(), "new@example.com");
    }

    #[test]
    fn test_empty_patch() {
        let changes = UserChanges::try_from(UserPatch::default()).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_user_serialization_has_no_password() {
        let user = User {
            id: UserId::new(1),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: Email::parse("ada@example.com").unwrap(),
            phone_number: "555-0100".to_string(),
            profile_pic_url: None,
            liked_properties: vec![PropertyId::new(9)],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["likedProperties"][0], 9);
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
    }
}
