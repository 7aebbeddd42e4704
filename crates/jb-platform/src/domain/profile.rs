//! Profile Entity
//!
//! One row per identity. The role column is the source of truth for
//! authorization decisions.

use chrono::{DateTime, Utc};
use jb_common::UserRole;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{default_true, null_as_default, require_text};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub experience_years: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    #[schema(value_type = Vec<Object>)]
    pub education: Vec<serde_json::Value>,

    /// Recruiter-only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_website: Option<String>,

    #[serde(default)]
    pub is_verified: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row written at sign-up; the store fills in the rest
#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
}

impl NewProfile {
    pub fn new(id: Uuid, email: impl Into<String>, full_name: impl Into<String>, role: UserRole) -> Self {
        Self {
            id,
            email: email.into(),
            full_name: full_name.into(),
            role,
        }
    }
}

/// Owner-editable profile fields.
///
/// Identity, role, verification and timestamp columns are not represented,
/// so clients cannot write them; unknown keys are dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ProfilePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_years: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Object>>)]
    pub education: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_website: Option<String>,
}

impl ProfilePatch {
    pub fn with_resume_url(resume_url: impl Into<String>) -> Self {
        Self {
            resume_url: Some(resume_url.into()),
            ..Default::default()
        }
    }

    pub fn touches_company_fields(&self) -> bool {
        self.company_name.is_some() || self.company_website.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.phone.is_none()
            && self.location.is_none()
            && self.bio.is_none()
            && self.avatar_url.is_none()
            && self.resume_url.is_none()
            && self.skills.is_none()
            && self.experience_years.is_none()
            && self.education.is_none()
            && !self.touches_company_fields()
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.full_name {
            require_text("full_name", name)?;
        }
        if let Some(url) = &self.resume_url {
            require_text("resume_url", url)?;
        }
        Ok(())
    }
}

/// Admin-only moderation flags
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileStatusPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
}

impl ProfileStatusPatch {
    pub fn is_empty(&self) -> bool {
        self.is_active.is_none() && self.is_verified.is_none()
    }
}

/// Applicant columns joined into per-job application lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApplicantSummary {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub experience_years: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl From<&Profile> for ApplicantSummary {
    fn from(p: &Profile) -> Self {
        Self {
            id: p.id,
            full_name: p.full_name.clone(),
            email: p.email.clone(),
            phone: p.phone.clone(),
            location: p.location.clone(),
            skills: p.skills.clone(),
            experience_years: p.experience_years,
            avatar_url: p.avatar_url.clone(),
        }
    }
}

/// Recruiter columns joined into job listings and details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecruiterSummary {
    pub id: Uuid,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl RecruiterSummary {
    /// Public view, without the contact email
    pub fn public(p: &Profile) -> Self {
        Self {
            email: None,
            ..Self::with_email(p)
        }
    }

    /// Moderation view
    pub fn with_email(p: &Profile) -> Self {
        Self {
            id: p.id,
            full_name: p.full_name.clone(),
            email: Some(p.email.clone()),
            company_name: p.company_name.clone(),
            company_website: p.company_website.clone(),
            avatar_url: p.avatar_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> serde_json::Value {
        json!({
            "id": "7f1f9a52-58cb-4c1a-9a51-8d3f1f2a6a01",
            "email": "ada@example.com",
            "full_name": "Ada Lovelace",
            "role": "recruiter",
            "skills": null,
            "experience_years": null,
            "education": null,
            "company_name": "Analytical Engines",
            "is_verified": false,
            "is_active": true,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    #[test]
    fn test_profile_tolerates_null_collections() {
        let profile: Profile = serde_json::from_value(row()).unwrap();
        assert!(profile.skills.is_empty());
        assert_eq!(profile.experience_years, 0);
        assert_eq!(profile.role, UserRole::Recruiter);
    }

    #[test]
    fn test_patch_drops_privileged_fields() {
        let patch: ProfilePatch = serde_json::from_value(json!({
            "bio": "Hello",
            "role": "admin",
            "is_verified": true,
            "email": "other@example.com",
            "id": "00000000-0000-0000-0000-000000000000"
        }))
        .unwrap();

        let written = serde_json::to_value(&patch).unwrap();
        assert_eq!(written, json!({ "bio": "Hello" }));
        assert!(!patch.touches_company_fields());
    }

    #[test]
    fn test_patch_validation() {
        let patch = ProfilePatch {
            full_name: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
        assert!(ProfilePatch::default().is_empty());
        assert!(!ProfilePatch::with_resume_url("https://cdn/cv.pdf").is_empty());
    }

    #[test]
    fn test_recruiter_summary_views() {
        let profile: Profile = serde_json::from_value(row()).unwrap();
        assert!(RecruiterSummary::public(&profile).email.is_none());
        assert_eq!(
            RecruiterSummary::with_email(&profile).email.as_deref(),
            Some("ada@example.com")
        );
    }
}
