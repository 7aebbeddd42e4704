//! Job Listing Entity

use chrono::{DateTime, NaiveDate, Utc};
use jb_common::{ExperienceLevel, JobType};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{default_true, null_as_default, require_text, RecruiterSummary};

pub const DEFAULT_SALARY_CURRENCY: &str = "USD";

fn default_currency() -> String {
    DEFAULT_SALARY_CURRENCY.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Job {
    pub id: Uuid,
    pub recruiter_id: Uuid,
    pub title: String,
    pub description: String,
    pub company_name: String,
    pub location: String,
    pub job_type: JobType,
    pub experience_level: ExperienceLevel,

    #[serde(default)]
    pub salary_min: Option<i64>,
    #[serde(default)]
    pub salary_max: Option<i64>,
    #[serde(default = "default_currency")]
    pub salary_currency: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub required_skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub benefits: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_deadline: Option<String>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    /// Maintained by the store
    #[serde(default, deserialize_with = "null_as_default")]
    pub views_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub applications_count: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.recruiter_id == user_id
    }
}

/// Client payload for creating a listing.
///
/// Server-managed columns (`id`, `recruiter_id`, counters, timestamps) are
/// rejected as unknown fields rather than silently accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct JobDraft {
    pub title: String,
    pub description: String,
    pub company_name: String,
    pub location: String,
    pub job_type: JobType,
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub salary_min: Option<i64>,
    #[serde(default)]
    pub salary_max: Option<i64>,
    #[serde(default = "default_currency")]
    pub salary_currency: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_deadline: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl JobDraft {
    pub fn validate(&self) -> Result<(), String> {
        require_text("title", &self.title)?;
        require_text("description", &self.description)?;
        require_text("company_name", &self.company_name)?;
        require_text("location", &self.location)?;
        require_text("salary_currency", &self.salary_currency)?;
        validate_salary(self.salary_min, self.salary_max)?;
        if let Some(deadline) = &self.application_deadline {
            validate_deadline(deadline)?;
        }
        Ok(())
    }
}

/// Row inserted for a new listing
#[derive(Debug, Clone, Serialize)]
pub struct NewJob {
    pub recruiter_id: Uuid,
    #[serde(flatten)]
    pub draft: JobDraft,
}

/// Partial listing update. Server-managed columns are not represented and
/// are therefore stripped from client payloads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct JobPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<JobType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefits: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl JobPatch {
    /// Validate against the current row so min/max stay ordered after merge
    pub fn validate_against(&self, current: &Job) -> Result<(), String> {
        for (field, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("company_name", &self.company_name),
            ("location", &self.location),
            ("salary_currency", &self.salary_currency),
        ] {
            if let Some(v) = value {
                require_text(field, v)?;
            }
        }
        validate_salary(
            self.salary_min.or(current.salary_min),
            self.salary_max.or(current.salary_max),
        )?;
        if let Some(deadline) = &self.application_deadline {
            validate_deadline(deadline)?;
        }
        Ok(())
    }
}

fn validate_salary(min: Option<i64>, max: Option<i64>) -> Result<(), String> {
    if min.is_some_and(|v| v < 0) || max.is_some_and(|v| v < 0) {
        return Err("Salary values must be non-negative".to_string());
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err("salary_min cannot exceed salary_max".to_string());
        }
    }
    Ok(())
}

/// Accepts a calendar date or an RFC 3339 timestamp
fn validate_deadline(value: &str) -> Result<(), String> {
    let valid = NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(value).is_ok();
    if valid {
        Ok(())
    } else {
        Err(format!("Invalid application_deadline: {}", value))
    }
}

/// Listing columns joined into applications and saved jobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct JobSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub company_name: String,
    pub location: String,
    pub job_type: JobType,
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub salary_min: Option<i64>,
    #[serde(default)]
    pub salary_max: Option<i64>,
    pub salary_currency: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Job> for JobSummary {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id,
            title: job.title.clone(),
            description: job.description.clone(),
            company_name: job.company_name.clone(),
            location: job.location.clone(),
            job_type: job.job_type,
            experience_level: job.experience_level,
            salary_min: job.salary_min,
            salary_max: job.salary_max,
            salary_currency: job.salary_currency.clone(),
            is_active: job.is_active,
            created_at: job.created_at,
        }
    }
}

/// A listing with its recruiter embedded under `profiles`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobWithRecruiter {
    #[serde(flatten)]
    pub job: Job,
    pub profiles: Option<RecruiterSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft_json() -> serde_json::Value {
        json!({
            "title": "Backend Engineer",
            "description": "Build APIs",
            "company_name": "Acme",
            "location": "Remote",
            "job_type": "full_time",
            "experience_level": "senior",
            "salary_min": 100000,
            "salary_max": 150000,
            "required_skills": ["rust", "postgres"]
        })
    }

    #[test]
    fn test_draft_defaults() {
        let draft: JobDraft = serde_json::from_value(draft_json()).unwrap();
        assert_eq!(draft.salary_currency, "USD");
        assert!(draft.is_active);
        assert!(draft.benefits.is_empty());
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_draft_rejects_server_fields() {
        for field in ["id", "recruiter_id", "views_count", "applications_count", "created_at"] {
            let mut body = draft_json();
            body[field] = json!("x");
            assert!(
                serde_json::from_value::<JobDraft>(body).is_err(),
                "{field} should be rejected"
            );
        }
    }

    #[test]
    fn test_draft_rejects_unknown_enum_values() {
        let mut body = draft_json();
        body["job_type"] = json!("gig");
        assert!(serde_json::from_value::<JobDraft>(body).is_err());
    }

    #[test]
    fn test_draft_validation() {
        let mut draft: JobDraft = serde_json::from_value(draft_json()).unwrap();
        draft.title = "   ".to_string();
        assert_eq!(draft.validate().unwrap_err(), "title is required");

        let mut draft: JobDraft = serde_json::from_value(draft_json()).unwrap();
        draft.salary_min = Some(200000);
        assert!(draft.validate().is_err());

        let mut draft: JobDraft = serde_json::from_value(draft_json()).unwrap();
        draft.salary_min = Some(-1);
        assert!(draft.validate().is_err());

        let mut draft: JobDraft = serde_json::from_value(draft_json()).unwrap();
        draft.application_deadline = Some("2030-01-31".to_string());
        assert!(draft.validate().is_ok());
        draft.application_deadline = Some("next week".to_string());
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_patch_strips_server_fields() {
        let patch: JobPatch = serde_json::from_value(json!({
            "title": "New title",
            "id": "00000000-0000-0000-0000-000000000000",
            "recruiter_id": "00000000-0000-0000-0000-000000000000",
            "views_count": 99,
            "applications_count": 99,
            "created_at": "2020-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "title": "New title" }));
    }

    #[test]
    fn test_new_job_flattens_draft() {
        let draft: JobDraft = serde_json::from_value(draft_json()).unwrap();
        let recruiter_id = Uuid::new_v4();
        let row = serde_json::to_value(NewJob { recruiter_id, draft }).unwrap();
        assert_eq!(row["recruiter_id"], json!(recruiter_id));
        assert_eq!(row["title"], "Backend Engineer");
        assert!(row.get("draft").is_none());
    }
}
