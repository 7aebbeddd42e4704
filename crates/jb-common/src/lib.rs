use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

pub mod telemetry;

/// Error returned when a wire value does not name a known variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! wire_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(ParseEnumError { kind: $kind, value: s.to_string() }),
                }
            }
        }
    };
}

// ============================================================================
// Identity Types
// ============================================================================

/// Role carried by every profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    JobSeeker,
    Recruiter,
    Admin,
}

wire_enum!(UserRole, "role", {
    JobSeeker => "job_seeker",
    Recruiter => "recruiter",
    Admin => "admin",
});

impl Default for UserRole {
    fn default() -> Self {
        Self::JobSeeker
    }
}

// ============================================================================
// Listing Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Internship,
}

wire_enum!(JobType, "job type", {
    FullTime => "full_time",
    PartTime => "part_time",
    Contract => "contract",
    Internship => "internship",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
    Lead,
}

wire_enum!(ExperienceLevel, "experience level", {
    Entry => "entry",
    Mid => "mid",
    Senior => "senior",
    Lead => "lead",
});

// ============================================================================
// Application Lifecycle
// ============================================================================

/// Status of a job application
///
/// The documented lifecycle is:
///
/// ```text
/// pending     -> reviewing | shortlisted | rejected | accepted
/// reviewing   -> shortlisted | rejected | accepted
/// shortlisted -> rejected | accepted
/// rejected, accepted: terminal
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewing,
    Shortlisted,
    Rejected,
    Accepted,
}

wire_enum!(ApplicationStatus, "application status", {
    Pending => "pending",
    Reviewing => "reviewing",
    Shortlisted => "shortlisted",
    Rejected => "rejected",
    Accepted => "accepted",
});

impl Default for ApplicationStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl ApplicationStatus {
    /// Statuses reachable in one step
    pub fn successors(&self) -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;
        match self {
            Pending => &[Reviewing, Shortlisted, Rejected, Accepted],
            Reviewing => &[Shortlisted, Rejected, Accepted],
            Shortlisted => &[Rejected, Accepted],
            Rejected | Accepted => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.successors().is_empty()
    }

    /// Re-asserting the current status is always permitted (notes-only edits)
    pub fn can_advance_to(&self, next: ApplicationStatus) -> bool {
        *self == next || self.successors().contains(&next)
    }
}

// ============================================================================
// Notification Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Application,
    JobUpdate,
    Message,
    System,
}

wire_enum!(NotificationType, "notification type", {
    Application => "application",
    JobUpdate => "job_update",
    Message => "message",
    System => "system",
});

// ============================================================================
// Pagination
// ============================================================================

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

impl PageRequest {
    /// Page is floored at 1, limit is clamped to `1..=MAX_PAGE_SIZE`
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    /// Inclusive row range `(from, to)` covered by this page
    pub fn range(&self) -> (u64, u64) {
        let from = self.offset();
        (from, from + u64::from(self.limit) - 1)
    }
}

/// Pagination block returned alongside every list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: u64) -> Self {
        Self {
            page: request.page,
            limit: request.limit,
            total,
            total_pages: total.div_ceil(u64::from(request.limit)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_round_trip_through_serde() {
        assert_eq!(serde_json::to_string(&UserRole::JobSeeker).unwrap(), "\"job_seeker\"");
        assert_eq!(serde_json::to_string(&JobType::FullTime).unwrap(), "\"full_time\"");
        assert_eq!(serde_json::to_string(&NotificationType::JobUpdate).unwrap(), "\"job_update\"");

        for status in ApplicationStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_from_str_rejects_unknown_values() {
        assert_eq!("recruiter".parse::<UserRole>().unwrap(), UserRole::Recruiter);
        assert_eq!("lead".parse::<ExperienceLevel>().unwrap(), ExperienceLevel::Lead);

        let err = "superuser".parse::<UserRole>().unwrap_err();
        assert_eq!(err.kind, "role");
        assert!(err.to_string().contains("superuser"));
        assert!("Full_Time".parse::<JobType>().is_err());
    }

    #[test]
    fn test_status_lifecycle() {
        use ApplicationStatus::*;

        assert!(Pending.can_advance_to(Accepted));
        assert!(Reviewing.can_advance_to(Shortlisted));
        assert!(Shortlisted.can_advance_to(Rejected));
        assert!(!Shortlisted.can_advance_to(Reviewing));
        assert!(!Reviewing.can_advance_to(Pending));
        assert!(!Accepted.can_advance_to(Rejected));
        assert!(Rejected.is_terminal());
        assert!(Accepted.is_terminal());
        assert!(!Pending.is_terminal());

        // same-status updates are always allowed
        assert!(Accepted.can_advance_to(Accepted));
    }

    #[test]
    fn test_pagination_arithmetic() {
        let page = PageRequest::new(3, 10);
        assert_eq!(page.offset(), 20);
        assert_eq!(page.range(), (20, 29));

        let pagination = Pagination::new(page, 23);
        assert_eq!(pagination.total_pages, 3);
        assert_eq!(Pagination::new(page, 20).total_pages, 2);
        assert_eq!(Pagination::new(page, 0).total_pages, 0);
    }

    #[test]
    fn test_page_request_clamping() {
        let page = PageRequest::new(0, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 1);
        assert_eq!(page.offset(), 0);

        assert_eq!(PageRequest::new(1, 10_000).limit, MAX_PAGE_SIZE);
        assert_eq!(PageRequest::default().limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_pagination_serializes_camel_case() {
        let json = serde_json::to_value(Pagination::new(PageRequest::new(1, 10), 5)).unwrap();
        assert_eq!(json["totalPages"], 1);
        assert_eq!(json["total"], 5);
    }
}
