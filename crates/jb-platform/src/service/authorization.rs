//! Access Policy
//!
//! A pure decision function over `(actor, action)`. Actions carry the
//! ownership facts the decision needs, so callers look the resource up
//! first (and report NotFound) before asking whether the actor may touch it.

use jb_common::UserRole;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{PlatformError, Result};

/// The resolved caller for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl AuthContext {
    pub fn new(user_id: Uuid, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id,
            email: email.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn has_any_role(&self, roles: &[UserRole]) -> bool {
        roles.contains(&self.role)
    }

    /// Owner of the resource, or an admin
    pub fn owns_or_admin(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id || self.is_admin()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateJob,
    UpdateJob { recruiter_id: Uuid },
    DeleteJob { recruiter_id: Uuid },
    Apply { job_active: bool },
    ListJobApplications { recruiter_id: Uuid },
    UpdateApplicationStatus { recruiter_id: Uuid },
    WithdrawApplication { applicant_id: Uuid },
    UpdateProfile { profile_id: Uuid },
    Administer,
}

pub const INSUFFICIENT_PERMISSIONS: &str = "Insufficient permissions";

pub fn authorize(actor: &AuthContext, action: Action) -> Result<()> {
    use UserRole::*;

    let (allowed, message) = match action {
        Action::CreateJob => (actor.has_any_role(&[Recruiter, Admin]), INSUFFICIENT_PERMISSIONS),
        Action::UpdateJob { recruiter_id } => (
            actor.owns_or_admin(recruiter_id),
            "Not authorized to update this job",
        ),
        Action::DeleteJob { recruiter_id } => (
            actor.owns_or_admin(recruiter_id),
            "Not authorized to delete this job",
        ),
        Action::Apply { job_active } => {
            if actor.role != JobSeeker {
                (false, INSUFFICIENT_PERMISSIONS)
            } else {
                (job_active, "This job is no longer accepting applications")
            }
        }
        Action::ListJobApplications { recruiter_id } => (
            actor.owns_or_admin(recruiter_id),
            "Not authorized to view these applications",
        ),
        Action::UpdateApplicationStatus { recruiter_id } => (
            actor.owns_or_admin(recruiter_id),
            "Not authorized to update this application",
        ),
        Action::WithdrawApplication { applicant_id } => (
            actor.user_id == applicant_id,
            "Not authorized to withdraw this application",
        ),
        Action::UpdateProfile { profile_id } => (
            actor.user_id == profile_id,
            "Cannot update other users profiles",
        ),
        Action::Administer => (actor.is_admin(), INSUFFICIENT_PERMISSIONS),
    };

    if allowed {
        Ok(())
    } else {
        Err(PlatformError::forbidden(message))
    }
}

/// Proof that the caller was verified as an admin.
///
/// Only [`checks::require_admin`] can construct one; operations that use the
/// elevated store key take it as a parameter.
#[derive(Debug)]
pub struct AdminGrant {
    actor: Uuid,
}

impl AdminGrant {
    pub fn actor(&self) -> Uuid {
        self.actor
    }
}

pub mod checks {
    use super::*;

    /// Route-level role gate
    pub fn require_role(ctx: &AuthContext, roles: &[UserRole]) -> Result<()> {
        if ctx.has_any_role(roles) {
            Ok(())
        } else {
            Err(PlatformError::forbidden(INSUFFICIENT_PERMISSIONS))
        }
    }

    pub fn require_admin(ctx: &AuthContext) -> Result<AdminGrant> {
        authorize(ctx, Action::Administer)?;
        Ok(AdminGrant { actor: ctx.user_id })
    }
}
