//! Module access checks.
//!
//! Authorization is enforced server-side; the client only hides screens a
//! user cannot use. The check is a pure function of an explicit
//! [`AccessContext`] handed to whoever needs it, never a global store.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_HR_MANAGER: &str = "hr_manager";
pub const ROLE_FINANCE: &str = "finance";
pub const ROLE_EMPLOYEE: &str = "employee";

pub const MODULE_PAYROLL: &str = "payroll";
pub const MODULE_BENEFITS: &str = "benefits";
pub const MODULE_TRAINING: &str = "training";
pub const MODULE_PROBATION: &str = "probation";
pub const MODULE_ASSETS: &str = "assets";
pub const MODULE_FINANCE: &str = "finance";
pub const MODULE_REPORTS: &str = "reports";
pub const MODULE_IMPORTS: &str = "imports";
pub const MODULE_SELF_SERVICE: &str = "self_service";

/// The signed-in user's roles and granted module codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessContext {
    #[serde(default)]
    pub roles: BTreeSet<String>,
    #[serde(default)]
    pub modules: BTreeSet<String>,
}

impl AccessContext {
    pub fn new<R, M>(roles: R, modules: M) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            modules: modules.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    /// Admins reach every module; everyone else needs the module granted.
    pub fn can_access(&self, module_code: &str) -> bool {
        self.is_admin() || self.modules.contains(module_code)
    }

    pub fn require(&self, module_code: &str) -> Result<(), CoreError> {
        if self.can_access(module_code) {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!(
                "Access to module '{module_code}' is not granted"
            )))
        }
    }
}
