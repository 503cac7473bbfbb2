use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::UserRole;

/// Portal staff member. BHWs are scoped to a barangay and optionally a purok.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub role: UserRole,
    pub barangay: String,
    pub purok: Option<String>,
    pub contact_number: Option<String>,
    pub is_active: bool,
}

impl User {
    pub fn scope(&self) -> Scope {
        Scope {
            barangay: self.barangay.clone(),
            purok: self.purok.clone(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Scope used to filter lists: `None` (everything) for admins.
    pub fn list_scope(&self) -> Option<Scope> {
        (!self.is_admin()).then(|| self.scope())
    }

    /// Admins see every area; BHWs only their own barangay/purok.
    pub fn can_access(&self, barangay: &str, purok: Option<&str>) -> bool {
        self.is_admin() || self.scope().covers(barangay, purok)
    }
}

/// Geographic scope used to filter residents, requests and programs.
///
/// A `None` purok covers the whole barangay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub barangay: String,
    pub purok: Option<String>,
}

impl Scope {
    pub fn covers(&self, barangay: &str, purok: Option<&str>) -> bool {
        if !self.barangay.eq_ignore_ascii_case(barangay) {
            return false;
        }
        match (&self.purok, purok) {
            (None, _) => true,
            (Some(mine), Some(theirs)) => mine.eq_ignore_ascii_case(theirs),
            (Some(_), None) => false,
        }
    }
}
