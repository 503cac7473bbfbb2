use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(UserRole {
    Bhw => "bhw",
    Admin => "admin",
});

str_enum!(RequestStatus {
    Submitted => "submitted",
    Approved => "approved",
    Dispensed => "dispensed",
    Rejected => "rejected",
});

impl RequestStatus {
    /// Request lifecycle: submitted → approved | rejected, approved → dispensed | rejected.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (Self::Submitted, Self::Approved)
                | (Self::Submitted, Self::Rejected)
                | (Self::Approved, Self::Dispensed)
                | (Self::Approved, Self::Rejected)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Dispensed | Self::Rejected)
    }
}

str_enum!(ProgramFrequency {
    Once => "once",
    Monthly => "monthly",
    Quarterly => "quarterly",
});

str_enum!(DistributionStatus {
    Claimed => "claimed",
});

str_enum!(ScopeType {
    Barangay => "barangay",
    Purok => "purok",
});

str_enum!(DutyShift {
    Morning => "morning",
    Afternoon => "afternoon",
    WholeDay => "whole_day",
});

str_enum!(Audience {
    All => "all",
    Bhw => "bhw",
});

str_enum!(ExpiryState {
    Expired => "expired",
    ExpiringSoon => "expiring_soon",
    Ok => "ok",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn request_status_round_trip() {
        for (variant, s) in [
            (RequestStatus::Submitted, "submitted"),
            (RequestStatus::Approved, "approved"),
            (RequestStatus::Dispensed, "dispensed"),
            (RequestStatus::Rejected, "rejected"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(RequestStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn request_lifecycle_transitions() {
        use RequestStatus::*;
        assert!(Submitted.can_transition_to(Approved));
        assert!(Submitted.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Dispensed));
        assert!(Approved.can_transition_to(Rejected));

        assert!(!Submitted.can_transition_to(Dispensed));
        assert!(!Dispensed.can_transition_to(Approved));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Approved.can_transition_to(Approved));
    }

    #[test]
    fn terminal_statuses() {
        assert!(RequestStatus::Dispensed.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
        assert!(!RequestStatus::Approved.is_terminal());
    }

    #[test]
    fn serde_uses_db_strings() {
        let json = serde_json::to_string(&DutyShift::WholeDay).unwrap();
        assert_eq!(json, "\"whole_day\"");
        let parsed: ExpiryState = serde_json::from_str("\"expiring_soon\"").unwrap();
        assert_eq!(parsed, ExpiryState::ExpiringSoon);
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(RequestStatus::from_str("pending").is_err());
        assert!(UserRole::from_str("").is_err());
        assert!(ScopeType::from_str("city").is_err());
    }
}
