pub mod allocation;
pub mod announcement;
pub mod duty;
pub mod enums;
pub mod medicine;
pub mod request;
pub mod resident;
pub mod user;

pub use allocation::*;
pub use announcement::*;
pub use duty::*;
pub use medicine::*;
pub use request::*;
pub use resident::*;
pub use user::*;

/// Storage format for timestamps (`created_at`, `dispensed_at`, ...).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Storage format for calendar dates (`expiry_date`, `duty_date`, ...).
pub const DATE_FORMAT: &str = "%Y-%m-%d";
