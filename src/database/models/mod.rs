pub mod audit;
pub mod division;
pub mod token;
pub mod user;

pub use audit::{AuditFields, SoftDelete, SoftDeleteScope};
pub use division::{Division, NewDivision, DIVISIONS};
pub use token::RefreshToken;
pub use user::{EmploymentStatus, EmploymentType, FacePose, NewUser, User, USERS};
