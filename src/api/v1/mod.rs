pub mod accounts;
pub mod divisions;

pub use accounts::{
    AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse, Profile, ProfileUpdate, RefreshRequest,
    RegisterRequest, UserBasic,
};
pub use divisions::{
    AncestorItem, CountedList, DivisionCreated, DivisionDetailView, DivisionEmployeeItem, DivisionEmployees,
    DivisionListItem, DivisionListParams, DivisionTreeNode, DivisionTreeResponse, DivisionUpdated, DivisionWrite,
    EmployeesParams,
};
