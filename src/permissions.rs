//! Permission codenames, cumulative role groups and the helpers that
//! resolve a user's effective permissions.
//!
//! Codenames use the `app_label.codename` form. A user holds every permission
//! granted directly through `user_permissions` plus the union of the
//! permissions of each group in `groups`. Superusers hold everything.

use std::collections::BTreeSet;

use crate::database::models::User;

pub struct PermissionCodes;

impl PermissionCodes {
    // Dashboard
    pub const VIEW_COMPANY_DASHBOARD: &'static str = "core.view_company_dashboard";
    pub const VIEW_DIVISION_DASHBOARD: &'static str = "core.view_division_dashboard";
    pub const VIEW_OWN_DASHBOARD: &'static str = "core.view_own_dashboard";
    pub const EXPORT_DASHBOARD_DATA: &'static str = "core.export_dashboard_data";

    // Attendance
    pub const VIEW_OWN_ATTENDANCE: &'static str = "attendance.view_attendance";
    pub const ADD_OWN_ATTENDANCE: &'static str = "attendance.add_attendance";
    pub const CHANGE_OWN_ATTENDANCE: &'static str = "attendance.change_attendance";
    pub const DELETE_OWN_ATTENDANCE: &'static str = "attendance.delete_attendance";
    pub const APPROVE_ATTENDANCE: &'static str = "core.approve_attendance";
    pub const VIEW_ALL_ATTENDANCE_REPORT: &'static str = "core.view_all_attendance_report";
    pub const VIEW_DIVISION_ATTENDANCE: &'static str = "core.view_division_attendance";

    // Leave
    pub const VIEW_OWN_LEAVE: &'static str = "leave.view_leave";
    pub const ADD_LEAVE_REQUEST: &'static str = "leave.add_leave";
    pub const CHANGE_OWN_LEAVE: &'static str = "leave.change_leave";
    pub const DELETE_OWN_LEAVE: &'static str = "leave.delete_leave";
    pub const APPROVE_ALL_LEAVES: &'static str = "core.approve_all_leaves";
    pub const APPROVE_DIVISION_LEAVES: &'static str = "core.approve_division_leaves";
    pub const REJECT_LEAVE: &'static str = "core.reject_leave";
    pub const CANCEL_APPROVED_LEAVE: &'static str = "core.cancel_approved_leave";

    // Reports
    pub const EXPORT_ATTENDANCE_REPORT: &'static str = "core.export_attendance_report";
    pub const EXPORT_LEAVE_REPORT: &'static str = "core.export_leave_report";
    pub const EXPORT_PAYROLL_REPORT: &'static str = "core.export_payroll_report";
    pub const VIEW_ANALYTICS: &'static str = "core.view_analytics";
    pub const EXPORT_EMPLOYEE_DATA: &'static str = "core.export_employee_data";

    // Employees
    pub const VIEW_ALL_EMPLOYEES: &'static str = "core.view_all_employees";
    pub const VIEW_DIVISION_EMPLOYEES: &'static str = "core.view_division_employees";
    pub const MANAGE_EMPLOYEES: &'static str = "core.manage_employees";
    pub const MANAGE_DIVISIONS: &'static str = "core.manage_divisions";
}

/// Role groups. Each role includes everything granted to the one below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Staff,
    Manager,
    HrAdmin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Staff, Role::Manager, Role::HrAdmin];

    pub fn group_name(self) -> &'static str {
        match self {
            Role::Staff => "Staff",
            Role::Manager => "Manager",
            Role::HrAdmin => "HR Admin",
        }
    }

    pub fn from_group_name(name: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.group_name() == name)
    }

    pub fn permissions(self) -> Vec<&'static str> {
        const STAFF: [&str; 5] = [
            PermissionCodes::VIEW_OWN_DASHBOARD,
            PermissionCodes::VIEW_OWN_ATTENDANCE,
            PermissionCodes::ADD_OWN_ATTENDANCE,
            PermissionCodes::VIEW_OWN_LEAVE,
            PermissionCodes::ADD_LEAVE_REQUEST,
        ];
        const MANAGER: [&str; 5] = [
            PermissionCodes::VIEW_DIVISION_DASHBOARD,
            PermissionCodes::VIEW_DIVISION_ATTENDANCE,
            PermissionCodes::VIEW_DIVISION_EMPLOYEES,
            PermissionCodes::APPROVE_DIVISION_LEAVES,
            PermissionCodes::EXPORT_ATTENDANCE_REPORT,
        ];
        const HR_ADMIN: [&str; 11] = [
            PermissionCodes::VIEW_COMPANY_DASHBOARD,
            PermissionCodes::EXPORT_DASHBOARD_DATA,
            PermissionCodes::APPROVE_ALL_LEAVES,
            PermissionCodes::APPROVE_ATTENDANCE,
            PermissionCodes::VIEW_ALL_ATTENDANCE_REPORT,
            PermissionCodes::EXPORT_LEAVE_REPORT,
            PermissionCodes::EXPORT_PAYROLL_REPORT,
            PermissionCodes::VIEW_ANALYTICS,
            PermissionCodes::VIEW_ALL_EMPLOYEES,
            PermissionCodes::MANAGE_EMPLOYEES,
            PermissionCodes::MANAGE_DIVISIONS,
        ];

        let mut perms = STAFF.to_vec();
        if matches!(self, Role::Manager | Role::HrAdmin) {
            perms.extend(MANAGER);
        }
        if self == Role::HrAdmin {
            perms.extend(HR_ADMIN);
        }
        perms
    }
}

/// Descriptions for the custom permissions
const CATALOGUE: [(&str, &str); 13] = [
    ("core.view_company_dashboard", "Can view company-wide dashboard"),
    ("core.view_division_dashboard", "Can view division dashboard"),
    ("core.view_own_dashboard", "Can view own dashboard only"),
    ("core.export_dashboard_data", "Can export dashboard data"),
    ("core.approve_attendance", "Can approve attendance exceptions"),
    ("core.view_all_attendance_report", "Can view all attendance reports"),
    ("core.approve_all_leaves", "Can approve all leave requests"),
    ("core.reject_leave", "Can reject leave requests"),
    ("core.cancel_approved_leave", "Can cancel approved leaves"),
    ("core.export_attendance_report", "Can export attendance report"),
    ("core.export_leave_report", "Can export leave report"),
    ("core.export_payroll_report", "Can export payroll report"),
    ("core.view_analytics", "Can view analytics dashboard"),
];

/// Direct permissions plus those inherited from known groups
pub fn effective_permissions(user: &User) -> BTreeSet<String> {
    let mut perms: BTreeSet<String> = user.user_permissions.iter().cloned().collect();
    for role in user.groups.iter().filter_map(|g| Role::from_group_name(g)) {
        perms.extend(role.permissions().into_iter().map(String::from));
    }
    perms
}

pub fn has_perm(user: &User, code: &str) -> bool {
    if !user.is_active {
        return false;
    }
    if user.is_superuser {
        return true;
    }
    user.user_permissions.iter().any(|p| p == code)
        || user
            .groups
            .iter()
            .filter_map(|g| Role::from_group_name(g))
            .any(|role| role.permissions().contains(&code))
}

pub fn user_has_any_permission(user: &User, codes: &[&str]) -> bool {
    codes.iter().any(|code| has_perm(user, code))
}

pub fn user_has_all_permissions(user: &User, codes: &[&str]) -> bool {
    codes.iter().all(|code| has_perm(user, code))
}

pub fn in_group(user: &User, role: Role) -> bool {
    user.groups.iter().any(|g| g == role.group_name())
}

pub fn is_hr_admin(user: &User) -> bool {
    in_group(user, Role::HrAdmin)
}

pub fn is_manager(user: &User) -> bool {
    in_group(user, Role::Manager)
}

pub fn is_staff_employee(user: &User) -> bool {
    in_group(user, Role::Staff)
}

/// First group name, or "Employee" when the user belongs to none
pub fn role_display(user: &User) -> String {
    user.groups.first().cloned().unwrap_or_else(|| "Employee".to_string())
}

/// Catalogue description, else the codename title-cased
/// (`core.manage_divisions` -> `Manage Divisions`).
pub fn permission_display_name(code: &str) -> String {
    if let Some((_, name)) = CATALOGUE.iter().find(|(c, _)| *c == code) {
        return name.to_string();
    }

    let codename = code.split_once('.').map(|(_, c)| c).unwrap_or(code);
    codename
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
