pub mod users;

pub use users::{
    AccountStatistics, DivisionInfoView, PermissionsSummary, StatisticsSummary, TopDivision, UserActivityView,
    UserDetailView, UserListItem, UserListParams, UserStatisticsView,
};
