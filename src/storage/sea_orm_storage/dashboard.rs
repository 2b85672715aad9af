//! 仪表盘统计

use super::SeaOrmStorage;
use crate::domain::attendance_stats::attendance_percentage;
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{LmsError, Result};
use crate::models::dashboard::responses::{BatchCounts, DashboardStats, UserCounts};
use sea_orm::{ColumnTrait, EntityTrait, QuerySelect};

impl SeaOrmStorage {
    pub async fn get_dashboard_stats_impl(&self) -> Result<DashboardStats> {
        let role_counts: Vec<(String, i64)> = Users::find()
            .select_only()
            .column(UserColumn::Role)
            .column_as(UserColumn::Id.count(), "count")
            .group_by(UserColumn::Role)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("统计用户数量失败: {e}")))?;

        let mut users = UserCounts::default();
        for (role, count) in role_counts {
            users.total += count;
            match role.as_str() {
                "admin" => users.admins += count,
                "instructor" => users.instructors += count,
                "student" => users.students += count,
                _ => {}
            }
        }

        let mut batches = BatchCounts::default();
        for (status, count) in self.count_batches_by_status_impl().await? {
            batches.total += count;
            match status.as_str() {
                "upcoming" => batches.upcoming += count,
                "ongoing" => batches.ongoing += count,
                "completed" => batches.completed += count,
                _ => {}
            }
        }

        let (present, total) = self.count_attendance_impl().await?;

        Ok(DashboardStats {
            users,
            courses: self.count_courses_impl().await?,
            batches,
            schedules: self.count_schedules_impl().await?,
            resources: self.count_resources_impl().await?,
            attendance_percentage: attendance_percentage(present, total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support;
    use super::*;
    use crate::models::users::entities::UserRole;

    #[tokio::test]
    async fn test_dashboard_counts() {
        let storage = SeaOrmStorage::in_memory().await;
        let (_, _) = test_support::batch(&storage).await;
        test_support::user(&storage, "stu", UserRole::Student).await;

        let stats = storage.get_dashboard_stats_impl().await.unwrap();
        assert_eq!(stats.users.total, 3);
        assert_eq!(stats.users.admins, 1);
        assert_eq!(stats.users.instructors, 1);
        assert_eq!(stats.users.students, 1);
        assert_eq!(stats.courses, 1);
        assert_eq!(stats.batches.upcoming, 1);
        assert_eq!(stats.attendance_percentage, 0);
    }
}
