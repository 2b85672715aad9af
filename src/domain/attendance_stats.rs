//! 出勤统计聚合
//!
//! 汇总时先累加计数再计算百分比，不对百分比取平均。

use crate::models::attendance::entities::{AttendanceStats, AttendanceStatus};

pub fn attendance_percentage(present: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (present as f64 / total as f64 * 100.0).round() as i64
}

/// 统计一组出勤记录
///
/// `total` 为应到次数（课表数或学员数 × 课表数），未标记的记录不计入任何状态。
pub fn tally<I>(total: i64, statuses: I) -> AttendanceStats
where
    I: IntoIterator<Item = AttendanceStatus>,
{
    let mut stats = AttendanceStats {
        total,
        ..Default::default()
    };
    for status in statuses {
        match status {
            AttendanceStatus::Present => stats.present += 1,
            AttendanceStatus::Absent => stats.absent += 1,
            AttendanceStatus::Late => stats.late += 1,
        }
    }
    stats.percentage = attendance_percentage(stats.present, stats.total);
    stats
}

pub fn combine<'a, I>(parts: I) -> AttendanceStats
where
    I: IntoIterator<Item = &'a AttendanceStats>,
{
    let mut stats = parts
        .into_iter()
        .fold(AttendanceStats::default(), |mut acc, part| {
            acc.total += part.total;
            acc.present += part.present;
            acc.absent += part.absent;
            acc.late += part.late;
            acc
        });
    stats.percentage = attendance_percentage(stats.present, stats.total);
    stats
}

/// 学员在单个班次的出勤输入
#[derive(Debug, Clone)]
pub struct BatchAttendanceInput {
    pub batch_id: i64,
    pub batch_name: String,
    pub schedule_count: i64,
    pub statuses: Vec<AttendanceStatus>,
}

/// 学员出勤分析：返回 (总体, 各班次)
pub fn student_analytics(
    batches: Vec<BatchAttendanceInput>,
) -> (AttendanceStats, Vec<(i64, String, AttendanceStats)>) {
    let by_batch: Vec<(i64, String, AttendanceStats)> = batches
        .into_iter()
        .map(|b| {
            let stats = tally(b.schedule_count, b.statuses);
            (b.batch_id, b.batch_name, stats)
        })
        .collect();
    let overall = combine(by_batch.iter().map(|(_, _, s)| s));
    (overall, by_batch)
}

/// 班次出勤分析：每名学员的分母为课表数，总体分母为学员数 × 课表数
pub fn batch_analytics(
    students: Vec<(i64, Vec<AttendanceStatus>)>,
    schedule_count: i64,
) -> (AttendanceStats, Vec<(i64, AttendanceStats)>) {
    let per_student: Vec<(i64, AttendanceStats)> = students
        .into_iter()
        .map(|(student_id, statuses)| (student_id, tally(schedule_count, statuses)))
        .collect();
    let overall = combine(per_student.iter().map(|(_, s)| s));
    (overall, per_student)
}

#[cfg(test)]
mod tests {
    use super::*;
    use AttendanceStatus::*;

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(attendance_percentage(0, 0), 0);
        assert_eq!(attendance_percentage(1, 3), 33);
        assert_eq!(attendance_percentage(2, 3), 67);
        assert_eq!(attendance_percentage(1, 2), 50);
        assert_eq!(attendance_percentage(5, 5), 100);
    }

    #[test]
    fn test_tally_counts_each_status() {
        let stats = tally(5, vec![Present, Present, Late, Absent]);
        assert_eq!(stats.present, 2);
        assert_eq!(stats.late, 1);
        assert_eq!(stats.absent, 1);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.percentage, 40);
    }

    #[test]
    fn test_combine_sums_before_dividing() {
        let a = tally(1, vec![Present]);
        let b = tally(3, vec![Absent, Absent, Absent]);
        let overall = combine([&a, &b]);
        // 平均百分比为 50，按总数计算为 25
        assert_eq!(overall.total, 4);
        assert_eq!(overall.percentage, 25);
    }

    #[test]
    fn test_student_analytics_empty() {
        let (overall, by_batch) = student_analytics(Vec::new());
        assert_eq!(overall, AttendanceStats::default());
        assert!(by_batch.is_empty());
    }

    #[test]
    fn test_student_analytics_multiple_batches() {
        let (overall, by_batch) = student_analytics(vec![
            BatchAttendanceInput {
                batch_id: 1,
                batch_name: "A".into(),
                schedule_count: 4,
                statuses: vec![Present, Present, Present, Late],
            },
            BatchAttendanceInput {
                batch_id: 2,
                batch_name: "B".into(),
                schedule_count: 0,
                statuses: vec![],
            },
        ]);
        assert_eq!(by_batch.len(), 2);
        assert_eq!(by_batch[0].2.percentage, 75);
        assert_eq!(by_batch[1].2.percentage, 0);
        assert_eq!(overall.total, 4);
        assert_eq!(overall.percentage, 75);
    }

    #[test]
    fn test_batch_analytics_denominator() {
        // 2 名学员 × 5 次课，共 7 次出席
        let students = vec![
            (10, vec![Present, Present, Present, Present, Absent]),
            (11, vec![Present, Present, Present, Late]),
        ];
        let (overall, per_student) = batch_analytics(students, 5);
        assert_eq!(overall.total, 10);
        assert_eq!(overall.present, 7);
        assert_eq!(overall.percentage, 70);
        assert_eq!(per_student[0].1.percentage, 80);
        assert_eq!(per_student[1].1.percentage, 60);
    }

    #[test]
    fn test_batch_analytics_without_schedules() {
        let (overall, per_student) = batch_analytics(vec![(1, vec![]), (2, vec![])], 0);
        assert_eq!(overall.total, 0);
        assert_eq!(overall.percentage, 0);
        assert!(per_student.iter().all(|(_, s)| s.percentage == 0));
    }
}
