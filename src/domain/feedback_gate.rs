//! 反馈门控计算
//!
//! 班次内资源按 (created_at, id) 排序后得到 0 起序号，每 5 个资源组成一个区间：
//! `interval = index / 5 + 1`。学员需按顺序提交每个已完结区间的反馈，
//! 未提交的区间之后的资源对学员锁定。

use std::collections::BTreeSet;

use crate::models::feedback::entities::FeedbackRequirement;
use crate::models::resources::entities::{Resource, SequencedResource};

/// 每个区间包含的资源数
pub const INTERVAL_SIZE: i64 = 5;

/// 资源数低于此值时不需要反馈
const MIN_RESOURCES_FOR_FEEDBACK: i64 = 6;

pub fn interval_of(index: i64) -> i64 {
    index / INTERVAL_SIZE + 1
}

pub fn interval_count(resource_count: i64) -> i64 {
    if resource_count <= 0 {
        return 0;
    }
    (resource_count + INTERVAL_SIZE - 1) / INTERVAL_SIZE
}

/// 返回当前需要反馈的区间，资源不足时返回 None
///
/// 最新资源所在区间为 `(n - 1) / 5 + 1`，需要反馈的是它的前一个区间。
pub fn compute_required_interval(resource_count: i64) -> Option<i64> {
    if resource_count < MIN_RESOURCES_FOR_FEEDBACK {
        return None;
    }
    Some(interval_of(resource_count - 1) - 1)
}

/// 在 `1..target` 中找出最早未提交的区间
pub fn earliest_missing_interval(target: i64, submitted: &BTreeSet<i64>) -> Option<i64> {
    (1..target).find(|interval| !submitted.contains(interval))
}

pub fn evaluate_requirement(resource_count: i64, submitted: &BTreeSet<i64>) -> FeedbackRequirement {
    match compute_required_interval(resource_count) {
        None => FeedbackRequirement {
            feedback_required: false,
            interval: 1,
            missing_interval: None,
        },
        Some(required) => {
            let missing = earliest_missing_interval(required + 1, submitted);
            FeedbackRequirement {
                feedback_required: missing.is_some(),
                interval: required,
                missing_interval: missing,
            }
        }
    }
}

/// 已解锁到的区间（含）
pub fn unlocked_through(submitted: &BTreeSet<i64>) -> i64 {
    submitted.iter().next_back().map_or(1, |max| max + 1)
}

pub fn is_resource_locked(index: i64, unlocked_through: i64) -> bool {
    interval_of(index) > unlocked_through
}

/// 排序并标注序号与区间
///
/// `unlocked` 为 None 时（教职人员）所有资源均不锁定。
pub fn sequence_resources(
    mut resources: Vec<Resource>,
    unlocked: Option<i64>,
) -> Vec<SequencedResource> {
    resources.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
    resources
        .into_iter()
        .enumerate()
        .map(|(idx, resource)| {
            let index = idx as i64;
            SequencedResource {
                resource,
                index,
                interval: interval_of(index),
                locked: unlocked.is_some_and(|through| is_resource_locked(index, through)),
            }
        })
        .collect()
}

/// 删除资源后超出区间范围的反馈
pub fn stale_feedback_intervals(remaining_count: i64, existing: &BTreeSet<i64>) -> Vec<i64> {
    let max_interval = interval_count(remaining_count);
    existing
        .iter()
        .copied()
        .filter(|interval| *interval > max_interval)
        .collect()
}

/// 提交反馈前的校验错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionRejection {
    /// 区间超出 `1..=interval_count`
    OutOfRange { max: i64 },
    /// 存在更早的未提交区间
    OutOfOrder { missing: i64 },
}

/// 校验学员提交某区间反馈是否合法，重复提交同一区间视为覆盖
pub fn check_submission(
    interval: i64,
    resource_count: i64,
    submitted: &BTreeSet<i64>,
) -> Result<(), SubmissionRejection> {
    let max = interval_count(resource_count);
    if interval < 1 || interval > max {
        return Err(SubmissionRejection::OutOfRange { max });
    }
    match earliest_missing_interval(interval, submitted) {
        Some(missing) => Err(SubmissionRejection::OutOfOrder { missing }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resources::entities::ResourceType;
    use chrono::{DateTime, Utc};

    fn set(values: &[i64]) -> BTreeSet<i64> {
        values.iter().copied().collect()
    }

    fn resource(id: i64, created_at: i64) -> Resource {
        Resource {
            id,
            batch_id: 1,
            title: format!("资源{id}"),
            resource_type: ResourceType::Assignment,
            file_name: format!("r{id}.pdf"),
            stored_name: format!("stored-{id}.pdf"),
            file_size: 1,
            content_type: "application/pdf".to_string(),
            uploaded_by: 1,
            created_at: DateTime::<Utc>::from_timestamp(created_at, 0).unwrap(),
        }
    }

    #[test]
    fn test_interval_of() {
        assert_eq!(interval_of(0), 1);
        assert_eq!(interval_of(4), 1);
        assert_eq!(interval_of(5), 2);
        assert_eq!(interval_of(11), 3);
    }

    #[test]
    fn test_interval_count() {
        assert_eq!(interval_count(0), 0);
        assert_eq!(interval_count(1), 1);
        assert_eq!(interval_count(5), 1);
        assert_eq!(interval_count(6), 2);
        assert_eq!(interval_count(12), 3);
    }

    #[test]
    fn test_required_interval_thresholds() {
        assert_eq!(compute_required_interval(0), None);
        assert_eq!(compute_required_interval(5), None);
        assert_eq!(compute_required_interval(6), Some(1));
        assert_eq!(compute_required_interval(10), Some(1));
        assert_eq!(compute_required_interval(11), Some(2));
        assert_eq!(compute_required_interval(12), Some(2));
    }

    #[test]
    fn test_no_feedback_below_six_resources() {
        for n in 0..6 {
            let req = evaluate_requirement(n, &BTreeSet::new());
            assert!(!req.feedback_required);
            assert_eq!(req.interval, 1);
            assert_eq!(req.missing_interval, None);
        }
    }

    #[test]
    fn test_twelve_resources_scenario() {
        let req = evaluate_requirement(12, &BTreeSet::new());
        assert!(req.feedback_required);
        assert_eq!(req.interval, 2);
        assert_eq!(req.missing_interval, Some(1));

        let req = evaluate_requirement(12, &set(&[1]));
        assert!(req.feedback_required);
        assert_eq!(req.missing_interval, Some(2));

        let req = evaluate_requirement(12, &set(&[1, 2]));
        assert!(!req.feedback_required);
        assert_eq!(req.interval, 2);
        assert_eq!(req.missing_interval, None);
    }

    #[test]
    fn test_earliest_missing_scans_from_one() {
        assert_eq!(earliest_missing_interval(4, &set(&[2, 3])), Some(1));
        assert_eq!(earliest_missing_interval(4, &set(&[1, 3])), Some(2));
        assert_eq!(earliest_missing_interval(4, &set(&[1, 2, 3])), None);
        assert_eq!(earliest_missing_interval(1, &BTreeSet::new()), None);
    }

    #[test]
    fn test_unlocked_through() {
        assert_eq!(unlocked_through(&BTreeSet::new()), 1);
        assert_eq!(unlocked_through(&set(&[1])), 2);
        assert_eq!(unlocked_through(&set(&[1, 2])), 3);
    }

    #[test]
    fn test_locking_boundaries() {
        // 未提交任何反馈时仅第一个区间可访问
        assert!(!is_resource_locked(4, 1));
        assert!(is_resource_locked(5, 1));
        assert!(!is_resource_locked(9, 2));
        assert!(is_resource_locked(10, 2));
    }

    #[test]
    fn test_sequence_orders_by_created_at_then_id() {
        let resources = vec![
            resource(3, 200),
            resource(2, 100),
            resource(1, 100),
            resource(4, 50),
        ];
        let seq = sequence_resources(resources, None);
        let ids: Vec<i64> = seq.iter().map(|r| r.resource.id).collect();
        assert_eq!(ids, vec![4, 1, 2, 3]);
        assert!(seq.iter().all(|r| !r.locked));
        assert_eq!(seq[3].index, 3);
    }

    #[test]
    fn test_sequence_applies_student_lock() {
        let resources = (1..=12).map(|id| resource(id, id * 10)).collect();
        let seq = sequence_resources(resources, Some(1));
        assert_eq!(seq.iter().filter(|r| !r.locked).count(), 5);
        assert_eq!(seq[5].interval, 2);
        assert!(seq[5].locked);
        assert_eq!(seq[11].interval, 3);
    }

    #[test]
    fn test_stale_intervals_after_deletion() {
        let existing = set(&[1, 2, 3]);
        assert_eq!(stale_feedback_intervals(12, &existing), Vec::<i64>::new());
        assert_eq!(stale_feedback_intervals(7, &existing), vec![3]);
        assert_eq!(stale_feedback_intervals(0, &existing), vec![1, 2, 3]);
    }

    #[test]
    fn test_check_submission() {
        assert_eq!(check_submission(1, 12, &BTreeSet::new()), Ok(()));
        assert_eq!(
            check_submission(2, 12, &BTreeSet::new()),
            Err(SubmissionRejection::OutOfOrder { missing: 1 })
        );
        assert_eq!(check_submission(2, 12, &set(&[1])), Ok(()));
        assert_eq!(check_submission(1, 12, &set(&[1])), Ok(()));
        assert_eq!(
            check_submission(4, 12, &set(&[1, 2, 3])),
            Err(SubmissionRejection::OutOfRange { max: 3 })
        );
        assert_eq!(
            check_submission(0, 12, &BTreeSet::new()),
            Err(SubmissionRejection::OutOfRange { max: 3 })
        );
        assert_eq!(
            check_submission(1, 0, &BTreeSet::new()),
            Err(SubmissionRejection::OutOfRange { max: 0 })
        );
    }
}
