//! 群组满周年规则（徽章 3）

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Months, Utc};

use super::{Eligibility, EligibilityRule};
use crate::error::Result;
use crate::models::BadgeKind;
use crate::repository::GroupRepositoryTrait;

/// 群组创建满 `months` 个日历月（含边界）
pub struct GroupAgeRule {
    group_repo: Arc<dyn GroupRepositoryTrait>,
    months: u32,
}

impl GroupAgeRule {
    pub fn new(group_repo: Arc<dyn GroupRepositoryTrait>, months: u32) -> Self {
        Self { group_repo, months }
    }

    /// 在 `now` 时刻已满周年的创建时间上限
    pub fn cutoff(months: u32, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        now.checked_sub_months(Months::new(months))
    }

    fn has_matured(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        created_at
            .checked_add_months(Months::new(self.months))
            .is_some_and(|anniversary| anniversary <= now)
    }
}

#[async_trait]
impl EligibilityRule for GroupAgeRule {
    fn badge(&self) -> BadgeKind {
        BadgeKind::GroupAge
    }

    async fn evaluate(&self, group_id: i64, now: DateTime<Utc>) -> Result<Eligibility> {
        let Some(group) = self.group_repo.get_group(group_id).await? else {
            return Ok(Eligibility::SubjectNotFound);
        };

        Ok(if self.has_matured(group.created_at, now) {
            Eligibility::Eligible { group_id }
        } else {
            Eligibility::NotEligible
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Group;
    use crate::repository::MockGroupRepositoryTrait;
    use chrono::{Duration, TimeZone};

    fn repo_with_created_at(created_at: DateTime<Utc>) -> MockGroupRepositoryTrait {
        let mut repo = MockGroupRepositoryTrait::new();
        repo.expect_get_group().returning(move |id| {
            Ok(Some(Group {
                id,
                name: "g".to_string(),
                image_url: None,
                introduction: String::new(),
                is_public: true,
                password_hash: String::new(),
                like_count: 0,
                badge_count: 0,
                post_count: 0,
                created_at,
            }))
        });
        repo
    }

    #[tokio::test]
    async fn test_exactly_one_year_is_eligible() {
        let created = Utc.with_ymd_and_hms(2023, 5, 10, 8, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap();

        let rule = GroupAgeRule::new(Arc::new(repo_with_created_at(created)), 12);
        assert_eq!(
            rule.evaluate(1, now).await.unwrap(),
            Eligibility::Eligible { group_id: 1 }
        );
    }

    #[tokio::test]
    async fn test_one_second_short_is_not_eligible() {
        let created = Utc.with_ymd_and_hms(2023, 5, 10, 8, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap() - Duration::seconds(1);

        let rule = GroupAgeRule::new(Arc::new(repo_with_created_at(created)), 12);
        assert_eq!(rule.evaluate(1, now).await.unwrap(), Eligibility::NotEligible);
    }

    #[tokio::test]
    async fn test_missing_group() {
        let mut repo = MockGroupRepositoryTrait::new();
        repo.expect_get_group().returning(|_| Ok(None));

        let rule = GroupAgeRule::new(Arc::new(repo), 12);
        assert_eq!(
            rule.evaluate(1, Utc::now()).await.unwrap(),
            Eligibility::SubjectNotFound
        );
    }

    #[test]
    fn test_cutoff_is_calendar_months() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(
            GroupAgeRule::cutoff(12, now),
            Some(Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap())
        );
    }
}
