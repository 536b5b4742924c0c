//! Read access to a user's warning history.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::error::StorageError;
use crate::repository::WarnRecordStore;
use crate::types::{UserId, UserWarn, UserWarnCount, WarnContentId};

pub struct WarnQueryService {
    store: Arc<dyn WarnRecordStore>,
}

/// Start of a `days`-long window ending at `now`. A window reaching past the
/// earliest representable time starts there, covering all history.
pub fn cutoff_for(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now.checked_sub_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl WarnQueryService {
    pub fn new(store: Arc<dyn WarnRecordStore>) -> Self {
        Self { store }
    }

    /// At most `size` warnings for `uid`, newest first, skipping `offset`.
    /// No bound is placed on `size` here.
    pub async fn list_by_user(
        &self,
        uid: UserId,
        offset: u32,
        size: u32,
    ) -> Result<Vec<UserWarn>, StorageError> {
        self.store.select_by_user(uid, offset, size).await
    }

    /// Total warnings ever recorded for `uid`.
    pub async fn count_by_user(&self, uid: UserId) -> Result<i64, StorageError> {
        self.store.select_count(uid).await
    }

    /// Per-day counts for warnings created in the last `days` days.
    pub async fn count_by_user_since(
        &self,
        uid: UserId,
        days: u32,
    ) -> Result<Vec<UserWarnCount>, StorageError> {
        self.count_by_user_since_at(uid, days, Utc::now()).await
    }

    /// Same as [`count_by_user_since`](Self::count_by_user_since) with an
    /// explicit "now".
    pub async fn count_by_user_since_at(
        &self,
        uid: UserId,
        days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<UserWarnCount>, StorageError> {
        self.store.select_count_since(uid, cutoff_for(now, days)).await
    }

    /// The warning raised under content `wid` (the id `save` reports), or
    /// `None` if no warning references it.
    pub async fn get_detail(&self, wid: WarnContentId) -> Result<Option<UserWarn>, StorageError> {
        self.store.select_by_id(wid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use proptest::prelude::*;

    use crate::services::testing::MemoryWarnStore;

    fn make_service(store: Arc<MemoryWarnStore>) -> WarnQueryService {
        WarnQueryService::new(store)
    }

    #[test]
    fn cutoff_is_days_times_86400_seconds() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        assert_eq!(cutoff_for(now, 0), now);
        assert_eq!(
            cutoff_for(now, 7),
            now - Duration::seconds(7 * 86_400)
        );
    }

    #[test]
    fn cutoff_past_earliest_time_is_unbounded() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        assert_eq!(cutoff_for(now, u32::MAX), DateTime::<Utc>::MIN_UTC);
        assert_eq!(cutoff_for(now, 1_000_000_000), DateTime::<Utc>::MIN_UTC);
    }

    #[tokio::test]
    async fn huge_window_counts_all_history() {
        let store = Arc::new(MemoryWarnStore::default());
        let now = Utc::now();
        store.push_warn(1, now);
        store.push_warn(1, now - Duration::days(3_650));
        let service = make_service(store);

        let counts = service.count_by_user_since(1, u32::MAX).await.unwrap();

        assert_eq!(counts.iter().map(|c| c.count).sum::<i64>(), 2);
    }

    #[tokio::test]
    async fn list_and_count_cover_only_the_user() {
        let store = Arc::new(MemoryWarnStore::default());
        let now = Utc::now();
        for _ in 0..3 {
            store.push_warn(1, now);
        }
        store.push_warn(2, now);
        let service = make_service(store);

        assert_eq!(service.count_by_user(1).await.unwrap(), 3);
        assert_eq!(service.count_by_user(2).await.unwrap(), 1);
        assert_eq!(service.list_by_user(1, 0, 10).await.unwrap().len(), 3);
        assert!(service.list_by_user(3, 0, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn count_since_excludes_rows_before_cutoff() {
        let store = Arc::new(MemoryWarnStore::default());
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let cutoff = cutoff_for(now, 3);
        store.push_warn(1, cutoff - Duration::milliseconds(1));
        store.push_warn(1, cutoff);
        store.push_warn(1, now - Duration::hours(1));
        store.push_warn(1, now - Duration::hours(2));
        let service = make_service(store);

        let counts = service.count_by_user_since_at(1, 3, now).await.unwrap();

        assert_eq!(
            counts,
            vec![
                UserWarnCount { date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(), count: 1 },
                UserWarnCount { date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(), count: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn missing_detail_is_none_not_error() {
        let store = Arc::new(MemoryWarnStore::default());
        let id = store.push_warn(5, Utc::now());
        let wid = store.warns()[0].wid;
        let service = make_service(store);

        assert_eq!(service.get_detail(wid).await.unwrap().map(|w| (w.id, w.uid)), Some((id, 5)));
        assert!(service.get_detail(wid + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn store_failures_are_returned() {
        let service = make_service(Arc::new(MemoryWarnStore::default().failing_reads()));

        assert!(service.list_by_user(1, 0, 10).await.is_err());
        assert!(service.count_by_user(1).await.is_err());
        assert!(service.count_by_user_since(1, 7).await.is_err());
        let err = service.get_detail(1).await.unwrap_err();
        assert_eq!(err.operation(), "select_by_id");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_pages_concatenate_to_full_history(total in 0usize..60, size in 1u32..15) {
            let store = Arc::new(MemoryWarnStore::default());
            let now = Utc::now();
            for _ in 0..total {
                store.push_warn(1, now);
            }
            let service = make_service(store);

            let full = tokio_test::block_on(service.list_by_user(1, 0, u32::MAX)).unwrap();
            let mut paged = Vec::new();
            let mut offset = 0;
            loop {
                let page = tokio_test::block_on(service.list_by_user(1, offset, size)).unwrap();
                prop_assert!(page.len() <= size as usize);
                if page.is_empty() {
                    break;
                }
                offset += size;
                paged.extend(page);
            }

            let full_ids: Vec<_> = full.iter().map(|w| w.id).collect();
            let paged_ids: Vec<_> = paged.iter().map(|w| w.id).collect();
            prop_assert_eq!(full_ids.len(), total);
            prop_assert_eq!(paged_ids, full_ids);
        }
    }
}
