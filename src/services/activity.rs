//! Activity catalogue (read-only from the client).

use reqwest::Method;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::Activity;
use crate::normalize::{activity_list, entity_payload, normalize_activity};
use crate::transport::{ensure_id, Transport};

#[derive(Clone)]
pub struct ActivityService {
    transport: Arc<dyn Transport>,
}

impl ActivityService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// `GET /activities`
    pub async fn list(&self) -> Result<Vec<Activity>, ApiError> {
        let body = self.transport.request(Method::GET, "/activities", None).await?;
        let activities = activity_list(&body)?;
        tracing::debug!(count = activities.len(), "Fetched activities");
        Ok(activities)
    }

    /// `GET /activities/{id}`
    pub async fn get(&self, id: i64) -> Result<Activity, ApiError> {
        ensure_id(id, "Activity")?;
        let body = self
            .transport
            .request(Method::GET, &format!("/activities/{}", id), None)
            .await?;
        normalize_activity(entity_payload(&body, "activity"))
            .ok_or_else(|| ApiError::decode(format!("Empty response for activity {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::ActivityStatus;
    use crate::transport::testing::FakeBackend;
    use serde_json::json;

    fn service() -> (Arc<FakeBackend>, ActivityService) {
        let backend = Arc::new(FakeBackend::new());
        (backend.clone(), ActivityService::new(backend))
    }

    #[tokio::test]
    async fn test_list_normalizes_french_payload() {
        let (_, activities) = service();
        let list = activities.list().await.unwrap();
        assert_eq!(list.len(), 3);

        let surf = list.iter().find(|a| a.id == 7).unwrap();
        assert_eq!(surf.title, "Surf à Taghazout");
        assert_eq!(surf.price, 300.0);
        assert_eq!(surf.status, ActivityStatus::Published);
        assert_eq!(surf.duration, 120);

        let listed: Vec<_> = list.iter().filter(|a| a.is_listed()).map(|a| a.id).collect();
        assert_eq!(listed, vec![7, 8]);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let (backend, activities) = service();
        let activity = activities.get(8).await.unwrap();
        assert_eq!(activity.available_places, 0);
        assert!(activity.is_full());
        assert_eq!(backend.calls_to(&Method::GET, "/activities/8"), 1);
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_http_404() {
        let (_, activities) = service();
        let err = activities.get(999).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.message(), "Activité introuvable");
    }

    #[tokio::test]
    async fn test_get_rejects_non_positive_id_without_request() {
        let (backend, activities) = service();
        let err = activities.get(0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_server_error_propagates() {
        let (backend, activities) = service();
        backend.fail_next(503, json!({ "error": "Maintenance en cours" }));
        let err = activities.list().await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.message(), "Maintenance en cours");
        tokio_test::assert_ok!(activities.list().await);
    }
}
