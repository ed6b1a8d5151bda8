//! Dashboard endpoints

use reqwest::Method;

use super::client::ApiClient;
use super::dto::{
    CameraStatus, DashboardOverview, DetectionTrend, DetectionType, Kpis, RecentDetection,
};
use super::error::ApiResult;

impl ApiClient {
    pub async fn kpis(&self) -> ApiResult<Kpis> {
        self.send_json(self.request(Method::GET, "/dashboard/kpis"))
            .await
    }

    pub async fn recent_detections(&self) -> ApiResult<Vec<RecentDetection>> {
        self.send_json(self.request(Method::GET, "/dashboard/recent-detections"))
            .await
    }

    pub async fn camera_status(&self) -> ApiResult<Vec<CameraStatus>> {
        self.send_json(self.request(Method::GET, "/dashboard/camera-status"))
            .await
    }

    pub async fn detection_trends(&self) -> ApiResult<Vec<DetectionTrend>> {
        self.send_json(self.request(Method::GET, "/dashboard/detection-trends"))
            .await
    }

    pub async fn detection_types(&self) -> ApiResult<Vec<DetectionType>> {
        self.send_json(self.request(Method::GET, "/dashboard/detection-types"))
            .await
    }

    /// Fetch every dashboard panel concurrently
    pub async fn dashboard(&self) -> ApiResult<DashboardOverview> {
        let (kpis, recent_detections, camera_status, detection_trends, detection_types) = tokio::try_join!(
            self.kpis(),
            self.recent_detections(),
            self.camera_status(),
            self.detection_trends(),
            self.detection_types(),
        )?;

        Ok(DashboardOverview {
            kpis,
            recent_detections,
            camera_status,
            detection_trends,
            detection_types,
        })
    }
}
