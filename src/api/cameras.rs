//! Camera management endpoints

use reqwest::Method;

use super::client::ApiClient;
use super::dto::{Camera, CameraCreate, CameraHealth, Snapshot};
use super::error::ApiResult;

impl ApiClient {
    pub async fn list_cameras(&self, skip: u32, limit: u32) -> ApiResult<Vec<Camera>> {
        self.send_json(
            self.request(Method::GET, "/cameras/")
                .query(&[("skip", skip), ("limit", limit)]),
        )
        .await
    }

    pub async fn get_camera(&self, camera_id: i64) -> ApiResult<Camera> {
        self.send_json(self.request(Method::GET, &format!("/cameras/{}", camera_id)))
            .await
    }

    pub async fn create_camera(&self, camera: &CameraCreate) -> ApiResult<Camera> {
        self.send_json(self.request(Method::POST, "/cameras/").json(camera))
            .await
    }

    /// Replace a camera's editable fields
    pub async fn update_camera(&self, camera_id: i64, camera: &CameraCreate) -> ApiResult<Camera> {
        self.send_json(
            self.request(Method::PUT, &format!("/cameras/{}", camera_id))
                .json(camera),
        )
        .await
    }

    pub async fn delete_camera(&self, camera_id: i64) -> ApiResult<()> {
        self.send_empty(self.request(Method::DELETE, &format!("/cameras/{}", camera_id)))
            .await
    }

    /// Ask the backend to persist the camera's current frame
    pub async fn capture_snapshot(&self, camera_id: i64) -> ApiResult<Snapshot> {
        self.send_json(self.request(Method::POST, &format!("/cameras/{}/snapshot", camera_id)))
            .await
    }

    pub async fn camera_health(&self, camera_id: i64) -> ApiResult<CameraHealth> {
        self.send_json(self.request(Method::GET, &format!("/cameras/{}/health", camera_id)))
            .await
    }
}
