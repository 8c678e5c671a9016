use async_trait::async_trait;
use reqwest::{Client as HttpClient, Method, Request, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use crate::client::TaskApi;
use crate::models::filter::TaskQuery;
use crate::models::task::{TaskPage, TaskUpdate};
use crate::utils::errors::{ApiError, ApiResult};

/// reqwest-backed client for the remote Task API.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    http_client: HttpClient,
    base_url: Url,
    token: Option<String>,
}

impl HttpTaskApi {
    pub fn new(base_url: Url, token: Option<String>) -> ApiResult<Self> {
        let http_client = HttpClient::builder()
            .user_agent(concat!("kanban-board-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            token,
        })
    }

    /// Relative endpoint paths are joined onto `base_url`, so it is stored
    /// with a trailing slash.
    pub fn from_url(base_url: &str, token: Option<String>) -> ApiResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self::new(base_url, token)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        let url = self.base_url.join(path)?;
        let mut request = self.http_client.request(method, url);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }
        Ok(request)
    }

    fn list_request(&self, query: &TaskQuery) -> ApiResult<Request> {
        Ok(self.request(Method::GET, "task")?.query(query).build()?)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: Request) -> ApiResult<T> {
        let response = self.http_client.execute(request).await?;
        let response = Self::check_status(response, None).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(ApiError::from)
    }

    async fn send_ack(&self, request: RequestBuilder, task_id: i32) -> ApiResult<()> {
        let response = request.send().await?;
        Self::check_status(response, Some(task_id)).await?;
        Ok(())
    }

    async fn check_status(response: Response, task_id: Option<i32>) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if let (StatusCode::NOT_FOUND, Some(id)) = (status, task_id) {
            return Err(ApiError::NotFound(id));
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status { status, body })
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list_tasks(&self, query: &TaskQuery) -> ApiResult<TaskPage> {
        let request = self.list_request(query)?;
        log::debug!("GET {}", request.url());
        self.send_json(request).await
    }

    async fn update_order(&self, task_id: i32, order: i32) -> ApiResult<()> {
        log::debug!("PATCH task/updateOrder/{} order={}", task_id, order);
        let request = self
            .request(Method::PATCH, &format!("task/updateOrder/{}", task_id))?
            .json(&json!({ "order": order }));
        self.send_ack(request, task_id).await
    }

    async fn update_task(&self, task_id: i32, update: &TaskUpdate) -> ApiResult<()> {
        log::debug!("PATCH task/update/{}", task_id);
        let request = self
            .request(Method::PATCH, &format!("task/update/{}", task_id))?
            .json(update);
        self.send_ack(request, task_id).await
    }

    async fn delete_task(&self, task_id: i32) -> ApiResult<()> {
        log::debug!("DELETE task/delete/{}", task_id);
        let request = self.request(Method::DELETE, &format!("task/delete/{}", task_id))?;
        self.send_ack(request, task_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::filter::BoardFilters;
    use crate::models::task::TaskStatus;

    #[test]
    fn base_url_gains_trailing_slash() {
        let client = HttpTaskApi::from_url("https://api.example.com/v1", None).unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.example.com/v1/");
    }

    #[test]
    fn list_request_encodes_column_query() {
        let client = HttpTaskApi::from_url("https://api.example.com/v1/", Some("secret".into())).unwrap();
        let filters = BoardFilters {
            project_id: Some(7),
            user_ids: vec![1, 2],
            ..BoardFilters::default()
        };
        let query = TaskQuery::for_column(TaskStatus::InProgress, 3, 10, &filters);

        let request = client.list_request(&query).unwrap();
        assert_eq!(request.url().path(), "/v1/task");

        let params = request.url().query().unwrap();
        assert!(params.contains("status=2"));
        assert!(params.contains("page=3"));
        assert!(params.contains("perPage=10"));
        assert!(params.contains("sortByField=order"));
        assert!(params.contains("sortOrder=ASC"));
        assert!(params.contains("projectId=7"));
        assert!(params.contains("userIds=1%2C2"));
        assert!(!params.contains("type="));

        let auth = request.headers().get(reqwest::header::AUTHORIZATION).unwrap();
        assert_eq!(auth.to_str().unwrap(), "Bearer secret");
    }
}
