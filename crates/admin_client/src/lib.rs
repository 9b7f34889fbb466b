use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use shared::{
    domain::{ChildId, ChildKind, ScenarioId},
    error::ApiException,
    protocol::{ChildRecord, ChildWrite, CreatedChild, ScenarioSummary},
};
use tracing::debug;

pub mod diff;
pub mod draft;
pub mod editor;
pub mod error;
pub mod gesture;

pub use diff::{DraftChange, DraftSnapshot};
pub use draft::{DraftItem, DraftList, TempKey};
pub use editor::{DraftEditor, LoadOutcome, RemovedItem, SaveSummary};
pub use error::{EditorError, FailedItem, SaveFailure};
pub use gesture::{DragGesture, DropMove, DropSide, RowBounds, RowRegion};

/// The admin REST surface the console edits against.
#[async_trait]
pub trait AdminBackend: Send + Sync {
    async fn list_scenarios(&self) -> Result<Vec<ScenarioSummary>>;
    async fn fetch_scenario(&self, scenario_id: ScenarioId) -> Result<ScenarioSummary>;
    async fn list_children(
        &self,
        kind: ChildKind,
        scenario_id: ScenarioId,
    ) -> Result<Vec<ChildRecord>>;
    async fn create_child(&self, kind: ChildKind, body: &ChildWrite) -> Result<ChildId>;
    async fn update_child(&self, kind: ChildKind, id: ChildId, body: &ChildWrite) -> Result<()>;
    /// Deleting a record that is already gone succeeds.
    async fn delete_child(&self, kind: ChildKind, id: ChildId) -> Result<()>;
}

#[derive(Debug, Clone)]
struct BasicCredentials {
    username: String,
    password: Option<String>,
}

pub struct HttpAdminBackend {
    http: Client,
    api_base: String,
    credentials: Option<BasicCredentials>,
}

impl HttpAdminBackend {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self::with_client(Client::new(), api_base)
    }

    pub fn with_client(http: Client, api_base: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            credentials: None,
        }
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.credentials = Some(BasicCredentials {
            username: username.into(),
            password,
        });
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{path}", self.api_base));
        match &self.credentials {
            Some(credentials) => {
                builder.basic_auth(&credentials.username, credentials.password.as_deref())
            }
            None => builder,
        }
    }
}

/// Turns a non-2xx response into an [`ApiException`] carrying the API's
/// `detail` message.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiException::from_body(status.as_u16(), &body).into())
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ApiException>()
        .is_some_and(ApiException::is_not_found)
}

#[async_trait]
impl AdminBackend for HttpAdminBackend {
    async fn list_scenarios(&self) -> Result<Vec<ScenarioSummary>> {
        let response = self.request(Method::GET, "/scenarios/").send().await?;
        check_status(response)
            .await?
            .json()
            .await
            .context("invalid scenario list payload")
    }

    async fn fetch_scenario(&self, scenario_id: ScenarioId) -> Result<ScenarioSummary> {
        let response = self
            .request(Method::GET, &format!("/scenarios/{scenario_id}"))
            .send()
            .await?;
        check_status(response)
            .await?
            .json()
            .await
            .with_context(|| format!("invalid payload for scenario {scenario_id}"))
    }

    async fn list_children(
        &self,
        kind: ChildKind,
        scenario_id: ScenarioId,
    ) -> Result<Vec<ChildRecord>> {
        let path = format!("/scenarios/{scenario_id}/{}", kind.collection());
        debug!(%scenario_id, collection = kind.collection(), "listing children");
        let response = self.request(Method::GET, &path).send().await?;
        check_status(response)
            .await?
            .json()
            .await
            .with_context(|| format!("invalid {kind} list for scenario {scenario_id}"))
    }

    async fn create_child(&self, kind: ChildKind, body: &ChildWrite) -> Result<ChildId> {
        let path = format!("/{}/", kind.collection());
        debug!(collection = kind.collection(), sort_order = body.sort_order, "creating child");
        let response = self.request(Method::POST, &path).json(body).send().await?;
        let created: CreatedChild = check_status(response)
            .await?
            .json()
            .await
            .with_context(|| format!("create {kind} response carried no id"))?;
        Ok(created.id)
    }

    async fn update_child(&self, kind: ChildKind, id: ChildId, body: &ChildWrite) -> Result<()> {
        let path = format!("/{}/{id}", kind.collection());
        debug!(collection = kind.collection(), %id, sort_order = body.sort_order, "updating child");
        let response = self.request(Method::PUT, &path).json(body).send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn delete_child(&self, kind: ChildKind, id: ChildId) -> Result<()> {
        let path = format!("/{}/{id}", kind.collection());
        let response = self.request(Method::DELETE, &path).send().await?;
        match check_status(response).await {
            Ok(_) => Ok(()),
            Err(err) if is_not_found(&err) => {
                debug!(collection = kind.collection(), %id, "child already deleted");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod http_tests;

#[cfg(test)]
#[path = "tests/editor_tests.rs"]
mod editor_tests;
