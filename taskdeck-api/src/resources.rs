//! Resource Access Façade
//!
//! One read per resource, all funneled through [`AuthenticatedClient`]. The
//! upstream service has mutations turned off, so every create/update/delete
//! fails locally with [`TaskdeckError::OperationDisabled`] and never touches
//! the network.

use crate::client::{AuthenticatedClient, QueryParams};
use std::sync::Arc;
use taskdeck_core::performance::measure_async;
use taskdeck_core::{
    disabled_error, CreateContainerRequest, CreateTaskRequest, CurrentUserEnvelope, List,
    ListsEnvelope, MembersEnvelope, Space, SpacesEnvelope, Task, TaskdeckError, TaskdeckResult,
    TasksEnvelope, WorkspacesEnvelope,
};
use tracing::instrument;

/// Sort key for task listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    Created,
    Updated,
    DueDate,
}

impl OrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderBy::Created => "created",
            OrderBy::Updated => "updated",
            OrderBy::DueDate => "due_date",
        }
    }
}

impl std::fmt::Display for OrderBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "created" => Ok(OrderBy::Created),
            "updated" => Ok(OrderBy::Updated),
            "due_date" => Ok(OrderBy::DueDate),
            _ => Err(format!("Unknown task ordering: {}", s)),
        }
    }
}

/// Filters for `GET /api/tasks/list/:id`; only fields that are set are sent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub archived: Option<bool>,
    pub page: Option<u32>,
    pub order_by: Option<OrderBy>,
    pub reverse: Option<bool>,
    pub subtasks: Option<bool>,
    pub include_closed: Option<bool>,
}

impl TaskQuery {
    pub fn to_query(&self) -> QueryParams {
        let mut params = QueryParams::new();
        if let Some(archived) = self.archived {
            params.push(("archived", archived.to_string()));
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(order_by) = self.order_by {
            params.push(("order_by", order_by.to_string()));
        }
        if let Some(reverse) = self.reverse {
            params.push(("reverse", reverse.to_string()));
        }
        if let Some(subtasks) = self.subtasks {
            params.push(("subtasks", subtasks.to_string()));
        }
        if let Some(include_closed) = self.include_closed {
            params.push(("include_closed", include_closed.to_string()));
        }
        params
    }
}

fn archived_query(archived: Option<bool>) -> QueryParams {
    archived
        .map(|a| vec![("archived", a.to_string())])
        .unwrap_or_default()
}

fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

/// Read-only view of the task service
#[derive(Debug, Clone)]
pub struct ResourceApi {
    client: Arc<AuthenticatedClient>,
}

impl ResourceApi {
    pub fn new(client: Arc<AuthenticatedClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<AuthenticatedClient> {
        &self.client
    }

    // Users & workspaces

    #[instrument(skip(self))]
    pub async fn get_workspaces(&self) -> TaskdeckResult<WorkspacesEnvelope> {
        measure_async(
            "get_workspaces",
            self.client
                .get_json("/api/users/workspaces", &[], "get_workspaces"),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_current_user(&self) -> TaskdeckResult<CurrentUserEnvelope> {
        measure_async(
            "get_current_user",
            self.client
                .get_json("/api/users/me", &[], "get_current_user"),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_workspace_members(
        &self,
        workspace_id: &str,
    ) -> TaskdeckResult<MembersEnvelope> {
        let path = format!("/api/users/workspace/{}/members", segment(workspace_id));
        measure_async(
            "get_workspace_members",
            self.client.get_json(&path, &[], "get_workspace_members"),
        )
        .await
    }

    // Spaces

    #[instrument(skip(self))]
    pub async fn get_spaces(
        &self,
        workspace_id: &str,
        archived: Option<bool>,
    ) -> TaskdeckResult<SpacesEnvelope> {
        let path = format!("/api/spaces/workspace/{}", segment(workspace_id));
        measure_async(
            "get_spaces",
            self.client
                .get_json(&path, &archived_query(archived), "get_spaces"),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_space(&self, space_id: &str) -> TaskdeckResult<Space> {
        let path = format!("/api/spaces/{}", segment(space_id));
        measure_async("get_space", self.client.get_json(&path, &[], "get_space")).await
    }

    pub async fn create_space(
        &self,
        _workspace_id: &str,
        _space: &CreateContainerRequest,
    ) -> TaskdeckResult<Space> {
        Err(disabled("create_space"))
    }

    pub async fn update_space(
        &self,
        _space_id: &str,
        _space: &CreateContainerRequest,
    ) -> TaskdeckResult<Space> {
        Err(disabled("update_space"))
    }

    pub async fn delete_space(&self, _space_id: &str) -> TaskdeckResult<()> {
        Err(disabled("delete_space"))
    }

    // Lists

    #[instrument(skip(self))]
    pub async fn get_lists(
        &self,
        space_id: &str,
        archived: Option<bool>,
    ) -> TaskdeckResult<ListsEnvelope> {
        let path = format!("/api/lists/space/{}", segment(space_id));
        measure_async(
            "get_lists",
            self.client
                .get_json(&path, &archived_query(archived), "get_lists"),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_list(&self, list_id: &str) -> TaskdeckResult<List> {
        let path = format!("/api/lists/{}", segment(list_id));
        measure_async("get_list", self.client.get_json(&path, &[], "get_list")).await
    }

    pub async fn create_list(
        &self,
        _space_id: &str,
        _list: &CreateContainerRequest,
    ) -> TaskdeckResult<List> {
        Err(disabled("create_list"))
    }

    pub async fn update_list(
        &self,
        _list_id: &str,
        _list: &CreateContainerRequest,
    ) -> TaskdeckResult<List> {
        Err(disabled("update_list"))
    }

    pub async fn delete_list(&self, _list_id: &str) -> TaskdeckResult<()> {
        Err(disabled("delete_list"))
    }

    // Tasks

    #[instrument(skip(self))]
    pub async fn get_tasks(
        &self,
        list_id: &str,
        query: &TaskQuery,
    ) -> TaskdeckResult<TasksEnvelope> {
        let path = format!("/api/tasks/list/{}", segment(list_id));
        measure_async(
            "get_tasks",
            self.client.get_json(&path, &query.to_query(), "get_tasks"),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_task(&self, task_id: &str) -> TaskdeckResult<Task> {
        let path = format!("/api/tasks/{}", segment(task_id));
        measure_async("get_task", self.client.get_json(&path, &[], "get_task")).await
    }

    pub async fn create_task(
        &self,
        _list_id: &str,
        _task: &CreateTaskRequest,
    ) -> TaskdeckResult<Task> {
        Err(disabled("create_task"))
    }

    pub async fn update_task(
        &self,
        _task_id: &str,
        _task: &CreateTaskRequest,
    ) -> TaskdeckResult<Task> {
        Err(disabled("update_task"))
    }

    pub async fn delete_task(&self, _task_id: &str) -> TaskdeckResult<()> {
        Err(disabled("delete_task"))
    }
}

fn disabled(operation: &str) -> TaskdeckError {
    let error = disabled_error!(operation, "resource_api");
    error.log();
    error
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_task_query_sends_nothing() {
        assert!(TaskQuery::default().to_query().is_empty());
        assert!(archived_query(None).is_empty());
    }

    #[test]
    fn test_task_query_sends_only_set_fields() {
        let query = TaskQuery {
            page: Some(2),
            order_by: Some(OrderBy::DueDate),
            include_closed: Some(false),
            ..Default::default()
        };
        assert_eq!(
            query.to_query(),
            vec![
                ("page", "2".to_string()),
                ("order_by", "due_date".to_string()),
                ("include_closed", "false".to_string()),
            ]
        );
        assert_eq!(
            archived_query(Some(false)),
            vec![("archived", "false".to_string())]
        );
    }

    #[test]
    fn test_order_by_parsing() {
        assert_eq!("due-date".parse::<OrderBy>().unwrap(), OrderBy::DueDate);
        assert_eq!("Updated".parse::<OrderBy>().unwrap(), OrderBy::Updated);
        assert!("priority".parse::<OrderBy>().is_err());
    }

    #[test]
    fn test_path_segments_are_encoded() {
        assert_eq!(segment("abc123"), "abc123");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }
}
