//! Read operations decode their payloads and hit the expected routes

mod helpers;

use helpers::{spawn_server, ADMIN_EMAIL, ADMIN_PASSWORD};
use taskdeck_auth::{Navigator, LOGIN_PATH};
use taskdeck_core::TaskdeckError;

const ADMIN_BEARER: &str = "Bearer admin-token";

#[tokio::test]
async fn current_user_and_members_decode() {
    let server = spawn_server().await;
    let app = server.app();
    app.session.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

    let me = app.api.get_current_user().await.unwrap();
    assert_eq!(me.user.id, 42);
    assert_eq!(me.user.username.as_deref(), Some("admin"));
    assert_eq!(me.user.email.as_deref(), Some(ADMIN_EMAIL));

    let members = app.api.get_workspace_members("9001").await.unwrap();
    assert_eq!(members.members.len(), 2);
    assert_eq!(members.members[1].username.as_deref(), Some("dana"));
    assert_eq!(members.members[1].email, None);

    assert_eq!(
        server.paths(),
        vec!["/api/users/me", "/api/users/workspace/9001/members"]
    );
    assert!(server
        .authorizations()
        .iter()
        .all(|auth| auth.as_deref() == Some(ADMIN_BEARER)));
}

#[tokio::test]
async fn members_of_unknown_workspace_is_not_found() {
    let server = spawn_server().await;
    let app = server.app();
    app.session.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

    let err = app.api.get_workspace_members("nope").await.unwrap_err();
    assert!(matches!(err, TaskdeckError::Api { status: 404, .. }));
    assert!(app.session.is_authenticated().await);
}

#[tokio::test]
async fn single_space_decodes_statuses() {
    let server = spawn_server().await;
    let app = server.app();
    app.session.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

    let space = app.api.get_space("s-77").await.unwrap();
    assert_eq!(space.id, "s-77");
    assert!(space.private);
    assert!(!space.archived);
    let statuses: Vec<&str> = space.statuses.iter().map(|s| s.status.as_str()).collect();
    assert_eq!(statuses, vec!["open", "done"]);
    assert_eq!(space.statuses[1].status_type.as_deref(), Some("closed"));

    assert_eq!(server.paths(), vec!["/api/spaces/s-77"]);
    assert_eq!(server.authorizations(), vec![Some(ADMIN_BEARER.to_string())]);
}

#[tokio::test]
async fn lists_in_space_forward_archived_flag() {
    let server = spawn_server().await;
    let app = server.app();
    app.session.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

    let lists = app.api.get_lists("s1", None).await.unwrap();
    assert_eq!(lists.lists.len(), 2);
    assert_eq!(lists.lists[0].name, "Backlog of s1");
    assert_eq!(lists.lists[0].task_count, Some(3));

    app.api.get_lists("s1", Some(true)).await.unwrap();

    assert_eq!(
        server.paths(),
        vec!["/api/lists/space/s1", "/api/lists/space/s1"]
    );
    assert_eq!(
        server.queries(),
        vec![None, Some("archived=true".to_string())]
    );
}

#[tokio::test]
async fn single_list_decodes_priority_and_assignee() {
    let server = spawn_server().await;
    let app = server.app();
    app.session.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.unwrap();

    let list = app.api.get_list("l1").await.unwrap();
    assert_eq!(list.id, "l1");
    assert_eq!(list.priority.map(|p| p.priority), Some("high".to_string()));
    let assignee = list.assignee.unwrap();
    assert_eq!(assignee.id, 7);
    assert_eq!(assignee.username.as_deref(), Some("dana"));

    assert_eq!(server.paths(), vec!["/api/lists/l1"]);
    assert_eq!(server.authorizations(), vec![Some(ADMIN_BEARER.to_string())]);
}

#[tokio::test]
async fn reads_without_session_redirect_to_login() {
    let server = spawn_server().await;
    let app = server.app();

    let err = app.api.get_list("l1").await.unwrap_err();
    assert!(err.is_session_ending());
    let err = app.api.get_current_user().await.unwrap_err();
    assert!(err.is_session_ending());

    assert_eq!(app.navigator.current_path(), LOGIN_PATH);
    assert_eq!(server.authorizations(), vec![None, None]);
}
