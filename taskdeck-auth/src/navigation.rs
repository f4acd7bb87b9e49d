//! Navigation contract and application routes
//!
//! The session layer never renders anything; it only asks a [`Navigator`] to
//! move to the login path when a session ends.

use std::sync::{Mutex, MutexGuard};

/// Default login entry point
pub const LOGIN_PATH: &str = "/login";

/// Moves the application to a path
pub trait Navigator: Send + Sync {
    /// Hard navigation to `path`
    fn navigate(&self, path: &str);

    /// Path the application is currently at
    fn current_path(&self) -> String;
}

/// In-memory navigator that records every navigation
#[derive(Debug)]
pub struct RouteState {
    history: Mutex<Vec<String>>,
}

impl RouteState {
    pub fn new(initial_path: impl Into<String>) -> Self {
        Self {
            history: Mutex::new(vec![initial_path.into()]),
        }
    }

    /// Every path visited, starting with the initial one
    pub fn history(&self) -> Vec<String> {
        self.entries().clone()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<String>> {
        // append-only, so a poisoned history is still consistent
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// How many times the application was sent to `path`, excluding the initial path
    pub fn visits(&self, path: &str) -> usize {
        self.history().iter().skip(1).filter(|p| *p == path).count()
    }
}

impl Default for RouteState {
    fn default() -> Self {
        Self::new(Route::Workspaces.to_string())
    }
}

impl Navigator for RouteState {
    fn navigate(&self, path: &str) {
        tracing::debug!(path, "Navigating");
        self.entries().push(path.to_string());
    }

    fn current_path(&self) -> String {
        self.entries().last().cloned().unwrap_or_default()
    }
}

/// Application routes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Workspaces,
    Spaces {
        workspace_id: String,
    },
    Lists {
        workspace_id: String,
        space_id: String,
    },
    Tasks {
        workspace_id: String,
        space_id: String,
        list_id: String,
    },
    TaskDetail {
        workspace_id: String,
        space_id: String,
        list_id: String,
        task_id: String,
    },
}

impl Route {
    /// Parse an application path; `/` resolves to the workspaces page
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let route = match segments.as_slice() {
            [] | ["workspaces"] => Route::Workspaces,
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["workspace", w, "spaces"] => Route::Spaces {
                workspace_id: w.to_string(),
            },
            ["workspace", w, "space", s, "lists"] => Route::Lists {
                workspace_id: w.to_string(),
                space_id: s.to_string(),
            },
            ["workspace", w, "space", s, "list", l, "tasks"] => Route::Tasks {
                workspace_id: w.to_string(),
                space_id: s.to_string(),
                list_id: l.to_string(),
            },
            ["workspace", w, "space", s, "list", l, "task", t] => Route::TaskDetail {
                workspace_id: w.to_string(),
                space_id: s.to_string(),
                list_id: l.to_string(),
                task_id: t.to_string(),
            },
            _ => return None,
        };

        Some(route)
    }

    /// Routes reachable without a session
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }

    /// Trail from the workspaces page down to this route
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        if self.is_public() {
            return Vec::new();
        }

        let mut trail = vec![Breadcrumb::new("Workspaces", Route::Workspaces)];

        let (w, s, l, t) = match self {
            Route::Spaces { workspace_id } => (Some(workspace_id), None, None, None),
            Route::Lists {
                workspace_id,
                space_id,
            } => (Some(workspace_id), Some(space_id), None, None),
            Route::Tasks {
                workspace_id,
                space_id,
                list_id,
            } => (Some(workspace_id), Some(space_id), Some(list_id), None),
            Route::TaskDetail {
                workspace_id,
                space_id,
                list_id,
                task_id,
            } => (Some(workspace_id), Some(space_id), Some(list_id), Some(task_id)),
            _ => (None, None, None, None),
        };

        if let Some(w) = w {
            trail.push(Breadcrumb::new(
                "Spaces",
                Route::Spaces {
                    workspace_id: w.clone(),
                },
            ));
            if let Some(s) = s {
                trail.push(Breadcrumb::new(
                    "Lists",
                    Route::Lists {
                        workspace_id: w.clone(),
                        space_id: s.clone(),
                    },
                ));
                if let Some(l) = l {
                    trail.push(Breadcrumb::new(
                        "Tasks",
                        Route::Tasks {
                            workspace_id: w.clone(),
                            space_id: s.clone(),
                            list_id: l.clone(),
                        },
                    ));
                    if t.is_some() {
                        trail.push(Breadcrumb::new("Task Detail", self.clone()));
                    }
                }
            }
        }

        trail
    }

    /// The page one level up, if any
    pub fn parent(&self) -> Option<Route> {
        let trail = self.breadcrumbs();
        (trail.len() > 1).then(|| trail[trail.len() - 2].route.clone())
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Login => write!(f, "{}", LOGIN_PATH),
            Route::Register => write!(f, "/register"),
            Route::Workspaces => write!(f, "/workspaces"),
            Route::Spaces { workspace_id } => write!(f, "/workspace/{}/spaces", workspace_id),
            Route::Lists {
                workspace_id,
                space_id,
            } => write!(f, "/workspace/{}/space/{}/lists", workspace_id, space_id),
            Route::Tasks {
                workspace_id,
                space_id,
                list_id,
            } => write!(
                f,
                "/workspace/{}/space/{}/list/{}/tasks",
                workspace_id, space_id, list_id
            ),
            Route::TaskDetail {
                workspace_id,
                space_id,
                list_id,
                task_id,
            } => write!(
                f,
                "/workspace/{}/space/{}/list/{}/task/{}",
                workspace_id, space_id, list_id, task_id
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub name: &'static str,
    pub route: Route,
}

impl Breadcrumb {
    fn new(name: &'static str, route: Route) -> Self {
        Self { name, route }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_state_records_history() {
        let nav = RouteState::new("/workspaces");
        assert_eq!(nav.current_path(), "/workspaces");

        nav.navigate("/workspace/1/spaces");
        nav.navigate(LOGIN_PATH);
        assert_eq!(nav.current_path(), "/login");
        assert_eq!(nav.visits(LOGIN_PATH), 1);
        assert_eq!(nav.history().len(), 3);
    }

    #[test]
    fn test_navigation_survives_poisoned_history() {
        let nav = std::sync::Arc::new(RouteState::new("/workspaces"));

        let holder = nav.clone();
        let result = std::thread::spawn(move || {
            let _guard = holder.history.lock().unwrap();
            panic!("panic while holding the history lock");
        })
        .join();
        assert!(result.is_err());
        assert!(nav.history.is_poisoned());

        nav.navigate(LOGIN_PATH);
        assert_eq!(nav.current_path(), LOGIN_PATH);
        assert_eq!(nav.visits(LOGIN_PATH), 1);
        assert_eq!(nav.history(), vec!["/workspaces", "/login"]);
    }

    #[test]
    fn test_parse_known_routes() {
        assert_eq!(Route::parse("/"), Some(Route::Workspaces));
        assert_eq!(Route::parse("/login"), Some(Route::Login));
        assert_eq!(
            Route::parse("/workspace/w1/space/s1/list/l1/task/t1?tab=details"),
            Some(Route::TaskDetail {
                workspace_id: "w1".to_string(),
                space_id: "s1".to_string(),
                list_id: "l1".to_string(),
                task_id: "t1".to_string(),
            })
        );
        assert_eq!(Route::parse("/workspace/w1"), None);
        assert_eq!(Route::parse("/settings"), None);
    }

    #[test]
    fn test_display_matches_parse() {
        let route = Route::Tasks {
            workspace_id: "9".to_string(),
            space_id: "8".to_string(),
            list_id: "7".to_string(),
        };
        assert_eq!(route.to_string(), "/workspace/9/space/8/list/7/tasks");
        assert_eq!(Route::parse(&route.to_string()), Some(route));
    }

    #[test]
    fn test_breadcrumbs_for_task_detail() {
        let route = Route::parse("/workspace/w/space/s/list/l/task/t").unwrap();
        let trail = route.breadcrumbs();
        let names: Vec<&str> = trail.iter().map(|b| b.name).collect();
        assert_eq!(
            names,
            vec!["Workspaces", "Spaces", "Lists", "Tasks", "Task Detail"]
        );
        assert_eq!(trail[2].route.to_string(), "/workspace/w/space/s/lists");
        assert_eq!(
            route.parent().map(|r| r.to_string()).as_deref(),
            Some("/workspace/w/space/s/list/l/tasks")
        );
    }

    #[test]
    fn test_top_level_pages_have_no_parent() {
        assert_eq!(Route::Workspaces.breadcrumbs().len(), 1);
        assert_eq!(Route::Workspaces.parent(), None);
        assert!(Route::Login.breadcrumbs().is_empty());
        assert!(Route::Login.is_public());
        assert!(!Route::Workspaces.is_public());
    }
}
