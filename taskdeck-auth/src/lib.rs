//! Taskdeck Auth - session lifecycle
//!
//! Credential storage, login and registration against the identity endpoint,
//! role capabilities, and the navigation hook used when a session ends.

pub mod capabilities;
pub mod credentials;
pub mod http;
pub mod navigation;
pub mod session;
pub mod validation;

pub use capabilities::{can, capabilities_for, role_capabilities, Capability};
pub use credentials::{CredentialStore, FileTokenStorage, MemoryTokenStorage, TokenStorage};
pub use navigation::{Breadcrumb, Navigator, Route, RouteState, LOGIN_PATH};
pub use session::{SessionService, SessionState};
pub use validation::RegistrationForm;
