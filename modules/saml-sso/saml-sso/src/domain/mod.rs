//! Request routing, result reconciliation, and logout correlation.

pub mod augmenter;
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod logout;
pub mod protector;
pub mod reconciler;
pub mod request;

pub use command::{CommandKind, CommandRegistry, CommandRegistryBuilder};
pub use dispatcher::{Dispatch, dispatch};
pub use error::DomainError;
pub use handler::{HttpContext, SamlSsoHandler};
pub use protector::PlaintextDataProtector;
pub use reconciler::{LOGIN_PROVIDER_KEY, Reconciliation, reconcile};
pub use request::read_request_data;
