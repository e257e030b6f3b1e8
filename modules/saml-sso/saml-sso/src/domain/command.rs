//! Closed set of protocol operations and the registry that maps names to implementations.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use saml_sso_sdk::SamlCommand;

use super::DomainError;

/// Protocol operations reachable under the module path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Assertion consumer service.
    Acs,
    SignIn,
    Logout,
    /// Service provider metadata, served at the module path itself.
    Metadata,
}

impl CommandKind {
    pub const ALL: [Self; 4] = [Self::Acs, Self::SignIn, Self::Logout, Self::Metadata];

    /// Well-known path segment of the operation.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Acs => "acs",
            Self::SignIn => "signin",
            Self::Logout => "logout",
            Self::Metadata => "",
        }
    }

    /// Resolve a path remainder such as `/Acs` or `/logout/` to an operation.
    ///
    /// Matching ignores ASCII case and one leading and one trailing `/`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = normalize(name);
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metadata => f.write_str("metadata"),
            other => f.write_str(other.name()),
        }
    }
}

fn normalize(name: &str) -> &str {
    let name = name.strip_prefix('/').unwrap_or(name);
    name.strip_suffix('/').unwrap_or(name)
}

/// Complete mapping from every [`CommandKind`] to its implementation.
///
/// A registry can only be built when every operation is registered, so an
/// incomplete setup fails at startup instead of on the first request.
#[derive(Clone)]
pub struct CommandRegistry {
    commands: HashMap<CommandKind, Arc<dyn SamlCommand>>,
}

impl CommandRegistry {
    #[must_use]
    pub fn builder() -> CommandRegistryBuilder {
        CommandRegistryBuilder::default()
    }

    /// Implementation of `kind`.
    ///
    /// # Errors
    ///
    /// Returns `MissingCommand` only if the registry invariant was broken.
    pub fn get(&self, kind: CommandKind) -> Result<&dyn SamlCommand, DomainError> {
        self.commands
            .get(&kind)
            .map(Arc::as_ref)
            .ok_or_else(|| DomainError::MissingCommand {
                name: kind.to_string(),
            })
    }

    /// Resolve a path remainder to an operation and its implementation.
    ///
    /// # Errors
    ///
    /// Returns `UnknownOperation` when `name` matches no operation.
    pub fn resolve(&self, name: &str) -> Result<(CommandKind, &dyn SamlCommand), DomainError> {
        let kind = CommandKind::from_name(name).ok_or_else(|| DomainError::unknown_operation(name))?;
        Ok((kind, self.get(kind)?))
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<String> = self.commands.keys().map(ToString::to_string).collect();
        kinds.sort();
        f.debug_struct("CommandRegistry")
            .field("commands", &kinds)
            .finish()
    }
}

#[derive(Default)]
pub struct CommandRegistryBuilder {
    commands: HashMap<CommandKind, Arc<dyn SamlCommand>>,
}

impl CommandRegistryBuilder {
    /// Register `command` for `kind`, replacing any previous registration.
    #[must_use]
    pub fn register(mut self, kind: CommandKind, command: Arc<dyn SamlCommand>) -> Self {
        self.commands.insert(kind, command);
        self
    }

    /// # Errors
    ///
    /// Returns `MissingCommand` for the first operation without an implementation.
    pub fn build(self) -> Result<CommandRegistry, DomainError> {
        if let Some(missing) = CommandKind::ALL
            .into_iter()
            .find(|kind| !self.commands.contains_key(kind))
        {
            return Err(DomainError::MissingCommand {
                name: missing.to_string(),
            });
        }
        Ok(CommandRegistry {
            commands: self.commands,
        })
    }
}
