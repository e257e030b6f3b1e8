#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use http::{Method, StatusCode};
use saml_sso::config::SamlSsoConfig;
use saml_sso::domain::{CommandKind, CommandRegistry, PlaintextDataProtector, SamlSsoHandler};
use saml_sso_sdk::{
    AuthProperties, AuthenticationManager, AuthenticationTicket, Claim, CommandRequest,
    CommandResult, Identity, Principal, RelayData, RequestData, ResponseSink, SamlCommand,
    SamlOptions, SamlSsoError, claim_types,
};
use url::Url;

pub const IDP: &str = "https://idp.test/metadata";

/// What a command saw when it ran.
#[derive(Debug, Clone, Default)]
pub struct RecordedCall {
    pub path: String,
    pub idp: Option<String>,
    pub return_url: Option<String>,
    pub relay_data: Option<RelayData>,
    pub stored_request_state: Option<RelayData>,
}

/// Command returning a canned result and recording its inputs.
pub struct FakeCommand {
    result: Result<CommandResult, SamlSsoError>,
    own_redirect: Option<String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeCommand {
    pub fn returning(result: CommandResult) -> Self {
        Self {
            result: Ok(result),
            own_redirect: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: SamlSsoError) -> Self {
        Self {
            result: Err(error),
            own_redirect: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Writes a `302` to `location` itself and reports the response as handled.
    pub fn redirecting_itself(location: &str) -> Self {
        Self {
            result: Ok(CommandResult::handled()),
            own_redirect: Some(location.to_owned()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SamlCommand for FakeCommand {
    async fn run(
        &self,
        request: &CommandRequest<'_>,
        response: &mut ResponseSink,
        _options: &SamlOptions,
    ) -> Result<CommandResult, SamlSsoError> {
        self.calls.lock().unwrap().push(RecordedCall {
            path: request.data.path().to_owned(),
            idp: request.idp.map(|idp| idp.as_str().to_owned()),
            return_url: request.return_url.map(str::to_owned),
            relay_data: request.relay_data.cloned(),
            stored_request_state: request.data.stored_request_state().cloned(),
        });
        if let Some(location) = &self.own_redirect {
            response.redirect(StatusCode::FOUND, location)?;
        }
        self.result.clone()
    }
}

/// Ticket store keyed by scheme, standing in for the host's cookie handlers.
#[derive(Default)]
pub struct InMemoryAuth {
    tickets: Mutex<HashMap<String, AuthenticationTicket>>,
    sign_ins: Mutex<Vec<AuthenticationTicket>>,
    sign_outs: Mutex<Vec<String>>,
    fail_reads: bool,
}

impl InMemoryAuth {
    pub fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    pub fn seed(&self, ticket: AuthenticationTicket) {
        self.tickets
            .lock()
            .unwrap()
            .insert(ticket.scheme.clone(), ticket);
    }

    pub fn ticket(&self, scheme: &str) -> Option<AuthenticationTicket> {
        self.tickets.lock().unwrap().get(scheme).cloned()
    }

    pub fn sign_ins(&self) -> Vec<AuthenticationTicket> {
        self.sign_ins.lock().unwrap().clone()
    }

    pub fn sign_outs(&self) -> Vec<String> {
        self.sign_outs.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthenticationManager for InMemoryAuth {
    async fn authenticate(
        &self,
        _request: &RequestData,
        scheme: &str,
    ) -> Result<Option<AuthenticationTicket>, SamlSsoError> {
        if self.fail_reads {
            return Err(SamlSsoError::Host(format!("cannot read scheme {scheme}")));
        }
        Ok(self.ticket(scheme))
    }

    async fn sign_in(
        &self,
        _response: &mut ResponseSink,
        ticket: AuthenticationTicket,
    ) -> Result<(), SamlSsoError> {
        self.sign_ins.lock().unwrap().push(ticket.clone());
        self.seed(ticket);
        Ok(())
    }

    async fn sign_out(
        &self,
        _response: &mut ResponseSink,
        scheme: &str,
    ) -> Result<(), SamlSsoError> {
        self.tickets.lock().unwrap().remove(scheme);
        self.sign_outs.lock().unwrap().push(scheme.to_owned());
        Ok(())
    }
}

/// Handler wired to fakes, with handles to inspect them afterwards.
pub struct Harness {
    pub handler: Arc<SamlSsoHandler>,
    pub auth: Arc<InMemoryAuth>,
    commands: HashMap<CommandKind, Arc<FakeCommand>>,
}

impl Harness {
    pub fn command(&self, kind: CommandKind) -> &FakeCommand {
        &self.commands[&kind]
    }
}

pub struct HarnessBuilder {
    config: SamlSsoConfig,
    auth: InMemoryAuth,
    commands: HashMap<CommandKind, FakeCommand>,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            config: SamlSsoConfig::default(),
            auth: InMemoryAuth::default(),
            commands: HashMap::new(),
        }
    }

    pub fn config(mut self, config: SamlSsoConfig) -> Self {
        self.config = config;
        self
    }

    pub fn auth(mut self, auth: InMemoryAuth) -> Self {
        self.auth = auth;
        self
    }

    pub fn command(mut self, kind: CommandKind, command: FakeCommand) -> Self {
        self.commands.insert(kind, command);
        self
    }

    pub fn returning(self, kind: CommandKind, result: CommandResult) -> Self {
        self.command(kind, FakeCommand::returning(result))
    }

    pub fn build(mut self) -> Harness {
        let mut fakes = HashMap::new();
        let mut registry = CommandRegistry::builder();
        for kind in CommandKind::ALL {
            let fake = Arc::new(
                self.commands
                    .remove(&kind)
                    .unwrap_or_else(|| FakeCommand::returning(CommandResult::handled())),
            );
            registry = registry.register(kind, fake.clone());
            fakes.insert(kind, fake);
        }

        let options = Arc::new(
            self.config
                .to_options(Arc::new(PlaintextDataProtector::new())),
        );
        let auth = Arc::new(self.auth);
        let handler = SamlSsoHandler::new(options, registry.build().unwrap(), auth.clone());

        Harness {
            handler: Arc::new(handler),
            auth,
            commands: fakes,
        }
    }
}

pub fn get(url: &str) -> RequestData {
    RequestData::builder(Method::GET, Url::parse(url).unwrap()).build()
}

pub fn external_principal() -> Principal {
    Principal::new(Identity::new(
        "Saml2",
        vec![
            Claim::new(claim_types::NAME_IDENTIFIER, "alice@idp")
                .with_issuer(IDP)
                .with_property("format", "urn:oasis:names:tc:SAML:2.0:nameid-format:transient"),
            Claim::new(claim_types::SESSION_INDEX, "_sess42").with_issuer(IDP),
            Claim::new("email", "alice@example.org").with_issuer(IDP),
        ],
    ))
}

/// Local grant as the host application issues it.
pub fn grant_ticket() -> AuthenticationTicket {
    AuthenticationTicket {
        principal: Principal::new(Identity::new(
            "Application",
            vec![Claim::new("sub", "local-42")],
        )),
        properties: AuthProperties::default(),
        scheme: "Saml2".to_owned(),
    }
}
