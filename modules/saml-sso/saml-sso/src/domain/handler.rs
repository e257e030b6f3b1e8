//! Pipeline handler: ties routing, commands, reconciliation, and correlation together.

use std::fmt;
use std::sync::Arc;

use saml_sso_sdk::{
    AuthProperties, AuthenticateOutcome, AuthenticationManager, CommandRequest, CommandResult,
    EntityId, RequestData, ResponseSink, SamlOptions,
};

use super::DomainError;
use super::augmenter::augment_grant_with_logout_claims;
use super::command::{CommandKind, CommandRegistry};
use super::dispatcher::{Dispatch, dispatch, is_acs_path};
use super::logout::{application_url, resolve_logout_redirect};
use super::reconciler::{Reconciliation, reconcile};

/// Challenge item naming the identity provider to sign in with.
pub const IDP_ITEM: &str = "idp";

/// One request and the response being built for it.
#[derive(Debug)]
pub struct HttpContext {
    pub request: RequestData,
    pub response: ResponseSink,
}

impl HttpContext {
    #[must_use]
    pub fn new(request: RequestData) -> Self {
        Self {
            request,
            response: ResponseSink::new(),
        }
    }
}

/// SAML authentication handler plugged into the host pipeline.
pub struct SamlSsoHandler {
    options: Arc<SamlOptions>,
    commands: CommandRegistry,
    auth: Arc<dyn AuthenticationManager>,
}

impl fmt::Debug for SamlSsoHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SamlSsoHandler")
            .field("options", &self.options)
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}

impl SamlSsoHandler {
    #[must_use]
    pub fn new(
        options: Arc<SamlOptions>,
        commands: CommandRegistry,
        auth: Arc<dyn AuthenticationManager>,
    ) -> Self {
        Self {
            options,
            commands,
            auth,
        }
    }

    #[must_use]
    pub fn options(&self) -> &SamlOptions {
        &self.options
    }

    /// Handle a request addressed to the module path.
    ///
    /// Returns `false` when the path is outside the module path and the host
    /// should continue with its own routing. Otherwise the response in `ctx`
    /// is final.
    ///
    /// # Errors
    ///
    /// - `UnknownOperation` for an unrecognised path under the module path
    /// - any command, reconciliation, or host pipeline failure
    #[tracing::instrument(skip_all, fields(path = %ctx.request.path()))]
    pub async fn handle_request(&self, ctx: &mut HttpContext) -> Result<bool, DomainError> {
        let reconciliation = match dispatch(&self.options.module_path, ctx.request.path())? {
            Dispatch::NotApplicable => return Ok(false),
            Dispatch::AssertionConsumer => self.consume_assertion(ctx).await?,
            Dispatch::Operation(kind) => {
                tracing::debug!(operation = %kind, "dispatching operation");
                let result = self
                    .commands
                    .get(kind)?
                    .run(
                        &CommandRequest::new(&ctx.request),
                        &mut ctx.response,
                        &self.options,
                    )
                    .await?;
                self.reconcile_result(ctx, result).await?
            }
        };

        self.complete_sign_in(ctx, reconciliation).await?;
        Ok(true)
    }

    /// Authentication step of the host pipeline.
    ///
    /// Only the assertion consumer endpoint authenticates; every other path
    /// is skipped. The returned ticket is not signed in here.
    ///
    /// # Errors
    ///
    /// Propagates command, reconciliation, and host pipeline failures.
    #[tracing::instrument(skip_all, fields(path = %ctx.request.path()))]
    pub async fn authenticate(
        &self,
        ctx: &mut HttpContext,
    ) -> Result<AuthenticateOutcome, DomainError> {
        if !is_acs_path(&self.options.module_path, ctx.request.path()) {
            return Ok(AuthenticateOutcome::Skip);
        }

        Ok(match self.consume_assertion(ctx).await? {
            Reconciliation::Authenticated(ticket) => AuthenticateOutcome::Success(ticket),
            Reconciliation::AlreadyHandled | Reconciliation::Applied => {
                AuthenticateOutcome::Fail("assertion consumer answered without a principal".to_owned())
            }
        })
    }

    /// Start sign-in with an identity provider.
    ///
    /// The `idp` item selects the identity provider; without it the sign-in
    /// command falls back to its default or to discovery. The redirect URI is
    /// moved out of the properties so it travels only once. Returns `false`
    /// when there is no challenge to act on.
    ///
    /// # Errors
    ///
    /// Propagates command, reconciliation, and host pipeline failures.
    #[tracing::instrument(skip_all, fields(path = %ctx.request.path()))]
    pub async fn challenge(
        &self,
        ctx: &mut HttpContext,
        properties: Option<AuthProperties>,
    ) -> Result<bool, DomainError> {
        let Some(mut properties) = properties else {
            return Ok(false);
        };

        let idp = properties.items.get(IDP_ITEM).map(EntityId::new);
        let redirect_uri = properties.redirect_uri.take();
        tracing::debug!(
            idp = idp.as_ref().map(EntityId::as_str),
            "starting sign-in"
        );

        let request = CommandRequest {
            data: &ctx.request,
            idp: idp.as_ref(),
            return_url: redirect_uri.as_deref(),
            relay_data: Some(&properties.items),
        };
        let result = self
            .commands
            .get(CommandKind::SignIn)?
            .run(&request, &mut ctx.response, &self.options)
            .await?;

        let reconciliation = self.reconcile_result(ctx, result).await?;
        self.complete_sign_in(ctx, reconciliation).await?;
        Ok(true)
    }

    /// Start logout, sending the user to the resolved post-logout URL afterwards.
    ///
    /// # Errors
    ///
    /// - `InvalidRedirect` if the post-logout URL cannot be built
    /// - command, reconciliation, and host pipeline failures
    #[tracing::instrument(skip_all, fields(path = %ctx.request.path()))]
    pub async fn sign_out(
        &self,
        ctx: &mut HttpContext,
        properties: Option<AuthProperties>,
    ) -> Result<(), DomainError> {
        let Some(properties) = properties else {
            return Ok(());
        };

        let base = application_url(&self.options, &ctx.request);
        let return_url = resolve_logout_redirect(
            properties.redirect_uri.as_deref(),
            &ctx.response,
            &base,
            ctx.request.path(),
        )?;
        tracing::debug!(%return_url, "starting logout");

        let request = CommandRequest {
            return_url: Some(&return_url),
            ..CommandRequest::new(&ctx.request)
        };
        let result = self
            .commands
            .get(CommandKind::Logout)?
            .run(&request, &mut ctx.response, &self.options)
            .await?;

        let reconciliation = self.reconcile_result(ctx, result).await?;
        self.complete_sign_in(ctx, reconciliation).await
    }

    async fn consume_assertion(
        &self,
        ctx: &mut HttpContext,
    ) -> Result<Reconciliation, DomainError> {
        let result = self
            .commands
            .get(CommandKind::Acs)?
            .run(
                &CommandRequest::new(&ctx.request),
                &mut ctx.response,
                &self.options,
            )
            .await?;
        self.reconcile_result(ctx, result).await
    }

    async fn reconcile_result(
        &self,
        ctx: &mut HttpContext,
        result: CommandResult,
    ) -> Result<Reconciliation, DomainError> {
        let terminate = result.terminate_local_session;
        let reconciliation = reconcile(result, &mut ctx.response, &self.options)?;

        if terminate {
            self.auth
                .sign_out(&mut ctx.response, &self.options.sign_in_as_scheme)
                .await?;
            tracing::info!(scheme = %self.options.sign_in_as_scheme, "local session terminated");
        }
        Ok(reconciliation)
    }

    async fn complete_sign_in(
        &self,
        ctx: &mut HttpContext,
        reconciliation: Reconciliation,
    ) -> Result<(), DomainError> {
        let Reconciliation::Authenticated(ticket) = reconciliation else {
            return Ok(());
        };

        let scheme = ticket.scheme.clone();
        self.auth.sign_in(&mut ctx.response, *ticket).await?;
        tracing::info!(%scheme, "external identity signed in");

        augment_grant_with_logout_claims(
            self.auth.as_ref(),
            &ctx.request,
            &mut ctx.response,
            &self.options,
        )
        .await;
        Ok(())
    }
}
