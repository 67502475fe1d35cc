//! The storefront root context.

use std::sync::Arc;

use boutique_core::Session;
use serde::de::IgnoredAny;
use tracing::{debug, instrument, warn};

use crate::admin::AdminClient;
use crate::api::ApiClient;
use crate::auth::{AuthSession, Credentials, TokenStore};
use crate::cart::{ActiveCart, LocalCart, ReconcileResult, ServerCart, reconcile};
use crate::catalog::CatalogClient;
use crate::config::StorefrontConfig;
use crate::error::Result;
use crate::orders::OrderClient;
use crate::storage::{FileStore, SharedStore};
use crate::support::SupportClient;

/// What a successful login produced.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub session: Session,
    /// Result of merging the anonymous cart into the server cart.
    pub reconcile: ReconcileResult,
}

/// Owns every storefront component.
///
/// Create one per process (or per test) and pass it where it is needed.
/// Mutating operations take `&mut self`: one logical caller at a time.
pub struct Storefront {
    config: StorefrontConfig,
    store: SharedStore,
    api: ApiClient,
    auth: AuthSession,
    local_cart: LocalCart,
    server_cart: ServerCart,
    catalog: CatalogClient,
    orders: OrderClient,
    support: SupportClient,
}

impl Storefront {
    /// Open a storefront persisting device state under `config.data_dir`.
    ///
    /// The session starts anonymous; call [`Storefront::restore`] to pick up
    /// a token saved by an earlier run.
    ///
    /// # Errors
    ///
    /// Returns `Error::Api` if the HTTP client cannot be built.
    pub fn open(config: &StorefrontConfig) -> Result<Self> {
        let store: SharedStore = Arc::new(FileStore::new(config.data_dir.clone()));
        Self::with_store(config, store)
    }

    /// Open a storefront over an arbitrary device store.
    ///
    /// # Errors
    ///
    /// Returns `Error::Api` if the HTTP client cannot be built.
    pub fn with_store(config: &StorefrontConfig, store: SharedStore) -> Result<Self> {
        let tokens = TokenStore::new(Arc::clone(&store));
        let api = ApiClient::new(config, tokens)?;

        Ok(Self {
            config: config.clone(),
            auth: AuthSession::new(api.clone(), config.profile_path.clone()),
            local_cart: LocalCart::new(Arc::clone(&store)),
            server_cart: ServerCart::new(api.clone()),
            catalog: CatalogClient::new(api.clone(), config.catalog_cache_ttl),
            orders: OrderClient::new(api.clone()),
            support: SupportClient::new(api.clone()),
            store,
            api,
        })
    }

    /// Resume the session of a previous run, if its token is still good.
    pub async fn restore(&mut self) -> Option<Session> {
        self.auth.restore().await
    }

    /// Log in, then move the anonymous cart into the server cart.
    ///
    /// Reconciliation runs exactly once per successful login. Lines the
    /// server refuses are reported in [`LoginOutcome::reconcile`] and do not
    /// undo the login.
    ///
    /// # Errors
    ///
    /// Any error of [`AuthSession::login`]; nothing is reconciled then. A
    /// `StorageError` if the local cart cannot be erased afterwards, in
    /// which case the session is nonetheless established.
    #[instrument(skip_all)]
    pub async fn login(&mut self, credentials: &Credentials) -> Result<LoginOutcome> {
        let session = self.auth.login(credentials).await?;
        let reconcile = reconcile(&self.local_cart, &self.server_cart).await?;
        if reconcile.is_partial_failure() {
            warn!(
                failed = reconcile.failed.len(),
                "Some cart lines could not be moved to the account"
            );
        }
        Ok(LoginOutcome { session, reconcile })
    }

    /// Log out locally, telling the backend on a best-effort basis.
    ///
    /// Never fails: a backend that cannot be reached only gets a debug log.
    #[instrument(skip_all)]
    pub async fn logout(&mut self) {
        if self.api.tokens().is_present() {
            let notified: std::result::Result<IgnoredAny, _> =
                self.api.post_empty("/auth/logout").await;
            if let Err(e) = notified {
                debug!(error = %e, "Backend logout failed, clearing local session anyway");
            }
        }
        self.auth.logout();
    }

    /// The authoritative cart for the current session state.
    #[must_use]
    pub fn cart(&self) -> ActiveCart {
        if self.auth.is_authenticated() {
            ActiveCart::Server(self.server_cart.clone())
        } else {
            ActiveCart::Local(self.local_cart.clone())
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.auth.is_admin()
    }

    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.auth.session()
    }

    #[must_use]
    pub const fn auth(&self) -> &AuthSession {
        &self.auth
    }

    pub const fn auth_mut(&mut self) -> &mut AuthSession {
        &mut self.auth
    }

    #[must_use]
    pub const fn local_cart(&self) -> &LocalCart {
        &self.local_cart
    }

    #[must_use]
    pub const fn server_cart(&self) -> &ServerCart {
        &self.server_cart
    }

    #[must_use]
    pub const fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    #[must_use]
    pub const fn orders(&self) -> &OrderClient {
        &self.orders
    }

    #[must_use]
    pub const fn support(&self) -> &SupportClient {
        &self.support
    }

    /// Back-office client, for administrator sessions only.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` without a session, or
    /// `AuthError::Forbidden` for a customer account.
    pub fn admin(&self) -> Result<AdminClient> {
        AdminClient::for_session(&self.auth, self.api.clone(), self.catalog.clone())
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub const fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    /// The device store holding the token and anonymous cart.
    #[must_use]
    pub const fn store(&self) -> &SharedStore {
        &self.store
    }
}
