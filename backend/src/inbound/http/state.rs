//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only ever talk to driving
//! ports, so they can be tested against mocks without any I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountCommand, AccountQuery, Authenticator, DonationCommand, DonationQuery,
};

/// Dependency bundle for HTTP handlers.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
///
/// use foodshare::inbound::http::state::HttpState;
/// # use foodshare::domain::ports::*;
/// # fn ports() -> (
/// #     Arc<dyn DonationCommand>, Arc<dyn DonationQuery>, Arc<dyn AccountCommand>,
/// #     Arc<dyn AccountQuery>, Arc<dyn Authenticator>,
/// # ) { unimplemented!() }
/// let (donations, donations_query, accounts, accounts_query, authenticator) = ports();
/// let state = HttpState {
///     donations,
///     donations_query,
///     accounts,
///     accounts_query,
///     authenticator,
/// };
/// let _auth = state.authenticator.clone();
/// ```
#[derive(Clone)]
pub struct HttpState {
    pub donations: Arc<dyn DonationCommand>,
    pub donations_query: Arc<dyn DonationQuery>,
    pub accounts: Arc<dyn AccountCommand>,
    pub accounts_query: Arc<dyn AccountQuery>,
    pub authenticator: Arc<dyn Authenticator>,
}
