//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use crate::domain::Identity;
use crate::domain::ports::{
    MockAccountCommand, MockAccountQuery, MockAuthenticator, MockDonationCommand,
    MockDonationQuery,
};

use super::state::HttpState;

/// Bearer token accepted by [`HttpStateBuilder::authenticated_as`].
pub const TEST_TOKEN: &str = "test-token";

/// Builds an [`HttpState`] from mocks. Ports left unset are mocks without
/// expectations, so any call to them fails the test.
pub struct HttpStateBuilder {
    donations: MockDonationCommand,
    donations_query: MockDonationQuery,
    accounts: MockAccountCommand,
    accounts_query: MockAccountQuery,
    authenticator: MockAuthenticator,
}

impl HttpStateBuilder {
    pub fn new() -> Self {
        Self {
            donations: MockDonationCommand::new(),
            donations_query: MockDonationQuery::new(),
            accounts: MockAccountCommand::new(),
            accounts_query: MockAccountQuery::new(),
            authenticator: MockAuthenticator::new(),
        }
    }

    pub fn donations(mut self, mock: MockDonationCommand) -> Self {
        self.donations = mock;
        self
    }

    pub fn donations_query(mut self, mock: MockDonationQuery) -> Self {
        self.donations_query = mock;
        self
    }

    pub fn accounts(mut self, mock: MockAccountCommand) -> Self {
        self.accounts = mock;
        self
    }

    pub fn accounts_query(mut self, mock: MockAccountQuery) -> Self {
        self.accounts_query = mock;
        self
    }

    pub fn authenticator(mut self, mock: MockAuthenticator) -> Self {
        self.authenticator = mock;
        self
    }

    /// Resolve [`TEST_TOKEN`] to `identity`.
    pub fn authenticated_as(self, identity: Identity) -> Self {
        let mut authenticator = MockAuthenticator::new();
        authenticator
            .expect_authenticate()
            .withf(|token| token == TEST_TOKEN)
            .returning(move |_| Ok(identity));
        self.authenticator(authenticator)
    }

    pub fn build(self) -> HttpState {
        HttpState {
            donations: Arc::new(self.donations),
            donations_query: Arc::new(self.donations_query),
            accounts: Arc::new(self.accounts),
            accounts_query: Arc::new(self.accounts_query),
            authenticator: Arc::new(self.authenticator),
        }
    }
}

/// `Authorization` header value carrying [`TEST_TOKEN`].
pub fn bearer() -> (&'static str, String) {
    ("Authorization", format!("Bearer {TEST_TOKEN}"))
}
