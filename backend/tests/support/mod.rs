//! Shared harness for integration suites.
//!
//! Wires the real domain services over the in-memory repositories, a
//! settable clock and a real token codec, so HTTP scenarios exercise the
//! whole stack without a database.

use std::sync::{Arc, Mutex};

use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use chrono::{DateTime, Duration, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use serde_json::{Value, json};
use zeroize::Zeroizing;

use foodshare::Trace;
use foodshare::domain::{
    AccountPolicy, AccountService, DonationLifecycleService, DonationQueryService, StoreTimeout,
    TRACE_ID_HEADER, TokenAuthenticator,
};
use foodshare::inbound::http::state::HttpState;
use foodshare::inbound::http::validation::{json_config, path_config, query_config};
use foodshare::inbound::http::{donations, users};
use foodshare::outbound::memory::{InMemoryDonationRepository, InMemoryUserRepository};
use foodshare::outbound::security::{Argon2PasswordHasher, JwtTokenCodec};

pub const PASSWORD: &str = "correct horse battery";

pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut guard = self.0.lock().expect("clock mutex");
        *guard += delta;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().expect("clock mutex")
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 14, 9, 0, 0)
        .single()
        .expect("valid fixed time")
}

/// Services over in-memory stores, plus the clock driving them.
pub struct Stack {
    pub state: HttpState,
    pub clock: Arc<MutableClock>,
}

pub fn memory_stack() -> Stack {
    let clock = Arc::new(MutableClock::new(start_time()));
    let dyn_clock: Arc<dyn Clock> = clock.clone();
    let timeout = StoreTimeout::default();
    let donations = Arc::new(InMemoryDonationRepository::new());
    let users = Arc::new(InMemoryUserRepository::new());
    let tokens = Arc::new(JwtTokenCodec::new(
        &Zeroizing::new(vec![b'k'; 32]),
        Duration::hours(1),
    ));
    let accounts = Arc::new(AccountService::new(
        users.clone(),
        Arc::new(Argon2PasswordHasher::new()),
        tokens.clone(),
        dyn_clock.clone(),
        timeout,
        AccountPolicy {
            allow_admin_registration: true,
        },
    ));

    let state = HttpState {
        donations: Arc::new(DonationLifecycleService::new(
            donations.clone(),
            users.clone(),
            dyn_clock.clone(),
            timeout,
        )),
        donations_query: Arc::new(DonationQueryService::new(
            donations,
            dyn_clock.clone(),
            timeout,
        )),
        accounts: accounts.clone(),
        accounts_query: accounts,
        authenticator: Arc::new(TokenAuthenticator::new(users, tokens, dyn_clock, timeout)),
    };
    Stack { state, clock }
}

pub fn app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .wrap(Trace)
        .service(
            web::scope("/api/v1")
                .configure(users::configure)
                .configure(donations::configure),
        )
}

/// Response status, JSON body and trace header of one call.
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
    pub trace_id: Option<String>,
}

impl Reply {
    pub fn str_at(&self, pointer: &str) -> Option<&str> {
        self.body.pointer(pointer).and_then(Value::as_str)
    }
}

pub async fn send<S, R>(app: &S, request: R) -> Reply
where
    S: Service<R, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response = actix_test::call_service(app, request).await;
    let status = response.status();
    let trace_id = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let body = actix_test::read_body(response).await;
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);
    Reply {
        status,
        body,
        trace_id,
    }
}

pub fn registration(name: &str, email: &str, user_type: &str) -> Value {
    json!({
        "name": name,
        "email": email,
        "password": PASSWORD,
        "userType": user_type,
        "phone": "+44 20 7946 0000",
    })
}

pub fn donation_body(expiry: DateTime<Utc>) -> Value {
    json!({
        "foodName": "Vegetable biryani",
        "foodType": "cooked",
        "quantity": 12,
        "quantityUnit": "servings",
        "expiryDate": expiry.to_rfc3339(),
        "pickupAddress": "12 Market Road",
        "contactPhone": "+44 20 7946 0001",
    })
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}
