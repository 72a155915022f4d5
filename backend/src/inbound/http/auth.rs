//! Bearer token extraction.
//!
//! Handlers take a [`BearerIdentity`] argument to require an authenticated
//! caller. The extractor only parses the `Authorization` header; verifying
//! the token and loading the account is the [`Authenticator`] port's job.
//!
//! [`Authenticator`]: crate::domain::ports::Authenticator

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, Identity};

use super::state::HttpState;

const BEARER_SCHEME: &str = "bearer";

/// Identity of the caller named by a valid bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BearerIdentity(pub Identity);

impl BearerIdentity {
    pub fn into_inner(self) -> Identity {
        self.0
    }
}

fn bearer_token(req: &HttpRequest) -> Result<String, Error> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing bearer token"))?;
    let value = header
        .to_str()
        .map_err(|_| Error::unauthorized("authorization header is not valid text"))?;
    match value.trim().split_once(' ') {
        Some((scheme, token))
            if scheme.eq_ignore_ascii_case(BEARER_SCHEME) && !token.trim().is_empty() =>
        {
            Ok(token.trim().to_owned())
        }
        _ => Err(Error::unauthorized(
            "authorization header must use the Bearer scheme",
        )),
    }
}

impl FromRequest for BearerIdentity {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        Box::pin(async move {
            let state = state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let token = token?;
            let identity = state.authenticator.authenticate(&token).await?;
            Ok(Self(identity))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, get, test as actix_test};
    use rstest::rstest;

    use crate::domain::ports::MockAuthenticator;
    use crate::domain::{Role, UserId};
    use crate::inbound::http::test_utils::HttpStateBuilder;

    #[get("/whoami")]
    async fn whoami(identity: BearerIdentity) -> HttpResponse {
        HttpResponse::Ok().body(identity.into_inner().role().as_str())
    }

    fn authenticator() -> MockAuthenticator {
        let mut authenticator = MockAuthenticator::new();
        authenticator.expect_authenticate().returning(|token| {
            if token == "good-token" {
                Ok(Identity::new(UserId::random(), Role::Agent))
            } else {
                Err(Error::unauthorized("token is invalid"))
            }
        });
        authenticator
    }

    async fn call(header: Option<&str>) -> actix_web::dev::ServiceResponse {
        let state = HttpStateBuilder::new().authenticator(authenticator()).build();
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(whoami),
        )
        .await;
        let mut request = actix_test::TestRequest::get().uri("/whoami");
        if let Some(value) = header {
            request = request.insert_header((AUTHORIZATION, value));
        }
        actix_test::call_service(&app, request.to_request()).await
    }

    #[rstest]
    #[case("Bearer good-token")]
    #[case("bearer   good-token")]
    #[actix_web::test]
    async fn valid_bearer_tokens_resolve_the_caller(#[case] header: &str) {
        let response = call(Some(header)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = actix_test::read_body(response).await;
        assert_eq!(body.as_ref(), b"agent");
    }

    #[rstest]
    #[case(None)]
    #[case(Some("Basic dXNlcjpwYXNz"))]
    #[case(Some("Bearer "))]
    #[case(Some("Bearer other-token"))]
    #[actix_web::test]
    async fn missing_or_bad_tokens_are_unauthorized(#[case] header: Option<&str>) {
        let response = call(header).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
