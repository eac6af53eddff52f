//! The contact API server and its handlers.

use std::{collections::BTreeMap, net::SocketAddr, time::Duration};

use axum::{
    Json, Router,
    extract::{ConnectInfo, Form, Query, State, rejection::FormRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use missive_common::Signal;
use missive_delivery::{RequestMeta, Submission};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tracing::{debug, info, warn};

use crate::{
    HttpConfig, HttpError,
    responses::{self, CsrfTokenResponse, EndpointInfo, SubmitOutcome, SubmitRejection},
    state::AppState,
    validate::{self, ContactForm},
};

/// The contact API server.
///
/// Binds eagerly so configuration problems surface at startup rather than
/// on the first request.
pub struct ContactServer {
    listener: TcpListener,
    router: Router,
}

impl ContactServer {
    /// Binds the listener and assembles the router.
    ///
    /// # Errors
    ///
    /// Returns an error if binding to the configured address fails.
    pub async fn new(config: &HttpConfig, state: AppState) -> Result<Self, HttpError> {
        let listener = TcpListener::bind(&config.listen_address)
            .await
            .map_err(|source| HttpError::Bind {
                address: config.listen_address.clone(),
                source,
            })?;

        info!(address = %config.listen_address, "contact API bound");

        let router = router(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)));

        Ok(Self { listener, router })
    }

    /// The bound address, for callers that requested port 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener's local address is unavailable.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves requests until the shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if the server loop fails.
    pub async fn serve(
        self,
        mut shutdown: tokio::sync::broadcast::Receiver<Signal>,
    ) -> Result<(), HttpError> {
        info!("contact API starting");

        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            info!("contact API received shutdown signal");
        })
        .await
        .map_err(|error| HttpError::Server(error.to_string()))?;

        info!("contact API stopped");
        Ok(())
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/contact", get(contact_info).post(submit_contact))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct CsrfQuery {
    #[serde(default)]
    csrf: String,
}

/// GET handler: issues a CSRF token when `?csrf=true`, otherwise reports
/// that the endpoint is alive.
async fn contact_info(State(state): State<AppState>, Query(query): Query<CsrfQuery>) -> Response {
    if query.csrf == "true" {
        let token = state.tokens.issue();
        debug!("issued csrf token");
        return Json(CsrfTokenResponse { csrf_token: token }).into_response();
    }

    Json(EndpointInfo {
        message: responses::ENDPOINT_INFO,
    })
    .into_response()
}

/// POST handler: the submission pipeline.
async fn submit_contact(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    form: Result<Form<ContactForm>, FormRejection>,
) -> Response {
    let client_ip = client_ip(&headers, peer);

    // The rate limit gate runs before anything looks at the body.
    if let Err(remaining) = state.limiter.check(&client_ip) {
        return rate_limited(&state, &client_ip, remaining);
    }

    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            debug!(ip = %client_ip, error = %rejection, "submission body was not a urlencoded form");
            let mut errors = BTreeMap::new();
            errors.insert("form", responses::FORM_UNREADABLE.to_owned());
            return rejected(errors);
        }
    };

    let errors = validate::collect_errors(&form, &state.tokens, &state.spam);
    if !errors.is_empty() {
        debug!(
            ip = %client_ip,
            fields = ?errors.keys().collect::<Vec<_>>(),
            "submission failed validation"
        );
        return rejected(errors);
    }

    let submission = Submission::new(form.name, form.email, form.message);
    let meta = RequestMeta {
        client_ip: Some(client_ip.clone()),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned),
    };

    match state.mailer.dispatch(&submission, &meta).await {
        Ok(()) => {
            info!(ip = %client_ip, "contact submission accepted");
            (
                StatusCode::OK,
                Json(SubmitOutcome {
                    success: true,
                    message: responses::SUBMIT_SUCCESS,
                }),
            )
                .into_response()
        }
        Err(error) => {
            warn!(ip = %client_ip, %error, "contact submission could not be delivered");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SubmitOutcome {
                    success: false,
                    message: responses::SUBMIT_FAILURE,
                }),
            )
                .into_response()
        }
    }
}

fn rejected(errors: BTreeMap<&'static str, String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(SubmitRejection {
            success: false,
            errors,
        }),
    )
        .into_response()
}

fn rate_limited(state: &AppState, client_ip: &str, remaining: Duration) -> Response {
    let minutes = remaining.as_secs().div_ceil(60).max(1);
    warn!(ip = %client_ip, minutes, "submission rate limited");

    let mut errors = BTreeMap::new();
    errors.insert(
        "rateLimit",
        format!("Too many requests. Please try again in {minutes} minutes."),
    );

    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(SubmitRejection {
            success: false,
            errors,
        }),
    )
        .into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(state.limiter.window_secs()));
    response
}

/// First `X-Forwarded-For` entry when present, else the peer address.
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_owned())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| peer.ip().to_string())
}
