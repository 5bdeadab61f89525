//! Authentication route handlers: signup, login, logout, password reset.
//!
//! Validation failures re-render the originating form with field-level
//! messages. Cross-request notices (account created, email sent) travel as
//! query-parameter codes and are mapped back to text here.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::Result;
use crate::forms::{FieldError, validate_signup};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form and query types
// =============================================================================

/// Signup form data.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Forgot-password form data.
#[derive(Debug, Deserialize)]
pub struct ResetForm {
    pub email: String,
}

/// New-password form data (the reset token travels in a hidden field).
#[derive(Debug, Deserialize)]
pub struct NewPasswordForm {
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

/// Query parameters carrying a notice code between redirects.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Map a notice code to the text the page shows.
fn notice_text(code: &str) -> String {
    match code {
        "account_created" => "Your account has been created. Please log in.".to_owned(),
        "password_updated" => "Your password has been updated. Please log in.".to_owned(),
        "email_sent" => "Check your email for the reset link.".to_owned(),
        "invalid_token" => "That reset link is invalid or has expired.".to_owned(),
        other => other.to_owned(),
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Signup page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub email: String,
    pub errors: Vec<FieldError>,
    pub logged_in: bool,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
    pub logged_in: bool,
}

/// Forgot-password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset.html")]
pub struct ResetTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
    pub logged_in: bool,
}

/// New-password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/new_password.html")]
pub struct NewPasswordTemplate {
    pub token: String,
    pub errors: Vec<FieldError>,
    pub logged_in: bool,
}

// =============================================================================
// Signup
// =============================================================================

/// Display the signup page.
pub async fn signup_page() -> impl IntoResponse {
    SignupTemplate {
        email: String::new(),
        errors: Vec::new(),
        logged_in: false,
    }
}

/// Handle signup form submission.
pub async fn signup(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> Result<Response> {
    let errors = validate_signup(&form.email, &form.password, &form.confirm_password);
    if !errors.is_empty() {
        return Ok(signup_retry(form.email, errors));
    }

    match AuthService::new(state.pool())
        .register(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            // Fire-and-forget: signup never fails because the mail didn't send
            let mailer = state.mailer().clone();
            let shop_url = state.config().base_url.clone();
            tokio::spawn(async move {
                if let Err(e) = mailer.send_welcome(&user.email, &shop_url).await {
                    tracing::warn!("failed to send welcome email: {e}");
                }
            });

            Ok(Redirect::to("/login?success=account_created").into_response())
        }
        Err(AuthError::UserAlreadyExists) => Ok(signup_retry(
            form.email,
            vec![FieldError {
                field: "email",
                message: "Email already exists!".to_owned(),
            }],
        )),
        Err(AuthError::InvalidEmail(_)) => Ok(signup_retry(
            form.email,
            vec![FieldError {
                field: "email",
                message: "Please enter a valid email address!".to_owned(),
            }],
        )),
        Err(AuthError::WeakPassword(message)) => Ok(signup_retry(
            form.email,
            vec![FieldError {
                field: "password",
                message,
            }],
        )),
        Err(e) => Err(e.into()),
    }
}

fn signup_retry(email: String, errors: Vec<FieldError>) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        SignupTemplate {
            email,
            errors,
            logged_in: false,
        },
    )
        .into_response()
}

// =============================================================================
// Login / logout
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    LoginTemplate {
        error: query.error.as_deref().map(notice_text),
        success: query.success.as_deref().map(notice_text),
        logged_in: false,
    }
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            if let Err(e) = set_current_user(&session, &CurrentUser::from(&user)).await {
                tracing::error!("failed to set session: {e}");
                return Ok(Redirect::to("/login?error=session").into_response());
            }
            Ok(Redirect::to("/").into_response())
        }
        Err(AuthError::InvalidCredentials) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            LoginTemplate {
                error: Some("Invalid email or password.".to_owned()),
                success: None,
                logged_in: false,
            },
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// Handle logout: drop the whole session.
pub async fn logout(session: Session) -> impl IntoResponse {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("failed to clear session: {e}");
    }
    if let Err(e) = session.flush().await {
        tracing::error!("failed to flush session: {e}");
    }

    Redirect::to("/")
}

// =============================================================================
// Password reset
// =============================================================================

/// Display the forgot-password page.
pub async fn reset_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    ResetTemplate {
        error: query.error.as_deref().map(notice_text),
        success: query.success.as_deref().map(notice_text),
        logged_in: false,
    }
}

/// Handle forgot-password form submission: mint a token and email the link.
pub async fn reset(State(state): State<AppState>, Form(form): Form<ResetForm>) -> Result<Response> {
    match AuthService::new(state.pool())
        .start_password_reset(&form.email)
        .await?
    {
        Some((user, token)) => {
            let mailer = state.mailer().clone();
            let reset_url = format!("{}/reset/{token}", state.config().base_url);
            tokio::spawn(async move {
                if let Err(e) = mailer.send_password_reset(&user.email, &reset_url).await {
                    tracing::warn!("failed to send password reset email: {e}");
                }
            });

            Ok(Redirect::to("/reset?success=email_sent").into_response())
        }
        None => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            ResetTemplate {
                error: Some("No account with that email was found.".to_owned()),
                success: None,
                logged_in: false,
            },
        )
            .into_response()),
    }
}

/// Display the new-password page behind a reset link.
pub async fn new_password_page(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response> {
    let user = AuthService::new(state.pool())
        .user_for_reset_token(&token)
        .await?;

    if user.is_none() {
        return Ok(Redirect::to("/reset?error=invalid_token").into_response());
    }

    Ok(NewPasswordTemplate {
        token,
        errors: Vec::new(),
        logged_in: false,
    }
    .into_response())
}

/// Handle new-password form submission.
pub async fn new_password(
    State(state): State<AppState>,
    Form(form): Form<NewPasswordForm>,
) -> Result<Response> {
    if form.password != form.confirm_password {
        return Ok(new_password_retry(
            form.token,
            "Passwords don't match!".to_owned(),
        ));
    }

    match AuthService::new(state.pool())
        .complete_password_reset(&form.token, &form.password)
        .await
    {
        Ok(_) => Ok(Redirect::to("/login?success=password_updated").into_response()),
        Err(AuthError::InvalidResetToken) => {
            Ok(Redirect::to("/reset?error=invalid_token").into_response())
        }
        Err(AuthError::WeakPassword(message)) => Ok(new_password_retry(form.token, message)),
        Err(e) => Err(e.into()),
    }
}

fn new_password_retry(token: String, message: String) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        NewPasswordTemplate {
            token,
            errors: vec![FieldError {
                field: "password",
                message,
            }],
            logged_in: false,
        },
    )
        .into_response()
}
