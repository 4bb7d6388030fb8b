//! Purchase form route handlers.
//!
//! The form posts to `/buy/{product_id}` (HTMX-enhanced, plain POST as
//! fallback). Validation happens here, server-side, before the commerce
//! API is called; invalid submissions re-render the form fragment with
//! per-field errors and never reach the network layer.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::commerce::types::PurchaseRequest;
use crate::state::AppState;

/// Raw purchase form fields as submitted by the visitor.
///
/// Everything arrives as text; `street_number` is coerced during
/// validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PurchaseForm {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub street_number: String,
    pub street: String,
    pub district: String,
    pub city: String,
    pub state: String,
}

/// Per-field validation errors, rendered inline next to each input.
#[derive(Debug, Clone, Default)]
pub struct FieldErrors {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub street_number: Option<String>,
    pub street: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl FieldErrors {
    /// True when every field passed validation.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone_number.is_none()
            && self.street_number.is_none()
            && self.street.is_none()
            && self.district.is_none()
            && self.city.is_none()
            && self.state.is_none()
    }
}

/// Everything the purchase form fragment needs to render.
#[derive(Debug, Clone, Default)]
pub struct PurchaseFormView {
    pub product_id: i64,
    pub values: PurchaseForm,
    pub errors: FieldErrors,
    /// Submission-level failure shown above the fields; the visitor may retry.
    pub submit_error: Option<String>,
}

impl PurchaseFormView {
    /// An untouched form for the given product.
    #[must_use]
    pub fn empty(product_id: i64) -> Self {
        Self {
            product_id,
            ..Self::default()
        }
    }
}

/// Purchase form fragment template (re-rendered on validation failure).
#[derive(Template, WebTemplate)]
#[template(path = "partials/purchase_form.html")]
pub struct PurchaseFormTemplate {
    pub form: PurchaseFormView,
}

const MSG_NAME: &str = "Nome deve ter pelo menos 3 caracteres";
const MSG_EMAIL: &str = "Email inválido";
const MSG_PHONE: &str = "Telefone deve ter pelo menos 10 dígitos";
const MSG_STREET_NUMBER: &str = "Número da rua é obrigatório";
const MSG_STREET: &str = "Rua deve ter pelo menos 3 caracteres";
const MSG_DISTRICT: &str = "Bairro deve ter pelo menos 3 caracteres";
const MSG_CITY: &str = "Cidade é obrigatória";
const MSG_STATE: &str = "Estado é obrigatório";
const MSG_SUBMIT_FAILED: &str = "Não foi possível concluir a compra. Tente novamente.";

/// Validate the submitted fields and build the purchase request.
///
/// # Errors
///
/// Returns every failing field at once so the form can show all inline
/// errors in a single round trip.
pub fn validate(form: &PurchaseForm, product_id: i64) -> Result<PurchaseRequest, FieldErrors> {
    let mut errors = FieldErrors::default();

    if form.name.chars().count() < 3 {
        errors.name = Some(MSG_NAME.to_string());
    }
    if !is_valid_email(&form.email) {
        errors.email = Some(MSG_EMAIL.to_string());
    }
    if form.phone_number.chars().count() < 10 {
        errors.phone_number = Some(MSG_PHONE.to_string());
    }
    let street_number = match form.street_number.trim().parse::<i64>() {
        Ok(n) if n >= 1 => n,
        _ => {
            errors.street_number = Some(MSG_STREET_NUMBER.to_string());
            0
        }
    };
    if form.street.chars().count() < 3 {
        errors.street = Some(MSG_STREET.to_string());
    }
    if form.district.chars().count() < 3 {
        errors.district = Some(MSG_DISTRICT.to_string());
    }
    if form.city.chars().count() < 2 {
        errors.city = Some(MSG_CITY.to_string());
    }
    if form.state.chars().count() < 2 {
        errors.state = Some(MSG_STATE.to_string());
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(PurchaseRequest {
        name: form.name.clone(),
        email: form.email.clone(),
        phone_number: form.phone_number.clone(),
        street_number,
        street: form.street.clone(),
        district: form.district.clone(),
        city: form.city.clone(),
        state: form.state.clone(),
        product_id,
    })
}

/// Basic email validation.
fn is_valid_email(email: &str) -> bool {
    // Simple validation: contains @, has content before and after @
    let mut parts = email.splitn(2, '@');
    let Some(local) = parts.next() else {
        return false;
    };
    let Some(domain) = parts.next() else {
        return false;
    };
    !local.is_empty() && !domain.is_empty() && domain.contains('.')
}

/// Submit a purchase.
///
/// POST /buy/{product_id}
///
/// Invalid fields re-render the form fragment with inline errors (422).
/// A valid submission calls the commerce API exactly once; success
/// navigates to `/thank-you` (HX-Redirect under HTMX, 303 otherwise),
/// and an upstream failure re-renders the form with a retryable error.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    headers: HeaderMap,
    Form(form): Form<PurchaseForm>,
) -> Response {
    let request = match validate(&form, product_id) {
        Ok(request) => request,
        Err(errors) => {
            let fragment = PurchaseFormTemplate {
                form: PurchaseFormView {
                    product_id,
                    values: form,
                    errors,
                    submit_error: None,
                },
            };
            return (StatusCode::UNPROCESSABLE_ENTITY, fragment).into_response();
        }
    };

    match state.commerce().submit_purchase(&request).await {
        Ok(()) => {
            tracing::info!(product_id, "purchase submitted");
            if headers.contains_key("HX-Request") {
                // HTMX ignores the Location of a plain redirect; HX-Redirect
                // triggers a full-page navigation instead
                (StatusCode::OK, [("HX-Redirect", "/thank-you")]).into_response()
            } else {
                Redirect::to("/thank-you").into_response()
            }
        }
        Err(e) => {
            tracing::error!(product_id, error = %e, "purchase submission failed");
            sentry::capture_error(&e);
            let fragment = PurchaseFormTemplate {
                form: PurchaseFormView {
                    product_id,
                    values: form,
                    errors: FieldErrors::default(),
                    submit_error: Some(MSG_SUBMIT_FAILED.to_string()),
                },
            };
            (StatusCode::BAD_GATEWAY, fragment).into_response()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_form() -> PurchaseForm {
        // Every field at its minimum valid length
        PurchaseForm {
            name: "Ana".to_string(),
            email: "a@b.co".to_string(),
            phone_number: "1198765432".to_string(),
            street_number: "1".to_string(),
            street: "Rua".to_string(),
            district: "Sul".to_string(),
            city: "SP".to_string(),
            state: "SP".to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_minimum_valid_fields() {
        let request = validate(&valid_form(), 7).unwrap();
        assert_eq!(request.name, "Ana");
        assert_eq!(request.street_number, 1);
        assert_eq!(request.product_id, 7);
    }

    #[test]
    fn test_validate_rejects_short_name() {
        let form = PurchaseForm {
            name: "Jo".to_string(),
            ..valid_form()
        };
        let errors = validate(&form, 1).unwrap_err();
        assert_eq!(errors.name.as_deref(), Some(MSG_NAME));
        assert!(errors.email.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_email() {
        for email in ["", "a", "a@", "@b.co", "a@b"] {
            let form = PurchaseForm {
                email: email.to_string(),
                ..valid_form()
            };
            let errors = validate(&form, 1).unwrap_err();
            assert_eq!(errors.email.as_deref(), Some(MSG_EMAIL), "email: {email}");
        }
    }

    #[test]
    fn test_validate_rejects_short_phone() {
        let form = PurchaseForm {
            phone_number: "119876543".to_string(),
            ..valid_form()
        };
        let errors = validate(&form, 1).unwrap_err();
        assert_eq!(errors.phone_number.as_deref(), Some(MSG_PHONE));
    }

    #[test]
    fn test_validate_phone_counts_characters_not_digits() {
        // Any 10+ characters pass; digit content is not separately enforced
        let form = PurchaseForm {
            phone_number: "(11) 98765".to_string(),
            ..valid_form()
        };
        assert!(validate(&form, 1).is_ok());
    }

    #[test]
    fn test_validate_street_number_coercion() {
        for bad in ["", "0", "-3", "abc"] {
            let form = PurchaseForm {
                street_number: bad.to_string(),
                ..valid_form()
            };
            let errors = validate(&form, 1).unwrap_err();
            assert_eq!(
                errors.street_number.as_deref(),
                Some(MSG_STREET_NUMBER),
                "street_number: {bad}"
            );
        }

        let form = PurchaseForm {
            street_number: " 42 ".to_string(),
            ..valid_form()
        };
        assert_eq!(validate(&form, 1).unwrap().street_number, 42);
    }

    #[test]
    fn test_validate_collects_all_errors_at_once() {
        let errors = validate(&PurchaseForm::default(), 1).unwrap_err();
        assert!(errors.name.is_some());
        assert!(errors.email.is_some());
        assert!(errors.phone_number.is_some());
        assert!(errors.street_number.is_some());
        assert!(errors.street.is_some());
        assert!(errors.district.is_some());
        assert!(errors.city.is_some());
        assert!(errors.state.is_some());
    }

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("test@example.com"));
        assert!(is_valid_email("user.name@domain.co.uk"));
        assert!(is_valid_email("a@b.c"));

        assert!(!is_valid_email(""));
        assert!(!is_valid_email("@"));
        assert!(!is_valid_email("test@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("test@domain")); // no TLD
        assert!(!is_valid_email("test"));
    }

    #[test]
    fn test_form_fragment_renders_inline_errors() {
        let errors = validate(&PurchaseForm::default(), 3).unwrap_err();
        let fragment = PurchaseFormTemplate {
            form: PurchaseFormView {
                product_id: 3,
                values: PurchaseForm::default(),
                errors,
                submit_error: None,
            },
        };
        let html = fragment.render().unwrap();
        assert!(html.contains("/buy/3"));
        assert!(html.contains(MSG_NAME));
        assert!(html.contains(MSG_EMAIL));
    }
}
