//! Static page route handlers.

use askama::Template;
use askama_web::WebTemplate;

use crate::filters;

/// Purchase confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "thank_you.html")]
pub struct ThankYouTemplate;

/// Display the purchase confirmation page.
///
/// GET /thank-you
///
/// Static copy, no data dependency.
pub async fn thank_you() -> ThankYouTemplate {
    ThankYouTemplate
}
