//! Landing page route handler.
//!
//! Fetch-then-render: one checkout fetch per request, no caching, so
//! repeated identical fetches render identical output. A failed fetch
//! surfaces as an explicit error page via `AppError` rather than a bare
//! 500.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use rust_decimal::Decimal;
use tracing::instrument;
use url::Url;

use crate::commerce::types::{CheckoutPayload, ProductListing};
use crate::error::Result;
use crate::filters;
use crate::routes::buy::PurchaseFormView;
use crate::state::AppState;

/// Default copy when the checkout carries no headline.
const DEFAULT_HEADLINE: &str = "Título do Vídeo";
/// Default copy when the checkout carries no subheadline.
const DEFAULT_SUBHEADLINE: &str = "Subtítulo do Vídeo";

// =============================================================================
// Product and Form Views
// =============================================================================

/// Product display data for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub product_id: i64,
    pub name: String,
    /// Free-text shipping note.
    pub freight: String,
    /// "Melhor escolha!" badge.
    pub best_choice: bool,
    /// Present only when the image is hosted on the allowlisted host.
    pub image_url: Option<String>,
    /// Formatted original price (always shown; struck through when discounted).
    pub price: String,
    /// Formatted `price - discount`, present when the discount is positive.
    pub effective_price: Option<String>,
    /// Embedded purchase form state (untouched on initial render).
    pub form: PurchaseFormView,
}

impl ProductView {
    fn from_listing(listing: &ProductListing, image_host: &str) -> Self {
        let discounted = listing.discount > Decimal::ZERO;
        Self {
            product_id: listing.product_id,
            name: listing.name.clone(),
            freight: listing.freight.clone(),
            best_choice: listing.best_choice,
            image_url: allowed_image_url(&listing.image_url, image_host),
            price: format_brl(listing.price),
            effective_price: discounted.then(|| format_brl(listing.price - listing.discount)),
            form: PurchaseFormView::empty(listing.product_id),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub headline: String,
    pub subheadline: String,
    /// Embeddable video URL; `None` omits the video panel entirely.
    pub video_url: Option<String>,
    /// One card per product, flattened across all checkout entries.
    pub products: Vec<ProductView>,
}

// =============================================================================
// Derivations
// =============================================================================

/// Derive a playable embed URL from an arbitrary video URL.
///
/// YouTube URLs are rewritten to the canonical embed form, taking the video
/// id from the `v=` query parameter or the final path segment. Anything
/// else passes through unchanged; an empty URL yields `None` (no panel).
fn embed_video_url(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }

    let Ok(parsed) = Url::parse(raw) else {
        return Some(raw.to_string());
    };

    let host = parsed.host_str().unwrap_or_default();
    let is_youtube = host == "youtu.be" || host == "youtube.com" || host.ends_with(".youtube.com");
    if !is_youtube {
        return Some(raw.to_string());
    }

    let video_id = parsed
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .or_else(|| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .map(str::to_string)
        })
        .filter(|id| !id.is_empty());

    video_id.map_or_else(
        || Some(raw.to_string()),
        |id| Some(format!("https://www.youtube.com/embed/{id}")),
    )
}

/// Accept a product image URL only when it is hosted on the allowed host.
fn allowed_image_url(raw: &str, image_host: &str) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;
    (parsed.host_str() == Some(image_host)).then(|| raw.to_string())
}

/// Format a decimal amount as Brazilian currency, e.g. `R$ 1.234,56`.
///
/// A discount larger than the price yields a formatted negative amount
/// rather than a panic.
fn format_brl(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    format!("{sign}R$ {grouped},{frac_part}")
}

/// Flatten every checkout entry's product list into one card sequence,
/// preserving relative order.
fn build_product_views(entries: &[CheckoutPayload], image_host: &str) -> Vec<ProductView> {
    entries
        .iter()
        .flat_map(|entry| &entry.products)
        .map(|listing| ProductView::from_listing(listing, image_host))
        .collect()
}

// =============================================================================
// Handler
// =============================================================================

/// Display the landing page.
///
/// GET /
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<HomeTemplate> {
    let entries = state.commerce().fetch_checkout().await?;

    let first = entries.first();
    let headline = first
        .map(|entry| entry.video_headline.as_str())
        .filter(|text| !text.is_empty())
        .unwrap_or(DEFAULT_HEADLINE)
        .to_string();
    let subheadline = first
        .map(|entry| entry.video_sub_headline.as_str())
        .filter(|text| !text.is_empty())
        .unwrap_or(DEFAULT_SUBHEADLINE)
        .to_string();
    let video_url = first.and_then(|entry| embed_video_url(&entry.video_url));

    let products = build_product_views(&entries, &state.config().image_host);
    tracing::debug!(entries = entries.len(), products = products.len(), "rendering landing page");

    Ok(HomeTemplate {
        headline,
        subheadline,
        video_url,
        products,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn listing(product_id: i64, price: i64, discount: i64) -> ProductListing {
        ProductListing {
            product_id,
            name: format!("Produto {product_id}"),
            price: Decimal::from(price),
            discount: Decimal::from(discount),
            freight: "Frete grátis".to_string(),
            image_url: "https://inapak.com/p.png".to_string(),
            best_choice: false,
        }
    }

    fn entry(checkout_id: i64, products: Vec<ProductListing>) -> CheckoutPayload {
        CheckoutPayload {
            checkout_id,
            identifier: "abc".to_string(),
            video_headline: String::new(),
            video_sub_headline: String::new(),
            video_url: String::new(),
            products,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_embed_short_youtube_url() {
        assert_eq!(
            embed_video_url("https://youtu.be/abc123").as_deref(),
            Some("https://www.youtube.com/embed/abc123")
        );
    }

    #[test]
    fn test_embed_watch_url_with_query_param() {
        assert_eq!(
            embed_video_url("https://www.youtube.com/watch?v=abc123").as_deref(),
            Some("https://www.youtube.com/embed/abc123")
        );
    }

    #[test]
    fn test_embed_non_youtube_url_unchanged() {
        assert_eq!(
            embed_video_url("https://vimeo.com/123456").as_deref(),
            Some("https://vimeo.com/123456")
        );
    }

    #[test]
    fn test_embed_empty_url_omits_panel() {
        assert_eq!(embed_video_url(""), None);
    }

    #[test]
    fn test_embed_unparseable_url_unchanged() {
        assert_eq!(embed_video_url("not a url").as_deref(), Some("not a url"));
    }

    #[test]
    fn test_format_brl_plain() {
        assert_eq!(format_brl(Decimal::from(100)), "R$ 100,00");
        assert_eq!(format_brl(Decimal::new(8990, 2)), "R$ 89,90");
    }

    #[test]
    fn test_format_brl_thousands_grouping() {
        assert_eq!(format_brl(Decimal::new(123_456_789, 2)), "R$ 1.234.567,89");
        assert_eq!(format_brl(Decimal::from(1000)), "R$ 1.000,00");
    }

    #[test]
    fn test_format_brl_negative_amount() {
        // discount > price must render gracefully, never panic
        assert_eq!(format_brl(Decimal::from(-20)), "-R$ 20,00");
    }

    #[test]
    fn test_discounted_product_shows_both_prices() {
        let view = ProductView::from_listing(&listing(1, 100, 20), "inapak.com");
        assert_eq!(view.price, "R$ 100,00");
        assert_eq!(view.effective_price.as_deref(), Some("R$ 80,00"));
    }

    #[test]
    fn test_undiscounted_product_shows_single_price() {
        let view = ProductView::from_listing(&listing(1, 100, 0), "inapak.com");
        assert_eq!(view.price, "R$ 100,00");
        assert!(view.effective_price.is_none());
    }

    #[test]
    fn test_image_host_allowlist() {
        let mut product = listing(1, 100, 0);
        assert!(ProductView::from_listing(&product, "inapak.com").image_url.is_some());

        product.image_url = "https://elsewhere.test/p.png".to_string();
        assert!(ProductView::from_listing(&product, "inapak.com").image_url.is_none());

        product.image_url = String::new();
        assert!(ProductView::from_listing(&product, "inapak.com").image_url.is_none());
    }

    #[test]
    fn test_flatten_preserves_order_across_entries() {
        let entries = vec![
            entry(1, vec![listing(1, 10, 0), listing(2, 20, 0)]),
            entry(2, vec![listing(3, 30, 0)]),
        ];
        let views = build_product_views(&entries, "inapak.com");
        assert_eq!(views.len(), 3);
        let ids: Vec<i64> = views.iter().map(|v| v.product_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_home_template_defaults_and_video_panel() {
        let page = HomeTemplate {
            headline: DEFAULT_HEADLINE.to_string(),
            subheadline: DEFAULT_SUBHEADLINE.to_string(),
            video_url: None,
            products: build_product_views(&[entry(1, vec![listing(1, 100, 20)])], "inapak.com"),
        };
        let html = page.render().unwrap();
        assert!(html.contains(DEFAULT_HEADLINE));
        assert!(html.contains(DEFAULT_SUBHEADLINE));
        assert!(!html.contains("<iframe"));
        assert!(html.contains("R$ 100,00"));
        assert!(html.contains("R$ 80,00"));
    }
}
