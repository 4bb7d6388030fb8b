//! Wire types for the commerce API.
//!
//! Field names follow the API's JSON exactly (`HTTPStatus`,
//! `userIdentified`, `userToken`); Rust-side names are snake_case.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Response envelope wrapping every commerce API payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(rename = "HTTPStatus")]
    pub http_status: u16,
    pub executed: bool,
    #[serde(rename = "userIdentified", default)]
    pub user_identified: bool,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "userToken", default)]
    pub user_token: Option<String>,
    pub object: T,
}

/// One checkout entry: video metadata plus its product list.
///
/// A fetch returns an ordered sequence of these; the first entry's video
/// fields are canonical and every entry's products are shown.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutPayload {
    pub checkout_id: i64,
    pub identifier: String,
    #[serde(default)]
    pub video_headline: String,
    #[serde(default)]
    pub video_sub_headline: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub products: Vec<ProductListing>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// A purchasable product inside a checkout entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductListing {
    pub product_id: i64,
    pub name: String,
    pub price: Decimal,
    /// Amount subtracted from `price`; zero means no discount.
    #[serde(default)]
    pub discount: Decimal,
    /// Free-text shipping note shown on the card.
    #[serde(default)]
    pub freight: String,
    #[serde(default)]
    pub image_url: String,
    /// Marks the "recommended" badge.
    #[serde(default)]
    pub best_choice: bool,
}

/// Buyer and shipping details posted to `/buy/{product_id}`.
///
/// Built fresh from a validated form submission, sent once, discarded.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseRequest {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub street_number: i64,
    pub street: String,
    pub district: String,
    pub city: String,
    pub state: String,
    pub product_id: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_envelope_deserializes_wire_format() {
        let body = serde_json::json!({
            "HTTPStatus": 200,
            "executed": true,
            "userIdentified": true,
            "message": "Sucesso",
            "userToken": "95BD9233-8FDC-48AD-B4C5-E5BAF7578C15",
            "object": [{
                "checkout_id": 1,
                "identifier": "95BD9233-8FDC-48AD-B4C5-E5BAF7578C15",
                "video_headline": "Headline",
                "video_sub_headline": "Sub",
                "video_url": "https://youtu.be/abc123",
                "products": [{
                    "product_id": 10,
                    "name": "Produto",
                    "price": 100.5,
                    "discount": 20,
                    "freight": "Frete grátis",
                    "image_url": "https://inapak.com/p.png",
                    "best_choice": true
                }],
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-02T00:00:00Z"
            }]
        })
        .to_string();

        let envelope: ApiEnvelope<Vec<CheckoutPayload>> = serde_json::from_str(&body).unwrap();
        assert_eq!(envelope.http_status, 200);
        assert!(envelope.executed);
        assert_eq!(envelope.message, "Sucesso");
        assert_eq!(envelope.object.len(), 1);

        let entry = &envelope.object[0];
        assert_eq!(entry.checkout_id, 1);
        assert_eq!(entry.products.len(), 1);

        let product = &entry.products[0];
        assert_eq!(product.product_id, 10);
        assert_eq!(product.price, Decimal::new(1005, 1));
        assert_eq!(product.discount, Decimal::from(20));
        assert!(product.best_choice);
    }

    #[test]
    fn test_purchase_envelope_with_null_object() {
        let body = r#"{
            "HTTPStatus": 200,
            "executed": false,
            "userIdentified": true,
            "message": "Produto indisponível",
            "object": null
        }"#;

        let envelope: ApiEnvelope<serde_json::Value> = serde_json::from_str(body).unwrap();
        assert!(!envelope.executed);
        assert_eq!(envelope.message, "Produto indisponível");
        assert!(envelope.user_token.is_none());
        assert!(envelope.object.is_null());
    }

    #[test]
    fn test_checkout_payload_missing_optional_fields() {
        // Missing video/product fields must default, not fail the whole fetch
        let body = r#"{"checkout_id": 2, "identifier": "abc"}"#;
        let entry: CheckoutPayload = serde_json::from_str(body).unwrap();
        assert!(entry.video_url.is_empty());
        assert!(entry.products.is_empty());
    }

    #[test]
    fn test_purchase_request_serializes_all_fields() {
        let request = PurchaseRequest {
            name: "Maria Silva".to_string(),
            email: "maria@example.com".to_string(),
            phone_number: "11987654321".to_string(),
            street_number: 42,
            street: "Rua das Flores".to_string(),
            district: "Centro".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
            product_id: 7,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["name"], "Maria Silva");
        assert_eq!(value["street_number"], 42);
        assert_eq!(value["product_id"], 7);
    }
}
