// Inventory (part) data models and DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::ApiError;
use crate::pagination::PageMeta;
use crate::validation::validate_not_blank;

/// Part database model
#[derive(Debug, Clone, FromRow)]
pub struct Part {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
}

impl Part {
    pub fn apply_changes(&mut self, changes: &UpdatePartRequest) {
        if let Some(name) = &changes.name {
            self.name = name.trim().to_string();
        }
        if let Some(description) = &changes.description {
            self.description = Some(description.clone());
        }
        if let Some(price) = changes.price {
            self.price = normalize_price(price);
        }
        if let Some(quantity) = changes.quantity {
            self.quantity = quantity;
        }
    }
}

/// Full part view for mechanics
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PartResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub quantity: i32,
}

impl From<Part> for PartResponse {
    fn from(part: Part) -> Self {
        Self {
            id: part.id,
            name: part.name,
            description: part.description,
            price: part.price,
            quantity: part.quantity,
        }
    }
}

/// Public part view, without pricing
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicPart {
    pub id: i32,
    pub name: String,
    pub quantity: i32,
}

impl From<Part> for PublicPart {
    fn from(part: Part) -> Self {
        Self {
            id: part.id,
            name: part.name,
            quantity: part.quantity,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePartRequest {
    #[validate(length(min = 1, max = 128, message = "Part name is required."), custom = "validate_not_blank")]
    pub name: String,
    #[validate(length(max = 256))]
    pub description: Option<String>,
    #[schema(value_type = f64)]
    pub price: Decimal,
    #[validate(range(min = 0, message = "Quantity cannot be negative."))]
    pub quantity: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdatePartRequest {
    #[validate(length(min = 1, max = 128), custom = "validate_not_blank")]
    pub name: Option<String>,
    #[validate(length(max = 256))]
    pub description: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<Decimal>,
    #[validate(range(min = 0, message = "Quantity cannot be negative."))]
    pub quantity: Option<i32>,
}


/// Prices are non-negative and fit the price column once rounded
pub fn ensure_price(price: Decimal) -> Result<(), ApiError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ApiError::BadRequest("Price cannot be negative.".to_string()));
    }
    // NUMERIC(10, 2) holds eight integer digits
    if normalize_price(price) >= Decimal::from(100_000_000) {
        return Err(ApiError::BadRequest(
            "Price must be less than 100000000.".to_string(),
        ));
    }
    Ok(())
}

/// Prices are stored with two decimal places
pub fn normalize_price(price: Decimal) -> Decimal {
    price.round_dp(2)
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicPartPage {
    #[serde(flatten)]
    pub meta: PageMeta,
    pub parts: Vec<PublicPart>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PartPage {
    #[serde(flatten)]
    pub meta: PageMeta,
    pub parts: Vec<PartResponse>,
}

/// `q` and `limit` for the search endpoints
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LowStockParams {
    pub threshold: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_part() -> Part {
        Part {
            id: 1,
            name: "Brake Pad".into(),
            description: None,
            price: dec!(49.99),
            quantity: 3,
        }
    }

    #[test]
    fn test_price_rules() {
        assert!(ensure_price(dec!(0)).is_ok());
        assert!(ensure_price(dec!(12.50)).is_ok());
        assert!(ensure_price(dec!(-0.01)).is_err());
        assert!(ensure_price(dec!(99999999.99)).is_ok());
        assert!(ensure_price(dec!(99999999.995)).is_err());
        assert!(ensure_price(dec!(1000000000)).is_err());
        assert_eq!(normalize_price(dec!(19.999)), dec!(20.00));
        assert_eq!(normalize_price(dec!(5.125)), dec!(5.12));
    }

    #[test]
    fn test_create_request_deserializes_float_price() {
        let request: CreatePartRequest =
            serde_json::from_str(r#"{"name": "Oil Filter", "price": 12.5}"#).unwrap();
        assert_eq!(request.price, dec!(12.5));
        assert_eq!(request.quantity, None);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let request: CreatePartRequest =
            serde_json::from_str(r#"{"name": "Oil Filter", "price": 12.5, "quantity": -1}"#)
                .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_missing_price_rejected() {
        assert!(serde_json::from_str::<CreatePartRequest>(r#"{"name": "Oil Filter"}"#).is_err());
    }

    #[test]
    fn test_apply_changes() {
        let mut part = sample_part();
        part.apply_changes(&UpdatePartRequest {
            price: Some(dec!(10.005)),
            quantity: Some(0),
            ..Default::default()
        });
        assert_eq!(part.price, dec!(10.00));
        assert_eq!(part.quantity, 0);
        assert_eq!(part.name, "Brake Pad");
    }

    #[test]
    fn test_public_view_hides_price() {
        let json = serde_json::to_value(PublicPart::from(sample_part())).unwrap();
        assert!(json.get("price").is_none());
        assert_eq!(json["quantity"], 3);
    }

    #[test]
    fn test_full_view_serializes_price_as_number() {
        let json = serde_json::to_value(PartResponse::from(sample_part())).unwrap();
        assert_eq!(json["price"], serde_json::json!(49.99));
    }
}
