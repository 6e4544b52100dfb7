use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::db::models::{Category, Product};

pub const CODE_OK: &str = "00";
pub const CODE_FAILURE: &str = "-1";

#[derive(Debug, Serialize)]
pub struct Metadata {
    pub status: String,
    pub code: String,
    pub message: String,
}

/// Uniform wrapper around every API result: status metadata plus one payload
/// slot, flattened into the body so the wire shape stays
/// `{ metadata: {...}, categoryResponse: {...} }` (or the product equivalent).
#[derive(Debug, Serialize)]
pub struct Envelope<P: Serialize> {
    pub metadata: Metadata,
    #[serde(flatten)]
    pub payload: P,
}

impl<P: Serialize + Default> Envelope<P> {
    pub fn ok(message: &str, payload: P) -> Self {
        Envelope {
            metadata: Metadata {
                status: "Ok".to_string(),
                code: CODE_OK.to_string(),
                message: message.to_string(),
            },
            payload,
        }
    }

    /// Failure envelope with the payload slot left empty.
    pub fn failure(message: &str) -> Self {
        Envelope {
            metadata: Metadata {
                status: "Bad response".to_string(),
                code: CODE_FAILURE.to_string(),
                message: message.to_string(),
            },
            payload: P::default(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct CategoryPayload {
    #[serde(rename = "categoryResponse")]
    pub category_response: CategoryList,
}

#[derive(Debug, Default, Serialize)]
pub struct CategoryList {
    pub category: Vec<Category>,
}

impl CategoryPayload {
    pub fn of(category: Vec<Category>) -> Self {
        CategoryPayload {
            category_response: CategoryList { category },
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct ProductPayload {
    #[serde(rename = "productResponse")]
    pub product_response: ProductList,
}

#[derive(Debug, Default, Serialize)]
pub struct ProductList {
    pub products: Vec<ProductView>,
}

impl ProductPayload {
    pub fn of(products: Vec<ProductView>) -> Self {
        ProductPayload {
            product_response: ProductList { products },
        }
    }
}

/// Wire form of a product. The picture is carried base64-encoded and only on
/// reads; create responses treat it as write-only and leave it out.
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub price: i32,
    pub quantity: i32,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ProductView {
    pub fn new(product: Product, category: Category, picture: Option<Vec<u8>>) -> Self {
        ProductView {
            id: product.id,
            name: product.name,
            price: product.price,
            quantity: product.quantity,
            category,
            picture: picture.map(|bytes| BASE64.encode(bytes)),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_category() -> Category {
        let ts = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        Category {
            id: 1,
            name: "Tools".to_string(),
            description: "Hardware".to_string(),
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn success_envelope_nests_category_payload() {
        let envelope = Envelope::ok("Category found", CategoryPayload::of(vec![sample_category()]));
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["metadata"]["code"], CODE_OK);
        assert_eq!(json["metadata"]["message"], "Category found");
        assert_eq!(json["categoryResponse"]["category"][0]["name"], "Tools");
    }

    #[test]
    fn failure_envelope_has_empty_payload_slot() {
        let envelope = Envelope::<ProductPayload>::failure("product not found");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["metadata"]["code"], CODE_FAILURE);
        assert!(json["productResponse"]["products"]
            .as_array()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn product_view_omits_picture_when_absent() {
        let category = sample_category();
        let product = Product {
            id: 9,
            name: "Hammer".to_string(),
            price: 500,
            quantity: 10,
            picture: vec![1, 2, 3],
            category_id: category.id,
            created_at: category.created_at,
            updated_at: category.updated_at,
        };
        let json = serde_json::to_value(ProductView::new(product, category, None)).unwrap();
        assert!(json.get("picture").is_none());
    }

    #[test]
    fn product_view_base64_encodes_picture() {
        let category = sample_category();
        let product = Product {
            id: 9,
            name: "Hammer".to_string(),
            price: 500,
            quantity: 10,
            picture: vec![],
            category_id: category.id,
            created_at: category.created_at,
            updated_at: category.updated_at,
        };
        let json =
            serde_json::to_value(ProductView::new(product, category, Some(vec![0xDE, 0xAD]))).unwrap();
        let encoded = json["picture"].as_str().unwrap();
        assert_eq!(BASE64.decode(encoded).unwrap(), vec![0xDE, 0xAD]);
    }
}
