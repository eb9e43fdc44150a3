//! Typed builders for the Wallet API payloads. Field names follow the
//! `walletobjects` wire format, hence the camelCase throughout.

use serde::Serialize;
use uuid::Uuid;

use receiptly_core::domain::pass::GroceryPassRequest;

pub const CLASS_SUFFIX: &str = "grocery_list";
const CLASS_BACKGROUND: &str = "#4285f4";
const OBJECT_BACKGROUND: &str = "#fbbc04";
const CLASS_LOGO_URI: &str =
    "https://storage.googleapis.com/wallet-lab-tools-codelab-artifacts-public/pass_google_logo.jpg";

#[derive(Debug, Serialize)]
pub struct LocalizedString {
    #[serde(rename = "defaultValue")]
    pub default_value: TranslatedString,
}

#[derive(Debug, Serialize)]
pub struct TranslatedString {
    pub language: &'static str,
    pub value: String,
}

impl LocalizedString {
    fn en(value: impl Into<String>) -> Self {
        Self { default_value: TranslatedString { language: "en", value: value.into() } }
    }
}

#[derive(Debug, Serialize)]
pub struct GenericClass {
    pub id: String,
    #[serde(rename = "cardTitle")]
    pub card_title: LocalizedString,
    pub header: LocalizedString,
    #[serde(rename = "hexBackgroundColor")]
    pub hex_background_color: &'static str,
    pub logo: Image,
}

#[derive(Debug, Serialize)]
pub struct Image {
    #[serde(rename = "sourceUri")]
    pub source_uri: ImageUri,
}

#[derive(Debug, Serialize)]
pub struct ImageUri {
    pub uri: &'static str,
}

#[derive(Debug, Serialize)]
pub struct GenericObject {
    pub id: String,
    #[serde(rename = "classId")]
    pub class_id: String,
    #[serde(rename = "genericType")]
    pub generic_type: &'static str,
    #[serde(rename = "hexBackgroundColor")]
    pub hex_background_color: &'static str,
    #[serde(rename = "cardTitle")]
    pub card_title: LocalizedString,
    pub header: LocalizedString,
    pub barcode: Barcode,
    #[serde(rename = "textModulesData")]
    pub text_modules_data: Vec<TextModule>,
}

#[derive(Debug, Serialize)]
pub struct Barcode {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct TextModule {
    pub id: String,
    pub header: String,
    pub body: String,
}

/// Claims of the save-to-wallet token the frontend exchanges at
/// `pay.google.com`.
#[derive(Debug, Serialize)]
pub struct SaveToWalletClaims {
    pub iss: String,
    pub aud: &'static str,
    pub typ: &'static str,
    pub origins: Vec<String>,
    pub payload: SavePayload,
}

#[derive(Debug, Serialize)]
pub struct SavePayload {
    #[serde(rename = "genericObjects")]
    pub generic_objects: Vec<GenericObject>,
}

pub fn class_id(issuer_id: &str) -> String {
    format!("{issuer_id}.{CLASS_SUFFIX}")
}

pub fn grocery_class(issuer_id: &str) -> GenericClass {
    GenericClass {
        id: class_id(issuer_id),
        card_title: LocalizedString::en("Grocery List"),
        header: LocalizedString::en("Your Items"),
        hex_background_color: CLASS_BACKGROUND,
        logo: Image { source_uri: ImageUri { uri: CLASS_LOGO_URI } },
    }
}

/// Object ids must stay within the Wallet id alphabet and be unique per
/// request, so the email is sanitized and a uuid suffix is appended.
pub fn object_id(issuer_id: &str, email: &str) -> String {
    let sanitized: String = email
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{issuer_id}.{sanitized}-{}", Uuid::new_v4().simple())
}

pub fn grocery_object(issuer_id: &str, email: &str, request: &GroceryPassRequest) -> GenericObject {
    let id = object_id(issuer_id, email);
    let text_modules_data = request
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| TextModule {
            id: format!("item_{index}"),
            header: item.name.clone(),
            body: format!("Quantity: {}", item.quantity.unwrap_or(1)),
        })
        .collect();

    GenericObject {
        barcode: Barcode { kind: "QR_CODE", value: id.clone() },
        id,
        class_id: class_id(issuer_id),
        generic_type: "GENERIC_TYPE_UNSPECIFIED",
        hex_background_color: OBJECT_BACKGROUND,
        card_title: LocalizedString::en("Your Grocery List"),
        header: LocalizedString::en(email),
        text_modules_data,
    }
}

pub fn save_claims(
    service_account_email: &str,
    origins: &[String],
    object: GenericObject,
) -> SaveToWalletClaims {
    SaveToWalletClaims {
        iss: service_account_email.to_string(),
        aud: "google",
        typ: "savetowallet",
        origins: origins.to_vec(),
        payload: SavePayload { generic_objects: vec![object] },
    }
}
