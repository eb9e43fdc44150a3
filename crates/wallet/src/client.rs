use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{debug, info};

use receiptly_core::config::WalletConfig;
use receiptly_core::domain::pass::GroceryPassRequest;
use receiptly_gauth::{AuthError, ServiceAccountKey, TokenProvider};

use crate::pass;

const WALLET_API_BASE: &str = "https://walletobjects.googleapis.com/walletobjects/v1";
const WALLET_ISSUER_SCOPE: &str = "https://www.googleapis.com/auth/wallet_object.issuer";
const SAVE_URL_BASE: &str = "https://pay.google.com/gp/v/save";

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("wallet API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("wallet API returned status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("failed to sign save-to-wallet token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Issues save-to-wallet tokens for grocery passes. The pass class is
/// verified (and created if absent) before every object mint; the Wallet API
/// treats class creation as idempotent per id.
pub struct WalletClient {
    http: reqwest::Client,
    tokens: TokenProvider,
    key: ServiceAccountKey,
    issuer_id: String,
    origins: Vec<String>,
}

impl WalletClient {
    pub fn new(config: &WalletConfig, key: ServiceAccountKey) -> Result<Self, WalletError> {
        let http = reqwest::Client::builder().build().map_err(WalletError::Client)?;
        Ok(Self {
            http,
            tokens: TokenProvider::new(key.clone(), WALLET_ISSUER_SCOPE),
            key,
            issuer_id: config.issuer_id.clone(),
            origins: config.origins.clone(),
        })
    }

    /// Builds, signs, and wraps a pass for one grocery list. Returns the save
    /// URL the frontend presents as its "Add to Google Wallet" button.
    pub async fn create_pass_token(
        &self,
        email: &str,
        request: &GroceryPassRequest,
    ) -> Result<String, WalletError> {
        self.ensure_pass_class().await?;

        let object = pass::grocery_object(&self.issuer_id, email, request);
        info!(object_id = %object.id, item_count = request.items.len(), "minting grocery pass");

        let token = self.sign_save_token(object)?;
        Ok(format!("{SAVE_URL_BASE}/{token}"))
    }

    async fn ensure_pass_class(&self) -> Result<(), WalletError> {
        let class_id = pass::class_id(&self.issuer_id);
        let token = self.tokens.token().await?;

        let response = self
            .http
            .get(format!("{WALLET_API_BASE}/genericClass/{class_id}"))
            .bearer_auth(&token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(%class_id, "pass class already exists");
            return Ok(());
        }
        if status.as_u16() != 404 {
            let body = response.text().await.unwrap_or_default();
            return Err(WalletError::Api { status: status.as_u16(), body });
        }

        let created = self
            .http
            .post(format!("{WALLET_API_BASE}/genericClass"))
            .bearer_auth(&token)
            .json(&pass::grocery_class(&self.issuer_id))
            .send()
            .await?;

        let status = created.status();
        if !status.is_success() {
            let body = created.text().await.unwrap_or_default();
            return Err(WalletError::Api { status: status.as_u16(), body });
        }

        info!(%class_id, "created pass class");
        Ok(())
    }

    fn sign_save_token(&self, object: pass::GenericObject) -> Result<String, WalletError> {
        let claims = pass::save_claims(&self.key.client_email, &self.origins, object);
        let encoding_key =
            EncodingKey::from_rsa_pem(self.key.private_key.expose_secret().as_bytes())?;
        Ok(jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)?)
    }
}

#[cfg(test)]
mod tests {
    use receiptly_core::config::WalletConfig;
    use receiptly_core::domain::pass::{GroceryPassRequest, PassItem};
    use receiptly_gauth::ServiceAccountKey;

    use crate::pass;

    use super::WalletClient;

    fn client() -> WalletClient {
        let pem = include_str!("../testdata/signing-key.pem");
        let key = ServiceAccountKey::from_json(
            &serde_json::json!({
                "client_email": "svc@project.iam.gserviceaccount.com",
                "private_key": pem
            })
            .to_string(),
        )
        .expect("test key");

        WalletClient::new(
            &WalletConfig {
                issuer_id: "3388000000012345".to_string(),
                credentials_path: "unused.json".into(),
                origins: vec!["http://localhost:3000".to_string()],
            },
            key,
        )
        .expect("should build")
    }

    #[test]
    fn save_token_is_rs256_signed() {
        let client = client();
        let object = pass::grocery_object(
            "3388000000012345",
            "shopper@example.com",
            &GroceryPassRequest {
                user_id: "shopper@example.com".to_string(),
                items: vec![PassItem { name: "Milk".to_string(), quantity: Some(2) }],
            },
        );

        let token = client.sign_save_token(object).expect("should sign");
        assert_eq!(token.split('.').count(), 3);

        let header = jsonwebtoken::decode_header(&token).expect("valid header");
        assert_eq!(header.alg, jsonwebtoken::Algorithm::RS256);
    }
}
