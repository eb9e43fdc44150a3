use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::Engine as _;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;

    async fn complete_with_image(&self, prompt: &str, image: &ImageAttachment) -> Result<String>;
}

/// An inline image ready for a multimodal model call: the mime type and the
/// still-encoded base64 payload from the submitted data URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub data: String,
}

impl ImageAttachment {
    /// Parses a `data:image/...;base64,...` URI. The payload stays encoded
    /// (the model endpoint wants base64) but is validated here so a garbage
    /// upload fails before any model call.
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let rest = uri.strip_prefix("data:").context("image payload must be a data URI")?;
        let (header, data) =
            rest.split_once(',').context("data URI is missing its payload separator")?;
        let Some(mime_type) = header.strip_suffix(";base64") else {
            bail!("only base64-encoded data URIs are supported");
        };
        if mime_type.is_empty() {
            bail!("data URI is missing a mime type");
        }

        base64::engine::general_purpose::STANDARD
            .decode(data)
            .context("image payload is not valid base64")?;

        Ok(Self { mime_type: mime_type.to_string(), data: data.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::ImageAttachment;

    #[test]
    fn parses_a_well_formed_data_uri() {
        let attachment = ImageAttachment::from_data_uri("data:image/png;base64,aGVsbG8=")
            .expect("should parse");

        assert_eq!(attachment.mime_type, "image/png");
        assert_eq!(attachment.data, "aGVsbG8=");
    }

    #[test]
    fn rejects_non_data_uris() {
        assert!(ImageAttachment::from_data_uri("https://example.com/receipt.png").is_err());
    }

    #[test]
    fn rejects_unencoded_payloads() {
        assert!(ImageAttachment::from_data_uri("data:image/png,rawbytes").is_err());
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(ImageAttachment::from_data_uri("data:image/png;base64,@@not-base64@@").is_err());
    }
}
