//! Base64 data URL encoding and decoding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::PhotoError;

pub fn to_data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedDataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

pub fn from_data_url(url: &str) -> Result<DecodedDataUrl, PhotoError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| PhotoError::DataUrl("missing data: prefix".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| PhotoError::DataUrl("missing payload separator".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| PhotoError::DataUrl("only base64 data URLs are supported".to_string()))?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| PhotoError::DataUrl(e.to_string()))?;
    Ok(DecodedDataUrl {
        mime: mime.to_string(),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip() {
        let url = to_data_url(b"\x89PNG\r\n", "image/png");
        let decoded = from_data_url(&url).unwrap();
        assert_eq!(decoded.mime, "image/png");
        assert_eq!(decoded.bytes, b"\x89PNG\r\n");
    }

    #[test]
    fn test_rejects_missing_prefix() {
        let err = from_data_url("image/png;base64,AAAA").unwrap_err();
        assert!(matches!(err, PhotoError::DataUrl(_)));
    }

    #[test]
    fn test_rejects_non_base64_encoding() {
        let err = from_data_url("data:image/png,rawpayload").unwrap_err();
        assert!(matches!(err, PhotoError::DataUrl(_)));
    }

    #[test]
    fn test_rejects_invalid_payload() {
        let err = from_data_url("data:image/png;base64,!!!").unwrap_err();
        assert!(matches!(err, PhotoError::DataUrl(_)));
    }
}
