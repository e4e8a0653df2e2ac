use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payments are not supported: {reason}")]
    Unsupported { reason: String },

    #[error("Invalid payment request: {0}")]
    InvalidRequest(String),

    #[error("Payment declined: {0}")]
    Declined(String),

    #[error("Invalid payment signature")]
    InvalidSignature,

    #[error("{gateway} is unreachable: {message}")]
    Unreachable {
        gateway: &'static str,
        message: String,
    },

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("{gateway} returned HTTP {status}: {message}")]
    Gateway {
        gateway: &'static str,
        status: u16,
        message: String,
    },

    #[error("unexpected {gateway} response: {message}")]
    Decode {
        gateway: &'static str,
        message: String,
    },
}

impl PaymentError {
    pub fn unsupported(reason: impl Into<String>) -> Self {
        PaymentError::Unsupported {
            reason: reason.into(),
        }
    }

    /// Transport failures (DNS, connect, timeout, broken body) mean the vendor
    /// could not be reached, never that the payment was refused.
    pub fn transport(gateway: &'static str, e: reqwest::Error) -> Self {
        PaymentError::Unreachable {
            gateway,
            message: e.to_string(),
        }
    }
}

/// Maps a non-2xx vendor response. `declined` is the adapter's reading of
/// the error body (card_declined, INSTRUMENT_DECLINED, ...).
pub fn classify_http_error(
    gateway: &'static str,
    status: u16,
    message: String,
    declined: bool,
) -> PaymentError {
    if declined || status == 402 {
        PaymentError::Declined(message)
    } else if status == 429 || status >= 500 {
        PaymentError::Unreachable {
            gateway,
            message: format!("HTTP {status}: {message}"),
        }
    } else {
        PaymentError::Gateway {
            gateway,
            status,
            message,
        }
    }
}

/// Sends a request and returns status and body text.
pub(crate) async fn send(
    gateway: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<(u16, String), PaymentError> {
    let response = request
        .send()
        .await
        .map_err(|e| PaymentError::transport(gateway, e))?;
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| PaymentError::transport(gateway, e))?;
    Ok((status, body))
}

pub(crate) fn decode<T: DeserializeOwned>(gateway: &'static str, body: &str) -> Result<T, PaymentError> {
    serde_json::from_str(body).map_err(|e| PaymentError::Decode {
        gateway,
        message: e.to_string(),
    })
}

pub(crate) fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(402, false, "declined")]
    #[case(400, true, "declined")]
    #[case(429, false, "unreachable")]
    #[case(500, false, "unreachable")]
    #[case(503, false, "unreachable")]
    #[case(400, false, "gateway")]
    #[case(401, false, "gateway")]
    fn test_classify_http_error(#[case] status: u16, #[case] declined: bool, #[case] expected: &str) {
        let err = classify_http_error("stripe", status, "boom".to_string(), declined);
        let kind = match err {
            PaymentError::Declined(_) => "declined",
            PaymentError::Unreachable { .. } => "unreachable",
            PaymentError::Gateway { .. } => "gateway",
            _ => "other",
        };
        assert_eq!(kind, expected);
    }

    #[test]
    fn test_decode_failure_is_typed() {
        let err = decode::<serde_json::Value>("paypal", "<html>").unwrap_err();
        assert!(matches!(err, PaymentError::Decode { gateway: "paypal", .. }));
    }
}
