use reqwest::{StatusCode, Url};
use serde_json::Value;

use crate::{HttptionError, Result, transport::HttpResponse};

/// `code` reported for a rejected payment.
const INVALID_PAYMENT_CODE: i64 = 100008;
/// `code` reported when purchases need an emailed authorization first.
const NEED_EMAIL_AUTHORIZE_CODE: i64 = 100056;
const INVALID_PAYMENT_MESSAGE: &str = "Invalid payment";

/// Maps a response to the outcome of an attempt.
///
/// - 429 is `RateLimited`, the only retryable outcome.
/// - 400 is inspected further through its JSON body.
/// - Any other status outside 2xx is `RequestFailed` with the url and body.
pub fn classify_response(
    url: &Url,
    response: &HttpResponse,
) -> Result<()> {
    match response.status {
        StatusCode::TOO_MANY_REQUESTS => Err(HttptionError::RateLimited),
        StatusCode::BAD_REQUEST => Err(classify_bad_request(&response.body)),
        status if status.is_success() => Ok(()),
        status => Err(HttptionError::RequestFailed {
            url: url.to_string(),
            status: status.as_u16(),
            body: String::from_utf8_lossy(&response.body).into_owned(),
        }),
    }
}

/// Picks the error for a 400 response from its JSON body.
///
/// A missing or non-JSON body yields `BadRequest` without a body.
fn classify_bad_request(body: &[u8]) -> HttptionError {
    if body.iter().all(u8::is_ascii_whitespace) {
        return HttptionError::BadRequest {
            body: None,
        };
    }

    let data: Value = match serde_json::from_slice(body) {
        Ok(data) => data,
        Err(_) => {
            return HttptionError::BadRequest {
                body: None,
            };
        }
    };

    match error_code(&data) {
        Some(INVALID_PAYMENT_CODE) => return HttptionError::InvalidPayment,
        Some(NEED_EMAIL_AUTHORIZE_CODE) => return HttptionError::NeedEmailAuthorize,
        _ => {}
    }

    if data.get("message").and_then(Value::as_str) == Some(INVALID_PAYMENT_MESSAGE) {
        return HttptionError::InvalidPayment;
    }

    HttptionError::BadRequest {
        body: Some(String::from_utf8_lossy(body).into_owned()),
    }
}

/// `code` may be sent either as a number or as a numeric string.
fn error_code(data: &Value) -> Option<i64> {
    match data.get("code")? {
        Value::Number(code) => code.as_i64(),
        Value::String(code) => code.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{empty_response, json_response, text_response};

    fn url() -> Url {
        "http://localhost:4488/api/order".parse().unwrap()
    }

    #[test]
    fn test_success_range() {
        for code in [200, 201, 204, 226, 299] {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(classify_response(&url(), &text_response(status, "ok")), Ok(()));
        }
    }

    #[test]
    fn test_too_many_requests() {
        let result = classify_response(&url(), &text_response(StatusCode::TOO_MANY_REQUESTS, "slow down"));
        assert_eq!(result, Err(HttptionError::RateLimited));
    }

    #[test]
    fn test_bad_request_invalid_payment_code() {
        let result = classify_response(&url(), &json_response(StatusCode::BAD_REQUEST, r#"{"code":100008}"#));
        assert_eq!(result, Err(HttptionError::InvalidPayment));
    }

    #[test]
    fn test_bad_request_need_email_authorize_code() {
        let result = classify_response(&url(), &json_response(StatusCode::BAD_REQUEST, r#"{"code":100056}"#));
        assert_eq!(result, Err(HttptionError::NeedEmailAuthorize));
    }

    #[test]
    fn test_bad_request_string_code() {
        let result = classify_response(&url(), &json_response(StatusCode::BAD_REQUEST, r#"{"code":"100056"}"#));
        assert_eq!(result, Err(HttptionError::NeedEmailAuthorize));
    }

    #[test]
    fn test_bad_request_invalid_payment_message() {
        let result = classify_response(&url(), &json_response(StatusCode::BAD_REQUEST, r#"{"message":"Invalid payment"}"#));
        assert_eq!(result, Err(HttptionError::InvalidPayment));
    }

    #[test]
    fn test_bad_request_unrelated_json_keeps_body() {
        let body = r#"{"code":1,"message":"missing field"}"#;
        let result = classify_response(&url(), &json_response(StatusCode::BAD_REQUEST, body));
        assert_eq!(
            result,
            Err(HttptionError::BadRequest {
                body: Some(body.to_string())
            })
        );
    }

    #[test]
    fn test_bad_request_without_body() {
        let result = classify_response(&url(), &empty_response(StatusCode::BAD_REQUEST));
        assert_eq!(
            result,
            Err(HttptionError::BadRequest {
                body: None
            })
        );
    }

    #[test]
    fn test_bad_request_unparseable_body() {
        let result = classify_response(&url(), &text_response(StatusCode::BAD_REQUEST, "<html>bad</html>"));
        assert_eq!(
            result,
            Err(HttptionError::BadRequest {
                body: None
            })
        );
    }

    #[test]
    fn test_other_status_is_request_failed() {
        let result = classify_response(&url(), &text_response(StatusCode::SERVICE_UNAVAILABLE, "maintenance"));
        assert_eq!(
            result,
            Err(HttptionError::RequestFailed {
                url: "http://localhost:4488/api/order".to_string(),
                status: 503,
                body: "maintenance".to_string(),
            })
        );
    }

    #[test]
    fn test_redirect_status_is_request_failed() {
        let result = classify_response(&url(), &empty_response(StatusCode::FOUND));
        assert!(matches!(result, Err(HttptionError::RequestFailed { status: 302, .. })));
    }
}
