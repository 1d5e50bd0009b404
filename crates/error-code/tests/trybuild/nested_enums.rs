//! Nested error-code enums expand, compose codes through the delimiter and
//! decode back to the original value.

use error_code::{error_code, ErrorCode};

#[error_code]
#[derive(Debug, PartialEq)]
enum GatewayError {
    Timeout,
    Refused,
}

#[error_code]
#[derive(Debug, PartialEq)]
enum PaymentError {
    Declined,
    Gateway(GatewayError),
}

fn main() {
    let original = PaymentError::Gateway(GatewayError::Timeout);
    let code = original.opaque_code();
    assert_eq!(code, "Q1od-NYHA");
    assert_eq!(PaymentError::from_opaque_code(&code).unwrap(), original);
    assert_eq!(PaymentError::Declined.opaque_code(), "G3uP");
}
