//! A module-level annotation accepts a hand-written code table and wires the
//! generated impl to it instead of deriving codes.

use error_code::{error_code, ErrorCode};

#[error_code]
mod billing {
    #[derive(Debug, PartialEq)]
    pub enum BillingError {
        Overdue,
        Suspended,
    }

    pub struct BillingErrorOpaqueCode;

    impl BillingErrorOpaqueCode {
        pub const OVERDUE: &'static str = "AAAA";
        pub const SUSPENDED: &'static str = "BBBB";
    }
}

use billing::BillingError;

fn main() {
    assert_eq!(BillingError::Overdue.opaque_code(), "AAAA");
    assert_eq!(
        BillingError::from_opaque_code("BBBB").unwrap(),
        BillingError::Suspended
    );
}
