//! Customer Data

use crate::domain::caller::AccountUuid;

/// Customer profile upsert payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomerProfile {
    pub account_uuid: AccountUuid,
    pub default_shipping_address: Option<String>,
}
