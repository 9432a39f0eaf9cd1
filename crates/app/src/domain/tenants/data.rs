//! Tenant Data

use crate::domain::tenants::records::TenantUuid;

/// Tenant registration, issued by operators.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTenant {
    pub uuid: TenantUuid,
    pub name: String,
}
