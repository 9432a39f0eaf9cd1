//! Caller Context
//!
//! Identity and roles of whoever is invoking a service operation. Resolved
//! once at the edge and threaded explicitly into product and order services.

use smallvec::SmallVec;

use crate::uuids::TypedUuid;

/// Account marker; identity issued by the external identity provider.
#[derive(Debug, Clone, Copy)]
pub struct Account;

/// Account UUID, shared by customers and suppliers.
pub type AccountUuid = TypedUuid<Account>;

/// Caller role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Customer,
    Supplier,
    Employee,
    Administrator,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Supplier => "supplier",
            Self::Employee => "employee",
            Self::Administrator => "administrator",
        }
    }
}

/// Roles plus optional identity of the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerContext {
    roles: SmallVec<[Role; 2]>,
    identity: Option<AccountUuid>,
}

impl CallerContext {
    #[must_use]
    pub fn new(roles: impl IntoIterator<Item = Role>, identity: Option<AccountUuid>) -> Self {
        let mut collected: SmallVec<[Role; 2]> = SmallVec::new();

        for role in roles {
            if !collected.contains(&role) {
                collected.push(role);
            }
        }

        Self {
            roles: collected,
            identity,
        }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn customer(identity: AccountUuid) -> Self {
        Self::new([Role::Customer], Some(identity))
    }

    #[must_use]
    pub fn supplier(identity: AccountUuid) -> Self {
        Self::new([Role::Supplier], Some(identity))
    }

    #[must_use]
    pub fn employee(identity: AccountUuid) -> Self {
        Self::new([Role::Employee], Some(identity))
    }

    #[must_use]
    pub fn administrator(identity: AccountUuid) -> Self {
        Self::new([Role::Administrator], Some(identity))
    }

    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Employees and administrators see and manage everything in the tenant.
    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.has_role(Role::Employee) || self.has_role(Role::Administrator)
    }

    /// The caller's identity when acting as a supplier.
    #[must_use]
    pub fn supplier_identity(&self) -> Option<AccountUuid> {
        self.identity.filter(|_| self.has_role(Role::Supplier))
    }

    #[must_use]
    pub const fn account(&self) -> Option<AccountUuid> {
        self.identity
    }

    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}
