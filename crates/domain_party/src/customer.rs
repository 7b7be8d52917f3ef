//! Customer aggregate
//!
//! A customer is the party that orders, is invoiced and pays. Besides contact
//! and address data it carries the default currency new documents inherit.

use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{
    Actor, AuditEnvelope, Auditable, Currency, CustomerId, Deletion, SoftDeletable, UserId,
};

use crate::error::PartyError;

/// Input for registering a customer
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewCustomer {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 128))]
    pub external_ref: Option<String>,
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    pub billing_address: Option<String>,
    pub shipping_address: Option<String>,
    pub currency: Option<Currency>,
    pub owner: Option<UserId>,
}

/// Partial update; `None` leaves the field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CustomerUpdate {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 128))]
    pub external_ref: Option<String>,
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    pub billing_address: Option<String>,
    pub shipping_address: Option<String>,
    pub currency: Option<Currency>,
    pub is_active: Option<bool>,
    /// Transfers ownership when set
    pub owner: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub external_ref: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub billing_address: Option<String>,
    pub shipping_address: Option<String>,
    pub currency: Currency,
    pub is_active: bool,
    pub audit: AuditEnvelope,
    pub deletion: Deletion,
}

impl Customer {
    /// Validates the input and stamps the new customer for `actor`
    pub fn create(actor: &Actor, input: NewCustomer) -> Result<Self, PartyError> {
        input.validate()?;
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(PartyError::invalid("name must not be blank"));
        }

        Ok(Self {
            id: CustomerId::new_v7(),
            external_ref: input.external_ref,
            name,
            email: input.email,
            phone: input.phone,
            billing_address: input.billing_address,
            shipping_address: input.shipping_address,
            currency: input.currency.unwrap_or_default(),
            is_active: true,
            audit: AuditEnvelope::new(actor, input.owner),
            deletion: Deletion::default(),
        })
    }

    /// Applies a partial update and stamps the modification
    ///
    /// Deleted customers cannot be updated.
    pub fn apply_update(
        &mut self,
        actor: &Actor,
        update: CustomerUpdate,
    ) -> Result<(), PartyError> {
        self.ensure_not_deleted()?;
        update.validate()?;

        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(PartyError::invalid("name must not be blank"));
            }
            self.name = name;
        }
        if let Some(external_ref) = update.external_ref {
            self.external_ref = Some(external_ref);
        }
        if let Some(email) = update.email {
            self.email = Some(email);
        }
        if let Some(phone) = update.phone {
            self.phone = Some(phone);
        }
        if let Some(address) = update.billing_address {
            self.billing_address = Some(address);
        }
        if let Some(address) = update.shipping_address {
            self.shipping_address = Some(address);
        }
        if let Some(currency) = update.currency {
            self.currency = currency;
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }

        match update.owner {
            Some(owner) if owner != self.audit.owner => self.transfer_ownership(actor, owner),
            _ => self.stamp_update(actor),
        }
        Ok(())
    }
}

impl Auditable for Customer {
    fn audit(&self) -> &AuditEnvelope {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditEnvelope {
        &mut self.audit
    }
}

impl SoftDeletable for Customer {
    const ENTITY: &'static str = "customer";

    fn deletion(&self) -> &Deletion {
        &self.deletion
    }

    fn deletion_mut(&mut self) -> &mut Deletion {
        &mut self.deletion
    }
}
