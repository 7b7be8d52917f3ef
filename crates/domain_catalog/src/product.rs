//! Product aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{Actor, AuditEnvelope, Auditable, Deletion, ProductId, SoftDeletable, UserId};

use crate::error::CatalogError;

/// Prices are stored with two fractional digits
const PRICE_SCALE: u32 = 2;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewProduct {
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(max = 32))]
    pub uom: Option<String>,
    pub price: Decimal,
    #[validate(length(max = 32))]
    pub tax_code: Option<String>,
    #[validate(length(max = 128))]
    pub external_ref: Option<String>,
    pub owner: Option<UserId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProductUpdate {
    #[validate(length(min = 1, max = 64))]
    pub sku: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 32))]
    pub uom: Option<String>,
    pub price: Option<Decimal>,
    #[validate(length(max = 32))]
    pub tax_code: Option<String>,
    #[validate(length(max = 128))]
    pub external_ref: Option<String>,
    pub is_active: Option<bool>,
    pub owner: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub external_ref: Option<String>,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub uom: Option<String>,
    pub price: Decimal,
    pub tax_code: Option<String>,
    pub is_active: bool,
    pub audit: AuditEnvelope,
    pub deletion: Deletion,
}

fn normalize_sku(sku: &str) -> Result<String, CatalogError> {
    let sku = sku.trim();
    if sku.is_empty() {
        return Err(CatalogError::invalid("sku must not be blank"));
    }
    Ok(sku.to_string())
}

fn check_price(price: Decimal) -> Result<Decimal, CatalogError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(CatalogError::invalid("price must be zero or greater"));
    }
    if price.normalize().scale() > PRICE_SCALE {
        return Err(CatalogError::invalid("price supports at most 2 decimal places"));
    }
    Ok(price)
}

impl Product {
    pub fn create(actor: &Actor, input: NewProduct) -> Result<Self, CatalogError> {
        input.validate()?;
        Ok(Self {
            id: ProductId::new_v7(),
            external_ref: input.external_ref,
            sku: normalize_sku(&input.sku)?,
            name: input.name,
            description: input.description,
            uom: input.uom,
            price: check_price(input.price)?,
            tax_code: input.tax_code,
            is_active: true,
            audit: AuditEnvelope::new(actor, input.owner),
            deletion: Deletion::default(),
        })
    }

    pub fn apply_update(
        &mut self,
        actor: &Actor,
        update: ProductUpdate,
    ) -> Result<(), CatalogError> {
        self.ensure_not_deleted()?;
        update.validate()?;

        // Validate everything before touching the aggregate
        let sku = update.sku.as_deref().map(normalize_sku).transpose()?;
        let price = update.price.map(check_price).transpose()?;

        if let Some(sku) = sku {
            self.sku = sku;
        }
        if let Some(price) = price {
            self.price = price;
        }
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(uom) = update.uom {
            self.uom = Some(uom);
        }
        if let Some(tax_code) = update.tax_code {
            self.tax_code = Some(tax_code);
        }
        if let Some(external_ref) = update.external_ref {
            self.external_ref = Some(external_ref);
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

impl Auditable for Product {
    fn audit(&self) -> &AuditEnvelope {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditEnvelope {
        &mut self.audit
    }
}

impl SoftDeletable for Product {
    const ENTITY: &'static str = "product";

    fn deletion(&self) -> &Deletion {
        &self.deletion
    }

    fn deletion_mut(&mut self) -> &mut Deletion {
        &mut self.deletion
    }
}
