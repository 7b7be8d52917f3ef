//! Request and response bodies
//!
//! Customer and product bodies are the domain input types themselves
//! (`NewCustomer`, `ProductUpdate`, ...); they already carry `validator`
//! rules. Orders, invoices and payments get dedicated request types here.

pub mod billing;
pub mod sales;

use serde::Deserialize;
use uuid::Uuid;

use core_kernel::{CustomerId, ListQuery};

/// Query string accepted by every list endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    #[serde(default)]
    pub include_deleted: bool,
    /// Restricts order, invoice and payment lists to one customer
    pub customer_id: Option<Uuid>,
}

impl ListParams {
    pub fn query(&self) -> ListQuery {
        ListQuery::new(self.limit, self.offset, self.include_deleted)
    }

    pub fn customer(&self) -> Option<CustomerId> {
        self.customer_id.map(CustomerId::from)
    }
}

/// Query string accepted by `DELETE` endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub hard_delete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_clamp() {
        let params = ListParams {
            limit: Some(10_000),
            ..Default::default()
        };
        let query = params.query();
        assert_eq!(query.limit, ListQuery::MAX_LIMIT);
        assert_eq!(query.offset, 0);
        assert!(!query.include_deleted);
    }
}
