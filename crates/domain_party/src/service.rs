//! Customer maintenance service

use std::sync::Arc;

use tracing::{info, instrument};

use core_kernel::{Actor, CustomerId, ListQuery, SoftDeletable};

use crate::customer::{Customer, CustomerUpdate, NewCustomer};
use crate::error::PartyError;
use crate::ports::CustomerPort;

/// Application service for customer master data
#[derive(Clone)]
pub struct CustomerService {
    customers: Arc<dyn CustomerPort>,
}

impl CustomerService {
    pub fn new(customers: Arc<dyn CustomerPort>) -> Self {
        Self { customers }
    }

    #[instrument(skip(self, input), fields(actor = %actor.user_id))]
    pub async fn create(&self, actor: &Actor, input: NewCustomer) -> Result<Customer, PartyError> {
        let customer = Customer::create(actor, input)?;
        self.customers.save_customer(&customer).await?;
        info!(customer_id = %customer.id, "customer created");
        Ok(customer)
    }

    pub async fn get(&self, id: CustomerId) -> Result<Customer, PartyError> {
        self.load(id).await
    }

    pub async fn list(&self, query: ListQuery) -> Result<Vec<Customer>, PartyError> {
        Ok(self.customers.list_customers(query).await?)
    }

    #[instrument(skip(self, update), fields(actor = %actor.user_id))]
    pub async fn update(
        &self,
        actor: &Actor,
        id: CustomerId,
        update: CustomerUpdate,
    ) -> Result<Customer, PartyError> {
        let mut customer = self.load(id).await?;
        customer.apply_update(actor, update)?;
        self.customers.save_customer(&customer).await?;
        Ok(customer)
    }

    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn soft_delete(&self, actor: &Actor, id: CustomerId) -> Result<Customer, PartyError> {
        let mut customer = self.load(id).await?;
        customer.soft_delete(actor)?;
        self.customers.save_customer(&customer).await?;
        info!(customer_id = %id, "customer soft-deleted");
        Ok(customer)
    }

    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn restore(&self, actor: &Actor, id: CustomerId) -> Result<Customer, PartyError> {
        let mut customer = self.load(id).await?;
        customer.restore(actor)?;
        self.customers.save_customer(&customer).await?;
        info!(customer_id = %id, "customer restored");
        Ok(customer)
    }

    #[instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn hard_delete(&self, actor: &Actor, id: CustomerId) -> Result<(), PartyError> {
        self.load(id).await?;
        self.customers.delete_customer(id).await?;
        info!(customer_id = %id, "customer permanently deleted");
        Ok(())
    }

    async fn load(&self, id: CustomerId) -> Result<Customer, PartyError> {
        self.customers.get_customer(id).await.map_err(|e| {
            if e.is_not_found() {
                PartyError::not_found(id)
            } else {
                PartyError::Port(e)
            }
        })
    }
}
