//! Product Catalog Domain
//!
//! Products are the sellable items order and invoice lines may reference.
//! Each product has a unique SKU and a list price. The order-to-cash flow
//! never mutates products; it only checks that referenced ids resolve
//! through [`ProductPort`].

pub mod error;
pub mod ports;
pub mod product;
pub mod service;

pub use error::CatalogError;
pub use ports::ProductPort;
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockProductPort;
pub use product::{NewProduct, Product, ProductUpdate};
pub use service::ProductService;
