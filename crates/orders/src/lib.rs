//! Orders domain module (customer laundry orders).
//!
//! Only the parts the inventory workflows touch are modelled: placing an
//! order, assigning it to an employee and looking it up.

pub mod order;

pub use order::{NewServiceOrder, OrderId, OrderStatus, ServiceOrder};
