//! Simulation systems: per-tick logic over agent components and shop
//! resources.

pub mod customers;
pub mod staff;

pub use customers::{update_customers, CustomerContext, DaySpawner, PurchaseEvent};
pub use staff::{choose_restock_plan, update_staff, RestockReport, StaffContext};
