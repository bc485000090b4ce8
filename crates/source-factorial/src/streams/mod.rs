//! Concrete Factorial streams
//!
//! | stream      | primary key   | cursor       |
//! |-------------|---------------|--------------|
//! | `customers` | `customer_id` | -            |
//! | `employees` | `employee_id` | `start_date` |
//! | `fac`       | -             | -            |

pub mod customers;
pub mod employees;
pub mod fac;

pub use customers::Customers;
pub use employees::Employees;
pub use fac::Fac;

/// Stream names in catalog order
pub const STREAM_NAMES: [&str; 3] = [Customers::NAME, Employees::NAME, Fac::NAME];
