//! Wire/domain types for the Employee-Directory API.

mod employee;

pub use employee::{Employee, EmployeeUpdate, NewEmployee};
