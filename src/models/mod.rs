pub mod actors;
pub mod appointment;
pub mod enums;
pub mod lab_booking;
pub mod lab_report;
pub mod medicine_booking;
pub mod notification;
pub mod prescription;

pub use actors::*;
pub use appointment::*;
pub use lab_booking::*;
pub use lab_report::*;
pub use medicine_booking::*;
pub use notification::*;
pub use prescription::*;
