//! Status adjacency per booking kind and acting side.
//!
//! A move not listed here is a conflict, whatever the caller's role.

use std::fmt::Display;

use super::WorkflowError;
use crate::models::enums::{AppointmentStatus, LabBookingStatus, MedicineBookingStatus};

type Move<S> = (S, S);

/// Doctor decisions on a pending appointment.
pub const APPOINTMENT_DOCTOR_MOVES: &[Move<AppointmentStatus>] = &[
    (AppointmentStatus::Pending, AppointmentStatus::Accepted),
    (AppointmentStatus::Pending, AppointmentStatus::Rejected),
];

/// Moves a hospital or its lab staff make through `update_status`.
pub const LAB_STATUS_MOVES: &[Move<LabBookingStatus>] = &[
    (LabBookingStatus::Pending, LabBookingStatus::Confirmed),
    (LabBookingStatus::Confirmed, LabBookingStatus::Collected),
];

/// The move into `completed`, only through a report upload.
pub const LAB_COMPLETION_MOVES: &[Move<LabBookingStatus>] = &[
    (LabBookingStatus::Collected, LabBookingStatus::Completed),
];

pub const MEDICINE_SHOP_MOVES: &[Move<MedicineBookingStatus>] = &[
    (MedicineBookingStatus::Pending, MedicineBookingStatus::Accepted),
    (MedicineBookingStatus::Pending, MedicineBookingStatus::Rejected),
    (MedicineBookingStatus::Confirmed, MedicineBookingStatus::OutForDelivery),
    (MedicineBookingStatus::OutForDelivery, MedicineBookingStatus::Delivered),
];

pub const MEDICINE_PATIENT_MOVES: &[Move<MedicineBookingStatus>] = &[
    (MedicineBookingStatus::Accepted, MedicineBookingStatus::Confirmed),
    (MedicineBookingStatus::Accepted, MedicineBookingStatus::Rejected),
];

pub fn is_allowed<S: PartialEq + Copy>(moves: &[Move<S>], from: S, to: S) -> bool {
    moves.iter().any(|&(a, b)| a == from && b == to)
}

/// `Ok` when `from -> to` is in `moves`, otherwise a `Conflict` naming both states.
pub fn check<S>(entity: &str, moves: &[Move<S>], from: S, to: S) -> Result<(), WorkflowError>
where
    S: PartialEq + Copy + Display,
{
    if is_allowed(moves, from, to) {
        Ok(())
    } else {
        Err(WorkflowError::Conflict(format!(
            "Cannot move {entity} from {from} to {to}"
        )))
    }
}

/// Statuses with no outgoing move for anyone.
pub fn is_terminal_medicine(status: MedicineBookingStatus) -> bool {
    !MEDICINE_SHOP_MOVES
        .iter()
        .chain(MEDICINE_PATIENT_MOVES)
        .any(|&(from, _)| from == status)
}
