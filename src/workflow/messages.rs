//! Notification texts.

use chrono::NaiveDateTime;

use crate::models::enums::{DeliveryResponse, LabBookingStatus, MedicineBookingStatus};

const DATE_FORMAT: &str = "%d %b %Y";
const TIME_FORMAT: &str = "%I:%M %p";

pub fn format_datetime(dt: &NaiveDateTime) -> String {
    format!("{}, {}", dt.format(DATE_FORMAT), dt.format(TIME_FORMAT))
}

pub fn appointment_requested(patient_id: i64) -> String {
    format!("New appointment request from Patient ID: {patient_id}")
}

pub fn appointment_accepted() -> String {
    "Your appointment has been accepted by the doctor".to_string()
}

pub fn appointment_rejected() -> String {
    "Your appointment has been rejected. Please try booking with another doctor.".to_string()
}

pub fn meeting_details_shared(meeting_time: Option<&NaiveDateTime>) -> String {
    match meeting_time {
        Some(at) => format!(
            "Doctor has shared meeting details for your appointment at {}",
            format_datetime(at)
        ),
        None => "Doctor has shared meeting details for your appointment".to_string(),
    }
}

pub fn lab_booking_requested(patient_name: &str, test_type: &str) -> String {
    format!("New Lab Booking Request from {patient_name} for {test_type}")
}

pub fn lab_status_changed(status: LabBookingStatus) -> String {
    format!("Your lab booking status has been updated to: {status}")
}

pub fn lab_report_ready(test_type: &str) -> String {
    format!("Your Lab Report for {test_type} is ready! Check My Reports.")
}

pub fn lab_report_for_doctor(patient_name: &str, patient_id: i64) -> String {
    format!("A new lab report has been uploaded for your patient {patient_name} (ID: {patient_id})")
}

pub fn medicine_booked_for_shop(patient_name: &str) -> String {
    format!("New Medicine Booking from {patient_name}")
}

/// `expected` is the promised delivery time, one day after booking.
pub fn medicine_booked_for_patient(expected: &NaiveDateTime) -> String {
    format!(
        "Order Placed: Your medicine order has been received. Expected delivery by Tomorrow ({}) at {}.",
        expected.format(DATE_FORMAT),
        expected.format(TIME_FORMAT),
    )
}

pub fn medicine_status_changed(
    order_id: i64,
    status: MedicineBookingStatus,
    cost: Option<f64>,
    delivery_date: Option<&NaiveDateTime>,
) -> String {
    match status {
        MedicineBookingStatus::Accepted => {
            let cost = cost
                .map(|c| format!("₹{c}"))
                .unwrap_or_else(|| "To be confirmed".to_string());
            let delivery = delivery_date
                .map(format_datetime)
                .unwrap_or_else(|| "soon".to_string());
            format!(
                "Order Accepted: Your order #{order_id} is accepted. Cost: {cost}. \
                 Delivery by: {delivery}. Please confirm to proceed."
            )
        }
        MedicineBookingStatus::OutForDelivery => {
            format!("Out for Delivery: Order #{order_id} is on its way!")
        }
        MedicineBookingStatus::Delivered => {
            format!("Delivered: Order #{order_id} has been delivered successfully.")
        }
        other => format!("Your medicine order #{order_id} status updated to: {other}"),
    }
}

pub fn delivery_response(order_id: i64, response: DeliveryResponse) -> String {
    let action = match response {
        DeliveryResponse::Accept => "accepted",
        DeliveryResponse::Reject => "rejected",
    };
    format!("Patient has {action} the delivery date for Order #{order_id}")
}
