use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(AppointmentStatus {
    Pending => "pending",
    Accepted => "accepted",
    Rejected => "rejected",
    Completed => "completed",
});

str_enum!(PaymentStatus {
    Pending => "pending",
    Completed => "completed",
});

str_enum!(LabBookingStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Collected => "collected",
    Completed => "completed",
});

str_enum!(MedicineBookingStatus {
    Pending => "pending",
    Accepted => "accepted",
    Rejected => "rejected",
    Confirmed => "confirmed",
    OutForDelivery => "out_for_delivery",
    Delivered => "delivered",
});

str_enum!(UserType {
    Patient => "patient",
    Doctor => "doctor",
    Hospital => "hospital",
    LabStaff => "lab_staff",
    Medical => "medical",
});

str_enum!(Role {
    Patient => "patient",
    Doctor => "doctor",
    Hospital => "hospital",
    LabStaff => "lab_staff",
    Medical => "medical",
    Admin => "admin",
});

str_enum!(AvailabilityStatus {
    Available => "available",
    NotAvailable => "not_available",
});

str_enum!(ReportFileType {
    Pdf => "pdf",
    Image => "image",
});

str_enum!(DeliveryResponse {
    Accept => "accept",
    Reject => "reject",
});

impl ReportFileType {
    /// Classify an uploaded file by its mime type.
    pub fn from_mime(mime: &str) -> Self {
        if mime.to_ascii_lowercase().contains("pdf") {
            Self::Pdf
        } else {
            Self::Image
        }
    }
}
