// =====================================================================================
// CARE RECORDS CELL
// =====================================================================================
//
// Patient-scoped clinical records kept alongside the profile store:
// appointments, vitals, documents, notifications and prescriptions.
// Every record type is written independently; there are no cross-record
// transactions.
//
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    Appointment, CareRecord, Document, DoctorScoped, Notification, Prescription, Vitals,
};
pub use router::care_records_routes;
pub use services::RecordService;
