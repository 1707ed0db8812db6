//! Labour module: daily attendance of godown labourers.

pub mod attendance;

pub use attendance::{AttendanceRecord, AttendanceStatus, MarkAttendance};
