mod model;

pub use model::{AssessmentSchedule, Schedule};
