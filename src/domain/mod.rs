mod contact_email;
mod contact_submission;
mod received_at;

pub use contact_email::ContactEmail;
pub use contact_submission::{ContactSubmission, MissingRequiredFields};
pub use received_at::ReceivedAt;
