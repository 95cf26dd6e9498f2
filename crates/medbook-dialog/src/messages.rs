//! Outbound message texts.

use chrono::NaiveDateTime;
use medbook_core::DoctorDirectory;

pub const DATE_PROMPT: &str = "Please enter the date";
pub const TIME_PROMPT: &str = "Please enter the time";
pub const UNAVAILABLE: &str =
    "Sorry, you've provided an unavailable time or date. Please repeat again";
pub const HANDOFF: &str = "Redirecting to a human manager";
pub const CLARIFY: &str = "Sorry, I didn't quite get you. Could you paraphrase it?";

/// Lists every doctor in directory order, one per line.
pub fn doctor_prompt(directory: &DoctorDirectory) -> String {
    let mut prompt = String::from("Please choose the doctor out of the available:\n");
    for doctor in directory.iter() {
        prompt.push_str(&doctor.name);
        prompt.push('\n');
    }
    prompt
}

pub fn confirmation(doctor_name: &str, at: NaiveDateTime) -> String {
    format!(
        "Your reservation with {} was made. Time: {}. Thanks for working with us!",
        doctor_name,
        format_appointment(at)
    )
}

/// e.g. `Monday, October 19 2026 at 10:00`.
pub fn format_appointment(at: NaiveDateTime) -> String {
    at.format("%A, %B %-d %Y at %H:%M").to_string()
}

pub fn greeting(bot_name: &str) -> String {
    format!("Hello! My name's {}. How can I help you?", bot_name)
}
