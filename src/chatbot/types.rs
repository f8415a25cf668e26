use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Triage and topic categories, in classifier priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Emergency,
    Urgent,
    Screening,
    Symptoms,
    RiskFactors,
    Prevention,
    Treatment,
    FamilyHistory,
    Polyps,
    BloodTests,
    General,
}

impl Category {
    /// Categories that trigger the doctor-availability sub-dialog.
    pub fn is_triage(self) -> bool {
        matches!(self, Category::Emergency | Category::Urgent)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Emergency => "EMERGENCY",
            Category::Urgent => "URGENT",
            Category::Screening => "SCREENING",
            Category::Symptoms => "SYMPTOMS",
            Category::RiskFactors => "RISK_FACTORS",
            Category::Prevention => "PREVENTION",
            Category::Treatment => "TREATMENT",
            Category::FamilyHistory => "FAMILY_HISTORY",
            Category::Polyps => "POLYPS",
            Category::BloodTests => "BLOOD_TESTS",
            Category::General => "GENERAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Bot,
    User,
}

/// Suggested navigation link attached to a bot message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub url: String,
}

impl Link {
    pub fn new(text: &str, url: &str) -> Self {
        Self {
            text: text.to_string(),
            url: url.to_string(),
        }
    }
}

/// One entry in the conversation. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    pub links: Vec<Link>,
    pub awaiting_response: bool,
    pub awaiting_correction: bool,
    pub awaiting_doctor_choice: bool,
    pub is_urgent: bool,
    pub is_emergency: bool,
    /// Session-clock offset at which the message was appended.
    pub at_ms: u64,
}

impl Message {
    pub fn user(text: &str, at_ms: u64) -> Self {
        Self::base(text.to_string(), Sender::User, Vec::new(), at_ms)
    }

    pub fn bot(text: String, links: Vec<Link>, at_ms: u64) -> Self {
        Self::base(text, Sender::Bot, links, at_ms)
    }

    fn base(text: String, sender: Sender, links: Vec<Link>, at_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            sender,
            links,
            awaiting_response: false,
            awaiting_correction: false,
            awaiting_doctor_choice: false,
            is_urgent: false,
            is_emergency: false,
            at_ms,
        }
    }
}

/// Canned text produced by the response generator before it becomes a
/// `Message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotReply {
    pub text: String,
    pub links: Vec<Link>,
    pub is_urgent: bool,
    pub is_emergency: bool,
}

impl BotReply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            links: Vec::new(),
            is_urgent: false,
            is_emergency: false,
        }
    }

    pub fn with_links(text: impl Into<String>, links: Vec<Link>) -> Self {
        Self {
            text: text.into(),
            links,
            is_urgent: false,
            is_emergency: false,
        }
    }
}

/// Likely misspelling awaiting the user's yes/no.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCorrection {
    pub original: String,
    pub corrected: String,
}

/// Which flag interprets the next user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    Correction,
    DoctorChoice,
    FollowUp,
    Open,
}

/// Transient dialog flags. More than one may be raised at once (a delayed
/// prompt can land while another question is outstanding); `gate()` fixes
/// the order in which they are served.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogFlags {
    pub pending_correction: Option<PendingCorrection>,
    pub awaiting_doctor_choice: bool,
    pub follow_up_offered: bool,
    /// Set once the follow-up offer has been shown; it is never repeated.
    pub follow_up_made: bool,
}

impl DialogFlags {
    /// Precedence: correction > doctor choice > follow-up > classifier.
    pub fn gate(&self) -> Gate {
        if self.pending_correction.is_some() {
            Gate::Correction
        } else if self.awaiting_doctor_choice {
            Gate::DoctorChoice
        } else if self.follow_up_offered {
            Gate::FollowUp
        } else {
            Gate::Open
        }
    }
}

/// What happened to a `send` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendOutcome {
    /// Input was appended and answered through the given gate.
    Accepted { gate: Gate },
    /// Blank input; nothing changed.
    Ignored,
    /// The inactivity monitor closed the session; nothing changed.
    SessionEnded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_emergency_and_urgent_are_triage() {
        assert!(Category::Emergency.is_triage());
        assert!(Category::Urgent.is_triage());
        assert!(!Category::Symptoms.is_triage());
        assert!(!Category::General.is_triage());
    }

    #[test]
    fn category_serializes_screaming_snake() {
        let json = serde_json::to_string(&Category::FamilyHistory).unwrap();
        assert_eq!(json, "\"FAMILY_HISTORY\"");
        assert_eq!(Category::BloodTests.as_str(), "BLOOD_TESTS");
    }

    #[test]
    fn gate_precedence_is_fixed() {
        let mut flags = DialogFlags {
            pending_correction: Some(PendingCorrection {
                original: "whta".into(),
                corrected: "what".into(),
            }),
            awaiting_doctor_choice: true,
            follow_up_offered: true,
            follow_up_made: true,
        };
        assert_eq!(flags.gate(), Gate::Correction);

        flags.pending_correction = None;
        assert_eq!(flags.gate(), Gate::DoctorChoice);

        flags.awaiting_doctor_choice = false;
        assert_eq!(flags.gate(), Gate::FollowUp);

        flags.follow_up_offered = false;
        assert_eq!(flags.gate(), Gate::Open);
    }

    #[test]
    fn user_message_has_no_flags() {
        let msg = Message::user("hello", 10);
        assert_eq!(msg.sender, Sender::User);
        assert!(msg.links.is_empty());
        assert!(!msg.is_emergency && !msg.awaiting_doctor_choice);
        assert_eq!(msg.at_ms, 10);
    }
}
