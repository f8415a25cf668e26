/// Canned answers keyed by substring, checked in order.
const CANNED: &[(&str, &str)] = &[
    (
        "colonoscopy",
        "A colonoscopy lets a doctor look inside the whole colon with a thin camera. \
Polyps can be removed during the same procedure. It is usually done every 10 years \
if the result is normal.",
    ),
    (
        "fit",
        "The FIT kit checks a small stool sample for hidden blood. It is done at home \
once a year. A positive result needs a follow-up colonoscopy.",
    ),
    (
        "screen",
        "Most adults should start colorectal cancer screening at 50, or earlier with a \
family history. Options include a yearly FIT kit or a colonoscopy every 10 years.",
    ),
    (
        "symptom",
        "Watch for blood in the stool, a lasting change in bowel habits, unexplained \
weight loss and ongoing tummy pain. Please see a doctor if you notice any of these.",
    ),
    (
        "prevent",
        "Regular screening, staying active, eating more fibre and less red or processed \
meat, and not smoking all lower your risk.",
    ),
];

const FALLBACK: &str = "Thanks for your question! I can share general information about \
colorectal cancer, screening and prevention. For advice about your own health, please \
speak with your doctor.";

/// Offline stand-in for the hosted model.
#[derive(Debug, Clone, Default)]
pub struct MockCompletion;

impl MockCompletion {
    pub fn new() -> Self {
        Self
    }

    pub fn reply_for(&self, message: &str) -> &'static str {
        let lower = message.to_lowercase();
        CANNED
            .iter()
            .find(|(key, _)| lower.contains(key))
            .map(|(_, reply)| *reply)
            .unwrap_or(FALLBACK)
    }
}

impl super::CompletionClient for MockCompletion {
    fn complete(&self, _system: &str, message: &str) -> Result<String, super::CompletionError> {
        Ok(self.reply_for(message).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionClient;

    #[test]
    fn keyword_selects_reply() {
        let mock = MockCompletion::new();
        assert!(mock.reply_for("What is a COLONOSCOPY?").starts_with("A colonoscopy"));
        assert!(mock.reply_for("how do I prevent it").contains("fibre"));
    }

    #[test]
    fn earlier_keyword_wins() {
        let mock = MockCompletion::new();
        assert!(mock
            .reply_for("is a colonoscopy better than screening with fit")
            .starts_with("A colonoscopy"));
    }

    #[test]
    fn unknown_question_gets_fallback() {
        assert_eq!(MockCompletion::new().reply_for("hello"), FALLBACK);
    }

    #[test]
    fn implements_client() {
        let reply = MockCompletion::new().complete("system", "symptoms?").unwrap();
        assert!(reply.starts_with("Watch for blood"));
    }
}
