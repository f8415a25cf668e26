use std::sync::LazyLock;

use regex::Regex;

use super::types::Category;

/// A category together with the patterns that select it.
struct PatternGroup {
    category: Category,
    patterns: Vec<Regex>,
}

/// Pattern groups in triage priority order. Life-threatening phrasing is
/// checked first so it can never be shadowed by a topic match further down.
static GROUPS: LazyLock<Vec<PatternGroup>> = LazyLock::new(|| {
    vec![
        group(
            Category::Emergency,
            &[
                r"\b(?:severe|heavy|massive|uncontrolled|profuse)\s+(?:rectal\s+)?bleeding\b",
                r"\bbleeding\s+(?:a\s+lot|heavily|profusely|non[- ]?stop)\b",
                r"\b(?:can'?t|cannot|won'?t)\s+stop\s+(?:the\s+)?bleeding\b",
                r"\bsevere\s+(?:abdominal\s+|stomach\s+|belly\s+)?(?:pain|cramps?)\b",
                r"\b(?:vomiting|throwing\s+up|coughing\s+up)\s+blood\b",
                r"\b(?:fainted|fainting|passed\s+out|unconscious|collapsed)\b",
                r"\bchest\s+pain\b",
                r"\b(?:can'?t|cannot|trouble|difficulty)\s+breath(?:e|ing)\b",
                r"\b(?:rigid|swollen|hard)\s+(?:abdomen|belly|stomach)\b",
                r"\bcan'?t\s+pass\s+(?:gas|wind|stool)\b",
                r"\b(?:emergency|ambulance|911|995|999)\b",
                r"\b(?:suicid\w*|kill\s+myself)\b",
            ],
        ),
        group(
            Category::Urgent,
            &[
                r"\bblood\s+in\s+(?:my\s+|the\s+)?(?:stools?|poo|poop|feces|faeces)\b",
                r"\brectal\s+bleeding\b",
                r"\bbloody\s+(?:stools?|diarrh\w*)\b",
                r"\b(?:black|tarry|maroon)\b.*\bstools?\b",
                r"\b(?:unexplained|unintentional|sudden)\s+weight\s+loss\b",
                r"\blosing\s+weight\s+without\b",
                r"\b(?:persistent|ongoing|constant)\s+(?:abdominal\s+|stomach\s+)?(?:pain|cramps?|diarrh\w*|constipation)\b",
                r"\bgetting\s+worse\b",
                r"\b(?:for|over)\s+(?:several\s+|a\s+few\s+|\d+\s+)?(?:weeks|months)\b",
                r"\burgent(?:ly)?\b",
            ],
        ),
        group(
            Category::Screening,
            &[
                r"\bcolonoscop\w*",
                r"\bscreen(?:ing|ed|s)?\b",
                r"\bfit\s+(?:test|kit)s?\b",
                r"\bfa?ecal\s+immunochemical\b",
                r"\bsigmoidoscop\w*",
                r"\bstool\s+(?:test|dna|sample)s?\b",
                r"\bcologuard\b",
                r"\bct\s+colonograph\w*",
                r"\b(?:get|getting|be)\s+(?:tested|checked)\b",
            ],
        ),
        group(
            Category::Symptoms,
            &[
                r"\bsymptoms?\b",
                r"\bsigns?\s+of\b",
                r"\bbleeding\b",
                r"\bdiarrh?o?ea\b",
                r"\bconstipat\w*",
                r"\b(?:abdominal|stomach|belly)\s+(?:pain|cramps?|discomfort)\b",
                r"\bcramp(?:s|ing)?\b",
                r"\bbloat\w*",
                r"\b(?:tired|fatigue\w*|exhausted)\b",
                r"\bweight\s+loss\b",
                r"\bbowel\s+habits?\b",
                r"\bnarrow\s+stools?\b",
                r"\bpain(?:ful)?\b",
            ],
        ),
        group(
            Category::RiskFactors,
            &[
                r"\brisks?\b",
                r"\bsmok\w*",
                r"\balcohol\b",
                r"\b(?:obes\w*|overweight)\b",
                r"\bdiabet\w*",
                r"\b(?:crohn'?s|ulcerative\s+colitis|inflammatory\s+bowel|ibd)\b",
                r"\bwho\s+(?:gets|is\s+likely)\b",
                r"\bover\s+(?:40|45|50)\b",
                r"\bcause[sd]?\b",
            ],
        ),
        group(
            Category::Prevention,
            &[
                r"\bprevent\w*",
                r"\bdiet\b",
                r"\bexercis\w*",
                r"\bfib(?:er|re)\b",
                r"\b(?:red|processed)\s+meat\b",
                r"\blifestyle\b",
                r"\bhealthy\s+(?:eating|diet|habits?|lifestyle)\b",
                r"\bprotect\s+myself\b",
            ],
        ),
        group(
            Category::Treatment,
            &[
                r"\btreat(?:ment|ed|ing)?s?\b",
                r"\bchemo\w*",
                r"\b(?:radiation|radiotherapy)\b",
                r"\b(?:surger(?:y|ies)|colectomy)\b",
                r"\bimmunotherap\w*",
                r"\bstages?\b",
                r"\bsurviv\w*",
                r"\bprognosis\b",
                r"\b(?:cure[sd]?|curable)\b",
                r"\boncologists?\b",
            ],
        ),
        group(
            Category::FamilyHistory,
            &[
                r"\bfamil(?:y|ial)\b",
                r"\b(?:mother|father|mom|mum|dad|brother|sister|parents?|siblings?|grand(?:ma|pa|mother|father)|aunt|uncle)\b",
                r"\b(?:genetic\w*|genes?)\b",
                r"\b(?:hereditar\w*|inherit\w*)",
                r"\blynch\b",
                r"\bfap\b",
                r"\bruns\s+in\b",
            ],
        ),
        group(
            Category::Polyps,
            &[
                r"\bpolyps?\b",
                r"\badenoma\w*",
                r"\bpolypectomy\b",
                r"\bgrowths?\b",
            ],
        ),
        group(
            Category::BloodTests,
            &[
                r"\bblood\s+tests?\b",
                r"\bcea\b",
                r"\btumou?r\s+markers?\b",
                r"\b(?:cbc|full\s+blood\s+count)\b",
                r"\ban(?:a)?emi\w*",
                r"\bha?emoglobin\b",
                r"\bliquid\s+biops\w*",
                r"\bblood[- ]based\b",
                r"\bseptin\s*9\b",
            ],
        ),
    ]
});

fn group(category: Category, patterns: &[&str]) -> PatternGroup {
    PatternGroup {
        category,
        patterns: patterns
            .iter()
            .map(|p| Regex::new(&format!("(?i){p}")).expect("Invalid classifier regex pattern"))
            .collect(),
    }
}

/// Classify free text into a category. Unmatched input is `General`.
pub fn classify(text: &str) -> Category {
    matched_category(text).unwrap_or(Category::General)
}

/// The first pattern group that matches, if any.
pub fn matched_category(text: &str) -> Option<Category> {
    let lower = text.to_lowercase();
    GROUPS
        .iter()
        .find(|g| g.patterns.iter().any(|re| re.is_match(&lower)))
        .map(|g| g.category)
}

/// Positive reply to the "anything else?" offer.
pub fn is_affirmative_follow_up(text: &str) -> bool {
    let lower = text.to_lowercase();
    ["yes", "okay", "sure", "help"]
        .iter()
        .any(|w| lower.contains(w))
}

/// Confirmation of a suggested spelling correction.
///
/// Same precedence as [`has_own_provider`]: "yes" wins, then a negation
/// rejects, so "no, that's not correct" is not a confirmation.
pub fn confirms_correction(text: &str) -> bool {
    let lower = text.to_lowercase();
    if lower.contains("yes") {
        return true;
    }
    if is_negated(&lower) {
        return false;
    }
    ["correct", "right"].iter().any(|w| lower.contains(w))
}

/// Whether a doctor-availability answer says the user already has a provider.
///
/// "yes" always wins. Otherwise an explicit negation ("no", "don't", ...)
/// overrides the looser "have"/"doctor"/"provider" hints, so that
/// "no, I don't have a doctor" is not read as a yes.
pub fn has_own_provider(text: &str) -> bool {
    let lower = text.to_lowercase();
    if lower.contains("yes") {
        return true;
    }
    if is_negated(&lower) {
        return false;
    }
    ["have", "doctor", "provider"]
        .iter()
        .any(|w| lower.contains(w))
}

/// Whole-word negation check on already-lowercased text.
fn is_negated(lower: &str) -> bool {
    lower
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .any(|w| matches!(w, "no" | "not" | "don't" | "dont" | "nope" | "without"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emergency_shadows_lower_priority_matches() {
        assert_eq!(classify("severe bleeding and feeling tired"), Category::Emergency);
        assert_eq!(classify("I have severe bleeding"), Category::Emergency);
        assert_eq!(
            classify("severe abdominal pain and bloating after my colonoscopy"),
            Category::Emergency
        );
        assert_eq!(
            classify("My family has a history and I'm bleeding heavily"),
            Category::Emergency
        );
    }

    #[test]
    fn classify_emergency_phrasing() {
        assert_eq!(classify("I passed out in the toilet"), Category::Emergency);
        assert_eq!(classify("I'm vomiting blood"), Category::Emergency);
        assert_eq!(classify("I can't stop bleeding"), Category::Emergency);
    }

    #[test]
    fn classify_urgent_phrasing() {
        assert_eq!(classify("There is blood in my stool"), Category::Urgent);
        assert_eq!(classify("I've had diarrhea for weeks"), Category::Urgent);
        assert_eq!(classify("unexplained weight loss lately"), Category::Urgent);
        assert_eq!(classify("I have black, tarry stools"), Category::Urgent);
    }

    #[test]
    fn plain_bleeding_is_symptom_not_triage() {
        assert_eq!(classify("is bleeding a sign of cancer"), Category::Symptoms);
    }

    #[test]
    fn classify_topics() {
        assert_eq!(classify("What is a colonoscopy?"), Category::Screening);
        assert_eq!(classify("How does the FIT test work"), Category::Screening);
        assert_eq!(classify("I'm having some bloating"), Category::Symptoms);
        assert_eq!(classify("Does smoking increase my risk?"), Category::RiskFactors);
        assert_eq!(classify("What diet helps prevent it?"), Category::Prevention);
        assert_eq!(
            classify("What are the treatment options for stage 3?"),
            Category::Treatment
        );
        assert_eq!(classify("My father had colon cancer"), Category::FamilyHistory);
        assert_eq!(classify("Are polyps dangerous?"), Category::Polyps);
        assert_eq!(classify("What does a CEA blood test show?"), Category::BloodTests);
    }

    #[test]
    fn unmatched_input_is_general() {
        assert_eq!(classify("Hello there"), Category::General);
        assert_eq!(classify("Tell me about COLONAiVE"), Category::General);
        assert_eq!(classify(""), Category::General);
        assert_eq!(matched_category("good morning"), None);
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(classify("SEVERE BLEEDING"), Category::Emergency);
        assert_eq!(classify("Polyps"), Category::Polyps);
    }

    #[test]
    fn misspelled_input_still_reaches_topic_when_pattern_survives() {
        assert_eq!(classify("whta is colonoscopy"), Category::Screening);
    }

    #[test]
    fn follow_up_sentiment() {
        assert!(is_affirmative_follow_up("Yes please"));
        assert!(is_affirmative_follow_up("sure"));
        assert!(is_affirmative_follow_up("I need more help"));
        assert!(!is_affirmative_follow_up("no thanks"));
    }

    #[test]
    fn correction_confirmation() {
        assert!(confirms_correction("yes"));
        assert!(confirms_correction("That's right"));
        assert!(confirms_correction("correct"));
        assert!(!confirms_correction("no"));
        assert!(!confirms_correction("no, that's not correct"));
        assert!(!confirms_correction("that's not right"));
        assert!(confirms_correction("yes, not a typo"));
    }

    #[test]
    fn doctor_answers() {
        assert!(has_own_provider("yes"));
        assert!(has_own_provider("I have a GP"));
        assert!(has_own_provider("my doctor is Dr Tan"));
        assert!(!has_own_provider("no"));
        assert!(!has_own_provider("No, I don't have a doctor"));
        assert!(!has_own_provider("not really"));
        assert!(!has_own_provider("what should I do"));
    }
}
