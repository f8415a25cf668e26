//! Canned chatbot replies.
//!
//! Every text here is static. The only personalization is the first name
//! interpolated into the welcome and general replies, so `respond` is a pure
//! function of its inputs.

use super::types::{BotReply, Category, Link};

pub const EMERGENCY_HEADLINE: &str = "🚨 URGENT MEDICAL ATTENTION NEEDED";

const EMERGENCY_TEXT: &str = "🚨 URGENT MEDICAL ATTENTION NEEDED\n\n\
What you describe may need immediate care. Please do not wait for an online answer:\n\n\
• **Call 995** (or your local emergency number) if you have heavy bleeding, fainting, \
severe abdominal pain, or trouble breathing\n\
• Go to the nearest **Emergency Department** if you can travel safely\n\
• Do not drive yourself if you feel faint or dizzy\n\n\
I am an educational assistant and cannot assess your condition. A medical \
professional needs to see you as soon as possible.";

const URGENT_TEXT: &str = "⚠️ Please see a doctor soon\n\n\
Changes like blood in the stool, a lasting change in bowel habits, black or tarry \
stools, or unexplained weight loss should be checked by a doctor **within the next \
few days**. These signs are often caused by something treatable, such as haemorrhoids \
or an infection, but only a doctor can rule out colorectal cancer.\n\n\
• Book an appointment with your GP or a polyclinic\n\
• Note when the symptoms started and how often they happen\n\
• Mention any family history of colorectal cancer or polyps\n\n\
If the symptoms become severe, go to an Emergency Department.";

const SCREENING_TEXT: &str = "🔍 Colorectal cancer screening\n\n\
Screening finds cancer early, often before symptoms appear, and can find polyps \
before they turn into cancer.\n\n\
• **FIT (faecal immunochemical test)**: a simple home stool test, done every year\n\
• **Colonoscopy**: a camera examination of the whole colon, usually every 10 years \
if normal. Polyps can be removed during the same procedure\n\
• **Blood-based tests**: newer options for people who decline other tests\n\n\
Most people at average risk should start screening at **age 45–50**. People with a \
family history may need to start earlier.";

const SYMPTOMS_TEXT: &str = "📋 Common symptoms of colorectal cancer\n\n\
• Blood in or on the stool\n\
• A change in bowel habits lasting more than a few weeks (diarrhoea, constipation, \
narrower stools)\n\
• Abdominal pain, cramps or bloating that doesn't go away\n\
• Unexplained weight loss\n\
• Tiredness or weakness, sometimes from anaemia\n\n\
Early colorectal cancer often has **no symptoms at all**, which is why screening \
matters. If you notice any of these, please talk to a doctor.";

const RISK_FACTORS_TEXT: &str = "⚖️ Risk factors for colorectal cancer\n\n\
Things you cannot change:\n\
• Age (risk rises from 45 onwards)\n\
• Family history of colorectal cancer or polyps\n\
• Inflammatory bowel disease (Crohn's disease, ulcerative colitis)\n\
• Inherited syndromes such as Lynch syndrome or FAP\n\n\
Things you can change:\n\
• Smoking and heavy alcohol use\n\
• Being overweight and physically inactive\n\
• A diet high in red and processed meat and low in fibre\n\n\
Having a risk factor does not mean you will get cancer, but it may mean you should \
start screening earlier.";

const PREVENTION_TEXT: &str = "🥗 Lowering your risk\n\n\
• **Get screened**: removing polyps prevents cancer from forming\n\
• Eat more fibre: whole grains, fruit and vegetables\n\
• Limit red and processed meat\n\
• Stay active: aim for 150 minutes of moderate exercise a week\n\
• Keep a healthy weight\n\
• Don't smoke, and limit alcohol\n\n\
Screening is the single most effective step. Lifestyle changes add to it but do not \
replace it.";

const TREATMENT_TEXT: &str = "🏥 Treatment overview\n\n\
Treatment depends on the stage of the cancer and your overall health:\n\n\
• **Surgery** to remove the affected part of the colon or rectum, the main treatment \
for most early-stage cancers\n\
• **Chemotherapy** before or after surgery to lower the chance of return\n\
• **Radiotherapy**, mainly for rectal cancer\n\
• **Targeted therapy and immunotherapy** for some advanced cancers\n\n\
When found early, colorectal cancer is highly treatable: most people diagnosed at an \
early stage survive five years or more. Your oncology team will explain which \
options fit your situation.";

const FAMILY_HISTORY_TEXT: &str = "👪 Family history and colorectal cancer\n\n\
If a parent, brother, sister or child has had colorectal cancer or advanced polyps, \
your own risk is higher, especially if they were diagnosed before age 50.\n\n\
• You may need to start screening at **age 40**, or 10 years before your relative's \
age at diagnosis, whichever comes first\n\
• Colonoscopy is usually recommended rather than FIT\n\
• Several relatives affected, or very young diagnoses, may point to an inherited \
condition such as Lynch syndrome. Ask your doctor about genetic counselling\n\n\
Share your family history with your doctor so they can plan the right screening for you.";

const POLYPS_TEXT: &str = "🔬 About polyps\n\n\
Polyps are small growths on the lining of the colon or rectum. Most are harmless, but \
some types (adenomas) can slowly turn into cancer over about 10 years.\n\n\
• Polyps rarely cause symptoms, so screening is the way to find them\n\
• They are usually removed during colonoscopy, in a painless step called polypectomy\n\
• After polyps are removed, your doctor will advise when to repeat the colonoscopy\n\n\
Finding and removing polyps is how screening **prevents** colorectal cancer.";

const BLOOD_TESTS_TEXT: &str = "🩸 Blood tests and colorectal cancer\n\n\
• A **full blood count** can show anaemia, which sometimes comes from slow bleeding \
in the bowel\n\
• **CEA** is a tumour marker used to follow people already treated for colorectal \
cancer. It is not reliable for screening\n\
• Newer **blood-based screening tests** exist, but they find fewer early cancers and \
polyps than colonoscopy or FIT\n\n\
A normal blood test does not replace screening. Ask your doctor which test suits you.";

const GENERAL_TEXT: &str = "Thanks for your question{name}! 💙\n\n\
I can help with colorectal cancer topics such as:\n\
• Screening options (FIT, colonoscopy)\n\
• Symptoms to watch for\n\
• Risk factors and family history\n\
• Polyps, prevention and treatment\n\n\
Try asking something like \"When should I get screened?\" or \"What are the symptoms?\"";

const WELCOME_TEXT: &str = "Hi{name}! 👋 I'm the COLONAiVE assistant. I can answer questions \
about colorectal cancer: screening, symptoms, risk factors, prevention and more.\n\n\
I provide general information only and cannot give a diagnosis. If you have severe \
symptoms, please call 995 or see a doctor immediately.\n\nWhat would you like to know?";

const SPELLING_APOLOGY_TEXT: &str = "Sorry about that! Could you please rephrase your question? \
I'll do my best to help.";

const DOCTOR_PROMPT_TEXT: &str = "Do you currently have a doctor or healthcare provider you \
can contact about this?";

const OWN_PROVIDER_TEXT: &str = "Good. Please contact your doctor or healthcare provider \
as soon as possible and describe your symptoms. Tell them when they started and whether \
anyone in your family has had colorectal cancer or polyps.\n\n\
If things get worse before you can be seen, go to the nearest Emergency Department.";

const FIND_PROVIDER_TEXT: &str = "That's okay, we can help you find one. You can visit a \
polyclinic or GP clinic near you, or use one of the finders below to locate a screening \
centre.\n\nIf your symptoms are severe, please go to the nearest Emergency Department.";

const DOCTOR_WATCHDOG_TEXT: &str = "Take your time. When you're ready, just let me know \
whether you have a doctor you can contact, and I'll point you to the right next step.";

const FOLLOW_UP_OFFER_TEXT: &str = "Is there anything else you'd like to know about \
colorectal cancer, screening or prevention? I'm happy to help.";

const FOLLOW_UP_YES_TEXT: &str = "Great! Go ahead and ask your next question. You can also \
explore the pages below.";

const FOLLOW_UP_NO_TEXT: &str = "No problem. Thank you for chatting with me, and remember: \
screening saves lives. Take care! 💙";

const CHECK_IN_TEXT: &str = "Are you still there? If you have more questions about \
colorectal cancer, I'm here to help.";

const SESSION_ENDED_TEXT: &str = "This chat has ended due to inactivity. Close and reopen the \
chat window whenever you'd like to start again. Take care! 💙";

/// The category reply, with urgency flags for the triage categories.
pub fn respond(category: Category, first_name: Option<&str>) -> BotReply {
    let (text, links) = match category {
        Category::Emergency => (EMERGENCY_TEXT.to_string(), emergency_links()),
        Category::Urgent => (URGENT_TEXT.to_string(), urgent_links()),
        Category::Screening => (
            SCREENING_TEXT.to_string(),
            vec![
                Link::new("Screening options", "/screening"),
                Link::new("Get screened", "/get-screened"),
            ],
        ),
        Category::Symptoms => (
            SYMPTOMS_TEXT.to_string(),
            vec![
                Link::new("Symptoms guide", "/education/symptoms"),
                Link::new("Get screened", "/get-screened"),
            ],
        ),
        Category::RiskFactors => (
            RISK_FACTORS_TEXT.to_string(),
            vec![Link::new("Risk factors", "/education/risk-factors")],
        ),
        Category::Prevention => (
            PREVENTION_TEXT.to_string(),
            vec![Link::new("Prevention tips", "/education/prevention")],
        ),
        Category::Treatment => (
            TREATMENT_TEXT.to_string(),
            vec![Link::new("Treatment overview", "/education/treatment")],
        ),
        Category::FamilyHistory => (
            FAMILY_HISTORY_TEXT.to_string(),
            vec![
                Link::new("Family history & genetics", "/education/family-history"),
                Link::new("Screening options", "/screening"),
            ],
        ),
        Category::Polyps => (
            POLYPS_TEXT.to_string(),
            vec![Link::new("About polyps", "/education/polyps")],
        ),
        Category::BloodTests => (
            BLOOD_TESTS_TEXT.to_string(),
            vec![Link::new("Screening options", "/screening")],
        ),
        Category::General => (
            with_name(GENERAL_TEXT, first_name),
            vec![
                Link::new("Learn about CRC", "/education"),
                Link::new("Screening options", "/screening"),
            ],
        ),
    };

    BotReply {
        text,
        links,
        is_emergency: category == Category::Emergency,
        is_urgent: category == Category::Urgent,
    }
}

pub fn welcome(first_name: Option<&str>) -> BotReply {
    BotReply::plain(with_name(WELCOME_TEXT, first_name))
}

pub fn spelling_apology() -> BotReply {
    BotReply::plain(SPELLING_APOLOGY_TEXT)
}

pub fn doctor_prompt() -> BotReply {
    BotReply::plain(DOCTOR_PROMPT_TEXT)
}

pub fn own_provider() -> BotReply {
    BotReply::plain(OWN_PROVIDER_TEXT)
}

/// Guidance for users without a doctor. Always carries exactly two
/// clinic-finder links.
pub fn find_provider() -> BotReply {
    BotReply::with_links(
        FIND_PROVIDER_TEXT,
        vec![
            Link::new("Find a screening clinic", "/find-a-clinic"),
            Link::new("Find a GP or polyclinic", "/find-a-gp"),
        ],
    )
}

pub fn doctor_watchdog() -> BotReply {
    BotReply::plain(DOCTOR_WATCHDOG_TEXT)
}

pub fn follow_up_offer() -> BotReply {
    BotReply::plain(FOLLOW_UP_OFFER_TEXT)
}

pub fn follow_up_accepted() -> BotReply {
    BotReply::with_links(
        FOLLOW_UP_YES_TEXT,
        vec![
            Link::new("Learn about CRC", "/education"),
            Link::new("Become a Champion", "/champions/join"),
        ],
    )
}

pub fn follow_up_declined() -> BotReply {
    BotReply::plain(FOLLOW_UP_NO_TEXT)
}

pub fn check_in() -> BotReply {
    BotReply::plain(CHECK_IN_TEXT)
}

pub fn session_ended() -> BotReply {
    BotReply::plain(SESSION_ENDED_TEXT)
}

fn emergency_links() -> Vec<Link> {
    vec![Link::new("Find the nearest Emergency Department", "/emergency")]
}

fn urgent_links() -> Vec<Link> {
    vec![
        Link::new("Symptoms guide", "/education/symptoms"),
        Link::new("Find a clinic", "/find-a-clinic"),
    ]
}

fn with_name(template: &str, first_name: Option<&str>) -> String {
    let suffix = first_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| format!(" {n}"))
        .unwrap_or_default();
    template.replacen("{name}", &suffix, 1)
}
