//! Canned responses for running without a completion backend.
//!
//! Input is lowercased and keywords are matched where a word starts, so
//! "stroke" does not fire inside "keystrokes". Keywords of up to four
//! characters must be whole words (a plural `s` is allowed); longer ones may
//! be stems such as `suicid` or `negotiat`. Topics form an ordered table.
//! Precedence:
//!
//! 1. emergency phrases always win;
//! 2. otherwise the first matching health topic and the first matching
//!    career topic are looked up;
//! 3. when both match, a `career` request takes the career topic and
//!    `health`/`dual` requests take the health topic;
//! 4. when nothing matches, a filler sentence is picked at random.

use rand::Rng;
use rand::seq::IndexedRandom;

use lifeguide_types::models::{AiResponse, Mode, ReportType, ResponseMetadata, Urgency};

use crate::{GeneratedReport, ReportContext};

const TOPIC_CONFIDENCE: f64 = 0.9;
const EMERGENCY_CONFIDENCE: f64 = 0.95;
const FILLER_CONFIDENCE: f64 = 0.5;
const WHOLE_WORD_MAX_LEN: usize = 4;

/// One canned answer and the phrases that select it.
#[derive(Debug)]
pub struct Topic {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub mode: Mode,
    pub urgency: Urgency,
    pub content: &'static str,
    pub suggestions: &'static [&'static str],
}

impl Topic {
    fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| contains_keyword(text, k))
    }

    fn response(&self, confidence: f64) -> AiResponse {
        AiResponse {
            content: self.content.to_string(),
            metadata: ResponseMetadata {
                mode: self.mode,
                confidence,
                suggestions: Some(self.suggestions.iter().map(|s| s.to_string()).collect()),
                urgency: self.urgency,
            },
        }
    }
}

fn contains_keyword(text: &str, keyword: &str) -> bool {
    let whole_word = keyword.chars().count() <= WHOLE_WORD_MAX_LEN;
    text.match_indices(keyword).any(|(start, _)| {
        if text[..start].chars().next_back().is_some_and(char::is_alphanumeric) {
            return false;
        }
        if !whole_word {
            return true;
        }
        let mut rest = text[start + keyword.len()..].chars();
        match rest.next() {
            Some('s') => !rest.next().is_some_and(char::is_alphanumeric),
            next => !next.is_some_and(char::is_alphanumeric),
        }
    })
}

pub static EMERGENCY: Topic = Topic {
    name: "emergency",
    keywords: &[
        "chest pain",
        "can't breathe",
        "cannot breathe",
        "difficulty breathing",
        "heart attack",
        "stroke",
        "overdose",
        "suicid",
        "kill myself",
        "severe bleeding",
        "unconscious",
    ],
    mode: Mode::Health,
    urgency: Urgency::Emergency,
    content: "This sounds like it could be a medical emergency. Please call your local emergency number (such as 911 or 112) or go to the nearest emergency department right now.

If you are with someone, ask them to stay with you until help arrives. If you are having thoughts of harming yourself, please contact a crisis line immediately; you do not have to face this alone.

I can provide general information, but I cannot replace urgent professional care.",
    suggestions: &[
        "Call emergency services now",
        "Ask someone nearby to stay with you",
        "Contact a crisis hotline",
    ],
};

pub static HEALTH_TOPICS: &[Topic] = &[
    Topic {
        name: "stress",
        keywords: &["stress", "anxiety", "anxious", "burnout", "burned out", "overwhelm"],
        mode: Mode::Health,
        urgency: Urgency::Medium,
        content: "Stress and anxiety are very common, and there are practical ways to manage them.

Short-term: try slow breathing (inhale for 4 seconds, hold for 4, exhale for 6), a brief walk, or stepping away from screens for ten minutes.

Longer-term: regular sleep, physical activity, limiting caffeine and alcohol, and talking with people you trust all make a measurable difference. If stress is affecting your sleep, appetite or ability to function for more than two weeks, please speak with a healthcare professional.

This is general information, not medical advice.",
        suggestions: &[
            "Try a 5-minute breathing exercise",
            "Schedule regular breaks during the day",
            "Talk to a mental health professional if symptoms persist",
        ],
    },
    Topic {
        name: "sleep",
        keywords: &["sleep", "insomnia", "tired", "fatigue", "exhausted"],
        mode: Mode::Health,
        urgency: Urgency::Low,
        content: "Good sleep is one of the strongest foundations for health and performance.

Most adults need 7 to 9 hours. Helpful habits include a consistent wake-up time, a dark and cool bedroom, no screens for 30 to 60 minutes before bed, and avoiding caffeine after early afternoon.

If you regularly feel exhausted despite enough sleep, snore loudly, or wake up gasping, consider discussing it with a doctor, as these can be signs of a sleep disorder.",
        suggestions: &[
            "Keep a consistent sleep schedule",
            "Create a wind-down routine",
            "Track your sleep for a week",
        ],
    },
    Topic {
        name: "nutrition",
        keywords: &["diet", "nutrition", "eating", "food", "weight", "meal"],
        mode: Mode::Health,
        urgency: Urgency::Low,
        content: "A balanced diet does not have to be complicated.

Aim for half your plate as vegetables and fruit, a quarter lean protein, and a quarter whole grains. Drink water regularly, and limit ultra-processed foods and sugary drinks.

For weight goals, small sustainable changes work better than strict diets. A registered dietitian can build a plan around your preferences and any medical conditions.",
        suggestions: &[
            "Plan your meals for the week",
            "Add one extra portion of vegetables daily",
            "Consult a registered dietitian",
        ],
    },
    Topic {
        name: "exercise",
        keywords: &["exercise", "workout", "fitness", "gym", "running"],
        mode: Mode::Health,
        urgency: Urgency::Low,
        content: "Regular movement benefits both body and mind.

General guidelines suggest at least 150 minutes of moderate activity per week (such as brisk walking) plus two sessions of strength training. Start where you are: even 10-minute walks add up.

If you have a heart condition, joint problems or have been inactive for a long time, check with a healthcare provider before starting an intense program.",
        suggestions: &[
            "Start with a 10-minute daily walk",
            "Add two strength sessions per week",
            "Find an activity you enjoy",
        ],
    },
    Topic {
        name: "symptoms",
        keywords: &["symptom", "pain", "headache", "fever", "sick", "cough", "nausea", "dizzy"],
        mode: Mode::Health,
        urgency: Urgency::Medium,
        content: "I'm sorry you're not feeling well. I can share general information, but I cannot diagnose conditions.

Keep track of when the symptoms started, how severe they are, and anything that makes them better or worse. Rest and stay hydrated.

Please contact a healthcare professional if symptoms are severe, last more than a few days, or keep getting worse. Seek emergency care right away for chest pain, difficulty breathing, confusion, or a very high fever.",
        suggestions: &[
            "Write down your symptoms and their timing",
            "Stay hydrated and rest",
            "Book an appointment with your doctor",
        ],
    },
];

pub static CAREER_TOPICS: &[Topic] = &[
    Topic {
        name: "resume",
        keywords: &["resume", "résumé", "cv", "cover letter", "portfolio"],
        mode: Mode::Career,
        urgency: Urgency::Low,
        content: "A strong resume gets you the interview, so it's worth the effort.

Lead each role with achievements rather than duties, and quantify them where you can (\"cut release time by 40%\"). Tailor the top third of the page to each job description, keep it to one or two pages, and mirror the keywords recruiters search for.

Would you like tips for a specific industry or seniority level?",
        suggestions: &[
            "Quantify your top three achievements",
            "Tailor your summary to each application",
            "Ask a peer to review your resume",
        ],
    },
    Topic {
        name: "interview",
        keywords: &["interview"],
        mode: Mode::Career,
        urgency: Urgency::Low,
        content: "Interview preparation pays off more than almost anything else in a job search.

Research the company's products, recent news and culture. Prepare five or six stories using the STAR method (Situation, Task, Action, Result) that show your impact, and practise them out loud. Have two or three thoughtful questions ready for the interviewer.

After the interview, send a short thank-you note within a day.",
        suggestions: &[
            "Prepare STAR stories for common questions",
            "Research the company's recent news",
            "Schedule a mock interview",
        ],
    },
    Topic {
        name: "salary",
        keywords: &["salary", "negotiat", "raise", "compensation", "pay"],
        mode: Mode::Career,
        urgency: Urgency::Low,
        content: "Negotiating pay is expected, and preparation is everything.

Research market ranges for your role, location and experience level using salary surveys and job postings. Anchor on the value you bring, not on personal needs. Consider the full package: base salary, bonus, equity, benefits, flexibility and learning budget.

When you receive an offer, thank them, ask for time to review, and respond with a specific, well-supported number.",
        suggestions: &[
            "Research market salary ranges",
            "List your measurable contributions",
            "Practise your negotiation script",
        ],
    },
    Topic {
        name: "career_change",
        keywords: &["career change", "change career", "switch career", "new field", "transition"],
        mode: Mode::Career,
        urgency: Urgency::Low,
        content: "Changing careers is a big step, and it's more common than ever.

Start by listing your transferable skills and the problems you enjoy solving. Talk to people already in the target field through informational interviews. Test the waters with a side project, short course or volunteer work before making the full jump.

A gradual transition plan with clear milestones reduces risk considerably.",
        suggestions: &[
            "Map your transferable skills",
            "Book three informational interviews",
            "Take a short course in the new field",
        ],
    },
    Topic {
        name: "skills",
        keywords: &["skill", "learn", "course", "certification", "upskill"],
        mode: Mode::Career,
        urgency: Urgency::Low,
        content: "Continuous learning is one of the best career investments you can make.

Look at job postings for the role you want next and note the skills that appear repeatedly. Pick one or two to focus on, combine a structured course with a hands-on project, and share what you build.

Certifications help most in fields that formally require them; elsewhere, demonstrable projects often carry more weight.",
        suggestions: &[
            "Identify the top skills in your target job postings",
            "Build a small project to practise",
            "Set a weekly learning goal",
        ],
    },
    Topic {
        name: "job_search",
        keywords: &["job", "career", "promotion", "hiring", "employer", "linkedin"],
        mode: Mode::Career,
        urgency: Urgency::Low,
        content: "Let's make your next career move a deliberate one.

Clarify what you want from your next role: responsibilities, industry, team size, location and growth path. Most roles are filled through networks, so reconnect with former colleagues and keep your professional profile up to date. For promotions, agree on clear success criteria with your manager and document your wins.

Tell me more about where you are now and where you'd like to be, and I can suggest concrete next steps.",
        suggestions: &[
            "Define your ideal next role",
            "Reconnect with five people in your network",
            "Update your professional profile",
        ],
    },
];

/// Used when nothing matches. Picked uniformly at random.
pub static FILLERS: &[&str] = &[
    "That's a great question. Could you tell me a bit more so I can give you more specific guidance?",
    "I'm here to help with both your career and your health. What would you like to focus on today?",
    "Thanks for sharing. Could you give me some more detail about your situation?",
    "Interesting! Are you looking for career advice, health information, or a bit of both?",
    "I'd love to help with that. What outcome are you hoping for?",
];

/// Which canned answer a message selects.
#[derive(Debug, Clone, Copy)]
pub enum Selection {
    Emergency,
    Topic(&'static Topic),
    Filler,
}

pub fn classify(message: &str, mode: Mode) -> Selection {
    let text = message.to_lowercase();

    if EMERGENCY.matches(&text) {
        return Selection::Emergency;
    }

    let health = HEALTH_TOPICS.iter().find(|t| t.matches(&text));
    let career = CAREER_TOPICS.iter().find(|t| t.matches(&text));

    match (health, career) {
        (Some(h), Some(c)) => match mode {
            Mode::Career => Selection::Topic(c),
            Mode::Health | Mode::Dual => Selection::Topic(h),
        },
        (Some(t), None) | (None, Some(t)) => Selection::Topic(t),
        (None, None) => Selection::Filler,
    }
}

/// Keyword-matched canned responder used in demo mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoResponder;

impl DemoResponder {
    pub fn new() -> Self {
        Self
    }

    pub fn respond(&self, message: &str, mode: Mode) -> AiResponse {
        self.respond_with_rng(message, mode, &mut rand::rng())
    }

    pub fn respond_with_rng<R: Rng + ?Sized>(&self, message: &str, mode: Mode, rng: &mut R) -> AiResponse {
        match classify(message, mode) {
            Selection::Emergency => EMERGENCY.response(EMERGENCY_CONFIDENCE),
            Selection::Topic(topic) => topic.response(TOPIC_CONFIDENCE),
            Selection::Filler => {
                let content = FILLERS.choose(rng).copied().unwrap_or_default();
                AiResponse {
                    content: content.to_string(),
                    metadata: ResponseMetadata {
                        mode,
                        confidence: FILLER_CONFIDENCE,
                        suggestions: Some(vec![]),
                        urgency: Urgency::Low,
                    },
                }
            }
        }
    }

    /// Deterministic report built from the user's recent activity.
    pub fn report(&self, report_type: ReportType, context: &ReportContext) -> GeneratedReport {
        let count = |mode: Mode| context.conversations.iter().filter(|c| c.mode == mode).count();
        let total = context.conversations.len();
        let recent_topics: Vec<&str> = context
            .conversations
            .iter()
            .rev()
            .take(5)
            .map(|c| c.title.as_str())
            .collect();

        let (recommendations, action_items): (&[&str], &[&str]) = match report_type {
            ReportType::Career => (
                &[
                    "Clarify your target role and the skills it requires",
                    "Keep your resume and professional profile current",
                    "Grow your network with regular, genuine outreach",
                ],
                &[
                    "List three roles you would apply to today",
                    "Update your resume with quantified achievements",
                    "Schedule one informational interview this month",
                ],
            ),
            ReportType::Health => (
                &[
                    "Prioritise 7 to 9 hours of sleep",
                    "Aim for 150 minutes of moderate activity each week",
                    "Book a routine check-up with your healthcare provider",
                ],
                &[
                    "Set a consistent bedtime for the next two weeks",
                    "Plan three 30-minute walks this week",
                    "Track meals and energy levels for seven days",
                ],
            ),
            ReportType::Combined => (
                &[
                    "Balance career goals with sustainable health habits",
                    "Protect recovery time during demanding work periods",
                    "Review progress in both areas monthly",
                ],
                &[
                    "Block two focus sessions and two exercise sessions in your calendar",
                    "Pick one career and one health goal for this month",
                    "Set a weekly review reminder",
                ],
            ),
        };

        GeneratedReport {
            title: format!("{} Analysis Report", report_type.label()),
            content: serde_json::json!({
                "summary": format!(
                    "{} report based on {} recent conversation{}.",
                    report_type.label(),
                    total,
                    if total == 1 { "" } else { "s" }
                ),
                "analysis": {
                    "conversationCount": total,
                    "modes": {
                        "career": count(Mode::Career),
                        "health": count(Mode::Health),
                        "dual": count(Mode::Dual),
                    },
                    "recentTopics": recent_topics,
                    "profileComplete": context.profile.as_ref().is_some_and(|p| {
                        p.career_data.is_some() && p.health_data.is_some()
                    }),
                },
                "recommendations": recommendations,
                "action_items": action_items,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lifeguide_types::models::Conversation;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use uuid::Uuid;

    fn topic_name(message: &str, mode: Mode) -> &'static str {
        match classify(message, mode) {
            Selection::Emergency => "emergency",
            Selection::Topic(t) => t.name,
            Selection::Filler => "filler",
        }
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(topic_name("I have an INTERVIEW tomorrow", Mode::Dual), "interview");
        assert_eq!(topic_name("Can't SLEEP at night", Mode::Career), "sleep");
    }

    #[test]
    fn emergency_beats_everything() {
        assert_eq!(topic_name("chest pain during my job interview", Mode::Career), "emergency");
        let response = DemoResponder::new().respond("I think I'm having a heart attack", Mode::Career);
        assert_eq!(response.metadata.urgency, Urgency::Emergency);
        assert_eq!(response.metadata.mode, Mode::Health);
        assert_eq!(response.metadata.confidence, EMERGENCY_CONFIDENCE);
    }

    #[test]
    fn keywords_do_not_fire_inside_other_words() {
        assert_eq!(topic_name("keyboard shortcuts to save keystrokes at my job", Mode::Career), "job_search");
        assert_eq!(topic_name("I got praise for a painting I made in Spain", Mode::Dual), "filler");
    }

    #[test]
    fn short_keywords_allow_plurals_and_stems_allow_suffixes() {
        assert_eq!(topic_name("sharp pains in my back", Mode::Dual), "symptoms");
        assert_eq!(topic_name("applying to jobs", Mode::Dual), "job_search");
        assert_eq!(topic_name("I keep having suicidal thoughts", Mode::Career), "emergency");
        assert_eq!(topic_name("negotiating an offer", Mode::Health), "salary");
        assert_eq!(topic_name("my father had a stroke", Mode::Career), "emergency");
    }

    #[test]
    fn health_wins_ties_unless_mode_is_career() {
        let message = "work stress is hurting my job performance";
        assert_eq!(topic_name(message, Mode::Dual), "stress");
        assert_eq!(topic_name(message, Mode::Health), "stress");
        assert_eq!(topic_name(message, Mode::Career), "job_search");
    }

    #[test]
    fn single_domain_match_ignores_mode() {
        assert_eq!(topic_name("how should I negotiate my salary?", Mode::Health), "salary");
        assert_eq!(topic_name("best diet for energy", Mode::Career), "nutrition");
    }

    #[test]
    fn first_topic_in_table_order_wins() {
        // "workout" is listed under exercise; no career keyword is a substring of it
        assert_eq!(topic_name("a good workout routine", Mode::Career), "exercise");
        // resume comes before interview
        assert_eq!(topic_name("resume tips before the interview", Mode::Career), "resume");
    }

    #[test]
    fn unmatched_input_picks_a_filler_in_requested_mode() {
        let mut rng = StdRng::seed_from_u64(7);
        let response = DemoResponder::new().respond_with_rng("hmm, what do you think?", Mode::Career, &mut rng);
        assert!(FILLERS.contains(&response.content.as_str()));
        assert_eq!(response.metadata.mode, Mode::Career);
        assert_eq!(response.metadata.confidence, FILLER_CONFIDENCE);
    }

    #[test]
    fn filler_choice_covers_the_pool() {
        let mut rng = StdRng::seed_from_u64(42);
        let responder = DemoResponder::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(responder.respond_with_rng("hello there", Mode::Dual, &mut rng).content);
        }
        assert_eq!(seen.len(), FILLERS.len());
    }

    #[test]
    fn topic_responses_carry_suggestions() {
        let response = DemoResponder::new().respond("update my cv", Mode::Dual);
        assert_eq!(response.metadata.mode, Mode::Career);
        assert_eq!(response.metadata.confidence, TOPIC_CONFIDENCE);
        assert!(!response.metadata.suggestions.unwrap().is_empty());
    }

    #[test]
    fn demo_report_summarizes_conversations() {
        let conversations = [Mode::Career, Mode::Career, Mode::Health]
            .into_iter()
            .enumerate()
            .map(|(i, mode)| Conversation {
                id: Uuid::new_v4(),
                user_id: "u1".into(),
                title: format!("topic {i}"),
                mode,
                created_at: Utc::now(),
            })
            .collect();
        let ctx = ReportContext::new(None, conversations);

        let report = DemoResponder::new().report(ReportType::Combined, &ctx);
        assert_eq!(report.title, "Combined Analysis Report");
        assert_eq!(report.content["analysis"]["conversationCount"], 3);
        assert_eq!(report.content["analysis"]["modes"]["career"], 2);
        assert_eq!(report.content["analysis"]["recentTopics"][0], "topic 2");
        assert_eq!(report.content["analysis"]["profileComplete"], false);
        assert_eq!(report.content["action_items"].as_array().unwrap().len(), 3);
    }
}
