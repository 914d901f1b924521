//! Question generation.
//!
//! Each field has a small set of phrasing variants, picked uniformly at random
//! so repeated conversations do not read like a fixed script. The random
//! source is supplied by the caller; tests pass a seeded `StdRng`.
//!
//! Templates may contain `{name}`, replaced by the participant's first name.
//! When the name is unknown the placeholder is removed together with the
//! separator in front of it.

use rand::seq::SliceRandom;
use rand::Rng;

use super::field::Field;
use super::fields::KnownFields;

const PLACEHOLDER: &str = "{name}";

const NAME_VARIANTS: &[&str] = &[
    "Hello! Before we begin, could you tell me your full name?",
    "Hi there, I'm here to take a few details. What's your name?",
    "Welcome. May I start with your full name, please?",
];

const ADDRESS_VARIANTS: &[&str] = &[
    "Thanks, {name}. Where do you currently live?",
    "Nice to meet you, {name}. What's your home address?",
    "Got it, {name}. Which city or address should we have on file for you?",
];

const PROBLEM_VARIANTS: &[&str] = &[
    "What brings you in today, {name}?",
    "What health problem would you like help with, {name}?",
    "Tell me briefly, {name}: what's bothering you?",
];

const DESCRIPTION_VARIANTS: &[&str] = &[
    "Can you describe your symptoms in a bit more detail, {name}?",
    "How does it feel, {name}? Please describe what you're experiencing.",
    "Could you walk me through what the symptoms are like, {name}?",
];

const ANALYSIS_VARIANTS: &[&str] = &[
    "When did this start, {name}, and does anything make it better or worse?",
    "Have you noticed what triggers it or what helps, {name}?",
    "Last question, {name}: how long has this been going on, and what have you tried?",
];

const CLARIFICATION_VARIANTS: &[&str] = &[
    "Sorry, I didn't quite catch that. Could you say it again?",
    "I'm not sure I understood. Could you rephrase that for me?",
    "Could you repeat that a little more clearly, please?",
];

const COMPLETION_VARIANTS: &[&str] = &[
    "Thank you, {name}. I have everything I need, and your details have been recorded.",
    "That's all, {name}. Your information has been saved. Take care!",
    "All done, {name}. Thanks for your answers; a doctor will review them shortly.",
];

/// Produces participant-facing prompts.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionGenerator;

impl QuestionGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Raw templates for a field, in declaration order.
    pub fn variants(field: Field) -> &'static [&'static str] {
        match field {
            Field::Name => NAME_VARIANTS,
            Field::Address => ADDRESS_VARIANTS,
            Field::Problem => PROBLEM_VARIANTS,
            Field::Description => DESCRIPTION_VARIANTS,
            Field::Analysis => ANALYSIS_VARIANTS,
        }
    }

    /// Raw clarification templates.
    pub fn clarification_variants() -> &'static [&'static str] {
        CLARIFICATION_VARIANTS
    }

    /// Raw completion templates.
    pub fn completion_variants() -> &'static [&'static str] {
        COMPLETION_VARIANTS
    }

    /// Question for `field`, personalised from `known`.
    pub fn question_for<R: Rng + ?Sized>(&self, field: Field, known: &KnownFields, rng: &mut R) -> String {
        pick(Self::variants(field), known.first_name(), rng)
    }

    /// Generic re-ask used after an unclear answer.
    pub fn clarification_prompt<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        pick(CLARIFICATION_VARIANTS, "", rng)
    }

    /// Closing acknowledgement sent with the completed record.
    pub fn completion_message<R: Rng + ?Sized>(&self, known: &KnownFields, rng: &mut R) -> String {
        pick(COMPLETION_VARIANTS, known.first_name(), rng)
    }
}

/// Renders a template with the given first name.
pub fn render(template: &str, first_name: &str) -> String {
    if first_name.is_empty() {
        template
            .replace(&format!(", {}", PLACEHOLDER), "")
            .replace(&format!(" {}", PLACEHOLDER), "")
            .replace(PLACEHOLDER, "")
    } else {
        template.replace(PLACEHOLDER, first_name)
    }
}

fn pick<R: Rng + ?Sized>(variants: &[&str], first_name: &str, rng: &mut R) -> String {
    let template = variants.choose(rng).copied().unwrap_or_default();
    render(template, first_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn known_name(name: &str) -> KnownFields {
        vec![(Field::Name, name.to_string())].into_iter().collect()
    }

    fn rendered(variants: &[&str], first_name: &str) -> Vec<String> {
        variants.iter().map(|t| render(t, first_name)).collect()
    }

    #[test]
    fn every_field_has_variants() {
        for field in Field::SEQUENCE {
            assert!(!QuestionGenerator::variants(field).is_empty());
        }
    }

    #[test]
    fn question_is_one_of_the_declared_variants() {
        let generator = QuestionGenerator::new();
        let mut rng = StdRng::seed_from_u64(7);
        let known = known_name("Sarah Connor");

        for field in Field::SEQUENCE {
            let allowed = rendered(QuestionGenerator::variants(field), "Sarah");
            for _ in 0..20 {
                let question = generator.question_for(field, &known, &mut rng);
                assert!(!question.is_empty());
                assert!(allowed.contains(&question), "unexpected question: {}", question);
            }
        }
    }

    #[test]
    fn name_is_interpolated_when_known() {
        let generator = QuestionGenerator::new();
        let mut rng = StdRng::seed_from_u64(1);

        let question = generator.question_for(Field::Address, &known_name("Sarah Connor"), &mut rng);

        assert!(question.contains("Sarah"));
        assert!(!question.contains("Connor"));
        assert!(!question.contains(PLACEHOLDER));
    }

    #[test]
    fn unknown_name_leaves_no_placeholder_or_dangling_comma() {
        let generator = QuestionGenerator::new();
        let mut rng = StdRng::seed_from_u64(3);

        for field in Field::SEQUENCE {
            for _ in 0..10 {
                let question = generator.question_for(field, &KnownFields::empty(), &mut rng);
                assert!(!question.contains(PLACEHOLDER));
                assert!(!question.contains(" ,"));
                assert!(!question.contains(", ?"));
            }
        }
    }

    #[test]
    fn same_seed_gives_same_wording() {
        let generator = QuestionGenerator::new();
        let known = known_name("Ana");
        let a = generator.question_for(Field::Problem, &known, &mut StdRng::seed_from_u64(42));
        let b = generator.question_for(Field::Problem, &known, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn clarification_is_from_the_declared_set() {
        let generator = QuestionGenerator::new();
        let mut rng = StdRng::seed_from_u64(9);
        let allowed = rendered(CLARIFICATION_VARIANTS, "");

        for _ in 0..10 {
            assert!(allowed.contains(&generator.clarification_prompt(&mut rng)));
        }
    }

    #[test]
    fn completion_message_greets_by_first_name() {
        let generator = QuestionGenerator::new();
        let mut rng = StdRng::seed_from_u64(5);

        let message = generator.completion_message(&known_name("Sarah Connor"), &mut rng);

        assert!(message.contains("Sarah"));
    }

    #[test]
    fn render_examples() {
        assert_eq!(render("Thanks, {name}. Where?", "Ana"), "Thanks, Ana. Where?");
        assert_eq!(render("Thanks, {name}. Where?", ""), "Thanks. Where?");
        assert_eq!(render("What now, {name}?", ""), "What now?");
        assert_eq!(render("Tell me briefly, {name}: why?", ""), "Tell me briefly: why?");
    }
}
