//! Template arguments used when generation fails

use rand::prelude::IndexedRandom;

const TEMPLATES: &[(&str, [&str; 3])] = &[
    (
        "The Philosopher",
        [
            "From an ethical standpoint, we must carefully examine the moral implications of {topic} and consider how it affects human dignity and our collective well-being.",
            "The philosophical question we must ask about {topic} is: what does this mean for our understanding of justice, truth, and the good life?",
            "History of philosophy teaches us that complex issues like {topic} require us to balance competing moral principles and consider long-term consequences.",
        ],
    ),
    (
        "The Scientist",
        [
            "The evidence regarding {topic} requires rigorous analysis of peer-reviewed research and empirical data before we can reach valid conclusions.",
            "From a scientific perspective, we need more controlled studies and data collection to fully understand the implications of {topic}.",
            "The methodology for evaluating {topic} must be based on reproducible experiments and statistical significance.",
        ],
    ),
    (
        "The Advocate",
        [
            "We must examine how {topic} impacts marginalized communities and ensure that justice and equality remain our guiding principles.",
            "The human rights implications of {topic} cannot be ignored - we must protect the most vulnerable in our society.",
            "Social justice demands that we consider {topic} through the lens of equity and fairness for all people.",
        ],
    ),
    (
        "The Pragmatist",
        [
            "The practical implementation of policies regarding {topic} must consider cost-effectiveness, resource allocation, and real-world feasibility.",
            "Let's focus on actionable solutions for {topic} that can be implemented efficiently and measured for success.",
            "The bottom line on {topic} is what actually works in practice, not just what sounds good in theory.",
        ],
    ),
    (
        "The Contrarian",
        [
            "Popular opinion about {topic} may be fundamentally misguided - we should question our assumptions and consider alternative perspectives.",
            "The conventional wisdom regarding {topic} deserves skeptical examination. What if the majority view is wrong?",
            "Before accepting mainstream conclusions about {topic}, let's challenge the underlying premises and explore contrarian viewpoints.",
        ],
    ),
    (
        "The Historian",
        [
            "History shows us clear patterns regarding {topic} that we can learn from to avoid repeating past mistakes.",
            "Looking at historical precedents for {topic}, we can see how similar situations have played out across different eras and cultures.",
            "The lessons of history regarding {topic} remind us that those who ignore the past are doomed to repeat its errors.",
        ],
    ),
];

/// A template argument in the speaker's voice, picked at random
pub fn fallback_argument(speaker: &str, topic: &str) -> String {
    let chosen = TEMPLATES
        .iter()
        .find(|(name, _)| *name == speaker)
        .and_then(|(_, options)| options.choose(&mut rand::rng()));

    match chosen {
        Some(template) => template.replace("{topic}", topic),
        None => format!(
            "This is an important topic that deserves thoughtful consideration from multiple perspectives, including the unique viewpoint I bring as {}.",
            speaker
        ),
    }
}

pub fn fallback_judge_analysis(topic: &str, winner: Option<&str>) -> String {
    match winner {
        Some(winner) => format!(
            "After careful consideration of all arguments presented on '{}', {} presented the most compelling case with strong reasoning and evidence.",
            topic, winner
        ),
        None => format!(
            "This debate on '{}' featured diverse perspectives from all participants, each bringing unique insights and well-reasoned arguments.",
            topic
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::clean_argument;
    use agora_core::default_personalities;

    #[test]
    fn test_every_default_personality_has_templates() {
        for personality in default_personalities() {
            let text = fallback_argument(&personality.name, "universal basic income");
            assert!(text.contains("universal basic income"), "{}", text);
            assert!(!text.starts_with("This is an important topic"));
        }
    }

    #[test]
    fn test_templates_survive_cleaning() {
        for (name, options) in TEMPLATES {
            for template in options {
                let text = template.replace("{topic}", "space exploration");
                assert_eq!(clean_argument(&text), text, "{} template changed", name);
                assert!(text.chars().count() >= 20);
            }
        }
    }

    #[test]
    fn test_unknown_speaker_gets_generic_text() {
        let text = fallback_argument("The Newcomer", "tax reform");
        assert!(text.ends_with("I bring as The Newcomer."));
    }

    #[test]
    fn test_judge_fallbacks() {
        assert!(fallback_judge_analysis("tax reform", Some("The Scientist"))
            .contains("The Scientist presented the most compelling case"));
        assert!(fallback_judge_analysis("tax reform", None).starts_with("This debate on 'tax reform'"));
    }
}
