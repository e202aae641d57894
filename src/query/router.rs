//! Heuristic routing of a cleaned question to one of three model tiers.
//!
//! The router is a deliberately cheap, explainable heuristic rather than a learned
//! classifier: users retain deterministic manual control via prefixes, and the
//! default path stays fast for short or neutral questions. Decision order, first
//! match wins:
//!
//! 1. Explicit prefix override (`/phi `, `/code `, `/llama `).
//! 2. Programming keyword → Code tier.
//! 3. Word count below the short-query threshold → Balanced tier.
//! 4. Analysis keyword → Main tier.
//! 5. Default → Balanced tier.

/// Downstream model tier selectable by the router. Concrete model names live in
/// configuration only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// Strong model for deep analysis and grounded answers.
    Main,
    /// Model tuned for programming questions.
    Code,
    /// Balanced general-purpose model.
    Balanced,
}

/// Keyword sets and thresholds driving the routing heuristic, kept as data so
/// the lists can be tested and localized without touching the decision logic.
#[derive(Debug, Clone)]
pub struct RouterRules {
    /// Substrings that mark a question as programming-related.
    pub code_keywords: &'static [&'static str],
    /// Substrings that mark a long question as deep analysis.
    pub analysis_keywords: &'static [&'static str],
    /// Questions shorter than this many words go to the balanced tier.
    pub short_query_words: usize,
}

const CODE_KEYWORDS: &[&str] = &[
    "codigo",
    "código",
    "code",
    "java",
    "python",
    "script",
    "funcion",
    "función",
    "método",
    "error de compilación",
    "stack trace",
    "excepcion",
    "excepción",
];

const ANALYSIS_KEYWORDS: &[&str] = &[
    "analiza",
    "analizar",
    "riesgos",
    "resumen",
    "conclusiones",
    "detallado",
    "explicame",
    "explícame",
    "profundo",
    "hardening",
    "plan",
    "arquitectura",
    "diseño",
];

impl Default for RouterRules {
    fn default() -> Self {
        Self {
            code_keywords: CODE_KEYWORDS,
            analysis_keywords: ANALYSIS_KEYWORDS,
            short_query_words: 10,
        }
    }
}

/// Route a cleaned question using the default rules.
pub fn route(question: &str) -> ModelTier {
    route_with_rules(&RouterRules::default(), question)
}

/// Route a cleaned question using the supplied rules.
pub fn route_with_rules(rules: &RouterRules, question: &str) -> ModelTier {
    let lower = question.trim().to_lowercase();

    // Manual prefixes beat every content signal.
    if lower.starts_with("/phi ") {
        return ModelTier::Main;
    }
    if lower.starts_with("/code ") {
        return ModelTier::Code;
    }
    if lower.starts_with("/llama ") {
        return ModelTier::Balanced;
    }

    if rules.code_keywords.iter().any(|word| lower.contains(word)) {
        return ModelTier::Code;
    }

    if lower.split_whitespace().count() < rules.short_query_words {
        return ModelTier::Balanced;
    }

    if rules
        .analysis_keywords
        .iter()
        .any(|word| lower.contains(word))
    {
        return ModelTier::Main;
    }

    ModelTier::Balanced
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_override_beats_keywords() {
        assert_eq!(route("/llama analiza los riesgos de este codigo python detallado por favor ahora mismo"), ModelTier::Balanced);
        assert_eq!(route("/phi hola"), ModelTier::Main);
        assert_eq!(route("/code hola"), ModelTier::Code);
    }

    #[test]
    fn prefix_requires_trailing_space() {
        // "/phi" alone is an ordinary short question.
        assert_eq!(route("/phi"), ModelTier::Balanced);
    }

    #[test]
    fn prefix_is_case_insensitive() {
        assert_eq!(route("/PHI analiza esto"), ModelTier::Main);
    }

    #[test]
    fn code_keywords_route_to_code_tier() {
        assert_eq!(route("tengo un error de compilación en java"), ModelTier::Code);
        assert_eq!(route("revisa este script"), ModelTier::Code);
    }

    #[test]
    fn short_questions_route_to_balanced() {
        assert_eq!(route("resume mis politicas"), ModelTier::Balanced);
        assert_eq!(route("que hora es"), ModelTier::Balanced);
    }

    #[test]
    fn long_analysis_questions_route_to_main() {
        assert_eq!(
            route("necesito que hagas un resumen detallado de todos los documentos de este trimestre"),
            ModelTier::Main
        );
    }

    #[test]
    fn long_neutral_questions_default_to_balanced() {
        assert_eq!(
            route("cuentame que paso con el proyecto durante la semana pasada y la anterior tambien"),
            ModelTier::Balanced
        );
    }
}
