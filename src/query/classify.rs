//! Three-way query classifier deciding between small talk, code help, and
//! document-grounded retrieval.
//!
//! This is the alternate entry point to the router: instead of picking a model
//! tier for a grounded answer, it decides whether retrieval is warranted at
//! all. Small-talk and code questions bypass the retriever entirely. A leading
//! `doc:`/`rag:`/`code:`/`codigo:`/`código:` prefix is stripped and forces the
//! category for the remaining text.

/// Category assigned to a query by [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryCategory {
    /// Greetings and light conversation; answered directly by the balanced model.
    SmallTalk,
    /// Programming question; answered directly by the code model.
    Code,
    /// Question about the user's documents; answered through retrieval.
    Documents,
    /// Anything else; answered directly by the balanced model.
    General,
}

/// Classification outcome: the category plus the text with any forcing prefix removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Assigned category.
    pub category: QueryCategory,
    /// Question text, stripped of a forcing prefix when one was present.
    pub text: String,
}

const GREETINGS: &[&str] = &[
    "hola",
    "hola!",
    "buenas",
    "buenas!",
    "buenas tardes",
    "buenas noches",
    "buenos dias",
    "buenos días",
    "que tal",
    "qué tal",
    "como estas",
    "cómo estás",
    "como has estado",
    "cómo has estado",
    "hi",
    "hello",
    "hey",
];

const SMALL_TALK_MAX_WORDS: usize = 8;

const CODE_KEYWORDS: &[&str] = &[
    "python",
    "c#",
    "c++",
    "java",
    "javascript",
    "typescript",
    "powershell",
    "bash",
    "shell",
    "sql",
    "código",
    "codigo",
    "script",
    "programa",
    "programación",
    "programacion",
    "función",
    "funcion",
    "clase",
    "método",
    "metodo",
    "error",
    "bug",
    "traceback",
    "stack trace",
    "exception",
    "excepción",
    "import ",
    "def ",
    "class ",
    "console.log",
    "try:",
    "except",
    "for (",
    "while (",
];

const DOC_PHRASES: &[&str] = &[
    "revisa en mis documentos",
    "revisar en mis documentos",
    "busca en mis documentos",
    "buscar en mis documentos",
    "usa mis documentos",
    "utiliza mis documentos",
    "usa mis apuntes",
    "utiliza mis apuntes",
    "en mis documentos",
    "en mis apuntes",
    "en mis archivos",
    "en mis pdf",
    "en mis pdfs",
    "según el documento",
    "segun el documento",
    "según el pdf",
    "segun el pdf",
    "según mis apuntes",
    "segun mis apuntes",
    "según el texto",
    "segun el texto",
    "en el documento",
    "en el pdf",
    "en este pdf",
    "en este documento",
    "en ese documento",
    "en ese pdf",
    "en el archivo",
    "en este archivo",
    "en ese archivo",
    "del documento",
    "del pdf",
    "del archivo",
    "según lo que dice el documento",
    "segun lo que dice el documento",
    "según el material",
    "segun el material",
    "según la lectura",
    "segun la lectura",
];

const PAGE_WORDS: &[&str] = &["página", "pagina", "capítulo", "capitulo"];
const DOCUMENT_WORDS: &[&str] = &["documento", "pdf", "archivo", "apuntes"];

/// Classify a question, stripping a category-forcing prefix when present.
pub fn classify(question: &str) -> Classification {
    let trimmed = question.trim();
    let lower = trimmed.to_lowercase();

    for prefix in ["doc:", "rag:"] {
        if lower.starts_with(prefix) {
            return Classification {
                category: QueryCategory::Documents,
                text: trimmed[prefix.len()..].trim().to_string(),
            };
        }
    }
    for prefix in ["codigo:", "código:", "code:"] {
        if let Some(stripped) = strip_prefix_ci(trimmed, &lower, prefix) {
            return Classification {
                category: QueryCategory::Code,
                text: stripped,
            };
        }
    }

    let category = if is_small_talk(&lower) {
        QueryCategory::SmallTalk
    } else if is_code_question(&lower) {
        QueryCategory::Code
    } else if is_doc_question(&lower) {
        QueryCategory::Documents
    } else {
        QueryCategory::General
    };

    Classification {
        category,
        text: trimmed.to_string(),
    }
}

fn strip_prefix_ci(original: &str, lower: &str, prefix: &str) -> Option<String> {
    if lower.starts_with(prefix) {
        Some(original[prefix.len()..].trim().to_string())
    } else {
        None
    }
}

fn is_small_talk(lower: &str) -> bool {
    lower.split_whitespace().count() <= SMALL_TALK_MAX_WORDS
        && GREETINGS.iter().any(|greeting| lower.contains(greeting))
}

fn is_code_question(lower: &str) -> bool {
    if lower.contains("```") {
        return true;
    }
    CODE_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

fn is_doc_question(lower: &str) -> bool {
    if DOC_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        return true;
    }

    // Mentions of a page or chapter together with a document word also count.
    PAGE_WORDS.iter().any(|word| lower.contains(word))
        && DOCUMENT_WORDS.iter().any(|word| lower.contains(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_is_small_talk() {
        let result = classify("hola que tal");
        assert_eq!(result.category, QueryCategory::SmallTalk);
        assert_eq!(result.text, "hola que tal");
    }

    #[test]
    fn long_text_with_greeting_is_not_small_talk() {
        let result =
            classify("hola necesito que revises el informe del trimestre pasado con mucho detalle");
        assert_ne!(result.category, QueryCategory::SmallTalk);
    }

    #[test]
    fn code_fence_forces_code_category() {
        let result = classify("que hace esto ```print(1)```");
        assert_eq!(result.category, QueryCategory::Code);
    }

    #[test]
    fn code_keyword_detected() {
        let result = classify("tengo un bug en mi aplicacion");
        assert_eq!(result.category, QueryCategory::Code);
    }

    #[test]
    fn doc_phrase_detected() {
        let result = classify("busca en mis documentos la politica de respaldos");
        assert_eq!(result.category, QueryCategory::Documents);
    }

    #[test]
    fn page_plus_document_cooccurrence_detected() {
        let result = classify("que dice la pagina 12 del pdf de contratos");
        assert_eq!(result.category, QueryCategory::Documents);
    }

    #[test]
    fn doc_prefix_forces_documents_and_strips() {
        let result = classify("doc: hola");
        assert_eq!(result.category, QueryCategory::Documents);
        assert_eq!(result.text, "hola");

        let result = classify("rag: resume mis notas");
        assert_eq!(result.category, QueryCategory::Documents);
        assert_eq!(result.text, "resume mis notas");
    }

    #[test]
    fn code_prefix_forces_code_and_strips() {
        let result = classify("código: como ordeno una lista");
        assert_eq!(result.category, QueryCategory::Code);
        assert_eq!(result.text, "como ordeno una lista");
    }

    #[test]
    fn neutral_question_defaults_to_general() {
        let result = classify("cuanto cuesta un litro de leche");
        assert_eq!(result.category, QueryCategory::General);
    }
}
