//! Deterministic assembly of a grounded prompt from retrieved fragments.
//!
//! Re-running assembly on the same fragment sequence and question always yields
//! byte-identical output; callers rely on this for caching and testing. When no
//! fragment survived retrieval the prompt carries an explicit no-context notice
//! instead, so the model discloses that it is answering from general knowledge.

use crate::query::retrieve::Fragment;

/// System instruction sent with every grounded chat call.
pub const GROUNDED_SYSTEM_PROMPT: &str = "Eres un asistente técnico. \
    Si usas información de los fragmentos, cítala de forma clara. \
    Si no hay información suficiente en el contexto, dilo.";

/// Render the retrieved fragments (or the no-context notice) plus the question
/// into a single prompt.
pub fn build_prompt(fragments: &[Fragment], question: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    if fragments.is_empty() {
        parts.push(
            "No se encontró contexto relevante en la base de documentos para esta pregunta.\n\
             Responde solo con tu conocimiento general y aclara que no hay contexto.\n"
                .to_string(),
        );
    } else {
        parts.push(
            "A continuación tienes fragmentos de contexto de mis documentos.\n\
             Cada fragmento indica de qué archivo proviene:\n"
                .to_string(),
        );
        for (position, fragment) in fragments.iter().enumerate() {
            let source = if fragment.metadata.source.is_empty() {
                "desconocido"
            } else {
                fragment.metadata.source.as_str()
            };
            parts.push(format!(
                "[FRAGMENTO {} | {} | chunk {}]\n{}\n",
                position + 1,
                source,
                fragment.metadata.chunk_index,
                fragment.text
            ));
        }
        parts.push(
            "\nUsa estos fragmentos SOLO si son relevantes. \
             Si no son suficientes, dilo claramente.\n"
                .to_string(),
        );
    }

    parts.push("\n[PREGUNTA DEL USUARIO]\n".to_string());
    parts.push(question.to_string());

    parts.join("\n")
}
