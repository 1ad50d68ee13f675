//! Domain registry: the closed set of specialist domains, their system
//! prompts, and the shared router/grader/refine prompt text.
//!
//! Prompts are kept in Spanish, matching the register of the original
//! procurement-analyst personas this engine is grounded on.

use serde::{Deserialize, Serialize};

/// The closed set of domains a question can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Legal/contractual clauses and obligations.
    Legal,
    /// Technical requirements and architecture.
    Technical,
    /// Pricing, budgets, and financial terms.
    Financial,
    /// Deadlines, milestones, and scheduling.
    Timeline,
    /// Formal/functional requirements extraction.
    Requirements,
    /// Fallback domain for anything not otherwise classified.
    General,
    /// Numeric/tabular analysis (charts, distributions).
    Quantitative,
    /// Sentinel used before a real domain has been assigned.
    None,
}

impl Domain {
    /// Parses a router response into a domain, normalizing case and
    /// whitespace. Unknown tokens fall back to [`Domain::General`].
    #[must_use]
    pub fn parse_routed(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "legal" => Self::Legal,
            "technical" | "tecnico" | "técnico" => Self::Technical,
            "financial" | "financiero" => Self::Financial,
            "timeline" | "cronograma" => Self::Timeline,
            "requirements" | "requisitos" => Self::Requirements,
            "quantitative" | "cuantitativo" => Self::Quantitative,
            _ => Self::General,
        }
    }

    /// The wire/prompt-registry key for this domain.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Legal => "legal",
            Self::Technical => "technical",
            Self::Financial => "financial",
            Self::Timeline => "timeline",
            Self::Requirements => "requirements",
            Self::General => "general",
            Self::Quantitative => "quantitative",
            Self::None => "none",
        }
    }

    /// Whether this domain has a registered specialist prompt.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Coerces a stray `Quantitative` routing into `General`, used by the
    /// specialist node when the router misfires but `quant` did not run.
    #[must_use]
    pub const fn coerce_for_specialist(self) -> Self {
        match self {
            Self::Quantitative | Self::None => Self::General,
            other => other,
        }
    }

    /// The domain's system prompt, without the shared response-format clause.
    #[must_use]
    pub const fn system_prompt(self) -> &'static str {
        match self {
            Self::Legal => LEGAL_PROMPT,
            Self::Technical => TECHNICAL_PROMPT,
            Self::Financial => FINANCIAL_PROMPT,
            Self::Timeline => TIMELINE_PROMPT,
            Self::Requirements => REQUIREMENTS_PROMPT,
            Self::General | Self::None => GENERAL_PROMPT,
            Self::Quantitative => GENERAL_PROMPT,
        }
    }

    /// The domain's full prompt, with the shared response-format clause
    /// appended unless `include_format` is `false`.
    #[must_use]
    pub fn full_prompt(self, include_format: bool) -> String {
        if include_format {
            format!("{}\n\n{RESPONSE_FORMAT_CLAUSE}", self.system_prompt())
        } else {
            self.system_prompt().to_string()
        }
    }
}

/// Looks up the prompt for a domain name, falling back to [`Domain::General`]
/// for unknown or empty names.
#[must_use]
pub fn prompt(name: &str) -> &'static str {
    Domain::parse_routed(name).system_prompt()
}

const RESPONSE_FORMAT_CLAUSE: &str = "Responde en español, de forma clara y concisa, citando \
el documento y la página cuando sea posible. No inventes información que no esté en el contexto.";

const LEGAL_PROMPT: &str = "Eres un analista legal especializado en contratos de licitación \
pública y privada. Tu tarea es revisar cláusulas contractuales, obligaciones, penalidades, \
garantías y condiciones legales dentro de los documentos de la licitación, identificando riesgos \
y ambigüedades para el equipo de oferta.";

const TECHNICAL_PROMPT: &str = "Eres un analista técnico especializado en requisitos de \
arquitectura, infraestructura y especificaciones de producto dentro de licitaciones. Evalúas \
factibilidad técnica, stack tecnológico requerido y brechas frente a las capacidades del \
proponente.";

const FINANCIAL_PROMPT: &str = "Eres un analista financiero especializado en licitaciones. \
Evalúas presupuestos, estructuras de pago, garantías financieras, penalidades económicas y \
tablas de precios, señalando cualquier condición financiera inusual o desfavorable.";

const TIMELINE_PROMPT: &str = "Eres un analista de cronogramas especializado en licitaciones. \
Identificas fechas límite, hitos, plazos de entrega y dependencias temporales, señalando \
cronogramas ajustados o contradictorios entre secciones del documento.";

const REQUIREMENTS_PROMPT: &str = "Eres un analista de requisitos especializado en licitaciones. \
Extraes requisitos formales y funcionales explícitos e implícitos, clasificándolos por \
obligatoriedad (excluyente, deseable) y por área responsable.";

const GENERAL_PROMPT: &str = "Eres un asistente experto en licitaciones y procesos de \
contratación pública. Respondes preguntas generales sobre el contenido de los documentos de \
licitación cargados, sin especializarte en un área particular.";

/// Router prompt: classifies a question into one of the closed domains.
pub const ROUTER_PROMPT: &str = "Clasifica la siguiente pregunta en uno de estos dominios: \
legal, technical, financial, timeline, requirements, quantitative, general. Si la pregunta pide \
datos numéricos, comparaciones, porcentajes o series temporales, responde 'quantitative'. \
Responde únicamente con el nombre del dominio, en minúsculas, sin explicación adicional.\n\n\
Pregunta: {question}";

/// Batched grader prompt: classifies every retrieved document as relevant
/// or not relevant to the question.
pub const GRADER_PROMPT_BATCH: &str = "Evalúa la relevancia de cada uno de los siguientes \
documentos respecto a la pregunta del usuario. Para cada documento responde en una línea con el \
formato exacto '<indice>:<relevant|not_relevant>'. No agregues explicaciones ni texto adicional.\n\n\
Pregunta: {question}\n\nDocumentos:\n{documents}";

/// Refine prompt: regenerates an answer that failed the risk audit.
pub const REFINE_PROMPT: &str = "La siguiente respuesta fue marcada como riesgosa o no conforme \
por una auditoría de cumplimiento. Revisa el contexto y la respuesta original, corrige los \
problemas señalados y genera una versión mejorada, manteniendo el mismo idioma y el mismo nivel \
de detalle.\n\nProblemas detectados:\n{issues}\n\nContexto:\n{context}\n\nPregunta: {question}\n\n\
Respuesta original:\n{answer}";

/// Keyword set used by the grader's data-heavy safety net (case-insensitive
/// substring match against the question).
pub const DATA_HEAVY_KEYWORDS: &[&str] = &[
    "fecha",
    "cronograma",
    "plazo",
    "calendario",
    "hito",
    "presupuesto",
    "monto",
    "garantia",
    "pago",
    "financier",
    "tabla",
    "porcentaje",
    "%",
    "usd",
    "ars",
    "cantidad",
    "cuanto",
    "cuando",
    "timeline",
    "schedule",
];

/// Returns `true` if the question matches any data-heavy keyword.
#[must_use]
pub fn is_data_heavy_question(question: &str) -> bool {
    let lower = question.to_lowercase();
    DATA_HEAVY_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Fixed response emitted verbatim when retrieval returns zero documents.
pub const NO_DOCUMENTS_MESSAGE: &str = "No hay documentos cargados en el sistema.\n\n\
Para poder responder tu pregunta, por favor:\n\n\
1. **Sube uno o más documentos PDF** usando el área de carga en la interfaz\n\
2. Espera a que se procesen los documentos\n\
3. Vuelve a hacer tu pregunta\n\n\
Una vez que hayas cargado los documentos de licitación, podré analizar y responder preguntas \
específicas sobre su contenido.";

/// Marker substring identifying the no-documents message, used by the risk
/// sentinel's auto-approval short-circuit.
pub const NO_DOCUMENTS_MARKER: &str = "no hay documentos";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_routed_known() {
        assert_eq!(Domain::parse_routed("Legal"), Domain::Legal);
        assert_eq!(Domain::parse_routed(" QUANTITATIVE "), Domain::Quantitative);
    }

    #[test]
    fn test_parse_routed_unknown_falls_back_to_general() {
        assert_eq!(Domain::parse_routed("astrology"), Domain::General);
        assert_eq!(Domain::parse_routed(""), Domain::General);
    }

    #[test]
    fn test_coerce_for_specialist() {
        assert_eq!(
            Domain::Quantitative.coerce_for_specialist(),
            Domain::General
        );
        assert_eq!(Domain::Legal.coerce_for_specialist(), Domain::Legal);
    }

    #[test]
    fn test_is_valid() {
        assert!(Domain::Legal.is_valid());
        assert!(!Domain::None.is_valid());
    }

    #[test]
    fn test_full_prompt_appends_format_clause() {
        let full = Domain::Legal.full_prompt(true);
        assert!(full.contains(RESPONSE_FORMAT_CLAUSE));
        let bare = Domain::Legal.full_prompt(false);
        assert!(!bare.contains(RESPONSE_FORMAT_CLAUSE));
    }

    #[test]
    fn test_prompt_lookup_unknown_name() {
        assert_eq!(prompt("unknown-domain"), GENERAL_PROMPT);
    }

    #[test]
    fn test_is_data_heavy_question() {
        assert!(is_data_heavy_question("Cual es el presupuesto total?"));
        assert!(is_data_heavy_question("When is the deadline (timeline)?"));
        assert!(!is_data_heavy_question("Que dice la clausula de confidencialidad?"));
    }

    #[test]
    fn test_no_documents_message_marker_matches() {
        assert!(
            NO_DOCUMENTS_MESSAGE
                .to_lowercase()
                .contains(NO_DOCUMENTS_MARKER)
        );
    }
}
