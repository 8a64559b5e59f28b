//! Prompt templates, query composition, and retrieval-context assembly.
//!
//! Everything that turns a scenario and a set of precedent matches into the
//! text sent upstream lives here, along with the hard limits on how much of
//! the client's input each call may see.

use crate::model::PrecedentMatch;

/// Maximum scenario characters forwarded to the drilling call.
pub const DRILL_MAX_CHARS: usize = 1500;

/// Maximum composed-query characters forwarded to the embedding call.
pub const EMBED_MAX_CHARS: usize = 8000;

/// Context substituted when retrieval produced nothing.
pub const NO_PRECEDENT_CONTEXT: &str = "No directly relevant internal precedents found. \
Respond based on Nigerian statutory law and general commercial law principles.";

const SYSTEM_PROMPT: &str = r#"You are the Clearwater Intelligence Desk — the AI advisory interface of Clearwater Partners, a Nigerian commercial law firm headquartered in Ado-Ekiti, Ekiti State, with network coverage across Nigeria. The firm specialises in corporate advisory, capital markets, M&A, regulatory compliance, and dispute resolution. We represent the full commercial spectrum — from sole proprietors and startups to multinationals and institutions.

You are a RAG-augmented legal reasoning engine. Draw analysis first from the firm's internal precedents (provided below), then from Nigerian statutes and regulatory frameworks.

KEY STATUTORY REFERENCES:
- CAMA 2020 (Companies and Allied Matters Act) and the Companies Regulations 2021
- NDPA 2023 (Nigeria Data Protection Act) and NDPC guidelines
- BOFIA 2020 (Banks and Other Financial Institutions Act)
- FIRS Transfer Pricing Regulations and BEPS implementation
- Investment and Securities Act 2007 (and the 2024 Amendment)
- Land Use Act 1978
- Arbitration and Mediation Act 2023
- Ekiti State Laws (for matters with local jurisdiction)
- CBN, SEC, FCCPC, NCC, NERC, and CAC regulatory frameworks

INTERNAL PRECEDENTS (retrieved from firm documents):
{context}

CORE RULES:
1. ACCURACY FIRST — If a precedent is relevant, cite the specific file name (e.g. "per the firm's precedent in [file_name]..."). Never cite a document not in the context above.
2. NO HALLUCINATIONS — If a matter is not addressed in the provided context or Nigerian statutes, state: "This specific issue is not covered in the firm's current internal precedents — a partner would need to advise directly."
3. HUMAN-CENTRIC LENS — Analyse through the client's commercial objectives and business health, not merely technical compliance.
4. PRINCIPAL-LED TONE — Authoritative, analytically precise, and reassuring. Direct. Never casual.
5. NIGERIAN REGULATORY PRECISION — Specify which regulator and which statutory provision governs each point.

MANDATORY RESPONSE STRUCTURE:

**Legal Issue**
One sentence identifying the core legal question.

**Analysis**
2–3 paragraphs of substantive legal reasoning. Reference firm precedents and Nigerian statutes. Be specific about provisions, timelines, and thresholds.

**Strategic Considerations**
- [First commercial or risk consideration]
- [Second consideration]
- [Third consideration, if applicable]

**Action Items**
1. [Concrete next step with any deadline or filing requirement]
2. [Next step]
3. [Next step]

**Disclaimer**
This preliminary analysis is provided for orientation purposes only and does not constitute legal advice. Contact the Intelligence Desk to engage Clearwater Partners formally."#;

const DRILLING_PROMPT: &str = r#"You are the intake assistant at Clearwater Intelligence Desk — the AI interface of Clearwater Partners, a Nigerian commercial law firm.

A prospective client has described a legal matter. Generate exactly 2 high-value clarifying questions. The questions must:
- Be specific to the matter described (not generic)
- Target the key legal distinctions that determine the applicable Nigerian statutory framework (e.g. public vs. private company, nature of the asset, existing encumbrances, jurisdictional considerations)
- Draw on Nigerian law specifics: CAMA 2020, CBN/SEC licensing, Land Use Act, Ekiti State Laws, etc.
- Be concise (one sentence each)

Respond ONLY with valid JSON in this exact format, no other text:
{"questions": ["First question?", "Second question?"]}

Matter submitted by client:
{scenario}"#;

/// Scenario text plus assembled retrieval context and its citation set.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledContext {
    pub context: String,
    /// Deduplicated source file names, first-seen order. The only sources the
    /// generator is allowed to imply it used.
    pub sources: Vec<String>,
}

/// Truncate on a character boundary. Longer input is cut silently, never
/// rejected.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// The query string used for embedding: scenario plus formatted
/// clarification answers when present.
pub fn compose_query(scenario: &str, clarifications: Option<&str>) -> String {
    match clarifications {
        Some(c) if !c.trim().is_empty() => {
            format!("{}\n\nClient clarifications:\n{}", scenario.trim(), c)
        }
        _ => scenario.trim().to_string(),
    }
}

/// The user message for the generation call.
pub fn user_message(scenario: &str, clarifications: Option<&str>) -> String {
    match clarifications {
        Some(c) if !c.trim().is_empty() => {
            format!("Client matter:\n{scenario}\n\nClient's clarifications:\n{c}")
        }
        _ => format!("Client matter:\n{scenario}"),
    }
}

/// Render the retrieved matches as labeled context blocks and collect the
/// citation set. Falls back to the statute-only sentence when nothing was
/// retrieved.
pub fn assemble_context(matches: &[PrecedentMatch]) -> AssembledContext {
    if matches.is_empty() {
        return AssembledContext {
            context: NO_PRECEDENT_CONTEXT.to_string(),
            sources: Vec::new(),
        };
    }

    let mut sources: Vec<String> = Vec::new();
    let blocks: Vec<String> = matches
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            if !sources.contains(&doc.file_name) {
                sources.push(doc.file_name.clone());
            }
            let attribution = match &doc.partner_author {
                Some(author) => format!("{} (authored by {})", doc.file_name, author),
                None => doc.file_name.clone(),
            };
            format!(
                "[Document {} — {} | Relevance: {:.0}%]\n{}",
                i + 1,
                attribution,
                doc.similarity * 100.0,
                doc.content
            )
        })
        .collect();

    AssembledContext {
        context: blocks.join("\n\n---\n\n"),
        sources,
    }
}

/// The analysis system prompt with the retrieval context interpolated.
pub fn system_prompt(context: &str) -> String {
    SYSTEM_PROMPT.replace("{context}", context)
}

/// The drilling prompt with the (truncated) scenario interpolated.
pub fn drilling_prompt(scenario: &str) -> String {
    DRILLING_PROMPT.replace("{scenario}", truncate_chars(scenario, DRILL_MAX_CHARS))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(file_name: &str, author: Option<&str>, similarity: f32) -> PrecedentMatch {
        PrecedentMatch {
            content: format!("chunk from {file_name}"),
            file_name: file_name.to_string(),
            partner_author: author.map(str::to_string),
            similarity,
        }
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        // Multi-byte characters must not be split mid-codepoint.
        let text = "ééééé";
        assert_eq!(truncate_chars(text, 3), "ééé");
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[test]
    fn drilling_prompt_never_exceeds_limit() {
        let scenario = "x".repeat(DRILL_MAX_CHARS * 2);
        let prompt = drilling_prompt(&scenario);
        let embedded_scenario = prompt.rsplit('\n').next().unwrap();
        assert_eq!(embedded_scenario.chars().count(), DRILL_MAX_CHARS);
    }

    #[test]
    fn compose_query_appends_clarifications() {
        let query = compose_query("  my matter  ", Some("Q: a?\nA: b"));
        assert_eq!(query, "my matter\n\nClient clarifications:\nQ: a?\nA: b");

        assert_eq!(compose_query("my matter", None), "my matter");
        assert_eq!(compose_query("my matter", Some("   ")), "my matter");
    }

    #[test]
    fn context_renders_labeled_blocks() {
        let assembled = assemble_context(&[doc("memo.md", Some("A. Balogun"), 0.914)]);

        assert!(assembled
            .context
            .starts_with("[Document 1 — memo.md (authored by A. Balogun) | Relevance: 91%]"));
        assert!(assembled.context.contains("chunk from memo.md"));
        assert_eq!(assembled.sources, vec!["memo.md"]);
    }

    #[test]
    fn sources_deduplicated_in_first_seen_order() {
        let assembled = assemble_context(&[
            doc("b.md", None, 0.9),
            doc("a.md", None, 0.8),
            doc("b.md", None, 0.7),
        ]);

        assert_eq!(assembled.sources, vec!["b.md", "a.md"]);
        assert!(assembled.context.contains("[Document 3 — b.md"));
        assert!(assembled.context.contains("\n\n---\n\n"));
    }

    #[test]
    fn empty_matches_fall_back_to_statute_only_context() {
        let assembled = assemble_context(&[]);
        assert_eq!(assembled.context, NO_PRECEDENT_CONTEXT);
        assert!(assembled.sources.is_empty());
    }

    #[test]
    fn system_prompt_interpolates_context() {
        let rendered = system_prompt("THE CONTEXT");
        assert!(rendered.contains("INTERNAL PRECEDENTS (retrieved from firm documents):\nTHE CONTEXT"));
        assert!(!rendered.contains("{context}"));
        assert!(rendered.contains("**Disclaimer**"));
    }
}
