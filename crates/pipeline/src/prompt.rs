//! Prompt assembly.
//!
//! Builds the message list sent to a provider: one system message carrying
//! the persona and the retrieved context, the recent turns, then the query.
//!
//! # Determinism
//!
//! Assembly is a pure function of its input. Identical inputs always produce
//! identical messages; nothing time-dependent or random is used.

use strata_core::{ChatMessage, ContextBundle, Error, LayerId, LayerResult, PersonaConfig, TenantScope, Turn};

/// Placeholder for a layer that returned nothing.
pub const EMPTY_LAYER: &str = "(no relevant information)";

/// Placeholder for an empty conversation history.
pub const EMPTY_HISTORY: &str = "(first conversation)";

// ── Types ─────────────────────────────────────────────────────────────────

/// Everything the assembler reads.
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub persona: &'a PersonaConfig,
    pub bundle: &'a ContextBundle,
    pub query_text: &'a str,
    pub recent_turns: &'a [Turn],
    /// Supplies the client display name for the identity line.
    pub scope: &'a TenantScope,
}

// ── Assembler ─────────────────────────────────────────────────────────────

/// Stateless prompt builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptAssembler;

impl PromptAssembler {
    /// Build the message list. Fails only when the persona is incomplete.
    pub fn assemble(input: &PromptInput<'_>) -> Result<Vec<ChatMessage>, Error> {
        input.persona.validate()?;

        let mut messages = Vec::with_capacity(input.recent_turns.len() + 2);
        messages.push(ChatMessage::system(system_prompt(input)));
        messages.extend(input.recent_turns.iter().filter_map(Turn::to_message));
        messages.push(ChatMessage::user(input.query_text.trim()));
        Ok(messages)
    }
}

fn system_prompt(input: &PromptInput<'_>) -> String {
    let persona = input.persona;
    let client_name = input
        .scope
        .client_name()
        .unwrap_or(persona.default_client_name.as_str());

    let mut out = format!(
        "You are {}, the assistant of {}.\n\n{}\n\nYou are answering on behalf of {}.",
        persona.persona_name.trim(),
        persona.institution_name.trim(),
        persona.base_instructions.trim(),
        client_name,
    );

    if !input.bundle.is_empty() {
        out.push_str("\n\n<context>");
        for result in input.bundle.iter() {
            out.push_str("\n\n");
            render_section(&mut out, result, client_name);
        }
        out.push_str("\n</context>");
    }
    out
}

fn render_section(out: &mut String, result: &LayerResult, client_name: &str) {
    let id = result.layer_id;
    match id {
        LayerId::Client => out.push_str(&format!("[{id}] {} ({client_name})", id.label())),
        _ => out.push_str(&format!("[{id}] {}", id.label())),
    }

    if result.chunks.is_empty() {
        out.push('\n');
        out.push_str(if id == LayerId::History {
            EMPTY_HISTORY
        } else {
            EMPTY_LAYER
        });
        return;
    }

    for chunk in &result.chunks {
        out.push('\n');
        if id == LayerId::History {
            out.push_str(chunk.text.trim());
        } else {
            out.push_str(&format!("- {} (source: {})", chunk.text.trim(), chunk.source));
        }
    }
}
