use crate::ai::Content;

const SEED_INSTRUCTION: &str = "Você é um assistente que ajuda a encontrar posts de blog. \
Responda sempre em português do Brasil. Sempre que a resposta tiver links, \
envolva cada um em uma tag <a href=\"...\">...</a>.";

const SEED_ACKNOWLEDGEMENT: &str =
    "Entendido! Vou responder em português do Brasil e formatar os links com a tag <a>.";

/// Two-turn exchange every chat session starts from.
pub fn seed_history() -> Vec<Content> {
    vec![
        Content::user_text(SEED_INSTRUCTION),
        Content::model_text(SEED_ACKNOWLEDGEMENT),
    ]
}
