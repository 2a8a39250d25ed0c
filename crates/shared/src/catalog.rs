//! Built-in style catalog offered by the front-end.

use crate::domain::Style;

const STYLES: &[(&str, &str, &str, &str)] = &[
    (
        "anime",
        "Anime",
        "Redraw this photo as a vibrant anime illustration with clean line art, cel shading and expressive eyes. Keep the subject and composition recognizable.",
        "Write a short, playful one-sentence caption for an anime-style portrait, as if it were the title card of a new series.",
    ),
    (
        "watercolor",
        "Watercolor",
        "Repaint this photo as a loose watercolor painting with soft bleeding edges, visible paper texture and a muted pastel palette.",
        "Write a gentle, poetic one-sentence caption for a watercolor painting.",
    ),
    (
        "cyberpunk",
        "Cyberpunk",
        "Transform this photo into a neon-drenched cyberpunk scene at night with holographic signage, rain-slick reflections and chrome details.",
        "Write a gritty one-sentence caption for a cyberpunk character portrait, in the voice of a noir narrator.",
    ),
    (
        "pixel-art",
        "Pixel Art",
        "Convert this photo into 16-bit pixel art with a limited palette, crisp pixels and no anti-aliasing, like a classic console sprite.",
        "Write a one-sentence caption for a retro video game character select screen.",
    ),
    (
        "renaissance",
        "Renaissance",
        "Repaint this photo as an oil painting in the style of the Italian Renaissance, with chiaroscuro lighting, rich fabrics and a classical background.",
        "Write a grand, slightly humorous one-sentence museum placard caption for a Renaissance portrait.",
    ),
    (
        "claymation",
        "Claymation",
        "Rebuild this photo as a stop-motion claymation scene with handmade plasticine textures, fingerprints and soft studio lighting.",
        "Write a cheerful one-sentence caption for a claymation short film still.",
    ),
];

pub fn builtin_styles() -> Vec<Style> {
    STYLES
        .iter()
        .map(|(id, label, image_prompt, caption_prompt)| Style {
            id: (*id).to_string(),
            label: (*label).to_string(),
            image_prompt: (*image_prompt).to_string(),
            caption_prompt: (*caption_prompt).to_string(),
        })
        .collect()
}

/// Case-insensitive lookup by id or label.
pub fn find_style(id_or_label: &str) -> Option<Style> {
    let needle = id_or_label.trim();
    builtin_styles().into_iter().find(|style| {
        style.id.eq_ignore_ascii_case(needle) || style.label.eq_ignore_ascii_case(needle)
    })
}
