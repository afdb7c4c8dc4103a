//! Generation message builders.
//!
//! What to ask the model for is business logic, so it lives here rather than
//! in the client package. Each builder returns the full conversation for one
//! JSON-mode completion: a system role, per-field rule blocks, the entity
//! context, and a reply contract naming exactly the requested fields.

use std::fmt::Write as _;

use openai_client::Message;
use storefront::{Collection, Product};

use crate::domains::credits::math::ContentField;
use crate::domains::jobs::models::bulk_job::GenerationSettings;

fn field_label(field: ContentField) -> &'static str {
    match field {
        ContentField::Title => "Product title",
        ContentField::Description => "Product description",
        ContentField::MetaTitle => "Meta title",
        ContentField::MetaDescription => "Meta description",
        ContentField::AltText => "Image alt text",
    }
}

fn field_rules(field: ContentField) -> &'static [&'static str] {
    match field {
        ContentField::Title => &[
            "Keep the original main phrase at the beginning (do not reorder or remove it).",
            "Append up to 2-3 attributes (product type, audience, key color/material/fit).",
            "Target 40-70 characters, never exceed 80.",
            "No sentences, emojis, pricing, or hype terms. Use title case.",
        ],
        ContentField::Description => &[
            "Structure: intro paragraph (25-60 words), 3-6 <li> bullets (max 15 words each), optional closing sentence.",
            "Mention factual benefits, materials, fits, and use cases only; do not invent details.",
            "120-250 words max, confident but not over-hyped.",
            "HTML must use only <p>, <ul>, <li>, <strong>, <em>.",
            "No pricing, discounts, shipping, or policy info.",
        ],
        ContentField::MetaTitle => &[
            "Put the primary keyword near the start.",
            "45-60 characters, never exceed 60.",
            "Readable, no keyword stuffing.",
        ],
        ContentField::MetaDescription => &[
            "120-155 characters, never exceed 155.",
            "Include the primary keyword and a clear value proposition.",
            "End with a soft call to action.",
        ],
        ContentField::AltText => &[
            "Describe what is visible in the image, factually.",
            "Maximum 15 words, no 'image of' or 'picture of' prefixes.",
        ],
    }
}

fn reply_key(field: ContentField) -> &'static str {
    match field {
        ContentField::Title => "title",
        ContentField::Description => "description_html",
        ContentField::MetaTitle => "meta_title",
        ContentField::MetaDescription => "meta_description",
        ContentField::AltText => "alt_text",
    }
}

fn style_lines(settings: &GenerationSettings, out: &mut String) {
    if let Some(tone) = &settings.tone {
        let _ = writeln!(out, "Tone of voice: {}.", tone);
    }
    if let Some(language) = &settings.language {
        let _ = writeln!(out, "Write everything in {}.", language);
    }
}

fn rules_block(fields: &[ContentField], out: &mut String) {
    for field in fields {
        let _ = writeln!(out, "\n{} rules:", field_label(*field));
        for rule in field_rules(*field) {
            let _ = writeln!(out, "- {}", rule);
        }
    }
}

fn reply_contract(fields: &[ContentField], out: &mut String) {
    let _ = writeln!(out, "\nReturn JSON only, with exactly these keys:");
    let _ = writeln!(out, "{{");
    for (index, field) in fields.iter().enumerate() {
        let comma = if index + 1 == fields.len() { "" } else { "," };
        let _ = writeln!(out, "  \"{}\": \"...\"{}", reply_key(*field), comma);
    }
    let _ = writeln!(out, "}}");
}

/// Conversation for one product copy generation.
pub fn product_copy_messages(product: &Product, settings: &GenerationSettings) -> Vec<Message> {
    let mut user = String::new();
    let _ = writeln!(
        user,
        "Write ecommerce copy for the product below. Generate only the requested fields."
    );
    style_lines(settings, &mut user);
    rules_block(&settings.fields, &mut user);
    let _ = writeln!(
        user,
        "\nProduct data:\n{}",
        serde_json::to_string_pretty(product).unwrap_or_default()
    );
    reply_contract(&settings.fields, &mut user);

    vec![
        Message::system(
            "You are a senior ecommerce copywriter. Keep product facts accurate, respect every \
             length limit, and return JSON only.",
        ),
        Message::user(user),
    ]
}

/// Conversation for one collection copy generation.
pub fn collection_copy_messages(
    collection: &Collection,
    settings: &GenerationSettings,
) -> Vec<Message> {
    let mut user = String::new();
    let _ = writeln!(
        user,
        "Write ecommerce copy for the collection below. Generate only the requested fields. \
         Describe the assortment as a whole, not individual products."
    );
    style_lines(settings, &mut user);
    rules_block(&settings.fields, &mut user);
    let _ = writeln!(
        user,
        "\nCollection data:\n{}",
        serde_json::to_string_pretty(collection).unwrap_or_default()
    );
    reply_contract(&settings.fields, &mut user);

    vec![
        Message::system(
            "You are a senior ecommerce copywriter. Keep collection facts accurate, respect every \
             length limit, and return JSON only.",
        ),
        Message::user(user),
    ]
}

/// Conversation for one image alt-text generation (vision input).
pub fn alt_text_messages(
    product_title: &str,
    product_handle: &str,
    existing_alt_text: &str,
    image_url: &str,
) -> Vec<Message> {
    let mut user = String::new();
    let _ = writeln!(
        user,
        "Write concise, descriptive alt text for this product image."
    );
    let _ = writeln!(user, "Product title: {}", product_title);
    let _ = writeln!(user, "Product handle: {}", product_handle);
    if !existing_alt_text.is_empty() {
        let _ = writeln!(user, "Existing alt text: {}", existing_alt_text);
    }
    for rule in field_rules(ContentField::AltText) {
        let _ = writeln!(user, "- {}", rule);
    }
    let _ = writeln!(user, "\nReturn JSON only: {{ \"alt_text\": \"...\" }}");

    vec![
        Message::system(
            "You are an accessibility-focused ecommerce assistant. Describe product images \
             factually and return JSON only.",
        ),
        Message::user_with_image(user, image_url),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use openai_client::MessageContent;

    fn settings(fields: Vec<ContentField>) -> GenerationSettings {
        GenerationSettings {
            fields,
            tone: Some("playful".into()),
            ..Default::default()
        }
    }

    fn text_of(message: &Message) -> String {
        match &message.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(_) => panic!("expected plain text content"),
        }
    }

    #[test]
    fn product_messages_name_only_requested_fields() {
        let product = Product {
            id: "gid://storefront/Product/1".into(),
            title: "Wool Socks".into(),
            ..Default::default()
        };
        let messages = product_copy_messages(
            &product,
            &settings(vec![ContentField::Title, ContentField::MetaDescription]),
        );
        assert_eq!(messages.len(), 2);

        let user = text_of(&messages[1]);
        assert!(user.contains("\"title\""));
        assert!(user.contains("\"meta_description\""));
        assert!(!user.contains("\"description_html\""));
        assert!(user.contains("playful"));
        assert!(user.contains("Wool Socks"));
    }

    #[test]
    fn alt_text_messages_carry_the_image() {
        let messages = alt_text_messages("Wool Socks", "wool-socks", "", "https://cdn/img.jpg");
        let MessageContent::Parts(parts) = &messages[1].content else {
            panic!("expected multi-part user message");
        };
        assert_eq!(parts.len(), 2);
    }
}
