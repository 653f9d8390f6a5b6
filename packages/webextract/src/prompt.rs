//! Extraction prompt construction.
//!
//! Renders a schema into an explicit instruction plus an example output
//! shape. Deterministic: identical (schema, text) pairs always produce an
//! identical prompt string.

use crate::schema::Schema;

/// Template for the extraction prompt.
///
/// The rule list is fixed and non-negotiable: it is what turns a chatty
/// model into a data source with predictable value shapes.
const EXTRACT_PROMPT: &str = r#"Extract structured data from this webpage content.

Return ONLY valid JSON with this exact structure (no markdown code blocks, no explanation):
{example}

Extraction rules:
- All numbers must be actual numbers (not strings)
- Remove currency symbols ($, EUR, etc.) from numbers
- Remove thousands separators from numbers (1,500 becomes 1500)
- Dates should be ISO format (YYYY-MM-DD) if determinable
- If a field is not visible on the page, use null
- Phone numbers: keep as strings in their original format
- Arrays: extract all matching items found
- Be precise - only extract what is explicitly shown

Webpage content:
{content}

Extract the data now:"#;

/// Build the extraction prompt for a schema and reduced page text.
pub fn build_extraction_prompt(schema: &Schema, content: &str) -> String {
    EXTRACT_PROMPT
        .replace("{example}", &schema_example(schema))
        .replace("{content}", content)
}

/// Render the schema as a JSON example object with placeholder values
/// (`"<string>"`, `"<number>"`, ...), preserving field order.
fn schema_example(schema: &Schema) -> String {
    let mut example = String::from("{\n");
    let last = schema.len().saturating_sub(1);
    for (i, (name, field_type)) in schema.fields().enumerate() {
        example.push_str(&format!("  \"{}\": \"<{}>\"", name, field_type));
        if i != last {
            example.push(',');
        }
        example.push('\n');
    }
    example.push('}');
    example
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    fn test_schema() -> Schema {
        Schema::from_json(r#"{"title": "string", "price": "number", "tags": "array"}"#).unwrap()
    }

    #[test]
    fn test_example_preserves_field_order() {
        let example = schema_example(&test_schema());
        let title_pos = example.find("\"title\"").unwrap();
        let price_pos = example.find("\"price\"").unwrap();
        let tags_pos = example.find("\"tags\"").unwrap();
        assert!(title_pos < price_pos && price_pos < tags_pos);
    }

    #[test]
    fn test_example_uses_type_placeholders() {
        let example = schema_example(&test_schema());
        assert!(example.contains(r#""title": "<string>""#));
        assert!(example.contains(r#""price": "<number>""#));
        assert!(example.contains(r#""tags": "<array>""#));
    }

    #[test]
    fn test_prompt_embeds_content_and_rules() {
        let prompt = build_extraction_prompt(&test_schema(), "Title: Widget");
        assert!(prompt.contains("Title: Widget"));
        assert!(prompt.contains("use null"));
        assert!(prompt.contains("Return ONLY valid JSON"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let schema = test_schema();
        let a = build_extraction_prompt(&schema, "same content");
        let b = build_extraction_prompt(&schema, "same content");
        assert_eq!(a, b);
    }
}
