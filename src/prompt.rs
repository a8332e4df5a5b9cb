//! Prompt templates and rendering.
//!
//! Templates use `{key}` placeholders. `{{` and `}}` produce literal braces,
//! which the extraction templates need for their JSON examples. Rendering is
//! a single left-to-right pass, so substituted values (search results, scraped
//! pages) are never re-scanned for placeholders.

use crate::types::Headline;

const RESEARCH_TEMPLATE: &str = r#"From these search results, extract the official website URL, a 1-sentence description of what they do, and list of competitors for {company}.

Search results:
{search_results}

Return ONLY valid JSON in this exact format with no additional text, no markdown, no preamble:
{{
    "website_url": "https://example.com",
    "description": "One sentence description here",
    "competitors": ["competitor1", "competitor2", "competitor3"]
}}"#;

const PRICING_TEMPLATE: &str = r#"You are a pricing research expert. Analyze the following pricing information and extract specific details.

PRICING INFORMATION:
{context}

TASK:
Extract pricing information and return ONLY a valid JSON object with no additional text, explanation, or markdown formatting.

RULES:
- For "free_tier": return true if there's a free plan (look for "free", "free forever", "$0"), otherwise false
- For "starter_plan": Find the CHEAPEST paid plan after free tier and include:
  * "name": the plan name (e.g., "Pro", "Basic", "Plus", "Starter")
  * "price": the price with currency (e.g., "$7.25/month", "₹500/month")
  * If not found, use null for both
- For "enterprise_plan": return true if enterprise/custom pricing exists (look for "Enterprise", "Custom", "Contact Sales"), otherwise false

IMPORTANT: Return ONLY the JSON object, no markdown code blocks, no explanations.

JSON FORMAT:
{{
    "free_tier": true,
    "starter_plan": {{
        "name": "plan name or null",
        "price": "price with currency or null"
    }},
    "enterprise_plan": true
}}
"#;

const NEWS_TEMPLATE: &str = r#"You are a content analyst expert. Analyze the following blog/news content and extract the top 3 headlines.

CONTENT:
{context}

TASK:
Extract the top 3 most prominent headlines or article titles from the content above.

RULES:
- Find actual headlines/titles of articles or blog posts
- Headlines should be clear, complete sentences or phrases
- Prioritize the most recent or featured articles
- Do not include navigation text, menu items, or generic labels
- Each headline should be meaningful and represent an actual article
- If you find fewer than 3 headlines, return only what you find

IMPORTANT: Return ONLY a valid JSON object with no additional text, explanation, or markdown formatting.

JSON FORMAT:
{{
  "headlines": [
    {{
      "title": "First headline text",
      "position": 1
    }},
    {{
      "title": "Second headline text",
      "position": 2
    }},
    {{
      "title": "Third headline text",
      "position": 3
    }}
  ]
}}

If fewer than 3 headlines are found, return only the available ones.
"#;

const BATTLE_CARD_TEMPLATE: &str = r#"You are a Sales Assistant. Write a professional Battle Card for {company}.

INSTRUCTIONS:
- Use ONLY the data provided below
- Do NOT hallucinate or add information not present in the data
- Keep it concise and sales-focused
- Use markdown formatting for readability
- If any information is missing or "Unknown", clearly state it as such

DATA PROVIDED:
---
Company: {company}
Website: {website}
Description: {description}
Competitors: {competitors}

Pricing Information:
{pricing}

Recent News/Blog Headlines:
{news}

---

BATTLE CARD LAYOUT:
Create a battle card with these sections:

# Battle Card: {company}

## 1. What They Do
[Brief description of the company and their main offering]

## 2. Key Competitors
[List the main competitors]

## 3. Pricing Structure
[Detail the pricing information available]

## 4. Recent News & Updates
[List recent headlines or news]

## 5. Sales Strategy Tips
[Brief insights on how to position against competitors based on the data]

---

Write the complete battle card now:"#;

/// Build a prompt string with variable substitution.
///
/// Replaces `{key}` placeholders with the matching value from `vars`.
/// Unknown placeholders are left as-is. Use `{{` to insert a literal `{`
/// and `}}` to insert a literal `}`.
///
/// # Example
///
/// ```
/// use battle_card::prompt::render;
///
/// let result = render("Hello {name}, here is JSON: {{\"key\": \"val\"}}", &[("name", "Alice")]);
/// assert_eq!(result, r#"Hello Alice, here is JSON: {"key": "val"}"#);
/// ```
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
        } else if tail.starts_with('{') {
            let value = tail[1..].find('}').and_then(|end| {
                let key = &tail[1..1 + end];
                vars.iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| (*v, end + 2))
            });
            match value {
                Some((v, consumed)) => {
                    out.push_str(v);
                    rest = &tail[consumed..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        } else {
            out.push('}');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

/// Create a numbered list from items (1-indexed).
pub fn numbered_list(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Research extraction prompt over raw search results.
pub fn research_prompt(company: &str, search_results: &str) -> String {
    render(
        RESEARCH_TEMPLATE,
        &[("company", company), ("search_results", search_results)],
    )
}

/// Pricing extraction prompt over retrieved page chunks.
pub fn pricing_prompt(context: &str) -> String {
    render(PRICING_TEMPLATE, &[("context", context)])
}

/// Headline extraction prompt over retrieved page chunks.
pub fn news_prompt(context: &str) -> String {
    render(NEWS_TEMPLATE, &[("context", context)])
}

/// Fields the writer prompt is rendered from, already formatted for display.
#[derive(Debug, Clone)]
pub struct CardFacts<'a> {
    pub company: &'a str,
    pub website: &'a str,
    pub description: &'a str,
    pub competitors: String,
    pub pricing: String,
    pub news: String,
}

/// Long-form writer prompt for the five-section battle card.
pub fn battle_card_prompt(facts: &CardFacts<'_>) -> String {
    render(
        BATTLE_CARD_TEMPLATE,
        &[
            ("company", facts.company),
            ("website", facts.website),
            ("description", facts.description),
            ("competitors", &facts.competitors),
            ("pricing", &facts.pricing),
            ("news", &facts.news),
        ],
    )
}

/// Headlines as a numbered list of titles, in the order given.
pub fn headline_list(headlines: &[Headline]) -> String {
    let titles: Vec<String> = headlines.iter().map(|h| h.title.clone()).collect();
    numbered_list(&titles)
}
