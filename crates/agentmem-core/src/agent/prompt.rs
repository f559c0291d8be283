//! System prompt assembly.
//!
//! The base prompt is used verbatim. When long-term records were recalled for
//! the current prompt they are appended as a `<user_context>` block, grouped by
//! namespace:
//!
//! ```text
//! {base prompt}
//!
//! <user_context>
//! /users/alice/facts:
//! - The user's name is Alice
//! </user_context>
//! ```

use std::collections::BTreeMap;

use crate::memory::session::RecalledRecord;

pub struct SystemPromptBuilder;

impl SystemPromptBuilder {
    pub fn build(base: &str, recalled: &[RecalledRecord]) -> String {
        if recalled.is_empty() {
            return base.to_string();
        }

        let mut by_namespace: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for item in recalled {
            by_namespace
                .entry(item.namespace.as_str())
                .or_default()
                .push(item.record.text.trim());
        }

        let sections: Vec<String> = by_namespace
            .into_iter()
            .map(|(namespace, texts)| {
                let lines: Vec<String> = texts.iter().map(|t| format!("- {t}")).collect();
                format!("{namespace}:\n{}", lines.join("\n"))
            })
            .collect();

        format!(
            "{}\n\n<user_context>\n{}\n</user_context>",
            base.trim_end(),
            sections.join("\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentmem_types::memory::MemoryRecord;

    fn recalled(namespace: &str, text: &str) -> RecalledRecord {
        RecalledRecord {
            namespace: namespace.to_string(),
            record: MemoryRecord {
                record_id: "r".to_string(),
                text: text.to_string(),
                namespaces: vec![namespace.to_string()],
                score: Some(0.8),
            },
        }
    }

    #[test]
    fn test_no_records_keeps_base_prompt() {
        assert_eq!(SystemPromptBuilder::build("Be helpful.", &[]), "Be helpful.");
    }

    #[test]
    fn test_records_grouped_by_namespace() {
        let prompt = SystemPromptBuilder::build(
            "Be helpful.",
            &[
                recalled("/users/alice/preferences", "Likes chocolate ice cream"),
                recalled("/users/alice/facts", "Name is Alice"),
            ],
        );
        assert_eq!(
            prompt,
            "Be helpful.\n\n<user_context>\n/users/alice/facts:\n- Name is Alice\n\
             /users/alice/preferences:\n- Likes chocolate ice cream\n</user_context>"
        );
    }
}
