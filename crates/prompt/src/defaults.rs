//! Built-in answer prompt.

use crate::types::PromptDefinition;

/// Identifier of the answer-generation prompt.
pub const ANSWER_PROMPT_ID: &str = "health.answer.default";

const SYSTEM_TEMPLATE: &str = "あなたは日本語のヘルスインフォ・アシスタントです。
出典（厚労省・環境省など）に反する推測はしないでください。
医学的診断や処方は行わず、一般的な健康情報として回答してください。
箇条書きを適度に使い、簡潔にわかりやすく答えてください。";

// Document blocks are separated by a blank line. The block tags stay inline
// so that no template line is standalone.
const USER_TEMPLATE: &str = concat!(
    "質問: {{query}}\n",
    "\n",
    "参照できる資料は次です。事実がある部分のみを根拠として回答してください。\n",
    "{{#each documents}}{{#unless @first}}\n\n{{/unless}}",
    "[#{{this.index}}] {{this.title}}\n",
    "URL: {{this.url}}\n",
    "SOURCE: {{this.source}}\n",
    "TEXT: {{this.text}}{{/each}}\n",
    "\n",
    "指示:\n",
    "- 回答は日本語。\n",
    "- 過度に断定せず、受診目安やセルフケアを簡潔に述べる。\n",
    "- 参照元と矛盾する記述は避ける。\n",
    "- 不明点がある場合は追加情報を促す。\n",
    "{{#if high_risk}}- 緊急性が高い可能性があるため、最初に救急受診・119番への連絡を促す。\n{{/if}}",
);

/// The prompt used when the workspace does not provide an override.
pub fn default_answer_prompt() -> PromptDefinition {
    PromptDefinition {
        id: ANSWER_PROMPT_ID.to_string(),
        title: "Health information answer".to_string(),
        api_version: "1.0".to_string(),
        system: Some(SYSTEM_TEMPLATE.to_string()),
        template: USER_TEMPLATE.to_string(),
    }
}
