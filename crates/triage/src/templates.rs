//! Fixed answer texts.

/// Shown at the top of every answer.
pub const NON_DIAGNOSTIC_DISCLAIMER: &str = "本回答は一般的な健康情報であり、診断・処方ではありません。体調がすぐれない場合や不安が続く場合は、医療機関等にご相談ください。";

pub const EMERGENCY_ADVICE: &str = "生命に関わる可能性のある症状が疑われます。意識障害、強い胸痛、呼吸困難、突然の激しい頭痛、大量出血、アナフィラキシー等がある場合は、ただちに119番または地域の救急相談（#7119等）へ連絡してください。";

pub const CARE_GUIDANCE: &str = "症状が急速に悪化する、強い痛みが続く、脱水が疑われる、乳幼児・高齢者・妊娠中・基礎疾患がある等の場合は、早めの医療機関受診を検討してください。";

const INFO_SHORTAGE: &str = "情報不足のため、出典に基づく十分な回答を提示できませんでした。以下の点を含めて再度ご質問ください。
- 具体的な症状・発症時期・経過
- 年齢・基礎疾患・服用中の薬
- 受診の可否（平日/夜間など）";

const SUMMARY_HEADER: &str = "参考情報（出典の要点）：";

/// Separator between answer parts.
pub const PART_SEPARATOR: &str = "\n\n";

/// The texts the composer stitches answers from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerTemplates {
    pub disclaimer: String,
    pub emergency: String,
    pub care_guidance: String,
    pub info_shortage: String,
    pub summary_header: String,
}

impl Default for AnswerTemplates {
    fn default() -> Self {
        Self {
            disclaimer: NON_DIAGNOSTIC_DISCLAIMER.to_string(),
            emergency: EMERGENCY_ADVICE.to_string(),
            care_guidance: CARE_GUIDANCE.to_string(),
            info_shortage: INFO_SHORTAGE.to_string(),
            summary_header: SUMMARY_HEADER.to_string(),
        }
    }
}

impl AnswerTemplates {
    /// Full answer for "nothing to cite".
    pub fn info_shortage_answer(&self) -> String {
        [self.disclaimer.as_str(), self.info_shortage.as_str()].join(PART_SEPARATOR)
    }

    /// Disclaimer followed by the emergency advice.
    pub fn emergency_answer(&self) -> String {
        [self.disclaimer.as_str(), self.emergency.as_str()].join(PART_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_shortage_answer() {
        let templates = AnswerTemplates::default();
        let answer = templates.info_shortage_answer();
        assert!(answer.starts_with(NON_DIAGNOSTIC_DISCLAIMER));
        assert!(answer.contains("\n\n情報不足のため"));
        assert!(answer.ends_with("受診の可否（平日/夜間など）"));
    }

    #[test]
    fn test_emergency_answer() {
        let templates = AnswerTemplates::default();
        assert_eq!(
            templates.emergency_answer(),
            format!("{}\n\n{}", NON_DIAGNOSTIC_DISCLAIMER, EMERGENCY_ADVICE)
        );
    }
}
