//! Keyword-driven risk classification.
//!
//! Matching is a linear substring scan over ordered keyword lists. With a
//! few dozen keywords this is fast enough; a multi-pattern automaton would
//! only pay off for much larger lists.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of the keyword lists and answer templates.
pub const POLICY_VERSION: &str = "1.0";

const HIGH_RISK_KEYWORDS: &[&str] = &[
    "意識がない",
    "意識もうろう",
    "けいれん",
    "痙攣",
    "呼吸できない",
    "息ができない",
    "激しい胸痛",
    "胸が痛い",
    "突然の激しい頭痛",
    "ろれつ",
    "片麻痺",
    "顔のゆがみ",
    "大量出血",
    "血が止まらない",
    "アナフィラキシ",
    "喉が腫れる",
    "ゼーゼー",
    "窒息",
    "唇が青い",
    "自殺",
    "死にたい",
    "産後の大量出血",
    "乳児 38",
];

const MEDIUM_RISK_KEYWORDS: &[&str] = &[
    "高熱",
    "39度",
    "40度",
    "強い腹痛",
    "血便",
    "黒色便",
    "脱水",
    "尿が出ない",
    "3日以上",
    "一週間以上",
    "息苦しい",
    "呼吸が苦しい",
    "胸が苦しい",
    "意識がもうろう",
    "妊娠中",
    "乳幼児",
    "高齢者",
];

/// Requests for diagnosis, prescriptions or illegal substances.
const FORBIDDEN_TERMS: &[&str] = &[
    "診断して",
    "確定診断",
    "処方して",
    "薬を出して",
    "抗生物質を出して",
    "用量を教えて",
    "処方箋を出して",
    "違法",
    "劇薬",
    "医薬品を販売",
    "麻薬",
    "覚醒剤",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk tier plus the keywords that produced it, in keyword-list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub reasons: Vec<String>,
}

impl RiskAssessment {
    pub fn low() -> Self {
        Self {
            level: RiskLevel::Low,
            reasons: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ForbiddenVerdict {
    pub matched: bool,
    pub terms: Vec<String>,
}

/// Ordered keyword sets for risk tiers and forbidden requests.
#[derive(Debug, Clone)]
pub struct RiskClassifier {
    high: Vec<String>,
    medium: Vec<String>,
    forbidden: Vec<String>,
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self::with_keywords(HIGH_RISK_KEYWORDS, MEDIUM_RISK_KEYWORDS, FORBIDDEN_TERMS)
    }
}

impl RiskClassifier {
    pub fn with_keywords<S: AsRef<str>>(high: &[S], medium: &[S], forbidden: &[S]) -> Self {
        let owned = |list: &[S]| -> Vec<String> {
            list.iter().map(|k| k.as_ref().to_string()).collect()
        };
        Self {
            high: owned(high),
            medium: owned(medium),
            forbidden: owned(forbidden),
        }
    }

    /// Classify `text` into a risk tier.
    ///
    /// Any high-severity match decides the tier and the medium list is not
    /// consulted at all.
    pub fn assess(&self, text: &str) -> RiskAssessment {
        let high = matches(&self.high, text);
        if !high.is_empty() {
            return RiskAssessment {
                level: RiskLevel::High,
                reasons: high,
            };
        }

        let medium = matches(&self.medium, text);
        if !medium.is_empty() {
            return RiskAssessment {
                level: RiskLevel::Medium,
                reasons: medium,
            };
        }

        RiskAssessment::low()
    }

    /// Detect forbidden requests, independently of the risk tier.
    pub fn forbidden(&self, text: &str) -> ForbiddenVerdict {
        let terms = matches(&self.forbidden, text);
        ForbiddenVerdict {
            matched: !terms.is_empty(),
            terms,
        }
    }
}

fn matches(keywords: &[String], text: &str) -> Vec<String> {
    keywords
        .iter()
        .filter(|k| text.contains(k.as_str()))
        .cloned()
        .collect()
}
