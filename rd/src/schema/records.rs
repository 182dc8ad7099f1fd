//! Stage output records for purpose, scope, case study and evaluation

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Output of the purpose-analysis stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurposeAnalysis {
    /// Core purpose of the project
    pub core_purpose: String,
    /// Problem the project sets out to solve
    pub problem_statement: String,
    /// Final goal of the project
    pub final_goal: String,
    /// Key objectives, in order of importance
    pub key_objectives: Vec<String>,
    /// Topic the conversation should cover next
    pub next_topic: String,
    /// Main thread of the conversation so far
    pub conversation_context: String,
    /// Facts extracted from the request and context
    pub extracted_info: BTreeMap<String, String>,
    /// Information still missing from the request
    pub missing_info: Vec<String>,
}

/// Output of the scope-definition stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeDefinition {
    pub required_features: Vec<String>,
    pub constraints: Vec<String>,
    pub required_resources: Vec<String>,
    /// Estimated duration per major phase
    pub timeline_estimates: BTreeMap<String, String>,
}

/// Output of the case-study stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseStudy {
    pub similar_cases: Vec<String>,
    pub effective_approaches: Vec<String>,
    pub failure_cases: Vec<String>,
    pub lessons_learned: Vec<String>,
}

/// Output of the evaluation-criteria stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationCriteria {
    pub success_metrics: Vec<String>,
    pub quality_standards: Vec<String>,
    pub performance_indicators: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purpose_analysis_deserialize() {
        let json = serde_json::json!({
            "core_purpose": "의료 정보 시스템의 보안 강화",
            "problem_statement": "환자 데이터 유출 위험",
            "final_goal": "개인정보보호 규정을 충족하는 시스템",
            "key_objectives": ["접근 제어 개선", "감사 로그 도입"],
            "next_topic": "예산 범위",
            "conversation_context": "보안 중심의 초기 요청",
            "extracted_info": { "domain": "healthcare" },
            "missing_info": ["예산", "일정"]
        });

        let record: PurposeAnalysis = serde_json::from_value(json).unwrap();
        assert_eq!(record.key_objectives.len(), 2);
        assert_eq!(record.extracted_info["domain"], "healthcare");
    }

    #[test]
    fn test_purpose_analysis_missing_field_rejected() {
        // No key_objectives
        let json = serde_json::json!({
            "core_purpose": "x",
            "problem_statement": "x",
            "final_goal": "x",
            "next_topic": "x",
            "conversation_context": "x",
            "extracted_info": {},
            "missing_info": []
        });

        let result: Result<PurposeAnalysis, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_extracted_info_rejects_nested_values() {
        let json = serde_json::json!({
            "core_purpose": "x",
            "problem_statement": "x",
            "final_goal": "x",
            "key_objectives": ["x"],
            "next_topic": "x",
            "conversation_context": "x",
            "extracted_info": { "nested": { "not": "a string" } },
            "missing_info": []
        });

        let result: Result<PurposeAnalysis, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_scope_definition_roundtrip() {
        let record = ScopeDefinition {
            required_features: vec!["SSO".to_string()],
            constraints: vec!["6개월 내 완료".to_string()],
            required_resources: vec!["보안 엔지니어 2명".to_string()],
            timeline_estimates: BTreeMap::from([("설계".to_string(), "4주".to_string())]),
        };

        let json = serde_json::to_value(&record).unwrap();
        let back: ScopeDefinition = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_case_study_missing_field_rejected() {
        let json = serde_json::json!({
            "similar_cases": [],
            "effective_approaches": [],
            "failure_cases": []
        });

        let result: Result<CaseStudy, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_evaluation_criteria_deserialize() {
        let json = serde_json::json!({
            "success_metrics": ["취약점 90% 감소"],
            "quality_standards": ["ISO 27001 준수"],
            "performance_indicators": ["평균 대응 시간"]
        });

        let record: EvaluationCriteria = serde_json::from_value(json).unwrap();
        assert_eq!(record.success_metrics.len(), 1);
    }
}
