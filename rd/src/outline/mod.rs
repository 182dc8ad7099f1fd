//! RFP outline composition
//!
//! Assembles a structured outline from a pipeline run's trace and renders it
//! to markdown. The outline always starts in draft status; nothing here
//! talks to the model.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use eyre::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::pipeline::PipelineRun;

/// Lifecycle status of an outline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlineStatus {
    Draft,
    Final,
}

impl std::fmt::Display for OutlineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Final => write!(f, "final"),
        }
    }
}

/// One titled section of the outline
#[derive(Debug, Clone, Serialize)]
pub struct OutlineSection {
    pub title: String,
    pub items: Vec<String>,
}

/// Metadata attached to a composed outline
#[derive(Debug, Clone, Serialize)]
pub struct OutlineMetadata {
    pub generated_at: DateTime<Utc>,
    pub run_id: String,
    pub task_count: usize,
    /// Information the purpose analysis found missing from the request
    pub missing_info: Vec<String>,
    /// Task-graph warnings carried over from the run
    pub warnings: Vec<String>,
}

/// A composed RFP outline
#[derive(Debug, Clone, Serialize)]
pub struct RfpOutline {
    pub title: String,
    pub status: OutlineStatus,
    pub sections: Vec<OutlineSection>,
    pub metadata: OutlineMetadata,
}

/// Build an outline from a pipeline run
///
/// Empty sections are dropped; the work breakdown lists tasks by ascending
/// priority number (1 = highest).
pub fn compose(title: impl Into<String>, run: &PipelineRun) -> RfpOutline {
    let mut sections = Vec::new();

    push_section(
        &mut sections,
        "Overview",
        vec![
            run.purpose.core_purpose.clone(),
            run.purpose.problem_statement.clone(),
            run.purpose.final_goal.clone(),
        ],
    );
    push_section(&mut sections, "Objectives", run.purpose.key_objectives.clone());
    push_section(&mut sections, "Scope of Work", run.scope.required_features.clone());
    push_section(&mut sections, "Constraints", run.scope.constraints.clone());
    push_section(&mut sections, "Required Resources", run.scope.required_resources.clone());
    push_section(
        &mut sections,
        "Timeline",
        run.scope
            .timeline_estimates
            .iter()
            .map(|(phase, estimate)| format!("{phase}: {estimate}"))
            .collect(),
    );

    let mut precedents = run.cases.similar_cases.clone();
    precedents.extend(run.cases.effective_approaches.iter().map(|a| format!("접근 방식: {a}")));
    precedents.extend(run.cases.lessons_learned.iter().map(|l| format!("교훈: {l}")));
    push_section(&mut sections, "Precedent Analysis", precedents);
    push_section(&mut sections, "Risk Factors", run.cases.failure_cases.clone());

    let mut criteria = run.criteria.success_metrics.clone();
    criteria.extend(run.criteria.quality_standards.iter().cloned());
    criteria.extend(run.criteria.performance_indicators.iter().cloned());
    push_section(&mut sections, "Evaluation Criteria", criteria);

    let mut tasks = run.tasks.clone();
    tasks.sort_by_key(|t| t.priority);
    push_section(
        &mut sections,
        "Work Breakdown",
        tasks
            .iter()
            .map(|t| {
                let mut line = format!("[P{}] {} ({}): {}", t.priority, t.task_id, t.task_type, t.description);
                if !t.dependencies.is_empty() {
                    line.push_str(&format!(" - depends on {}", t.dependencies.join(", ")));
                }
                line
            })
            .collect(),
    );

    RfpOutline {
        title: title.into(),
        status: OutlineStatus::Draft,
        sections,
        metadata: OutlineMetadata {
            generated_at: Utc::now(),
            run_id: run.run_id.clone(),
            task_count: run.tasks.len(),
            missing_info: run.purpose.missing_info.clone(),
            warnings: run.warnings.clone(),
        },
    }
}

fn push_section(sections: &mut Vec<OutlineSection>, title: &str, items: Vec<String>) {
    let items: Vec<String> = items.into_iter().filter(|i| !i.trim().is_empty()).collect();
    if !items.is_empty() {
        sections.push(OutlineSection {
            title: title.to_string(),
            items,
        });
    }
}

impl RfpOutline {
    /// Render the outline as markdown
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("# {}\n\n", self.title));
        md.push_str(&format!("_Status: {}_\n\n", self.status));

        for section in &self.sections {
            md.push_str(&format!("## {}\n\n", section.title));
            for item in &section.items {
                md.push_str(&format!("- {item}\n"));
            }
            md.push('\n');
        }

        if !self.metadata.missing_info.is_empty() {
            md.push_str("## Open Questions\n\n");
            for item in &self.metadata.missing_info {
                md.push_str(&format!("- {item}\n"));
            }
            md.push('\n');
        }

        if !self.metadata.warnings.is_empty() {
            md.push_str("## Warnings\n\n");
            for warning in &self.metadata.warnings {
                md.push_str(&format!("- {warning}\n"));
            }
            md.push('\n');
        }

        md.push_str(&format!(
            "---\n_Generated {} · run {} · {} tasks_\n",
            self.metadata.generated_at.format("%Y-%m-%d %H:%M UTC"),
            self.metadata.run_id,
            self.metadata.task_count
        ));

        md
    }

    /// Write the outline to a slugged, timestamped markdown file under `dir`
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).context("Failed to create outline directory")?;

        let slug = slugify(&self.title);
        let timestamp = Utc::now().format("%Y%m%d-%H%M%S");
        let file_path = dir.join(format!("{timestamp}-{slug}.md"));

        std::fs::write(&file_path, self.to_markdown()).context("Failed to write outline file")?;

        info!(path = %file_path.display(), "outline written");
        Ok(file_path)
    }
}

/// Slugify a string for use in filenames
fn slugify(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .take(50)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::TokenUsage;
    use crate::schema::{CaseStudy, EvaluationCriteria, Priority, PurposeAnalysis, ScopeDefinition, TaskSpec};
    use std::collections::BTreeMap;

    fn sample_run() -> PipelineRun {
        PipelineRun {
            run_id: "run-1".to_string(),
            request: "의료 정보 시스템 보안 강화 프로젝트".to_string(),
            context: String::new(),
            purpose: PurposeAnalysis {
                core_purpose: "의료 정보 시스템의 보안 강화".to_string(),
                problem_statement: "환자 데이터 유출 위험".to_string(),
                final_goal: "규정을 충족하는 안전한 시스템".to_string(),
                key_objectives: vec!["접근 제어 개선".to_string()],
                next_topic: "예산".to_string(),
                conversation_context: "초기 요청".to_string(),
                extracted_info: BTreeMap::new(),
                missing_info: vec!["예산 규모".to_string()],
            },
            scope: ScopeDefinition {
                required_features: vec!["SSO".to_string()],
                constraints: vec!["6개월 내 완료".to_string()],
                required_resources: vec!["보안 엔지니어".to_string()],
                timeline_estimates: BTreeMap::from([("설계".to_string(), "4주".to_string())]),
            },
            cases: CaseStudy {
                similar_cases: vec!["병원 EMR 개선 사업".to_string()],
                effective_approaches: vec!["단계적 전환".to_string()],
                failure_cases: vec!["일괄 전환 실패".to_string()],
                lessons_learned: vec!["병행 운영 기간 확보".to_string()],
            },
            criteria: EvaluationCriteria {
                success_metrics: vec!["취약점 90% 감소".to_string()],
                quality_standards: vec!["ISO 27001".to_string()],
                performance_indicators: vec!["평균 탐지 시간".to_string()],
            },
            tasks: vec![
                TaskSpec {
                    task_id: "task-2".to_string(),
                    task_type: "implementation".to_string(),
                    description: "감사 로그 구축".to_string(),
                    priority: Priority::new(3).unwrap(),
                    dependencies: vec!["task-1".to_string()],
                },
                TaskSpec {
                    task_id: "task-1".to_string(),
                    task_type: "analysis".to_string(),
                    description: "보안 진단".to_string(),
                    priority: Priority::new(1).unwrap(),
                    dependencies: vec![],
                },
            ],
            warnings: vec![],
            usage: TokenUsage::default(),
        }
    }

    #[test]
    fn test_compose_sections() {
        let outline = compose("의료 정보 시스템 보안 강화", &sample_run());

        assert_eq!(outline.status, OutlineStatus::Draft);
        assert_eq!(outline.metadata.task_count, 2);

        let titles: Vec<&str> = outline.sections.iter().map(|s| s.title.as_str()).collect();
        assert!(titles.contains(&"Overview"));
        assert!(titles.contains(&"Evaluation Criteria"));
        assert!(titles.contains(&"Work Breakdown"));
    }

    #[test]
    fn test_work_breakdown_sorted_by_priority() {
        let outline = compose("t", &sample_run());
        let breakdown = outline.sections.iter().find(|s| s.title == "Work Breakdown").unwrap();

        // task-1 has priority 1, task-2 priority 3
        assert!(breakdown.items[0].contains("task-1"));
        assert!(breakdown.items[1].contains("task-2"));
        assert!(breakdown.items[1].contains("depends on task-1"));
    }

    #[test]
    fn test_empty_sections_dropped() {
        let mut run = sample_run();
        run.scope.constraints.clear();
        let outline = compose("t", &run);

        assert!(!outline.sections.iter().any(|s| s.title == "Constraints"));
    }

    #[test]
    fn test_to_markdown() {
        let outline = compose("의료 정보 시스템 보안 강화", &sample_run());
        let md = outline.to_markdown();

        assert!(md.starts_with("# 의료 정보 시스템 보안 강화"));
        assert!(md.contains("_Status: draft_"));
        assert!(md.contains("## Overview"));
        assert!(md.contains("## Open Questions"));
        assert!(md.contains("- 예산 규모"));
        assert!(md.contains("run run-1"));
    }

    #[test]
    fn test_write_to_creates_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let outline = compose("Security Uplift RFP", &sample_run());

        let path = outline.write_to(temp.path()).unwrap();
        assert!(path.exists());
        assert!(path.file_name().unwrap().to_str().unwrap().contains("security-uplift-rfp"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("## Work Breakdown"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Security Uplift RFP"), "security-uplift-rfp");
        assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
        assert_eq!(slugify("Special!@#$%Characters"), "special-characters");
    }
}
