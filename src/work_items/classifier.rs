use super::types::{WorkCategory, WorkItem};
use crate::config::ClassificationConfig;

/// Two-tier work classification.
///
/// Tier one is the primary type: a defect type always yields `Defect` and
/// the effort attribute is never consulted. Tier two applies only to
/// non-defects and maps the effort attribute to `TechnicalDebt`, `Risk`,
/// or `Feature` (the default, including when the attribute is absent).
#[derive(Debug, Clone)]
pub struct WorkClassifier<'a> {
    config: &'a ClassificationConfig,
}

impl<'a> WorkClassifier<'a> {
    pub fn new(config: &'a ClassificationConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, item: &WorkItem) -> WorkCategory {
        if item.has_type_in(&self.config.defect_types) {
            return WorkCategory::Defect;
        }

        match item.effort_category.as_deref().map(str::trim) {
            Some(effort) if effort.eq_ignore_ascii_case(self.config.tech_debt_value.trim()) => {
                WorkCategory::TechnicalDebt
            }
            Some(effort)
                if self
                    .config
                    .risk_values
                    .iter()
                    .any(|risk| risk.trim().eq_ignore_ascii_case(effort)) =>
            {
                WorkCategory::Risk
            }
            _ => WorkCategory::Feature,
        }
    }
}

/// Classify `item` with `config`.
pub fn classify(item: &WorkItem, config: &ClassificationConfig) -> WorkCategory {
    WorkClassifier::new(config).classify(item)
}
