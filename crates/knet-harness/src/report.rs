//! Human-readable report generation (mirrors donor's
//! `ConformanceReport`).

use crate::verify::VerificationSummary;

pub struct ConformanceReport {
    pub campaign: String,
    pub summary: VerificationSummary,
}

impl ConformanceReport {
    #[must_use]
    pub fn new(campaign: impl Into<String>, summary: VerificationSummary) -> Self {
        Self {
            campaign: campaign.into(),
            summary,
        }
    }

    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "# {} -- {}/{} passed\n\n| case | section | result | message |\n|---|---|---|---|\n",
            self.campaign, self.summary.passed, self.summary.total
        );
        for r in &self.summary.results {
            let status = if r.passed { "pass" } else { "FAIL" };
            out.push_str(&format!(
                "| {} | {} | {status} | {} |\n",
                r.case_name, r.spec_section, r.message
            ));
        }
        out
    }
}
