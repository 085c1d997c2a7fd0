//! Seed, upgrade and verify report formatters.

use crate::error::CmsError;
use crate::schema::IntegrityReport;
use crate::seeder::{SeedReport, UpgradeReport};

pub fn format_seed_report(report: &SeedReport, format: &str) -> Result<String, CmsError> {
    if format == "json" {
        return Ok(serde_json::to_string_pretty(report)?);
    }
    Ok(report.render())
}

pub fn format_upgrade_report(report: &UpgradeReport, format: &str) -> Result<String, CmsError> {
    if format == "json" {
        return Ok(serde_json::to_string_pretty(report)?);
    }
    Ok(report.render())
}

pub fn format_verify_report(report: &IntegrityReport, format: &str) -> Result<String, CmsError> {
    if format == "json" {
        let out = serde_json::json!({
            "clean": report.is_clean(),
            "problems": report.problems,
        });
        return Ok(serde_json::to_string_pretty(&out)?);
    }
    if report.is_clean() {
        return Ok("Verification passed: all checks passed".to_string());
    }
    let mut s = format!(
        "Verification completed with issues:\n\nProblems ({}):",
        report.problems.len()
    );
    for problem in &report.problems {
        s.push_str(&format!("\n  - {}", problem));
    }
    Ok(s)
}
