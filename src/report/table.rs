// src/report/table.rs

use std::fmt::Write;

use crate::optimization::OptimizationResult;
use crate::sizing::{SizingReport, DESIGN_DIM};

/// 分類ごとに区切った固定幅の表
pub fn format_table(report: &SizingReport, result: Option<&OptimizationResult<DESIGN_DIM>>) -> String {
    let mut out = String::new();
    let mut current = None;
    for entry in report.entries() {
        if current != Some(entry.category) {
            let _ = writeln!(out, "[{}]", entry.category);
            current = Some(entry.category);
        }
        let _ = writeln!(out, "  {:<28} {:>16.6} {}", entry.name, entry.value, entry.unit);
    }

    if let Some(result) = result {
        let _ = writeln!(out, "[optimizer]");
        let _ = writeln!(out, "  {:<28} {:>16}", "strategy", result.strategy);
        let _ = writeln!(out, "  {:<28} {:>16}", "iterations", result.iterations);
        let _ = writeln!(out, "  {:<28} {:>16}", "evaluations", result.evaluations);
        let _ = writeln!(out, "  {:<28} {:>16}", "converged", result.converged());
        if let Some(w) = &result.warning {
            let _ = writeln!(out, "  warning: {}", w);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Architecture, MissionSpecification, ReferenceParameters};
    use crate::sizing::{DesignVector, SizingEvaluator};

    #[test]
    fn test_table_lists_every_entry_under_its_section() {
        let evaluator = SizingEvaluator::new(
            MissionSpecification::default(),
            Architecture::default(),
            ReferenceParameters::default(),
        )
        .unwrap();
        let report = evaluator
            .size(&DesignVector::from_array([0.33, 3.2, 1.2, 1.0, 1.2, 1.0, 1.0, 0.1]))
            .unwrap();
        let table = format_table(&report, None);
        for section in ["[design]", "[propeller]", "[motor]", "[battery]", "[esc]", "[frame]", "[mass]", "[constraint]"] {
            assert!(table.contains(section), "missing {}", section);
        }
        assert_eq!(
            table.lines().filter(|l| l.starts_with("  ")).count(),
            report.entries().len()
        );
        assert!(!table.contains("[optimizer]"));
    }
}
