use wayfind_engine::formatter::{format_action, format_attempts};
use wayfind_engine::navigator::RunReport;

pub fn render(report: &RunReport) -> String {
    let mut output = format!("{} on {}\n", report.intent, report.domain);
    for dismissed in report.dismissed() {
        output.push_str(&format!("  dismissed {}\n", dismissed));
    }

    match &report.resolution {
        Ok(outcome) => {
            output.push_str(&format_attempts(&outcome.attempts));
            output.push_str(&format!("resolved via {}\n", outcome.strategy));
        }
        Err(e) => {
            output.push_str(&format_attempts(e.attempts()));
            output.push_str(&format!("{}\n", e));
        }
    }
    output.push_str(&format_action(&report.action));
    if !report.logged {
        output.push_str("(decision log unavailable)\n");
    }
    output
}
