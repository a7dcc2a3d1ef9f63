//! `dmn inspect` command implementation.

use anyhow::{Context, Result};
use dmn_audit::DecisionAudit;
use std::fs;
use std::path::Path;

/// Read an audit file and render it as log lines.
pub fn render(path: &Path) -> Result<Vec<String>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot read audit {}", path.display()))?;
    let audit = DecisionAudit::from_json(&content)
        .with_context(|| format!("invalid audit JSON in {}", path.display()))?;

    let mut lines = vec![audit.to_log_line()];
    for (name, value) in audit.input_variables() {
        let tag = audit
            .input_variable_types()
            .get(name)
            .copied()
            .flatten()
            .map_or("-", |t| t.as_str());
        lines.push(format!(
            "  input {}:{} = {}",
            name,
            tag,
            serde_json::to_string(value)?
        ));
    }
    for rule in audit.rule_executions().values() {
        lines.push(format!("  {}", rule.to_log_line()));
    }
    Ok(lines)
}

pub fn run(path: &Path) -> Result<()> {
    for line in render(path)? {
        println!("{}", line);
    }
    Ok(())
}
