use std::io::{self, Write};

use chrono::SecondsFormat;

use crate::outcome::Outcome;

/// Writes outcomes as a fixed-width table, one row per outcome.
pub fn render<W: Write>(out: &mut W, outcomes: &[Outcome]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{:<20} {:<15} {:<25} {:<12} {:<15} {}",
        "Identity", "Address", "Created", "State", "Latency", "Status"
    )?;
    for outcome in outcomes {
        let latency = format!("{:?}", outcome.latency);
        writeln!(
            out,
            "{:<20} {:<15} {:<25} {:<12} {:<15} {}",
            outcome.identity,
            outcome.address,
            outcome
                .created_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            outcome.lifecycle_state.as_str(),
            latency,
            outcome.status_text(),
        )?;
    }
    out.flush()
}
