//! Output formatting utilities.
//!
//! Pretty printing for CLI commands, or JSON when requested.

use agora_governance::Weight;
use agora_types::{Address, Hash};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::config::OutputFormat;
use crate::scenario::SimulationReport;

/// Format address (short version).
pub fn format_address_short(addr: &Address) -> String {
    let s = addr.to_string();
    if s.len() > 16 {
        format!("{}...{}", &s[..12], &s[s.len() - 6..])
    } else {
        s
    }
}

/// Format hash for display.
pub fn format_hash(hash: &Hash) -> String {
    format!("0x{}", hex::encode(hash.as_bytes()))
}

/// Group digits in thousands: 102000 -> 102,000.
pub fn format_weight(weight: Weight) -> String {
    let digits = weight.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Print success message.
pub fn print_success(msg: &str) {
    println!("{}", format!("✓ {}", msg).green());
}

/// Print error message.
pub fn print_error(msg: &str) {
    eprintln!("{}", format!("✗ {}", msg).red());
}

/// Print warning message.
pub fn print_warning(msg: &str) {
    println!("{}", format!("⚠ {}", msg).yellow());
}

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print label/value pairs, as a table or a flat JSON object.
pub fn print_fields(format: OutputFormat, fields: &[(&str, String)]) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            let map: serde_json::Map<String, serde_json::Value> = fields
                .iter()
                .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
                .collect();
            print_json(&map)
        }
        OutputFormat::Table => {
            for (label, value) in fields {
                println!("{:<14} {}", format!("{}:", label).bold(), value.bright_cyan());
            }
            Ok(())
        }
    }
}

pub fn print_report(format: OutputFormat, report: &SimulationReport) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(report);
    }

    #[derive(Tabled)]
    struct ParticipantRow {
        name: String,
        address: String,
        attested: String,
        weight: String,
        delegate: String,
    }

    #[derive(Tabled)]
    struct ProposalRow {
        index: u64,
        content: String,
        agree: String,
        disagree: String,
        abstain: String,
        total: String,
    }

    #[derive(Tabled)]
    struct NominationRow {
        index: u64,
        content: String,
        total: String,
    }

    println!("{}", "Simulation".bold());
    println!("Domain:  {}", report.domain_separator.bright_cyan());
    println!("Ledger:  {}", format_address_short(&report.ledger));
    println!("Factory: {}", format_address_short(&report.factory));
    println!("Events:  {}", report.events);
    println!();

    let rows: Vec<ParticipantRow> = report
        .participants
        .iter()
        .map(|p| ParticipantRow {
            name: p.name.clone(),
            address: format_address_short(&p.address),
            attested: format_weight(p.attested_balance),
            weight: format_weight(p.current_weight),
            delegate: p.delegate.clone().unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    for round in &report.rounds {
        println!();
        println!(
            "{} #{} {} ({} voters)",
            "Round".bold(),
            round.index,
            round.title.bright_cyan(),
            round.voters
        );

        let proposals: Vec<ProposalRow> = round
            .results
            .proposals
            .iter()
            .zip(&round.proposals)
            .map(|(r, content)| ProposalRow {
                index: r.index,
                content: content.clone(),
                agree: format_weight(r.agree),
                disagree: format_weight(r.disagree),
                abstain: format_weight(r.abstain),
                total: format_weight(r.total_vote),
            })
            .collect();
        if !proposals.is_empty() {
            println!("{}", Table::new(proposals).with(Style::rounded()));
        }

        let nominations: Vec<NominationRow> = round
            .results
            .nominations
            .iter()
            .zip(&round.nominations)
            .map(|(r, content)| NominationRow {
                index: r.index,
                content: content.clone(),
                total: format_weight(r.total_vote),
            })
            .collect();
        if !nominations.is_empty() {
            println!("{}", Table::new(nominations).with(Style::rounded()));
        }
    }

    if report.rejections.is_empty() {
        println!();
        print_success("Every call was accepted");
    } else {
        println!();
        for rejection in &report.rejections {
            print_warning(&format!(
                "{} by {} rejected: {}",
                rejection.step, rejection.actor, rejection.reason
            ));
        }
    }
    Ok(())
}
