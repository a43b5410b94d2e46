use anyhow::Result;
use comfy_table::{Cell, Color, Table};
use owo_colors::OwoColorize;
use trk_core::firewall::ComponentKind;
use trk_core::TrackerRecord;

fn flag_cell(on: bool, on_color: Color) -> Cell {
    if on {
        Cell::new("yes").fg(on_color)
    } else {
        Cell::new("no").fg(Color::DarkGrey)
    }
}

fn kinds_label(record: &TrackerRecord) -> String {
    let kinds = ComponentKind::of(record);
    if kinds.is_empty() {
        return "-".to_string();
    }
    kinds
        .iter()
        .map(ComponentKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print tracker records as a table, or as pretty JSON with `format == "json"`.
pub fn print_records(records: &[TrackerRecord], format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("{}", "No trackers.".dimmed());
        return Ok(());
    }

    println!();
    println!("  {}", "Trackers".bold());
    println!();

    let mut table = Table::new();
    table.set_header(vec![
        "Name",
        "Tracker ID",
        "Component",
        "Kind",
        "Blocked",
        "Enabled",
        "Logged",
    ]);

    for record in records {
        table.add_row(vec![
            Cell::new(record.name().unwrap_or("-")),
            Cell::new(record.tracker_id().unwrap_or("-")),
            Cell::new(record.component_name().unwrap_or("-")),
            Cell::new(kinds_label(record)),
            flag_cell(record.is_blocked(), Color::Red),
            flag_cell(record.is_enabled(), Color::Green),
            flag_cell(record.is_logged(), Color::Yellow),
        ]);
    }

    println!("{table}");
    println!();
    let blocked = records.iter().filter(|r| r.is_blocked()).count();
    println!(
        "  {} trackers, {} blocked",
        records.len().to_string().bold(),
        blocked.to_string().red().bold()
    );
    println!();

    for record in records {
        log::debug!("{record}");
    }
    Ok(())
}
