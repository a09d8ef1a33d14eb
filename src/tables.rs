use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    ledger::{Ledger, MAX_DAILY_READING},
    quantity::{energy::KilowattHours, rate::KilowattHourRate},
    statistics::History,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

/// Ledger entries along with the daily increments, priced at the given price.
pub fn build_ledger_table(ledger: &Ledger, price: KilowattHourRate) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Date", "Total", "Daily", "Cost"]);
    let mut previous_total = None;
    for (date, total) in ledger.iter() {
        let daily = previous_total.map(|previous_total| (total - previous_total).round_to_watt_hours());
        previous_total = Some(total);
        table.add_row(vec![
            Cell::new(date.format("%Y-%m-%d")).add_attribute(Attribute::Dim),
            Cell::new(total).set_alignment(CellAlignment::Right),
            match daily {
                Some(daily) => Cell::new(daily).set_alignment(CellAlignment::Right).fg(
                    if daily < KilowattHours::ZERO || daily > MAX_DAILY_READING {
                        Color::Red
                    } else {
                        Color::Reset
                    },
                ),
                None => Cell::new("").add_attribute(Attribute::Dim),
            },
            Cell::new((total * price).round_to_cents()).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn build_history_table(history: &History) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Start", "Energy", "Cost"]);
    for point in &history.0 {
        table.add_row(vec![
            Cell::new(point.start.format("%Y-%m-%d %H:%M")).add_attribute(Attribute::Dim),
            Cell::new(point.energy).set_alignment(CellAlignment::Right),
            Cell::new(point.cost).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
