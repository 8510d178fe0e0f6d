use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use taxi_cli::types::{RunResult, TableKind, TableStatus, TableSummary};
use taxi_warehouse::TableInfo;

pub fn print_summary(result: &RunResult) {
    println!("Input: {} ({} rows)", result.input.display(), result.raw_rows);
    println!("Dataset: {}", result.dataset);

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Kind"),
        header_cell("Rows"),
        header_cell("Columns"),
        header_cell("Status"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Center);
    for summary in &result.tables {
        table.add_row(vec![
            table_cell(summary),
            dim_cell(match summary.kind {
                TableKind::Dimension => "dimension",
                TableKind::Fact => "fact",
            }),
            Cell::new(summary.rows),
            Cell::new(summary.columns),
            status_cell(&summary.status),
        ]);
    }
    println!("{table}");

    print_reference_table(result);
    print_stage_table(result);

    for normalized in &result.normalization {
        for column in &normalized.failed {
            println!(
                "Column {column} in {} kept its original type",
                normalized.table
            );
        }
    }
    for (column, count) in result.coerced_timestamps.iter().filter(|(_, c)| **c > 0) {
        println!("Unparsable timestamps nulled in {column}: {count}");
    }
    if !result.errors.is_empty() {
        eprintln!("Errors:");
        for error in &result.errors {
            eprintln!("- {error}");
        }
    }
    println!("{}", result.status_line());
}

fn print_reference_table(result: &RunResult) {
    if result.unresolved.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Foreign key"),
        header_cell("Unresolved"),
        header_cell("Dangling"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for (column, unresolved) in &result.unresolved {
        let dangling = result.dangling.get(column).copied().unwrap_or(0);
        table.add_row(vec![
            Cell::new(column),
            count_cell(*unresolved, Color::Yellow),
            count_cell(dangling, Color::Red),
        ]);
    }
    println!();
    println!("References:");
    println!("{table}");
}

fn print_stage_table(result: &RunResult) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Stage"), header_cell("Duration")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for timing in &result.stages {
        table.add_row(vec![
            Cell::new(timing.stage),
            Cell::new(format!("{} ms", timing.duration.as_millis())),
        ]);
    }
    println!();
    println!("{table}");
}

pub fn print_table_info(info: &TableInfo) {
    println!("Table: {}", info.table);
    println!("Rows: {}", info.rows);
    println!("Size: {} bytes", info.bytes);
    if let Some(modified) = info.modified {
        println!("Modified: {}", modified.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(sha256) = &info.sha256 {
        println!("SHA-256: {sha256}");
    }

    let mut table = Table::new();
    table.set_header(vec![header_cell("Column"), header_cell("Type")]);
    apply_table_style(&mut table);
    for (name, dtype) in &info.columns {
        table.add_row(vec![Cell::new(name), dim_cell(dtype)]);
    }
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn table_cell(summary: &TableSummary) -> Cell {
    let cell = Cell::new(&summary.table.table);
    match summary.kind {
        TableKind::Fact => cell.fg(Color::Blue).add_attribute(Attribute::Bold),
        TableKind::Dimension => cell,
    }
}

fn status_cell(status: &TableStatus) -> Cell {
    match status {
        TableStatus::Loaded(_) => Cell::new("✓")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        TableStatus::LoadFailed(_) | TableStatus::BuildFailed(_) => {
            Cell::new(status.label()).fg(Color::Red)
        }
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
