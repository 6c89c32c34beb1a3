use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use ehr_normalize::DomainCoverage;

use ehr_cli::types::{DomainSetup, LookupResult, MapResult};

pub fn print_summary(result: &MapResult) {
    println!("Dataset: {}", result.dataset_root.display());
    println!("Vocabulary: {}", result.vocab_dir.display());
    println!("Output: {}", result.output.display());
    println!(
        "Split: train {} / validation {} / test {}{}",
        result.split_sizes.train,
        result.split_sizes.validation,
        result.split_sizes.test,
        if result.pre_split { " (pre-split)" } else { "" }
    );
    println!(
        "Partition: {} ({} patients, {} without enough condition visits)",
        result.partition, result.partition_size, result.ineligible
    );

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Domain"),
        header_cell("Vocabulary"),
        header_cell("Codes"),
        header_cell("Resolved"),
        header_cell("Unmapped"),
        header_cell("Coverage"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..=5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for setup in &result.domains {
        let coverage = result.report.domain(setup.domain);
        table.add_row(coverage_row(
            Cell::new(setup.domain.as_str()).add_attribute(Attribute::Bold),
            Cell::new(vocabulary_label(setup)),
            coverage,
        ));
    }
    let total = result.report.total();
    table.add_row(coverage_row(
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        &total,
    ));
    println!("{table}");

    println!(
        "Patients: {} normalized, {} with unmapped codes; {} snapshot(s) written",
        result.report.patients,
        result.report.patients_with_unmapped.len(),
        result.snapshots
    );
}

pub fn print_lookup(result: &LookupResult) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Field"), header_cell("Value")]);
    apply_table_style(&mut table);
    table.add_row(vec![Cell::new("Standard"), Cell::new(result.standard.name())]);
    table.add_row(vec![Cell::new("Code"), Cell::new(&result.code)]);
    if result.resolved_code != result.code {
        table.add_row(vec![Cell::new("Looked up"), Cell::new(&result.resolved_code)]);
    }
    let term = match &result.term {
        Some(term) => Cell::new(term).fg(Color::Green),
        None => Cell::new("not found").fg(Color::Red),
    };
    table.add_row(vec![Cell::new("Term"), term]);
    if result.lineage.len() > 1 {
        table.add_row(vec![
            Cell::new("Lineage"),
            Cell::new(result.lineage.join(" > ")),
        ]);
    }
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn coverage_row(domain: Cell, vocabulary: Cell, coverage: &DomainCoverage) -> Vec<Cell> {
    vec![
        domain,
        vocabulary,
        Cell::new(coverage.codes),
        Cell::new(coverage.resolved),
        count_cell(coverage.unmapped, Color::Yellow),
        ratio_cell(coverage),
    ]
}

fn vocabulary_label(setup: &DomainSetup) -> String {
    let mut label = match setup.source {
        Some(source) => format!("{source} -> {}", setup.standard),
        None => setup.standard.to_string(),
    };
    if let Some(depth) = setup.depth {
        label.push_str(&format!(" (level {depth})"));
    }
    label
}

fn ratio_cell(coverage: &DomainCoverage) -> Cell {
    if coverage.codes == 0 {
        return dim_cell("-");
    }
    let percent = coverage.coverage_ratio() * 100.0;
    let color = if coverage.unmapped == 0 {
        Color::Green
    } else {
        Color::Yellow
    };
    Cell::new(format!("{percent:.1}%")).fg(color)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
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
