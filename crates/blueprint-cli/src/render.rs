use std::fmt::Write;

use blueprint_core::{ColumnOwner, DatabaseBlueprint, DependencyReport, RelationBlueprint};

/// Text summary of a blueprint: one block per schema, one row per relation.
pub fn render_blueprint(graph: &DatabaseBlueprint, table: Option<&str>) -> String {
    let mut out = String::new();

    for schema in graph.schemas() {
        let relations: Vec<&RelationBlueprint> = graph
            .relations_in(schema)
            .filter(|relation| table.is_none_or(|name| relation.name() == name))
            .collect();
        if table.is_some() && relations.is_empty() {
            continue;
        }

        let _ = writeln!(
            out,
            "{} has {} relation{}",
            schema.name(),
            relations.len(),
            plural(relations.len())
        );

        let rows: Vec<[String; 3]> = relations
            .iter()
            .map(|relation| {
                [
                    relation.unique_name().to_string(),
                    relation.column_names().join(", "),
                    relation.foreign_key_names().join(", "),
                ]
            })
            .collect();
        write_table(&mut out, ["relation", "columns", "foreign keys"], &rows);
        out.push('\n');
    }

    let errors = graph.link_errors();
    if !errors.is_empty() {
        let _ = writeln!(out, "{} link error{}", errors.len(), plural(errors.len()));
        for error in errors {
            let _ = writeln!(out, "  {error}");
        }
    }

    out
}

pub fn render_order(graph: &DatabaseBlueprint, report: &DependencyReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {} relation{}, {} dependenc{}",
        graph.unique_name(),
        report.summary.nodes,
        plural(report.summary.nodes),
        report.summary.edges,
        if report.summary.edges == 1 { "y" } else { "ies" }
    );

    match (&report.order, &report.cycle) {
        (Some(order), _) => {
            for (position, relation) in order.iter().enumerate() {
                let _ = writeln!(out, "{:>4}. {relation}", position + 1);
            }
        }
        (None, Some(cycle)) => {
            let _ = writeln!(out, "cycle between: {}", cycle.join(", "));
        }
        (None, None) => {}
    }

    out
}

fn write_table<const N: usize>(out: &mut String, header: [&str; N], rows: &[[String; N]]) {
    let mut widths = header.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut line = |cells: [&str; N]| {
        let mut rendered = String::new();
        for (index, (cell, width)) in cells.iter().zip(widths).enumerate() {
            if index + 1 == N {
                rendered.push_str(cell);
            } else {
                let _ = write!(rendered, "{cell:<width$}  ");
            }
        }
        let _ = writeln!(out, "{}", rendered.trim_end());
    };

    line(header);
    for row in rows {
        line(row.each_ref().map(String::as_str));
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}
