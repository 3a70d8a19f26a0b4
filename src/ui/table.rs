//! Console tables for `gcpops list`, `kinds` and `projects`

use crate::resource::{extract_json_value, get_color_for_value, ColumnDef, ListedResource};
use comfy_table::presets::NOTHING;
use comfy_table::{Attribute, Cell, Color, ColumnConstraint, ContentArrangement, Row, Table, Width};

/// Borderless table with a bold header row
pub fn plain_table<I, S>(headers: I, color: bool) -> Table
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_truncation_indicator("…");
    if color {
        table.enforce_styling();
    } else {
        table.force_no_tty();
    }
    table.set_header(headers.into_iter().map(|h| {
        let header: String = h.into();
        let cell = Cell::new(header);
        if color {
            cell.add_attribute(Attribute::Bold)
        } else {
            cell
        }
    }));
    table
}

/// Build the `list` table from the registry columns
///
/// Each column is capped at its registry width; longer values are cut to a
/// single line ending in `…`. Values with a color-map entry get that color.
fn resource_table(columns: &[ColumnDef], rows: &[ListedResource], color: bool) -> Table {
    let mut table = plain_table(columns.iter().map(|c| c.header.clone()), color);

    for row in rows {
        let mut cells = Row::from(columns.iter().map(|col| {
            let value = extract_json_value(&row.item, &col.json_path);
            let rgb = col
                .color_map
                .as_deref()
                .and_then(|map| get_color_for_value(map, &value));
            let cell = Cell::new(value);
            match rgb {
                Some([r, g, b]) if color => cell.fg(Color::Rgb { r, g, b }),
                _ => cell,
            }
        }));
        cells.max_height(1);
        table.add_row(cells);
    }

    for (column, def) in table.column_iter_mut().zip(columns) {
        column.set_constraint(ColumnConstraint::UpperBoundary(Width::Fixed(def.width)));
    }

    table
}

/// Render the `list` table as text, one line per row
pub fn render_table(columns: &[ColumnDef], rows: &[ListedResource], color: bool) -> String {
    let mut out = resource_table(columns, rows, color).to_string();
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Location, ResourceRef};
    use serde_json::json;

    fn column(header: &str, path: &str, width: u16) -> ColumnDef {
        ColumnDef {
            header: header.into(),
            json_path: path.into(),
            width,
            color_map: None,
        }
    }

    fn row(item: serde_json::Value) -> ListedResource {
        ListedResource {
            resource: ResourceRef::new("compute-instances", "p", "x", Location::Global),
            item,
        }
    }

    #[test]
    fn test_render_table_truncates_to_column_width() {
        let columns = vec![column("NAME", "name", 8), column("STATUS", "status", 10)];
        let rows = vec![row(json!({ "name": "very-long-instance-name", "status": "RUNNING" }))];

        let table = render_table(&columns, &rows, false);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("NAME"));
        assert!(lines[0].contains("STATUS"));
        assert!(lines[1].contains("RUNNING"));
        assert!(lines[1].contains('…'));
        assert!(!table.contains("very-long-instance-name"));
    }

    #[test]
    fn test_columns_line_up() {
        let columns = vec![column("NAME", "name", 20), column("STATUS", "status", 10)];
        let rows = vec![
            row(json!({ "name": "a", "status": "RUNNING" })),
            row(json!({ "name": "much-longer", "status": "STOPPED" })),
        ];

        let table = render_table(&columns, &rows, false);
        let offsets: Vec<usize> = table
            .lines()
            .skip(1)
            .filter_map(|l| l.find("RUNNING").or_else(|| l.find("STOPPED")))
            .collect();
        assert_eq!(offsets.len(), 2);
        assert_eq!(offsets[0], offsets[1]);
        assert_eq!(table.lines().next().and_then(|l| l.find("STATUS")), Some(offsets[0]));
    }

    #[test]
    fn test_missing_field_renders_dash() {
        let columns = vec![column("ZONE", "zone_short", 6)];
        let rows = vec![row(json!({ "name": "b" }))];
        let table = render_table(&columns, &rows, false);
        let lines: Vec<&str> = table.lines().map(str::trim).collect();
        assert_eq!(lines, vec!["ZONE", "-"]);
    }

    #[test]
    fn test_plain_table_has_no_escape_codes_without_color() {
        let mut table = plain_table(["KIND", "NAME"], false);
        table.add_row(vec!["compute-instances", "VM Instances"]);
        let text = table.to_string();
        assert!(!text.contains('\u{1b}'));
        assert!(text.contains("compute-instances"));
    }
}
