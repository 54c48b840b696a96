/// Selection Example
///
/// This example demonstrates:
/// - Selecting rows by their unique value
/// - Select-all over a filtered view, skipping non-checkable rows
/// - Keeping the selection across a background refresh
/// - Exporting the selected rows and the changes a renderer would redraw

use gridview::{ColumnValue, Dataset, ExportOptions, Grid, Invalidation, LoadOptions, TableOptions};
use serde_json::json;

fn orders(count: usize, skip: &[usize]) -> Dataset {
    let rows: Vec<serde_json::Value> = (1..=count)
        .filter(|i| !skip.contains(i))
        .map(|i| {
            json!({
                "order": format!("A-{:03}", i),
                "total": (i * 13) % 50,
                "status": if i % 4 == 0 { "shipped" } else { "open" },
                "checkable": i % 4 != 0,
            })
        })
        .collect();

    Dataset::from_value(json!({
        "cols": {
            "order": {"type": "string", "unique": true},
            "total": {"type": "number"},
            "status": {"type": "string"},
        },
        "rows": rows,
    }))
    .unwrap()
}

fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    println!("=== Gridview Selection Example ===\n");

    let mut grid = Grid::new(TableOptions::default());
    grid.load_dataset(orders(30, &[]), LoadOptions::default());
    grid.drain_changes();

    println!("1. Selecting A-002 and A-007...");
    grid.toggle_selection(&ColumnValue::from("A-002")).unwrap();
    grid.toggle_selection(&ColumnValue::from("A-007")).unwrap();
    println!("   {} selected\n", grid.selected_rows().len());

    println!("2. Trying to select shipped order A-008...");
    let selected = grid.toggle_selection(&ColumnValue::from("A-008")).unwrap();
    println!("   selected: {}\n", selected);

    println!("3. Selecting every open order with a total of 40 or more...");
    grid.set_filter("total", ">=40").unwrap();
    let added = grid.toggle_select_all(true).unwrap();
    println!("   {} added, {} selected\n", added, grid.selected_rows().len());

    let redraw = Invalidation::of(&grid.drain_changes());
    println!("   renderer redraws head: {}, body: {}, foot: {}\n", redraw.head, redraw.body, redraw.foot);

    println!("4. Background refresh without A-002...");
    grid.load_dataset(orders(30, &[2]), LoadOptions::refresh());
    println!(
        "   A-002 still selected: {}, A-007 still selected: {}\n",
        grid.is_selected(&ColumnValue::from("A-002")),
        grid.is_selected(&ColumnValue::from("A-007"))
    );

    println!("5. Exporting the selection...");
    let export = grid.export_data(ExportOptions { selected_only: true, ..Default::default() });
    println!("{}", serde_json::to_string_pretty(&export.rows).unwrap());

    println!("\n=== Example Complete ===");
}
