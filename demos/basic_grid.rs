/// Basic Grid Example
///
/// This example demonstrates:
/// - Loading a dataset with typed columns
/// - Filtering with string, number, date and bool expressions
/// - Sorting and paging through the result

use gridview::{Grid, LoadOptions, PageSize, SortOrder, TableOptions};

const DATA: &str = r##"{
    "cols": {
        "id": {"type": "number", "unique": true, "friendly": "#"},
        "name": {"type": "string"},
        "email": {"type": "string"},
        "age": {"type": "number"},
        "joined": {"type": "date"},
        "admin": {"type": "bool"}
    },
    "rows": [
        {"id": 1, "name": "Alice", "email": "alice@example.com", "age": 30, "joined": "2021-03-01", "admin": true},
        {"id": 2, "name": "Bob", "email": "bob@example.com", "joined": "2022-07-15", "admin": false},
        {"id": 3, "name": "Charlie", "email": "charlie@example.org", "age": 25, "joined": "2023-01-20"},
        {"id": 4, "name": "Diana", "email": "diana@example.com", "age": 41, "joined": "2020-11-05", "admin": false},
        {"id": 5, "name": "Eve", "email": "eve@example.org", "age": 35, "joined": "2024-02-29", "admin": true}
    ]
}"##;

fn print_page(grid: &Grid) {
    let page = grid.current_view();
    println!("   columns: {}", page.columns.join(", "));
    for row in &page.rows {
        println!(
            "   {:>2} {:<8} {:<22} {:>3}",
            row.get("id"),
            row.get("name"),
            row.get("email"),
            row.get("age")
        );
    }
    println!("   {}\n", page.summary());
}

fn main() {
    println!("=== Gridview Basic Grid Example ===\n");

    println!("1. Loading dataset...");
    let mut grid = Grid::new(TableOptions::default());
    grid.load_json(DATA, LoadOptions::default()).unwrap();
    print_page(&grid);

    println!("2. Filtering emails containing '.org'...");
    grid.set_filter("email", ".org").unwrap();
    print_page(&grid);

    println!("3. Adding age between 30 and 40...");
    grid.set_filter("age", "30..40").unwrap();
    print_page(&grid);

    println!("4. Clearing filters, keeping admins only...");
    grid.clear_filter("email").unwrap();
    grid.clear_filter("age").unwrap();
    grid.set_filter("admin", true).unwrap();
    print_page(&grid);

    println!("5. Everyone who joined in the last 3 years (date offsets are days)...");
    grid.set_filter("admin", "").unwrap();
    grid.set_filter("joined", "-1095..1").unwrap();
    print_page(&grid);

    println!("6. Sorting by name, descending, two rows per page...");
    grid.clear_filter("joined").unwrap();
    grid.set_sort("name", SortOrder::Descending).unwrap();
    grid.set_page_size(PageSize::Rows(2));
    print_page(&grid);

    println!("7. Page 3...");
    grid.set_page(3);
    print_page(&grid);

    let links = grid.page_links();
    let numbers: Vec<String> = links
        .links
        .iter()
        .map(|l| if l.current { format!("[{}]", l.page) } else { l.page.to_string() })
        .collect();
    println!("   pager: {}", numbers.join(" "));

    println!("\n=== Example Complete ===");
}
