use std::path::Path;

use crate::output::{print_json, print_table};

pub fn run(file: &Path, json: bool) -> anyhow::Result<()> {
    let program = super::load_program(file)?;

    if json {
        return print_json(&program);
    }

    let rows = program
        .statements
        .iter()
        .map(|s| {
            vec![
                s.line_number.to_string(),
                s.summary(),
                s.comment.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["LINE", "STATEMENT", "COMMENT"], rows);

    if !program.invalid_lines.is_empty() {
        println!();
        println!("{} invalid lines:", program.invalid_lines.len());
        for line in &program.invalid_lines {
            println!("  {}: {} ({})", line.line_number, line.text, line.reason);
        }
    }
    Ok(())
}
