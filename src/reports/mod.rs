use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use sslc::api::{FileAnalysis, LayoutReport, SizeAnalysis, StructAnalysis};
use sslc::error::SslcResult;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const SLOT_RULE: &str = "----------";

fn slot_end_line(out: &mut String, slot: usize, analysis: &StructAnalysis) {
    let usage = analysis.breakdown.slots[slot];
    let _ = writeln!(
        out,
        "  //{} end of slot {} | bytes in: {} | bytes left: {}",
        SLOT_RULE,
        slot + 1,
        usage.bytes_in,
        usage.bytes_left()
    );
}

fn render_struct(out: &mut String, label: &str, analysis: &StructAnalysis) {
    let record = &analysis.record;
    let _ = writeln!(out, "struct {} {{ // solidity file: {}\n", record.name, label);

    let mut open_slot = 0;
    for (field, &slot) in record.fields.iter().zip(&analysis.breakdown.member_slots) {
        if slot != open_slot {
            slot_end_line(out, open_slot, analysis);
            out.push('\n');
            open_slot = slot;
        }
        let _ = writeln!(out, "  {} // bytes: {}", field.declaration, field.byte_size);
    }
    if !analysis.breakdown.slots.is_empty() {
        slot_end_line(out, open_slot, analysis);
    }

    let report = &analysis.report;
    let _ = write!(
        out,
        "\n}} // current slot count = {} | optimized slot count = {}",
        report.current, report.optimized
    );
    if report.timed_out {
        out.push_str(" (best effort, search timed out)");
    }
    out.push_str("\n\n");
}

/// Annotated struct listings followed by the list of structs worth reordering.
pub fn render_text(analyses: &[FileAnalysis]) -> String {
    let mut out = String::new();
    for file in analyses {
        for analysis in &file.structs {
            render_struct(&mut out, &file.label, analysis);
        }
    }

    out.push_str("// STRUCTS THAT CAN BE OPTIMIZED\n");
    out.push_str("// =============================\n");

    let mut found = false;
    for file in analyses {
        for report in file.structs.iter().map(|s| &s.report) {
            if !report.can_be_optimized() {
                continue;
            }
            found = true;
            let _ = writeln!(out, "// file: {}", file.label);
            let _ = writeln!(out, "// struct: {}", report.qualified_name());
            let _ = writeln!(out, "// current num storage slots: {}", report.current);
            let _ = writeln!(out, "// possible num storage slots: {}", report.optimized);
            out.push_str("// -----------------------------\n");
        }
    }

    if !found {
        out.push_str("// All structs seem to be efficiently laid out in memory\n");
    }
    out
}

pub fn print_summary_table(reports: &[LayoutReport]) {
    if reports.is_empty() {
        println!("\nNo structs found.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("File").add_attribute(Attribute::Bold),
        Cell::new("Struct").add_attribute(Attribute::Bold),
        Cell::new("Current"),
        Cell::new("Optimized").fg(Color::Cyan),
        Cell::new("Saved").fg(Color::Green),
        Cell::new("Search"),
    ]);

    for i in 2..=4 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    for r in reports {
        let saved = if r.slots_saved > 0 {
            Cell::new(r.slots_saved)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold)
        } else {
            Cell::new(r.slots_saved)
        };
        let search = if r.timed_out {
            Cell::new(r.termination).fg(Color::Yellow)
        } else {
            Cell::new(r.termination)
        };

        table.add_row(vec![
            Cell::new(&r.source),
            Cell::new(r.qualified_name()).add_attribute(Attribute::Bold),
            Cell::new(r.current),
            Cell::new(r.optimized).fg(Color::Cyan),
            saved,
            search,
        ]);
    }
    println!("\n{}", table);
}

pub fn write_json(path: &Path, reports: &[LayoutReport]) -> SslcResult<()> {
    let json = serde_json::to_string_pretty(reports)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn write_csv(path: &Path, reports: &[LayoutReport]) -> SslcResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for report in reports {
        writer.serialize(report)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn print_pack_result(sizes: &[u8], analysis: &SizeAnalysis) {
    let packing = &analysis.packing;
    let sizes_str = sizes
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let rows: Vec<(&str, String)> = vec![
        ("Sizes", sizes_str),
        ("Total bytes", analysis.total_bytes.to_string()),
        ("Current slots", analysis.current.to_string()),
        ("Optimized slots", analysis.optimized.to_string()),
        ("Slots saved", analysis.slots_saved().to_string()),
        ("Lower bound", analysis.lower_bound().to_string()),
        ("Reduced slots", packing.reduced_slots.to_string()),
        ("Residual items", packing.residual_items.to_string()),
        ("Orderings evaluated", packing.orderings_evaluated.to_string()),
        ("Orderings skipped", packing.orderings_skipped.to_string()),
        ("Termination", packing.termination.to_string()),
        ("Timed out", packing.timed_out.to_string()),
    ];

    for (name, value) in rows {
        table.add_row(vec![
            Cell::new(name).add_attribute(Attribute::Bold),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{}", table);
}

#[cfg(test)]
mod tests {
    use super::*;
    use sslc::api::analyze_source;
    use sslc::config::Config;
    use sslc::optimizer::NoProgress;

    const SRC: &str = "contract C {\n    struct S {\n        uint8 a; // first\n        uint256 b;\n        uint8 c;\n    }\n}\n";

    fn analyze(src: &str) -> Vec<FileAnalysis> {
        vec![analyze_source("C.sol", src, &Config::default(), &NoProgress).unwrap()]
    }

    #[test]
    fn test_render_text_layout() {
        let text = render_text(&analyze(SRC));
        let expected = "\
struct S { // solidity file: C.sol

  uint8 a; // bytes: 1
  //---------- end of slot 1 | bytes in: 1 | bytes left: 31

  uint256 b; // bytes: 32
  //---------- end of slot 2 | bytes in: 32 | bytes left: 0

  uint8 c; // bytes: 1
  //---------- end of slot 3 | bytes in: 1 | bytes left: 31

} // current slot count = 3 | optimized slot count = 2

// STRUCTS THAT CAN BE OPTIMIZED
// =============================
// file: C.sol
// struct: C.S
// current num storage slots: 3
// possible num storage slots: 2
// -----------------------------
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_text_when_nothing_to_gain() {
        let src = "contract C { struct S { uint128 a; uint128 b; } }";
        let text = render_text(&analyze(src));
        assert!(text.contains("} // current slot count = 1 | optimized slot count = 1"));
        assert!(text.ends_with("// All structs seem to be efficiently laid out in memory\n"));
    }

    #[test]
    fn test_json_and_csv_outputs() {
        let analyses = analyze(SRC);
        let reports: Vec<LayoutReport> = analyses[0].structs.iter().map(|s| s.report.clone()).collect();
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("out.json");
        write_json(&json_path, &reports).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json[0]["record"], "S");
        assert_eq!(json[0]["slotsSaved"], 1);
        assert_eq!(json[0]["termination"], "exact");

        let csv_path = dir.path().join("out.csv");
        write_csv(&csv_path, &reports).unwrap();
        let csv_text = fs::read_to_string(&csv_path).unwrap();
        let mut lines = csv_text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "source,container,record,current,optimized,slotsSaved,timedOut,termination"
        );
        assert_eq!(lines.next().unwrap(), "C.sol,C,S,3,2,1,false,exact");
    }
}
