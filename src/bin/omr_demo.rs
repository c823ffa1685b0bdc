use omr_linker::config::load_config;
use omr_linker::diagnostics::{write_json_file, PageReport};
use omr_linker::input::load_page;
use std::env;
use std::path::Path;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    env_logger::init();
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;

    let page = load_page(&config.input).map_err(|e| e.to_string())?;
    let mut sheet = page
        .into_sheet()
        .map_err(|e| format!("Invalid page {}: {e}", config.input.display()))?;
    let mut report = sheet.process(&config.clusters, &config.stems);
    if config.output.include_graphs {
        report.graphs = sheet.snapshots();
    }

    if !config.output.quiet {
        print_text_summary(&report);
    }

    match &config.output.json_out {
        Some(path) => {
            write_json_file(path, &report)?;
            println!("JSON report written to {}", path.display());
        }
        None => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| format!("Failed to serialize JSON: {e}"))?;
            println!("{json}");
        }
    }
    Ok(())
}

fn usage() -> String {
    "Usage: omr_demo <config.json>".to_string()
}

fn print_text_summary(report: &PageReport) {
    let clusters = &report.clusters;
    println!("Staff clustering");
    println!(
        "  interline={} combs={} staves={} discarded_filaments={}",
        clusters.interline,
        clusters.comb_count,
        clusters.clusters.len(),
        clusters.discarded.len()
    );
    for staff in &clusters.clusters {
        println!(
            "  staff #{}: lines={} box=({}, {}, {}x{})",
            staff.id.0,
            staff.lines.len(),
            staff.bounds.x,
            staff.bounds.y,
            staff.bounds.w,
            staff.bounds.h
        );
    }

    println!("\nStem linking");
    for system in &report.systems {
        println!(
            "  system #{}: heads={} stems={} head_links={} beam_links={} exclusions={} \
             ambiguous={} removed={} skipped={}",
            system.system_id,
            system.heads,
            system.stems_created,
            system.head_stem_links,
            system.beam_stem_links,
            system.exclusions,
            system.ambiguous_heads.len(),
            system.removed_heads.len(),
            system.skipped_heads
        );
    }

    println!("\nTimings (ms):");
    for stage in &report.timing.stages {
        println!("  {}={:.3}", stage.label, stage.elapsed_ms);
    }
    println!("  total={:.3}", report.timing.total_ms);
}
