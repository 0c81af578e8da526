//! Output formatting for scan results

use anyhow::Result;
use serde_json::json;
use std::time::Duration;

use httpscan_common::ScanReport;

/// Print scan results in the specified format. `log` prints nothing: the
/// reporter has already logged every result line.
pub fn print_results(results: &[ScanReport], format: &str, scan_duration: Duration) -> Result<()> {
    match format.trim().to_lowercase().as_str() {
        "log" | "" => {}
        "json" => println!("{}", render_json(results, scan_duration)?),
        "csv" => print!("{}", render_csv(results)),
        "text" => print_table(results, scan_duration),
        other => {
            eprintln!("Warning: Unknown format '{}', results were logged only", other);
        }
    }
    Ok(())
}

fn print_table(results: &[ScanReport], scan_duration: Duration) {
    if results.is_empty() {
        println!("\nNo results to display.\n");
        return;
    }

    println!("\n{:-<90}", "");
    println!("{:<40} {:<8} {:<24} {}", "HOST", "STATUS", "IDENTITY", "META");
    println!("{:-<90}", "");

    let mut identified = 0;
    for report in results {
        if report.identity.is_matched() {
            identified += 1;
        }
        println!(
            "{:<40} {:<8} {:<24} {}",
            report.target.to_string(),
            report.status,
            truncate(&report.identity.name, 24),
            report.identity.meta_display()
        );
    }

    println!("{:-<90}", "");
    println!("\nSummary:");
    println!("  Fingerprinted: {}", results.len());
    println!("  Identified: {}", identified);
    println!("  Unidentified: {}", results.len() - identified);
    println!("  Scan duration: {}", format_duration(scan_duration));
    println!();
}

fn render_json(results: &[ScanReport], scan_duration: Duration) -> Result<String> {
    let output = json!({
        "scan_info": {
            "duration_seconds": scan_duration.as_secs_f64(),
            "duration_formatted": format_duration(scan_duration),
            "total_results": results.len(),
        },
        "results": results,
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

fn render_csv(results: &[ScanReport]) -> String {
    let mut out = String::from("ip,port,status,identity,definition,meta\n");
    for report in results {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            report.target.ip,
            report.target.port,
            report.status,
            csv_field(&report.identity.name),
            csv_field(report.identity.definition.as_deref().unwrap_or("")),
            csv_field(&report.identity.meta_display()),
        ));
    }
    out
}

fn csv_field(value: &str) -> String {
    let cleaned = value.replace(['\r', '\n'], " ");
    format!("\"{}\"", cleaned.replace('"', "\"\""))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

/// Format duration in a human-readable way
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs == 0 {
        format!("{}ms", millis)
    } else if total_secs < 60 {
        if millis > 0 {
            format!("{}.{:03}s", total_secs, millis)
        } else {
            format!("{}s", total_secs)
        }
    } else {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        if secs > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}m", mins)
        }
    }
}
