use ancestor_expander::{parse_args, run_headless, RunReport};
use colored::*;

fn print_report(report: &RunReport) {
    let stats = &report.stats;
    println!("{}", "Ancestor expansion finished".green().bold());
    println!("  couples shown     {}", report.couples.len().to_string().bold());
    println!("  ticks             {} ({} idle)", stats.ticks, stats.idle_ticks);
    println!("  expanded          {}", stats.activated.to_string().cyan());
    println!("  already expanded  {}", stats.already_expanded);
    println!("  missing           {}", stats.missing);
    println!("  duplicates        {}", stats.duplicates);
    if report.pending > 0 {
        println!("  {}", format!("{} target(s) left in the queue", report.pending).yellow());
    }
    if !report.stopped_by_user {
        println!("  {}", "engine was not stopped by the stop control".yellow());
    }
}

fn main() {
    let cli_args = parse_args();

    let report = match run_headless(&cli_args) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    if cli_args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                std::process::exit(1);
            }
        }
    } else {
        print_report(&report);
    }
}
