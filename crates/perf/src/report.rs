//! Text report of benchmark results.

use crate::utils::{format_duration, format_rows, format_throughput, BenchResult};

pub struct BenchEntry {
    pub name: String,
    pub rows: usize,
    pub result: BenchResult,
}

/// Results grouped by section, printed in the order they were added.
#[derive(Default)]
pub struct Report {
    sections: Vec<(String, Vec<BenchEntry>)>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, section: &str, name: &str, rows: usize, result: BenchResult) {
        let entry = BenchEntry {
            name: name.to_string(),
            rows,
            result,
        };
        match self.sections.iter_mut().find(|(title, _)| title == section) {
            Some((_, entries)) => entries.push(entry),
            None => self.sections.push((section.to_string(), vec![entry])),
        }
    }

    fn mean_of(&self, section: &str, name: &str) -> Option<f64> {
        self.sections
            .iter()
            .find(|(title, _)| title == section)?
            .1
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.result.mean.as_secs_f64())
    }

    /// Mean time of `name` divided by mean time of `baseline`, in one section.
    pub fn ratio(&self, section: &str, name: &str, baseline: &str) -> Option<f64> {
        let base = self.mean_of(section, baseline)?;
        if base == 0.0 {
            return None;
        }
        Some(self.mean_of(section, name)? / base)
    }

    pub fn print_summary(&self) {
        println!("╔══════════════════════════════════════════════════════════════════╗");
        println!("║                      PERFORMANCE SUMMARY                         ║");
        println!("╚══════════════════════════════════════════════════════════════════╝\n");

        for (title, entries) in &self.sections {
            println!("┌─ {} ─", title);
            for entry in entries {
                println!(
                    "│ {:<28} [{:>6}]: {:>12} ± {:>10} ({})",
                    entry.name,
                    format_rows(entry.rows),
                    format_duration(entry.result.mean),
                    format_duration(entry.result.std_dev),
                    format_throughput(entry.result.throughput(entry.rows)),
                );
            }
            if let Some(ratio) = self.ratio(title, "lazy", "eager") {
                println!("│ lazy / eager: {:.2}x", ratio);
            }
            println!("└─");
            println!();
        }
    }
}
