use crate::timing::scheduler::{TimingAnomaly, TimingSample, TimingSummary};
use crate::timing::statistics::{RollingStat, TimingStatistics};

use chrono::Local;
use colored::Colorize;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Logs a message to a file with timestamp
///
/// # Arguments
///
/// * `log_dir` - Directory holding the log files (created when missing)
/// * `filename` - The name of the log file inside `log_dir`
/// * `message` - The message to log
pub fn log_to_file(log_dir: &Path, filename: &str, message: &str) -> io::Result<()> {
    if !log_dir.exists() {
        fs::create_dir_all(log_dir)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(filename))?;

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");

    writeln!(file, "\n--- Log entry at {} ---", timestamp)?;
    writeln!(file, "{}", message)?;
    writeln!(file, "--- End of entry ---\n")?;
    file.flush()?;

    Ok(())
}

/// Logs a message to a file with a detailed formatted header
pub fn log_with_header(log_dir: &Path, filename: &str, header: &str, message: &str) -> io::Result<()> {
    let formatted_message = format!(
        "===== {} =====\n{}\n====================",
        header, message
    );
    log_to_file(log_dir, filename, &formatted_message)
}

// TIMING CSV ------------------------------------------------------------------

/// One CSV row per presented frame.
pub struct TimingLog {
    writer: csv::Writer<File>,
}

impl TimingLog {
    pub const HEADERS: [&'static str; 5] = ["frame", "on", "flip_ms", "err_pre_ms", "err_post_ms"];

    pub fn create<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(Self::HEADERS)?;
        Ok(Self { writer })
    }

    pub fn record(&mut self, sample: &TimingSample) -> crate::Result<()> {
        self.writer.write_record(&[
            sample.frame.to_string(),
            (sample.on as u8).to_string(),
            format!("{:.4}", sample.flip_duration_ms),
            format!("{:.4}", sample.error_pre_ms),
            format!("{:.4}", sample.error_post_ms),
        ])?;
        Ok(())
    }

    pub fn flush(&mut self) -> crate::Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

// CONSOLE OUTPUT --------------------------------------------------------------

pub fn print_anomaly(anomaly: &TimingAnomaly) {
    let message = format!(
        "⚠️  Flip too long: {:.3} ms | Frame {} | {} | Err pre {:.3} ms | Err post {:.3} ms",
        anomaly.flip_ms,
        anomaly.frame,
        if anomaly.on { "ON" } else { "OFF" },
        anomaly.err_pre_ms,
        anomaly.err_post_ms
    );
    println!("{}", message.yellow());
}

fn stat_row(label: &str, stat: &RollingStat) -> String {
    let s = stat.summary();
    format!(
        "{:5} {:12}: mean={:.3} ms  std={:.3}  min={:.3}  max={:.3}",
        label,
        stat.name(),
        s.mean,
        s.stdev,
        s.min,
        s.max
    )
}

pub fn print_report(statistics: &TimingStatistics) {
    println!(
        "\n{}",
        format!("— summary over last {} frames —", statistics.flip_ms.n()).bold()
    );
    for stat in statistics.all_frames() {
        println!("{}", stat_row("Total", stat));
    }
    println!();
    for stat in statistics.on_frames() {
        println!("{}", stat_row("On", stat));
    }
    println!("\n");
}

pub fn print_summary(summary: &TimingSummary) {
    println!("\n{}", "Final timing summaries:".bold());
    println!(
        "frame rate  : {:.3} Hz, {} off frames per flash",
        summary.frame_rate_hz, summary.off_frames_per_on
    );
    println!(
        "frames      : {} ({} pulses{})",
        summary.frames,
        summary.pulses,
        if summary.cancelled { ", cancelled" } else { "" }
    );
    for (name, s) in summary.named_stats() {
        println!(
            "{:12}: mean={:.3} std={:.3} min={:.3} max={:.3} n={}",
            name, s.mean, s.stdev, s.min, s.max, s.n
        );
    }
    let anomalies = format!(
        "anomalies   : {} over-long flips ({} next to a flash)",
        summary.anomalies, summary.flash_adjacent_anomalies
    );
    if summary.anomalies > 0 {
        println!("{}", anomalies.yellow());
    } else {
        println!("{}", anomalies);
    }
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_to_file_creates_dir_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        log_to_file(&log_dir, "run.log", "first").unwrap();
        log_with_header(&log_dir, "run.log", "Header", "second").unwrap();

        let text = fs::read_to_string(log_dir.join("run.log")).unwrap();
        assert!(text.contains("first"));
        assert!(text.contains("===== Header =====\nsecond"));
        assert_eq!(text.matches("--- End of entry ---").count(), 2);
    }

    #[test]
    fn timing_log_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timing").join("frames.csv");
        let mut log = TimingLog::create(&path).unwrap();
        log.record(&TimingSample {
            frame: 5,
            on: true,
            flip_duration_ms: 1.25,
            error_pre_ms: -0.5,
            error_post_ms: 0.0,
        })
        .unwrap();
        log.flush().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("frame,on,flip_ms,err_pre_ms,err_post_ms"));
        assert_eq!(lines.next(), Some("5,1,1.2500,-0.5000,0.0000"));
    }
}
