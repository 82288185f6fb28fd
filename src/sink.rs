use std::path::{Path, PathBuf};

use crate::aggregate::Report;
use crate::error::Result;
use crate::table::Table;

/// Where reports and exports end up. Paths are relative to the sink's root.
pub trait ReportSink {
    fn write_report(&mut self, title: &str, report: &Report) -> Result<()>;
    fn write_table(&mut self, path: &str, table: &Table) -> Result<()>;
    fn write_lines(&mut self, path: &str, lines: &[String]) -> Result<()>;
}

/// Split a report title such as `expenses/2024/d-byMonth` into its folder
/// (`expenses/2024`) and file stem (`expenses-2024-d-byMonth`).
pub fn report_location(title: &str) -> (String, String) {
    let folder = match title.rsplit_once('/') {
        Some((folder, _)) => folder.to_string(),
        None => String::new(),
    };
    (folder, title.replace('/', "-"))
}

/// Writes CSV and text files below a root directory.
pub struct FileSink {
    root: PathBuf,
}

impl FileSink {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn prepare(&self, relative: &str) -> Result<PathBuf> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    fn write_csv(&self, path: &Path, table: &Table) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(&table.columns)?;
        for row in &table.rows {
            wtr.write_record(row.iter().map(|v| v.to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ReportSink for FileSink {
    fn write_report(&mut self, title: &str, report: &Report) -> Result<()> {
        let (folder, stem) = report_location(title);
        let base = if folder.is_empty() {
            stem
        } else {
            format!("{folder}/{stem}")
        };

        let all = self.prepare(&format!("{base}-dataAll.csv"))?;
        self.write_csv(&all, &report.all)?;
        let top = self.prepare(&format!("{base}-dataTop25.csv"))?;
        self.write_csv(&top, &report.top)?;

        let chart = self.prepare(&format!("{base}-chartBar.csv"))?;
        let mut wtr = csv::Writer::from_path(&chart)?;
        wtr.write_record([report.dimension.as_str(), "Amount"])?;
        for (label, amount) in report.chart_series() {
            wtr.write_record([label, amount.to_string()])?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_table(&mut self, path: &str, table: &Table) -> Result<()> {
        let path = self.prepare(path)?;
        self.write_csv(&path, table)
    }

    fn write_lines(&mut self, path: &str, lines: &[String]) -> Result<()> {
        let path = self.prepare(path)?;
        let mut content = String::new();
        for line in lines {
            content.push_str(line);
            content.push('\n');
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Keeps everything in memory.
#[cfg(test)]
#[derive(Default)]
pub struct MemorySink {
    pub reports: Vec<(String, Report)>,
    pub tables: Vec<(String, Table)>,
    pub lines: Vec<(String, Vec<String>)>,
}

#[cfg(test)]
impl MemorySink {
    pub fn report(&self, title: &str) -> Option<&Report> {
        self.reports.iter().find(|(t, _)| t == title).map(|(_, r)| r)
    }

    pub fn table(&self, path: &str) -> Option<&Table> {
        self.tables.iter().find(|(p, _)| p == path).map(|(_, t)| t)
    }
}

#[cfg(test)]
impl ReportSink for MemorySink {
    fn write_report(&mut self, title: &str, report: &Report) -> Result<()> {
        self.reports.push((title.to_string(), report.clone()));
        Ok(())
    }

    fn write_table(&mut self, path: &str, table: &Table) -> Result<()> {
        self.tables.push((path.to_string(), table.clone()));
        Ok(())
    }

    fn write_lines(&mut self, path: &str, lines: &[String]) -> Result<()> {
        self.lines.push((path.to_string(), lines.to_vec()));
        Ok(())
    }
}
