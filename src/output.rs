use std::io::{self, Write};

use serde::Serialize;

use crate::app::NormalizeResult;
use crate::filter::FilterOptions;
use crate::graph::GraphDocument;
use crate::view::{AtlasSummary, DatasetDetail, TableRow};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_graph(document: &GraphDocument) -> io::Result<()> {
        Self::print_json(document)
    }

    pub fn print_table(rows: &[TableRow]) -> io::Result<()> {
        Self::print_json(&rows)
    }

    pub fn print_options(options: &FilterOptions) -> io::Result<()> {
        Self::print_json(options)
    }

    pub fn print_summary(summary: &AtlasSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    pub fn print_detail(detail: &DatasetDetail) -> io::Result<()> {
        Self::print_json(detail)
    }

    pub fn print_normalize(result: &NormalizeResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

/// Plain-text rendering for people at a terminal.
pub struct TextOutput;

impl TextOutput {
    pub fn print_table(rows: &[TableRow]) -> io::Result<()> {
        let mut stdout = io::stdout();
        stdout.write_all(render_table(rows).as_bytes())
    }

    pub fn print_options(options: &FilterOptions) -> io::Result<()> {
        let mut stdout = io::stdout();
        writeln!(stdout, "Robots ({}):", options.robots.len())?;
        for robot in &options.robots {
            writeln!(stdout, "  {robot}")?;
        }
        writeln!(stdout, "Environments ({}):", options.environments.len())?;
        for environment in &options.environments {
            writeln!(stdout, "  {environment}")?;
        }
        Ok(())
    }

    pub fn print_summary(summary: &AtlasSummary) -> io::Result<()> {
        let mut stdout = io::stdout();
        writeln!(stdout, "{}", summary.headline())?;
        writeln!(stdout, "  total datasets: {}", summary.total)?;
        writeln!(stdout, "  robots: {}", summary.robots)?;
        writeln!(stdout, "  environments: {}", summary.environments)?;
        writeln!(stdout, "  robot images: {}", summary.robot_images)
    }

    pub fn print_detail(detail: &DatasetDetail) -> io::Result<()> {
        let mut stdout = io::stdout();
        stdout.write_all(render_detail(detail).as_bytes())
    }
}

pub fn render_table(rows: &[TableRow]) -> String {
    let header = [
        "ID",
        "Name",
        "Robot",
        "Environment",
        "Format",
        "Frequency",
        "Sensors",
        "Views",
        "URL",
    ];
    let cells: Vec<[&str; 9]> = rows
        .iter()
        .map(|row| {
            [
                row.id.as_str(),
                row.name.as_str(),
                row.robot.as_str(),
                row.environment.as_str(),
                row.format.as_str(),
                row.frequency.as_str(),
                row.sensors.as_str(),
                row.views.as_str(),
                row.url.as_str(),
            ]
        })
        .collect();

    let mut widths = header.map(|title| title.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &header, &widths);
    for row in &cells {
        push_line(&mut out, row, &widths);
    }
    out
}

pub fn render_detail(detail: &DatasetDetail) -> String {
    let mut lines = vec![detail.name.clone()];
    if !detail.description.is_empty() {
        lines.push(detail.description.clone());
    }
    lines.push(format!("Robot: {}", detail.robot));
    lines.push(format!("Gripper: {}", detail.gripper));
    lines.push(format!("Sensors: {}", detail.sensors.join(", ")));
    lines.push(format!("Views: {}", detail.views.join(", ")));
    lines.push(format!("Format: {}", detail.format));
    lines.push(format!("Freq: {}", detail.frequency));
    if let Some(url) = &detail.url {
        lines.push(format!("Website: {url}"));
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn push_line(out: &mut String, cells: &[&str; 9], widths: &[usize; 9]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_columns_are_aligned() {
        let rows = vec![TableRow {
            id: "bridge".to_string(),
            name: "Bridge".to_string(),
            robot: "WidowX 250s".to_string(),
            environment: "Kitchen".to_string(),
            format: "RLDS".to_string(),
            frequency: "5 Hz".to_string(),
            sensors: "RGB".to_string(),
            views: "External".to_string(),
            url: String::new(),
        }];
        let rendered = render_table(&rows);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ID      Name    Robot"));
        assert!(lines[1].starts_with("bridge  Bridge  WidowX 250s"));
    }
}
