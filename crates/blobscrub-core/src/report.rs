//! Rendering of scrub results as JSON or as an aligned text table.
//!
//! The table has no borders: cells are left-aligned, padded to a per-column
//! minimum width and separated by two spaces. Long values are never
//! truncated or wrapped; they widen their column instead.

use std::io::Write;

use comfy_table::{presets, ColumnConstraint, ContentArrangement, Table, Width};

use crate::error::{ScrubError, ScrubResult};
use crate::result::{ScrubImageResult, ScrubResults};

pub const COLUMN_HEADERS: [&str; 5] = ["REPOSITORY", "TAG", "STATUS", "AFFECTED BLOB", "ERROR"];

pub const MIN_COLUMN_WIDTHS: [u16; 5] = [32, 24, 8, 24, 8];

/// Trailing spaces after each cell; column boundaries include them.
const COLUMN_PADDING: u16 = 2;

impl ScrubResults {
    /// `{"scrubResults": [...]}`, pretty-printed.
    pub fn to_json_pretty(&self) -> ScrubResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ScrubError::Serialization(e.to_string()))
    }

    pub fn write_json<W: Write>(&self, mut writer: W) -> ScrubResult<()> {
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| ScrubError::Serialization(e.to_string()))?;
        writeln!(writer)?;
        Ok(())
    }

    /// Write the header row followed by one row per result, in order.
    pub fn write_table<W: Write>(&self, mut writer: W) -> ScrubResult<()> {
        writer.write_all(self.render_table().as_bytes())?;
        Ok(())
    }

    pub fn render_table(&self) -> String {
        let mut out = String::new();
        for line in self.table().lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    fn table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::NOTHING)
            .set_content_arrangement(ContentArrangement::Disabled)
            .set_header(COLUMN_HEADERS);
        for result in self.iter() {
            table.add_row(cells(result));
        }

        let widths = self.column_widths();
        for (column, width) in table.column_iter_mut().zip(widths) {
            column
                .set_padding((0, COLUMN_PADDING))
                .set_constraint(ColumnConstraint::LowerBoundary(Width::Fixed(
                    width.saturating_add(COLUMN_PADDING),
                )));
        }
        table
    }

    /// Each column's minimum width, raised to fit its longest value.
    fn column_widths(&self) -> [u16; 5] {
        let mut widths = MIN_COLUMN_WIDTHS;
        for row in self.iter().map(cells) {
            for (width, cell) in widths.iter_mut().zip(row) {
                let len = u16::try_from(cell.chars().count()).unwrap_or(u16::MAX);
                *width = (*width).max(len);
            }
        }
        widths
    }
}

fn cells(result: &ScrubImageResult) -> [&str; 5] {
    [
        result.image_name.as_str(),
        result.tag.as_str(),
        result.status.as_str(),
        result.affected_blob.as_str(),
        result.error.as_str(),
    ]
}
