use anyhow::{Context, Result};
use brotli::enc::BrotliEncoderParams;
use brotli::CompressorWriter;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};

use crate::loader::WidgetDocument;
use crate::model::StateTable;

/// Writes state tables and widget documents as JSON.
pub struct StateWriter {
    writer: Box<dyn Write>,
}

impl StateWriter {
    /// Creates a writer for the specified file path.
    ///
    /// Enables Brotli compression if the path ends with `.br`
    /// (e.g. `state.json.br`).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use cadtree::{StateTable, StateWriter};
    /// # fn main() -> anyhow::Result<()> {
    /// let mut writer = StateWriter::new("state.json")?;
    /// writer.write_table(&StateTable::new())?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(file_path: &str) -> Result<Self> {
        let file = File::create(file_path)
            .with_context(|| format!("Failed to create file: {}", file_path))?;

        let writer: Box<dyn Write> = if file_path.ends_with(".br") {
            let buf_writer = BufWriter::new(file);
            let params = BrotliEncoderParams {
                quality: 6,
                lgwin: 22,
                ..Default::default()
            };
            Box::new(CompressorWriter::with_params(buf_writer, 4096, &params))
        } else {
            Box::new(BufWriter::new(file))
        };

        Ok(StateWriter { writer })
    }

    /// Wraps an arbitrary writer (no compression).
    pub fn from_writer<W: Write + 'static>(writer: W) -> Self {
        StateWriter {
            writer: Box::new(writer),
        }
    }

    pub fn write_table(&mut self, table: &StateTable) -> Result<()> {
        self.write_value(table)
    }

    pub fn write_document(&mut self, doc: &WidgetDocument) -> Result<()> {
        self.write_value(doc)
    }

    fn write_value<T: Serialize>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, value)
            .context("Failed to serialize to JSON")?;

        writeln!(self.writer).context("Failed to write line")?;

        self.writer.flush().context("Failed to flush writer")?;

        Ok(())
    }
}

impl Drop for StateWriter {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Writes `table` to `file_path`, replacing its contents.
pub fn write_state_table(file_path: &str, table: &StateTable) -> Result<()> {
    let mut writer = StateWriter::new(file_path)?;
    writer.write_table(table)
}
