//! Writing the active subset back out as CSV or JSON.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use csv::QuoteStyle;
use serde_json::{Map, Value};

use crate::{fetch::is_dash, parser::Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum ExportFormat {
    Csv,
    Json,
}

pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    })
}

/// CSV with every field quoted, so values survive a round trip even though
/// the input side splits naively.
pub fn write_csv<W: Write>(writer: W, headers: &[String], records: &[Record]) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .double_quote(true)
        .from_writer(writer);
    csv_writer.write_record(headers)?;
    for record in records {
        csv_writer.write_record(headers.iter().map(|h| record.value(h)))?;
    }
    csv_writer.flush().context("Flushing CSV output")?;
    Ok(())
}

/// JSON array with one object per record and one key per header.
pub fn to_json(headers: &[String], records: &[Record]) -> Value {
    Value::Array(
        records
            .iter()
            .map(|record| {
                let object = headers
                    .iter()
                    .map(|h| (h.clone(), Value::String(record.value(h).to_string())))
                    .collect::<Map<_, _>>();
                Value::Object(object)
            })
            .collect(),
    )
}

pub fn write_json<W: Write>(mut writer: W, headers: &[String], records: &[Record]) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, &to_json(headers, records))
        .context("Writing JSON output")?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

pub fn write_records<W: Write>(
    writer: W,
    format: ExportFormat,
    headers: &[String],
    records: &[Record],
) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(writer, headers, records),
        ExportFormat::Json => write_json(writer, headers, records),
    }
}
