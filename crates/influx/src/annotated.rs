use crate::error::InfluxError;
use chrono::{DateTime, Utc};
use common::types::{Field, Sample};
use csv::{StringRecord, StringRecordsIntoIter};
use std::io::Read;

/// Column positions of one result table.
#[derive(Debug, Clone)]
enum Columns {
    Data {
        time: usize,
        value: usize,
        field: usize,
        host: usize,
    },
    Error {
        error: usize,
    },
    Missing(&'static str),
}

impl Columns {
    fn from_header(header: &StringRecord) -> Self {
        let find = |name: &str| header.iter().position(|c| c == name);

        if let Some(error) = find("error") {
            if find("_value").is_none() {
                return Columns::Error { error };
            }
        }

        Self::data_columns(header).unwrap_or_else(Columns::Missing)
    }

    fn data_columns(header: &StringRecord) -> Result<Self, &'static str> {
        let lookup = |name: &'static str| header.iter().position(|c| c == name).ok_or(name);
        Ok(Columns::Data {
            time: lookup("_time")?,
            value: lookup("_value")?,
            field: lookup("_field")?,
            host: lookup("host")?,
        })
    }
}

/// Lazily decodes an annotated CSV query response into samples.
///
/// Rows are yielded in the order the store sent them. A response may hold
/// several tables, each introduced by its own annotations and header row.
pub struct SampleReader<R> {
    records: StringRecordsIntoIter<R>,
    defaults: Vec<String>,
    columns: Option<Columns>,
    expect_header: bool,
}

impl<R: Read> SampleReader<R> {
    pub fn new(reader: R) -> Self {
        let records = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader)
            .into_records();
        Self {
            records,
            defaults: Vec::new(),
            columns: None,
            expect_header: true,
        }
    }

    fn cell<'a>(&'a self, record: &'a StringRecord, index: usize) -> &'a str {
        match record.get(index) {
            Some(value) if !value.is_empty() => value,
            _ => self.defaults.get(index).map(String::as_str).unwrap_or(""),
        }
    }

    fn decode(&self, record: &StringRecord, columns: &Columns) -> Result<Sample, InfluxError> {
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let (time, value, field, host) = match *columns {
            Columns::Data {
                time,
                value,
                field,
                host,
            } => (time, value, field, host),
            Columns::Error { error } => {
                return Err(InfluxError::Query(self.cell(record, error).to_string()));
            }
            Columns::Missing(name) => return Err(InfluxError::MissingColumn(name)),
        };

        let raw_time = self.cell(record, time);
        let time = DateTime::parse_from_rfc3339(raw_time)
            .map_err(|_| InfluxError::InvalidTime {
                line,
                value: raw_time.to_string(),
            })?
            .with_timezone(&Utc);

        let raw_value = self.cell(record, value);
        let value = raw_value
            .parse::<f64>()
            .map_err(|_| InfluxError::InvalidValue {
                line,
                value: raw_value.to_string(),
            })?;

        Ok(Sample {
            time,
            host: self.cell(record, host).to_string(),
            field: Field::from(self.cell(record, field)),
            value,
        })
    }
}

fn looks_like_header(record: &StringRecord) -> bool {
    let has = |name: &str| record.iter().any(|c| c == name);
    (has("result") && has("table")) || (has("error") && has("reference"))
}

impl<R: Read> Iterator for SampleReader<R> {
    type Item = Result<Sample, InfluxError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(err) => return Some(Err(err.into())),
            };

            // csv はテーブル間の空行を読み飛ばすので、注釈行を新しいテーブルの始まりとみなす
            let first = record.get(0).unwrap_or("");
            if first.starts_with('#') {
                match first {
                    "#datatype" => self.defaults.clear(),
                    "#default" => self.defaults = record.iter().map(str::to_string).collect(),
                    _ => {}
                }
                self.expect_header = true;
                continue;
            }

            if self.expect_header || looks_like_header(&record) {
                self.columns = Some(Columns::from_header(&record));
                self.expect_header = false;
                continue;
            }

            let columns = self.columns.clone()?;
            return Some(self.decode(&record, &columns));
        }
    }
}
