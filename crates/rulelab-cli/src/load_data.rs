use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};

use rulelab_learners::data_handling::{Attribute, AttributeType, DataSet, MetaData};
use rulelab_learners::math::{InputMatrix, LilMatrix};

/// Load a multi-label data set from a CSV file with a header row.
///
/// Label columns default to the last column. Feature values are loaded into a
/// sparse LIL matrix where empty cells are zeros. Nominal columns are encoded
/// by the order in which their values first appear.
pub fn load_data_set<P: AsRef<Path>>(
    path: P,
    label_columns: Option<&[String]>,
    nominal_columns: &[String],
) -> Result<DataSet> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        anyhow::bail!("Data set file has no columns: {:?}", path);
    }

    let label_indices: Vec<usize> = match label_columns {
        Some(names) => names
            .iter()
            .map(|name| column_index(&headers, name))
            .collect::<Result<_>>()?,
        None => vec![headers.len() - 1],
    };
    for name in nominal_columns {
        let index = column_index(&headers, name)?;
        if label_indices.contains(&index) {
            anyhow::bail!("Column '{}' cannot be both a label and a nominal feature", name);
        }
    }

    let feature_indices: Vec<usize> = (0..headers.len())
        .filter(|i| !label_indices.contains(i))
        .collect();

    let records: Vec<StringRecord> = rdr
        .records()
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("Failed to read records from {:?}", path))?;

    let mut attributes: Vec<Attribute> = feature_indices
        .iter()
        .map(|&i| {
            let name = &headers[i];
            if nominal_columns.iter().any(|n| n == name) {
                Attribute::nominal(name, Vec::new())
            } else {
                Attribute::numeric(name)
            }
        })
        .collect();

    let mut x = LilMatrix::new(records.len(), feature_indices.len());
    let mut y = LilMatrix::new(records.len(), label_indices.len());

    for (row, record) in records.iter().enumerate() {
        for (col, (&i, attribute)) in feature_indices.iter().zip(attributes.iter_mut()).enumerate() {
            let cell = record.get(i).unwrap_or("");
            if cell.is_empty() {
                continue;
            }

            let value = if attribute.attribute_type == AttributeType::Nominal {
                encode_nominal(&mut attribute.nominal_values, cell) as f32
            } else {
                cell.parse::<f32>().with_context(|| {
                    format!(
                        "Invalid numeric value '{}' in column '{}', row {}",
                        cell,
                        attribute.name,
                        row + 1
                    )
                })?
            };
            x.set(row, col, value)?;
        }

        for (col, &i) in label_indices.iter().enumerate() {
            let cell = record.get(i).unwrap_or("");
            if cell.is_empty() {
                continue;
            }
            let value = cell.parse::<u32>().with_context(|| {
                format!(
                    "Invalid label value '{}' in column '{}', row {}",
                    cell,
                    &headers[i],
                    row + 1
                )
            })?;
            y.set(row, col, value)?;
        }
    }

    let meta_data = MetaData {
        attributes,
        labels: label_indices.iter().map(|&i| headers[i].to_string()).collect(),
    };

    log::debug!(
        "Loaded {} examples with {} features and {} labels from {:?}",
        records.len(),
        feature_indices.len(),
        label_indices.len(),
        path
    );

    Ok(DataSet::new(InputMatrix::from(x), InputMatrix::from(y), meta_data)?)
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .with_context(|| format!("Column '{}' not found in data set", name))
}

fn encode_nominal(values: &mut Vec<String>, value: &str) -> usize {
    match values.iter().position(|v| v == value) {
        Some(index) => index,
        None => {
            values.push(value.to_string());
            values.len() - 1
        }
    }
}
