//! Data processing service: raw weather CSV to encoded train/test splits

use std::{
    collections::{BTreeMap, HashMap},
    path::PathBuf,
};

use ndarray::Axis;
use serde::Serialize;
use shared::{
    artifact_names, date_parts, encoded_columns, is_categorical, parse_observation_date,
    LabelEncoder, SplitSummary, DATE_COLUMN, DATE_PARTS, FEATURES, TARGET,
};

use crate::{
    config::PipelineConfig,
    error::{PipelineError, PipelineResult, Stage, StageContext},
    ml::{stratified_split, Column, ColumnData, Frame, RawTable},
    models::{FeatureMatrix, LabelVector},
    services::artifacts::ArtifactStore,
};

/// Train/test partitions produced by a processing run
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedSplits {
    pub x_train: FeatureMatrix,
    pub x_test: FeatureMatrix,
    pub y_train: LabelVector,
    pub y_test: LabelVector,
}

impl ProcessedSplits {
    pub fn summary(&self) -> SplitSummary {
        SplitSummary {
            train_rows: self.x_train.n_rows(),
            test_rows: self.x_test.n_rows(),
        }
    }
}

/// Outcome of a full processing run
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingReport {
    pub rows_loaded: usize,
    pub rows_dropped: usize,
    pub split: SplitSummary,
    pub encoded_columns: Vec<String>,
}

/// Loads, cleans, encodes and splits the raw dataset
#[derive(Debug, Clone)]
pub struct DataProcessingService {
    input_path: PathBuf,
    store: ArtifactStore,
    test_size: f64,
    seed: u64,
}

impl DataProcessingService {
    /// Create the service; the output directory is created if missing
    pub fn new(
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        settings: &PipelineConfig,
    ) -> PipelineResult<Self> {
        let store = ArtifactStore::create(output_path).stage(Stage::LoadData)?;
        tracing::info!("DataProcessing initialized");
        Ok(Self {
            input_path: input_path.into(),
            store,
            test_size: settings.test_size,
            seed: settings.seed,
        })
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Read the raw CSV
    pub fn load_data(&self) -> PipelineResult<RawTable> {
        match RawTable::from_path(&self.input_path) {
            Ok(table) => {
                tracing::info!(
                    "Data loaded successfully: {} rows from {}",
                    table.n_rows(),
                    self.input_path.display()
                );
                Ok(table)
            }
            Err(e) => {
                tracing::error!("Error while loading data: {}", e);
                Err(PipelineError::wrap(Stage::LoadData, e))
            }
        }
    }

    /// Derive date parts, type the columns, impute gaps and drop what is
    /// still incomplete. Returns the frame and the number of dropped rows.
    pub fn preprocess(&self, raw: RawTable) -> PipelineResult<(Frame, usize)> {
        let result = preprocess_table(raw);
        match &result {
            Ok((frame, dropped)) => tracing::info!(
                "Data preprocessing complete: {} rows kept, {} dropped",
                frame.n_rows(),
                dropped
            ),
            Err(e) => tracing::error!("Error during preprocessing: {}", e),
        }
        result
    }

    /// Replace every encoded column with integer codes and persist the encoders
    pub fn label_encode(&self, frame: &mut Frame) -> PipelineResult<BTreeMap<String, LabelEncoder>> {
        let result = self.encode_columns(frame);
        match &result {
            Ok(_) => tracing::info!("Label encoding complete"),
            Err(e) => tracing::error!("Error during label encoding: {}", e),
        }
        result
    }

    fn encode_columns(&self, frame: &mut Frame) -> PipelineResult<BTreeMap<String, LabelEncoder>> {
        let mut encoders = BTreeMap::new();

        for name in encoded_columns() {
            let column = frame.column_mut(name).ok_or_else(|| {
                PipelineError::new(Stage::LabelEncode, format!("column '{}' not found", name))
            })?;

            let values = match &column.data {
                ColumnData::Categorical(values) => values
                    .iter()
                    .map(|v| v.clone().unwrap_or_default())
                    .collect::<Vec<String>>(),
                ColumnData::Numeric(_) => {
                    return Err(PipelineError::new(
                        Stage::LabelEncode,
                        format!("column '{}' is not categorical", name),
                    ))
                }
            };

            let encoder = LabelEncoder::fit(name, &values);
            if name == TARGET && encoder.len() > 2 {
                return Err(PipelineError::new(
                    Stage::LabelEncode,
                    format!(
                        "target '{}' must be binary, found classes {:?}",
                        name,
                        encoder.classes()
                    ),
                ));
            }

            let codes = values
                .iter()
                .map(|v| encoder.encode(v).map(|c| Some(c as f64)))
                .collect::<Result<Vec<_>, _>>()
                .stage(Stage::LabelEncode)?;
            column.data = ColumnData::Numeric(codes);

            self.store
                .save_json(&artifact_names::encoder(name), &encoder)
                .stage(Stage::LabelEncode)?;
            tracing::info!("Label mapping for '{}': {:?}", name, encoder.mapping());

            encoders.insert(name.to_string(), encoder);
        }

        Ok(encoders)
    }

    /// Stratified train/test split of the encoded frame, persisted to disk
    pub fn split_data(&self, frame: &Frame) -> PipelineResult<ProcessedSplits> {
        let result = self.split_and_save(frame);
        match &result {
            Ok(splits) => {
                let summary = splits.summary();
                tracing::info!(
                    "Train-test split saved: {} train rows, {} test rows",
                    summary.train_rows,
                    summary.test_rows
                );
            }
            Err(e) => tracing::error!("Error during data split: {}", e),
        }
        result
    }

    fn split_and_save(&self, frame: &Frame) -> PipelineResult<ProcessedSplits> {
        let x = frame.to_matrix(&FEATURES).stage(Stage::SplitData)?;
        let y: Vec<u8> = frame
            .numeric(TARGET)
            .stage(Stage::SplitData)?
            .into_iter()
            .map(|v| v as u8)
            .collect();

        tracing::info!("Feature columns: {:?}", FEATURES);

        let indices = stratified_split(&y, self.test_size, self.seed).stage(Stage::SplitData)?;

        let feature_names: Vec<String> = FEATURES.iter().map(|f| f.to_string()).collect();
        let take_x = |rows: &[usize]| FeatureMatrix {
            feature_names: feature_names.clone(),
            values: x.select(Axis(0), rows),
        };
        let take_y = |rows: &[usize]| LabelVector {
            column: TARGET.to_string(),
            labels: rows.iter().map(|&i| y[i]).collect(),
        };

        let splits = ProcessedSplits {
            x_train: take_x(&indices.train),
            x_test: take_x(&indices.test),
            y_train: take_y(&indices.train),
            y_test: take_y(&indices.test),
        };

        self.store
            .save_json(artifact_names::X_TRAIN, &splits.x_train)
            .stage(Stage::SplitData)?;
        self.store
            .save_json(artifact_names::X_TEST, &splits.x_test)
            .stage(Stage::SplitData)?;
        self.store
            .save_json(artifact_names::Y_TRAIN, &splits.y_train)
            .stage(Stage::SplitData)?;
        self.store
            .save_json(artifact_names::Y_TEST, &splits.y_test)
            .stage(Stage::SplitData)?;

        Ok(splits)
    }

    /// Execute the full data processing pipeline
    pub fn run(&self) -> PipelineResult<ProcessingReport> {
        let raw = self.load_data()?;
        let rows_loaded = raw.n_rows();
        let (mut frame, rows_dropped) = self.preprocess(raw)?;
        let encoders = self.label_encode(&mut frame)?;
        let splits = self.split_data(&frame)?;
        tracing::info!("Data processing pipeline completed");

        Ok(ProcessingReport {
            rows_loaded,
            rows_dropped,
            split: splits.summary(),
            encoded_columns: encoders.into_keys().collect(),
        })
    }
}

fn preprocess_table(raw: RawTable) -> PipelineResult<(Frame, usize)> {
    let mut raw_columns = raw.into_columns();

    let date_idx = raw_columns
        .iter()
        .position(|(name, _)| name == DATE_COLUMN)
        .ok_or_else(|| {
            PipelineError::new(Stage::Preprocess, format!("column '{}' not found", DATE_COLUMN))
        })?;
    let (_, dates) = raw_columns.remove(date_idx);

    let mut parts: [Vec<Option<f64>>; 3] = Default::default();
    for (row, cell) in dates.iter().enumerate() {
        let values = match cell {
            Some(raw_date) => {
                let date = parse_observation_date(raw_date).ok_or_else(|| {
                    PipelineError::new(
                        Stage::Preprocess,
                        format!("unparseable date '{}' in row {}", raw_date, row + 1),
                    )
                })?;
                date_parts(date).map(Some)
            }
            None => [None; 3],
        };
        for (part, value) in parts.iter_mut().zip(values) {
            part.push(value);
        }
    }

    let mut frame = Frame::default();
    for (name, cells) in raw_columns {
        frame.push(type_column(name, cells));
    }
    for (name, values) in DATE_PARTS.iter().zip(parts) {
        frame.push(Column {
            name: name.to_string(),
            data: ColumnData::Numeric(values),
        });
    }

    // Imputation statistics come from the whole table, before the split.
    for column in frame.columns_mut() {
        impute(column);
    }

    let dropped = frame.drop_incomplete_rows();
    Ok((frame, dropped))
}

/// Categorical when listed as such, when it is the target, or when any
/// present value is not a number. Infinite values in a numeric column are
/// treated as missing so they get imputed like any other gap.
fn type_column(name: String, cells: Vec<Option<String>>) -> Column {
    let forced = is_categorical(&name) || name == TARGET;
    let numeric: Option<Vec<Option<f64>>> = if forced {
        None
    } else {
        cells
            .iter()
            .map(|cell| match cell {
                Some(v) => match v.parse::<f64>() {
                    Ok(x) if x.is_finite() => Some(Some(x)),
                    Ok(_) => Some(None),
                    Err(_) => None,
                },
                None => Some(None),
            })
            .collect()
    };

    if let Some(values) = &numeric {
        let non_finite = values
            .iter()
            .zip(&cells)
            .filter(|(v, c)| v.is_none() && c.is_some())
            .count();
        if non_finite > 0 {
            tracing::warn!("Column '{}': {} non-finite values treated as missing", name, non_finite);
        }
    }

    let data = match numeric {
        Some(values) => ColumnData::Numeric(values),
        None => ColumnData::Categorical(cells),
    };
    Column { name, data }
}

/// Fill gaps with the column mean (numeric) or mode (categorical).
/// A column with no values at all stays empty.
fn impute(column: &mut Column) {
    match &mut column.data {
        ColumnData::Numeric(values) => {
            let present: Vec<f64> = values.iter().flatten().copied().collect();
            if present.is_empty() {
                return;
            }
            let mean = present.iter().sum::<f64>() / present.len() as f64;
            for v in values.iter_mut().filter(|v| v.is_none()) {
                *v = Some(mean);
            }
        }
        ColumnData::Categorical(values) => {
            let Some(fill) = mode(values) else {
                return;
            };
            for v in values.iter_mut().filter(|v| v.is_none()) {
                *v = Some(fill.clone());
            }
        }
    }
}

/// Most frequent value; ties go to the lexicographically smallest
fn mode(values: &[Option<String>]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values.iter().flatten() {
        *counts.entry(v.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|(a_val, a_n), (b_val, b_n)| a_n.cmp(b_n).then_with(|| b_val.cmp(a_val)))
        .map(|(v, _)| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(csv: &str) -> RawTable {
        RawTable::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_mode_prefers_smallest_on_tie() {
        let values = vec![
            Some("W".to_string()),
            Some("E".to_string()),
            None,
            Some("W".to_string()),
            Some("E".to_string()),
        ];
        assert_eq!(mode(&values), Some("E".to_string()));
        assert_eq!(mode(&[None, None]), None);
    }

    #[test]
    fn test_type_column() {
        let numeric = type_column("MinTemp".into(), vec![Some("1.5".into()), None]);
        assert!(matches!(numeric.data, ColumnData::Numeric(_)));

        let text = type_column("Notes".into(), vec![Some("1.5".into()), Some("windy".into())]);
        assert!(matches!(text.data, ColumnData::Categorical(_)));

        let forced = type_column("RainToday".into(), vec![Some("0".into())]);
        assert!(matches!(forced.data, ColumnData::Categorical(_)));
    }

    #[test]
    fn test_preprocess_imputes_and_derives_dates() {
        let raw = table(
            "Date,Location,MinTemp,RainToday,RainTomorrow\n\
             2008-12-01,Albury,10,No,No\n\
             2008-12-02,,20,No,Yes\n\
             2009-01-15,Albury,,Yes,No\n",
        );
        let (frame, dropped) = preprocess_table(raw).unwrap();
        assert_eq!(dropped, 0);
        assert_eq!(
            frame.column_names(),
            vec!["Location", "MinTemp", "RainToday", "RainTomorrow", "Year", "Month", "Day"]
        );
        assert_eq!(frame.numeric("MinTemp").unwrap(), vec![10.0, 20.0, 15.0]);
        assert_eq!(frame.numeric("Year").unwrap(), vec![2008.0, 2008.0, 2009.0]);
        assert_eq!(frame.numeric("Day").unwrap(), vec![1.0, 2.0, 15.0]);
        match &frame.column("Location").unwrap().data {
            ColumnData::Categorical(v) => assert_eq!(v[1].as_deref(), Some("Albury")),
            other => panic!("unexpected column {:?}", other),
        }
    }

    #[test]
    fn test_infinite_values_are_imputed() {
        let column = type_column(
            "MinTemp".into(),
            vec![Some("inf".into()), Some("4".into()), Some("-Infinity".into())],
        );
        assert_eq!(column.data, ColumnData::Numeric(vec![None, Some(4.0), None]));

        let raw = table(
            "Date,MinTemp,RainTomorrow\n\
             2008-12-01,inf,No\n\
             2008-12-02,10,Yes\n\
             2008-12-03,20,No\n",
        );
        let (frame, dropped) = preprocess_table(raw).unwrap();
        assert_eq!(dropped, 0);
        assert_eq!(frame.numeric("MinTemp").unwrap(), vec![15.0, 10.0, 20.0]);
    }

    #[test]
    fn test_preprocess_drops_rows_of_empty_column() {
        let raw = table(
            "Date,Location,Sunshine,RainTomorrow\n\
             2008-12-01,Albury,NA,No\n\
             2008-12-02,Albury,NA,Yes\n",
        );
        let (frame, dropped) = preprocess_table(raw).unwrap();
        assert_eq!(dropped, 2);
        assert_eq!(frame.n_rows(), 0);
    }

    #[test]
    fn test_preprocess_rejects_bad_date() {
        let raw = table("Date,Location\nnot-a-date,Albury\n");
        let err = preprocess_table(raw).unwrap_err();
        assert_eq!(err.stage, Stage::Preprocess);
    }

    #[test]
    fn test_preprocess_requires_date() {
        let raw = table("Location\nAlbury\n");
        assert!(preprocess_table(raw).is_err());
    }
}
