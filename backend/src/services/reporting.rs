//! Evaluation reporting: metrics table and diagnostic charts

use std::path::Path;

use plotters::prelude::*;
use serde::Serialize;
use shared::{ConfusionMatrix, RocCurve};

use crate::error::{AppError, AppResult};

/// Reporting helpers for a finished training run
pub struct ReportingService;

impl ReportingService {
    /// Export report data as CSV
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }

    /// Write records as a CSV file with a header row
    pub fn write_csv<T: Serialize>(path: &Path, data: &[T]) -> AppResult<()> {
        std::fs::write(path, Self::export_to_csv(data)?)?;
        Ok(())
    }

    /// Confusion matrix heat map with the count in every cell
    pub fn plot_confusion_matrix(cm: &ConfusionMatrix, path: &Path) -> AppResult<()> {
        draw_confusion_matrix(cm, path)
            .map_err(|e| AppError::Internal(format!("confusion matrix chart: {}", e)))
    }

    /// ROC curve against the chance diagonal
    pub fn plot_roc_curve(roc: &RocCurve, auc: Option<f64>, path: &Path) -> AppResult<()> {
        draw_roc_curve(roc, auc, path)
            .map_err(|e| AppError::Internal(format!("ROC curve chart: {}", e)))
    }
}

type ChartResult = Result<(), Box<dyn std::error::Error>>;

/// Blues colour map: white for zero, dark blue for the largest cell
fn blues(fraction: f64) -> RGBColor {
    let f = fraction.clamp(0.0, 1.0);
    let mix = |from: u8, to: u8| (from as f64 + (to as f64 - from as f64) * f).round() as u8;
    RGBColor(mix(247, 8), mix(251, 48), mix(255, 107))
}

fn draw_confusion_matrix(cm: &ConfusionMatrix, path: &Path) -> ChartResult {
    let root = BitMapBackend::new(path, (640, 560)).into_drawing_area();
    root.fill(&WHITE)?;

    let n = cm.labels.len().max(1) as i32;
    let mut chart = ChartBuilder::on(&root)
        .caption("Confusion Matrix", ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0..n, 0..n)?;

    let labels = cm.labels.clone();
    let label_of = move |v: &i32| {
        labels
            .get(*v as usize)
            .map(|l| l.to_string())
            .unwrap_or_default()
    };
    let label_of_y = label_of.clone();

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n as usize)
        .y_labels(n as usize)
        .x_label_offset(35)
        .y_label_offset(-35)
        .x_label_formatter(&label_of)
        .y_label_formatter(&label_of_y)
        .x_desc("Predicted label")
        .y_desc("True label")
        .draw()?;

    let max = cm.max_count().max(1) as f64;
    // Row 0 (first true label) is drawn at the top
    let cells = cm.counts.iter().enumerate().flat_map(|(row, counts)| {
        counts
            .iter()
            .enumerate()
            .map(move |(col, &count)| (row as i32, col as i32, count))
    });

    chart.draw_series(cells.clone().map(|(row, col, count)| {
        let y = n - 1 - row;
        Rectangle::new(
            [(col, y), (col + 1, y + 1)],
            blues(count as f64 / max).filled(),
        )
    }))?;

    chart.draw_series(cells.map(|(row, col, count)| {
        let y = n - 1 - row;
        let colour = if (count as f64 / max) > 0.5 { WHITE } else { BLACK };
        Text::new(
            count.to_string(),
            (col, y + 1),
            ("sans-serif", 28).into_font().color(&colour),
        )
    }))?;

    root.present()?;
    Ok(())
}

fn draw_roc_curve(roc: &RocCurve, auc: Option<f64>, path: &Path) -> ChartResult {
    let root = BitMapBackend::new(path, (640, 560)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("ROC Curve", ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..1f64, 0f64..1f64)?;

    chart
        .configure_mesh()
        .x_desc("False Positive Rate")
        .y_desc("True Positive Rate")
        .draw()?;

    let label = match auc {
        Some(a) => format!("ROC Curve (AUC = {:.2})", a),
        None => "ROC Curve (AUC undefined)".to_string(),
    };

    chart
        .draw_series(LineSeries::new(
            roc.fpr.iter().copied().zip(roc.tpr.iter().copied()),
            &BLUE,
        ))?
        .label(label)
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    chart.draw_series(LineSeries::new(vec![(0.0, 0.0), (1.0, 1.0)], &RGBColor(128, 128, 128)))?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::MetricsRecord;

    #[test]
    fn test_export_metrics_csv() {
        let record = MetricsRecord {
            accuracy: 0.5,
            precision: 0.25,
            recall: 0.5,
            f1_score: 0.3,
            train_score: 1.0,
        };
        let csv = ReportingService::export_to_csv(&[record]).unwrap();
        assert_eq!(
            csv,
            "accuracy,precision,recall,f1_score,train_score\n0.5,0.25,0.5,0.3,1.0\n"
        );
    }

    #[test]
    fn test_blues_endpoints() {
        assert_eq!(blues(0.0), RGBColor(247, 251, 255));
        assert_eq!(blues(1.0), RGBColor(8, 48, 107));
    }
}
