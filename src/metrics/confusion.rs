use std::cmp::Ordering;

use nalgebra::DMatrix;

use crate::data::Value;
use crate::errors::TreeError;

type ConfusionMatrix = DMatrix<usize>;

fn position(classes: &[Value], label: &Value) -> Result<Option<usize>, TreeError> {
    for (index, class) in classes.iter().enumerate() {
        if class.eq_value(label)? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

pub trait ClassificationMetrics {
    /// Computes the confusion matrix based on the true labels and predicted labels.
    ///
    /// # Arguments
    ///
    /// * `y_true` - The true labels.
    /// * `y_pred` - The predicted labels.
    ///
    /// # Returns
    ///
    /// The sorted list of classes and the confusion matrix, rows indexed by the
    /// true class and columns by the predicted class. Empty label slices are
    /// rejected, so every metric built on the matrix is well defined.
    fn confusion_matrix(
        &self,
        y_true: &[Value],
        y_pred: &[Value],
    ) -> Result<(Vec<Value>, ConfusionMatrix), TreeError> {
        if y_true.len() != y_pred.len() {
            return Err(TreeError::LengthMismatch(y_true.len(), y_pred.len()));
        }
        if y_true.is_empty() {
            return Err(TreeError::InvalidParameter(
                "y_true".to_string(),
                "at least one label".to_string(),
                "none".to_string(),
            ));
        }

        let mut classes: Vec<Value> = Vec::new();
        for label in y_true.iter().chain(y_pred.iter()) {
            if position(&classes, label)?.is_none() {
                classes.push(label.clone());
            }
        }
        classes.sort_by(|a, b| a.cmp_value(b).unwrap_or(Ordering::Equal));

        let mut matrix = DMatrix::zeros(classes.len(), classes.len());

        for (y_t, y_p) in y_true.iter().zip(y_pred.iter()) {
            if let (Some(matrix_row), Some(matrix_col)) =
                (position(&classes, y_t)?, position(&classes, y_p)?)
            {
                matrix[(matrix_row, matrix_col)] += 1;
            }
        }

        Ok((classes, matrix))
    }

    /// Computes the accuracy based on the true labels and predicted labels.
    fn accuracy(&self, y_true: &[Value], y_pred: &[Value]) -> Result<f64, TreeError> {
        let (_, matrix) = self.confusion_matrix(y_true, y_pred)?;

        let correct: usize = matrix.diagonal().iter().sum();

        Ok(correct as f64 / y_true.len() as f64)
    }

    /// Computes the precision based on the true labels and predicted labels.
    ///
    /// With two classes the second (greater) class is the positive one,
    /// otherwise the per-class precisions are averaged.
    fn precision(&self, y_true: &[Value], y_pred: &[Value]) -> Result<f64, TreeError> {
        let (_, matrix) = self.confusion_matrix(y_true, y_pred)?;

        let num_classes = matrix.nrows();

        if num_classes == 2 {
            let tp = matrix[(1, 1)];
            let fp = matrix[(0, 1)];

            if tp + fp > 0 {
                return Ok(tp as f64 / (tp + fp) as f64);
            }
        }

        let mut precision_total = 0.0;
        for class in 0..num_classes {
            let tp = matrix[(class, class)];
            let fp = matrix.column(class).sum() - tp;

            if tp + fp > 0 {
                precision_total += tp as f64 / (tp + fp) as f64;
            }
        }

        Ok(precision_total / num_classes as f64)
    }

    /// Computes the recall based on the true labels and predicted labels.
    fn recall(&self, y_true: &[Value], y_pred: &[Value]) -> Result<f64, TreeError> {
        let (_, matrix) = self.confusion_matrix(y_true, y_pred)?;

        let num_classes = matrix.nrows();

        if num_classes == 2 {
            let tp = matrix[(1, 1)];
            let fn_ = matrix[(1, 0)];

            if tp + fn_ > 0 {
                return Ok(tp as f64 / (tp + fn_) as f64);
            }
        }

        let mut recall_total = 0.0;

        for class in 0..num_classes {
            let tp = matrix[(class, class)];
            let fn_ = matrix.row(class).sum() - tp;

            if tp + fn_ > 0 {
                recall_total += tp as f64 / (tp + fn_) as f64;
            }
        }

        Ok(recall_total / num_classes as f64)
    }

    /// Computes the F1 score based on the true labels and predicted labels.
    fn f1_score(&self, y_true: &[Value], y_pred: &[Value]) -> Result<f64, TreeError> {
        let precision = self.precision(y_true, y_pred)?;
        let recall = self.recall(y_true, y_pred)?;

        if (precision + recall).abs() < f64::EPSILON {
            return Err(TreeError::InvalidParameter(
                "predictions".to_string(),
                "at least one true positive".to_string(),
                "none".to_string(),
            ));
        }
        Ok(2.0 * (precision * recall) / (precision + recall))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct MockClassifier;

    impl ClassificationMetrics for MockClassifier {}

    fn values(labels: &[f64]) -> Vec<Value> {
        labels.iter().map(|&l| Value::from(l)).collect()
    }

    #[test]
    fn test_confusion_matrix() {
        let classifier = MockClassifier;

        let y_true = values(&[1.0, 0.0, 1.0, 0.0, 1.0]);
        let y_pred = values(&[1.0, 1.0, 0.0, 0.0, 1.0]);

        let (classes, result) = classifier.confusion_matrix(&y_true, &y_pred).unwrap();

        assert_eq!(classes, values(&[0.0, 1.0]));
        assert_eq!(result, DMatrix::from_vec(2, 2, vec![1, 1, 1, 2]));
    }

    #[test]
    fn test_confusion_matrix_unequal() {
        let classifier = MockClassifier;

        let y_true = values(&[1.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
        let y_pred = values(&[1.0, 1.0, 0.0, 0.0, 1.0]);

        assert!(matches!(
            classifier.confusion_matrix(&y_true, &y_pred),
            Err(TreeError::LengthMismatch(6, 5))
        ));
    }

    #[test]
    fn test_confusion_matrix_string_labels() {
        let classifier = MockClassifier;

        let y_true = vec![Value::from("b"), Value::from("a"), Value::from("c")];
        let y_pred = vec![Value::from("b"), Value::from("c"), Value::from("c")];

        let (classes, result) = classifier.confusion_matrix(&y_true, &y_pred).unwrap();
        assert_eq!(classes, vec![Value::from("a"), Value::from("b"), Value::from("c")]);
        assert_eq!(result, DMatrix::from_vec(3, 3, vec![0, 0, 0, 0, 1, 0, 1, 0, 1]));
    }

    #[test]
    fn test_confusion_matrix_mixed_labels() {
        let classifier = MockClassifier;
        let y_true = vec![Value::from(1.0), Value::from("1")];
        let y_pred = vec![Value::from(1.0), Value::from(1.0)];
        assert!(matches!(
            classifier.confusion_matrix(&y_true, &y_pred),
            Err(TreeError::Comparison { .. })
        ));
    }

    #[test]
    fn test_metrics_reject_empty_labels() {
        let classifier = MockClassifier;

        assert!(matches!(
            classifier.confusion_matrix(&[], &[]),
            Err(TreeError::InvalidParameter(..))
        ));
        assert!(classifier.accuracy(&[], &[]).is_err());
        assert!(classifier.precision(&[], &[]).is_err());
        assert!(classifier.recall(&[], &[]).is_err());
        assert!(classifier.f1_score(&[], &[]).is_err());
    }

    #[test]
    fn test_signed_zero_labels_are_one_class() {
        let classifier = MockClassifier;

        let y_true = values(&[0.0, -0.0, 1.0]);
        let y_pred = values(&[-0.0, 0.0, 1.0]);

        let (classes, _) = classifier.confusion_matrix(&y_true, &y_pred).unwrap();
        assert_eq!(classes.len(), 2);
        assert_relative_eq!(classifier.accuracy(&y_true, &y_pred).unwrap(), 1.0);
    }

    #[test]
    fn test_accuracy() {
        let classifier = MockClassifier;

        let y_true = values(&[1.0, 0.0, 1.0, 0.0, 1.0]);
        let y_pred = values(&[1.0, 1.0, 0.0, 0.0, 1.0]);

        assert_relative_eq!(classifier.accuracy(&y_true, &y_pred).unwrap(), 0.6);
        assert_relative_eq!(classifier.accuracy(&y_true, &y_true).unwrap(), 1.0);
    }

    #[test]
    fn test_precision_recall_f1() {
        let classifier = MockClassifier;

        let y_true = values(&[1.0, 0.0, 1.0, 0.0, 1.0]);
        let y_pred = values(&[1.0, 1.0, 0.0, 0.0, 1.0]);

        assert_relative_eq!(classifier.precision(&y_true, &y_pred).unwrap(), 2.0 / 3.0);
        assert_relative_eq!(classifier.recall(&y_true, &y_pred).unwrap(), 2.0 / 3.0);
        assert_relative_eq!(classifier.f1_score(&y_true, &y_pred).unwrap(), 2.0 / 3.0);
    }

    #[test]
    fn test_no_positive_predictions() {
        let classifier = MockClassifier;

        let y_true = values(&[1.0, 1.0, 1.0, 1.0, 1.0]);
        let y_pred = values(&[0.0, 0.0, 0.0, 0.0, 0.0]);

        assert_eq!(classifier.precision(&y_true, &y_pred).unwrap(), 0.0);
        assert_eq!(classifier.recall(&y_true, &y_pred).unwrap(), 0.0);
        assert!(classifier.f1_score(&y_true, &y_pred).is_err());
    }

    #[test]
    fn test_multiclass_averages() {
        let classifier = MockClassifier;

        let y_true = values(&[0.0, 1.0, 2.0, 1.0, 0.0, 2.0]);
        let y_pred = values(&[0.0, 2.0, 1.0, 1.0, 0.0, 2.0]);

        let expected = (2.0 / 2.0 + 1.0 / 2.0 + 1.0 / 2.0) / 3.0;
        assert_relative_eq!(classifier.precision(&y_true, &y_pred).unwrap(), expected);
        assert_relative_eq!(classifier.recall(&y_true, &y_pred).unwrap(), expected);
    }
}
