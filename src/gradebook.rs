//! Students and their grades.

use crate::error::{StoreError, ValidationError};
use crate::record::{
    Patchable, Record, check_non_negative, check_text, keys_match, require_text,
};
use crate::store::RecordStore;
use tracing::info;

/// Grading scale and performance thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeScale {
    pub max: f64,
    /// Lowest passing mean.
    pub pass: f64,
    pub good: f64,
    pub excellent: f64,
}

impl Default for GradeScale {
    fn default() -> Self {
        Self {
            max: 5.0,
            pass: 3.0,
            good: 4.0,
            excellent: 4.5,
        }
    }
}

impl GradeScale {
    pub fn check(&self, grade: f64) -> Result<f64, ValidationError> {
        let grade = check_non_negative("grade", grade)?;
        if grade > self.max {
            return Err(ValidationError::OutOfRange {
                field: "grade",
                min: 0.0,
                max: self.max,
                value: grade,
            });
        }
        Ok(grade)
    }

    pub fn classify(&self, mean: f64) -> Performance {
        let band = if mean >= self.excellent {
            Band::Excellent
        } else if mean >= self.good {
            Band::Good
        } else if mean >= self.pass {
            Band::Fair
        } else {
            Band::Poor
        };
        Performance {
            passed: mean >= self.pass,
            band,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub name: String,
    pub grades: Vec<f64>,
}

impl Student {
    /// The name is stored trimmed.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            grades: Vec::new(),
        }
    }

    pub fn stats(&self) -> Option<GradeStats> {
        let (&first, rest) = self.grades.split_first()?;
        let (sum, max, min) = rest
            .iter()
            .fold((first, first, first), |(sum, max, min), &g| {
                (sum + g, max.max(g), min.min(g))
            });
        let count = self.grades.len();
        Some(GradeStats {
            count,
            sum,
            mean: sum / count as f64,
            max,
            min,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GradePatch {
    Add(f64),
    Clear,
}

impl Record for Student {
    fn key(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_text("name", &self.name)?;
        for &grade in &self.grades {
            check_non_negative("grade", grade)?;
        }
        Ok(())
    }
}

impl Patchable for Student {
    type Patch = GradePatch;

    fn patched(&self, patch: &GradePatch) -> Self {
        let mut next = self.clone();
        match patch {
            GradePatch::Add(grade) => next.grades.push(*grade),
            GradePatch::Clear => next.grades.clear(),
        }
        next
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeStats {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Band {
    pub fn label(self) -> &'static str {
        match self {
            Band::Excellent => "Excellent",
            Band::Good => "Good",
            Band::Fair => "Fair",
            Band::Poor => "Poor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Performance {
    pub passed: bool,
    pub band: Band,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentReport {
    pub name: String,
    pub grades: Vec<f64>,
    /// `None` while the student has no grades.
    pub stats: Option<GradeStats>,
    pub performance: Option<Performance>,
}

/// Student register with a "current student" that calls may omit.
///
/// Registering a student or recording a grade makes that student current.
#[derive(Debug, Clone, Default)]
pub struct Gradebook {
    students: RecordStore<Student>,
    scale: GradeScale,
    current: Option<String>,
}

impl Gradebook {
    pub fn new(scale: GradeScale) -> Self {
        Self {
            students: RecordStore::new(),
            scale,
            current: None,
        }
    }

    pub fn scale(&self) -> &GradeScale {
        &self.scale
    }

    pub fn students(&self) -> &RecordStore<Student> {
        &self.students
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn register(&mut self, name: &str) -> Result<&Student, StoreError> {
        let name = require_text("name", name)?;
        self.students.insert(Student::new(name))?;
        self.current = Some(name.to_string());
        self.students.find(name)
    }

    pub fn record_grade(&mut self, name: Option<&str>, grade: f64) -> Result<&Student, StoreError> {
        let grade = self.scale.check(grade)?;
        let key = self.resolve(name)?;
        let student = self.students.update(&key, &GradePatch::Add(grade))?;
        info!(student = %student.name, grade, "grade recorded");
        self.current = Some(student.name.clone());
        self.students.find(&key)
    }

    pub fn student(&self, name: Option<&str>) -> Result<&Student, StoreError> {
        let key = self.resolve(name)?;
        self.students.find(&key)
    }

    pub fn grades(&self, name: Option<&str>) -> Result<&[f64], StoreError> {
        Ok(&self.student(name)?.grades)
    }

    pub fn stats(&self, name: Option<&str>) -> Result<Option<GradeStats>, StoreError> {
        Ok(self.student(name)?.stats())
    }

    pub fn classify(&self, name: Option<&str>) -> Result<Option<Performance>, StoreError> {
        Ok(self
            .stats(name)?
            .map(|stats| self.scale.classify(stats.mean)))
    }

    pub fn report(&self, name: Option<&str>) -> Result<StudentReport, StoreError> {
        let student = self.student(name)?;
        let stats = student.stats();
        Ok(StudentReport {
            name: student.name.clone(),
            grades: student.grades.clone(),
            stats,
            performance: stats.map(|s| self.scale.classify(s.mean)),
        })
    }

    /// Drop every grade of a student; returns how many were removed.
    pub fn clear_grades(&mut self, name: Option<&str>) -> Result<usize, StoreError> {
        let key = self.resolve(name)?;
        let removed = self.students.find(&key)?.grades.len();
        self.students.update(&key, &GradePatch::Clear)?;
        Ok(removed)
    }

    pub fn remove(&mut self, name: &str) -> Result<Student, StoreError> {
        let removed = self.students.delete(name)?;
        if self
            .current
            .as_deref()
            .is_some_and(|c| keys_match(c, &removed.name))
        {
            self.current = None;
        }
        Ok(removed)
    }

    fn resolve(&self, name: Option<&str>) -> Result<String, StoreError> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => Ok(n.to_string()),
            None => self
                .current
                .clone()
                .ok_or(StoreError::NoCurrent { kind: "student" }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> Gradebook {
        Gradebook::new(GradeScale::default())
    }

    #[test]
    fn test_register_rejects_duplicates_case_insensitive() {
        let mut book = book();
        book.register("Laura").unwrap();
        assert!(matches!(
            book.register("laura"),
            Err(StoreError::DuplicateKey { .. })
        ));
        assert_eq!(book.students().len(), 1);
    }

    #[test]
    fn test_grades_default_to_current_student() {
        let mut book = book();
        book.register("Laura").unwrap();
        book.register("Pedro").unwrap();

        book.record_grade(None, 4.0).unwrap();
        book.record_grade(Some("laura"), 3.0).unwrap();
        book.record_grade(None, 5.0).unwrap();

        assert_eq!(book.grades(Some("Pedro")).unwrap(), [4.0]);
        assert_eq!(book.student(Some("Laura")).unwrap().grades, [3.0, 5.0]);
        assert_eq!(book.current(), Some("Laura"));
    }

    #[test]
    fn test_no_current_student() {
        let mut book = book();
        assert_eq!(
            book.student(None),
            Err(StoreError::NoCurrent { kind: "student" })
        );
        assert!(matches!(
            book.record_grade(None, 4.0),
            Err(StoreError::NoCurrent { .. })
        ));
    }

    #[test]
    fn test_grade_out_of_scale_rejected() {
        let mut book = book();
        book.register("Laura").unwrap();
        assert!(matches!(
            book.record_grade(None, 5.5),
            Err(StoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert!(matches!(
            book.record_grade(None, -1.0),
            Err(StoreError::Validation(ValidationError::Negative { .. }))
        ));
        assert!(book.student(None).unwrap().grades.is_empty());
    }

    #[test]
    fn test_stats() {
        let mut book = book();
        book.register("Laura").unwrap();
        assert_eq!(book.stats(None).unwrap(), None);

        for g in [3.0, 4.5, 1.5] {
            book.record_grade(None, g).unwrap();
        }
        let stats = book.stats(None).unwrap().unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.sum, 9.0);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.max, 4.5);
        assert_eq!(stats.min, 1.5);
    }

    #[test]
    fn test_classification_bands_at_thresholds() {
        let scale = GradeScale::default();
        let cases = [
            (4.5, true, Band::Excellent),
            (4.0, true, Band::Good),
            (3.0, true, Band::Fair),
            (2.99, false, Band::Poor),
        ];
        for (mean, passed, band) in cases {
            assert_eq!(scale.classify(mean), Performance { passed, band }, "mean {mean}");
        }
    }

    #[test]
    fn test_clear_and_remove() {
        let mut book = book();
        book.register("Laura").unwrap();
        book.record_grade(None, 4.0).unwrap();
        book.record_grade(None, 2.0).unwrap();

        assert_eq!(book.clear_grades(None).unwrap(), 2);
        assert_eq!(book.report(None).unwrap().performance, None);

        book.remove("LAURA").unwrap();
        assert_eq!(book.current(), None);
        assert!(matches!(book.grades(None), Err(StoreError::NoCurrent { .. })));
        assert!(matches!(
            book.remove("Laura"),
            Err(StoreError::NotFound { .. })
        ));
    }
}
