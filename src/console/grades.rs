use super::command::{CommandFactory, Exit, Factory, Flow, MenuCommand, Session};
use super::Interpreter;
use crate::gradebook::{Gradebook, Performance};
use crate::record::parse_amount;
use anyhow::Result;
use argh::FromArgs;
use std::io::{self, Write};

pub struct GradesSession {
    pub book: Gradebook,
}

impl GradesSession {
    pub fn new(book: Gradebook) -> Self {
        Self { book }
    }
}

impl Session for GradesSession {
    fn title(&self) -> &str {
        "Gradebook"
    }

    fn summary(&self, out: &mut dyn Write) -> io::Result<()> {
        let students = self.book.students();
        let graded = students.list().iter().filter(|s| !s.grades.is_empty()).count();
        writeln!(
            out,
            "Closing gradebook: {} student(s), {} with grades.",
            students.len(),
            graded
        )
    }
}

pub fn grades_console(session: GradesSession) -> Interpreter<GradesSession> {
    let commands: Vec<Box<dyn CommandFactory<GradesSession>>> = vec![
        Box::new(Factory::<Register>::default()),
        Box::new(Factory::<Grade>::default()),
        Box::new(Factory::<Show>::default()),
        Box::new(Factory::<Calc>::default()),
        Box::new(Factory::<Classify>::default()),
        Box::new(Factory::<Report>::default()),
        Box::new(Factory::<Students>::default()),
        Box::new(Factory::<ClearGrades>::default()),
        Box::new(Factory::<Remove>::default()),
        Box::new(Factory::<Exit>::default()),
    ];
    Interpreter::new(session, commands)
}

fn format_grades(grades: &[f64]) -> String {
    grades
        .iter()
        .map(|g| format!("{g:.1}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn performance_line(p: Performance) -> String {
    let verdict = if p.passed { "PASSED" } else { "FAILED" };
    format!("{verdict} - {}", p.band.label())
}

const NO_GRADES: &str = "No grades recorded.";

#[derive(FromArgs)]
/// Register a student and make them the current one.
pub struct Register {
    #[argh(positional)]
    /// student name.
    pub name: String,
}

impl MenuCommand<GradesSession> for Register {
    const NAME: &'static str = "register";
    const OPTION: u32 = 1;
    const SUMMARY: &'static str = "Register student";

    fn execute(self, out: &mut dyn Write, session: &mut GradesSession) -> Result<Flow> {
        let student = session.book.register(&self.name)?;
        writeln!(out, "Registered {}.", student.name)?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Record a grade for a student.
pub struct Grade {
    #[argh(positional)]
    /// grade value within the configured scale.
    pub value: String,

    #[argh(option, short = 's')]
    /// student name; the current student by default.
    pub student: Option<String>,
}

impl MenuCommand<GradesSession> for Grade {
    const NAME: &'static str = "grade";
    const OPTION: u32 = 2;
    const SUMMARY: &'static str = "Record grade";

    fn execute(self, out: &mut dyn Write, session: &mut GradesSession) -> Result<Flow> {
        let value = parse_amount("grade", &self.value)?;
        let student = session.book.record_grade(self.student.as_deref(), value)?;
        writeln!(
            out,
            "Recorded {value:.1} for {} ({} grade(s)).",
            student.name,
            student.grades.len()
        )?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Show the grades of a student.
pub struct Show {
    #[argh(option, short = 's')]
    /// student name; the current student by default.
    pub student: Option<String>,
}

impl MenuCommand<GradesSession> for Show {
    const NAME: &'static str = "show";
    const OPTION: u32 = 3;
    const SUMMARY: &'static str = "Show grades";

    fn execute(self, out: &mut dyn Write, session: &mut GradesSession) -> Result<Flow> {
        let grades = session.book.grades(self.student.as_deref())?;
        if grades.is_empty() {
            writeln!(out, "{NO_GRADES}")?;
        } else {
            writeln!(out, "Grades: {}", format_grades(grades))?;
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Mean, highest and lowest grade of a student.
pub struct Calc {
    #[argh(option, short = 's')]
    /// student name; the current student by default.
    pub student: Option<String>,
}

impl MenuCommand<GradesSession> for Calc {
    const NAME: &'static str = "calc";
    const OPTION: u32 = 4;
    const SUMMARY: &'static str = "Calculate statistics";

    fn execute(self, out: &mut dyn Write, session: &mut GradesSession) -> Result<Flow> {
        match session.book.stats(self.student.as_deref())? {
            None => writeln!(out, "{NO_GRADES}")?,
            Some(stats) => {
                writeln!(out, "Grades:  {}", stats.count)?;
                writeln!(out, "Sum:     {:.2}", stats.sum)?;
                writeln!(out, "Mean:    {:.2}", stats.mean)?;
                writeln!(out, "Highest: {:.1}", stats.max)?;
                writeln!(out, "Lowest:  {:.1}", stats.min)?;
            }
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Pass or fail, and the performance band of the mean.
pub struct Classify {
    #[argh(option, short = 's')]
    /// student name; the current student by default.
    pub student: Option<String>,
}

impl MenuCommand<GradesSession> for Classify {
    const NAME: &'static str = "classify";
    const OPTION: u32 = 5;
    const SUMMARY: &'static str = "Classify performance";

    fn execute(self, out: &mut dyn Write, session: &mut GradesSession) -> Result<Flow> {
        match session.book.classify(self.student.as_deref())? {
            None => writeln!(out, "{NO_GRADES}")?,
            Some(p) => writeln!(out, "{}", performance_line(p))?,
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Full report of a student.
pub struct Report {
    #[argh(option, short = 's')]
    /// student name; the current student by default.
    pub student: Option<String>,
}

impl MenuCommand<GradesSession> for Report {
    const NAME: &'static str = "report";
    const OPTION: u32 = 6;
    const SUMMARY: &'static str = "Full report";

    fn execute(self, out: &mut dyn Write, session: &mut GradesSession) -> Result<Flow> {
        let report = session.book.report(self.student.as_deref())?;
        writeln!(out, "Student: {}", report.name)?;
        let (Some(stats), Some(performance)) = (report.stats, report.performance) else {
            writeln!(out, "{NO_GRADES}")?;
            return Ok(Flow::Continue);
        };
        writeln!(out, "Grades:  {}", format_grades(&report.grades))?;
        writeln!(
            out,
            "Mean:    {:.2} (min {:.1}, max {:.1})",
            stats.mean, stats.min, stats.max
        )?;
        writeln!(out, "Result:  {}", performance_line(performance))?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// List registered students.
pub struct Students {}

impl MenuCommand<GradesSession> for Students {
    const NAME: &'static str = "students";
    const OPTION: u32 = 7;
    const SUMMARY: &'static str = "List students";

    fn execute(self, out: &mut dyn Write, session: &mut GradesSession) -> Result<Flow> {
        let book = &session.book;
        if book.students().is_empty() {
            writeln!(out, "No students registered.")?;
        }
        for student in book.students().list() {
            let marker = if book.current() == Some(student.name.as_str()) {
                "*"
            } else {
                " "
            };
            writeln!(
                out,
                "{marker} {:<24} {} grade(s)",
                student.name,
                student.grades.len()
            )?;
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Delete every grade of a student.
pub struct ClearGrades {
    #[argh(option, short = 's')]
    /// student name; the current student by default.
    pub student: Option<String>,
}

impl MenuCommand<GradesSession> for ClearGrades {
    const NAME: &'static str = "clear";
    const OPTION: u32 = 8;
    const SUMMARY: &'static str = "Clear grades";

    fn execute(self, out: &mut dyn Write, session: &mut GradesSession) -> Result<Flow> {
        let removed = session.book.clear_grades(self.student.as_deref())?;
        writeln!(out, "Removed {removed} grade(s).")?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Unregister a student.
pub struct Remove {
    #[argh(positional)]
    /// student name.
    pub name: String,
}

impl MenuCommand<GradesSession> for Remove {
    const NAME: &'static str = "remove";
    const OPTION: u32 = 9;
    const SUMMARY: &'static str = "Remove student";

    fn execute(self, out: &mut dyn Write, session: &mut GradesSession) -> Result<Flow> {
        let removed = session.book.remove(self.name.trim())?;
        writeln!(out, "Removed {}.", removed.name)?;
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::interpreter::tests::Script;
    use crate::gradebook::GradeScale;

    fn console() -> Interpreter<GradesSession> {
        grades_console(GradesSession::new(Gradebook::new(GradeScale::default())))
    }

    fn exec(sh: &mut Interpreter<GradesSession>, line: &str) -> Result<String> {
        let mut out = Vec::new();
        sh.execute_line(line, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_grades_go_to_current_student() {
        let mut sh = console();
        exec(&mut sh, "register 'Laura Gómez'").unwrap();
        exec(&mut sh, "grade 4.5").unwrap();
        exec(&mut sh, "2 3.5").unwrap();
        assert_eq!(exec(&mut sh, "show").unwrap(), "Grades: 4.5, 3.5\n");

        let calc = exec(&mut sh, "calc").unwrap();
        assert!(calc.contains("Mean:    4.00"));
        assert_eq!(exec(&mut sh, "classify").unwrap(), "PASSED - Good\n");
    }

    #[test]
    fn test_named_student_becomes_current() {
        let mut sh = console();
        exec(&mut sh, "register Ana").unwrap();
        exec(&mut sh, "register Luis").unwrap();
        exec(&mut sh, "grade 2 --student ana").unwrap();
        exec(&mut sh, "grade 1").unwrap();

        assert_eq!(exec(&mut sh, "show -s Luis").unwrap(), NO_GRADES.to_string() + "\n");
        assert_eq!(exec(&mut sh, "show").unwrap(), "Grades: 2.0, 1.0\n");
        assert_eq!(exec(&mut sh, "classify").unwrap(), "FAILED - Poor\n");
        assert!(exec(&mut sh, "students").unwrap().contains("* Ana"));
    }

    #[test]
    fn test_errors() {
        let mut sh = console();
        let err = exec(&mut sh, "show").unwrap_err();
        assert_eq!(err.to_string(), "no current student; name one explicitly");
        exec(&mut sh, "register Ana").unwrap();
        assert!(exec(&mut sh, "register ana").is_err());
        assert!(exec(&mut sh, "grade 7").is_err());
        assert!(exec(&mut sh, "grade x").is_err());
        assert!(exec(&mut sh, "remove Pedro").is_err());
    }

    #[test]
    fn test_report_clear_and_remove() {
        let mut sh = console();
        exec(&mut sh, "register Ana").unwrap();
        exec(&mut sh, "grade 5").unwrap();
        let report = exec(&mut sh, "report").unwrap();
        assert!(report.contains("Result:  PASSED - Excellent"));

        assert_eq!(exec(&mut sh, "clear").unwrap(), "Removed 1 grade(s).\n");
        assert!(exec(&mut sh, "report").unwrap().ends_with("No grades recorded.\n"));
        exec(&mut sh, "remove ana").unwrap();
        assert!(exec(&mut sh, "show").is_err());
    }

    #[test]
    fn test_summary_on_eof() {
        let mut sh = console();
        let mut script = Script::new(&[Some("register Ana"), Some("register Luis"), Some("grade 3")]);
        let mut out = Vec::new();
        sh.repl(&mut script, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.ends_with("Closing gradebook: 2 student(s), 1 with grades.\n"));
    }
}
