//! TAP (Test Anything Protocol) version 14 reporting.

use std::fmt::Write as _;

enum Status {
    Pass,
    Fail(String),
    Skip(String),
}

struct Point {
    name: String,
    status: Status,
}

/// Collects test points, then renders them as one TAP document.
#[derive(Default)]
pub struct Tap {
    points: Vec<Point>,
}

impl Tap {
    pub fn new() -> Self {
        Tap::default()
    }

    pub fn pass(&mut self, name: impl Into<String>) {
        self.push(name, Status::Pass);
    }

    pub fn fail(&mut self, name: impl Into<String>, diagnostics: impl Into<String>) {
        self.push(name, Status::Fail(diagnostics.into()));
    }

    pub fn skip(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        self.push(name, Status::Skip(reason.into()));
    }

    fn push(&mut self, name: impl Into<String>, status: Status) {
        self.points.push(Point {
            name: name.into(),
            status,
        });
    }

    pub fn failures(&self) -> usize {
        self.count(|s| matches!(s, Status::Fail(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, Status::Skip(_)))
    }

    fn count(&self, pred: impl Fn(&Status) -> bool) -> usize {
        self.points.iter().filter(|p| pred(&p.status)).count()
    }

    /// Render the whole run, plan first, with a trailing summary comment.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "TAP version 14");
        let _ = writeln!(out, "1..{}", self.points.len());
        for (i, point) in self.points.iter().enumerate() {
            let n = i + 1;
            match &point.status {
                Status::Pass => {
                    let _ = writeln!(out, "ok {} - {}", n, point.name);
                }
                Status::Skip(reason) => {
                    let _ = writeln!(out, "ok {} - {} # SKIP {}", n, point.name, reason);
                }
                Status::Fail(diagnostics) => {
                    let _ = writeln!(out, "not ok {} - {}", n, point.name);
                    for line in diagnostics.lines() {
                        let _ = writeln!(out, "  # {}", line);
                    }
                }
            }
        }
        let failed = self.failures();
        let skipped = self.skipped();
        let _ = writeln!(out, "# tests {}", self.points.len());
        let _ = writeln!(out, "# pass  {}", self.points.len() - failed - skipped);
        let _ = writeln!(out, "# skip  {}", skipped);
        let _ = writeln!(out, "# fail  {}", failed);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_plan_points_and_summary() {
        let mut tap = Tap::new();
        tap.pass("one");
        tap.fail("two", "expected <a>\ngot <b>");
        tap.skip("three", "needs extensions");
        assert_eq!(tap.failures(), 1);
        assert_eq!(
            tap.render(),
            "TAP version 14\n\
             1..3\n\
             ok 1 - one\n\
             not ok 2 - two\n\
             \x20 # expected <a>\n\
             \x20 # got <b>\n\
             ok 3 - three # SKIP needs extensions\n\
             # tests 3\n\
             # pass  1\n\
             # skip  1\n\
             # fail  1\n"
        );
    }

    #[test]
    fn empty_run_has_zero_plan() {
        let tap = Tap::new();
        assert!(tap.render().starts_with("TAP version 14\n1..0\n"));
    }
}
