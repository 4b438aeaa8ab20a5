//! Conformance suite runner.
//!
//! Convention, one test per stem in a flat directory:
//!   <name>.conf                      -- input, parsed exactly as stored
//!   <name>.pass                      -- expected outline (input must parse)
//!   <name>.fail                      -- input must be rejected
//!   <name>.ext_c_style_comments      -- enable `//` and `/* */` comments
//!   <name>.ext_expression_arguments  -- enable `( ... )` arguments
//!   <name>.ext_punctuator_arguments  -- enable punctuators listed in the
//!                                       file (whitespace separated), or
//!                                       the default set when empty
use std::path::{Path, PathBuf};

use confetti_core::{parse_with, ParseOptions};
use tracing::debug;

use crate::tap::Tap;

const DEFAULT_PUNCTUATORS: [&str; 4] = [":", ":=", "+", "-"];

enum Expect {
    Pass(String),
    Fail,
}

/// Run every test in `suite_dir` and collect the results.
pub fn run_suite(suite_dir: &Path, skip_extensions: bool) -> Tap {
    let mut tap = Tap::new();
    let mut inputs = glob_conf_files(suite_dir);
    inputs.sort();
    for conf in &inputs {
        run_case(conf, skip_extensions, &mut tap);
    }
    tap
}

fn run_case(conf: &Path, skip_extensions: bool, tap: &mut Tap) {
    let name = stem(conf);
    debug!(test = %name, "running conformance case");

    let expect = if let Ok(text) = std::fs::read_to_string(conf.with_extension("pass")) {
        Expect::Pass(text)
    } else if conf.with_extension("fail").exists() {
        Expect::Fail
    } else {
        tap.fail(&name, "missing .pass or .fail file");
        return;
    };

    let options = match extensions(conf) {
        Ok(Some(_)) if skip_extensions => {
            tap.skip(&name, "needs grammar extensions");
            return;
        }
        Ok(options) => options.unwrap_or_default(),
        Err(e) => {
            tap.fail(&name, e);
            return;
        }
    };

    // Malformed UTF-8 can only ever be a rejection.
    let src = match std::fs::read(conf).map(String::from_utf8) {
        Ok(Ok(src)) => src,
        Ok(Err(e)) => {
            match expect {
                Expect::Fail => tap.pass(&name),
                Expect::Pass(_) => tap.fail(&name, format!("input is not UTF-8: {}", e)),
            }
            return;
        }
        Err(e) => {
            tap.fail(&name, format!("cannot read {}: {}", conf.display(), e));
            return;
        }
    };

    match (expect, parse_with(&src, &options)) {
        (Expect::Pass(expected), Ok(doc)) => {
            let expected = expected.trim_end_matches(['\n', '\r']);
            let got = doc.outline();
            if got == expected {
                tap.pass(&name);
            } else {
                tap.fail(
                    &name,
                    format!(
                        "output mismatch:\n--- expected\n{}\n+++ got\n{}",
                        expected,
                        got
                    ),
                );
            }
        }
        (Expect::Pass(_), Err(e)) => {
            tap.fail(
                &name,
                format!(
                    "unexpected {} error at {}:{}: {}",
                    e.category(),
                    e.line,
                    e.column,
                    e.message
                ),
            );
        }
        (Expect::Fail, Err(e)) => {
            debug!(test = %name, kind = ?e.kind, "rejected as expected");
            tap.pass(&name);
        }
        (Expect::Fail, Ok(doc)) => {
            tap.fail(
                &name,
                format!("expected a parse error but got:\n{}", doc.outline()),
            );
        }
    }
}

/// The grammar extensions a test asks for, or `None` for the base grammar.
fn extensions(conf: &Path) -> Result<Option<ParseOptions>, String> {
    let marker = |ext: &str| conf.with_extension(format!("ext_{}", ext));
    let mut options = ParseOptions::default();
    let mut any = false;

    if marker("c_style_comments").exists() {
        options = options.with_c_style_comments();
        any = true;
    }
    if marker("expression_arguments").exists() {
        options = options.with_expression_arguments();
        any = true;
    }
    let punctuators = marker("punctuator_arguments");
    if punctuators.exists() {
        let listed = std::fs::read_to_string(&punctuators)
            .map_err(|e| format!("cannot read {}: {}", punctuators.display(), e))?;
        let listed: Vec<&str> = listed.split_whitespace().collect();
        options = if listed.is_empty() {
            options.with_punctuators(DEFAULT_PUNCTUATORS)
        } else {
            options.with_punctuators(listed)
        };
        any = true;
    }

    Ok(any.then_some(options))
}

// -- Helpers --

fn glob_conf_files(dir: &Path) -> Vec<PathBuf> {
    let mut results = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("conf") {
                results.push(path);
            }
        }
    }
    results
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}
