//! Filter chain: parsing a filter list and running it on a field.
//!
//! A filter list is a `;`-separated string of tokens, executed left to right:
//!
//! | Token | Operation | Trace entry |
//! |---|---|---|
//! | `pc` | plane correction (`level`) | `Plane level` |
//! | `melc` | median line correction (`line_correct_median`) | `Median line correct` |
//! | `sr` | scar removal (`scars_remove`) | `Scars remove` |
//! | `poly:x[,y]` | polynomial levelling (`polylevel`) | `Polynomial level: (x,y)` |
//! | `mean:x` | square mean filter, `x` pixels | `Mean filter: (x pixel)` |
//! | `any:name` | any engine function by name | `name` |
//!
//! A bad token is rejected with a warning and never stops the chain; the
//! chain as a whole succeeds only if every non-empty token did.

use crate::engine::{DataField, EngineError, PolyLevelParams, ProcessingEngine, Settings};
use thiserror::Error;
use tracing::warn;

pub const FILTER_DELIMITER: char = ';';

/// Chain used when no (usable) filter list is given.
pub const DEFAULT_FILTERS: &str = "pc;melc;sr;melc;pc";

/// One parsed filter token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOp {
    PlaneCorrect,
    MedianLineCorrect,
    ScarRemove,
    PolyLevel { col_degree: u32, row_degree: u32 },
    MeanFilter { size: u32 },
    Invoke { name: String },
    /// Empty token (`;;`), ignored.
    Empty,
}

impl FilterOp {
    /// Trace entry recorded when the operation runs.
    pub fn description(&self) -> String {
        match self {
            FilterOp::PlaneCorrect => "Plane level".to_string(),
            FilterOp::MedianLineCorrect => "Median line correct".to_string(),
            FilterOp::ScarRemove => "Scars remove".to_string(),
            FilterOp::PolyLevel {
                col_degree,
                row_degree,
            } => format!("Polynomial level: ({col_degree},{row_degree})"),
            FilterOp::MeanFilter { size } => format!("Mean filter: ({size} pixel)"),
            FilterOp::Invoke { name } => name.clone(),
            FilterOp::Empty => String::new(),
        }
    }
}

/// Why a token did not run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejected {
    #[error("unknown filter")]
    UnknownFilter,
    #[error("malformed parameters")]
    Malformed,
    #[error("polynomial degrees must be positive")]
    InvalidDegree,
    #[error("mean filter size must be positive")]
    InvalidSize,
    #[error("no process function named `{0}`")]
    NoSuchFunction(String),
    #[error("processing failed: {0}")]
    Failed(String),
}

impl From<EngineError> for Rejected {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::UnknownFunction(name) => Rejected::NoSuchFunction(name),
            other => Rejected::Failed(other.to_string()),
        }
    }
}

/// A token that ran successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub op: FilterOp,
    pub description: String,
}

/// A filter list split into tokens, each parsed or rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSpec {
    pub tokens: Vec<(String, Result<FilterOp, Rejected>)>,
    /// The default chain replaced an empty or unusable filter list.
    pub used_default: bool,
}

/// Outcome of running a whole chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChainResult {
    /// One entry per non-empty token, in order.
    pub outcomes: Vec<Result<Applied, Rejected>>,
}

impl FilterChainResult {
    /// True if every token was applied.
    pub fn success(&self) -> bool {
        self.outcomes.iter().fold(true, |ok, o| ok && o.is_ok())
    }

    /// Trace entries of the applied operations, in execution order.
    pub fn descriptions(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|o| o.as_ref().ok())
            .map(|a| a.description.clone())
            .collect()
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_whitespace() || "_-.:,;".contains(c)
}

fn parse_positive(arg: &str, invalid: Rejected) -> Result<u32, Rejected> {
    let value: i64 = arg.trim().parse().map_err(|_| Rejected::Malformed)?;
    if value <= 0 {
        return Err(invalid);
    }
    u32::try_from(value).map_err(|_| invalid)
}

fn parse_poly(arg: &str) -> Result<FilterOp, Rejected> {
    if arg.matches(',').count() > 1 {
        return Err(Rejected::Malformed);
    }
    let (x, y) = match arg.split_once(',') {
        Some((x, y)) => (x, Some(y)),
        None => (arg, None),
    };
    let col_degree = parse_positive(x, Rejected::InvalidDegree)?;
    let row_degree = match y {
        Some(y) => parse_positive(y, Rejected::InvalidDegree)?,
        None => col_degree,
    };
    Ok(FilterOp::PolyLevel {
        col_degree,
        row_degree,
    })
}

/// Parse a single (already trimmed) token.
pub fn parse_token(token: &str) -> Result<FilterOp, Rejected> {
    match token {
        "" => return Ok(FilterOp::Empty),
        "pc" => return Ok(FilterOp::PlaneCorrect),
        "melc" => return Ok(FilterOp::MedianLineCorrect),
        "sr" => return Ok(FilterOp::ScarRemove),
        _ => {}
    }

    let Some((name, arg)) = token.split_once(':') else {
        return Err(Rejected::UnknownFilter);
    };
    if !matches!(name, "poly" | "mean" | "any") {
        return Err(Rejected::UnknownFilter);
    }
    if arg.contains(':') {
        return Err(Rejected::Malformed);
    }
    match name {
        "poly" => parse_poly(arg),
        "mean" => Ok(FilterOp::MeanFilter {
            size: parse_positive(arg, Rejected::InvalidSize)?,
        }),
        _ => {
            let function = arg.trim();
            if function.is_empty() {
                return Err(Rejected::Malformed);
            }
            Ok(FilterOp::Invoke {
                name: function.to_string(),
            })
        }
    }
}

fn split_spec(spec: &str) -> Vec<(String, Result<FilterOp, Rejected>)> {
    spec.split(FILTER_DELIMITER)
        .map(str::trim)
        .map(|t| (t.to_string(), parse_token(t)))
        .collect()
}

/// Parse a filter list, substituting the default chain when it is empty,
/// delimiter-only, or contains characters no token can contain.
pub fn parse_filter_spec(spec: &str) -> ParsedSpec {
    let blank = spec
        .chars()
        .all(|c| c == FILTER_DELIMITER || c.is_whitespace());
    if blank {
        return ParsedSpec {
            tokens: split_spec(DEFAULT_FILTERS),
            used_default: true,
        };
    }
    if !spec.chars().all(is_token_char) {
        warn!("`{spec}' is no valid filter list, using defaults `{DEFAULT_FILTERS}'");
        return ParsedSpec {
            tokens: split_spec(DEFAULT_FILTERS),
            used_default: true,
        };
    }
    ParsedSpec {
        tokens: split_spec(spec),
        used_default: false,
    }
}

fn apply<E: ProcessingEngine>(
    op: &FilterOp,
    engine: &E,
    field: &mut DataField,
    settings: &mut Settings,
) -> Result<(), Rejected> {
    match op {
        FilterOp::PlaneCorrect => engine.run_function("level", field, settings)?,
        FilterOp::MedianLineCorrect => {
            engine.run_function("line_correct_median", field, settings)?
        }
        FilterOp::ScarRemove => engine.run_function("scars_remove", field, settings)?,
        FilterOp::PolyLevel {
            col_degree,
            row_degree,
        } => {
            settings.polylevel = PolyLevelParams::new(*col_degree, *row_degree);
            engine.run_function("polylevel", field, settings)?
        }
        FilterOp::MeanFilter { size } => engine.mean_filter(field, *size)?,
        FilterOp::Invoke { name } => {
            if !engine.function_exists(name) {
                return Err(Rejected::NoSuchFunction(name.clone()));
            }
            engine.run_function(name, field, settings)?
        }
        FilterOp::Empty => {}
    }
    Ok(())
}

/// Parse `spec` and run it on `field`, one token at a time.
pub fn run_filter_chain<E: ProcessingEngine>(
    spec: &str,
    engine: &E,
    field: &mut DataField,
    settings: &mut Settings,
) -> FilterChainResult {
    let parsed = parse_filter_spec(spec);
    let mut result = FilterChainResult::default();

    for (token, parsed_op) in parsed.tokens {
        let outcome = parsed_op.and_then(|op| {
            if op == FilterOp::Empty {
                return Ok(None);
            }
            apply(&op, engine, field, settings)?;
            Ok(Some(op))
        });
        match outcome {
            Ok(None) => {}
            Ok(Some(op)) => result.outcomes.push(Ok(Applied {
                description: op.description(),
                op,
            })),
            Err(reason) => {
                warn!("Filter `{token}' rejected: {reason}");
                result.outcomes.push(Err(reason));
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::backend::tests::{MockEngine, RecordedOp};
    use crate::test_helpers::flat_field;

    fn run(spec: &str, engine: &MockEngine) -> FilterChainResult {
        run_filter_chain(spec, engine, &mut flat_field(4, 4), &mut Settings::default())
    }

    // =========================================================================
    // parse_token
    // =========================================================================

    #[test]
    fn simple_tokens() {
        assert_eq!(parse_token("pc"), Ok(FilterOp::PlaneCorrect));
        assert_eq!(parse_token("melc"), Ok(FilterOp::MedianLineCorrect));
        assert_eq!(parse_token("sr"), Ok(FilterOp::ScarRemove));
        assert_eq!(parse_token(""), Ok(FilterOp::Empty));
        assert_eq!(parse_token("PC"), Err(Rejected::UnknownFilter));
        assert_eq!(parse_token("xyz"), Err(Rejected::UnknownFilter));
    }

    #[test]
    fn poly_single_degree_applies_to_both() {
        assert_eq!(
            parse_token("poly:3"),
            Ok(FilterOp::PolyLevel {
                col_degree: 3,
                row_degree: 3
            })
        );
        assert_eq!(
            parse_token("poly:2,4"),
            Ok(FilterOp::PolyLevel {
                col_degree: 2,
                row_degree: 4
            })
        );
    }

    #[test]
    fn poly_malformed_shapes() {
        assert_eq!(parse_token("poly:3,"), Err(Rejected::Malformed));
        assert_eq!(parse_token("poly:"), Err(Rejected::Malformed));
        assert_eq!(parse_token("poly:1,2,3"), Err(Rejected::Malformed));
        assert_eq!(parse_token("poly:1:2"), Err(Rejected::Malformed));
        assert_eq!(parse_token("poly"), Err(Rejected::UnknownFilter));
    }

    #[test]
    fn poly_non_positive_degrees() {
        assert_eq!(parse_token("poly:0,0"), Err(Rejected::InvalidDegree));
        assert_eq!(parse_token("poly:2,0"), Err(Rejected::InvalidDegree));
        assert_eq!(parse_token("poly:-1"), Err(Rejected::InvalidDegree));
    }

    #[test]
    fn mean_sizes() {
        assert_eq!(parse_token("mean:4"), Ok(FilterOp::MeanFilter { size: 4 }));
        assert_eq!(parse_token("mean:0"), Err(Rejected::InvalidSize));
        assert_eq!(parse_token("mean:-5"), Err(Rejected::InvalidSize));
        assert_eq!(parse_token("mean:abc"), Err(Rejected::Malformed));
        assert_eq!(parse_token("mean:1,2"), Err(Rejected::Malformed));
    }

    #[test]
    fn any_requires_name() {
        assert_eq!(
            parse_token("any:fix_zero"),
            Ok(FilterOp::Invoke {
                name: "fix_zero".into()
            })
        );
        assert_eq!(parse_token("any:"), Err(Rejected::Malformed));
        assert_eq!(parse_token("any:a:b"), Err(Rejected::Malformed));
    }

    #[test]
    fn descriptions() {
        assert_eq!(
            FilterOp::PolyLevel {
                col_degree: 2,
                row_degree: 3
            }
            .description(),
            "Polynomial level: (2,3)"
        );
        assert_eq!(
            FilterOp::MeanFilter { size: 4 }.description(),
            "Mean filter: (4 pixel)"
        );
        assert_eq!(
            FilterOp::Invoke {
                name: "fix_zero".into()
            }
            .description(),
            "fix_zero"
        );
    }

    // =========================================================================
    // parse_filter_spec
    // =========================================================================

    #[test]
    fn parsing_is_deterministic() {
        let spec = "pc;poly:2,3;mean:4;any:fix_zero;bogus";
        assert_eq!(parse_filter_spec(spec), parse_filter_spec(spec));
    }

    #[test]
    fn blank_specs_use_default() {
        for spec in ["", "   ", ";;;", " ; "] {
            let parsed = parse_filter_spec(spec);
            assert!(parsed.used_default, "{spec:?}");
            let ops: Vec<_> = parsed.tokens.into_iter().map(|(_, op)| op.unwrap()).collect();
            assert_eq!(
                ops,
                vec![
                    FilterOp::PlaneCorrect,
                    FilterOp::MedianLineCorrect,
                    FilterOp::ScarRemove,
                    FilterOp::MedianLineCorrect,
                    FilterOp::PlaneCorrect,
                ]
            );
        }
    }

    #[test]
    fn garbage_spec_uses_default() {
        assert!(parse_filter_spec("pc;$%&").used_default);
        assert!(parse_filter_spec("poly(2)").used_default);
    }

    #[test]
    fn tokens_are_trimmed() {
        let parsed = parse_filter_spec(" pc ; melc ");
        assert!(!parsed.used_default);
        assert_eq!(parsed.tokens[0].1, Ok(FilterOp::PlaneCorrect));
        assert_eq!(parsed.tokens[1].1, Ok(FilterOp::MedianLineCorrect));
    }

    // =========================================================================
    // run_filter_chain
    // =========================================================================

    #[test]
    fn default_chain_runs_five_operations() {
        let engine = MockEngine::new();
        let result = run("", &engine);
        assert!(result.success());
        assert_eq!(
            engine.run_names(),
            vec![
                "level",
                "line_correct_median",
                "scars_remove",
                "line_correct_median",
                "level"
            ]
        );
        assert_eq!(
            result.descriptions(),
            vec![
                "Plane level",
                "Median line correct",
                "Scars remove",
                "Median line correct",
                "Plane level"
            ]
        );
    }

    #[test]
    fn poly_writes_settings_before_running() {
        let engine = MockEngine::new();
        let mut settings = Settings::default();
        let result = run_filter_chain("poly:3", &engine, &mut flat_field(4, 4), &mut settings);
        assert!(result.success());
        assert_eq!(
            engine.get_operations(),
            vec![RecordedOp::Run {
                name: "polylevel".into(),
                col_degree: 3,
                row_degree: 3
            }]
        );
        assert_eq!(settings.polylevel, PolyLevelParams::new(3, 3));
        assert_eq!(result.descriptions(), vec!["Polynomial level: (3,3)"]);
    }

    #[test]
    fn rejected_poly_runs_nothing() {
        for spec in ["poly:3,", "poly:0,0"] {
            let engine = MockEngine::new();
            let result = run(spec, &engine);
            assert!(!result.success(), "{spec}");
            assert!(engine.get_operations().is_empty(), "{spec}");
            assert!(result.descriptions().is_empty());
        }
    }

    #[test]
    fn mean_filter_runs_or_is_rejected() {
        let engine = MockEngine::new();
        let result = run("mean:4", &engine);
        assert!(result.success());
        assert_eq!(engine.get_operations(), vec![RecordedOp::Mean(4)]);
        assert_eq!(result.descriptions(), vec!["Mean filter: (4 pixel)"]);

        for spec in ["mean:0", "mean:-5"] {
            let engine = MockEngine::new();
            assert!(!run(spec, &engine).success());
            assert!(engine.get_operations().is_empty());
        }
    }

    #[test]
    fn unknown_token_does_not_stop_chain() {
        let engine = MockEngine::new();
        let result = run("xyz;pc", &engine);
        assert!(!result.success());
        assert_eq!(engine.run_names(), vec!["level"]);
        assert_eq!(result.descriptions(), vec!["Plane level"]);
        assert_eq!(result.outcomes[0], Err(Rejected::UnknownFilter));
    }

    #[test]
    fn empty_tokens_record_nothing() {
        let engine = MockEngine::new();
        let result = run("pc;;sr", &engine);
        assert!(result.success());
        assert_eq!(result.outcomes.len(), 2);
    }

    #[test]
    fn any_checks_function_exists() {
        let engine = MockEngine::with_functions(&["fix_zero"]);
        let result = run("any:fix_zero;any:nope", &engine);
        assert_eq!(engine.run_names(), vec!["fix_zero"]);
        assert_eq!(result.descriptions(), vec!["fix_zero"]);
        assert_eq!(
            result.outcomes[1],
            Err(Rejected::NoSuchFunction("nope".into()))
        );
        assert!(!result.success());
    }

    #[test]
    fn engine_failure_is_recorded_and_chain_continues() {
        let engine = MockEngine::new().failing("scars_remove");
        let result = run("sr;pc", &engine);
        assert!(!result.success());
        assert!(matches!(result.outcomes[0], Err(Rejected::Failed(_))));
        assert_eq!(result.descriptions(), vec!["Plane level"]);
        assert_eq!(engine.run_names(), vec!["scars_remove", "level"]);
    }
}
