use tracing::debug;

use super::domain::{ConfigSource, Dimension};
use super::input::{
    ConfidenceCalculationInput, ExtractionSignal, FieldCompletenessSignal, FormatSignal,
    HistoricalAccuracy, IssuerSignal, TermMatchingSignal,
};
use crate::policy::ConfidencePolicy;

const NEUTRAL_SOURCE: &str = "neutral_default";

/// Unweighted score for one dimension, before the aggregator attaches weights.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawDimensionScore {
    pub dimension: Dimension,
    pub raw_score: f64,
    pub source: String,
    pub details: Option<String>,
}

pub(crate) struct EvaluatedDimensions {
    pub scores: Vec<RawDimensionScore>,
    pub config_source: ConfigSource,
    pub warnings: Vec<String>,
}

enum Derived {
    Score {
        value: f64,
        source: String,
        details: Option<String>,
    },
    Missing(String),
}

/// Derive all seven raw scores. Never omits a dimension.
pub(crate) fn evaluate_dimensions(
    input: &ConfidenceCalculationInput,
    policy: &ConfidencePolicy,
) -> EvaluatedDimensions {
    let mut warnings = Vec::new();
    let mut scores = Vec::with_capacity(Dimension::ALL.len());

    for dimension in Dimension::ALL {
        let derived = match dimension {
            Dimension::Extraction => extraction(input.extraction.as_ref()),
            Dimension::IssuerIdentification => issuer(input.issuer.as_ref()),
            Dimension::FormatMatching => format_matching(input.format.as_ref()),
            Dimension::ConfigMatch => config_match(input.config_source, policy),
            Dimension::HistoricalAccuracy => historical(input.historical.as_ref(), policy),
            Dimension::FieldCompleteness => {
                completeness(input.completeness.as_ref(), policy, &mut warnings)
            }
            Dimension::TermMatching => terms(input.terms.as_ref(), &mut warnings),
        };

        scores.push(resolve(dimension, derived, policy, &mut warnings));
    }

    EvaluatedDimensions {
        scores,
        config_source: input.config_source.unwrap_or(ConfigSource::Default),
        warnings,
    }
}

fn resolve(
    dimension: Dimension,
    derived: Derived,
    policy: &ConfidencePolicy,
    warnings: &mut Vec<String>,
) -> RawDimensionScore {
    let neutral = policy.neutral_score();

    match derived {
        Derived::Missing(reason) => {
            debug!(dimension = dimension.label(), %reason, "falling back to neutral score");
            warnings.push(format!(
                "{}: {reason}; using neutral score {neutral}",
                dimension.label()
            ));
            RawDimensionScore {
                dimension,
                raw_score: neutral,
                source: NEUTRAL_SOURCE.to_string(),
                details: Some(reason),
            }
        }
        Derived::Score { value, .. } if !value.is_finite() => {
            warnings.push(format!(
                "{}: non-finite score {value}; using neutral score {neutral}",
                dimension.label()
            ));
            RawDimensionScore {
                dimension,
                raw_score: neutral,
                source: NEUTRAL_SOURCE.to_string(),
                details: Some("non-finite upstream score".to_string()),
            }
        }
        Derived::Score {
            value,
            source,
            details,
        } => {
            let clamped = value.clamp(0.0, 100.0);
            if clamped != value {
                warnings.push(format!(
                    "{}: score {value} clamped to {clamped}",
                    dimension.label()
                ));
            }
            RawDimensionScore {
                dimension,
                raw_score: clamped,
                source,
                details,
            }
        }
    }
}

fn extraction(signal: Option<&ExtractionSignal>) -> Derived {
    match signal {
        Some(signal) => Derived::Score {
            value: signal.confidence,
            source: signal
                .method
                .map(|method| method.label())
                .unwrap_or("extraction")
                .to_string(),
            details: None,
        },
        None => Derived::Missing("no extraction confidence reported".to_string()),
    }
}

fn issuer(signal: Option<&IssuerSignal>) -> Derived {
    let Some(signal) = signal else {
        return Derived::Missing("no issuer identification result".to_string());
    };

    let source = match signal.method {
        Some(method) => format!("issuer_identification:{}", method.label()),
        None => "issuer_identification".to_string(),
    };

    if signal.identified {
        Derived::Score {
            value: signal.confidence,
            source,
            details: None,
        }
    } else {
        Derived::Score {
            value: 0.0,
            source,
            details: Some(format!(
                "issuer not identified (best candidate {:.1})",
                signal.confidence
            )),
        }
    }
}

fn format_matching(signal: Option<&FormatSignal>) -> Derived {
    let Some(signal) = signal else {
        return Derived::Missing("no format matching result".to_string());
    };

    let source = match &signal.format_id {
        Some(id) => format!("format:{id}"),
        None => "format_matching".to_string(),
    };

    if signal.matched {
        Derived::Score {
            value: signal.confidence,
            source,
            details: None,
        }
    } else {
        Derived::Score {
            value: 0.0,
            source,
            details: Some("no known format matched".to_string()),
        }
    }
}

fn config_match(source: Option<ConfigSource>, policy: &ConfidencePolicy) -> Derived {
    match source {
        Some(source) => Derived::Score {
            value: policy.config_match_scores().get(source),
            source: format!("config_source:{}", source.label()),
            details: None,
        },
        None => Derived::Missing(
            "no configuration source selected (reported as default with no bonus, \
             scored neutral rather than the default tier)"
                .to_string(),
        ),
    }
}

fn historical(history: Option<&HistoricalAccuracy>, policy: &ConfidencePolicy) -> Derived {
    let Some(history) = history else {
        return Derived::Missing("no processing history".to_string());
    };

    let minimum = policy.min_historical_sample();
    if history.total_processed == 0 || history.total_processed < minimum {
        return Derived::Missing(format!(
            "insufficient sample size ({} < {minimum})",
            history.total_processed
        ));
    }

    Derived::Score {
        value: history.successfully_mapped as f64 / history.total_processed as f64 * 100.0,
        source: "outcome_history".to_string(),
        details: Some(format!(
            "{}/{} mappings confirmed",
            history.successfully_mapped, history.total_processed
        )),
    }
}

fn completeness(
    signal: Option<&FieldCompletenessSignal>,
    policy: &ConfidencePolicy,
    warnings: &mut Vec<String>,
) -> Derived {
    let Some(signal) = signal else {
        return Derived::Missing("no field mapping statistics".to_string());
    };
    if signal.total_fields == 0 {
        return Derived::Missing("no fields expected".to_string());
    }

    let label = Dimension::FieldCompleteness.label();
    let filled = capped(signal.filled_fields, signal.total_fields, "filled fields", label, warnings);
    let overall_ratio = filled as f64 / signal.total_fields as f64;

    if signal.required_fields == 0 {
        return Derived::Score {
            value: overall_ratio * 100.0,
            source: "field_mapping".to_string(),
            details: Some(format!(
                "{filled}/{} fields filled; no required fields",
                signal.total_fields
            )),
        };
    }

    let filled_required = capped(
        signal.filled_required_fields,
        signal.required_fields,
        "filled required fields",
        label,
        warnings,
    );
    let required_ratio = filled_required as f64 / signal.required_fields as f64;
    let weights = policy.completeness();

    Derived::Score {
        value: (weights.overall * overall_ratio + weights.required * required_ratio) * 100.0,
        source: "field_mapping".to_string(),
        details: Some(format!(
            "{filled}/{} fields filled, {filled_required}/{} required",
            signal.total_fields, signal.required_fields
        )),
    }
}

fn terms(signal: Option<&TermMatchingSignal>, warnings: &mut Vec<String>) -> Derived {
    let Some(signal) = signal else {
        return Derived::Missing("no term matching statistics".to_string());
    };
    if signal.total_terms == 0 {
        return Derived::Missing("no terms to match".to_string());
    }

    let matched = capped(
        signal.matched_terms,
        signal.total_terms,
        "matched terms",
        Dimension::TermMatching.label(),
        warnings,
    );

    Derived::Score {
        value: matched as f64 / signal.total_terms as f64 * 100.0,
        source: "term_matching".to_string(),
        details: Some(format!(
            "{matched}/{} terms matched, {} new",
            signal.total_terms, signal.new_terms
        )),
    }
}

fn capped(value: u32, total: u32, what: &str, label: &str, warnings: &mut Vec<String>) -> u32 {
    if value > total {
        warnings.push(format!("{label}: {what} {value} exceeds total {total}; capped"));
        total
    } else {
        value
    }
}
