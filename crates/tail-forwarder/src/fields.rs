// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Field extraction with a strict no-masking policy.
//!
//! Absent and empty values surface as `None` so that downstream serialization
//! drops the field entirely; they are never replaced by a sentinel string.
//! Present-but-falsy values such as `"0"` or `"false"` pass through
//! unchanged. Every miss emits a sampled diagnostic so that a systematically
//! missing field is visible without flooding the logging channel.

use rand::Rng;
use tracing::debug;

/// Fraction of field misses that produce a diagnostic
pub const MISS_SAMPLE_RATE: f64 = 0.1;

/// Sampling strategy for miss diagnostics
#[derive(Debug, Clone)]
pub enum Sampler {
    /// Log roughly this fraction of misses
    Ratio(f64),
    /// Log every miss (tests)
    Always,
    /// Log no misses (tests)
    Never,
}

impl Default for Sampler {
    fn default() -> Self {
        Sampler::Ratio(MISS_SAMPLE_RATE)
    }
}

impl Sampler {
    pub(crate) fn should_log(&self) -> bool {
        match self {
            Sampler::Ratio(rate) => rand::rng().random::<f64>() < *rate,
            Sampler::Always => true,
            Sampler::Never => false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FieldResolver {
    sampler: Sampler,
}

impl FieldResolver {
    pub fn new(sampler: Sampler) -> Self {
        FieldResolver { sampler }
    }

    /// Resolve a string field. `None` and the empty string count as misses;
    /// anything else is returned unchanged.
    pub fn resolve(&self, value: Option<&str>, field: &str, context: &str) -> Option<String> {
        match value {
            Some(value) if !value.is_empty() => Some(value.to_string()),
            _ => {
                self.report_miss(field, context);
                None
            }
        }
    }

    /// Resolve a field that should parse as a finite float. A value that is
    /// present but not a number counts as a miss, never as zero.
    pub fn resolve_f64(&self, value: Option<&str>, field: &str, context: &str) -> Option<f64> {
        let raw = self.resolve(value, field, context)?;
        match raw.parse::<f64>() {
            Ok(parsed) if parsed.is_finite() => Some(parsed),
            _ => {
                self.report_miss(field, context);
                None
            }
        }
    }

    pub(crate) fn report_miss(&self, field: &str, context: &str) {
        if self.sampler.should_log() {
            debug!("no value found for '{field}' in {context}");
        }
    }
}
