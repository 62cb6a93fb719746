//! Statistical helpers and throughput aggregation
//!
//! Throughput is always expressed in decimal megabits per second
//! (10^6 bits), rounded to two decimal places.

use crate::{
    error::{AppError, Result},
    models::{TransferSummary, TransferTiming},
    types::TransferDirection,
};

/// Bits in one decimal megabit
pub const BITS_PER_MEGABIT: f64 = 1_000_000.0;

/// Decimal places kept in reported throughput
pub const THROUGHPUT_DECIMALS: u32 = 2;

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by `n`, not `n - 1`).
///
/// Zero for empty and single-element slices.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter()
        .map(|x| (x - mean).powi(2))
        .sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

/// Round half away from zero to the given number of decimals
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Bits carried by one chunk of `bytes`
pub fn chunk_bits(bytes: u64) -> u64 {
    bytes.saturating_mul(8)
}

/// Converts transfer timing datasets into throughput figures
pub struct ResultAggregator;

impl ResultAggregator {
    /// Throughput in Mbps for a dataset of transfers of `total_bits_per_chunk` each.
    ///
    /// Failed attempts are excluded from the averaged elapsed time. Fails with
    /// `InsufficientSamples` when no attempt succeeded.
    pub fn aggregate(timings: &[TransferTiming], total_bits_per_chunk: u64) -> Result<f64> {
        let average_seconds = Self::average_elapsed_seconds(timings)?;
        Ok(Self::throughput_mbps(total_bits_per_chunk, average_seconds))
    }

    /// Mean elapsed seconds over the successful attempts
    pub fn average_elapsed_seconds(timings: &[TransferTiming]) -> Result<f64> {
        let elapsed: Vec<f64> = timings
            .iter()
            .filter(|t| t.is_successful())
            .map(TransferTiming::elapsed_seconds)
            .collect();

        let average = mean(&elapsed).ok_or_else(|| {
            AppError::insufficient_samples(format!(
                "all {} transfer attempts failed",
                timings.len()
            ))
        })?;

        if average <= 0.0 || !average.is_finite() {
            return Err(AppError::insufficient_samples(
                "transfers completed in zero time; cannot compute throughput",
            ));
        }

        Ok(average)
    }

    /// Bits over seconds, in decimal megabits, rounded
    pub fn throughput_mbps(total_bits: u64, seconds: f64) -> f64 {
        round_to(
            (total_bits as f64 / seconds) / BITS_PER_MEGABIT,
            THROUGHPUT_DECIMALS,
        )
    }

    /// Full summary for one direction's dataset
    pub fn summarize(
        direction: TransferDirection,
        timings: &[TransferTiming],
        chunk_bytes: u64,
    ) -> Result<TransferSummary> {
        let average_seconds = Self::average_elapsed_seconds(timings).map_err(|e| match e {
            AppError::InsufficientSamples(msg) => {
                AppError::insufficient_samples(format!("{}: {}", direction, msg))
            }
            other => other,
        })?;

        Ok(TransferSummary {
            direction,
            chunk_bytes,
            attempted: timings.len(),
            succeeded: timings.iter().filter(|t| t.is_successful()).count(),
            average_seconds,
            mbps: Self::throughput_mbps(chunk_bits(chunk_bytes), average_seconds),
        })
    }
}
