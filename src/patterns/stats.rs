// src/patterns/stats.rs — Hour-of-day statistics for a bucket of logs

/// Summary of one bucket's local logging hours.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketStats {
    pub sample_size: u32,
    pub hour_start: u8,
    pub hour_end: u8,
    pub variance: f64,
    pub confidence: f64,
}

/// Linear-interpolated quantile of an ascending slice. `q` in `[0, 1]`.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
        }
    }
}

/// Population variance in hours².
pub fn variance(hours: &[f64]) -> f64 {
    if hours.is_empty() {
        return 0.0;
    }
    let n = hours.len() as f64;
    let mean = hours.iter().sum::<f64>() / n;
    hours.iter().map(|h| (h - mean).powi(2)).sum::<f64>() / n
}

/// Grows with sample size, shrinks with spread; always within `[0, 1]`.
///
/// Three tightly clustered logs land around 0.4-0.5; two weeks of logs
/// inside the same half hour land above 0.8.
pub fn confidence_score(sample_size: u32, variance: f64) -> f64 {
    let n = sample_size as f64;
    let volume = n / (n + 3.0);
    let consistency = 1.0 / (1.0 + variance.max(0.0));
    (volume * consistency).clamp(0.0, 1.0)
}

/// Summarize fractional local hours. `None` for an empty bucket.
pub fn summarize(hours: &[f64]) -> Option<BucketStats> {
    if hours.is_empty() {
        return None;
    }

    let mut sorted = hours.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let hour_start = clamp_hour(q1.floor());
    let mut hour_end = clamp_hour(q3.ceil());
    if hour_end <= hour_start {
        hour_end = (hour_start + 1).min(23);
    }

    let var = variance(&sorted);
    let sample_size = sorted.len() as u32;

    Some(BucketStats {
        sample_size,
        hour_start,
        hour_end,
        variance: var,
        confidence: confidence_score(sample_size, var),
    })
}

fn clamp_hour(hour: f64) -> u8 {
    hour.clamp(0.0, 23.0) as u8
}
