use chrono::{NaiveDateTime, TimeDelta};
use rayon::prelude::*;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Length of the burst window measured forward from each anchor request
pub(crate) const BURST_WINDOW_SECONDS: i64 = 10;

pub(crate) fn burst_window() -> TimeDelta {
    TimeDelta::seconds(BURST_WINDOW_SECONDS)
}

/// Request timestamps per client address, in arrival order until analyzed
#[derive(Debug, Default)]
pub(crate) struct ClientHistory {
    requests: HashMap<String, Vec<NaiveDateTime>>,
}

impl ClientHistory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, client_ip: &str, timestamp: NaiveDateTime) {
        if let Some(timestamps) = self.requests.get_mut(client_ip) {
            timestamps.push(timestamp);
        } else {
            self.requests.insert(client_ip.to_string(), vec![timestamp]);
        }
    }

    pub(crate) fn client_count(&self) -> usize {
        self.requests.len()
    }

    #[allow(dead_code)]
    pub(crate) fn request_count(&self, client_ip: &str) -> usize {
        self.requests.get(client_ip).map_or(0, Vec::len)
    }

    /// Compute the burst metric for every client. Clients are independent, so
    /// they are spread over the rayon pool.
    pub(crate) fn analyze(self, window: TimeDelta) -> BurstResult {
        let counts = self
            .requests
            .into_par_iter()
            .map(|(client_ip, mut timestamps)| {
                let burst = max_burst(&mut timestamps, window);
                (client_ip, burst)
            })
            .collect();

        BurstResult { counts }
    }
}

/// Largest number of later requests within `window` of any single request.
///
/// Sorts `timestamps` in place. The anchor itself is not counted and a request
/// exactly `window` after the anchor is inside it. The end pointer only moves
/// forward, so the scan after sorting is linear.
pub(crate) fn max_burst(timestamps: &mut [NaiveDateTime], window: TimeDelta) -> usize {
    if timestamps.len() < 2 {
        return 0;
    }
    timestamps.sort();

    let mut best = 0;
    let mut end = 1;

    for (anchor, &start) in timestamps.iter().enumerate() {
        end = end.max(anchor + 1);
        while end < timestamps.len() && timestamps[end] - start <= window {
            end += 1;
        }
        best = best.max(end - anchor - 1);
    }

    best
}

/// Burst count per client address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct BurstResult {
    counts: HashMap<String, usize>,
}

#[allow(dead_code)]
impl BurstResult {
    pub(crate) fn get(&self, client_ip: &str) -> Option<usize> {
        self.counts.get(client_ip).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.counts.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Clients that never had a second request inside the window
    pub(crate) fn zero_count(&self) -> usize {
        self.counts.values().filter(|&&count| count == 0).count()
    }

    /// All clients, highest burst first; ties ordered by address
    pub(crate) fn ranked(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .counts
            .iter()
            .map(|(ip, &count)| (ip.as_str(), count))
            .collect();
        ranked.sort_by_key(|&(ip, count)| (Reverse(count), ip));
        ranked
    }
}
