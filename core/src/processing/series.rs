use std::collections::HashMap;

/// Exact LO frequency (Hz) used to bucket points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrequencyKey(u64);

impl FrequencyKey {
    pub fn from_hz(hz: f64) -> Self {
        // fold -0.0 into 0.0 so both land in one bucket
        let hz = if hz == 0.0 { 0.0 } else { hz };
        Self(hz.to_bits())
    }

    pub fn hz(&self) -> f64 {
        f64::from_bits(self.0)
    }
}

/// Input level and compared metric for one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPair {
    pub input_db: f64,
    pub metric: f64,
}

impl SeriesPair {
    pub fn new(input_db: f64, metric: f64) -> Self {
        Self { input_db, metric }
    }
}

/// Points sharing one LO frequency, in ingestion order.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencySeries {
    key: FrequencyKey,
    pairs: Vec<SeriesPair>,
}

impl FrequencySeries {
    pub fn new(key: FrequencyKey) -> Self {
        Self {
            key,
            pairs: Vec::new(),
        }
    }

    pub fn key(&self) -> FrequencyKey {
        self.key
    }

    pub fn pairs(&self) -> &[SeriesPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Groups points by LO frequency. Buckets keep first-seen order.
#[derive(Debug, Clone, Default)]
pub struct SeriesAccumulator {
    buckets: Vec<FrequencySeries>,
    index: HashMap<FrequencyKey, usize>,
}

impl SeriesAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, key: FrequencyKey, input_db: f64, metric: f64) {
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                self.buckets.push(FrequencySeries::new(key));
                let slot = self.buckets.len() - 1;
                self.index.insert(key, slot);
                slot
            }
        };
        self.buckets[slot]
            .pairs
            .push(SeriesPair::new(input_db, metric));
    }

    pub fn get(&self, key: FrequencyKey) -> Option<&FrequencySeries> {
        self.index.get(&key).map(|&slot| &self.buckets[slot])
    }

    pub fn buckets(&self) -> &[FrequencySeries] {
        &self.buckets
    }

    /// Number of distinct frequency keys.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn total_pairs(&self) -> usize {
        self.buckets.iter().map(FrequencySeries::len).sum()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.index.clear();
    }
}
