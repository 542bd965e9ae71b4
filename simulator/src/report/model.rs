use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use sweepcore::{CutoffRecord, DerivedPoint};

/// Everything a finished sweep hands to the exporters.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResultSet {
    pub device_label: String,
    pub sweep_params: BTreeMap<String, String>,
    pub points: Vec<DerivedPoint>,
    pub cutoffs: Vec<CutoffRecord>,
}
