//! The measurement set, its outputs and session settings.

use crate::expr::Bindings;
use crate::measurement::{
    CompositeMeasurement, DirectMeasurement, Measurement, Name, Output, RecordId, Settings,
    UncertaintyTypes,
};
use crate::record::{self, Record, RecordError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DocumentError {
    #[error("No record with id {0}")]
    NotFound(RecordId),
    #[error("Name already in use: {0}")]
    NameTaken(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub measurements: Vec<Measurement>,
    pub outputs: Vec<Output>,
    pub settings: Settings,
    pub uncertainty_types: UncertaintyTypes,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constants(&self) -> Bindings {
        self.settings.constants()
    }

    /// True when another measurement (not `except`) already uses `name`'s symbol
    pub fn is_name_taken(&self, name: &str, except: Option<RecordId>) -> bool {
        let candidate = Name::parse(name);
        let Some(symbol) = candidate.symbol() else {
            return false;
        };
        self.measurements
            .iter()
            .any(|m| Some(m.id()) != except && m.symbol() == Some(symbol))
    }

    pub fn find_by_symbol(&self, symbol: &str) -> Option<&Measurement> {
        self.measurements.iter().find(|m| m.symbol() == Some(symbol))
    }

    pub fn measurement(&self, id: RecordId) -> Option<&Measurement> {
        self.measurements.iter().find(|m| m.id() == id)
    }

    pub fn measurement_mut(&mut self, id: RecordId) -> Result<&mut Measurement, DocumentError> {
        self.measurements
            .iter_mut()
            .find(|m| m.id() == id)
            .ok_or(DocumentError::NotFound(id))
    }

    /// Append a measurement; a name already in use is rejected
    pub fn add_measurement(&mut self, measurement: Measurement) -> Result<RecordId, DocumentError> {
        let name = measurement.name().text.clone();
        if self.is_name_taken(&name, None) {
            return Err(DocumentError::NameTaken(name));
        }
        let id = measurement.id();
        debug!(%id, name = %name, "adding measurement");
        self.measurements.push(measurement);
        Ok(id)
    }

    /// Rename a measurement, keeping names unique
    pub fn rename_measurement(&mut self, id: RecordId, name: &str) -> Result<(), DocumentError> {
        if self.is_name_taken(name, Some(id)) {
            return Err(DocumentError::NameTaken(name.to_string()));
        }
        match self.measurement_mut(id)? {
            Measurement::Direct(m) => m.rename(name),
            Measurement::Composite(m) => m.name = Name::parse(name),
        }
        Ok(())
    }

    pub fn remove_measurement(&mut self, id: RecordId) -> Result<Measurement, DocumentError> {
        let index = self
            .measurements
            .iter()
            .position(|m| m.id() == id)
            .ok_or(DocumentError::NotFound(id))?;
        Ok(self.measurements.remove(index))
    }

    /// Move a measurement to `index`, clamped to the list
    pub fn reorder_measurement(&mut self, id: RecordId, index: usize) -> Result<(), DocumentError> {
        let from = self
            .measurements
            .iter()
            .position(|m| m.id() == id)
            .ok_or(DocumentError::NotFound(id))?;
        let item = self.measurements.remove(from);
        let to = index.min(self.measurements.len());
        self.measurements.insert(to, item);
        Ok(())
    }

    pub fn add_output(&mut self, output: Output) -> RecordId {
        let id = output.id;
        self.outputs.push(output);
        id
    }

    pub fn output_mut(&mut self, id: RecordId) -> Result<&mut Output, DocumentError> {
        self.outputs
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(DocumentError::NotFound(id))
    }

    pub fn remove_output(&mut self, id: RecordId) -> Result<Output, DocumentError> {
        let index = self
            .outputs
            .iter()
            .position(|o| o.id == id)
            .ok_or(DocumentError::NotFound(id))?;
        Ok(self.outputs.remove(index))
    }

    /// Records for every named measurement and output, in display order
    pub fn to_records(&self) -> Vec<Record> {
        let measurements = self.measurements.iter().filter_map(|m| {
            let name = m.name().text.clone();
            if name.is_empty() {
                return None;
            }
            Some(match m {
                Measurement::Direct(d) => Record::Direct {
                    name,
                    unit: d.unit.clone(),
                    uncertainty_b: d.uncertainty_b.iter().map(|u| u.value.clone()).collect(),
                },
                Measurement::Composite(c) => Record::Composite {
                    name,
                    formula: c.formula.text.clone(),
                },
            })
        });
        let outputs = self
            .outputs
            .iter()
            .filter(|o| !o.name.is_empty())
            .map(|o| Record::Output {
                name: o.name.clone(),
                display_unit: o.display_unit.clone(),
            });
        measurements.chain(outputs).collect()
    }

    /// Replace measurements and outputs with fresh records; settings are kept
    pub fn load_records(&mut self, records: Vec<Record>) {
        self.measurements.clear();
        self.outputs.clear();
        for record in records {
            match record {
                Record::Direct {
                    name,
                    unit,
                    uncertainty_b,
                } => {
                    let values: Vec<&str> = uncertainty_b.iter().map(String::as_str).collect();
                    self.measurements
                        .push(DirectMeasurement::with_uncertainty_b(&name, &unit, &values).into());
                }
                Record::Composite { name, formula } => {
                    self.measurements
                        .push(CompositeMeasurement::new(&name, &formula).into());
                }
                Record::Output { name, display_unit } => {
                    self.outputs.push(Output::new(&name, display_unit.as_deref()));
                }
            }
        }
        debug!(
            measurements = self.measurements.len(),
            outputs = self.outputs.len(),
            "loaded records"
        );
    }

    pub fn to_query(&self) -> String {
        record::encode(&self.to_records())
    }

    pub fn from_query(query: &str) -> Result<Self, RecordError> {
        let mut document = Self::new();
        document.load_records(record::decode(query)?);
        Ok(document)
    }
}
