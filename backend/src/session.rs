//! One client's document and the command protocol that edits it.
//!
//! Frames are `COMMAND:payload` text; every command answers with zero or
//! more frames of the same shape.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use uncalc_core::document::{Document, DocumentError};
use uncalc_core::measurement::{
    split_input, CompositeMeasurement, DirectMeasurement, Distribution, Measurement, Output,
    RecordId, Settings, UncertaintyTypes, MAX_UNCERTAINTY_B,
};
use uncalc_core::propagation::Propagator;
use uncalc_core::report::{evaluate_output, OutputReport};
use uuid::Uuid;

/// Format an error as a JSON message for the frontend
pub fn format_error(code: &str, message: &str, severity: &str) -> String {
    format!(
        "ERROR_UPDATE:{}",
        json!({
            "code": code,
            "message": message,
            "severity": severity
        })
    )
}

struct CommandError {
    code: &'static str,
    message: String,
}

impl CommandError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn bad_payload(command: &str, err: impl std::fmt::Display) -> Self {
        Self::new("BAD_PAYLOAD", format!("{}: {}", command, err))
    }
}

enum Reply {
    /// Document changed; push it and the recomputed outputs
    Refresh,
    Export(String),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum AddCmd {
    Direct {
        #[serde(default)]
        name: String,
        #[serde(default)]
        unit: String,
    },
    Composite {
        #[serde(default)]
        name: String,
        #[serde(default)]
        formula: String,
    },
}

#[derive(Deserialize)]
struct TypeBEntry {
    value: String,
    #[serde(default)]
    distribution: Distribution,
}

#[derive(Deserialize)]
struct UpdateCmd {
    id: Uuid,
    name: Option<String>,
    unit: Option<String>,
    formula: Option<String>,
    uncertainty_b: Option<Vec<TypeBEntry>>,
}

#[derive(Deserialize)]
struct ValuesCmd {
    id: Uuid,
    input: String,
    zero_offset: Option<f64>,
}

#[derive(Deserialize)]
struct ReorderCmd {
    id: Uuid,
    index: usize,
}

#[derive(Deserialize)]
struct OutputAddCmd {
    name: String,
    display_unit: Option<String>,
}

#[derive(Deserialize)]
struct OutputUpdateCmd {
    id: Uuid,
    name: Option<String>,
    display_unit: Option<String>,
}

#[derive(Deserialize)]
struct GravityCmd {
    gravity: Option<f64>,
    latitude: Option<f64>,
}

/// Evaluated state of one output as sent to the client
#[derive(Debug, Serialize)]
pub struct OutputState {
    pub id: RecordId,
    pub name: String,
    pub report: Option<OutputReport>,
    pub concise: Option<String>,
    pub error: Option<String>,
}

pub struct Session {
    document: Document,
    propagator: Propagator,
}

impl Session {
    pub fn new(gravity: f64) -> Self {
        let mut document = Document::new();
        document.settings = Settings { gravity };
        let propagator = Propagator::new(document.constants());
        Self {
            document,
            propagator,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Frames describing the whole session, sent on connect
    pub fn snapshot(&mut self) -> Vec<String> {
        vec![self.document_frame(), self.outputs_frame()]
    }

    /// Apply one text frame and return the replies.
    pub fn handle(&mut self, text: &str) -> Vec<String> {
        let (command, payload) = text.split_once(':').unwrap_or((text, ""));
        info!("Received command {}", command);

        match self.apply(command, payload) {
            Ok(Reply::Refresh) => self.snapshot(),
            Ok(Reply::Export(query)) => vec![format!("EXPORT:{}", query)],
            Err(e) => {
                warn!("{} failed: {}", command, e.message);
                vec![format_error(e.code, &e.message, "error")]
            }
        }
    }

    fn apply(&mut self, command: &str, payload: &str) -> Result<Reply, CommandError> {
        match command {
            "MEASUREMENT_ADD" => {
                let cmd: AddCmd = parse(command, payload)?;
                let measurement: Measurement = match cmd {
                    AddCmd::Direct { name, unit } => {
                        let mut m = DirectMeasurement::new("", &unit);
                        m.rename(&name);
                        m.into()
                    }
                    AddCmd::Composite { name, formula } => {
                        CompositeMeasurement::new(&name, &formula).into()
                    }
                };
                self.document
                    .add_measurement(measurement)
                    .map_err(document_error)?;
                Ok(Reply::Refresh)
            }
            "MEASUREMENT_UPDATE" => {
                let cmd: UpdateCmd = parse(command, payload)?;
                self.update_measurement(cmd)?;
                Ok(Reply::Refresh)
            }
            "MEASUREMENT_VALUES" => {
                let cmd: ValuesCmd = parse(command, payload)?;
                let id = RecordId::from_uuid(cmd.id);
                match self.document.measurement_mut(id).map_err(document_error)? {
                    Measurement::Direct(m) => {
                        let inputs = split_input(&cmd.input);
                        m.commit_values(&inputs, cmd.zero_offset);
                        debug!("Committed {} values to {}", m.values.len(), id);
                    }
                    Measurement::Composite(_) => {
                        return Err(CommandError::new(
                            "NOT_DIRECT",
                            format!("{} is not a direct measurement", id),
                        ))
                    }
                }
                Ok(Reply::Refresh)
            }
            "MEASUREMENT_DELETE" => {
                let id = parse_id(command, payload)?;
                self.document.remove_measurement(id).map_err(document_error)?;
                Ok(Reply::Refresh)
            }
            "MEASUREMENT_REORDER" => {
                let cmd: ReorderCmd = parse(command, payload)?;
                self.document
                    .reorder_measurement(RecordId::from_uuid(cmd.id), cmd.index)
                    .map_err(document_error)?;
                Ok(Reply::Refresh)
            }
            "OUTPUT_ADD" => {
                let cmd: OutputAddCmd = parse(command, payload)?;
                self.document
                    .add_output(Output::new(&cmd.name, cmd.display_unit.as_deref()));
                Ok(Reply::Refresh)
            }
            "OUTPUT_UPDATE" => {
                let cmd: OutputUpdateCmd = parse(command, payload)?;
                let output = self
                    .document
                    .output_mut(RecordId::from_uuid(cmd.id))
                    .map_err(document_error)?;
                if let Some(name) = cmd.name {
                    // A new target resets the unit override
                    output.name = name;
                    output.display_unit = None;
                }
                if let Some(unit) = cmd.display_unit {
                    output.display_unit = Some(unit).filter(|u| !u.trim().is_empty());
                }
                Ok(Reply::Refresh)
            }
            "OUTPUT_DELETE" => {
                let id = parse_id(command, payload)?;
                self.document.remove_output(id).map_err(document_error)?;
                Ok(Reply::Refresh)
            }
            "SET_UNCERTAINTY_TYPES" => {
                let types: UncertaintyTypes = parse(command, payload)?;
                self.document.uncertainty_types = types;
                Ok(Reply::Refresh)
            }
            "SET_GRAVITY" => {
                let cmd: GravityCmd = parse(command, payload)?;
                let gravity = match (cmd.gravity, cmd.latitude) {
                    (Some(g), _) => g,
                    (None, Some(lat)) => Settings::gravity_at_latitude(lat),
                    (None, None) => {
                        return Err(CommandError::bad_payload(command, "gravity or latitude required"))
                    }
                };
                if !(gravity.is_finite() && gravity > 0.0) {
                    return Err(CommandError::bad_payload(command, "gravity must be positive"));
                }
                info!("Gravity set to {}", gravity);
                self.document.settings.gravity = gravity;
                self.propagator.set_constants(self.document.constants());
                Ok(Reply::Refresh)
            }
            "IMPORT" => {
                let mut document = Document::from_query(payload)
                    .map_err(|e| CommandError::new("IMPORT_FAILED", e.to_string()))?;
                document.settings = self.document.settings;
                document.uncertainty_types = self.document.uncertainty_types;
                info!(
                    "Imported {} measurements and {} outputs",
                    document.measurements.len(),
                    document.outputs.len()
                );
                self.document = document;
                Ok(Reply::Refresh)
            }
            "EXPORT" => Ok(Reply::Export(self.document.to_query())),
            other => Err(CommandError::new(
                "UNKNOWN_COMMAND",
                format!("Unknown command {}", other),
            )),
        }
    }

    /// Rejected updates leave the measurement untouched
    fn update_measurement(&mut self, cmd: UpdateCmd) -> Result<(), CommandError> {
        let id = RecordId::from_uuid(cmd.id);
        if self.document.measurement(id).is_none() {
            return Err(document_error(DocumentError::NotFound(id)));
        }
        if let Some(entries) = &cmd.uncertainty_b {
            if entries.len() > MAX_UNCERTAINTY_B {
                return Err(CommandError::bad_payload(
                    "MEASUREMENT_UPDATE",
                    format!(
                        "{} uncertainty entries, at most {} allowed",
                        entries.len(),
                        MAX_UNCERTAINTY_B
                    ),
                ));
            }
        }
        if let Some(name) = &cmd.name {
            self.document
                .rename_measurement(id, name)
                .map_err(document_error)?;
        }
        match self.document.measurement_mut(id).map_err(document_error)? {
            Measurement::Direct(m) => {
                if let Some(unit) = &cmd.unit {
                    m.set_unit(unit);
                }
                if let Some(entries) = cmd.uncertainty_b {
                    for (index, entry) in entries.iter().enumerate() {
                        m.set_uncertainty_b(index, &entry.value, entry.distribution)
                            .map_err(|e| CommandError::bad_payload("MEASUREMENT_UPDATE", e))?;
                    }
                }
            }
            Measurement::Composite(m) => {
                if let Some(formula) = &cmd.formula {
                    m.set_formula(formula);
                }
            }
        }
        Ok(())
    }

    fn document_frame(&self) -> String {
        let json = serde_json::to_string(&self.document).unwrap_or("{}".to_string());
        format!("DOCUMENT_UPDATE:{}", json)
    }

    fn outputs_frame(&mut self) -> String {
        let states = self.evaluate_outputs();
        let json = serde_json::to_string(&states).unwrap_or("[]".into());
        format!("OUTPUTS_UPDATE:{}", json)
    }

    pub fn evaluate_outputs(&mut self) -> Vec<OutputState> {
        self.document
            .outputs
            .iter()
            .map(|output| {
                match evaluate_output(output, &self.document, &mut self.propagator) {
                    Ok(report) => OutputState {
                        id: output.id,
                        name: output.name.clone(),
                        concise: report.as_ref().and_then(|r| r.concise_text(2)),
                        report,
                        error: None,
                    },
                    Err(e) => {
                        debug!("Output {} failed: {}", output.name, e);
                        OutputState {
                            id: output.id,
                            name: output.name.clone(),
                            report: None,
                            concise: None,
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
            .collect()
    }
}

fn parse<T: DeserializeOwned>(command: &str, payload: &str) -> Result<T, CommandError> {
    serde_json::from_str(payload).map_err(|e| CommandError::bad_payload(command, e))
}

fn parse_id(command: &str, payload: &str) -> Result<RecordId, CommandError> {
    Uuid::parse_str(payload.trim())
        .map(RecordId::from_uuid)
        .map_err(|e| CommandError::bad_payload(command, e))
}

fn document_error(e: DocumentError) -> CommandError {
    let code = match e {
        DocumentError::NotFound(_) => "NOT_FOUND",
        DocumentError::NameTaken(_) => "NAME_TAKEN",
    };
    CommandError::new(code, e.to_string())
}
