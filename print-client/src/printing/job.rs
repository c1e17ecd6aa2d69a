//! Print job model and inbound schema

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use super::error::{JobError, JobResult};

/// Ticket layout variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TicketKind {
    #[default]
    Standard,
    Delivery,
}

impl TicketKind {
    /// Anything other than `"delivery"` prints a standard ticket
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("delivery") {
            Self::Delivery
        } else {
            Self::Standard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Delivery => "delivery",
        }
    }
}

/// Material used during a repair
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
}

/// Extra print data attached to a job
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobExtra {
    pub kind: TicketKind,
    pub materials: Vec<Material>,
    pub total_price: Option<Decimal>,
}

/// One print job, immutable once received
#[derive(Debug, Clone, PartialEq)]
pub struct PrintJob {
    pub id: i64,
    pub tracking_number: String,
    pub customer_type: String,
    pub department_name: String,
    pub item_description: Option<String>,
    pub issue_description: Option<String>,
    pub extra: Option<JobExtra>,
}

impl PrintJob {
    /// Delivery extras, if this is a delivery receipt
    pub fn delivery(&self) -> Option<&JobExtra> {
        self.extra
            .as_ref()
            .filter(|e| e.kind == TicketKind::Delivery)
    }

    pub fn kind(&self) -> TicketKind {
        self.extra.as_ref().map(|e| e.kind).unwrap_or_default()
    }

    /// Required fields must be present and non-blank
    pub fn validate(&self) -> JobResult<()> {
        require(&self.tracking_number, "volgnummer")?;
        require(&self.customer_type, "klantType")?;
        require(&self.department_name, "afdelingNaam")?;
        Ok(())
    }

    /// Log the received job
    pub fn log_summary(&self) {
        let extra = self.extra.as_ref();
        info!(
            job_id = self.id,
            volgnummer = %self.tracking_number,
            klant_type = %self.customer_type,
            afdeling = %self.department_name,
            voorwerp = self.item_description.as_deref().unwrap_or("N/A"),
            probleem = self.issue_description.as_deref().unwrap_or("N/A"),
            ticket_type = self.kind().as_str(),
            materials = extra.map(|e| e.materials.len()).unwrap_or(0),
            total = ?extra.and_then(|e| e.total_price),
            "Print job received"
        );
    }
}

fn require(value: &str, field: &str) -> JobResult<()> {
    if value.trim().is_empty() {
        return Err(JobError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ── Inbound wire schema ─────────────────────────────────────────────

/// `print-job` payload as sent by the job source
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintJobPayload {
    pub print_job_id: i64,
    pub volgnummer: Option<String>,
    pub klant_type: Option<String>,
    pub afdeling_naam: Option<String>,
    pub voorwerp_beschrijving: Option<String>,
    pub klacht_beschrijving: Option<String>,
    pub print_data: Option<PrintDataPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintDataPayload {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub materials: Option<Vec<MaterialPayload>>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_price: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaterialPayload {
    #[serde(default = "unknown_material")]
    pub naam: String,
    #[serde(default)]
    pub aantal: i64,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub prijs: Decimal,
}

fn unknown_material() -> String {
    "Unknown".to_string()
}

impl From<PrintDataPayload> for JobExtra {
    fn from(p: PrintDataPayload) -> Self {
        Self {
            kind: p.kind.as_deref().map(TicketKind::parse).unwrap_or_default(),
            materials: p
                .materials
                .unwrap_or_default()
                .into_iter()
                .map(|m| Material {
                    name: m.naam,
                    quantity: m.aantal,
                    unit_price: m.prijs,
                })
                .collect(),
            total_price: p.total_price,
        }
    }
}

impl TryFrom<PrintJobPayload> for PrintJob {
    type Error = JobError;

    fn try_from(p: PrintJobPayload) -> JobResult<Self> {
        let job = Self {
            id: p.print_job_id,
            tracking_number: p.volgnummer.unwrap_or_default(),
            customer_type: p.klant_type.unwrap_or_default(),
            department_name: p.afdeling_naam.unwrap_or_default(),
            item_description: non_blank(p.voorwerp_beschrijving),
            issue_description: non_blank(p.klacht_beschrijving),
            extra: p.print_data.map(JobExtra::from),
        };
        job.validate()?;
        Ok(job)
    }
}

impl PrintJob {
    /// Parse and validate a raw `print-job` payload
    pub fn from_value(value: serde_json::Value) -> JobResult<Self> {
        let payload: PrintJobPayload =
            serde_json::from_value(value).map_err(|e| JobError::Malformed(e.to_string()))?;
        Self::try_from(payload)
    }
}
