//! Ticket renderer
//!
//! Turns a `PrintJob` into the full ESC/POS byte stream. Rendering is pure:
//! it never touches the transport and the same job always yields the same
//! bytes.

use rc_printer::layout::{center_block, fixed_column, pad, wrap};
use rc_printer::{EscPosBuilder, QrRasterizer, Raster};
use rust_decimal::{Decimal, RoundingStrategy};

use super::error::JobResult;
use super::job::{JobExtra, Material, PrintJob};

/// Width of the label column on detail lines
const LABEL_COLUMN: usize = 13;
/// Width of the rules around the materials section
const SECTION_RULE: usize = 32;
const NAME_COLUMN: usize = 25;
const QTY_COLUMN: usize = 2;
/// Width before the currency marker on price lines
const PRICE_LABEL_COLUMN: usize = 20;
const PRICE_COLUMN: usize = 6;
const CURRENCY: &str = "EUR";
const CUT_FEED_LINES: u8 = 3;

/// Renderer settings
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Paper width in characters (full-width rules)
    pub width: usize,
    /// Wrap width for description text
    pub wrap_width: usize,
    pub title: String,
    pub qr: QrRasterizer,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 42,
            wrap_width: 42,
            title: "REPAIR CAFE".to_string(),
            qr: QrRasterizer::default(),
        }
    }
}

/// Ticket renderer
#[derive(Debug, Clone, Default)]
pub struct TicketRenderer {
    config: RenderConfig,
}

impl TicketRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render `job` into printer bytes
    ///
    /// Fails with `Validation` when a required field is blank and with
    /// `Render` when the tracking number cannot be encoded as a QR symbol.
    pub fn render(&self, job: &PrintJob) -> JobResult<Vec<u8>> {
        job.validate()?;

        let delivery = job.delivery();
        let qr = match delivery {
            Some(_) => None,
            None => Some(self.config.qr.rasterize(&job.tracking_number)?),
        };

        let mut b = EscPosBuilder::new(self.config.width);

        self.render_header(&mut b, delivery.is_some());
        b.sep_double().newline();

        self.render_details(&mut b, job);
        b.sep_double().newline();
        self.render_descriptions(&mut b, job);

        if let Some(extra) = delivery {
            self.render_materials(&mut b, extra);
        }

        self.render_footer(&mut b, qr.as_ref());
        b.cut_feed(CUT_FEED_LINES);

        Ok(b.build())
    }

    fn render_header(&self, b: &mut EscPosBuilder, delivery: bool) {
        let subtitle = if delivery { "DELIVERY RECEIPT" } else { "TICKET" };
        b.center()
            .bold()
            .double_size()
            .line(&self.config.title)
            .reset_size()
            .line(subtitle)
            .bold_off()
            .newline();
    }

    fn render_details(&self, b: &mut EscPosBuilder, job: &PrintJob) {
        let fields = [
            ("Volgnummer:", job.tracking_number.as_str()),
            ("Klanttype:", job.customer_type.as_str()),
            ("Afdeling:", job.department_name.as_str()),
        ];
        let visible: Vec<String> = fields
            .iter()
            .map(|(label, value)| format!("{}{}", pad(label, LABEL_COLUMN, false), value))
            .collect();

        b.center();
        for ((label, _), line) in fields.iter().zip(center_block(&visible)) {
            // Labels are ASCII, so the byte split lands on the label boundary
            b.labeled(label, &line[label.len()..]).newline();
        }
        b.newline();
    }

    fn render_descriptions(&self, b: &mut EscPosBuilder, job: &PrintJob) {
        let sections = [
            ("Voorwerp:", job.item_description.as_deref()),
            ("Probleem:", job.issue_description.as_deref()),
        ];

        let mut left = false;
        for (label, text) in sections {
            let Some(text) = text else { continue };
            if !left {
                b.left();
                left = true;
            }
            b.bold().line(label).bold_off();
            for line in wrap(text, self.config.wrap_width) {
                b.line(&line);
            }
            b.newline();
        }
        if left {
            b.center();
        }
    }

    fn render_materials(&self, b: &mut EscPosBuilder, extra: &JobExtra) {
        b.rule('=', SECTION_RULE)
            .bold()
            .line("GEBRUIKTE MATERIALEN")
            .bold_off()
            .rule('=', SECTION_RULE);

        if extra.materials.is_empty() {
            b.line("Geen materialen gebruikt");
        } else {
            for material in &extra.materials {
                b.line(&material_line(material));
                b.line(&price_line("", material.unit_price));
            }
        }

        let total = extra.total_price.unwrap_or(Decimal::ZERO);
        b.newline()
            .rule('-', SECTION_RULE)
            .bold()
            .line(&price_line("TOTAAL:", total))
            .bold_off()
            .newline();
    }

    fn render_footer(&self, b: &mut EscPosBuilder, qr: Option<&Raster>) {
        b.sep_double().newline().center();
        match qr {
            Some(raster) => {
                b.raster(raster).newline();
            }
            None => {
                b.line("Bedankt!").newline();
            }
        }
    }
}

/// Format a price with exactly two decimals, midpoint away from zero
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

fn material_line(material: &Material) -> String {
    format!(
        "{} {}x",
        fixed_column(&material.name, NAME_COLUMN),
        pad(&material.quantity.to_string(), QTY_COLUMN, true)
    )
}

fn price_line(label: &str, amount: Decimal) -> String {
    format!(
        "{}{} {}",
        pad(label, PRICE_LABEL_COLUMN, false),
        CURRENCY,
        pad(&format_money(amount), PRICE_COLUMN, true)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printing::error::JobError;
    use crate::printing::job::TicketKind;

    const CUT: [u8; 4] = [0x1D, 0x56, 0x41, 0x03];
    const RASTER_HEADER: [u8; 4] = [0x1D, 0x76, 0x30, 0x00];

    fn standard_job() -> PrintJob {
        PrintJob {
            id: 1,
            tracking_number: "A-102".to_string(),
            customer_type: "Student".to_string(),
            department_name: "Electronics".to_string(),
            item_description: None,
            issue_description: None,
            extra: None,
        }
    }

    fn delivery_job(materials: Vec<Material>, total: Option<Decimal>) -> PrintJob {
        PrintJob {
            extra: Some(JobExtra {
                kind: TicketKind::Delivery,
                materials,
                total_price: total,
            }),
            ..standard_job()
        }
    }

    fn screw() -> Material {
        Material {
            name: "Screw".to_string(),
            quantity: 4,
            unit_price: Decimal::new(10, 2),
        }
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    #[test]
    fn test_standard_ticket() {
        let out = TicketRenderer::default().render(&standard_job()).unwrap();

        assert!(out.starts_with(&[0x1B, 0x40, 0x1B, 0x74, 0x10]));
        assert!(contains(&out, b"REPAIR CAFE\n"));
        assert!(contains(&out, b"TICKET\n"));
        assert!(!contains(&out, b"DELIVERY RECEIPT"));
        assert!(!contains(&out, b"Bedankt!"));

        // Block-centered details: widest visible line is 24 characters
        let volgnummer = b"\x1B\x45\x01Volgnummer:\x1B\x45\x00  A-102      \n";
        let klanttype = b"\x1B\x45\x01Klanttype:\x1B\x45\x00   Student    \n";
        let afdeling = b"\x1B\x45\x01Afdeling:\x1B\x45\x00    Electronics\n";
        assert!(contains(&out, volgnummer));
        assert!(contains(&out, klanttype));
        assert!(contains(&out, afdeling));

        // QR raster block followed by newline and the cut
        let raster_at = find(&out, &RASTER_HEADER).unwrap();
        let raster = QrRasterizer::default().rasterize("A-102").unwrap();
        let header = &out[raster_at + 4..raster_at + 8];
        assert_eq!(header, &[19, 0, 150, 0]);
        let data_end = raster_at + 8 + raster.data().len();
        assert_eq!(&out[raster_at + 8..data_end], raster.data());
        assert_eq!(&out[data_end..], &[b'\n', 0x1D, 0x56, 0x41, 0x03]);
    }

    #[test]
    fn test_delivery_ticket() {
        let job = delivery_job(vec![screw()], Some(Decimal::new(40, 2)));
        let out = TicketRenderer::default().render(&job).unwrap();

        assert!(contains(&out, b"DELIVERY RECEIPT\n"));
        assert!(contains(&out, b"GEBRUIKTE MATERIALEN"));
        assert!(contains(&out, b"Screw                      4x\n"));
        assert!(contains(&out, b"                    EUR   0.10\n"));
        assert!(contains(&out, b"TOTAAL:             EUR   0.40\n"));
        assert!(contains(&out, b"Bedankt!\n"));
        assert!(!contains(&out, &RASTER_HEADER));
        assert!(out.ends_with(&CUT));
    }

    #[test]
    fn test_delivery_without_materials() {
        let job = delivery_job(Vec::new(), None);
        let out = TicketRenderer::default().render(&job).unwrap();

        assert!(contains(&out, b"Geen materialen gebruikt\n"));
        assert!(contains(&out, b"TOTAAL:             EUR   0.00\n"));
    }

    #[test]
    fn test_standard_extra_keeps_qr() {
        let mut job = delivery_job(vec![screw()], None);
        if let Some(extra) = job.extra.as_mut() {
            extra.kind = TicketKind::Standard;
        }
        let out = TicketRenderer::default().render(&job).unwrap();
        assert!(contains(&out, b"TICKET\n"));
        assert!(!contains(&out, b"GEBRUIKTE MATERIALEN"));
        assert!(contains(&out, &RASTER_HEADER));
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = TicketRenderer::default();
        let mut job = delivery_job(vec![screw()], Some(Decimal::new(40, 2)));
        job.issue_description = Some("Lampje knippert af en toe".to_string());
        assert_eq!(renderer.render(&job).unwrap(), renderer.render(&job).unwrap());

        let job = standard_job();
        assert_eq!(renderer.render(&job).unwrap(), renderer.render(&job).unwrap());
    }

    #[test]
    fn test_descriptions_wrapped_left_aligned() {
        let mut job = standard_job();
        job.item_description = Some("Koffiezetapparaat".to_string());
        job.issue_description = Some(
            "Het apparaat slaat na een paar minuten af en de pomp maakt een raar geluid"
                .to_string(),
        );
        let out = TicketRenderer::default().render(&job).unwrap();

        let left_at = find(&out, &[0x1B, 0x61, 0x00]).unwrap();
        let voorwerp_at = find(&out, b"Voorwerp:").unwrap();
        let probleem_at = find(&out, b"Probleem:").unwrap();
        assert!(left_at < voorwerp_at && voorwerp_at < probleem_at);
        assert!(contains(&out, b"Het apparaat slaat na een paar minuten af\n"));
        assert!(contains(&out, b"en de pomp maakt een raar geluid\n"));

        // Back to center before the footer rule
        let recenter = find(&out[probleem_at..], &[0x1B, 0x61, 0x01]).unwrap();
        let footer = find(&out[probleem_at..], &[b'='; 42]).unwrap();
        assert!(recenter < footer);
    }

    #[test]
    fn test_missing_descriptions_are_omitted() {
        let out = TicketRenderer::default().render(&standard_job()).unwrap();
        assert!(!contains(&out, b"Voorwerp:"));
        assert!(!contains(&out, b"Probleem:"));
        assert!(!contains(&out, &[0x1B, 0x61, 0x00]));
    }

    /// Offsets just past each full-width `=` rule, before any raster data
    fn full_rule_ends(out: &[u8]) -> Vec<usize> {
        let text = match find(out, &RASTER_HEADER) {
            Some(at) => &out[..at],
            None => out,
        };
        let rule = [b'='; 42];
        (0..text.len().saturating_sub(rule.len() - 1))
            .filter(|&i| text[i..].starts_with(&rule) && (i == 0 || text[i - 1] != b'='))
            .map(|i| i + rule.len())
            .collect()
    }

    #[test]
    fn test_every_rule_followed_by_blank_line() {
        let mut standard = standard_job();
        standard.item_description = Some("Koffiezetapparaat".to_string());
        standard.issue_description = Some("Pomp maakt een raar geluid".to_string());
        let delivery = delivery_job(vec![screw()], Some(Decimal::new(40, 2)));

        for job in [standard_job(), standard, delivery] {
            let out = TicketRenderer::default().render(&job).unwrap();
            let ends = full_rule_ends(&out);
            assert_eq!(ends.len(), 3);
            for end in ends {
                assert_eq!(&out[end..end + 2], b"\n\n");
            }
        }
    }

    #[test]
    fn test_long_material_name_truncated() {
        let material = Material {
            name: "Schroevendraaier set groot".to_string(),
            quantity: 12,
            unit_price: Decimal::new(1250, 2),
        };
        let out = TicketRenderer::default()
            .render(&delivery_job(vec![material], Some(Decimal::new(150, 0))))
            .unwrap();
        assert!(contains(&out, b"Schroevendraaier set groo 12x\n"));
        assert!(contains(&out, b"EUR  12.50\n"));
        assert!(contains(&out, b"EUR 150.00\n"));
    }

    #[test]
    fn test_cp1252_text() {
        let mut job = standard_job();
        job.department_name = "Caf\u{e9}".to_string();
        let out = TicketRenderer::default().render(&job).unwrap();
        assert!(contains(&out, b"Caf\xE9"));
    }

    #[test]
    fn test_validation_error() {
        let mut job = standard_job();
        job.customer_type = " ".to_string();
        let err = TicketRenderer::default().render(&job).unwrap_err();
        assert!(matches!(err, JobError::Validation(_)));
    }

    #[test]
    fn test_unencodable_tracking_number() {
        let mut job = standard_job();
        job.tracking_number = "x".repeat(4000);
        let err = TicketRenderer::default().render(&job).unwrap_err();
        assert!(matches!(err, JobError::Render(_)));
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::from(3)), "3.00");
        assert_eq!(format_money(Decimal::new(25, 1)), "2.50");
        assert_eq!(format_money(Decimal::new(1005, 3)), "1.01");
        assert_eq!(format_money(Decimal::new(-1005, 3)), "-1.01");
        assert_eq!(format_money(Decimal::new(12344, 4)), "1.23");
    }
}
