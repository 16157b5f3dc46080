use std::collections::HashMap;

use async_trait::async_trait;
use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};
use telemetry_client::domain::InverterReading;
use time::OffsetDateTime;

use super::display_opt;
use crate::pipeline::{PipelineError, Source};
use crate::sinks::TelemetryStore;
use crate::transform::{coerce_number, coerce_optional_int, coerce_required_int, coerce_text};

/// Text of each direct child of the document element, keyed by its exact
/// (case-sensitive) name, e.g. `Vac_l1`, `p-ac`, `maxPower`.
///
/// The first occurrence of a name wins. Only the text before a child's first
/// nested element counts, so element-only content reads as blank. A
/// self-closing child reads as absent.
#[derive(Debug, Default)]
struct InverterDocument {
    fields: HashMap<String, Option<String>>,
}

impl InverterDocument {
    fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_deref())
    }
}

/// A direct child of the document element being read.
struct OpenField {
    name: String,
    text: String,
    nested: bool,
}

fn malformed(reader: &Reader<&[u8]>, msg: impl std::fmt::Display) -> PipelineError {
    PipelineError::MalformedPayload(format!(
        "invalid inverter XML at byte {}: {msg}",
        reader.buffer_position()
    ))
}

fn check_attributes(reader: &Reader<&[u8]>, e: &BytesStart<'_>) -> Result<(), PipelineError> {
    for attr in e.attributes() {
        attr.map_err(|err| malformed(reader, err))?;
    }
    Ok(())
}

fn read_document(text: &str) -> Result<InverterDocument, PipelineError> {
    let mut reader = Reader::from_str(text);
    let mut doc = InverterDocument::default();
    let mut depth = 0usize;
    let mut root_closed = false;
    let mut open: Option<OpenField> = None;

    loop {
        let event = reader.read_event().map_err(|e| malformed(&reader, e))?;
        match event {
            Event::Start(e) => {
                if root_closed {
                    return Err(malformed(&reader, "content after the document element"));
                }
                check_attributes(&reader, &e)?;
                match depth {
                    0 => {}
                    1 => {
                        open = Some(OpenField {
                            name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                            text: String::new(),
                            nested: false,
                        })
                    }
                    _ => {
                        if let Some(field) = open.as_mut() {
                            field.nested = true;
                        }
                    }
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if root_closed {
                    return Err(malformed(&reader, "content after the document element"));
                }
                check_attributes(&reader, &e)?;
                match depth {
                    0 => root_closed = true,
                    1 => {
                        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                        doc.fields.entry(name).or_insert(None);
                    }
                    _ => {
                        if let Some(field) = open.as_mut() {
                            field.nested = true;
                        }
                    }
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    return Err(malformed(&reader, "unexpected closing tag"));
                }
                depth -= 1;
                match depth {
                    0 => root_closed = true,
                    1 => {
                        if let Some(field) = open.take() {
                            doc.fields.entry(field.name).or_insert(Some(field.text));
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(t) => {
                let content = t.unescape().map_err(|e| malformed(&reader, e))?;
                if depth == 0 && !content.trim().is_empty() {
                    return Err(malformed(&reader, "text outside the document element"));
                }
                if depth == 2 {
                    if let Some(field) = open.as_mut().filter(|f| !f.nested) {
                        field.text.push_str(&content);
                    }
                }
            }
            Event::CData(c) => {
                if depth == 0 {
                    return Err(malformed(&reader, "CDATA outside the document element"));
                }
                if depth == 2 {
                    if let Some(field) = open.as_mut().filter(|f| !f.nested) {
                        let content = std::str::from_utf8(&c).map_err(|e| malformed(&reader, e))?;
                        field.text.push_str(content);
                    }
                }
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
        }
    }

    if !root_closed {
        return Err(malformed(&reader, "document element is missing or not closed"));
    }
    Ok(doc)
}

/// Parse the inverter status document into a reading stamped with the current
/// time (the document itself carries no timestamp).
pub fn parse_inverter(payload: &[u8]) -> Result<InverterReading, PipelineError> {
    let text = std::str::from_utf8(payload)
        .map_err(|e| PipelineError::MalformedPayload(format!("inverter XML is not UTF-8: {e}")))?;
    let doc = read_document(text)?;

    let num = |name: &str| coerce_number(doc.get(name));

    Ok(InverterReading {
        ts: OffsetDateTime::now_utc(),
        state: coerce_text(doc.get("state")),
        vac_l1: num("Vac_l1"),
        vac_l2: num("Vac_l2"),
        vac_l3: num("Vac_l3"),
        iac_l1: num("Iac_l1"),
        iac_l2: num("Iac_l2"),
        iac_l3: num("Iac_l3"),
        freq1: num("Freq1"),
        freq2: num("Freq2"),
        freq3: num("Freq3"),
        pac1: coerce_optional_int(doc.get("pac1")),
        pac2: coerce_optional_int(doc.get("pac2")),
        pac3: coerce_optional_int(doc.get("pac3")),
        p_ac: coerce_required_int(doc.get("p-ac"), 0),
        temp: num("temp"),
        e_today: num("e-today"),
        t_today: num("t-today"),
        e_total: num("e-total"),
        co2: num("CO2"),
        t_total: num("t-total"),
        v_pv1: num("v-pv1"),
        v_pv2: num("v-pv2"),
        v_pv3: num("v-pv3"),
        v_bus: num("v-bus"),
        max_power: coerce_required_int(doc.get("maxPower"), 0),
        i_pv11: num("i-pv11"),
        i_pv12: num("i-pv12"),
        i_pv13: num("i-pv13"),
        i_pv14: num("i-pv14"),
        i_pv21: num("i-pv21"),
        i_pv22: num("i-pv22"),
        i_pv23: num("i-pv23"),
        i_pv24: num("i-pv24"),
        i_pv31: num("i-pv31"),
        i_pv32: num("i-pv32"),
        i_pv33: num("i-pv33"),
        i_pv34: num("i-pv34"),
    })
}

pub struct InverterSource {
    endpoint: String,
}

impl InverterSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Source for InverterSource {
    type Reading = InverterReading;

    fn label(&self) -> &'static str {
        "Solar"
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn parse(&self, payload: &[u8]) -> Result<InverterReading, PipelineError> {
        parse_inverter(payload)
    }

    async fn store(
        &self,
        store: &dyn TelemetryStore,
        reading: &InverterReading,
    ) -> Result<(), PipelineError> {
        let id = store.store_inverter_reading(reading).await?;
        tracing::debug!(row_id = id, "inverter reading stored");
        Ok(())
    }

    fn summarize(&self, r: &InverterReading) -> String {
        format!(
            "Power={}W, Temp={}°C, Today={}kWh",
            r.p_ac,
            display_opt(r.temp),
            display_opt(r.e_today)
        )
    }
}
