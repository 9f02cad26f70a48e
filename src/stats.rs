//! Process records reported by supervisord and decoding of the status envelope.
//!
//! The status body is a flat XML document: a root element holding zero or more
//! entry elements, each with `name`, `start`, `stop`, `now`, `state`,
//! `statename` and `pid` children. Everything except `pid` stays textual here;
//! integer conversion of the epochs happens in the scraper so that a bad field
//! only affects the record it belongs to.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::ClientError;

/// Status of a single supervised process as reported upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessRecord {
    pub name: String,
    pub start: String,
    pub stop: String,
    pub now: String,
    pub state: String,
    pub state_name: String,
    pub pid: i64,
}

/// Child element currently being read inside an entry.
#[derive(Clone, Copy)]
enum Field {
    Name,
    Start,
    Stop,
    Now,
    State,
    StateName,
    Pid,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"name" => Some(Field::Name),
            b"start" => Some(Field::Start),
            b"stop" => Some(Field::Stop),
            b"now" => Some(Field::Now),
            b"state" => Some(Field::State),
            b"statename" => Some(Field::StateName),
            b"pid" => Some(Field::Pid),
            _ => None,
        }
    }
}

/// Partially decoded entry; `pid` stays raw until the entry closes.
#[derive(Default)]
struct EntryBuilder {
    record: ProcessRecord,
    pid: Option<String>,
}

impl EntryBuilder {
    fn set(&mut self, field: Field, text: String) {
        match field {
            Field::Name => self.record.name = text,
            Field::Start => self.record.start = text,
            Field::Stop => self.record.stop = text,
            Field::Now => self.record.now = text,
            Field::State => self.record.state = text,
            Field::StateName => self.record.state_name = text,
            Field::Pid => self.pid = Some(text),
        }
    }

    fn finish(self) -> Result<ProcessRecord, ClientError> {
        let raw = self.pid.unwrap_or_default();
        let pid = raw.trim().parse::<i64>().map_err(|e| {
            ClientError::Decode(format!(
                "entry '{}' has invalid pid '{}': {}",
                self.record.name, raw, e
            ))
        })?;
        Ok(ProcessRecord { pid, ..self.record })
    }
}

/// Decodes a status response body into process records.
///
/// Any XML error, an unterminated document, or an entry with a missing or
/// non-integer `pid` rejects the whole body; no partial record set is returned.
pub fn parse_status_response(body: &[u8]) -> Result<Vec<ProcessRecord>, ClientError> {
    let mut reader = Reader::from_reader(body);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut records = Vec::new();
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut entry: Option<EntryBuilder> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                match depth {
                    1 => seen_root = true,
                    2 => entry = Some(EntryBuilder::default()),
                    3 => field = Field::from_tag(e.local_name().as_ref()),
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => match depth {
                0 => seen_root = true,
                1 => records.push(EntryBuilder::default().finish()?),
                2 => {
                    if let (Some(entry), Some(f)) =
                        (entry.as_mut(), Field::from_tag(e.local_name().as_ref()))
                    {
                        entry.set(f, String::new());
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if depth == 3 {
                    if let (Some(entry), Some(f)) = (entry.as_mut(), field) {
                        let text = e
                            .unescape()
                            .map_err(|e| ClientError::Decode(e.to_string()))?;
                        entry.set(f, text.into_owned());
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if depth == 3 {
                    if let (Some(entry), Some(f)) = (entry.as_mut(), field) {
                        entry.set(f, String::from_utf8_lossy(&e.into_inner()).into_owned());
                    }
                }
            }
            Ok(Event::End(_)) => {
                match depth {
                    2 => {
                        if let Some(done) = entry.take() {
                            records.push(done.finish()?);
                        }
                    }
                    3 => field = None,
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ClientError::Decode(format!(
                    "XML parse error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(ClientError::Decode("response contains no root element".into()));
    }
    if depth != 0 {
        return Err(ClientError::Decode("response ended inside an element".into()));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"<?xml version="1.0"?>
<response>
  <process>
    <name>web</name>
    <start>100</start>
    <stop>160</stop>
    <now>170</now>
    <state>20</state>
    <statename>RUNNING</statename>
    <pid>4242</pid>
  </process>
  <process>
    <name>worker</name>
    <start>200</start>
    <stop>200</stop>
    <now>210</now>
    <state>0</state>
    <statename>STOPPED</statename>
    <pid>0</pid>
  </process>
</response>"#;

    #[test]
    fn test_parse_two_entries() {
        let records = parse_status_response(BODY.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "web");
        assert_eq!(records[0].start, "100");
        assert_eq!(records[0].stop, "160");
        assert_eq!(records[0].state_name, "RUNNING");
        assert_eq!(records[0].pid, 4242);
        assert_eq!(records[1].name, "worker");
        assert_eq!(records[1].pid, 0);
    }

    #[test]
    fn test_parse_empty_root() {
        assert!(parse_status_response(b"<response/>").unwrap().is_empty());
        assert!(parse_status_response(b"<response></response>")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_unknown_children_ignored() {
        let body = b"<r><p><name>a</name><group>g</group><pid>7</pid></p></r>";
        let records = parse_status_response(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "a");
        assert_eq!(records[0].pid, 7);
        assert!(records[0].start.is_empty());
    }

    #[test]
    fn test_textual_epochs_kept_raw() {
        let body = b"<r><p><name>a</name><start>50</start><stop>x</stop><pid>1</pid></p></r>";
        let records = parse_status_response(body).unwrap();
        assert_eq!(records[0].stop, "x");
    }

    #[test]
    fn test_invalid_pid_rejects_body() {
        let body = b"<r><p><name>a</name><pid>abc</pid></p></r>";
        assert!(matches!(
            parse_status_response(body),
            Err(ClientError::Decode(_))
        ));
    }

    #[test]
    fn test_malformed_xml_rejected() {
        assert!(parse_status_response(b"<r><p><name>a</name></r>").is_err());
        assert!(parse_status_response(b"<r><p>").is_err());
        assert!(parse_status_response(b"not xml at all").is_err());
        assert!(parse_status_response(b"").is_err());
    }
}
