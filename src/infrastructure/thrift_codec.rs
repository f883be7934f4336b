// Thrift binary encoding of persisted windows
//
// struct Sample { 1: required string timestamp, 2: required string display_time, 3: required double value }
// struct Window { 1: required list<Sample> samples }
//
// Thrift has no single-precision type; values are widened to double on write
// and narrowed on read, which round-trips every f32 exactly.
use crate::domain::sample::{Sample, Window};
use crate::infrastructure::bounded_protocol::BoundedInputProtocol;
use thrift::protocol::{
    TBinaryOutputProtocol, TFieldIdentifier, TInputProtocol, TListIdentifier, TOutputProtocol,
    TSerializable, TStructIdentifier, TType,
};
use thrift::{ProtocolError, ProtocolErrorKind};

/// Cap on up-front allocation when a list header claims more elements than
/// the payload could plausibly hold.
const MAX_PREALLOCATED_SAMPLES: usize = 4096;

impl TSerializable for Sample {
    fn read_from_in_protocol(i_prot: &mut dyn TInputProtocol) -> thrift::Result<Self> {
        i_prot.read_struct_begin()?;
        let mut timestamp: Option<String> = None;
        let mut display_time: Option<String> = None;
        let mut value: Option<f64> = None;

        loop {
            let field_ident = i_prot.read_field_begin()?;
            if field_ident.field_type == TType::Stop {
                break;
            }
            match (field_ident.id, field_ident.field_type) {
                (Some(1), TType::String) => timestamp = Some(i_prot.read_string()?),
                (Some(2), TType::String) => display_time = Some(i_prot.read_string()?),
                (Some(3), TType::Double) => value = Some(i_prot.read_double()?),
                (_, field_type) => i_prot.skip(field_type)?,
            }
            i_prot.read_field_end()?;
        }
        i_prot.read_struct_end()?;

        Ok(Sample {
            timestamp: required("Sample.timestamp", timestamp)?,
            display_time: required("Sample.display_time", display_time)?,
            value: required("Sample.value", value)? as f32,
        })
    }

    fn write_to_out_protocol(&self, o_prot: &mut dyn TOutputProtocol) -> thrift::Result<()> {
        o_prot.write_struct_begin(&TStructIdentifier::new("Sample"))?;

        o_prot.write_field_begin(&TFieldIdentifier::new("timestamp", TType::String, 1))?;
        o_prot.write_string(&self.timestamp)?;
        o_prot.write_field_end()?;

        o_prot.write_field_begin(&TFieldIdentifier::new("display_time", TType::String, 2))?;
        o_prot.write_string(&self.display_time)?;
        o_prot.write_field_end()?;

        o_prot.write_field_begin(&TFieldIdentifier::new("value", TType::Double, 3))?;
        o_prot.write_double(f64::from(self.value))?;
        o_prot.write_field_end()?;

        o_prot.write_field_stop()?;
        o_prot.write_struct_end()
    }
}

impl TSerializable for Window {
    fn read_from_in_protocol(i_prot: &mut dyn TInputProtocol) -> thrift::Result<Self> {
        i_prot.read_struct_begin()?;
        let mut samples: Option<Vec<Sample>> = None;

        loop {
            let field_ident = i_prot.read_field_begin()?;
            if field_ident.field_type == TType::Stop {
                break;
            }
            match (field_ident.id, field_ident.field_type) {
                (Some(1), TType::List) => samples = Some(read_sample_list(i_prot)?),
                (_, field_type) => i_prot.skip(field_type)?,
            }
            i_prot.read_field_end()?;
        }
        i_prot.read_struct_end()?;

        Ok(Window::new(required("Window.samples", samples)?))
    }

    fn write_to_out_protocol(&self, o_prot: &mut dyn TOutputProtocol) -> thrift::Result<()> {
        o_prot.write_struct_begin(&TStructIdentifier::new("Window"))?;

        o_prot.write_field_begin(&TFieldIdentifier::new("samples", TType::List, 1))?;
        o_prot.write_list_begin(&TListIdentifier::new(
            TType::Struct,
            list_len(self.samples().len())?,
        ))?;
        for sample in self.samples() {
            sample.write_to_out_protocol(o_prot)?;
        }
        o_prot.write_list_end()?;
        o_prot.write_field_end()?;

        o_prot.write_field_stop()?;
        o_prot.write_struct_end()
    }
}

fn read_sample_list(i_prot: &mut dyn TInputProtocol) -> thrift::Result<Vec<Sample>> {
    let list_ident = i_prot.read_list_begin()?;
    if list_ident.element_type != TType::Struct {
        return Err(invalid_data(format!(
            "expected list of structs, found list of {:?}",
            list_ident.element_type
        )));
    }
    let size = usize::try_from(list_ident.size)
        .map_err(|_| invalid_data(format!("negative list size {}", list_ident.size)))?;

    let mut samples = Vec::with_capacity(size.min(MAX_PREALLOCATED_SAMPLES));
    for _ in 0..size {
        samples.push(Sample::read_from_in_protocol(i_prot)?);
    }
    i_prot.read_list_end()?;
    Ok(samples)
}

/// Serialize a window to strict Thrift binary.
pub fn encode_window(window: &Window) -> thrift::Result<Vec<u8>> {
    let mut buffer: Vec<u8> = Vec::new();
    {
        let mut protocol = TBinaryOutputProtocol::new(&mut buffer, true);
        window.write_to_out_protocol(&mut protocol)?;
        protocol.flush()?;
    }
    Ok(buffer)
}

/// Deserialize a window written by [`encode_window`]. The payload must be
/// consumed exactly; trailing bytes are treated as corruption. Length
/// prefixes are checked against the payload, so corrupt input is an error
/// and never an oversized allocation.
pub fn decode_window(bytes: &[u8]) -> thrift::Result<Window> {
    let mut protocol = BoundedInputProtocol::new(bytes);
    let window = Window::read_from_in_protocol(&mut protocol)?;

    if protocol.remaining() != 0 {
        return Err(invalid_data(format!(
            "{} trailing bytes after window",
            protocol.remaining()
        )));
    }
    Ok(window)
}

fn required<T>(field_name: &str, field: Option<T>) -> thrift::Result<T> {
    field.ok_or_else(|| {
        thrift::Error::Protocol(ProtocolError::new(
            ProtocolErrorKind::InvalidData,
            format!("missing required field {}", field_name),
        ))
    })
}

fn list_len(len: usize) -> thrift::Result<i32> {
    i32::try_from(len).map_err(|_| {
        thrift::Error::Protocol(ProtocolError::new(
            ProtocolErrorKind::SizeLimit,
            format!("window of {} samples exceeds thrift list size", len),
        ))
    })
}

fn invalid_data(message: String) -> thrift::Error {
    thrift::Error::Protocol(ProtocolError::new(ProtocolErrorKind::InvalidData, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_window() -> Window {
        Window::new(vec![
            Sample::new("1700000000", "10:00 PM", 42.0),
            Sample::new("1700000480", "10:08 PM", 0.1),
            Sample::new("1700000960", "10:16 PM", 3.333_333_3),
        ])
    }

    #[test]
    fn test_round_trip() {
        let window = sample_window();
        let bytes = encode_window(&window).unwrap();
        assert_eq!(decode_window(&bytes).unwrap(), window);
    }

    #[test]
    fn test_empty_window_round_trip() {
        let bytes = encode_window(&Window::default()).unwrap();
        assert!(!bytes.is_empty());
        assert!(decode_window(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_payload_is_rejected() {
        let bytes = encode_window(&sample_window()).unwrap();
        assert!(decode_window(&bytes[..bytes.len() - 3]).is_err());
        assert!(decode_window(&[]).is_err());
    }

    #[test]
    fn test_trailing_bytes_are_rejected() {
        let mut bytes = encode_window(&sample_window()).unwrap();
        bytes.extend_from_slice(&[0, 0, 0]);
        assert!(decode_window(&bytes).is_err());
    }

    #[test]
    fn test_corrupt_string_length_is_an_error() {
        // samples: list<struct> of 1, timestamp string length -1
        let negative = [0x0f, 0, 1, 0x0c, 0, 0, 0, 1, 0x0b, 0, 1, 0xff, 0xff, 0xff, 0xff];
        assert!(decode_window(&negative).is_err());

        // same header, length 0x7fffffff with two bytes of payload
        let oversized = [0x0f, 0, 1, 0x0c, 0, 0, 0, 1, 0x0b, 0, 1, 0x7f, 0xff, 0xff, 0xff, b'a', b'b'];
        assert!(decode_window(&oversized).is_err());
    }

    #[test]
    fn test_corrupt_unknown_field_is_an_error() {
        // unknown string field 9 with a negative length, skipped via the protocol
        let bytes = [0x0b, 0, 9, 0xff, 0xff, 0xff, 0xfe];
        assert!(decode_window(&bytes).is_err());
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let mut buffer: Vec<u8> = Vec::new();
        {
            let mut protocol = TBinaryOutputProtocol::new(&mut buffer, true);
            protocol.write_struct_begin(&TStructIdentifier::new("Window")).unwrap();
            protocol.write_field_stop().unwrap();
            protocol.write_struct_end().unwrap();
            protocol.flush().unwrap();
        }
        assert!(decode_window(&buffer).is_err());
    }

    #[test]
    fn test_unknown_fields_are_skipped() {
        let mut buffer: Vec<u8> = Vec::new();
        {
            let mut protocol = TBinaryOutputProtocol::new(&mut buffer, true);
            protocol.write_struct_begin(&TStructIdentifier::new("Window")).unwrap();
            protocol
                .write_field_begin(&TFieldIdentifier::new("note", TType::String, 9))
                .unwrap();
            protocol.write_string("written by a newer build").unwrap();
            protocol.write_field_end().unwrap();
            protocol
                .write_field_begin(&TFieldIdentifier::new("samples", TType::List, 1))
                .unwrap();
            protocol
                .write_list_begin(&TListIdentifier::new(TType::Struct, 1))
                .unwrap();
            Sample::new("t1", "first", 7.5)
                .write_to_out_protocol(&mut protocol)
                .unwrap();
            protocol.write_list_end().unwrap();
            protocol.write_field_end().unwrap();
            protocol.write_field_stop().unwrap();
            protocol.write_struct_end().unwrap();
            protocol.flush().unwrap();
        }

        let window = decode_window(&buffer).unwrap();
        assert_eq!(window.samples(), &[Sample::new("t1", "first", 7.5)]);
    }
}
